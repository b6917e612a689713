mod common;

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::CString;
use std::ptr;

use common::{handle_of, last_code, last_error, release, setup, string, take_string};
use idlbridge::runtime::ffi::*;
use idlbridge::runtime::{ErrorCode, Handle, TypedValue};
use idlbridge::taskmanager::bindings::*;

fn project_with_tasks(titles: &[&str]) -> (Handle, Handle) {
    let manager = ITaskManager_Create();
    let name = string("Errands");
    let project = ITaskManager_CreateProject(manager, name);
    assert!(!project.is_null(), "{}", last_error());
    release(name);

    for title in titles {
        let title = string(title);
        let description = string("");
        let task = IProject_CreateTask(project, title, description);
        assert!(!task.is_null(), "{}", last_error());
        assert!(ITask_Release(task));
        release(title);
        release(description);
    }
    (manager, project)
}

fn teardown(manager: Handle, project: Handle) {
    assert!(IProject_Release(project));
    assert!(ITaskManager_Release(manager));
}

fn array_handles(array: Handle) -> Vec<Handle> {
    (0..TaskManagerArray_Count(array))
        .map(|i| {
            let mut out = TypedValue::default();
            assert!(TaskManagerArray_Item(array, i, &mut out), "{}", last_error());
            handle_of(out)
        })
        .collect()
}

#[test]
fn test_string_property_returns_fresh_handle() {
    setup();
    let task = ITask_Create();
    let text = string("Bring the ladder");
    assert!(ITask_Setdescription(task, text));

    let read = ITask_Getdescription(task);
    assert!(!read.is_null());
    assert_ne!(read, text);

    // The setter copied; the caller's handle is independent
    release(text);
    assert_eq!(take_string(read), "Bring the ladder");

    let again = ITask_Getdescription(task);
    let other = ITask_Getdescription(task);
    assert_ne!(again, other);
    assert_eq!(idlbridge_string_length(again), 16);
    release(again);
    release(other);
    assert!(ITask_Release(task));
}

#[test]
fn test_enum_values_are_validated() {
    setup();
    let task = ITask_Create();
    assert!(ITask_Setpriority(task, 3));
    assert_eq!(ITask_Getpriority(task), 3);

    assert!(!ITask_Setpriority(task, 5));
    assert_eq!(last_code(), ErrorCode::InvalidEnumValue as i32);
    assert!(last_error().starts_with("InvalidEnumValue"));
    // Rejected value left the property unchanged
    assert_eq!(ITask_Getpriority(task), 3);

    assert!(!ITask_Setstatus(task, -1));
    assert_eq!(last_code(), ErrorCode::InvalidEnumValue as i32);
    assert_eq!(ITask_Getstatus(task), 0);

    let manager = ITaskManager_Create();
    assert!(ITaskManager_GetTasksByPriority(manager, 9).is_null());
    assert_eq!(last_code(), ErrorCode::InvalidEnumValue as i32);
    assert!(ITaskManager_Release(manager));
    assert!(ITask_Release(task));
}

#[test]
fn test_due_date_and_overdue() {
    setup();
    let task = ITask_Create();
    assert!(!ITask_IsOverdue(task));
    assert_eq!(last_code(), 0);

    let past = string("2001-01-01");
    assert!(ITask_Setdue_date(task, past));
    assert!(ITask_IsOverdue(task));

    // Closed tasks are never overdue
    assert!(ITask_Complete(task));
    assert!(!ITask_IsOverdue(task));

    let bogus = string("tomorrow");
    assert!(!ITask_Setdue_date(task, bogus));
    assert_eq!(last_code(), ErrorCode::DomainFailure as i32);
    assert_eq!(
        last_error(),
        "DomainFailure: Invalid due date 'tomorrow', expected YYYY-MM-DD"
    );
    assert_eq!(take_string(ITask_Getdue_date(task)), "2001-01-01");

    release(past);
    release(bogus);
    assert!(ITask_Release(task));
}

#[test]
fn test_read_only_property_through_dynamic_api() {
    setup();
    let task = ITask_Create();
    let name = CString::new("id").unwrap();
    let value = string("task-override");

    assert!(!idlbridge_set_property(task, name.as_ptr(), TypedValue::handle(value)));
    assert_eq!(last_code(), ErrorCode::InvalidArgument as i32);
    assert_eq!(last_error(), "InvalidArgument: property ITask.id is read-only");

    release(value);
    assert!(ITask_Release(task));
}

#[test]
fn test_tags_array_is_a_snapshot() {
    setup();
    let task = ITask_Create();
    let work = string("work");
    assert!(ITask_Settags_Add(task, work));

    let tags = ITask_Gettags(task);
    assert_eq!(TaskManagerArray_Count(tags), 1);

    let later = string("later");
    assert!(ITask_Settags_Add(task, later));
    assert_eq!(ITask_Gettags_Count(task), 2);
    assert_eq!(TaskManagerArray_Count(tags), 1);

    let mut out = TypedValue::default();
    assert!(TaskManagerArray_Item(tags, 0, &mut out));
    assert_eq!(take_string(handle_of(out)), "work");
    assert!(!TaskManagerArray_Item(tags, 1, &mut out));
    assert_eq!(last_code(), ErrorCode::IndexOutOfBounds as i32);

    // Snapshots are read-only
    assert!(!idlbridge_array_push(tags, TypedValue::handle(later)));

    // Whole-array assignment from a caller-built array
    let replacement = idlbridge_array_new();
    let home = string("home");
    assert!(idlbridge_array_push(replacement, TypedValue::handle(home)));
    assert!(ITask_Settags(task, replacement));
    assert_eq!(ITask_Gettags_Count(task), 1);
    assert_eq!(take_string(ITask_Gettags_Item(task, 0)), "home");

    assert!(TaskManagerArray_Release(tags));
    assert!(TaskManagerArray_Release(replacement));
    for h in [work, later, home] {
        release(h);
    }
    assert!(ITask_Release(task));
}

#[test]
fn test_get_tasks_is_a_snapshot() {
    setup();
    let (manager, project) = project_with_tasks(&["Buy milk", "Post letter"]);

    let snapshot = IProject_GetTasks(project);
    assert_eq!(TaskManagerArray_Count(snapshot), 2);

    let title = string("Return library books");
    let description = string("");
    let task = IProject_CreateTask(project, title, description);
    assert_eq!(IProject_GetTaskCount(project), 3);
    assert_eq!(TaskManagerArray_Count(snapshot), 2);

    // Deleting from the project does not disturb handles in the snapshot
    let items = array_handles(snapshot);
    let first_id = ITask_Getid(items[0]);
    assert!(IProject_DeleteTask(project, first_id));
    assert!(!IProject_DeleteTask(project, first_id));
    assert_eq!(take_string(ITask_Gettitle(items[0])), "Buy milk");

    for item in items {
        assert!(ITask_Release(item));
    }
    assert!(TaskManagerArray_Release(snapshot));
    assert!(ITask_Release(task));
    for h in [title, description, first_id] {
        release(h);
    }
    teardown(manager, project);
}

#[test]
fn test_count_by_status_dictionary() {
    setup();
    let (manager, project) = project_with_tasks(&["One", "Two", "Three"]);

    let tasks = IProject_GetTasks(project);
    let items = array_handles(tasks);
    assert!(ITask_Complete(items[0]));
    assert!(ITask_Setstatus(items[1], 1));
    assert_eq!(IProject_GetCompletedCount(project), 1);

    let counts = IProject_GetTaskCountByStatus(project);
    assert_eq!(TaskManagerDict_Count(counts), 4);

    let mut seen = BTreeMap::new();
    let (mut key, mut value) = (TypedValue::default(), TypedValue::default());
    while TaskManagerDict_Next(counts, &mut key, &mut value) {
        seen.insert(key.as_i32().unwrap(), value.as_i32().unwrap());
    }
    assert_eq!(last_code(), 0);
    assert_eq!(seen, BTreeMap::from([(0, 1), (1, 1), (2, 1), (3, 0)]));

    // Reset rewinds the cursor
    assert!(TaskManagerDict_Reset(counts));
    assert!(TaskManagerDict_Next(counts, &mut key, &mut value));

    let done = IProject_GetTasksByStatus(project, 2);
    assert_eq!(TaskManagerArray_Count(done), 1);

    assert!(TaskManagerDict_Release(counts));
    assert!(TaskManagerArray_Release(done));
    for item in items {
        assert!(ITask_Release(item));
    }
    assert!(TaskManagerArray_Release(tasks));
    teardown(manager, project);
}

#[test]
fn test_all_tags_set() {
    setup();
    let (manager, project) = project_with_tasks(&["Paint", "Sand"]);
    let tasks = IProject_GetTasks(project);
    let items = array_handles(tasks);

    let outdoor = string("outdoor");
    let weekend = string("weekend");
    assert!(ITask_Settags_Add(items[0], outdoor));
    assert!(ITask_Settags_Add(items[0], weekend));
    assert!(ITask_Settags_Add(items[1], weekend));

    let tags = ITaskManager_GetAllTags(manager);
    assert_eq!(TaskManagerSet_Count(tags), 2);

    let mut seen = BTreeSet::new();
    let mut out = TypedValue::default();
    while TaskManagerSet_Next(tags, &mut out) {
        seen.insert(take_string(handle_of(out)));
    }
    assert_eq!(seen, BTreeSet::from(["outdoor".to_string(), "weekend".to_string()]));

    let query = string("WEEKEND");
    let found = ITaskManager_SearchTasks(manager, query);
    assert_eq!(TaskManagerArray_Count(found), 2);

    assert!(TaskManagerSet_Release(tags));
    assert!(TaskManagerArray_Release(found));
    for h in [outdoor, weekend, query] {
        release(h);
    }
    for item in items {
        assert!(ITask_Release(item));
    }
    assert!(TaskManagerArray_Release(tasks));
    teardown(manager, project);
}

#[test]
fn test_settings_round_trip_through_dict_builder() {
    setup();
    let manager = ITaskManager_Create();

    let settings = idlbridge_dict_new();
    let theme = string("theme");
    let dark = string("dark");
    assert!(idlbridge_dict_insert(settings, TypedValue::handle(theme), TypedValue::handle(dark)));
    assert!(ITaskManager_UpdateSettings(manager, settings));

    let current = ITaskManager_GetSettings(manager);
    assert_eq!(TaskManagerDict_Count(current), 1);
    let (mut key, mut value) = (TypedValue::default(), TypedValue::default());
    assert!(TaskManagerDict_Next(current, &mut key, &mut value));
    assert_eq!(take_string(handle_of(key)), "theme");
    assert_eq!(take_string(handle_of(value)), "dark");
    assert!(!TaskManagerDict_Next(current, &mut key, &mut value));

    // Values must be strings
    let bad = idlbridge_dict_new();
    assert!(idlbridge_dict_insert(bad, TypedValue::handle(theme), TypedValue::i32(1)));
    assert!(!ITaskManager_UpdateSettings(manager, bad));
    assert_eq!(last_code(), ErrorCode::TypeMismatch as i32);

    for h in [settings, current, bad] {
        assert!(TaskManagerDict_Release(h));
    }
    release(theme);
    release(dark);
    assert!(ITaskManager_Release(manager));
}

#[test]
fn test_dynamic_access() {
    setup();
    let iface = CString::new("ITask").unwrap();
    let task = idlbridge_create(iface.as_ptr());
    assert!(!task.is_null(), "{}", last_error());

    let priority = CString::new("priority").unwrap();
    let mut out = TypedValue::default();
    assert!(idlbridge_get_property(task, priority.as_ptr(), &mut out));
    assert_eq!(out.as_i32(), Some(1));

    assert!(idlbridge_set_property(task, priority.as_ptr(), TypedValue::i32(2)));
    assert_eq!(ITask_Getpriority(task), 2);

    // Wrong value kind for the declared type
    assert!(!idlbridge_set_property(task, priority.as_ptr(), TypedValue::bool(true)));
    assert_eq!(last_code(), ErrorCode::InvalidArgument as i32);

    let set_metadata = CString::new("SetMetadata").unwrap();
    let key = string("owner");
    let value = string("sam");
    let args = [TypedValue::handle(key), TypedValue::handle(value)];
    assert!(idlbridge_invoke(task, set_metadata.as_ptr(), args.as_ptr(), 2, ptr::null_mut()));

    let get_metadata = CString::new("GetMetadata").unwrap();
    assert!(idlbridge_invoke(task, get_metadata.as_ptr(), ptr::null(), 0, &mut out));
    let metadata = handle_of(out);
    assert_eq!(TaskManagerDict_Count(metadata), 1);
    assert!(TaskManagerDict_Release(metadata));

    // Discarded results are released by the runtime
    assert!(idlbridge_invoke(task, get_metadata.as_ptr(), ptr::null(), 0, ptr::null_mut()));

    let explode = CString::new("Explode").unwrap();
    assert!(!idlbridge_invoke(task, explode.as_ptr(), ptr::null(), 0, &mut out));
    assert_eq!(last_error(), "InvalidArgument: ITask has no method 'Explode'");

    assert!(!idlbridge_invoke(task, set_metadata.as_ptr(), args.as_ptr(), 1, &mut out));
    assert_eq!(
        last_error(),
        "InvalidArgument: ITask.SetMetadata expects 2 argument(s), got 1"
    );

    // Strings are not interfaces
    assert!(!idlbridge_get_property(key, priority.as_ptr(), &mut out));
    assert_eq!(last_code(), ErrorCode::TypeMismatch as i32);

    release(key);
    release(value);
    assert!(idlbridge_release(task));
}
