//! Every typed entry point refuses handles of every other type.

mod common;

use common::{last_code, last_error, setup, string};
use idlbridge::runtime::ffi::{
    idlbridge_array_new, idlbridge_dict_new, idlbridge_refcount, idlbridge_release,
    idlbridge_set_new, idlbridge_string_length, idlbridge_string_release, idlbridge_string_value,
};
use idlbridge::runtime::{ErrorCode, Handle};
use idlbridge::taskmanager::bindings::*;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Task,
    Project,
    Manager,
    Str,
    Array,
    Dict,
    Set,
}

const KINDS: [Kind; 7] = [
    Kind::Task,
    Kind::Project,
    Kind::Manager,
    Kind::Str,
    Kind::Array,
    Kind::Dict,
    Kind::Set,
];

fn create(kind: Kind) -> Handle {
    let handle = match kind {
        Kind::Task => ITask_Create(),
        Kind::Project => IProject_Create(),
        Kind::Manager => ITaskManager_Create(),
        Kind::Str => string("plain text"),
        Kind::Array => idlbridge_array_new(),
        Kind::Dict => idlbridge_dict_new(),
        Kind::Set => idlbridge_set_new(),
    };
    assert!(!handle.is_null(), "create {:?}: {}", kind, last_error());
    handle
}

/// Typed entry point; `call` returns true when it produced the sentinel
struct Operation {
    name: &'static str,
    accepts: Kind,
    call: fn(Handle) -> bool,
}

macro_rules! ops {
    ($($kind:ident: $name:ident => $call:expr;)*) => {
        vec![$(Operation { name: stringify!($name), accepts: Kind::$kind, call: $call },)*]
    };
}

fn operations() -> Vec<Operation> {
    ops! {
        Task: ITask_AddRef => |h| ITask_AddRef(h).is_null();
        Task: ITask_Release => |h| !ITask_Release(h);
        Task: ITask_Getid => |h| ITask_Getid(h).is_null();
        Task: ITask_Getpriority => |h| ITask_Getpriority(h) == 0;
        Task: ITask_Setpriority => |h| !ITask_Setpriority(h, 2);
        Task: ITask_Gettags => |h| ITask_Gettags(h).is_null();
        Task: ITask_Gettags_Count => |h| ITask_Gettags_Count(h) == 0;
        Task: ITask_Complete => |h| !ITask_Complete(h);
        Task: ITask_IsOverdue => |h| !ITask_IsOverdue(h);
        Task: ITask_GetMetadata => |h| ITask_GetMetadata(h).is_null();
        Project: IProject_AddRef => |h| IProject_AddRef(h).is_null();
        Project: IProject_Release => |h| !IProject_Release(h);
        Project: IProject_Getname => |h| IProject_Getname(h).is_null();
        Project: IProject_Getactive => |h| !IProject_Getactive(h);
        Project: IProject_Setactive => |h| !IProject_Setactive(h, false);
        Project: IProject_GetTasks => |h| IProject_GetTasks(h).is_null();
        Project: IProject_GetTaskCount => |h| IProject_GetTaskCount(h) == 0;
        Project: IProject_GetTaskCountByStatus => |h| IProject_GetTaskCountByStatus(h).is_null();
        Manager: ITaskManager_AddRef => |h| ITaskManager_AddRef(h).is_null();
        Manager: ITaskManager_Release => |h| !ITaskManager_Release(h);
        Manager: ITaskManager_GetProjects => |h| ITaskManager_GetProjects(h).is_null();
        Manager: ITaskManager_GetTasksByPriority => |h| ITaskManager_GetTasksByPriority(h, 1).is_null();
        Manager: ITaskManager_GetOverdueTasks => |h| ITaskManager_GetOverdueTasks(h).is_null();
        Manager: ITaskManager_GetAllTags => |h| ITaskManager_GetAllTags(h).is_null();
        Manager: ITaskManager_GetSettings => |h| ITaskManager_GetSettings(h).is_null();
        Str: idlbridge_string_value => |h| idlbridge_string_value(h).is_null();
        Str: idlbridge_string_length => |h| idlbridge_string_length(h) == 0;
        Str: idlbridge_string_release => |h| !idlbridge_string_release(h);
        Array: TaskManagerArray_Count => |h| TaskManagerArray_Count(h) == 0;
        Array: TaskManagerArray_Release => |h| !TaskManagerArray_Release(h);
        Dict: TaskManagerDict_Count => |h| TaskManagerDict_Count(h) == 0;
        Dict: TaskManagerDict_Reset => |h| !TaskManagerDict_Reset(h);
        Dict: TaskManagerDict_Release => |h| !TaskManagerDict_Release(h);
        Set: TaskManagerSet_Count => |h| TaskManagerSet_Count(h) == 0;
        Set: TaskManagerSet_Reset => |h| !TaskManagerSet_Reset(h);
        Set: TaskManagerSet_Release => |h| !TaskManagerSet_Release(h);
    }
}

fn assert_refused(op: &Operation, source: Kind, handle: Handle) {
    assert!((op.call)(handle), "{} accepted a {:?} handle", op.name, source);
    assert_eq!(
        last_code(),
        ErrorCode::TypeMismatch as i32,
        "{} on {:?}: {}",
        op.name,
        source,
        last_error()
    );
    assert_eq!(idlbridge_refcount(handle), 1, "{} touched a {:?}", op.name, source);
}

#[test]
fn test_every_mismatched_pair_is_refused() {
    setup();
    for source in KINDS {
        let handle = create(source);
        for op in operations().iter().filter(|op| op.accepts != source) {
            assert_refused(op, source, handle);
        }
        assert!(idlbridge_release(handle), "{}", last_error());
    }
}

#[test]
fn test_every_kind_has_operations() {
    let operations = operations();
    for kind in KINDS {
        assert!(operations.iter().any(|op| op.accepts == kind), "{:?}", kind);
    }
}

proptest! {
    #[test]
    fn mismatched_calls_leave_handles_usable(
        picks in prop::collection::vec((0..KINDS.len(), any::<prop::sample::Index>()), 1..32)
    ) {
        setup();
        let operations = operations();
        let handles: Vec<Handle> = KINDS.iter().map(|k| create(*k)).collect();

        for (source, op) in picks {
            let op = &operations[op.index(operations.len())];
            if op.accepts == KINDS[source] {
                continue;
            }
            prop_assert!((op.call)(handles[source]));
            prop_assert_eq!(last_code(), ErrorCode::TypeMismatch as i32);
        }

        // Nothing was consumed: each handle still releases exactly once
        for handle in handles {
            prop_assert_eq!(idlbridge_refcount(handle), 1);
            prop_assert!(idlbridge_release(handle));
            prop_assert!(!idlbridge_release(handle));
        }
    }
}
