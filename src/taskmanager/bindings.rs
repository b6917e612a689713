//! C entry points for the TaskManager interfaces
//!
//! This is the shape a binding generator emits: one exported function per
//! lifecycle operation, property accessor and method, each a thin typed
//! wrapper over the runtime's descriptor-checked dispatch.
//!
//! Conventions:
//! - strings, objects and collections travel as handles; returned handles
//!   belong to the caller
//! - enums travel as their `int32_t` value and are validated both ways
//! - setters and `void` methods return `true` on success
//! - every failure returns the zero sentinel and sets the thread's last error

#![allow(non_snake_case)]

use std::os::raw::c_char;

use idlbridge_runtime::ffi::{self, boundary, TypedValue};
use idlbridge_runtime::invoke::{self, Scalar};
use idlbridge_runtime::string::{new_string_handle, read_string};
use idlbridge_runtime::{handles, BridgeError, BridgeResult, Handle, TypeTag};

use super::ids;
use super::task::TaskImpl;

macro_rules! lifecycle {
    ($iface:ident: $create:ident, $add_ref:ident, $release:ident) => {
        /// New object from the registered factory; the handle owns its only reference
        #[no_mangle]
        pub extern "C" fn $create() -> Handle {
            boundary(stringify!($create), || invoke::create(ids()?.$iface))
        }

        /// Second handle for the same object, carrying its own reference
        #[no_mangle]
        pub extern "C" fn $add_ref(handle: Handle) -> Handle {
            boundary(stringify!($add_ref), || invoke::add_ref(handle, ids()?.$iface))
        }

        #[no_mangle]
        pub extern "C" fn $release(handle: Handle) -> bool {
            boundary(stringify!($release), || {
                invoke::release(handle, ids()?.$iface)?;
                Ok(true)
            })
        }
    };
}

macro_rules! getters {
    ($iface:ident { $($func:ident => $prop:literal: $ty:ty),* $(,)? }) => {
        $(
            #[no_mangle]
            pub extern "C" fn $func(handle: Handle) -> $ty {
                boundary(stringify!($func), || invoke::get::<$ty>(handle, ids()?.$iface, $prop))
            }
        )*
    };
}

macro_rules! setters {
    ($iface:ident { $($func:ident => $prop:literal: $ty:ty),* $(,)? }) => {
        $(
            #[no_mangle]
            pub extern "C" fn $func(handle: Handle, value: $ty) -> bool {
                boundary(stringify!($func), || {
                    invoke::set::<$ty>(handle, ids()?.$iface, $prop, value)?;
                    Ok(true)
                })
            }
        )*
    };
}

/// Method with a result
macro_rules! method {
    ($iface:ident, $func:ident => $name:literal ($($arg:ident: $aty:ty),*) -> $ret:ty) => {
        #[no_mangle]
        pub extern "C" fn $func(handle: Handle $(, $arg: $aty)*) -> $ret {
            boundary(stringify!($func), || {
                invoke::call::<$ret>(handle, ids()?.$iface, $name, &[$(Scalar::into_typed($arg)),*])
            })
        }
    };
}

/// `void` method
macro_rules! action {
    ($iface:ident, $func:ident => $name:literal ($($arg:ident: $aty:ty),*)) => {
        #[no_mangle]
        pub extern "C" fn $func(handle: Handle $(, $arg: $aty)*) -> bool {
            boundary(stringify!($func), || {
                invoke::call_void(handle, ids()?.$iface, $name, &[$(Scalar::into_typed($arg)),*])?;
                Ok(true)
            })
        }
    };
}

// ============================================================================
// ITask
// ============================================================================

lifecycle!(task: ITask_Create, ITask_AddRef, ITask_Release);

getters!(task {
    ITask_Getid => "id": Handle,
    ITask_Gettitle => "title": Handle,
    ITask_Getdescription => "description": Handle,
    ITask_Getpriority => "priority": i32,
    ITask_Getstatus => "status": i32,
    ITask_Getcreated_at => "created_at": Handle,
    ITask_Getdue_date => "due_date": Handle,
    ITask_Gettags => "tags": Handle,
});

setters!(task {
    ITask_Setdescription => "description": Handle,
    ITask_Setpriority => "priority": i32,
    ITask_Setstatus => "status": i32,
    ITask_Setdue_date => "due_date": Handle,
    ITask_Settags => "tags": Handle,
});

action!(task, ITask_Complete => "Complete"());
action!(task, ITask_Cancel => "Cancel"());
method!(task, ITask_IsOverdue => "IsOverdue"() -> bool);
method!(task, ITask_GetMetadata => "GetMetadata"() -> Handle);
action!(task, ITask_SetMetadata => "SetMetadata"(key: Handle, value: Handle));

fn with_task<R>(handle: Handle, f: impl FnOnce(&TaskImpl) -> BridgeResult<R>) -> BridgeResult<R> {
    let obj = handles().resolve(handle, Some(TypeTag::Interface(ids()?.task)))?;
    let task = obj
        .downcast::<TaskImpl>()
        .ok_or_else(|| BridgeError::type_mismatch("native ITask", "foreign implementation"))?;
    f(&task)
}

/// Number of tags, without materializing the array
#[no_mangle]
pub extern "C" fn ITask_Gettags_Count(handle: Handle) -> usize {
    boundary("ITask_Gettags_Count", || with_task(handle, |t| Ok(t.tags().len())))
}

/// Tag at `index` as a new string handle
#[no_mangle]
pub extern "C" fn ITask_Gettags_Item(handle: Handle, index: usize) -> Handle {
    boundary("ITask_Gettags_Item", || {
        let tags = with_task(handle, |t| Ok(t.tags()))?;
        let tag = tags.get(index).ok_or(BridgeError::IndexOutOfBounds {
            index,
            count: tags.len(),
        })?;
        new_string_handle(tag)
    })
}

#[no_mangle]
pub extern "C" fn ITask_Settags_Clear(handle: Handle) -> bool {
    boundary("ITask_Settags_Clear", || {
        with_task(handle, |t| {
            t.set_tags(Vec::new());
            Ok(true)
        })
    })
}

/// Append one tag; the caller keeps its string handle
#[no_mangle]
pub extern "C" fn ITask_Settags_Add(handle: Handle, value: Handle) -> bool {
    boundary("ITask_Settags_Add", || {
        with_task(handle, |t| {
            t.add_tag(read_string(value)?);
            Ok(true)
        })
    })
}

// ============================================================================
// IProject
// ============================================================================

lifecycle!(project: IProject_Create, IProject_AddRef, IProject_Release);

getters!(project {
    IProject_Getid => "id": Handle,
    IProject_Getname => "name": Handle,
    IProject_Getdescription => "description": Handle,
    IProject_Getactive => "active": bool,
});

setters!(project {
    IProject_Setname => "name": Handle,
    IProject_Setdescription => "description": Handle,
    IProject_Setactive => "active": bool,
});

method!(project, IProject_CreateTask => "CreateTask"(title: Handle, description: Handle) -> Handle);
method!(project, IProject_GetTask => "GetTask"(taskId: Handle) -> Handle);
method!(project, IProject_GetTasks => "GetTasks"() -> Handle);
method!(project, IProject_GetTasksByStatus => "GetTasksByStatus"(status: i32) -> Handle);
method!(project, IProject_DeleteTask => "DeleteTask"(taskId: Handle) -> bool);
method!(project, IProject_GetTaskCount => "GetTaskCount"() -> i32);
method!(project, IProject_GetCompletedCount => "GetCompletedCount"() -> i32);
method!(project, IProject_GetTaskCountByStatus => "GetTaskCountByStatus"() -> Handle);

// ============================================================================
// ITaskManager
// ============================================================================

lifecycle!(manager: ITaskManager_Create, ITaskManager_AddRef, ITaskManager_Release);

method!(manager, ITaskManager_CreateProject => "CreateProject"(name: Handle) -> Handle);
method!(manager, ITaskManager_GetProject => "GetProject"(projectId: Handle) -> Handle);
method!(manager, ITaskManager_GetProjects => "GetProjects"() -> Handle);
method!(manager, ITaskManager_GetActiveProjects => "GetActiveProjects"() -> Handle);
method!(manager, ITaskManager_DeleteProject => "DeleteProject"(projectId: Handle) -> bool);
method!(manager, ITaskManager_SearchTasks => "SearchTasks"(query: Handle) -> Handle);
method!(manager, ITaskManager_GetTasksByPriority => "GetTasksByPriority"(priority: i32) -> Handle);
method!(manager, ITaskManager_GetOverdueTasks => "GetOverdueTasks"() -> Handle);
method!(manager, ITaskManager_GetAllTags => "GetAllTags"() -> Handle);
method!(manager, ITaskManager_GetSettings => "GetSettings"() -> Handle);
action!(manager, ITaskManager_UpdateSettings => "UpdateSettings"(settings: Handle));
action!(manager, ITaskManager_Save => "Save"(path: Handle));
action!(manager, ITaskManager_Load => "Load"(path: Handle));

// ============================================================================
// Namespace helpers
// ============================================================================

#[no_mangle]
pub extern "C" fn TaskManager_GetLastError() -> *const c_char {
    ffi::idlbridge_get_last_error()
}

#[no_mangle]
pub extern "C" fn TaskManager_ClearError() {
    ffi::idlbridge_clear_last_error()
}

#[no_mangle]
pub extern "C" fn TaskManagerArray_Count(handle: Handle) -> usize {
    ffi::idlbridge_array_count(handle)
}

/// # Safety
/// - `out` must be valid for a write of one `TypedValue`
#[no_mangle]
pub extern "C" fn TaskManagerArray_Item(handle: Handle, index: usize, out: *mut TypedValue) -> bool {
    ffi::idlbridge_array_item(handle, index, out)
}

#[no_mangle]
pub extern "C" fn TaskManagerArray_Release(handle: Handle) -> bool {
    ffi::idlbridge_array_release(handle)
}

#[no_mangle]
pub extern "C" fn TaskManagerDict_Count(handle: Handle) -> usize {
    ffi::idlbridge_dict_count(handle)
}

/// # Safety
/// - `key` and `value` must be valid for a write of one `TypedValue`
#[no_mangle]
pub extern "C" fn TaskManagerDict_Next(handle: Handle, key: *mut TypedValue, value: *mut TypedValue) -> bool {
    ffi::idlbridge_dict_next(handle, key, value)
}

#[no_mangle]
pub extern "C" fn TaskManagerDict_Reset(handle: Handle) -> bool {
    ffi::idlbridge_dict_reset(handle)
}

#[no_mangle]
pub extern "C" fn TaskManagerDict_Release(handle: Handle) -> bool {
    ffi::idlbridge_dict_release(handle)
}

#[no_mangle]
pub extern "C" fn TaskManagerSet_Count(handle: Handle) -> usize {
    ffi::idlbridge_set_count(handle)
}

/// # Safety
/// - `value` must be valid for a write of one `TypedValue`
#[no_mangle]
pub extern "C" fn TaskManagerSet_Next(handle: Handle, value: *mut TypedValue) -> bool {
    ffi::idlbridge_set_next(handle, value)
}

#[no_mangle]
pub extern "C" fn TaskManagerSet_Reset(handle: Handle) -> bool {
    ffi::idlbridge_set_reset(handle)
}

#[no_mangle]
pub extern "C" fn TaskManagerSet_Release(handle: Handle) -> bool {
    ffi::idlbridge_set_release(handle)
}
