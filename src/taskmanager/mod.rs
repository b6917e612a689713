//! TaskManager reference binding
//!
//! A native implementation of the TaskManager model plus the per-interface
//! C entry points a binding generator emits for it. The model is registered
//! with the runtime on first use.
//!
//! Ownership: the manager holds one reference to each of its projects and a
//! project holds one reference to each of its tasks. Handles given to the
//! caller carry their own references, so releasing them never disturbs the
//! containers.

pub mod bindings;
pub mod clock;
pub mod manager;
pub mod project;
pub mod task;
pub mod types;

use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use idlbridge_runtime::model::EnumId;
use idlbridge_runtime::{
    registry, BoundaryObject, BridgeError, BridgeResult, DomainError, InterfaceId, ObjRef,
};
use tracing::debug;

pub use manager::ManagerImpl;
pub use project::ProjectImpl;
pub use task::TaskImpl;
pub use types::{Priority, Status};

/// Interface model registered by `ids()`
pub const MODEL_JSON: &str = include_str!("model.json");

/// Runtime ids of the TaskManager declarations
#[derive(Debug, Clone, Copy)]
pub struct TaskManagerIds {
    pub task: InterfaceId,
    pub project: InterfaceId,
    pub manager: InterfaceId,
    pub priority: EnumId,
    pub status: EnumId,
}

static IDS: OnceCell<TaskManagerIds> = OnceCell::new();

/// Register the model and factories once; later calls return the same ids
pub fn ids() -> BridgeResult<&'static TaskManagerIds> {
    IDS.get_or_try_init(register)
}

/// `ids()` for native code, which reports failures as domain errors
pub(crate) fn native_ids() -> Result<&'static TaskManagerIds, DomainError> {
    ids().map_err(|e| DomainError::new(e.to_string()))
}

fn register() -> BridgeResult<TaskManagerIds> {
    let loaded = registry()
        .load_json(MODEL_JSON)
        .map_err(|e| BridgeError::domain(e.to_string()))?;

    let interface = |name: &str| {
        loaded
            .interface(name)
            .ok_or_else(|| BridgeError::domain(format!("model does not declare {}", name)))
    };
    let enumeration = |name: &str| {
        loaded
            .enum_id(name)
            .ok_or_else(|| BridgeError::domain(format!("model does not declare {}", name)))
    };

    let ids = TaskManagerIds {
        task: interface("ITask")?,
        project: interface("IProject")?,
        manager: interface("ITaskManager")?,
        priority: enumeration("Priority")?,
        status: enumeration("Status")?,
    };

    registry().register_factory(ids.task, || {
        Ok(Arc::new(TaskImpl::new(next_task_id(), String::new(), String::new()))
            as Arc<dyn BoundaryObject>)
    });
    registry().register_factory(ids.project, || {
        Ok(Arc::new(ProjectImpl::new(next_project_id(), String::new())) as Arc<dyn BoundaryObject>)
    });
    registry().register_factory(ids.manager, || {
        Ok(Arc::new(ManagerImpl::new()) as Arc<dyn BoundaryObject>)
    });

    debug!(target: "idlbridge::taskmanager", "TaskManager model registered");
    Ok(ids)
}

/// A managed object together with its concrete implementation
///
/// Containers keep both so native code never has to downcast.
#[derive(Debug)]
pub struct Owned<T> {
    pub obj: ObjRef,
    pub native: Arc<T>,
}

impl<T: BoundaryObject> Owned<T> {
    pub fn new(iface: InterfaceId, native: T) -> Self {
        let native = Arc::new(native);
        let obj = ObjRef::new_interface(iface, Arc::clone(&native) as Arc<dyn BoundaryObject>);
        Self { obj, native }
    }
}

impl<T> Clone for Owned<T> {
    fn clone(&self) -> Self {
        Self {
            obj: self.obj.clone(),
            native: Arc::clone(&self.native),
        }
    }
}

static NEXT_TASK: AtomicU64 = AtomicU64::new(1);
static NEXT_PROJECT: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_task_id() -> String {
    format!("task-{}", NEXT_TASK.fetch_add(1, Ordering::Relaxed))
}

pub(crate) fn next_project_id() -> String {
    format!("proj-{}", NEXT_PROJECT.fetch_add(1, Ordering::Relaxed))
}

/// Keep generated ids clear of ids restored by `Load`
pub(crate) fn observe_id(id: &str) {
    let (counter, suffix) = if let Some(n) = id.strip_prefix("task-") {
        (&NEXT_TASK, n)
    } else if let Some(n) = id.strip_prefix("proj-") {
        (&NEXT_PROJECT, n)
    } else {
        return;
    };
    if let Ok(n) = suffix.parse::<u64>() {
        counter.fetch_max(n.saturating_add(1), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_is_idempotent() {
        let first = *ids().unwrap();
        let second = *ids().unwrap();
        assert_eq!(first.task, second.task);

        // Loading the same document again resolves to the same ids
        let loaded = registry().load_json(MODEL_JSON).unwrap();
        assert_eq!(loaded.interface("IProject"), Some(first.project));
        assert!(registry().has_factory(first.manager));
    }

    #[test]
    fn test_observed_ids_are_skipped() {
        observe_id("task-900000");
        let next = next_task_id();
        let n: u64 = next.strip_prefix("task-").unwrap().parse().unwrap();
        assert!(n >= 900_000 + 1);
        observe_id("unrelated");
    }
}
