//! Native `IProject`

use parking_lot::RwLock;

use idlbridge_runtime::{arg, Args, BoundaryObject, DomainError, Value};

use super::task::TaskImpl;
use super::types::{ProjectRecord, Status};
use super::{native_ids, next_task_id, observe_id, Owned};

#[derive(Debug)]
struct ProjectState {
    name: String,
    description: String,
    active: bool,
    tasks: Vec<Owned<TaskImpl>>,
}

#[derive(Debug)]
pub struct ProjectImpl {
    id: String,
    state: RwLock<ProjectState>,
}

impl ProjectImpl {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            state: RwLock::new(ProjectState {
                name,
                description: String::new(),
                active: true,
                tasks: Vec::new(),
            }),
        }
    }

    pub fn from_record(record: ProjectRecord) -> Result<Self, DomainError> {
        let task_iface = native_ids()?.task;
        let tasks = record
            .tasks
            .into_iter()
            .map(|task| {
                observe_id(&task.id);
                Owned::new(task_iface, TaskImpl::from_record(task))
            })
            .collect();

        observe_id(&record.id);
        Ok(Self {
            id: record.id,
            state: RwLock::new(ProjectState {
                name: record.name,
                description: record.description,
                active: record.active,
                tasks,
            }),
        })
    }

    pub fn to_record(&self) -> ProjectRecord {
        let state = self.state.read();
        ProjectRecord {
            id: self.id.clone(),
            name: state.name.clone(),
            description: state.description.clone(),
            active: state.active,
            tasks: state.tasks.iter().map(|t| t.native.to_record()).collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_active(&self) -> bool {
        self.state.read().active
    }

    pub fn create_task(&self, title: &str, description: &str) -> Result<Owned<TaskImpl>, DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::new("Task title must not be empty"));
        }
        let task = Owned::new(
            native_ids()?.task,
            TaskImpl::new(next_task_id(), title.to_string(), description.to_string()),
        );
        self.state.write().tasks.push(task.clone());
        Ok(task)
    }

    pub fn task(&self, task_id: &str) -> Option<Owned<TaskImpl>> {
        self.state
            .read()
            .tasks
            .iter()
            .find(|t| t.native.id() == task_id)
            .cloned()
    }

    /// Tasks in creation order
    pub fn tasks(&self) -> Vec<Owned<TaskImpl>> {
        self.state.read().tasks.clone()
    }

    pub fn delete_task(&self, task_id: &str) -> bool {
        // The removed reference is dropped after the lock is released
        let removed = {
            let mut state = self.state.write();
            let index = state.tasks.iter().position(|t| t.native.id() == task_id);
            index.map(|i| state.tasks.remove(i))
        };
        removed.is_some()
    }

    pub fn count_with(&self, status: Status) -> usize {
        self.state
            .read()
            .tasks
            .iter()
            .filter(|t| t.native.status() == status)
            .count()
    }
}

fn task_list(tasks: impl IntoIterator<Item = Owned<TaskImpl>>) -> Value {
    Value::Array(tasks.into_iter().map(|t| Value::Object(t.obj)).collect())
}

fn count_value(count: usize) -> Value {
    Value::I32(i32::try_from(count).unwrap_or(i32::MAX))
}

impl BoundaryObject for ProjectImpl {
    fn get_property(&self, name: &str) -> Result<Value, DomainError> {
        let state = self.state.read();
        let value = match name {
            "id" => Value::Str(self.id.clone()),
            "name" => Value::Str(state.name.clone()),
            "description" => Value::Str(state.description.clone()),
            "active" => Value::Bool(state.active),
            _ => return Err(DomainError::unknown_member("IProject", name)),
        };
        Ok(value)
    }

    fn set_property(&self, name: &str, value: Value) -> Result<(), DomainError> {
        match name {
            "name" => self.state.write().name = value.into_string()?,
            "description" => self.state.write().description = value.into_string()?,
            "active" => self.state.write().active = value.as_bool()?,
            _ => return Err(DomainError::unknown_member("IProject", name)),
        }
        Ok(())
    }

    fn invoke(&self, method: &str, args: Args) -> Result<Value, DomainError> {
        match method {
            "CreateTask" => {
                let title = arg(&args, 0)?.as_str()?;
                let description = arg(&args, 1)?.as_str()?;
                Ok(Value::Object(self.create_task(title, description)?.obj))
            }
            "GetTask" => {
                let task_id = arg(&args, 0)?.as_str()?;
                self.task(task_id)
                    .map(|t| Value::Object(t.obj))
                    .ok_or_else(|| DomainError::new(format!("Task not found: {}", task_id)))
            }
            "GetTasks" => Ok(task_list(self.tasks())),
            "GetTasksByStatus" => {
                let status = Status::from_value(arg(&args, 0)?)?;
                Ok(task_list(
                    self.tasks().into_iter().filter(|t| t.native.status() == status),
                ))
            }
            "DeleteTask" => Ok(Value::Bool(self.delete_task(arg(&args, 0)?.as_str()?))),
            "GetTaskCount" => Ok(count_value(self.state.read().tasks.len())),
            "GetCompletedCount" => Ok(count_value(self.count_with(Status::Completed))),
            "GetTaskCountByStatus" => Ok(Value::Dict(
                Status::ALL
                    .iter()
                    .map(|s| (s.to_value(), count_value(self.count_with(*s))))
                    .collect(),
            )),
            _ => Err(DomainError::unknown_member("IProject", method)),
        }
    }
}
