//! Native `ITask`

use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use idlbridge_runtime::{arg, Args, BoundaryObject, DomainError, Value};

use super::clock;
use super::types::{Priority, Status, TaskRecord};

#[derive(Debug, Clone)]
struct TaskState {
    title: String,
    description: String,
    priority: Priority,
    status: Status,
    due_date: String,
    tags: Vec<String>,
    metadata: BTreeMap<String, String>,
}

#[derive(Debug)]
pub struct TaskImpl {
    id: String,
    created_at: String,
    state: RwLock<TaskState>,
}

impl TaskImpl {
    pub fn new(id: String, title: String, description: String) -> Self {
        Self {
            id,
            created_at: clock::now(),
            state: RwLock::new(TaskState {
                title,
                description,
                priority: Priority::default(),
                status: Status::default(),
                due_date: String::new(),
                tags: Vec::new(),
                metadata: BTreeMap::new(),
            }),
        }
    }

    pub fn from_record(record: TaskRecord) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            state: RwLock::new(TaskState {
                title: record.title,
                description: record.description,
                priority: record.priority,
                status: record.status,
                due_date: record.due_date,
                tags: record.tags,
                metadata: record.metadata,
            }),
        }
    }

    pub fn to_record(&self) -> TaskRecord {
        let state = self.state.read().clone();
        TaskRecord {
            id: self.id.clone(),
            title: state.title,
            description: state.description,
            priority: state.priority,
            status: state.status,
            created_at: self.created_at.clone(),
            due_date: state.due_date,
            tags: state.tags,
            metadata: state.metadata,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn priority(&self) -> Priority {
        self.state.read().priority
    }

    pub fn status(&self) -> Status {
        self.state.read().status
    }

    pub fn tags(&self) -> Vec<String> {
        self.state.read().tags.clone()
    }

    pub fn set_tags(&self, tags: Vec<String>) {
        self.state.write().tags = tags;
    }

    pub fn add_tag(&self, tag: String) {
        self.state.write().tags.push(tag);
    }

    pub fn complete(&self) -> Result<(), DomainError> {
        let mut state = self.state.write();
        if state.status == Status::Cancelled {
            return Err(DomainError::new("Cannot complete a cancelled task"));
        }
        state.status = Status::Completed;
        Ok(())
    }

    pub fn cancel(&self) -> Result<(), DomainError> {
        let mut state = self.state.write();
        if state.status == Status::Completed {
            return Err(DomainError::new("Cannot cancel a completed task"));
        }
        state.status = Status::Cancelled;
        Ok(())
    }

    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        let state = self.state.read();
        !state.status.is_closed() && clock::is_past(&state.due_date, today)
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(clock::today())
    }

    /// Case-insensitive match against title, description and tags
    pub fn matches(&self, needle: &str) -> bool {
        let state = self.state.read();
        state.title.to_lowercase().contains(needle)
            || state.description.to_lowercase().contains(needle)
            || state.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

fn string_list(value: Value) -> Result<Vec<String>, DomainError> {
    value.into_array()?.into_iter().map(Value::into_string).collect()
}

impl BoundaryObject for TaskImpl {
    fn get_property(&self, name: &str) -> Result<Value, DomainError> {
        let state = self.state.read();
        let value = match name {
            "id" => Value::Str(self.id.clone()),
            "title" => Value::Str(state.title.clone()),
            "description" => Value::Str(state.description.clone()),
            "priority" => state.priority.to_value(),
            "status" => state.status.to_value(),
            "created_at" => Value::Str(self.created_at.clone()),
            "due_date" => Value::Str(state.due_date.clone()),
            "tags" => Value::Array(state.tags.iter().cloned().map(Value::Str).collect()),
            _ => return Err(DomainError::unknown_member("ITask", name)),
        };
        Ok(value)
    }

    fn set_property(&self, name: &str, value: Value) -> Result<(), DomainError> {
        match name {
            "description" => self.state.write().description = value.into_string()?,
            "priority" => self.state.write().priority = Priority::from_value(&value)?,
            "status" => self.state.write().status = Status::from_value(&value)?,
            "due_date" => {
                let due = value.into_string()?;
                if !due.is_empty() && clock::parse_date(&due).is_none() {
                    return Err(DomainError::new(format!(
                        "Invalid due date '{}', expected YYYY-MM-DD",
                        due
                    )));
                }
                self.state.write().due_date = due;
            }
            "tags" => self.set_tags(string_list(value)?),
            _ => return Err(DomainError::unknown_member("ITask", name)),
        }
        Ok(())
    }

    fn invoke(&self, method: &str, args: Args) -> Result<Value, DomainError> {
        match method {
            "Complete" => self.complete().map(|_| Value::Void),
            "Cancel" => self.cancel().map(|_| Value::Void),
            "IsOverdue" => Ok(Value::Bool(self.is_overdue())),
            "GetMetadata" => Ok(Value::Dict(
                self.state
                    .read()
                    .metadata
                    .iter()
                    .map(|(k, v)| (Value::Str(k.clone()), Value::Str(v.clone())))
                    .collect(),
            )),
            "SetMetadata" => {
                let key = arg(&args, 0)?.as_str()?.to_string();
                let value = arg(&args, 1)?.as_str()?.to_string();
                self.state.write().metadata.insert(key, value);
                Ok(Value::Void)
            }
            _ => Err(DomainError::unknown_member("ITask", method)),
        }
    }
}
