//! Enumerations and persisted records of the TaskManager model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use idlbridge_runtime::{DomainError, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low = 0,
    #[default]
    Medium = 1,
    High = 2,
    Critical = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Todo = 0,
    InProgress = 1,
    Completed = 2,
    Cancelled = 3,
}

impl Priority {
    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        match value.as_enum()? {
            0 => Ok(Self::Low),
            1 => Ok(Self::Medium),
            2 => Ok(Self::High),
            3 => Ok(Self::Critical),
            other => Err(DomainError::new(format!("{} is not a Priority", other))),
        }
    }

    pub fn to_value(self) -> Value {
        Value::Enum(self as i64)
    }
}

impl Status {
    pub const ALL: [Status; 4] = [Self::Todo, Self::InProgress, Self::Completed, Self::Cancelled];

    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        match value.as_enum()? {
            0 => Ok(Self::Todo),
            1 => Ok(Self::InProgress),
            2 => Ok(Self::Completed),
            3 => Ok(Self::Cancelled),
            other => Err(DomainError::new(format!("{} is not a Status", other))),
        }
    }

    pub fn to_value(self) -> Value {
        Value::Enum(self as i64)
    }

    /// Completed or cancelled
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
    pub created_at: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

/// Document written by `ITaskManager.Save`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
}

pub const FORMAT_VERSION: u32 = 1;

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    FORMAT_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_values() {
        assert_eq!(Priority::from_value(&Value::Enum(3)).unwrap(), Priority::Critical);
        assert_eq!(Status::from_value(&Value::Enum(1)).unwrap(), Status::InProgress);
        assert!(Priority::from_value(&Value::Enum(9)).is_err());
        assert!(Status::Cancelled.is_closed());
        assert!(!Status::InProgress.is_closed());
    }

    #[test]
    fn test_record_defaults() {
        let record: TaskRecord =
            serde_json::from_str(r#"{"id": "task-1", "title": "t", "created_at": "2024-01-01T00:00:00Z"}"#)
                .unwrap();
        assert_eq!(record.priority, Priority::Medium);
        assert_eq!(record.status, Status::Todo);
        assert!(record.tags.is_empty());

        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
