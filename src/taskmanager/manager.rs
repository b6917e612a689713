//! Native `ITaskManager` and its JSON persistence

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use idlbridge_runtime::{arg, Args, BoundaryObject, DomainError, Value};

use super::project::ProjectImpl;
use super::task::TaskImpl;
use super::types::{ManagerRecord, Priority, FORMAT_VERSION};
use super::{native_ids, next_project_id, Owned};

#[derive(Debug, Default)]
struct ManagerState {
    projects: Vec<Owned<ProjectImpl>>,
    settings: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct ManagerImpl {
    state: RwLock<ManagerState>,
}

impl ManagerImpl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_project(&self, name: &str) -> Result<Owned<ProjectImpl>, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::new("Project name must not be empty"));
        }
        let project = Owned::new(
            native_ids()?.project,
            ProjectImpl::new(next_project_id(), name.to_string()),
        );
        self.state.write().projects.push(project.clone());
        Ok(project)
    }

    pub fn project(&self, project_id: &str) -> Option<Owned<ProjectImpl>> {
        self.state
            .read()
            .projects
            .iter()
            .find(|p| p.native.id() == project_id)
            .cloned()
    }

    pub fn projects(&self) -> Vec<Owned<ProjectImpl>> {
        self.state.read().projects.clone()
    }

    pub fn delete_project(&self, project_id: &str) -> bool {
        let removed = {
            let mut state = self.state.write();
            let index = state.projects.iter().position(|p| p.native.id() == project_id);
            index.map(|i| state.projects.remove(i))
        };
        removed.is_some()
    }

    /// Every task of every project, projects in creation order
    pub fn all_tasks(&self) -> Vec<Owned<TaskImpl>> {
        self.projects()
            .iter()
            .flat_map(|p| p.native.tasks())
            .collect()
    }

    /// Case-insensitive search; an empty query matches every task
    pub fn search(&self, query: &str) -> Vec<Owned<TaskImpl>> {
        let needle = query.trim().to_lowercase();
        self.all_tasks()
            .into_iter()
            .filter(|t| t.native.matches(&needle))
            .collect()
    }

    pub fn all_tags(&self) -> BTreeSet<String> {
        self.all_tasks()
            .iter()
            .flat_map(|t| t.native.tags())
            .collect()
    }

    pub fn settings(&self) -> BTreeMap<String, String> {
        self.state.read().settings.clone()
    }

    pub fn to_record(&self) -> ManagerRecord {
        let state = self.state.read();
        ManagerRecord {
            version: FORMAT_VERSION,
            settings: state.settings.clone(),
            projects: state.projects.iter().map(|p| p.native.to_record()).collect(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), DomainError> {
        let record = self.to_record();
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| DomainError::new(format!("Failed to serialize task data: {}", e)))?;
        fs::write(path, json).map_err(|e| {
            DomainError::new(format!("Failed to save {}: {}", path.display(), e))
        })?;

        info!(
            target: "idlbridge::taskmanager",
            path = %path.display(),
            projects = record.projects.len(),
            "task data saved"
        );
        Ok(())
    }

    /// Replace all projects and settings with the file's contents
    ///
    /// Handles the caller still holds to earlier projects stay valid but are
    /// no longer part of this manager.
    pub fn load(&self, path: &Path) -> Result<(), DomainError> {
        let content = fs::read_to_string(path).map_err(|e| {
            DomainError::new(format!("Failed to load {}: {}", path.display(), e))
        })?;
        let record: ManagerRecord = serde_json::from_str(&content).map_err(|e| {
            DomainError::new(format!("Invalid task data in {}: {}", path.display(), e))
        })?;
        if record.version > FORMAT_VERSION {
            return Err(DomainError::new(format!(
                "Unsupported task data version {} (newest supported is {})",
                record.version, FORMAT_VERSION
            )));
        }

        let project_iface = native_ids()?.project;
        let projects = record
            .projects
            .into_iter()
            .map(|p| Ok(Owned::new(project_iface, ProjectImpl::from_record(p)?)))
            .collect::<Result<Vec<_>, DomainError>>()?;
        let count = projects.len();

        let previous = {
            let mut state = self.state.write();
            state.settings = record.settings;
            std::mem::replace(&mut state.projects, projects)
        };
        debug!(
            target: "idlbridge::taskmanager",
            replaced = previous.len(),
            "previous projects detached"
        );
        drop(previous);

        info!(target: "idlbridge::taskmanager", path = %path.display(), projects = count, "task data loaded");
        Ok(())
    }
}

fn object_list<T>(items: impl IntoIterator<Item = Owned<T>>) -> Value {
    Value::Array(items.into_iter().map(|o| Value::Object(o.obj)).collect())
}

fn string_map(value: Value) -> Result<Vec<(String, String)>, DomainError> {
    value
        .into_dict()?
        .into_iter()
        .map(|(k, v)| Ok((k.into_string()?, v.into_string()?)))
        .collect()
}

impl BoundaryObject for ManagerImpl {
    fn get_property(&self, name: &str) -> Result<Value, DomainError> {
        Err(DomainError::unknown_member("ITaskManager", name))
    }

    fn set_property(&self, name: &str, _value: Value) -> Result<(), DomainError> {
        Err(DomainError::unknown_member("ITaskManager", name))
    }

    fn invoke(&self, method: &str, args: Args) -> Result<Value, DomainError> {
        match method {
            "CreateProject" => {
                let name = arg(&args, 0)?.as_str()?;
                Ok(Value::Object(self.create_project(name)?.obj))
            }
            "GetProject" => {
                let project_id = arg(&args, 0)?.as_str()?;
                self.project(project_id)
                    .map(|p| Value::Object(p.obj))
                    .ok_or_else(|| DomainError::new(format!("Project not found: {}", project_id)))
            }
            "GetProjects" => Ok(object_list(self.projects())),
            "GetActiveProjects" => Ok(object_list(
                self.projects().into_iter().filter(|p| p.native.is_active()),
            )),
            "DeleteProject" => Ok(Value::Bool(self.delete_project(arg(&args, 0)?.as_str()?))),
            "SearchTasks" => Ok(object_list(self.search(arg(&args, 0)?.as_str()?))),
            "GetTasksByPriority" => {
                let priority = Priority::from_value(arg(&args, 0)?)?;
                Ok(object_list(
                    self.all_tasks()
                        .into_iter()
                        .filter(|t| t.native.priority() == priority),
                ))
            }
            "GetOverdueTasks" => Ok(object_list(
                self.all_tasks().into_iter().filter(|t| t.native.is_overdue()),
            )),
            "GetAllTags" => Ok(Value::Set(self.all_tags().into_iter().map(Value::Str).collect())),
            "GetSettings" => Ok(Value::Dict(
                self.settings()
                    .into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::Str(v)))
                    .collect(),
            )),
            "UpdateSettings" => {
                let updates = string_map(args.into_iter().next().unwrap_or_default())?;
                self.state.write().settings.extend(updates);
                Ok(Value::Void)
            }
            "Save" => {
                self.save(Path::new(arg(&args, 0)?.as_str()?))?;
                Ok(Value::Void)
            }
            "Load" => {
                self.load(Path::new(arg(&args, 0)?.as_str()?))?;
                Ok(Value::Void)
            }
            _ => Err(DomainError::unknown_member("ITaskManager", method)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taskmanager::Status;

    fn single(value: &str) -> Args {
        let mut args = Args::new();
        args.push(Value::from(value));
        args
    }

    #[test]
    fn test_search_and_tags() {
        let manager = ManagerImpl::new();
        let project = manager.create_project("Home").unwrap();
        let paint = project.native.create_task("Paint fence", "white").unwrap();
        paint.native.set_tags(vec!["outdoor".to_string(), "weekend".to_string()]);
        let taxes = project.native.create_task("File taxes", "").unwrap();
        taxes.native.add_tag("weekend".to_string());

        assert_eq!(manager.search("FENCE").len(), 1);
        assert_eq!(manager.search("weekend").len(), 2);
        assert_eq!(manager.search("").len(), 2);
        assert!(manager.search("garage").is_empty());

        let tags: Vec<_> = manager.all_tags().into_iter().collect();
        assert_eq!(tags, vec!["outdoor", "weekend"]);
    }

    #[test]
    fn test_missing_project() {
        let manager = ManagerImpl::new();
        let err = manager.invoke("GetProject", single("proj-missing")).unwrap_err();
        assert_eq!(err.message(), "Project not found: proj-missing");
        assert!(!manager.delete_project("proj-missing"));
    }

    #[test]
    fn test_settings_merge() {
        let manager = ManagerImpl::new();
        let mut args = Args::new();
        args.push(Value::Dict(vec![
            (Value::from("theme"), Value::from("dark")),
            (Value::from("week_start"), Value::from("monday")),
        ]));
        manager.invoke("UpdateSettings", args).unwrap();

        let mut args = Args::new();
        args.push(Value::Dict(vec![(Value::from("theme"), Value::from("light"))]));
        manager.invoke("UpdateSettings", args).unwrap();

        let settings = manager.settings();
        assert_eq!(settings.len(), 2);
        assert_eq!(settings["theme"], "light");
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");

        let manager = ManagerImpl::new();
        let project = manager.create_project("Release").unwrap();
        let task = project.native.create_task("Tag build", "v1.2").unwrap();
        task.native.complete().unwrap();
        manager.save(&path).unwrap();

        let restored = ManagerImpl::new();
        restored.load(&path).unwrap();
        assert_eq!(restored.to_record(), manager.to_record());

        let loaded = restored.all_tasks();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].native.status(), Status::Completed);
        assert_ne!(loaded[0].obj, task.obj);
    }

    #[test]
    fn test_load_failures() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ManagerImpl::new();

        let missing = dir.path().join("absent.json");
        assert!(manager.load(&missing).unwrap_err().message().starts_with("Failed to load"));

        let garbage = dir.path().join("garbage.json");
        fs::write(&garbage, "{ not json").unwrap();
        assert!(manager.load(&garbage).unwrap_err().message().starts_with("Invalid task data"));

        let future = dir.path().join("future.json");
        fs::write(&future, r#"{"version": 99}"#).unwrap();
        assert_eq!(
            manager.load(&future).unwrap_err().message(),
            "Unsupported task data version 99 (newest supported is 1)"
        );
    }
}
