//! Error taxonomy for the core.
//!
//! One `thiserror`-derived enum covers every fatal and per-task error kind
//! named by the design: artifact loading, schema validation, projection,
//! dependency reconciliation/graph build, and driver execution. Each fatal
//! variant carries enough context to name the offending artifact and the
//! rule it violated, so the CLI can log a useful message without the caller
//! reconstructing it.

use thiserror::Error;

/// Gives a caller a one-line remediation hint for the common cases.
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Every way a run can fail, per the error handling design.
#[derive(Error, Debug)]
pub enum TaskCoreError {
    /// The loader was asked to interpret a definition it doesn't recognize,
    /// or a directory merge hit a non-mapping value where a mapping was
    /// expected.
    #[error("invalid file data in '{path}': {reason}")]
    InvalidFileData { path: String, reason: String },

    /// An artifact failed schema validation.
    #[error("schema validation failed for '{path}': {reason}")]
    SchemaValidation { path: String, reason: String },

    /// A role was referenced (by an inventory host, or at the CLI) that is
    /// not defined in the roles document.
    #[error("role '{role}' is not defined")]
    InvalidRole { role: String },

    /// A service was referenced by a role, or by a host's projection, that
    /// is not defined in the loaded service set.
    #[error("service '{service}' is not defined")]
    InvalidService { service: String },

    /// A required symbol has no producer in the graph, or reconciliation
    /// produced a cycle.
    #[error("dependency failure: {reason}")]
    DependencyFailure { reason: String },

    /// A driver reported a non-success result.
    #[error("task '{task}' failed: {reason}")]
    ExecutionFailed { task: String, reason: String },

    /// An optional collaborator (graph renderer, remote-agent client,
    /// configuration-management-runner client) was unavailable at the
    /// point of use.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Unknown driver name requested from the registry.
    #[error("no driver registered for '{0}'")]
    UnknownDriver(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TaskCoreError {
    pub fn invalid_file_data(path: impl Into<String>, reason: impl Into<String>) -> Self {
        TaskCoreError::InvalidFileData {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn schema_validation(path: impl Into<String>, reason: impl Into<String>) -> Self {
        TaskCoreError::SchemaValidation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn dependency_failure(reason: impl Into<String>) -> Self {
        TaskCoreError::DependencyFailure {
            reason: reason.into(),
        }
    }

    pub fn execution_failed(task: impl Into<String>, reason: impl Into<String>) -> Self {
        TaskCoreError::ExecutionFailed {
            task: task.into(),
            reason: reason.into(),
        }
    }
}

impl FixSuggestion for TaskCoreError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            TaskCoreError::InvalidFileData { .. } => {
                Some("definitions must be a file path, directory path, or in-memory mapping")
            }
            TaskCoreError::SchemaValidation { .. } => {
                Some("check the document against inventory.yaml/roles.yaml/service.yaml")
            }
            TaskCoreError::InvalidRole { .. } => {
                Some("add the role to the roles document, or fix the inventory's role field")
            }
            TaskCoreError::InvalidService { .. } => {
                Some("add the service definition, or fix the role's services list")
            }
            TaskCoreError::DependencyFailure { .. } => {
                Some("every requires/needed-by symbol must be provided by exactly one task")
            }
            TaskCoreError::ExecutionFailed { .. } => {
                Some("check the task's driver-specific fields and the driver's diagnostic payload")
            }
            TaskCoreError::Unavailable(_) => {
                Some("this collaborator is optional; the run can continue without it")
            }
            TaskCoreError::UnknownDriver(_) => Some(
                "use one of: service, directord, print, ansible_runner, local, noop",
            ),
            TaskCoreError::Io(_) => Some("check the path exists and has correct permissions"),
            TaskCoreError::Yaml(_) => Some("check YAML syntax: indentation, quoting, anchors"),
            TaskCoreError::Json(_) => None,
        }
    }
}
