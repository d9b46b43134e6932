//! Service model: task definitions owned by a service, host projection, and
//! the cross-service dependency reconciler.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::TaskCoreError;
use crate::loader::{self, Definition};
use crate::schema::{self, SchemaKind};

fn default_driver() -> String {
    "service".to_string()
}

/// A single task definition as it appears under a service's `tasks:` list.
///
/// Driver-specific keys (`jobs`, `message`, `playbook`, `working_dir`,
/// `command`, `quiet`, `returncodes`, `runner_options`, ...) are preserved
/// verbatim in `extra` and interpreted by the driver that claims this
/// task's `driver` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDefinition {
    pub id: String,
    #[serde(default = "default_driver")]
    pub driver: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub provides: Vec<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default, rename = "needed-by")]
    pub needed_by: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

/// `Service.version`, parsed into an ordered tuple of integers.
/// Informational only — never used by scheduling.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version(pub Vec<u64>);

impl Version {
    pub fn parse(raw: &str) -> Self {
        Version(
            raw.split('.')
                .map(|part| part.parse::<u64>().unwrap_or(0))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServiceData {
    id: String,
    #[serde(default = "default_type")]
    #[serde(rename = "type")]
    type_: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    requires: Vec<String>,
    tasks: Vec<TaskDefinition>,
}

fn default_type() -> String {
    "service".to_string()
}

/// A loaded service document: its own metadata, its task definitions, and
/// the set of hosts projected onto it.
#[derive(Debug, Clone)]
pub struct Service {
    id: String,
    type_: String,
    version: Version,
    requires: Vec<String>,
    tasks: Vec<TaskDefinition>,
    hosts: Vec<String>,
}

impl Service {
    pub fn load(definition: &Definition) -> Result<Self, TaskCoreError> {
        let path = describe(definition);
        let doc = loader::load(definition, false)?;

        let json: serde_json::Value = serde_json::to_value(&doc)?;
        schema::validator(SchemaKind::Service).validate(&path, &json)?;

        let data: ServiceData = serde_yaml::from_value(doc)?;
        Ok(Self {
            id: data.id,
            type_: data.type_,
            version: data.version.as_deref().map(Version::parse).unwrap_or_default(),
            requires: data.requires,
            tasks: data.tasks,
            hosts: Vec::new(),
        })
    }

    #[cfg(test)]
    pub fn from_parts(id: impl Into<String>, tasks: Vec<TaskDefinition>) -> Self {
        Self {
            id: id.into(),
            type_: default_type(),
            version: Version::default(),
            requires: Vec::new(),
            tasks,
            hosts: Vec::new(),
        }
    }

    /// Unique name within a run. Services are keyed by `id`, matching the
    /// reference implementation's `BaseFileData.name`.
    pub fn name(&self) -> &str {
        &self.id
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn type_(&self) -> &str {
        &self.type_
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// A service's own provides: its id. Advisory only, never wired into
    /// the task graph.
    pub fn provides(&self) -> &str {
        &self.id
    }

    pub fn requires(&self) -> &[String] {
        &self.requires
    }

    pub fn tasks(&self) -> &[TaskDefinition] {
        &self.tasks
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Project a host onto this service.
    pub fn add_host(&mut self, host: impl Into<String>) {
        self.hosts.push(host.into());
    }

    /// `{symbol -> union-of-provides}` for every `needed-by` declaration
    /// this service's tasks make. Step one of the two-pass reconciliation.
    pub fn get_tasks_needed_by(&self) -> HashMap<String, Vec<String>> {
        let mut needed_by: HashMap<String, Vec<String>> = HashMap::new();
        for task in &self.tasks {
            for symbol in &task.needed_by {
                let entry = needed_by.entry(symbol.clone()).or_default();
                for p in &task.provides {
                    if !entry.contains(p) {
                        entry.push(p.clone());
                    }
                }
            }
        }
        needed_by
    }

    /// Step two of reconciliation: for every task, if any of its `provides`
    /// is a key in `needed_by`, union the corresponding values into its
    /// `requires`. Idempotent — running it again with the same map is a
    /// no-op since union already contains the values.
    pub fn update_task_requires(&mut self, needed_by: &HashMap<String, Vec<String>>) {
        for task in &mut self.tasks {
            let mut additions = Vec::new();
            for provided in &task.provides {
                if let Some(values) = needed_by.get(provided) {
                    for v in values {
                        if !task.requires.contains(v) && !additions.contains(v) {
                            additions.push(v.clone());
                        }
                    }
                }
            }
            task.requires.extend(additions);
        }
    }
}

fn describe(definition: &Definition) -> String {
    match definition {
        crate::loader::Definition::File(p) | crate::loader::Definition::Directory(p) => {
            p.display().to_string()
        }
        crate::loader::Definition::InMemory(_) => "<in-memory>".to_string(),
    }
}

/// Keyed store of loaded services, as produced by `load_services` (see
/// `engine`).
pub type ServiceMap = BTreeMap<String, Service>;
