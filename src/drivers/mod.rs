//! Driver registry and the Task contract every driver implements.
//!
//! A compile-time table of built-in constructors, matching the design
//! note that favors "a compile-time table of built-in drivers... rather
//! than seek a port" of the reference implementation's named-entry-point
//! plugin mechanism. The registry is an explicit value threaded through the
//! engine rather than a process-wide singleton, so tests can swap it.

pub mod ansible_runner;
pub mod directord;
pub mod local;
pub mod noop;
pub mod print;
pub mod service;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskCoreError;
use crate::graph::result::TaskResult;
use crate::model::TaskDefinition;

/// The contract every driver satisfies. One instance is constructed per
/// task at graph-build time and executed at most once.
#[async_trait]
pub trait DriverTask: Send + Sync {
    fn name(&self) -> String {
        format!("{}-{}", self.service(), self.task_id())
    }
    fn service(&self) -> &str;
    fn task_id(&self) -> &str;
    fn provides(&self) -> &[String];
    fn requires(&self) -> &[String];
    fn hosts(&self) -> &[String];

    /// Run the task, given the resolved inputs bound from every producer
    /// this task requires. Returns one `TaskResult` per provided symbol,
    /// or a single result if `provides` is a singleton or empty.
    async fn execute(
        &self,
        inputs: &HashMap<String, serde_json::Value>,
    ) -> Result<Vec<TaskResult>, TaskCoreError>;
}

type Constructor = fn(
    service: String,
    data: TaskDefinition,
    hosts: Vec<String>,
) -> Result<Arc<dyn DriverTask>, TaskCoreError>;

/// Maps `driver` strings to constructors. Built once at startup and passed
/// to the engine; unknown names are a fatal `UnknownDriver` error.
pub struct DriverRegistry {
    constructors: HashMap<String, Constructor>,
}

impl DriverRegistry {
    /// The six built-in drivers named by the design.
    pub fn builtin() -> Self {
        let mut constructors: HashMap<String, Constructor> = HashMap::new();
        constructors.insert("service".to_string(), service::construct);
        constructors.insert("directord".to_string(), directord::construct);
        constructors.insert("print".to_string(), print::construct);
        constructors.insert("ansible_runner".to_string(), ansible_runner::construct);
        constructors.insert("local".to_string(), local::construct);
        constructors.insert("noop".to_string(), noop::construct);
        Self { constructors }
    }

    pub fn register(&mut self, name: impl Into<String>, constructor: Constructor) {
        self.constructors.insert(name.into(), constructor);
    }

    /// Build a driver instance for `name`. An unknown name is a fatal
    /// error per the Task construction/dispatch design.
    pub fn build(
        &self,
        name: &str,
        service: String,
        data: TaskDefinition,
        hosts: Vec<String>,
    ) -> Result<Arc<dyn DriverTask>, TaskCoreError> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| TaskCoreError::UnknownDriver(name.to_string()))?;
        constructor(service, data, hosts)
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> TaskDefinition {
        TaskDefinition {
            id: id.to_string(),
            driver: "service".to_string(),
            action: None,
            provides: vec![],
            requires: vec![],
            needed_by: vec![],
            extra: Default::default(),
        }
    }

    #[test]
    fn unknown_driver_name_is_fatal() {
        let registry = DriverRegistry::builtin();
        let err = registry
            .build("doesnotexist", "svc".into(), task("t"), vec![])
            .unwrap_err();
        assert!(matches!(err, TaskCoreError::UnknownDriver(name) if name == "doesnotexist"));
    }

    #[test]
    fn builtin_drivers_with_no_extra_fields_are_constructible() {
        let registry = DriverRegistry::builtin();
        for name in ["service", "directord", "print", "noop"] {
            assert!(registry.build(name, "svc".into(), task("t"), vec![]).is_ok());
        }
    }
}
