//! The default `service` driver: runs a list of `jobs` against the task's
//! projected hosts.
//!
//! Grounded on `tasks.py::ServiceTask`: a job shaped `{echo: "..."}` is
//! logged and simulates variable-duration work; any other job shape logs
//! "Unknown action" and is otherwise ignored. Always reports success — the
//! stub never fails on its own, matching the reference behavior.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng as _;
use serde_json::Value;

use super::DriverTask;
use crate::error::TaskCoreError;
use crate::graph::result::TaskResult;
use crate::model::TaskDefinition;

pub struct ServiceTask {
    service: String,
    data: TaskDefinition,
    hosts: Vec<String>,
}

impl ServiceTask {
    pub fn new(service: String, data: TaskDefinition, hosts: Vec<String>) -> Self {
        tracing::info!(
            name = %format!("{}-{}", service, data.id),
            provides = ?data.provides,
            requires = ?data.requires,
            "creating service task"
        );
        Self { service, data, hosts }
    }

    fn jobs(&self) -> Vec<serde_yaml::Value> {
        self.data
            .extra
            .get("jobs")
            .and_then(|v| v.as_sequence())
            .cloned()
            .unwrap_or_default()
    }
}

pub fn construct(
    service: String,
    data: TaskDefinition,
    hosts: Vec<String>,
) -> Result<std::sync::Arc<dyn DriverTask>, TaskCoreError> {
    Ok(std::sync::Arc::new(ServiceTask::new(service, data, hosts)))
}

#[async_trait]
impl DriverTask for ServiceTask {
    fn service(&self) -> &str {
        &self.service
    }

    fn task_id(&self) -> &str {
        &self.data.id
    }

    fn provides(&self) -> &[String] {
        &self.data.provides
    }

    fn requires(&self) -> &[String] {
        &self.data.requires
    }

    fn hosts(&self) -> &[String] {
        &self.hosts
    }

    async fn execute(
        &self,
        _inputs: &HashMap<String, Value>,
    ) -> Result<Vec<TaskResult>, TaskCoreError> {
        tracing::info!(
            name = %self.name(),
            hosts = ?self.hosts,
            "task execute"
        );
        for job in self.jobs() {
            if let Some(echo) = job.get("echo") {
                let message = echo.as_str().unwrap_or_default();
                tracing::info!(%message, "echo");
                let millis = rand::thread_rng().gen_range(0..1000);
                tokio::time::sleep(Duration::from_millis(millis)).await;
            } else {
                tracing::info!(?job, "unknown action");
            }
        }
        let slots = self.provides().len().max(1);
        Ok(vec![TaskResult::success_empty(); slots])
    }
}
