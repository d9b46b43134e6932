//! The `directord` driver: dispatches `jobs` to a remote-agent cluster and
//! polls for completion.
//!
//! Grounded on `tasks.py::DirectorServiceTask` and
//! `test_tasks.py::TestDirectordTask`: an orchestration request carries the
//! job list and the task's projected hosts as `defined_targets`; each
//! returned job id is polled with a back-off until it reports done. A
//! failed poll raises `ExecutionFailed`. The actual remote-agent client is
//! a pluggable collaborator — out of scope per the design (no driver
//! credential management) — so the built-in client is a stub that
//! immediately reports success for every orchestration it is handed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::DriverTask;
use crate::error::TaskCoreError;
use crate::graph::result::TaskResult;
use crate::model::TaskDefinition;

/// The remote-agent cluster client contract. Out of scope for credential
/// management; only dispatch and polling are specified.
#[async_trait]
pub trait DirectordClient: Send + Sync {
    async fn orchestrate(
        &self,
        jobs: Vec<Value>,
        defined_targets: Vec<String>,
    ) -> Result<Vec<String>, TaskCoreError>;

    async fn poll(&self, job_id: &str) -> Result<(bool, String), TaskCoreError>;
}

/// No real back end configured: orchestrate trivially succeeds with no
/// job ids to poll.
pub struct StubDirectordClient;

#[async_trait]
impl DirectordClient for StubDirectordClient {
    async fn orchestrate(
        &self,
        _jobs: Vec<Value>,
        _defined_targets: Vec<String>,
    ) -> Result<Vec<String>, TaskCoreError> {
        Ok(vec![])
    }

    async fn poll(&self, _job_id: &str) -> Result<(bool, String), TaskCoreError> {
        Ok((true, String::new()))
    }
}

pub struct DirectordTask {
    service: String,
    data: TaskDefinition,
    hosts: Vec<String>,
    client: Arc<dyn DirectordClient>,
}

impl DirectordTask {
    pub fn with_client(mut self, client: Arc<dyn DirectordClient>) -> Self {
        self.client = client;
        self
    }

    pub fn jobs(&self) -> Vec<Value> {
        self.data
            .extra
            .get("jobs")
            .and_then(|v| v.as_sequence())
            .map(|seq| {
                seq.iter()
                    .filter_map(|v| serde_yaml::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub fn construct(
    service: String,
    data: TaskDefinition,
    hosts: Vec<String>,
) -> Result<Arc<dyn DriverTask>, TaskCoreError> {
    Ok(Arc::new(DirectordTask {
        service,
        data,
        hosts,
        client: Arc::new(StubDirectordClient),
    }))
}

#[async_trait]
impl DriverTask for DirectordTask {
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
        let job_ids = self.client.orchestrate(self.jobs(), self.hosts.clone()).await?;

        let mut backoff = Duration::from_millis(50);
        for job_id in &job_ids {
            loop {
                let (done, message) = self.client.poll(job_id).await?;
                if done {
                    break;
                }
                if !message.is_empty() {
                    return Err(TaskCoreError::execution_failed(self.name(), message));
                }
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(Duration::from_secs(5));
            }
        }

        let data = json!({ "job_ids": job_ids });
        let slots = self.provides().len().max(1);
        Ok(vec![TaskResult { status: true, data }; slots])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingClient;

    #[async_trait]
    impl DirectordClient for FailingClient {
        async fn orchestrate(
            &self,
            _jobs: Vec<Value>,
            _defined_targets: Vec<String>,
        ) -> Result<Vec<String>, TaskCoreError> {
            Ok(vec!["foo".to_string()])
        }

        async fn poll(&self, _job_id: &str) -> Result<(bool, String), TaskCoreError> {
            Ok((false, "meh".to_string()))
        }
    }

    fn task() -> DirectordTask {
        let extra: serde_yaml::Mapping = serde_yaml::from_str(
            "jobs:\n  - RUN: dnf -y install chrony crudini\n  - RUN: systemctl start chronyd\n",
        )
        .unwrap();
        DirectordTask {
            service: "foo".to_string(),
            data: TaskDefinition {
                id: "setup".to_string(),
                driver: "directord".to_string(),
                action: Some("run".to_string()),
                provides: vec!["chronyd.init".to_string()],
                requires: vec!["base.init".to_string()],
                needed_by: vec![],
                extra,
            },
            hosts: vec!["host-a".to_string(), "host-b".to_string()],
            client: Arc::new(StubDirectordClient),
        }
    }

    #[tokio::test]
    async fn empty_orchestrate_result_succeeds_without_polling() {
        let t = task();
        let result = t.execute(&HashMap::new()).await.unwrap();
        assert!(result[0].status);
    }

    #[tokio::test]
    async fn failed_poll_raises_execution_failed() {
        let t = task().with_client(Arc::new(FailingClient));
        let err = t.execute(&HashMap::new()).await.unwrap_err();
        assert!(matches!(err, TaskCoreError::ExecutionFailed { .. }));
    }
}
