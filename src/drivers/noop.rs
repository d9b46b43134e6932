//! The `noop` driver: always succeeds, returning `{id, hosts}` as its data
//! so a dry-run can still trace which hosts would have been targeted.
//! Substituted for every task's registered driver when `--noop` is given.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::DriverTask;
use crate::error::TaskCoreError;
use crate::graph::result::TaskResult;
use crate::model::TaskDefinition;

pub struct NoopTask {
    service: String,
    data: TaskDefinition,
    hosts: Vec<String>,
}

pub fn construct(
    service: String,
    data: TaskDefinition,
    hosts: Vec<String>,
) -> Result<Arc<dyn DriverTask>, TaskCoreError> {
    Ok(Arc::new(NoopTask { service, data, hosts }))
}

#[async_trait]
impl DriverTask for NoopTask {
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
        let data = json!({ "id": self.task_id(), "hosts": self.hosts });
        let slots = self.provides().len().max(1);
        Ok(vec![TaskResult::success(data); slots])
    }
}
