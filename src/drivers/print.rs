//! The `print` driver: logs a message and reports success with no data.
//! The simplest possible driver — useful for tests and documentation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::DriverTask;
use crate::error::TaskCoreError;
use crate::graph::result::TaskResult;
use crate::model::TaskDefinition;

pub struct PrintTask {
    service: String,
    data: TaskDefinition,
    hosts: Vec<String>,
}

impl PrintTask {
    pub fn message(&self) -> Option<&str> {
        self.data.extra.get("message").and_then(|v| v.as_str())
    }
}

pub fn construct(
    service: String,
    data: TaskDefinition,
    hosts: Vec<String>,
) -> Result<Arc<dyn DriverTask>, TaskCoreError> {
    Ok(Arc::new(PrintTask { service, data, hosts }))
}

#[async_trait]
impl DriverTask for PrintTask {
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
        if let Some(message) = self.message() {
            tracing::info!(%message, "print");
        }
        let slots = self.provides().len().max(1);
        Ok(vec![TaskResult::success_empty(); slots])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn print_reports_success_with_empty_data() {
        let extra: serde_yaml::Mapping =
            serde_yaml::from_str("message: \"message from service a\"\n").unwrap();
        let data = TaskDefinition {
            id: "print".to_string(),
            driver: "print".to_string(),
            action: None,
            provides: vec![],
            requires: vec![],
            needed_by: vec![],
            extra,
        };
        let task = PrintTask {
            service: "foo".to_string(),
            data,
            hosts: vec!["host-a".to_string(), "host-b".to_string()],
        };
        assert_eq!(task.message(), Some("message from service a"));
        let result = task.execute(&HashMap::new()).await.unwrap();
        assert!(result[0].status);
        assert_eq!(result[0].data, serde_json::json!({}));
    }
}
