//! The `local` driver: runs `command` through a shell on the machine
//! running the engine (not one of the projected hosts).
//!
//! Grounded on `test_tasks.py::TestLocalTask`: stdout is streamed
//! line-by-line unless `quiet` is set, in which case output and stderr are
//! captured in full; success is any return code in `returncodes` (default
//! `[0]`).

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use super::DriverTask;
use crate::error::TaskCoreError;
use crate::graph::result::TaskResult;
use crate::model::TaskDefinition;

pub struct LocalTask {
    service: String,
    data: TaskDefinition,
    hosts: Vec<String>,
}

impl LocalTask {
    pub fn command(&self) -> String {
        self.data
            .extra
            .get("command")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    pub fn quiet(&self) -> bool {
        self.data
            .extra
            .get("quiet")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn returncodes(&self) -> Vec<i32> {
        self.data
            .extra
            .get("returncodes")
            .and_then(|v| v.as_sequence())
            .map(|seq| seq.iter().filter_map(|v| v.as_i64()).map(|v| v as i32).collect())
            .unwrap_or_else(|| vec![0])
    }
}

pub fn construct(
    service: String,
    data: TaskDefinition,
    hosts: Vec<String>,
) -> Result<Arc<dyn DriverTask>, TaskCoreError> {
    Ok(Arc::new(LocalTask { service, data, hosts }))
}

#[async_trait]
impl DriverTask for LocalTask {
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
        let command = self.command().trim().to_string();
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .stdout(Stdio::piped())
            .stderr(if self.quiet() { Stdio::piped() } else { Stdio::null() })
            .spawn()
            .map_err(|e| TaskCoreError::execution_failed(self.name(), e.to_string()))?;

        let data = if self.quiet() {
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            if let Some(mut out) = child.stdout.take() {
                let _ = out.read_to_end(&mut stdout).await;
            }
            if let Some(mut err) = child.stderr.take() {
                let _ = err.read_to_end(&mut stderr).await;
            }
            let status = child
                .wait()
                .await
                .map_err(|e| TaskCoreError::execution_failed(self.name(), e.to_string()))?;
            let returncode = status.code().unwrap_or(-1);
            json!({
                "id": self.task_id(),
                "command": command,
                "output": String::from_utf8_lossy(&stdout),
                "errors": String::from_utf8_lossy(&stderr),
                "returncode": returncode,
            })
        } else {
            if let Some(out) = child.stdout.take() {
                let mut lines = BufReader::new(out).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::info!(%line, "local output");
                }
            }
            let status = child
                .wait()
                .await
                .map_err(|e| TaskCoreError::execution_failed(self.name(), e.to_string()))?;
            let returncode = status.code().unwrap_or(-1);
            json!({ "id": self.task_id(), "command": command, "returncode": returncode })
        };

        let returncode = data["returncode"].as_i64().unwrap_or(-1) as i32;
        let status = self.returncodes().contains(&returncode);
        let slots = self.provides().len().max(1);
        Ok(vec![TaskResult { status, data }; slots])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(extra_yaml: &str) -> LocalTask {
        let extra: serde_yaml::Mapping = serde_yaml::from_str(extra_yaml).unwrap();
        LocalTask {
            service: "foo".to_string(),
            data: TaskDefinition {
                id: "local".to_string(),
                driver: "local".to_string(),
                action: None,
                provides: vec!["local".to_string()],
                requires: vec!["local".to_string()],
                needed_by: vec![],
                extra,
            },
            hosts: vec!["host-a".to_string(), "host-b".to_string()],
        }
    }

    #[test]
    fn command_and_returncodes_parse_from_extra() {
        let t = task("command: |\n  sleep 10\nreturncodes: [0, 2]\n");
        assert_eq!(t.command().trim(), "sleep 10");
        assert_eq!(t.returncodes(), vec![0, 2]);
        assert!(!t.quiet());
    }

    #[tokio::test]
    async fn echo_command_succeeds() {
        let t = task("command: \"echo hi\"\n");
        let result = t.execute(&HashMap::new()).await.unwrap();
        assert!(result[0].status);
        assert_eq!(result[0].data["returncode"], 0);
    }

    #[tokio::test]
    async fn non_matching_returncode_is_failure() {
        let t = task("command: \"exit 5\"\nreturncodes: [0]\n");
        let result = t.execute(&HashMap::new()).await.unwrap();
        assert!(!result[0].status);
        assert_eq!(result[0].data["returncode"], 5);
    }
}
