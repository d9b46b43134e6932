//! The `ansible_runner` driver: runs a playbook against the task's
//! projected hosts via `ansible-playbook`, with the project's `working_dir`
//! wired up as a plugin/role search path alongside the system-wide paths.
//!
//! Grounded on `test_tasks.py::TestAnsibleRunnerTask`. There is no Rust
//! counterpart to the Python `ansible_runner` package, so this drives the
//! `ansible-playbook` binary directly (the same approach the `local`
//! driver takes for arbitrary shell commands) rather than inventing a
//! vendored binding; the environment variables and precedence rules it
//! sets up are ported exactly from `_default_ansible_paths()`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use super::DriverTask;
use crate::error::TaskCoreError;
use crate::graph::result::TaskResult;
use crate::model::TaskDefinition;

pub struct AnsibleRunnerTask {
    service: String,
    data: TaskDefinition,
    hosts: Vec<String>,
}

impl AnsibleRunnerTask {
    pub fn playbook(&self) -> String {
        self.data
            .extra
            .get("playbook")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    pub fn working_dir(&self) -> String {
        self.data
            .extra
            .get("working_dir")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Plugin/role search paths: project-local directory first, then the
    /// system-wide installation.
    pub fn default_ansible_paths(&self) -> HashMap<String, String> {
        let wd = self.working_dir();
        let mut env = HashMap::new();
        env.insert(
            "ANSIBLE_ACTION_PLUGINS".to_string(),
            format!("{wd}/action:/usr/share/ansible/plugins/action"),
        );
        env.insert(
            "ANSIBLE_CALLBACK_PLUGINS".to_string(),
            format!("{wd}/callback:/usr/share/ansible/plugins/callback"),
        );
        env.insert(
            "ANSIBLE_FILTER_PLUGINS".to_string(),
            format!("{wd}/filter:/usr/share/ansible/plugins/filter"),
        );
        env.insert(
            "ANSIBLE_LIBRARY".to_string(),
            format!("{wd}/modules:/usr/share/ansible/plugins/modules"),
        );
        env.insert(
            "ANSIBLE_LOOKUP_PLUGINS".to_string(),
            format!("{wd}/lookup:/usr/share/ansible/plugins/lookup"),
        );
        env.insert(
            "ANSIBLE_ROLES_PATH".to_string(),
            format!("{wd}/roles:/usr/share/ansible/roles:/etc/ansible/roles"),
        );
        env
    }

    fn ansible_cfg(&self) -> Option<PathBuf> {
        let path = Path::new(&self.working_dir()).join("ansible.cfg");
        path.exists().then_some(path)
    }

    fn inventory(&self) -> Option<PathBuf> {
        let path = Path::new(&self.working_dir()).join("inventory.yaml");
        path.exists().then_some(path)
    }
}

pub fn construct(
    service: String,
    data: TaskDefinition,
    hosts: Vec<String>,
) -> Result<Arc<dyn DriverTask>, TaskCoreError> {
    Ok(Arc::new(AnsibleRunnerTask { service, data, hosts }))
}

#[async_trait]
impl DriverTask for AnsibleRunnerTask {
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
        let working_dir = self.working_dir();
        let playbook = self.playbook();

        let mut cmd = Command::new("ansible-playbook");
        cmd.arg(&playbook)
            .current_dir(&working_dir)
            .envs(self.default_ansible_paths())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        if let Some(cfg) = self.ansible_cfg() {
            cmd.env("ANSIBLE_CONFIG", cfg);
        }
        if let Some(inventory) = self.inventory() {
            cmd.arg("-i").arg(inventory);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| TaskCoreError::execution_failed(self.name(), e.to_string()))?;

        let mut stdout = Vec::new();
        if let Some(mut out) = child.stdout.take() {
            let _ = out.read_to_end(&mut stdout).await;
        }
        let status = child
            .wait()
            .await
            .map_err(|e| TaskCoreError::execution_failed(self.name(), e.to_string()))?;

        if !status.success() {
            return Err(TaskCoreError::execution_failed(
                self.name(),
                format!("playbook run exited with status {status}"),
            ));
        }

        let data = json!({ "stdout": String::from_utf8_lossy(&stdout), "stats": {} });
        let slots = self.provides().len().max(1);
        Ok(vec![TaskResult::success(data); slots])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(working_dir: &str) -> AnsibleRunnerTask {
        let extra: serde_yaml::Mapping = serde_yaml::from_str(&format!(
            "playbook: foo.yml\nworking_dir: {working_dir}\n"
        ))
        .unwrap();
        AnsibleRunnerTask {
            service: "foo".to_string(),
            data: TaskDefinition {
                id: "ansible".to_string(),
                driver: "ansible_runner".to_string(),
                action: None,
                provides: vec![],
                requires: vec![],
                needed_by: vec![],
                extra,
            },
            hosts: vec!["host-a".to_string()],
        }
    }

    #[test]
    fn fields_parse_from_extra() {
        let t = task("/working/dir");
        assert_eq!(t.playbook(), "foo.yml");
        assert_eq!(t.working_dir(), "/working/dir");
    }

    #[test]
    fn default_ansible_paths_match_expected_precedence() {
        let t = task("/working/dir");
        let env = t.default_ansible_paths();
        assert_eq!(
            env.get("ANSIBLE_ACTION_PLUGINS").unwrap(),
            "/working/dir/action:/usr/share/ansible/plugins/action"
        );
        assert_eq!(
            env.get("ANSIBLE_CALLBACK_PLUGINS").unwrap(),
            "/working/dir/callback:/usr/share/ansible/plugins/callback"
        );
        assert_eq!(
            env.get("ANSIBLE_FILTER_PLUGINS").unwrap(),
            "/working/dir/filter:/usr/share/ansible/plugins/filter"
        );
        assert_eq!(
            env.get("ANSIBLE_LIBRARY").unwrap(),
            "/working/dir/modules:/usr/share/ansible/plugins/modules"
        );
        assert_eq!(
            env.get("ANSIBLE_LOOKUP_PLUGINS").unwrap(),
            "/working/dir/lookup:/usr/share/ansible/plugins/lookup"
        );
        assert_eq!(
            env.get("ANSIBLE_ROLES_PATH").unwrap(),
            "/working/dir/roles:/usr/share/ansible/roles:/etc/ansible/roles"
        );
    }

    #[tokio::test]
    async fn missing_working_dir_fails_to_spawn() {
        let t = task("/nonexistent/working/dir/for/tests");
        let err = t.execute(&HashMap::new()).await.unwrap_err();
        assert!(matches!(err, TaskCoreError::ExecutionFailed { .. }));
    }
}
