//! The result a driver hands back for a single task execution.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `(status, data)` — the engine binds `data` to each symbol in the task's
/// `provides`, so `provides` are effectively the task's keyed return slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub status: bool,
    pub data: Value,
}

impl TaskResult {
    pub fn success(data: Value) -> Self {
        Self { status: true, data }
    }

    pub fn success_empty() -> Self {
        Self::success(Value::Object(Map::new()))
    }

    pub fn failure(data: Value) -> Self {
        Self { status: false, data }
    }
}
