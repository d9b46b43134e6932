//! The concurrent symbol table: one producer writes each symbol exactly
//! once, and any number of downstream tasks read it concurrently as the
//! scheduler dispatches them.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::TaskCoreError;
use crate::graph::result::TaskResult;

#[derive(Default)]
pub struct SymbolTable {
    bound: DashMap<String, TaskResult>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `symbol` to `result`. The graph build already guarantees a
    /// single producer per symbol; a second write here is a bug in the
    /// caller, not a data condition, so it is reported rather than
    /// silently overwriting.
    pub fn bind(&self, symbol: &str, result: TaskResult) -> Result<(), TaskCoreError> {
        match self.bound.entry(symbol.to_string()) {
            Entry::Occupied(_) => Err(TaskCoreError::dependency_failure(format!(
                "symbol '{symbol}' was bound more than once"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(result);
                Ok(())
            }
        }
    }

    pub fn get(&self, symbol: &str) -> Option<TaskResult> {
        self.bound.get(symbol).map(|r| r.clone())
    }

    /// Collects the bound data for every symbol in `requires`, keyed by
    /// symbol name, for binding as a task's execution inputs.
    pub fn inputs_for(&self, requires: &[String]) -> HashMap<String, Value> {
        requires
            .iter()
            .filter_map(|symbol| self.get(symbol).map(|r| (symbol.clone(), r.data)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_then_get_roundtrips() {
        let table = SymbolTable::new();
        table.bind("svc-a.run", TaskResult::success(serde_json::json!({"x": 1}))).unwrap();
        let got = table.get("svc-a.run").unwrap();
        assert!(got.status);
        assert_eq!(got.data, serde_json::json!({"x": 1}));
    }

    #[test]
    fn double_bind_is_an_error() {
        let table = SymbolTable::new();
        table.bind("s", TaskResult::success_empty()).unwrap();
        assert!(table.bind("s", TaskResult::success_empty()).is_err());
    }

    #[test]
    fn inputs_for_skips_unbound_symbols() {
        let table = SymbolTable::new();
        table.bind("a", TaskResult::success(serde_json::json!(1))).unwrap();
        let inputs = table.inputs_for(&["a".to_string(), "b".to_string()]);
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs["a"], serde_json::json!(1));
    }
}
