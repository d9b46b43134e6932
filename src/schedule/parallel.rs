//! The parallel scheduler: up to `workers` tasks in flight at once,
//! dispatched from the ready set as dependencies resolve. Defaults to 5
//! workers, matching the configuration-management executor's default
//! fork count.

use crate::graph::symbols::SymbolTable;
use crate::graph::TaskGraph;

use super::Report;

pub const DEFAULT_WORKERS: usize = 5;

pub async fn run(graph: &TaskGraph, symbols: &SymbolTable, workers: usize) -> Report {
    super::run(graph, symbols, workers).await
}
