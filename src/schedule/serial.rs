//! The serial scheduler: one task in flight at a time, in dependency
//! order with ties broken by load-order-then-task-order.

use crate::graph::symbols::SymbolTable;
use crate::graph::TaskGraph;

use super::Report;

pub async fn run(graph: &TaskGraph, symbols: &SymbolTable) -> Report {
    super::run(graph, symbols, 1).await
}
