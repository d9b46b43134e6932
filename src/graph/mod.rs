//! The task graph: one node per task, edges from producer to consumer of
//! each required symbol.
//!
//! Grounded on the `petgraph`-based DAG idiom (two-pass node-then-edge
//! construction, cycle detection via `is_cyclic_directed`, topological
//! leveling for parallel groups) seen in the dependency-graph example
//! repo's executor. The two-pass symbol reconciliation that precedes graph
//! construction lives in `reconcile`; this module only builds and
//! schedules the graph from already-reconciled services.

pub mod result;
pub mod symbols;

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::drivers::{DriverRegistry, DriverTask};
use crate::error::TaskCoreError;
use crate::model::ServiceMap;

struct NodeData {
    task: Arc<dyn DriverTask>,
    /// Position in load-order-then-task-order, used to break ties when
    /// the serial scheduler has more than one ready task.
    order: usize,
}

pub struct TaskGraph {
    graph: DiGraph<NodeData, ()>,
    symbol_producers: HashMap<String, NodeIndex>,
}

impl TaskGraph {
    /// Builds the graph from already-reconciled services, visited in
    /// `load_order`. Services with no projected hosts are skipped with a
    /// warning — their tasks contribute no nodes and no edges.
    pub fn build(
        services: &ServiceMap,
        load_order: &[String],
        registry: &DriverRegistry,
    ) -> Result<Self, TaskCoreError> {
        let (graph, error) = Self::try_build(services, load_order, registry);
        match error {
            Some(e) => Err(e),
            None => Ok(graph),
        }
    }

    /// Builds as much of the graph as the inputs allow, never bailing out
    /// early: a duplicate producer, a missing producer, or a cycle is
    /// recorded as the returned error but does not stop construction, so
    /// the caller still gets a graph worth rendering (e.g. for
    /// `failure.svg`) alongside the first problem encountered.
    pub fn try_build(
        services: &ServiceMap,
        load_order: &[String],
        registry: &DriverRegistry,
    ) -> (Self, Option<TaskCoreError>) {
        let mut graph = DiGraph::new();
        let mut symbol_producers: HashMap<String, NodeIndex> = HashMap::new();
        let mut order = 0usize;
        let mut error: Option<TaskCoreError> = None;

        for service_id in load_order {
            let service = match services.get(service_id) {
                Some(s) => s,
                None => continue,
            };
            if service.hosts().is_empty() {
                tracing::warn!(service = service_id, "service has no projected hosts, skipping");
                continue;
            }
            for task_def in service.tasks() {
                let driver = match registry.build(
                    &task_def.driver,
                    service.id().to_string(),
                    task_def.clone(),
                    service.hosts().to_vec(),
                ) {
                    Ok(driver) => driver,
                    Err(e) => {
                        error.get_or_insert(e);
                        continue;
                    }
                };
                let node = graph.add_node(NodeData { task: driver, order });
                order += 1;

                for symbol in task_def.provides.iter() {
                    if let Some(existing) = symbol_producers.insert(symbol.clone(), node) {
                        error.get_or_insert_with(|| {
                            TaskCoreError::dependency_failure(format!(
                                "symbol '{symbol}' is provided by more than one task ({:?} and {:?})",
                                graph[existing].task.name(),
                                graph[node].task.name(),
                            ))
                        });
                    }
                }
            }
        }

        let mut missing = Vec::new();
        let node_indices: Vec<NodeIndex> = graph.node_indices().collect();
        for node in node_indices {
            let requires = graph[node].task.requires().to_vec();
            for symbol in requires {
                match symbol_producers.get(&symbol) {
                    Some(&producer) => {
                        graph.add_edge(producer, node, ());
                    }
                    None => missing.push(format!(
                        "'{symbol}' required by '{}' has no producer",
                        graph[node].task.name()
                    )),
                }
            }
        }
        if !missing.is_empty() {
            error.get_or_insert_with(|| TaskCoreError::dependency_failure(missing.join("; ")));
        }

        if is_cyclic_directed(&graph) {
            error.get_or_insert_with(|| {
                TaskCoreError::dependency_failure("dependency graph contains a cycle")
            });
        }

        (Self { graph, symbol_producers }, error)
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn task(&self, node: NodeIndex) -> &Arc<dyn DriverTask> {
        &self.graph[node].task
    }

    pub fn producer_of(&self, symbol: &str) -> Option<NodeIndex> {
        self.symbol_producers.get(symbol).copied()
    }

    pub fn dependencies(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.graph.neighbors_directed(node, Direction::Incoming).collect()
    }

    pub fn dependents(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.graph.neighbors_directed(node, Direction::Outgoing).collect()
    }

    pub fn all_nodes(&self) -> Vec<NodeIndex> {
        self.graph.node_indices().collect()
    }

    pub fn order_of(&self, node: NodeIndex) -> usize {
        self.graph[node].order
    }

    /// All nodes, ordered by load-order-then-task-order — the serial
    /// scheduler's deterministic tie-break.
    pub fn serial_order(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        nodes.sort_by_key(|n| self.graph[*n].order);
        nodes
    }

    /// Nodes grouped into levels such that every node in a level has all
    /// its dependencies satisfied by an earlier level — the unit of
    /// concurrency the parallel scheduler dispatches.
    pub fn parallel_groups(&self) -> Result<Vec<Vec<NodeIndex>>, TaskCoreError> {
        let sorted = toposort(&self.graph, None)
            .map_err(|_| TaskCoreError::dependency_failure("dependency graph contains a cycle"))?;

        let mut level_of: HashMap<NodeIndex, usize> = HashMap::new();
        let mut max_level = 0;
        for node in &sorted {
            let level = self
                .dependencies(*node)
                .iter()
                .map(|dep| level_of.get(dep).copied().unwrap_or(0) + 1)
                .max()
                .unwrap_or(0);
            level_of.insert(*node, level);
            max_level = max_level.max(level);
        }

        let mut groups = vec![Vec::new(); max_level + 1];
        for node in sorted {
            let level = level_of[&node];
            groups[level].push(node);
        }
        for group in &mut groups {
            group.sort_by_key(|n| self.graph[*n].order);
        }
        Ok(groups)
    }
}
