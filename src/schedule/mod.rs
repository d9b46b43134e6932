//! Scheduling: dispatch tasks from the graph's ready set as their
//! dependencies resolve, bounded to a worker count.
//!
//! Grounded on the semaphore-bounded worker-pool idiom seen in the
//! configuration-management executor example (`ExecutorConfig{forks}` +
//! `Arc<Semaphore>`): `serial` and `parallel` are the same dispatch loop
//! with `workers` pinned to 1 or taken from `--workers` respectively. A
//! failed task blocks every task that (transitively) requires one of its
//! symbols; blocked tasks never run.

pub mod parallel;
pub mod serial;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use petgraph::graph::NodeIndex;
use tokio::sync::Semaphore;

use crate::error::TaskCoreError;
use crate::graph::symbols::SymbolTable;
use crate::graph::TaskGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Ready,
    Running,
    Succeeded,
    Failed,
    Blocked,
}

#[derive(Debug, Default)]
pub struct Report {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    pub blocked: Vec<String>,
    pub errors: Vec<TaskCoreError>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.blocked.is_empty()
    }
}

/// Runs every task in `graph` to completion, bounded to `workers`
/// concurrent executions. `workers = 1` is the serial scheduler.
pub async fn run(graph: &TaskGraph, symbols: &SymbolTable, workers: usize) -> Report {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));

    let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
    let mut states: HashMap<NodeIndex, TaskState> = HashMap::new();
    for node in graph.all_nodes() {
        in_degree.insert(node, graph.dependencies(node).len());
        states.insert(node, TaskState::Pending);
    }

    let mut ready: Vec<NodeIndex> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&n, _)| n)
        .collect();
    ready.sort_by_key(|n| graph.order_of(*n));
    for node in &ready {
        states.insert(*node, TaskState::Ready);
    }

    let mut in_flight = FuturesUnordered::new();
    let mut report = Report::default();

    loop {
        while !ready.is_empty() {
            let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                break;
            };
            let node = ready.remove(0);
            states.insert(node, TaskState::Running);
            let task = graph.task(node).clone();
            let inputs = symbols.inputs_for(task.requires());
            in_flight.push(async move {
                let _permit = permit;
                let outcome = task.execute(&inputs).await;
                (node, outcome)
            });
        }

        let Some((node, outcome)) = in_flight.next().await else {
            break;
        };

        let task = graph.task(node);
        match outcome {
            Ok(results) => {
                let succeeded = results.iter().all(|r| r.status);
                for (symbol, result) in task.provides().iter().zip(results.iter()) {
                    if let Err(e) = symbols.bind(symbol, result.clone()) {
                        report.errors.push(e);
                    }
                }
                if succeeded {
                    states.insert(node, TaskState::Succeeded);
                    report.succeeded.push(task.name());
                } else {
                    states.insert(node, TaskState::Failed);
                    report.failed.push(task.name());
                    block_dependents(graph, node, &mut states, &mut report);
                }
            }
            Err(e) => {
                states.insert(node, TaskState::Failed);
                report.failed.push(task.name());
                report.errors.push(e);
                block_dependents(graph, node, &mut states, &mut report);
            }
        }

        for dependent in graph.dependents(node) {
            let degree = in_degree.get_mut(&dependent).unwrap();
            if *degree > 0 {
                *degree -= 1;
            }
            if *degree == 0 && states[&dependent] == TaskState::Pending {
                states.insert(dependent, TaskState::Ready);
                ready.push(dependent);
                ready.sort_by_key(|n| graph.order_of(*n));
            }
        }
    }

    report
}

fn block_dependents(
    graph: &TaskGraph,
    start: NodeIndex,
    states: &mut HashMap<NodeIndex, TaskState>,
    report: &mut Report,
) {
    let mut queue: VecDeque<NodeIndex> = graph.dependents(start).into_iter().collect();
    while let Some(node) = queue.pop_front() {
        if states.get(&node) == Some(&TaskState::Blocked) {
            continue;
        }
        states.insert(node, TaskState::Blocked);
        report.blocked.push(graph.task(node).name());
        queue.extend(graph.dependents(node));
    }
}
