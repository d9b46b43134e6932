//! # task-core
//!
//! A declarative task-graph resolver and concurrent execution engine.
//!
//! Services declare tasks; tasks declare the symbols they `provides`,
//! the symbols they `requires`, and (for dependencies that only the
//! *consumer* knows about) the symbols they are `needed-by`. Roles bind
//! inventory hosts to services. Given a services directory, an inventory
//! file, and a roles file, the engine reconciles cross-service
//! dependencies, builds a directed acyclic task graph, and executes it —
//! serially or with a bounded worker pool — dispatching each task to the
//! driver named in its `driver` field.
//!
//! ## Modules
//!
//! - [`model`] — inventory, roles, and service/task data types
//! - [`loader`] — file/directory/in-memory artifact loading and deep-merge
//! - [`schema`] — JSON Schema validation for the three artifact kinds
//! - [`reconcile`] — cross-service `needed-by` → `requires` reconciliation
//! - [`graph`] — the task DAG, its symbol table, and its result type
//! - [`drivers`] — the driver registry and the six built-in drivers
//! - [`schedule`] — serial and parallel task dispatch
//! - [`engine`] — ties loading, reconciliation, graph build, and
//!   scheduling together into one run
//! - [`diagram`] — optional DOT/SVG rendering of the task graph
//! - [`error`] — the crate's error taxonomy and [`error::FixSuggestion`]

pub mod diagram;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod graph;
pub mod loader;
pub mod model;
pub mod reconcile;
pub mod schedule;
pub mod schema;

pub use engine::{Engine, RunOptions};
pub use error::{FixSuggestion, TaskCoreError};
pub use graph::result::TaskResult;
pub use graph::TaskGraph;
