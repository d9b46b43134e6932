//! Optional graph renderer: writes the task graph as Graphviz DOT and,
//! if the `dot` binary is available, rasterizes it to SVG.
//!
//! Grounded on `manager.py::write_flow_graph`, which raises
//! `UnavailableException` when its `networkx`/pydot rendering stack isn't
//! installed. There is no Rust graphviz-rendering crate in the corpus, so
//! the equivalent here shells out to the system `dot` binary and reports
//! [`TaskCoreError::Unavailable`] when it isn't on `PATH` — callers that
//! treat the diagram as optional (the `--noop` dry-run preview, the
//! failure diagram written on `DependencyFailure`) already tolerate that.

use std::fmt::Write as _;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::TaskCoreError;
use crate::graph::TaskGraph;

/// Renders `graph` as a DOT document: one node per task, one edge per
/// producer-to-consumer dependency.
pub fn to_dot(graph: &TaskGraph) -> String {
    let mut out = String::from("digraph tasks {\n");
    for node in graph.all_nodes() {
        let task = graph.task(node);
        let _ = writeln!(out, "  \"{}\";", task.name());
    }
    for node in graph.all_nodes() {
        let task = graph.task(node);
        for dependent in graph.dependents(node) {
            let dep_task = graph.task(dependent);
            let _ = writeln!(out, "  \"{}\" -> \"{}\";", task.name(), dep_task.name());
        }
    }
    out.push_str("}\n");
    out
}

/// Writes `graph` as an SVG at `output_path` via the system `dot` binary.
/// Unavailable when `dot` isn't installed; callers for whom the diagram is
/// a nice-to-have should swallow [`TaskCoreError::Unavailable`].
pub async fn write_svg(graph: &TaskGraph, output_path: &Path) -> Result<(), TaskCoreError> {
    let dot = to_dot(graph);

    let mut child = Command::new("dot")
        .arg("-Tsvg")
        .arg("-o")
        .arg(output_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|_| TaskCoreError::Unavailable("dot is unavailable. Cannot create flow graph".to_string()))?;

    use tokio::io::AsyncWriteExt;
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(dot.as_bytes())
            .await
            .map_err(|e| TaskCoreError::execution_failed("diagram", e.to_string()))?;
    }

    let status = child
        .wait()
        .await
        .map_err(|e| TaskCoreError::execution_failed("diagram", e.to_string()))?;
    if !status.success() {
        return Err(TaskCoreError::execution_failed(
            "diagram",
            format!("dot exited with status {status}"),
        ));
    }
    tracing::info!(path = %output_path.display(), "flow graph svg written out");
    Ok(())
}
