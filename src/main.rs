//! task-core CLI - dependency-ordered task graph runner

use clap::Parser;
use colored::Colorize;

use task_core::engine::{Engine, RunOptions};
use task_core::error::FixSuggestion;
use task_core::TaskCoreError;

#[derive(Parser)]
#[command(name = "task-core")]
#[command(about = "Dependency-ordered task graph resolver and concurrent execution engine")]
#[command(version)]
struct Cli {
    /// Directory of service YAML files, searched recursively
    #[arg(short = 's', long = "services-dir")]
    services_dir: String,

    /// Inventory YAML file: host -> attributes (including role)
    #[arg(short = 'i', long = "inventory-file")]
    inventory_file: String,

    /// Roles YAML file: role -> bound services
    #[arg(short = 'r', long = "roles-file")]
    roles_file: String,

    /// Raise logging to DEBUG
    #[arg(short = 'd', long)]
    debug: bool,

    /// Dry run: substitute the noop driver for every task and report
    /// which hosts each task would have touched, writing noop.svg
    #[arg(long)]
    noop: bool,

    /// Concurrent task budget; 1 selects the serial scheduler
    #[arg(long, default_value_t = task_core::engine::DEFAULT_WORKERS)]
    workers: usize,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = if cli.debug { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), TaskCoreError> {
    let mut engine = Engine::new(&cli.services_dir, &cli.inventory_file, &cli.roles_file)?;
    engine.load()?;

    let options = RunOptions { noop: cli.noop, workers: cli.workers };

    let graph = match engine.build_graph(&options) {
        Ok(graph) => graph,
        Err(e @ TaskCoreError::DependencyFailure { .. }) => {
            let (partial, _) = engine.build_graph_partial(&options);
            if let Err(diagram_err) =
                engine.write_diagram(&partial, std::path::Path::new("failure.svg")).await
            {
                tracing::warn!(error = %diagram_err, "failed to write failure diagram");
            }
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    if cli.noop {
        engine.write_diagram(&graph, std::path::Path::new("noop.svg")).await?;
    }

    let symbols = task_core::graph::symbols::SymbolTable::new();
    let report = task_core::schedule::run(&graph, &symbols, options.workers.max(1)).await;

    println!(
        "{} succeeded, {} failed, {} blocked",
        report.succeeded.len().to_string().green(),
        report.failed.len().to_string().red(),
        report.blocked.len().to_string().yellow(),
    );

    if !report.is_clean() {
        return Err(TaskCoreError::dependency_failure(format!(
            "{} task(s) failed, {} blocked",
            report.failed.len(),
            report.blocked.len()
        )));
    }

    Ok(())
}
