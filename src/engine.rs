//! The engine: owns a run's loaded artifacts and drives it from load
//! through scheduling to completion.
//!
//! Grounded on `manager.py::TaskManager`: construction validates the three
//! input paths, `load()` runs services-then-inventory-then-roles-then
//! -host-projection in that order, and `create_flow`/`write_flow_graph`
//! become [`TaskGraph::build`] and [`crate::diagram`] respectively.

use std::path::{Path, PathBuf};

use glob::glob;

use crate::diagram;
use crate::drivers::DriverRegistry;
use crate::error::TaskCoreError;
use crate::graph::symbols::SymbolTable;
use crate::graph::TaskGraph;
use crate::loader::Definition;
use crate::model::{Inventory, Roles, Service, ServiceMap};
use crate::reconcile::resolve_service_deps;
use crate::schedule::{self, Report};

pub const DEFAULT_WORKERS: usize = crate::schedule::parallel::DEFAULT_WORKERS;

/// Run-wide knobs threaded from the CLI.
pub struct RunOptions {
    /// Replace every task's registered driver with `noop` — a dry run
    /// that only proves the graph builds and reports which hosts each
    /// task would have touched.
    pub noop: bool,
    /// Concurrent task budget; 1 selects the serial scheduler.
    pub workers: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { noop: false, workers: DEFAULT_WORKERS }
    }
}

pub struct Engine {
    services_dir: PathBuf,
    inventory_file: PathBuf,
    roles_file: PathBuf,
    services: ServiceMap,
    load_order: Vec<String>,
    inventory: Option<Inventory>,
    roles: Option<Roles>,
}

impl Engine {
    /// Validates the three input paths, matching the reference
    /// constructor's upfront existence checks, but does not load them yet.
    pub fn new(
        services_dir: impl Into<PathBuf>,
        inventory_file: impl Into<PathBuf>,
        roles_file: impl Into<PathBuf>,
    ) -> Result<Self, TaskCoreError> {
        let services_dir = services_dir.into();
        let inventory_file = inventory_file.into();
        let roles_file = roles_file.into();

        if !services_dir.is_dir() {
            return Err(TaskCoreError::invalid_file_data(
                services_dir.display().to_string(),
                "does not exist or is not a directory",
            ));
        }
        if !inventory_file.is_file() {
            return Err(TaskCoreError::invalid_file_data(
                inventory_file.display().to_string(),
                "does not exist or is not a file",
            ));
        }
        if !roles_file.is_file() {
            return Err(TaskCoreError::invalid_file_data(
                roles_file.display().to_string(),
                "does not exist or is not a file",
            ));
        }

        Ok(Self {
            services_dir,
            inventory_file,
            roles_file,
            services: ServiceMap::new(),
            load_order: Vec::new(),
            inventory: None,
            roles: None,
        })
    }

    /// Loads services, inventory, and roles, then projects hosts onto
    /// services, in that exact order.
    pub fn load(&mut self) -> Result<(), TaskCoreError> {
        self.load_services()?;
        self.load_inventory()?;
        self.load_roles()?;
        self.hosts_to_services()?;
        Ok(())
    }

    /// Service files are discovered by a recursive glob, sorted for
    /// determinism (the reference implementation relies on filesystem
    /// globbing order, which is not guaranteed); this sort order doubles
    /// as load order for the serial scheduler's tie-break.
    fn load_services(&mut self) -> Result<(), TaskCoreError> {
        tracing::info!(dir = %self.services_dir.display(), "loading services");
        let pattern = format!("{}/**/*.yaml", self.services_dir.display());
        let mut paths: Vec<PathBuf> = glob(&pattern)
            .map_err(|e| TaskCoreError::invalid_file_data(pattern.clone(), e.to_string()))?
            .filter_map(|entry| entry.ok())
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        for path in paths {
            let service = Service::load(&Definition::File(path.clone()))?;
            self.load_order.push(service.name().to_string());
            self.services.insert(service.name().to_string(), service);
        }

        resolve_service_deps(&mut self.services);
        Ok(())
    }

    fn load_inventory(&mut self) -> Result<(), TaskCoreError> {
        tracing::info!(file = %self.inventory_file.display(), "loading inventory");
        self.inventory = Some(Inventory::load(&Definition::File(self.inventory_file.clone()))?);
        Ok(())
    }

    fn load_roles(&mut self) -> Result<(), TaskCoreError> {
        tracing::info!(file = %self.roles_file.display(), "loading roles");
        self.roles = Some(Roles::load(&Definition::File(self.roles_file.clone()))?);
        Ok(())
    }

    /// Projects every inventory host onto the services its role binds to.
    fn hosts_to_services(&mut self) -> Result<(), TaskCoreError> {
        let inventory = self.inventory.as_ref().expect("load_inventory runs first");
        let roles = self.roles.as_ref().expect("load_roles runs first");

        for (host, attrs) in inventory.hosts() {
            let role = attrs.role.as_deref().ok_or_else(|| TaskCoreError::InvalidRole {
                role: format!("<host '{host}' has no role>"),
            })?;
            for service_id in roles.get_services(role)? {
                tracing::debug!(host, service = service_id, "projecting host onto service");
                let service = self.services.get_mut(service_id).ok_or_else(|| {
                    TaskCoreError::InvalidService { service: service_id.clone() }
                })?;
                service.add_host(host.clone());
            }
        }
        Ok(())
    }

    pub fn services(&self) -> &ServiceMap {
        &self.services
    }

    pub fn load_order(&self) -> &[String] {
        &self.load_order
    }

    /// Builds the task graph. On `options.noop`, every task is built with
    /// the `noop` driver regardless of its declared driver, matching the
    /// dry-run's `task_type_override`.
    pub fn build_graph(&self, options: &RunOptions) -> Result<TaskGraph, TaskCoreError> {
        TaskGraph::build(&self.services, &self.load_order, &self.driver_registry(options))
    }

    /// Builds the graph the same way as [`Engine::build_graph`], but never
    /// fails: a duplicate/missing producer or a cycle is returned alongside
    /// whatever graph was buildable, so the caller can still render it (the
    /// `failure.svg` diagram written on a `DependencyFailure`).
    pub fn build_graph_partial(
        &self,
        options: &RunOptions,
    ) -> (TaskGraph, Option<TaskCoreError>) {
        TaskGraph::try_build(&self.services, &self.load_order, &self.driver_registry(options))
    }

    fn driver_registry(&self, options: &RunOptions) -> DriverRegistry {
        if options.noop {
            let mut registry = DriverRegistry::builtin();
            for name in ["service", "directord", "print", "ansible_runner", "local"] {
                registry.register(name, crate::drivers::noop::construct);
            }
            registry
        } else {
            DriverRegistry::builtin()
        }
    }

    /// Runs every task in the built graph to completion.
    pub async fn run(&self, options: &RunOptions) -> Result<Report, TaskCoreError> {
        let graph = self.build_graph(options)?;
        let symbols = SymbolTable::new();
        Ok(schedule::run(&graph, &symbols, options.workers.max(1)).await)
    }

    /// Writes the dry-run preview diagram (`noop.svg`) or a failure
    /// diagram, tolerating an unavailable renderer.
    pub async fn write_diagram(
        &self,
        graph: &TaskGraph,
        output_path: &Path,
    ) -> Result<(), TaskCoreError> {
        match diagram::write_svg(graph, output_path).await {
            Ok(()) => Ok(()),
            Err(TaskCoreError::Unavailable(reason)) => {
                tracing::warn!(reason, "skipping flow graph diagram");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(path: &Path, contents: &str) {
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn new_rejects_missing_services_dir() {
        let err = Engine::new("/no/such/dir", "/etc/hosts", "/etc/hosts").unwrap_err();
        assert!(matches!(err, TaskCoreError::InvalidFileData { .. }));
    }

    #[tokio::test]
    async fn full_load_and_run_linear_chain() {
        let dir = tempdir().unwrap();
        let services_dir = dir.path().join("services");
        std::fs::create_dir(&services_dir).unwrap();

        write_file(
            &services_dir.join("svc-a.yaml"),
            "id: svc-a\ntasks:\n  - id: run\n    driver: noop\n    provides: [svc-a.run]\n",
        );
        write_file(
            &services_dir.join("svc-b.yaml"),
            "id: svc-b\ntasks:\n  - id: run\n    driver: noop\n    provides: [svc-b.run]\n    requires: [svc-a.run]\n",
        );

        let inventory_file = dir.path().join("inventory.yaml");
        write_file(&inventory_file, "host-a:\n  role: all\n");

        let roles_file = dir.path().join("roles.yaml");
        write_file(&roles_file, "all:\n  services: [svc-a, svc-b]\n");

        let mut engine = Engine::new(&services_dir, &inventory_file, &roles_file).unwrap();
        engine.load().unwrap();
        assert_eq!(engine.services().len(), 2);

        let report = engine.run(&RunOptions::default()).await.unwrap();
        assert_eq!(report.succeeded.len(), 2);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn host_with_undefined_role_is_invalid_role() {
        let dir = tempdir().unwrap();
        let services_dir = dir.path().join("services");
        std::fs::create_dir(&services_dir).unwrap();
        write_file(
            &services_dir.join("svc-a.yaml"),
            "id: svc-a\ntasks:\n  - id: run\n    driver: noop\n    provides: [svc-a.run]\n",
        );

        let inventory_file = dir.path().join("inventory.yaml");
        write_file(&inventory_file, "host-a:\n  role: ghost-role\n");

        let roles_file = dir.path().join("roles.yaml");
        write_file(&roles_file, "all:\n  services: [svc-a]\n");

        let mut engine = Engine::new(&services_dir, &inventory_file, &roles_file).unwrap();
        let err = engine.load().unwrap_err();
        assert!(matches!(err, TaskCoreError::InvalidRole { .. }));
    }

    #[test]
    fn build_graph_partial_returns_a_graph_alongside_a_missing_producer_error() {
        let dir = tempdir().unwrap();
        let services_dir = dir.path().join("services");
        std::fs::create_dir(&services_dir).unwrap();
        write_file(
            &services_dir.join("svc-a.yaml"),
            "id: svc-a\ntasks:\n  - id: run\n    driver: noop\n    requires: [does-not-exist]\n",
        );

        let inventory_file = dir.path().join("inventory.yaml");
        write_file(&inventory_file, "host-a:\n  role: all\n");

        let roles_file = dir.path().join("roles.yaml");
        write_file(&roles_file, "all:\n  services: [svc-a]\n");

        let mut engine = Engine::new(&services_dir, &inventory_file, &roles_file).unwrap();
        engine.load().unwrap();

        let err = engine.build_graph(&RunOptions::default()).unwrap_err();
        assert!(matches!(err, TaskCoreError::DependencyFailure { .. }));

        let (graph, partial_err) = engine.build_graph_partial(&RunOptions::default());
        assert!(matches!(partial_err, Some(TaskCoreError::DependencyFailure { .. })));
        assert_eq!(graph.task_count(), 1);
    }
}
