//! Schema validators for the three artifact kinds: inventory, roles,
//! service.
//!
//! Each validator is lazily compiled and cached (one per kind, process-wide,
//! behind a `OnceCell` rather than the reference implementation's mutable
//! class-level singleton — see DESIGN.md). The JSON Schema documents used
//! to validate are resolved by searching a well-known directory order; if
//! none of those directories exist, the schema embedded in the binary at
//! compile time is used, so the crate validates correctly even when no
//! companion data directory is installed.

use once_cell::sync::OnceCell;
use serde_json::Value as JsonValue;

use crate::error::TaskCoreError;

const INVENTORY_SCHEMA: &str = include_str!("embedded/inventory.json");
const ROLES_SCHEMA: &str = include_str!("embedded/roles.json");
const SERVICE_SCHEMA: &str = include_str!("embedded/service.json");

/// Kinds of artifact this module can validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Inventory,
    Roles,
    Service,
}

impl SchemaKind {
    fn filename(self) -> &'static str {
        match self {
            SchemaKind::Inventory => "inventory.json",
            SchemaKind::Roles => "roles.json",
            SchemaKind::Service => "service.json",
        }
    }

    fn embedded(self) -> &'static str {
        match self {
            SchemaKind::Inventory => INVENTORY_SCHEMA,
            SchemaKind::Roles => ROLES_SCHEMA,
            SchemaKind::Service => SERVICE_SCHEMA,
        }
    }
}

/// Search order for an on-disk schema override: per-process resource root,
/// system share, user-local share. First existing file wins.
fn schema_search_path(kind: SchemaKind) -> Vec<std::path::PathBuf> {
    let filename = kind.filename();
    let mut candidates = Vec::new();

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        candidates.push(
            std::path::PathBuf::from(manifest_dir)
                .join("share/task-core/schema")
                .join(filename),
        );
    }
    candidates.push(std::path::PathBuf::from("/usr/share/task-core/schema").join(filename));
    candidates.push(std::path::PathBuf::from("/usr/local/share/task-core/schema").join(filename));
    if let Some(home) = dirs_local_share() {
        candidates.push(home.join("task-core/schema").join(filename));
    }
    candidates
}

fn dirs_local_share() -> Option<std::path::PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return Some(std::path::PathBuf::from(xdg));
    }
    std::env::var("HOME")
        .ok()
        .map(|home| std::path::PathBuf::from(home).join(".local/share"))
}

fn load_schema_text(kind: SchemaKind) -> String {
    for candidate in schema_search_path(kind) {
        if let Ok(text) = std::fs::read_to_string(&candidate) {
            tracing::debug!(path = %candidate.display(), "using on-disk schema override");
            return text;
        }
    }
    kind.embedded().to_string()
}

/// A compiled validator for one artifact kind.
pub struct SchemaValidator {
    compiled: jsonschema::JSONSchema,
}

impl SchemaValidator {
    fn compile(kind: SchemaKind) -> Self {
        let text = load_schema_text(kind);
        let value: JsonValue =
            serde_json::from_str(&text).expect("embedded schema documents are valid JSON");
        let leaked: &'static JsonValue = Box::leak(Box::new(value));
        let compiled = jsonschema::JSONSchema::options()
            .with_draft(jsonschema::Draft::Draft7)
            .compile(leaked)
            .expect("embedded schema documents are valid JSON Schema");
        Self { compiled }
    }

    /// Validate a document, returning a `SchemaValidation` error naming
    /// every violated rule on failure.
    pub fn validate(&self, path: &str, instance: &JsonValue) -> Result<(), TaskCoreError> {
        match self.compiled.validate(instance) {
            Ok(()) => Ok(()),
            Err(errors) => {
                let reason = errors
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(TaskCoreError::schema_validation(path, reason))
            }
        }
    }
}

static INVENTORY: OnceCell<SchemaValidator> = OnceCell::new();
static ROLES: OnceCell<SchemaValidator> = OnceCell::new();
static SERVICE: OnceCell<SchemaValidator> = OnceCell::new();

/// Borrow the process-wide validator for `kind`, compiling it on first use.
pub fn validator(kind: SchemaKind) -> &'static SchemaValidator {
    let cell = match kind {
        SchemaKind::Inventory => &INVENTORY,
        SchemaKind::Roles => &ROLES,
        SchemaKind::Service => &SERVICE,
    };
    cell.get_or_init(|| SchemaValidator::compile(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_inventory_passes() {
        let doc = json!({"host-a": {"role": "keystone"}});
        assert!(validator(SchemaKind::Inventory).validate("inventory.yaml", &doc).is_ok());
    }

    #[test]
    fn invalid_inventory_role_type_fails() {
        let doc = json!({"host-a": {"role": 5}});
        assert!(validator(SchemaKind::Inventory).validate("inventory.yaml", &doc).is_err());
    }

    #[test]
    fn roles_requires_services_array() {
        let doc = json!({"keystone": {}});
        assert!(validator(SchemaKind::Roles).validate("roles.yaml", &doc).is_err());

        let doc = json!({"keystone": {"services": ["svc-a"]}});
        assert!(validator(SchemaKind::Roles).validate("roles.yaml", &doc).is_ok());
    }

    #[test]
    fn service_requires_id_and_tasks() {
        let doc = json!({"tasks": []});
        assert!(validator(SchemaKind::Service).validate("service.yaml", &doc).is_err());

        let doc = json!({"id": "svc-a", "tasks": [{"id": "init"}]});
        assert!(validator(SchemaKind::Service).validate("service.yaml", &doc).is_ok());
    }
}
