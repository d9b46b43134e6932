//! Inventory: mapping from host identifier to host attributes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::TaskCoreError;
use crate::loader::{self, Definition};
use crate::schema::{self, SchemaKind};

/// A host's attributes. Only `role` is consumed by the core; anything else
/// the operator puts in the document rides along unmodified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Host {
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The loaded inventory document.
#[derive(Debug, Clone)]
pub struct Inventory {
    hosts: BTreeMap<String, Host>,
}

impl Inventory {
    /// Load and schema-validate an inventory document.
    pub fn load(definition: &Definition) -> Result<Self, TaskCoreError> {
        let path = describe(definition);
        let doc = loader::load(definition, false)?;

        let json: serde_json::Value = serde_json::to_value(&doc)?;
        schema::validator(SchemaKind::Inventory).validate(&path, &json)?;

        let hosts: BTreeMap<String, Host> = serde_yaml::from_value(doc)?;
        Ok(Self { hosts })
    }

    /// Construct directly from already-validated host data (used by tests
    /// and by callers that build inventories in memory).
    pub fn from_hosts(hosts: BTreeMap<String, Host>) -> Self {
        Self { hosts }
    }

    pub fn hosts(&self) -> &BTreeMap<String, Host> {
        &self.hosts
    }

    /// All hosts whose role equals, or contains, `role`. With no `role`
    /// given, every host is returned.
    pub fn get_role_hosts(&self, role: Option<&str>) -> Vec<&str> {
        match role {
            None => self.hosts.keys().map(|s| s.as_str()).collect(),
            Some(role) => self
                .hosts
                .iter()
                .filter(|(_, host)| {
                    host.role
                        .as_deref()
                        .map(|r| r == role || r.contains(role))
                        .unwrap_or(false)
                })
                .map(|(name, _)| name.as_str())
                .collect(),
        }
    }
}

fn describe(definition: &Definition) -> String {
    match definition {
        Definition::File(p) | Definition::Directory(p) => p.display().to_string(),
        Definition::InMemory(_) => "<in-memory>".to_string(),
    }
}
