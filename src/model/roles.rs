//! Roles document: mapping from role name to the services bound to it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TaskCoreError;
use crate::loader::{self, Definition};
use crate::schema::{self, SchemaKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct RoleData {
    services: Vec<String>,
}

/// A role name bound to an ordered sequence of service names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    name: String,
    services: Vec<String>,
}

impl Role {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn services(&self) -> &[String] {
        &self.services
    }
}

/// The loaded roles document.
#[derive(Debug, Clone)]
pub struct Roles {
    roles: BTreeMap<String, Role>,
}

impl Roles {
    pub fn load(definition: &Definition) -> Result<Self, TaskCoreError> {
        let path = describe(definition);
        let doc = loader::load(definition, false)?;

        let json: serde_json::Value = serde_json::to_value(&doc)?;
        schema::validator(SchemaKind::Roles).validate(&path, &json)?;

        let raw: BTreeMap<String, RoleData> = serde_yaml::from_value(doc)?;
        let roles = raw
            .into_iter()
            .map(|(name, data)| {
                let role = Role {
                    name: name.clone(),
                    services: data.services,
                };
                (name, role)
            })
            .collect();
        Ok(Self { roles })
    }

    pub fn from_roles(roles: BTreeMap<String, Role>) -> Self {
        Self { roles }
    }

    pub fn roles(&self) -> &BTreeMap<String, Role> {
        &self.roles
    }

    /// Services bound to `role`. An unknown role is `InvalidRole`.
    pub fn get_services(&self, role: &str) -> Result<&[String], TaskCoreError> {
        self.roles
            .get(role)
            .map(|r| r.services.as_slice())
            .ok_or_else(|| TaskCoreError::InvalidRole {
                role: role.to_string(),
            })
    }
}

fn describe(definition: &Definition) -> String {
    match definition {
        crate::loader::Definition::File(p) | crate::loader::Definition::Directory(p) => {
            p.display().to_string()
        }
        crate::loader::Definition::InMemory(_) => "<in-memory>".to_string(),
    }
}
