//! Data model: hosts/inventory, roles, and services/task definitions.

pub mod inventory;
pub mod roles;
pub mod service;

pub use inventory::{Host, Inventory};
pub use roles::{Role, Roles};
pub use service::{Service, ServiceMap, TaskDefinition, Version};
