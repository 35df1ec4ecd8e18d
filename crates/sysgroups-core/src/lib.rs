//! Shared types, well-known group names and configuration for the system group engine.

pub mod config;
pub mod constants;
pub mod error;
pub mod groups;
pub mod types;

pub use groups::{SystemGroup, SystemGroupNames};
pub use types::{GroupSet, Permission, PermissionSet, PrincipalId, ResourceKey};
