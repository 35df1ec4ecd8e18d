//! Command-line interface.

use std::sync::Arc;

use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};

use sysgroups_core::{PrincipalId, ResourceKey};
use sysgroups_service::{
    AnonymousUser, Created, Owned, Principal, Resource, ServiceResult, User,
};

#[derive(Debug, Parser)]
#[command(name = "sysgroups", about = "Resolve system groups and check permissions")]
pub struct Cli {
    /// Casbin policy CSV with `p, <group>, <permission>` lines. Overrides `policy.path`.
    #[arg(long, global = true)]
    pub policy: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check whether a principal holds a permission
    Check {
        #[command(flatten)]
        principal: PrincipalArgs,
        #[command(flatten)]
        resource: ResourceArgs,
        /// Permission identifier, `namespace.action`
        permission: String,
    },
    /// Print the groups a principal holds
    Groups {
        #[command(flatten)]
        principal: PrincipalArgs,
        #[command(flatten)]
        resource: ResourceArgs,
    },
    /// Print every permission a principal holds
    Permissions {
        #[command(flatten)]
        principal: PrincipalArgs,
        #[command(flatten)]
        resource: ResourceArgs,
    },
    /// Check whether a principal holds any permission in a namespace
    Namespace {
        #[command(flatten)]
        principal: PrincipalArgs,
        namespace: String,
    },
    /// List the stored groups and their permissions
    ListGroups,
}

#[derive(Debug, Clone, Args)]
pub struct PrincipalArgs {
    /// Authenticated user id; omit for the anonymous principal
    #[arg(long)]
    pub user: Option<PrincipalId>,
    /// Mark the user as staff
    #[arg(long, requires = "user")]
    pub staff: bool,
    /// Mark the user as deactivated
    #[arg(long, requires = "user")]
    pub inactive: bool,
}

impl PrincipalArgs {
    #[must_use]
    pub fn principal(&self) -> Arc<dyn Principal> {
        match self.user {
            Some(id) => Arc::new(
                User::new(id)
                    .with_staff(self.staff)
                    .with_active(!self.inactive),
            ),
            None => Arc::new(AnonymousUser),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ResourceArgs {
    /// Resource identity as `<kind>:<id>`; omit for an unsaved resource
    #[arg(long = "resource", value_parser = parse_resource_key)]
    pub key: Option<ResourceKey>,
    /// Creator of the resource
    #[arg(long)]
    pub creator: Option<PrincipalId>,
    /// Owner of the resource
    #[arg(long)]
    pub owner: Option<PrincipalId>,
}

impl ResourceArgs {
    /// The described resource, or `None` when no resource option was given.
    #[must_use]
    pub fn resource(&self) -> Option<CliResource> {
        if self.key.is_none() && self.creator.is_none() && self.owner.is_none() {
            return None;
        }
        Some(CliResource {
            key: self.key.clone(),
            creator: self.creator,
            owner: self.owner,
        })
    }
}

fn parse_resource_key(value: &str) -> Result<ResourceKey, String> {
    match value.split_once(':') {
        Some((kind, id)) if !kind.is_empty() && !id.is_empty() => Ok(ResourceKey::new(kind, id)),
        _ => Err(format!("`{value}` is not of the form <kind>:<id>")),
    }
}

/// A resource described entirely on the command line.
#[derive(Debug, Clone)]
pub struct CliResource {
    key: Option<ResourceKey>,
    creator: Option<PrincipalId>,
    owner: Option<PrincipalId>,
}

#[async_trait]
impl Created for CliResource {
    async fn creator(&self) -> ServiceResult<Option<PrincipalId>> {
        Ok(self.creator)
    }
}

#[async_trait]
impl Owned for CliResource {
    async fn owner(&self) -> ServiceResult<Option<PrincipalId>> {
        Ok(self.owner)
    }
}

impl Resource for CliResource {
    fn resource_key(&self) -> Option<ResourceKey> {
        self.key.clone()
    }

    fn as_created(&self) -> Option<&dyn Created> {
        Some(self)
    }

    fn as_owned(&self) -> Option<&dyn Owned> {
        Some(self)
    }
}
