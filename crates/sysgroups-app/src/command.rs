//! Execution of parsed commands against an [`Authorizer`].

use std::fmt::Write;

use anyhow::Result;

use sysgroups_service::{
    AuthContext, Authorizer, CasbinPermissionStore, GroupResolver, PermissionStore, Principal,
    Resource,
};

use crate::cli::Command;

/// ## Summary
/// Runs one command and returns its textual output.
///
/// ## Errors
/// Propagates resolution, aggregation and store failures.
pub async fn run(
    command: &Command,
    authz: &Authorizer,
    store: &CasbinPermissionStore,
) -> Result<String> {
    match command {
        Command::Check {
            principal,
            resource,
            permission,
        } => {
            let ctx = AuthContext::new(principal.principal());
            let resource = resource.resource();
            let granted = authz
                .has_permission(&ctx, permission, resource.as_ref().map(|r| r as &dyn Resource))
                .await?;
            Ok(format!(
                "{permission}: {}",
                if granted { "granted" } else { "denied" }
            ))
        }
        Command::Groups {
            principal,
            resource,
        } => {
            let principal = principal.principal();
            let resource = resource.resource();
            let groups = resolve_all(
                authz.resolver(),
                principal.as_ref(),
                resource.as_ref().map(|r| r as &dyn Resource),
            )
            .await?;
            Ok(groups.join("\n"))
        }
        Command::Permissions {
            principal,
            resource,
        } => {
            let ctx = AuthContext::new(principal.principal());
            let resource = resource.resource();
            let mut permissions: Vec<String> = authz
                .all_permissions(&ctx, resource.as_ref().map(|r| r as &dyn Resource))
                .await?
                .into_iter()
                .map(|permission| permission.to_string())
                .collect();
            permissions.sort();
            Ok(permissions.join("\n"))
        }
        Command::Namespace {
            principal,
            namespace,
        } => {
            let ctx = AuthContext::new(principal.principal());
            let granted = authz.has_any_permission_in_namespace(&ctx, namespace).await?;
            Ok(format!(
                "{namespace}: {}",
                if granted { "granted" } else { "denied" }
            ))
        }
        Command::ListGroups => {
            let mut output = String::new();
            for group in store.groups().await {
                let mut permissions: Vec<String> = store
                    .permissions_of_group(&group)
                    .await?
                    .into_iter()
                    .map(|permission| permission.to_string())
                    .collect();
                permissions.sort();
                writeln!(output, "{group}: {}", permissions.join(", "))?;
            }
            Ok(output.trim_end().to_string())
        }
    }
}

async fn resolve_all(
    resolver: &GroupResolver,
    principal: &dyn Principal,
    resource: Option<&dyn Resource>,
) -> Result<Vec<String>> {
    let mut groups = resolver.resolve_groups(principal).await?;
    if let Some(resource) = resource {
        groups.extend(
            resolver
                .resolve_groups_for_resource(principal, resource)
                .await?,
        );
    }
    let mut groups: Vec<String> = groups.into_iter().collect();
    groups.sort();
    Ok(groups)
}
