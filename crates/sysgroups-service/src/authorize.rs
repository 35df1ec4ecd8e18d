//! Authorization façade.
//!
//! This module provides the API callers use to check permissions. A check
//! resolves the principal's groups, aggregates the permissions bound to them
//! and tests membership, memoizing the aggregated sets on the [`AuthContext`].
//!
//! Errors from any collaborator propagate unchanged. Translating them into a
//! deny is the caller's decision.

use std::sync::Arc;

use sysgroups_core::PermissionSet;
use sysgroups_core::config::Settings;

use crate::aggregator::PermissionAggregator;
use crate::cache::Cache;
use crate::context::AuthContext;
use crate::error::{ServiceError, ServiceResult};
use crate::provider::GroupProviders;
use crate::resolver::GroupResolver;
use crate::resource::{CapabilityRelationships, Resource};
use crate::store::PermissionStore;

/// Result of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzResult {
    /// Access is allowed.
    Allowed,
    /// Access is denied.
    Denied,
}

impl AuthzResult {
    #[must_use]
    pub const fn from_granted(granted: bool) -> Self {
        if granted { Self::Allowed } else { Self::Denied }
    }

    /// Returns `true` if access is allowed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Convert to a `Result`, returning `Err(ServiceError::AuthorizationError)` if denied.
    ///
    /// ## Errors
    ///
    /// Returns `AuthorizationError` if access is denied.
    pub fn require(self, permission: &str) -> ServiceResult<()> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied => Err(ServiceError::AuthorizationError(format!(
                "Access denied: {permission}"
            ))),
        }
    }
}

/// Authorization service for checking permissions.
///
/// ## Usage
///
/// ```ignore
/// let authz = Authorizer::new(resolver, aggregator);
/// let ctx = AuthContext::new(Arc::new(user));
/// if authz.has_permission(&ctx, "auth.change_group", Some(&group)).await? {
///     // proceed
/// }
/// ```
pub struct Authorizer {
    resolver: Arc<GroupResolver>,
    aggregator: Arc<PermissionAggregator>,
}

impl Authorizer {
    #[must_use]
    pub fn new(resolver: Arc<GroupResolver>, aggregator: Arc<PermissionAggregator>) -> Self {
        Self {
            resolver,
            aggregator,
        }
    }

    /// ## Summary
    /// Wire a resolver and an aggregator from configuration.
    #[must_use]
    pub fn from_settings(
        settings: &Settings,
        store: Arc<dyn PermissionStore>,
        cache: Arc<dyn Cache>,
        providers: GroupProviders,
    ) -> Self {
        let resolver = GroupResolver::new(
            settings.groups.clone(),
            Arc::new(CapabilityRelationships),
            providers,
        );
        let aggregator = PermissionAggregator::new(cache, store, settings.cache.clone());
        Self::new(Arc::new(resolver), Arc::new(aggregator))
    }

    #[must_use]
    pub fn resolver(&self) -> &GroupResolver {
        &self.resolver
    }

    #[must_use]
    pub fn aggregator(&self) -> &PermissionAggregator {
        &self.aggregator
    }

    /// Permissions the principal holds without a resource context. Memoized.
    ///
    /// ## Errors
    /// Propagates resolution and aggregation failures.
    pub async fn base_permissions(&self, ctx: &AuthContext) -> ServiceResult<PermissionSet> {
        ctx.base_slot()
            .get_or_try_init(|| async {
                let groups = self.resolver.resolve_groups(ctx.principal()).await?;
                self.aggregator.permissions_for_groups(&groups).await
            })
            .await
            .cloned()
    }

    /// Permissions the principal holds relative to `resource` only.
    ///
    /// Memoized per resource identity. A resource without stable identity
    /// contributes nothing and is never memoized.
    ///
    /// ## Errors
    /// Propagates resolution and aggregation failures.
    pub async fn resource_permissions(
        &self,
        ctx: &AuthContext,
        resource: &dyn Resource,
    ) -> ServiceResult<PermissionSet> {
        let Some(key) = resource.resource_key() else {
            return Ok(PermissionSet::new());
        };
        if let Some(permissions) = ctx.memoized_for(&key) {
            return Ok(permissions);
        }

        let groups = self
            .resolver
            .resolve_groups_for_resource(ctx.principal(), resource)
            .await?;
        let permissions = self.aggregator.permissions_for_groups(&groups).await?;
        ctx.memoize_for(key, permissions.clone());
        Ok(permissions)
    }

    /// Every permission the principal holds, optionally relative to `resource`.
    ///
    /// ## Errors
    /// Propagates resolution and aggregation failures.
    pub async fn all_permissions(
        &self,
        ctx: &AuthContext,
        resource: Option<&dyn Resource>,
    ) -> ServiceResult<PermissionSet> {
        let mut permissions = self.base_permissions(ctx).await?;
        if let Some(resource) = resource {
            permissions.extend(self.resource_permissions(ctx, resource).await?);
        }
        Ok(permissions)
    }

    /// Check whether the principal holds `permission`, optionally relative to `resource`.
    ///
    /// ## Errors
    /// Propagates resolution and aggregation failures.
    #[tracing::instrument(skip(self, ctx, resource), fields(principal_id = ?ctx.principal().id()))]
    pub async fn has_permission(
        &self,
        ctx: &AuthContext,
        permission: &str,
        resource: Option<&dyn Resource>,
    ) -> ServiceResult<bool> {
        // Both sets are always resolved so a failing relationship or provider
        // lookup surfaces even when the base set already grants the permission.
        let granted = self
            .all_permissions(ctx, resource)
            .await?
            .contains(permission);

        tracing::debug!(granted, "Permission check");
        Ok(granted)
    }

    /// Same as [`Self::has_permission`], as an [`AuthzResult`].
    ///
    /// ## Errors
    /// Propagates resolution and aggregation failures.
    pub async fn check(
        &self,
        ctx: &AuthContext,
        permission: &str,
        resource: Option<&dyn Resource>,
    ) -> ServiceResult<AuthzResult> {
        Ok(AuthzResult::from_granted(
            self.has_permission(ctx, permission, resource).await?,
        ))
    }

    /// Check and require a permission, returning an error if denied.
    ///
    /// ## Errors
    ///
    /// - Returns `AuthorizationError` if access is denied.
    /// - Propagates resolution and aggregation failures.
    pub async fn require_permission(
        &self,
        ctx: &AuthContext,
        permission: &str,
        resource: Option<&dyn Resource>,
    ) -> ServiceResult<()> {
        self.check(ctx, permission, resource)
            .await?
            .require(permission)
    }

    /// Check whether an active principal holds any permission in `namespace`.
    ///
    /// Only resource-less permissions are considered.
    ///
    /// ## Errors
    /// Propagates resolution and aggregation failures.
    #[tracing::instrument(skip(self, ctx), fields(principal_id = ?ctx.principal().id()))]
    pub async fn has_any_permission_in_namespace(
        &self,
        ctx: &AuthContext,
        namespace: &str,
    ) -> ServiceResult<bool> {
        if !ctx.principal().is_active() {
            tracing::debug!("Inactive principal, namespace check denied");
            return Ok(false);
        }
        let granted = self
            .base_permissions(ctx)
            .await?
            .iter()
            .any(|permission| permission.namespace() == namespace);

        tracing::debug!(granted, "Namespace check");
        Ok(granted)
    }
}
