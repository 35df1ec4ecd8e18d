//! Group membership resolution.
//!
//! The resolver computes the system groups a principal currently holds:
//!
//! - Baseline groups from the principal's own attributes: `Everyone` always,
//!   then exactly one of `Anonymous` / `Users`, plus `Staffs` for privileged
//!   authenticated principals.
//! - Resource-relative groups from the principal's relationship to a persisted
//!   resource: `Creator` and `Owner`.
//! - Whatever the registered [`GroupProviders`] contribute, unioned in.
//!
//! Provider failures propagate; a partial group set could grant too much or too little.

use std::sync::Arc;

use futures::future::try_join_all;

use sysgroups_core::{GroupSet, SystemGroup, SystemGroupNames};

use crate::error::ServiceResult;
use crate::principal::Principal;
use crate::provider::GroupProviders;
use crate::resource::{CapabilityRelationships, RelationshipProvider, Resource};

pub struct GroupResolver {
    names: SystemGroupNames,
    relationships: Arc<dyn RelationshipProvider>,
    providers: GroupProviders,
}

impl GroupResolver {
    #[must_use]
    pub fn new(
        names: SystemGroupNames,
        relationships: Arc<dyn RelationshipProvider>,
        providers: GroupProviders,
    ) -> Self {
        Self {
            names,
            relationships,
            providers,
        }
    }

    /// Resolver with the default group names, capability-based relationships
    /// and no extra providers.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(
            SystemGroupNames::default(),
            Arc::new(CapabilityRelationships),
            GroupProviders::new(),
        )
    }

    #[must_use]
    pub fn names(&self) -> &SystemGroupNames {
        &self.names
    }

    #[must_use]
    pub fn providers(&self) -> &GroupProviders {
        &self.providers
    }

    /// Baseline groups derived from the principal's attributes alone.
    #[must_use]
    pub fn baseline_groups(&self, principal: &dyn Principal) -> GroupSet {
        let mut groups = GroupSet::new();
        groups.insert(self.name(SystemGroup::Everyone));
        if principal.is_anonymous() {
            groups.insert(self.name(SystemGroup::Anonymous));
        } else {
            groups.insert(self.name(SystemGroup::Users));
            if principal.is_privileged() {
                groups.insert(self.name(SystemGroup::Staffs));
            }
        }
        groups
    }

    /// Resolve every group the principal holds without a resource context.
    ///
    /// ## Errors
    /// Propagates the first provider failure.
    #[tracing::instrument(skip(self, principal), fields(principal_id = ?principal.id()))]
    pub async fn resolve_groups(&self, principal: &dyn Principal) -> ServiceResult<GroupSet> {
        let mut groups = self.baseline_groups(principal);

        let contributions = try_join_all(self.providers.contributors().iter().map(|provider| {
            async move {
                let contributed = provider.contribute_groups(principal).await.inspect_err(|e| {
                    tracing::warn!(provider = provider.name(), error = %e, "Group contributor failed");
                })?;
                tracing::trace!(
                    provider = provider.name(),
                    groups = ?contributed,
                    "Provider contributed groups"
                );
                ServiceResult::Ok(contributed)
            }
        }))
        .await?;

        groups.extend(contributions.into_iter().flatten());

        tracing::debug!(groups = ?groups, "Resolved principal groups");
        Ok(groups)
    }

    /// Resolve the groups the principal holds relative to `resource`.
    ///
    /// A resource without stable identity yields an empty set and no
    /// relationship or provider lookup is made.
    ///
    /// ## Errors
    /// Propagates relationship and provider failures.
    #[tracing::instrument(
        skip(self, principal, resource),
        fields(principal_id = ?principal.id(), resource = tracing::field::Empty)
    )]
    pub async fn resolve_groups_for_resource(
        &self,
        principal: &dyn Principal,
        resource: &dyn Resource,
    ) -> ServiceResult<GroupSet> {
        if !self.relationships.has_stable_identity(resource) {
            tracing::debug!("Resource has no stable identity, skipping relationship groups");
            return Ok(GroupSet::new());
        }
        if let Some(key) = resource.resource_key() {
            tracing::Span::current().record("resource", tracing::field::display(&key));
        }

        let (is_creator, is_owner) = futures::try_join!(
            self.relationships.is_creator(resource, principal),
            self.relationships.is_owner(resource, principal),
        )?;

        let mut groups = GroupSet::new();
        if is_creator {
            groups.insert(self.name(SystemGroup::Creator));
        }
        if is_owner {
            groups.insert(self.name(SystemGroup::Owner));
        }

        let contributions = try_join_all(self.providers.resource_contributors().iter().map(
            |provider| async move {
                let contributed = provider
                    .contribute_groups_for_resource(principal, resource)
                    .await
                    .inspect_err(|e| {
                        tracing::warn!(
                            provider = provider.name(),
                            error = %e,
                            "Resource group contributor failed"
                        );
                    })?;
                tracing::trace!(
                    provider = provider.name(),
                    groups = ?contributed,
                    "Provider contributed resource groups"
                );
                ServiceResult::Ok(contributed)
            },
        ))
        .await?;

        groups.extend(contributions.into_iter().flatten());

        tracing::debug!(groups = ?groups, "Resolved resource groups");
        Ok(groups)
    }

    fn name(&self, group: SystemGroup) -> String {
        self.names.name(group).to_string()
    }
}

impl Default for GroupResolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}
