//! Pluggable group providers.
//!
//! A provider contributes extra group names on top of the built-in system
//! groups. It implements [`GroupContributor`] to contribute groups for a
//! principal, [`ResourceGroupContributor`] to contribute groups for a
//! principal relative to a resource, or both. Each capability is registered
//! separately, so the resolver only ever calls a provider through a capability
//! it actually has.

use std::sync::Arc;

use async_trait::async_trait;

use sysgroups_core::GroupSet;

use crate::error::ServiceResult;
use crate::principal::Principal;
use crate::resource::Resource;

/// Common identity of a group provider, used in logs and error reports.
pub trait GroupProvider: Send + Sync {
    fn name(&self) -> &str;
}

/// Contributes groups a principal holds regardless of any resource.
#[async_trait]
pub trait GroupContributor: GroupProvider {
    /// ## Errors
    /// Returns an error if the provider cannot determine the groups. The
    /// resolver propagates it instead of treating it as an empty contribution.
    async fn contribute_groups(&self, principal: &dyn Principal) -> ServiceResult<GroupSet>;
}

/// Contributes groups a principal holds relative to a specific resource.
#[async_trait]
pub trait ResourceGroupContributor: GroupProvider {
    /// ## Errors
    /// Returns an error if the provider cannot determine the groups. The
    /// resolver propagates it instead of treating it as an empty contribution.
    async fn contribute_groups_for_resource(
        &self,
        principal: &dyn Principal,
        resource: &dyn Resource,
    ) -> ServiceResult<GroupSet>;
}

/// Ordered registry of group providers, split by capability.
#[derive(Clone, Default)]
pub struct GroupProviders {
    contributors: Vec<Arc<dyn GroupContributor>>,
    resource_contributors: Vec<Arc<dyn ResourceGroupContributor>>,
}

impl GroupProviders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider that only contributes principal groups.
    pub fn register_contributor(&mut self, provider: Arc<dyn GroupContributor>) -> &mut Self {
        tracing::debug!(provider = provider.name(), "Registered group contributor");
        self.contributors.push(provider);
        self
    }

    /// Register a provider that only contributes resource-relative groups.
    pub fn register_resource_contributor(
        &mut self,
        provider: Arc<dyn ResourceGroupContributor>,
    ) -> &mut Self {
        tracing::debug!(
            provider = provider.name(),
            "Registered resource group contributor"
        );
        self.resource_contributors.push(provider);
        self
    }

    /// Register a provider under both capabilities.
    pub fn register<P>(&mut self, provider: Arc<P>) -> &mut Self
    where
        P: GroupContributor + ResourceGroupContributor + 'static,
    {
        self.register_contributor(provider.clone());
        self.register_resource_contributor(provider)
    }

    #[must_use]
    pub fn contributors(&self) -> &[Arc<dyn GroupContributor>] {
        &self.contributors
    }

    #[must_use]
    pub fn resource_contributors(&self) -> &[Arc<dyn ResourceGroupContributor>] {
        &self.resource_contributors
    }

    /// Returns `true` if no provider is registered under either capability.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty() && self.resource_contributors.is_empty()
    }
}

impl std::fmt::Debug for GroupProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupProviders")
            .field(
                "contributors",
                &self.contributors.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field(
                "resource_contributors",
                &self
                    .resource_contributors
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
