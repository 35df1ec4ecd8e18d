//! Resources and principal-to-resource relationships.
//!
//! A resource is any domain object a permission check can be made against.
//! It opts into the creator and owner relationships by exposing the
//! [`Created`] and [`Owned`] capabilities; the [`RelationshipProvider`]
//! answers relationship questions through those capabilities.

use async_trait::async_trait;

use sysgroups_core::{PrincipalId, ResourceKey};

use crate::error::ServiceResult;
use crate::principal::Principal;

/// A domain object that permissions can be checked against.
pub trait Resource: Send + Sync {
    /// Stable identity of the resource, or `None` while it has not been persisted.
    fn resource_key(&self) -> Option<ResourceKey>;

    /// Creator capability, if this resource records who created it.
    fn as_created(&self) -> Option<&dyn Created> {
        None
    }

    /// Owner capability, if this resource records who owns it.
    fn as_owned(&self) -> Option<&dyn Owned> {
        None
    }
}

/// A resource that knows its creator.
#[async_trait]
pub trait Created: Send + Sync {
    /// ## Errors
    /// Returns an error if the creator cannot be looked up.
    async fn creator(&self) -> ServiceResult<Option<PrincipalId>>;
}

/// A resource that knows its owner.
#[async_trait]
pub trait Owned: Send + Sync {
    /// ## Errors
    /// Returns an error if the owner cannot be looked up.
    async fn owner(&self) -> ServiceResult<Option<PrincipalId>>;
}

/// Answers "how is this principal related to this resource".
#[async_trait]
pub trait RelationshipProvider: Send + Sync {
    /// Returns `true` if relationship lookups against `resource` are meaningful.
    fn has_stable_identity(&self, resource: &dyn Resource) -> bool {
        resource.resource_key().is_some()
    }

    /// ## Errors
    /// Returns `ProviderLookupError` (or the collaborator's own error) if the lookup fails.
    async fn is_creator(
        &self,
        resource: &dyn Resource,
        principal: &dyn Principal,
    ) -> ServiceResult<bool>;

    /// ## Errors
    /// Returns `ProviderLookupError` (or the collaborator's own error) if the lookup fails.
    async fn is_owner(&self, resource: &dyn Resource, principal: &dyn Principal)
    -> ServiceResult<bool>;
}

/// Relationship provider backed by the resource's own [`Created`] / [`Owned`] capabilities.
///
/// A resource without the capability has no creator (or owner), and a principal
/// without an identity is never anyone's creator or owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityRelationships;

#[async_trait]
impl RelationshipProvider for CapabilityRelationships {
    async fn is_creator(
        &self,
        resource: &dyn Resource,
        principal: &dyn Principal,
    ) -> ServiceResult<bool> {
        let (Some(id), Some(created)) = (principal.id(), resource.as_created()) else {
            return Ok(false);
        };
        Ok(created.creator().await? == Some(id))
    }

    async fn is_owner(
        &self,
        resource: &dyn Resource,
        principal: &dyn Principal,
    ) -> ServiceResult<bool> {
        let (Some(id), Some(owned)) = (principal.id(), resource.as_owned()) else {
            return Ok(false);
        };
        Ok(owned.owner().await? == Some(id))
    }
}
