#![allow(clippy::unused_async, clippy::expect_used, dead_code)]
//! Test helpers for integration tests.
//!
//! Provides utilities for:
//! - Building an engine over a fresh in-memory store with the system groups created
//! - The three standard principals: anonymous, `user` (not staff) and `user2` (staff)
//! - A persisted group object created by `user` and owned by `user2`
//! - Counting relationship providers and failing group providers
//!
//! ## Isolation
//! Every test builds its own store, cache and authorizer, so tests run in
//! parallel without sharing cached permission sets.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use sysgroups_test::component::config::Settings;
use sysgroups_test::component::{
    AnonymousUser, AuthContext, Authorizer, CapabilityRelationships, Created, GroupContributor,
    GroupProvider, GroupProviders, GroupResolver, GroupSet, MemoryCache, MemoryPermissionStore,
    Owned, Permission, PermissionAggregator, PermissionStore, Principal, PrincipalId,
    RelationshipProvider, Resource, ResourceGroupContributor, ResourceKey, ServiceError,
    ServiceResult, SystemGroupNames, User, init_system_groups,
};

pub use sysgroups_test::component::constants::{
    GROUP_ANONYMOUS, GROUP_CREATOR, GROUP_EVERYONE, GROUP_OWNER, GROUP_STAFFS, GROUP_USERS,
};

pub const CHANGE_GROUP: &str = "auth.change_group";
pub const DELETE_GROUP: &str = "auth.delete_group";

/// ## Summary
/// A group record that, like every object in these tests, was created by
/// `creator` and is owned by `owner`.
#[derive(Debug, Clone)]
pub struct GroupObject {
    pub key: Option<ResourceKey>,
    pub creator: PrincipalId,
    pub owner: PrincipalId,
}

impl GroupObject {
    /// Same creator and owner, but not persisted yet.
    #[must_use]
    pub fn unsaved(&self) -> Self {
        Self {
            key: None,
            ..self.clone()
        }
    }
}

#[async_trait]
impl Created for GroupObject {
    async fn creator(&self) -> ServiceResult<Option<PrincipalId>> {
        Ok(Some(self.creator))
    }
}

#[async_trait]
impl Owned for GroupObject {
    async fn owner(&self) -> ServiceResult<Option<PrincipalId>> {
        Ok(Some(self.owner))
    }
}

impl Resource for GroupObject {
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

/// A persisted record whose creator and owner columns cannot be read.
#[derive(Debug, Clone)]
pub struct DetachedObject {
    pub key: ResourceKey,
}

#[async_trait]
impl Created for DetachedObject {
    async fn creator(&self) -> ServiceResult<Option<PrincipalId>> {
        Err(ServiceError::provider_lookup("relationships", "creator column unavailable"))
    }
}

#[async_trait]
impl Owned for DetachedObject {
    async fn owner(&self) -> ServiceResult<Option<PrincipalId>> {
        Err(ServiceError::provider_lookup("relationships", "owner column unavailable"))
    }
}

impl Resource for DetachedObject {
    fn resource_key(&self) -> Option<ResourceKey> {
        Some(self.key.clone())
    }

    fn as_created(&self) -> Option<&dyn Created> {
        Some(self)
    }

    fn as_owned(&self) -> Option<&dyn Owned> {
        Some(self)
    }
}

/// Engine wired over a fresh in-memory store, plus the standard principals.
pub struct TestEngine {
    pub store: Arc<MemoryPermissionStore>,
    pub cache: Arc<MemoryCache>,
    pub authz: Authorizer,
    pub user: User,
    pub user2: User,
    pub group_obj: GroupObject,
}

impl TestEngine {
    /// ## Summary
    /// Builds an engine with the default group names and no extra providers.
    pub async fn new() -> Self {
        Self::with_providers(GroupProviders::new()).await
    }

    /// ## Summary
    /// Builds an engine with the default group names and the given providers.
    pub async fn with_providers(providers: GroupProviders) -> Self {
        let settings = Settings::default();
        let store = Arc::new(MemoryPermissionStore::new());
        init_system_groups(store.as_ref(), &settings.groups)
            .await
            .expect("Failed to create system groups");

        let cache = Arc::new(MemoryCache::new());
        let authz = Authorizer::from_settings(&settings, store.clone(), cache.clone(), providers);

        let user = User::new(uuid::Uuid::now_v7());
        let user2 = User::new(uuid::Uuid::now_v7()).with_staff(true);
        let group_obj = GroupObject {
            key: Some(ResourceKey::new("auth.group", 3)),
            creator: user.id,
            owner: user2.id,
        };

        Self {
            store,
            cache,
            authz,
            user,
            user2,
            group_obj,
        }
    }

    /// ## Summary
    /// Binds each permission to `group`.
    pub async fn grant(&self, group: &str, permissions: &[&str]) {
        for permission in permissions {
            self.store
                .add_permission(
                    group,
                    &Permission::parse(permission).expect("Invalid permission"),
                )
                .await
                .expect("Failed to grant permission");
        }
    }

    #[must_use]
    pub fn anonymous_ctx(&self) -> AuthContext {
        AuthContext::new(Arc::new(AnonymousUser))
    }

    #[must_use]
    pub fn user_ctx(&self) -> AuthContext {
        AuthContext::new(Arc::new(self.user.clone()))
    }

    #[must_use]
    pub fn user2_ctx(&self) -> AuthContext {
        AuthContext::new(Arc::new(self.user2.clone()))
    }

    /// ## Summary
    /// `has_permission` against the group object.
    pub async fn has_perm_on_obj(&self, ctx: &AuthContext, permission: &str) -> bool {
        self.authz
            .has_permission(ctx, permission, Some(&self.group_obj))
            .await
            .expect("Permission check failed")
    }

    /// ## Summary
    /// Groups `principal` holds relative to the group object.
    pub async fn groups_for_obj(&self, principal: &dyn Principal) -> GroupSet {
        self.authz
            .resolver()
            .resolve_groups_for_resource(principal, &self.group_obj)
            .await
            .expect("Failed to resolve resource groups")
    }

    /// ## Summary
    /// Groups `principal` holds without a resource.
    pub async fn groups(&self, principal: &dyn Principal) -> GroupSet {
        self.authz
            .resolver()
            .resolve_groups(principal)
            .await
            .expect("Failed to resolve groups")
    }
}

/// Builds a standalone aggregator over a fresh store, with the system groups created.
pub async fn aggregator_fixture() -> (Arc<MemoryPermissionStore>, Arc<MemoryCache>, PermissionAggregator)
{
    let settings = Settings::default();
    let store = Arc::new(MemoryPermissionStore::new());
    init_system_groups(store.as_ref(), &settings.groups)
        .await
        .expect("Failed to create system groups");
    let cache = Arc::new(MemoryCache::new());
    let aggregator = PermissionAggregator::new(cache.clone(), store.clone(), settings.cache);
    (store, cache, aggregator)
}

/// Relationship provider that counts how often it is asked.
#[derive(Default)]
pub struct CountingRelationships {
    inner: CapabilityRelationships,
    calls: AtomicUsize,
}

impl CountingRelationships {
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelationshipProvider for CountingRelationships {
    async fn is_creator(
        &self,
        resource: &dyn Resource,
        principal: &dyn Principal,
    ) -> ServiceResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.is_creator(resource, principal).await
    }

    async fn is_owner(
        &self,
        resource: &dyn Resource,
        principal: &dyn Principal,
    ) -> ServiceResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.is_owner(resource, principal).await
    }
}

/// Builds a resolver with default names over the counting relationship provider.
#[must_use]
pub fn counting_resolver(relationships: Arc<CountingRelationships>) -> GroupResolver {
    GroupResolver::new(
        SystemGroupNames::default(),
        relationships,
        GroupProviders::new(),
    )
}

/// Provider granting `Reviewers` to staff and `Editors` on any persisted resource.
pub struct ReviewProvider;

impl GroupProvider for ReviewProvider {
    fn name(&self) -> &str {
        "review"
    }
}

#[async_trait]
impl GroupContributor for ReviewProvider {
    async fn contribute_groups(&self, principal: &dyn Principal) -> ServiceResult<GroupSet> {
        let mut groups = GroupSet::new();
        if principal.is_privileged() {
            groups.insert("Reviewers".to_string());
        }
        Ok(groups)
    }
}

#[async_trait]
impl ResourceGroupContributor for ReviewProvider {
    async fn contribute_groups_for_resource(
        &self,
        principal: &dyn Principal,
        _resource: &dyn Resource,
    ) -> ServiceResult<GroupSet> {
        let mut groups = GroupSet::new();
        if !principal.is_anonymous() {
            groups.insert("Editors".to_string());
        }
        Ok(groups)
    }
}

/// Provider whose backend is always down.
pub struct UnreachableProvider;

impl GroupProvider for UnreachableProvider {
    fn name(&self) -> &str {
        "unreachable"
    }
}

#[async_trait]
impl GroupContributor for UnreachableProvider {
    async fn contribute_groups(&self, _principal: &dyn Principal) -> ServiceResult<GroupSet> {
        Err(ServiceError::provider_lookup(
            self.name(),
            "directory timed out",
        ))
    }
}
