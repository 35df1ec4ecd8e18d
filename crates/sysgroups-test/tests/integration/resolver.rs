#![allow(clippy::unused_async, clippy::expect_used)]
//! Group resolution integration tests.
//!
//! Checks which system groups the anonymous principal, `user` (not staff,
//! creator of the group object) and `user2` (staff, owner of the group object)
//! hold, with and without a resource.

use std::sync::Arc;

use sysgroups_test::component::{
    AnonymousUser, GroupProviders, Principal, ResourceKey, ServiceError, User,
};

use super::helpers::*;

// ============================================================================
// Baseline groups
// ============================================================================

#[test_log::test(tokio::test)]
async fn everyone_holds_the_universal_group() {
    let engine = TestEngine::new().await;

    assert!(engine.groups(&AnonymousUser).await.contains(GROUP_EVERYONE));
    assert!(engine.groups(&engine.user).await.contains(GROUP_EVERYONE));
    assert!(engine.groups(&engine.user2).await.contains(GROUP_EVERYONE));
}

#[test_log::test(tokio::test)]
async fn anonymous_group_only_for_anonymous() {
    let engine = TestEngine::new().await;

    assert!(engine.groups(&AnonymousUser).await.contains(GROUP_ANONYMOUS));
    assert!(!engine.groups(&engine.user).await.contains(GROUP_ANONYMOUS));
}

#[test_log::test(tokio::test)]
async fn users_group_only_for_authenticated() {
    let engine = TestEngine::new().await;

    assert!(!engine.groups(&AnonymousUser).await.contains(GROUP_USERS));
    assert!(engine.groups(&engine.user).await.contains(GROUP_USERS));
}

#[test_log::test(tokio::test)]
async fn staffs_group_only_for_privileged() {
    let engine = TestEngine::new().await;

    assert!(!engine.groups(&AnonymousUser).await.contains(GROUP_STAFFS));
    assert!(!engine.groups(&engine.user).await.contains(GROUP_STAFFS));
    assert!(engine.groups(&engine.user2).await.contains(GROUP_STAFFS));
}

#[test_log::test(tokio::test)]
async fn inactive_user_keeps_baseline_groups() {
    let engine = TestEngine::new().await;
    let inactive = engine.user2.clone().with_active(false);

    let groups = engine.groups(&inactive).await;
    assert_eq!(groups.len(), 3);
    assert!(groups.contains(GROUP_USERS));
    assert!(groups.contains(GROUP_STAFFS));
}

// ============================================================================
// Resource-relative groups
// ============================================================================

#[test_log::test(tokio::test)]
async fn creator_group_only_for_creator() {
    let engine = TestEngine::new().await;

    assert!(!engine.groups_for_obj(&AnonymousUser).await.contains(GROUP_CREATOR));
    assert!(engine.groups_for_obj(&engine.user).await.contains(GROUP_CREATOR));
    assert!(!engine.groups_for_obj(&engine.user2).await.contains(GROUP_CREATOR));
}

#[test_log::test(tokio::test)]
async fn owner_group_only_for_owner() {
    let engine = TestEngine::new().await;

    assert!(!engine.groups_for_obj(&AnonymousUser).await.contains(GROUP_OWNER));
    assert!(!engine.groups_for_obj(&engine.user).await.contains(GROUP_OWNER));
    assert!(engine.groups_for_obj(&engine.user2).await.contains(GROUP_OWNER));
}

#[test_log::test(tokio::test)]
async fn resource_groups_exclude_baseline() {
    let engine = TestEngine::new().await;

    let groups = engine.groups_for_obj(&engine.user).await;
    assert_eq!(groups.len(), 1);
    assert!(!groups.contains(GROUP_EVERYONE));
}

#[test_log::test(tokio::test)]
async fn unsaved_resource_yields_no_groups_and_no_lookups() {
    let engine = TestEngine::new().await;
    let relationships = Arc::new(CountingRelationships::default());
    let resolver = counting_resolver(relationships.clone());
    let draft = engine.group_obj.unsaved();

    for principal in [
        &AnonymousUser as &dyn Principal,
        &engine.user,
        &engine.user2,
    ] {
        let groups = resolver
            .resolve_groups_for_resource(principal, &draft)
            .await
            .expect("Failed to resolve resource groups");
        assert!(groups.is_empty());
    }
    assert_eq!(relationships.calls(), 0);

    resolver
        .resolve_groups_for_resource(&engine.user, &engine.group_obj)
        .await
        .expect("Failed to resolve resource groups");
    assert_eq!(relationships.calls(), 2);
}

#[test_log::test(tokio::test)]
async fn relationship_failure_fails_resource_resolution() {
    let engine = TestEngine::new().await;
    let detached = DetachedObject {
        key: ResourceKey::new("auth.group", 4),
    };

    let result = engine
        .authz
        .resolver()
        .resolve_groups_for_resource(&engine.user, &detached)
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::ProviderLookupError { ref provider, .. }) if provider == "relationships"
    ));

    // Base permissions alone would grant this, but the failure is not masked.
    engine.grant(GROUP_EVERYONE, &[CHANGE_GROUP]).await;
    let ctx = engine.user_ctx();
    assert!(
        engine
            .authz
            .has_permission(&ctx, CHANGE_GROUP, Some(&detached))
            .await
            .is_err()
    );
}

// ============================================================================
// Providers
// ============================================================================

#[test_log::test(tokio::test)]
async fn providers_extend_resolved_groups() {
    let mut providers = GroupProviders::new();
    providers.register(Arc::new(ReviewProvider));
    let engine = TestEngine::with_providers(providers).await;

    let staff_groups = engine.groups(&engine.user2).await;
    assert!(staff_groups.contains("Reviewers"));
    assert!(staff_groups.contains(GROUP_EVERYONE));
    assert!(!engine.groups(&engine.user).await.contains("Reviewers"));

    let resource_groups = engine.groups_for_obj(&engine.user).await;
    assert!(resource_groups.contains("Editors"));
    assert!(resource_groups.contains(GROUP_CREATOR));
    assert!(!engine.groups_for_obj(&AnonymousUser).await.contains("Editors"));

    // Providers are not consulted for an unsaved resource either.
    let draft = engine.group_obj.unsaved();
    let groups = engine
        .authz
        .resolver()
        .resolve_groups_for_resource(&engine.user, &draft)
        .await
        .expect("Failed to resolve resource groups");
    assert!(groups.is_empty());
}

#[test_log::test(tokio::test)]
async fn provider_failure_fails_resolution() {
    let mut providers = GroupProviders::new();
    providers.register_contributor(Arc::new(UnreachableProvider));
    let engine = TestEngine::with_providers(providers).await;

    let result = engine
        .authz
        .resolver()
        .resolve_groups(&User::new(uuid::Uuid::now_v7()))
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::ProviderLookupError { ref provider, .. }) if provider == "unreachable"
    ));

    // The failure also surfaces from a permission check instead of a silent deny.
    let ctx = engine.user_ctx();
    assert!(
        engine
            .authz
            .has_permission(&ctx, CHANGE_GROUP, None)
            .await
            .is_err()
    );
}
