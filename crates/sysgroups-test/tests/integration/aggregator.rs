#![allow(clippy::unused_async, clippy::expect_used)]
//! Permission aggregation and cache invalidation integration tests.

use std::sync::Arc;

use string_adapter::StringAdapter;
use sysgroups_test::component::config::CacheConfig;
use sysgroups_test::component::{
    Cache, CasbinPermissionStore, MemoryCache, Permission, PermissionAggregator, PermissionStore,
};

use super::helpers::*;

fn perm(value: &str) -> Permission {
    Permission::parse(value).expect("Invalid permission")
}

#[test_log::test(tokio::test)]
async fn repeated_lookup_queries_store_once() {
    let (store, cache, aggregator) = aggregator_fixture().await;
    store
        .add_permission(GROUP_STAFFS, &perm(CHANGE_GROUP))
        .await
        .expect("Failed to grant permission");

    let before = store.query_count();
    let first = aggregator
        .permissions_for_group(GROUP_STAFFS)
        .await
        .expect("Lookup failed");
    let second = aggregator
        .permissions_for_group(GROUP_STAFFS)
        .await
        .expect("Lookup failed");

    assert_eq!(first, second);
    assert_eq!(store.query_count(), before + 1);
    assert!(cache.contains_key("__group_permissions_Staffs"));
}

#[test_log::test(tokio::test)]
async fn mutation_forces_requery() {
    let (store, cache, aggregator) = aggregator_fixture().await;
    aggregator
        .permissions_for_group(GROUP_USERS)
        .await
        .expect("Lookup failed");
    let before = store.query_count();

    store
        .add_permission(GROUP_USERS, &perm(DELETE_GROUP))
        .await
        .expect("Failed to grant permission");
    assert!(!cache.contains_key("__group_permissions_Users"));

    let permissions = aggregator
        .permissions_for_group(GROUP_USERS)
        .await
        .expect("Lookup failed");
    assert!(permissions.contains(DELETE_GROUP));
    assert_eq!(store.query_count(), before + 1);
}

#[test_log::test(tokio::test)]
async fn mutation_of_one_group_keeps_others_cached() {
    let (store, cache, aggregator) = aggregator_fixture().await;
    aggregator
        .permissions_for_groups([GROUP_USERS, GROUP_STAFFS])
        .await
        .expect("Lookup failed");

    store
        .add_permission(GROUP_USERS, &perm(DELETE_GROUP))
        .await
        .expect("Failed to grant permission");

    assert!(!cache.contains_key("__group_permissions_Users"));
    assert!(cache.contains_key("__group_permissions_Staffs"));
}

#[test_log::test(tokio::test)]
async fn rename_invalidates_both_names() {
    let (store, cache, aggregator) = aggregator_fixture().await;
    store
        .add_permission(GROUP_OWNER, &perm(CHANGE_GROUP))
        .await
        .expect("Failed to grant permission");
    aggregator
        .permissions_for_groups([GROUP_OWNER, "Maintainers"])
        .await
        .expect("Lookup failed");
    assert!(cache.contains_key("__group_permissions_Maintainers"));

    store
        .rename_group(GROUP_OWNER, "Maintainers")
        .await
        .expect("Rename failed");

    assert!(!cache.contains_key("__group_permissions_Owner"));
    assert!(!cache.contains_key("__group_permissions_Maintainers"));
    assert!(
        aggregator
            .permissions_for_group("Maintainers")
            .await
            .expect("Lookup failed")
            .contains(CHANGE_GROUP)
    );
    assert!(
        aggregator
            .permissions_for_group(GROUP_OWNER)
            .await
            .expect("Lookup failed")
            .is_empty()
    );
}

#[test_log::test(tokio::test)]
async fn aggregators_share_one_cache_per_key_prefix() {
    let (store, cache, first) = aggregator_fixture().await;
    let second = PermissionAggregator::new(
        cache.clone(),
        store.clone(),
        CacheConfig {
            key_prefix: "__tenant_b_".to_string(),
        },
    );

    first
        .permissions_for_group(GROUP_EVERYONE)
        .await
        .expect("Lookup failed");
    second
        .permissions_for_group(GROUP_EVERYONE)
        .await
        .expect("Lookup failed");
    assert!(cache.contains_key("__group_permissions_Everyone"));
    assert!(cache.contains_key("__tenant_b_Everyone"));

    store
        .add_permission(GROUP_EVERYONE, &perm(CHANGE_GROUP))
        .await
        .expect("Failed to grant permission");
    assert!(cache.is_empty());
}

#[test_log::test(tokio::test)]
async fn casbin_store_mutations_invalidate_cache() {
    let policies = r"
p, Staffs, auth.change_group
g, Creator, __group__
";
    let store = Arc::new(
        CasbinPermissionStore::new(StringAdapter::new(policies))
            .await
            .expect("Failed to create store"),
    );
    let cache = Arc::new(MemoryCache::new());
    let aggregator =
        PermissionAggregator::new(cache.clone(), store.clone(), CacheConfig::default());

    assert!(
        aggregator
            .permissions_for_group(GROUP_CREATOR)
            .await
            .expect("Lookup failed")
            .is_empty()
    );
    store
        .add_permission(GROUP_CREATOR, &perm(DELETE_GROUP))
        .await
        .expect("Failed to grant permission");
    assert!(
        cache
            .get("__group_permissions_Creator")
            .await
            .expect("Cache failed")
            .is_none()
    );

    let permissions = aggregator
        .permissions_for_groups([GROUP_CREATOR, GROUP_STAFFS])
        .await
        .expect("Lookup failed");
    assert_eq!(permissions.len(), 2);

    assert!(
        store
            .delete_group(GROUP_STAFFS)
            .await
            .expect("Delete failed")
    );
    assert!(
        aggregator
            .permissions_for_group(GROUP_STAFFS)
            .await
            .expect("Lookup failed")
            .is_empty()
    );
}
