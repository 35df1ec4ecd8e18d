//! Cache-backed permission aggregation.
//!
//! The permissions bound to a group are looked up in the cache first and only
//! read from the permission store on a miss. Entries never expire: the
//! aggregator subscribes to the store's group mutations on construction and
//! deletes the affected entries before the mutation returns.
//!
//! A lookup that races with a mutation must not write a stale set back into
//! the cache after the invalidation ran. Every invalidation bumps an epoch; a
//! lookup that sees the epoch move while it was loading deletes what it wrote.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::future::try_join_all;

use sysgroups_core::PermissionSet;
use sysgroups_core::config::CacheConfig;

use crate::cache::Cache;
use crate::error::ServiceResult;
use crate::store::{GroupEvent, GroupMutationListener, PermissionStore, SubscriptionId};

/// Deletes cache entries for groups named in a mutation event.
struct CacheInvalidator {
    cache: Arc<dyn Cache>,
    config: CacheConfig,
    epoch: Arc<AtomicU64>,
}

#[async_trait]
impl GroupMutationListener for CacheInvalidator {
    async fn on_group_mutation(&self, event: &GroupEvent) -> ServiceResult<()> {
        for group in event.affected_groups() {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            self.cache.delete(&self.config.group_key(group)).await?;
            tracing::debug!(group, event = ?event, "Invalidated group permission cache");
        }
        Ok(())
    }
}

pub struct PermissionAggregator {
    cache: Arc<dyn Cache>,
    store: Arc<dyn PermissionStore>,
    config: CacheConfig,
    epoch: Arc<AtomicU64>,
    subscription: Option<SubscriptionId>,
}

impl PermissionAggregator {
    /// ## Summary
    /// Create an aggregator and subscribe it to the store's group mutations.
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>, store: Arc<dyn PermissionStore>, config: CacheConfig) -> Self {
        let epoch = Arc::new(AtomicU64::new(0));
        let subscription = store.subscribe(Arc::new(CacheInvalidator {
            cache: cache.clone(),
            config: config.clone(),
            epoch: epoch.clone(),
        }));
        tracing::info!(subscription = ?subscription, "Permission aggregator subscribed to group mutations");

        Self {
            cache,
            store,
            config,
            epoch,
            subscription: Some(subscription),
        }
    }

    /// Permissions bound to a single group.
    ///
    /// ## Errors
    /// Returns `StoreUnavailable` (or the store's own error) if the cache or the store fails.
    #[tracing::instrument(skip(self))]
    pub async fn permissions_for_group(&self, name: &str) -> ServiceResult<PermissionSet> {
        let key = self.config.group_key(name);
        if let Some(permissions) = self.cache.get(&key).await? {
            tracing::trace!(cache_hit = true, count = permissions.len(), "Group permissions");
            return Ok(permissions);
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        let permissions = self.store.permissions_of_group(name).await?;
        self.cache.set(&key, permissions.clone()).await?;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!("Group mutated during lookup, dropping cached entry");
            self.cache.delete(&key).await?;
        }

        tracing::trace!(cache_hit = false, count = permissions.len(), "Group permissions");
        Ok(permissions)
    }

    /// Union of the permissions bound to every named group.
    ///
    /// ## Errors
    /// Returns the first cache or store failure.
    pub async fn permissions_for_groups<I, S>(&self, names: I) -> ServiceResult<PermissionSet>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sets = try_join_all(
            names
                .into_iter()
                .map(|name| async move { self.permissions_for_group(name.as_ref()).await }),
        )
        .await?;
        Ok(sets.into_iter().flatten().collect())
    }

    /// Drop a group's cached entry outside of the store's notifications.
    ///
    /// ## Errors
    /// Returns `StoreUnavailable` if the cache cannot be reached.
    pub async fn invalidate_group(&self, name: &str) -> ServiceResult<()> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.cache.delete(&self.config.group_key(name)).await
    }

    /// ## Summary
    /// Stop receiving group mutations. Cached entries can go stale afterwards.
    pub fn shutdown(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.store.unsubscribe(id);
            tracing::info!(subscription = ?id, "Permission aggregator unsubscribed");
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn PermissionStore> {
        &self.store
    }
}

impl Drop for PermissionAggregator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
