//! Key-value cache for group permission sets.
//!
//! The aggregator only needs `get`, `set` and `delete`. Entries never expire;
//! they are removed when the permission store reports a group mutation.

use async_trait::async_trait;
use dashmap::DashMap;

use sysgroups_core::PermissionSet;

use crate::error::ServiceResult;

#[async_trait]
pub trait Cache: Send + Sync {
    /// ## Errors
    /// Returns `StoreUnavailable` if the cache cannot be reached.
    async fn get(&self, key: &str) -> ServiceResult<Option<PermissionSet>>;

    /// ## Errors
    /// Returns `StoreUnavailable` if the cache cannot be reached.
    async fn set(&self, key: &str, value: PermissionSet) -> ServiceResult<()>;

    /// ## Errors
    /// Returns `StoreUnavailable` if the cache cannot be reached.
    async fn delete(&self, key: &str) -> ServiceResult<()>;
}

/// Process-local cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, PermissionSet>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> ServiceResult<Option<PermissionSet>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: PermissionSet) -> ServiceResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> ServiceResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
