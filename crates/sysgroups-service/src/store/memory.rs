//! In-process permission store.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use sysgroups_core::{Permission, PermissionSet};

use super::{GroupEvent, GroupMutationListener, PermissionStore, Subscribers, SubscriptionId};
use crate::error::{ServiceError, ServiceResult};

/// Permission store holding every group's bindings in memory.
///
/// Counts `permissions_of_group` calls so cache behaviour can be observed.
#[derive(Default)]
pub struct MemoryPermissionStore {
    groups: RwLock<HashMap<String, PermissionSet>>,
    subscribers: Subscribers,
    queries: AtomicUsize,
}

impl MemoryPermissionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `permissions_of_group` calls served so far.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    async fn permissions_of_group(&self, name: &str) -> ServiceResult<PermissionSet> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .groups
            .read()
            .await
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    async fn group_exists(&self, name: &str) -> ServiceResult<bool> {
        Ok(self.groups.read().await.contains_key(name))
    }

    async fn create_group(&self, name: &str) -> ServiceResult<bool> {
        {
            let mut groups = self.groups.write().await;
            if groups.contains_key(name) {
                return Ok(false);
            }
            groups.insert(name.to_string(), PermissionSet::new());
        }
        self.subscribers
            .notify(&GroupEvent::Created {
                name: name.to_string(),
            })
            .await?;
        Ok(true)
    }

    async fn add_permission(&self, group: &str, permission: &Permission) -> ServiceResult<bool> {
        let added = {
            let mut groups = self.groups.write().await;
            let bindings = groups
                .get_mut(group)
                .ok_or_else(|| ServiceError::NotFound(format!("group `{group}`")))?;
            bindings.insert(permission.clone())
        };
        if added {
            self.subscribers
                .notify(&GroupEvent::BindingsChanged {
                    name: group.to_string(),
                })
                .await?;
        }
        Ok(added)
    }

    async fn remove_permission(
        &self,
        group: &str,
        permission: &Permission,
    ) -> ServiceResult<bool> {
        let removed = self
            .groups
            .write()
            .await
            .get_mut(group)
            .is_some_and(|bindings| bindings.remove(permission));
        if removed {
            self.subscribers
                .notify(&GroupEvent::BindingsChanged {
                    name: group.to_string(),
                })
                .await?;
        }
        Ok(removed)
    }

    async fn rename_group(&self, from: &str, to: &str) -> ServiceResult<()> {
        if from == to {
            return Ok(());
        }
        {
            let mut groups = self.groups.write().await;
            if groups.contains_key(to) {
                return Err(ServiceError::Conflict(format!("group `{to}` already exists")));
            }
            let bindings = groups
                .remove(from)
                .ok_or_else(|| ServiceError::NotFound(format!("group `{from}`")))?;
            groups.insert(to.to_string(), bindings);
        }
        self.subscribers
            .notify(&GroupEvent::Renamed {
                from: from.to_string(),
                to: to.to_string(),
            })
            .await
    }

    async fn delete_group(&self, name: &str) -> ServiceResult<bool> {
        let existed = self.groups.write().await.remove(name).is_some();
        if existed {
            self.subscribers
                .notify(&GroupEvent::Deleted {
                    name: name.to_string(),
                })
                .await?;
        }
        Ok(existed)
    }

    fn subscribe(&self, listener: Arc<dyn GroupMutationListener>) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}
