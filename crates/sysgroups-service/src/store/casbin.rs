//! Permission store backed by a Casbin enforcer.
//!
//! Bindings are stored as policies `p, <group>, <namespace>.<action>`. A group
//! with no bindings is kept alive by a marker grouping rule
//! `g, <group>, __group__`, so that creating an empty group is observable.
//! Any Casbin adapter can load the policies (memory, string, file, database).
//! Mutations only change the in-memory policy; [`CasbinPermissionStore::save`]
//! writes the whole policy back through the adapter, so read-only adapters
//! such as a string adapter still accept mutations.

use std::sync::Arc;

use async_trait::async_trait;
use casbin::{CoreApi, MgmtApi, TryIntoAdapter};
use tokio::sync::RwLock;

use sysgroups_core::{Permission, PermissionSet};

use super::{GroupEvent, GroupMutationListener, PermissionStore, Subscribers, SubscriptionId};
use crate::error::{ServiceError, ServiceResult};

/// Role name of the grouping rule that records a group's existence.
pub const GROUP_MARKER: &str = "__group__";

pub struct CasbinPermissionStore {
    enforcer: RwLock<casbin::Enforcer>,
    subscribers: Subscribers,
}

impl CasbinPermissionStore {
    /// ## Summary
    /// Build a store over the given adapter, loading its policies.
    ///
    /// ## Errors
    /// Returns an error if the model cannot be parsed or the adapter fails to load.
    #[tracing::instrument(skip(adapter))]
    pub async fn new<A: TryIntoAdapter>(adapter: A) -> ServiceResult<Self> {
        tracing::debug!("Initializing Casbin permission store");

        let model = casbin::DefaultModel::from_str(include_str!("casbin_model.conf")).await?;
        let mut enforcer = casbin::Enforcer::new(model, adapter).await?;
        enforcer.enable_auto_save(false);

        let policy_count = enforcer.get_policy().len();
        let group_count = enforcer.get_grouping_policy().len();
        tracing::info!(
            policy_count = policy_count,
            group_count = group_count,
            "Casbin permission store initialized"
        );

        Ok(Self {
            enforcer: RwLock::new(enforcer),
            subscribers: Subscribers::default(),
        })
    }

    /// ## Summary
    /// Build a store over a Casbin policy CSV file.
    ///
    /// ## Errors
    /// Returns an error if the file cannot be loaded.
    pub async fn from_file(path: &str) -> ServiceResult<Self> {
        Self::new(casbin::FileAdapter::new(path.to_string())).await
    }

    /// ## Summary
    /// Build an empty store whose policies live only in memory.
    ///
    /// ## Errors
    /// Returns an error if the model cannot be parsed.
    pub async fn in_memory() -> ServiceResult<Self> {
        Self::new(casbin::MemoryAdapter::default()).await
    }

    /// ## Summary
    /// Every group known to the store, sorted.
    pub async fn groups(&self) -> Vec<String> {
        let enforcer = self.enforcer.read().await;
        let mut groups: Vec<String> = enforcer
            .get_policy()
            .into_iter()
            .chain(enforcer.get_filtered_grouping_policy(1, vec![GROUP_MARKER.to_string()]))
            .filter_map(|rule| rule.into_iter().next())
            .collect();
        groups.sort();
        groups.dedup();
        groups
    }

    /// ## Summary
    /// Persist the current policies through the adapter. Mutations are not
    /// written back until this is called.
    ///
    /// ## Errors
    /// Returns an error if the adapter cannot save.
    pub async fn save(&self) -> ServiceResult<()> {
        self.enforcer.write().await.save_policy().await?;
        Ok(())
    }

    fn exists_in(enforcer: &casbin::Enforcer, name: &str) -> bool {
        enforcer.has_grouping_policy(marker_rule(name))
            || !enforcer
                .get_filtered_policy(0, vec![name.to_string()])
                .is_empty()
    }
}

fn marker_rule(name: &str) -> Vec<String> {
    vec![name.to_string(), GROUP_MARKER.to_string()]
}

fn binding_rule(group: &str, permission: &Permission) -> Vec<String> {
    vec![group.to_string(), permission.to_string()]
}

#[async_trait]
impl PermissionStore for CasbinPermissionStore {
    async fn permissions_of_group(&self, name: &str) -> ServiceResult<PermissionSet> {
        let rules = self
            .enforcer
            .read()
            .await
            .get_filtered_policy(0, vec![name.to_string()]);

        let mut permissions = PermissionSet::with_capacity(rules.len());
        for rule in rules {
            let value = rule.get(1).ok_or_else(|| {
                ServiceError::StoreUnavailable(format!("malformed policy for group `{name}`"))
            })?;
            permissions.insert(Permission::parse(value)?);
        }
        tracing::trace!(group = name, count = permissions.len(), "Loaded group policies");
        Ok(permissions)
    }

    async fn group_exists(&self, name: &str) -> ServiceResult<bool> {
        Ok(Self::exists_in(&*self.enforcer.read().await, name))
    }

    async fn create_group(&self, name: &str) -> ServiceResult<bool> {
        {
            let mut enforcer = self.enforcer.write().await;
            if Self::exists_in(&enforcer, name) {
                return Ok(false);
            }
            enforcer.add_grouping_policy(marker_rule(name)).await?;
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
            let mut enforcer = self.enforcer.write().await;
            if !Self::exists_in(&enforcer, group) {
                return Err(ServiceError::NotFound(format!("group `{group}`")));
            }
            enforcer.add_policy(binding_rule(group, permission)).await?
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
        let removed = {
            let mut enforcer = self.enforcer.write().await;
            if !enforcer.has_policy(binding_rule(group, permission)) {
                return Ok(false);
            }
            // Keep the group alive once its last binding is gone.
            if !enforcer.has_grouping_policy(marker_rule(group)) {
                enforcer.add_grouping_policy(marker_rule(group)).await?;
            }
            enforcer
                .remove_policy(binding_rule(group, permission))
                .await?
        };
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
            let mut enforcer = self.enforcer.write().await;
            if !Self::exists_in(&enforcer, from) {
                return Err(ServiceError::NotFound(format!("group `{from}`")));
            }
            if Self::exists_in(&enforcer, to) {
                return Err(ServiceError::Conflict(format!("group `{to}` already exists")));
            }

            let renamed: Vec<Vec<String>> = enforcer
                .get_filtered_policy(0, vec![from.to_string()])
                .into_iter()
                .map(|mut rule| {
                    if let Some(subject) = rule.first_mut() {
                        *subject = to.to_string();
                    }
                    rule
                })
                .collect();

            enforcer.add_grouping_policy(marker_rule(to)).await?;
            if !renamed.is_empty() {
                enforcer.add_policies(renamed).await?;
                enforcer
                    .remove_filtered_policy(0, vec![from.to_string()])
                    .await?;
            }
            if enforcer.has_grouping_policy(marker_rule(from)) {
                enforcer.remove_grouping_policy(marker_rule(from)).await?;
            }
        }
        self.subscribers
            .notify(&GroupEvent::Renamed {
                from: from.to_string(),
                to: to.to_string(),
            })
            .await
    }

    async fn delete_group(&self, name: &str) -> ServiceResult<bool> {
        let existed = {
            let mut enforcer = self.enforcer.write().await;
            if !Self::exists_in(&enforcer, name) {
                return Ok(false);
            }
            if !enforcer
                .get_filtered_policy(0, vec![name.to_string()])
                .is_empty()
            {
                enforcer
                    .remove_filtered_policy(0, vec![name.to_string()])
                    .await?;
            }
            if enforcer.has_grouping_policy(marker_rule(name)) {
                enforcer.remove_grouping_policy(marker_rule(name)).await?;
            }
            true
        };
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
