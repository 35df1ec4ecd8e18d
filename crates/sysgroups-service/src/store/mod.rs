//! Permission store: which permissions are bound to which group.
//!
//! ## Module Organization
//!
//! - `memory`: in-process store backed by a hash map
//! - `casbin`: store backed by a Casbin enforcer and any Casbin adapter
//!
//! Every mutation notifies the subscribed [`GroupMutationListener`]s after it
//! is applied and before it returns. A listener failure fails the mutation, so
//! a caller never observes a completed mutation whose invalidation did not run.

pub mod casbin;
pub mod memory;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use sysgroups_core::{Permission, PermissionSet, SystemGroupNames};

use crate::error::ServiceResult;

pub use self::casbin::CasbinPermissionStore;
pub use memory::MemoryPermissionStore;

/// A change to a group's existence, name or permission bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupEvent {
    Created { name: String },
    BindingsChanged { name: String },
    Renamed { from: String, to: String },
    Deleted { name: String },
}

impl GroupEvent {
    /// Names whose cached permission sets this event makes stale.
    #[must_use]
    pub fn affected_groups(&self) -> Vec<&str> {
        match self {
            Self::Created { name } | Self::BindingsChanged { name } | Self::Deleted { name } => {
                vec![name.as_str()]
            }
            Self::Renamed { from, to } => vec![from.as_str(), to.as_str()],
        }
    }
}

/// Receives group mutations from a [`PermissionStore`].
#[async_trait]
pub trait GroupMutationListener: Send + Sync {
    /// ## Errors
    /// Returns an error if the listener could not react; the mutation then fails.
    async fn on_group_mutation(&self, event: &GroupEvent) -> ServiceResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Listener list shared by the store implementations.
#[derive(Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(SubscriptionId, Arc<dyn GroupMutationListener>)>>,
}

impl Subscribers {
    pub fn subscribe(&self, listener: Arc<dyn GroupMutationListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every listener in subscription order.
    ///
    /// ## Errors
    /// Returns the first listener failure; later listeners are not called.
    pub async fn notify(&self, event: &GroupEvent) -> ServiceResult<()> {
        let listeners: Vec<_> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        tracing::trace!(event = ?event, listeners = listeners.len(), "Notifying group listeners");
        for listener in listeners {
            listener.on_group_mutation(event).await?;
        }
        Ok(())
    }
}

/// Storage of group-to-permission bindings.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Live permission set bound to `name`. Unknown groups have no permissions.
    ///
    /// ## Errors
    /// Returns `StoreUnavailable` (or a backend error) if the store cannot be read.
    async fn permissions_of_group(&self, name: &str) -> ServiceResult<PermissionSet>;

    /// ## Errors
    /// Returns an error if the store cannot be read.
    async fn group_exists(&self, name: &str) -> ServiceResult<bool>;

    /// Create an empty group. Returns `false` if it already existed.
    ///
    /// ## Errors
    /// Returns an error if the store cannot be written or a listener fails.
    async fn create_group(&self, name: &str) -> ServiceResult<bool>;

    /// Bind a permission to an existing group. Returns `false` if already bound.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown group, or a store/listener failure.
    async fn add_permission(&self, group: &str, permission: &Permission) -> ServiceResult<bool>;

    /// Unbind a permission. Returns `false` if it was not bound.
    ///
    /// ## Errors
    /// Returns an error if the store cannot be written or a listener fails.
    async fn remove_permission(&self, group: &str, permission: &Permission)
    -> ServiceResult<bool>;

    /// Rename a group, keeping its bindings.
    ///
    /// ## Errors
    /// Returns `NotFound` if `from` does not exist, `Conflict` if `to` already exists,
    /// or a store/listener failure.
    async fn rename_group(&self, from: &str, to: &str) -> ServiceResult<()>;

    /// Delete a group and its bindings. Returns `false` if it did not exist.
    ///
    /// ## Errors
    /// Returns an error if the store cannot be written or a listener fails.
    async fn delete_group(&self, name: &str) -> ServiceResult<bool>;

    fn subscribe(&self, listener: Arc<dyn GroupMutationListener>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Ensure every well-known system group exists in `store`.
///
/// Returns the number of groups that had to be created.
///
/// ## Errors
/// Returns the first store failure.
#[tracing::instrument(skip(store, names))]
pub async fn init_system_groups(
    store: &dyn PermissionStore,
    names: &SystemGroupNames,
) -> ServiceResult<usize> {
    let mut created = 0;
    for (group, name) in names.iter() {
        if store.create_group(name).await? {
            tracing::debug!(group = %group, name, "Created system group");
            created += 1;
        }
    }
    tracing::info!(created, "System groups initialized");
    Ok(created)
}
