//! Request-scoped authorization context.
//!
//! An [`AuthContext`] pairs a principal with the permission sets already
//! computed for it, so repeated checks within one request or session do not
//! resolve groups and aggregate permissions again. The memoized sets belong to
//! the context: a new context starts empty, and nothing is shared between
//! contexts. Each slot is written once; a racing recomputation stores an equal set.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use sysgroups_core::{PermissionSet, ResourceKey};

use crate::principal::Principal;

pub struct AuthContext {
    principal: Arc<dyn Principal>,
    base: OnceCell<PermissionSet>,
    by_resource: DashMap<ResourceKey, PermissionSet>,
}

impl AuthContext {
    #[must_use]
    pub fn new(principal: Arc<dyn Principal>) -> Self {
        Self {
            principal,
            base: OnceCell::new(),
            by_resource: DashMap::new(),
        }
    }

    #[must_use]
    pub fn principal(&self) -> &dyn Principal {
        self.principal.as_ref()
    }

    /// Forget every memoized permission set.
    ///
    /// Call after changing the principal's attributes within the same session.
    pub fn reset(&mut self) {
        self.base.take();
        self.by_resource.clear();
    }

    pub(crate) fn base_slot(&self) -> &OnceCell<PermissionSet> {
        &self.base
    }

    pub(crate) fn memoized_for(&self, key: &ResourceKey) -> Option<PermissionSet> {
        self.by_resource.get(key).map(|entry| entry.value().clone())
    }

    pub(crate) fn memoize_for(&self, key: ResourceKey, permissions: PermissionSet) {
        self.by_resource.insert(key, permissions);
    }

    /// Number of resources with a memoized permission set.
    #[must_use]
    pub fn memoized_resources(&self) -> usize {
        self.by_resource.len()
    }

    /// Returns `true` once the resource-less permission set has been computed.
    #[must_use]
    pub fn has_memoized_base(&self) -> bool {
        self.base.initialized()
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("principal", &self.principal)
            .field("has_memoized_base", &self.has_memoized_base())
            .field("memoized_resources", &self.memoized_resources())
            .finish()
    }
}
