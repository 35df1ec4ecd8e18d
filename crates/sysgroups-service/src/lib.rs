//! System group resolution and permission aggregation.
//!
//! ## Module Organization
//!
//! - `aggregator`: Per-group permission lookup through the cache, with event-driven invalidation
//! - `authorize`: Authorization façade (`Authorizer`) answering permission checks
//! - `cache`: Cache abstraction and the in-process `MemoryCache`
//! - `context`: Request-scoped `AuthContext` holding memoized permission sets
//! - `principal`: Principal attributes read by the engine
//! - `provider`: Pluggable group providers and their registry
//! - `resolver`: Group membership resolution (`GroupResolver`)
//! - `resource`: Resources and creator/owner relationships
//! - `store`: Permission stores (memory, Casbin) and group mutation events

pub mod aggregator;
pub mod authorize;
pub mod cache;
pub mod context;
pub mod error;
pub mod principal;
pub mod provider;
pub mod resolver;
pub mod resource;
pub mod store;

// Re-export commonly used types at crate level
pub use aggregator::PermissionAggregator;
pub use authorize::{Authorizer, AuthzResult};
pub use cache::{Cache, MemoryCache};
pub use context::AuthContext;
pub use error::{ServiceError, ServiceResult};
pub use principal::{AnonymousUser, Principal, User};
pub use provider::{GroupContributor, GroupProvider, GroupProviders, ResourceGroupContributor};
pub use resolver::GroupResolver;
pub use resource::{CapabilityRelationships, Created, Owned, RelationshipProvider, Resource};
pub use store::{
    CasbinPermissionStore, GroupEvent, GroupMutationListener, MemoryPermissionStore,
    PermissionStore, SubscriptionId, init_system_groups,
};
