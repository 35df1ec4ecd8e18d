//! Value types shared by the resolver, the aggregator and the authorization façade.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::str::FromStr;

use crate::constants::PERMISSION_SEPARATOR;
use crate::error::{CoreError, CoreResult};

/// Stable identifier of a principal.
pub type PrincipalId = uuid::Uuid;

/// A set of group names a principal currently holds.
pub type GroupSet = HashSet<String>;

/// A set of permissions, unordered and without duplicates.
pub type PermissionSet = HashSet<Permission>;

/// A permission identifier of the form `namespace.action`.
///
/// The namespace is everything before the first `.`; the action is the rest.
/// Both parts must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permission(String);

impl Permission {
    /// Parse a `namespace.action` identifier.
    ///
    /// ## Errors
    /// Returns `ParseError` if the separator is missing or either part is empty.
    pub fn parse(value: &str) -> CoreResult<Self> {
        match value.split_once(PERMISSION_SEPARATOR) {
            Some((namespace, action)) if !namespace.is_empty() && !action.is_empty() => {
                Ok(Self(value.to_string()))
            }
            _ => Err(CoreError::ParseError(format!(
                "permission `{value}` is not of the form namespace.action"
            ))),
        }
    }

    /// Build a permission from its two parts.
    ///
    /// ## Errors
    /// Returns `ParseError` if either part is empty or the namespace contains the separator.
    pub fn new(namespace: &str, action: &str) -> CoreResult<Self> {
        if namespace.contains(PERMISSION_SEPARATOR) {
            return Err(CoreError::ParseError(format!(
                "permission namespace `{namespace}` must not contain `{PERMISSION_SEPARATOR}`"
            )));
        }
        Self::parse(&format!("{namespace}{PERMISSION_SEPARATOR}{action}"))
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        self.0
            .split_once(PERMISSION_SEPARATOR)
            .map_or(self.0.as_str(), |(namespace, _)| namespace)
    }

    #[must_use]
    pub fn action(&self) -> &str {
        self.0
            .split_once(PERMISSION_SEPARATOR)
            .map_or("", |(_, action)| action)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Lets a `PermissionSet` be queried with a plain `&str`.
impl Borrow<str> for Permission {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for Permission {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a list of identifiers into a `PermissionSet`.
///
/// ## Errors
/// Returns the first `ParseError` encountered.
pub fn parse_permissions<I, S>(values: I) -> CoreResult<PermissionSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| Permission::parse(value.as_ref()))
        .collect()
}

/// Stable identity of a persisted resource.
///
/// Built from a resource kind and an identifier that is unique within that kind,
/// e.g. `auth.group:42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(String);

impl ResourceKey {
    #[must_use]
    pub fn new(kind: &str, id: impl std::fmt::Display) -> Self {
        Self(format!("{kind}:{id}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
