//! Well-known system groups.
//!
//! A system group is a membership label computed from a principal's attributes
//! (baseline groups) or from its relationship to a resource (resource-relative
//! groups). Principals never join these groups explicitly.

use std::collections::HashSet;

use serde::Deserialize;

use crate::constants::{
    GROUP_ANONYMOUS, GROUP_CREATOR, GROUP_EVERYONE, GROUP_OWNER, GROUP_STAFFS, GROUP_USERS,
};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemGroup {
    /// Every principal, anonymous or not.
    Everyone,
    /// Anonymous principals only.
    Anonymous,
    /// Authenticated principals.
    Users,
    /// Authenticated principals carrying the privileged (staff) flag.
    Staffs,
    /// The principal that created the resource under check.
    Creator,
    /// The principal that owns the resource under check.
    Owner,
}

impl SystemGroup {
    pub const ALL: [Self; 6] = [
        Self::Everyone,
        Self::Anonymous,
        Self::Users,
        Self::Staffs,
        Self::Creator,
        Self::Owner,
    ];

    #[must_use]
    pub const fn default_name(self) -> &'static str {
        match self {
            Self::Everyone => GROUP_EVERYONE,
            Self::Anonymous => GROUP_ANONYMOUS,
            Self::Users => GROUP_USERS,
            Self::Staffs => GROUP_STAFFS,
            Self::Creator => GROUP_CREATOR,
            Self::Owner => GROUP_OWNER,
        }
    }

    /// Returns `true` for groups that only exist relative to a resource.
    #[must_use]
    pub const fn is_resource_relative(self) -> bool {
        matches!(self, Self::Creator | Self::Owner)
    }
}

impl std::fmt::Display for SystemGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_name())
    }
}

/// Names under which the well-known groups are stored in the permission store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SystemGroupNames {
    pub everyone: String,
    pub anonymous: String,
    pub users: String,
    pub staffs: String,
    pub creator: String,
    pub owner: String,
}

impl SystemGroupNames {
    #[must_use]
    pub fn name(&self, group: SystemGroup) -> &str {
        match group {
            SystemGroup::Everyone => &self.everyone,
            SystemGroup::Anonymous => &self.anonymous,
            SystemGroup::Users => &self.users,
            SystemGroup::Staffs => &self.staffs,
            SystemGroup::Creator => &self.creator,
            SystemGroup::Owner => &self.owner,
        }
    }

    /// Returns every configured name, in `SystemGroup::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (SystemGroup, &str)> {
        SystemGroup::ALL.into_iter().map(|group| (group, self.name(group)))
    }

    /// Reverse lookup of a configured name.
    #[must_use]
    pub fn group_of(&self, name: &str) -> Option<SystemGroup> {
        self.iter()
            .find(|(_, configured)| *configured == name)
            .map(|(group, _)| group)
    }

    /// Check that every name is non-blank and that no two groups share a name.
    ///
    /// ## Errors
    /// Returns `ValidationError` naming the first offending group.
    pub fn validate(&self) -> CoreResult<()> {
        let mut seen = HashSet::with_capacity(SystemGroup::ALL.len());
        for (group, name) in self.iter() {
            if name.trim().is_empty() {
                return Err(CoreError::ValidationError(format!(
                    "name of system group {group} is empty"
                )));
            }
            if !seen.insert(name) {
                return Err(CoreError::ValidationError(format!(
                    "name `{name}` of system group {group} is already used"
                )));
            }
        }
        Ok(())
    }
}

impl Default for SystemGroupNames {
    fn default() -> Self {
        Self {
            everyone: GROUP_EVERYONE.to_string(),
            anonymous: GROUP_ANONYMOUS.to_string(),
            users: GROUP_USERS.to_string(),
            staffs: GROUP_STAFFS.to_string(),
            creator: GROUP_CREATOR.to_string(),
            owner: GROUP_OWNER.to_string(),
        }
    }
}
