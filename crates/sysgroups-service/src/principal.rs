//! Principal types for authorization.
//!
//! A principal is the acting identity being authorized. The engine only reads
//! a handful of attributes from it and never mutates it. Identity storage and
//! authentication live outside this crate; callers adapt their own user type
//! by implementing [`Principal`].

use sysgroups_core::PrincipalId;

/// The attributes of a principal the engine depends on.
pub trait Principal: Send + Sync + std::fmt::Debug {
    /// Stable identity used for creator/owner comparisons.
    ///
    /// Anonymous principals have no identity and therefore never match a
    /// resource's creator or owner.
    fn id(&self) -> Option<PrincipalId>;

    fn is_anonymous(&self) -> bool;

    /// Elevated (staff-like) flag. Ignored for anonymous principals.
    fn is_privileged(&self) -> bool;

    /// Deactivated principals keep their groups but are denied namespace-wide checks.
    fn is_active(&self) -> bool;
}

/// The anonymous principal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnonymousUser;

impl Principal for AnonymousUser {
    fn id(&self) -> Option<PrincipalId> {
        None
    }

    fn is_anonymous(&self) -> bool {
        true
    }

    fn is_privileged(&self) -> bool {
        false
    }

    fn is_active(&self) -> bool {
        false
    }
}

/// An authenticated principal described by its identity and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: PrincipalId,
    pub is_staff: bool,
    pub is_active: bool,
}

impl User {
    /// Create an active, non-staff user.
    #[must_use]
    pub const fn new(id: PrincipalId) -> Self {
        Self {
            id,
            is_staff: false,
            is_active: true,
        }
    }

    #[must_use]
    pub const fn with_staff(mut self, is_staff: bool) -> Self {
        self.is_staff = is_staff;
        self
    }

    #[must_use]
    pub const fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

impl Principal for User {
    fn id(&self) -> Option<PrincipalId> {
        Some(self.id)
    }

    fn is_anonymous(&self) -> bool {
        false
    }

    fn is_privileged(&self) -> bool {
        self.is_staff
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}
