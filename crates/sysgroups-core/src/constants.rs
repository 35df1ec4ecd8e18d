/// Default names of the well-known system groups
pub const GROUP_EVERYONE: &str = "Everyone";
pub const GROUP_ANONYMOUS: &str = "Anonymous";
pub const GROUP_USERS: &str = "Users";
pub const GROUP_STAFFS: &str = "Staffs";
pub const GROUP_CREATOR: &str = "Creator";
pub const GROUP_OWNER: &str = "Owner";

/// Separator between the namespace and the action of a permission identifier.
pub const PERMISSION_SEPARATOR: char = '.';

pub const CACHE_KEY_NAMESPACE: &str = "group_permissions";
/// Prefix prepended to a group name to build its permission cache key.
pub const CACHE_KEY_PREFIX: &str = const_str::concat!("__", CACHE_KEY_NAMESPACE, "_");

/// Prefix for environment variables read by `Settings::load`.
pub const ENV_PREFIX: &str = "SYSGROUPS";
