use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::{CACHE_KEY_PREFIX, ENV_PREFIX};
use crate::error::CoreError;
use crate::groups::SystemGroupNames;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub groups: SystemGroupNames,
    pub cache: CacheConfig,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub key_prefix: String,
}

impl CacheConfig {
    /// ## Summary
    /// Builds the cache key under which a group's permission set is stored.
    #[must_use]
    pub fn group_key(&self, group_name: &str) -> String {
        format!("{}{group_name}", self.key_prefix)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: CACHE_KEY_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Casbin policy CSV with `p, <group>, <permission>` lines.
    pub path: Option<String>,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from environment variables and an optional `config.toml`.
    /// Environment variables are prefixed with `SYSGROUPS_` and use `__` between sections,
    /// e.g. `SYSGROUPS_GROUPS__STAFFS=Admins`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails,
    /// or if the resulting settings are invalid.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("cache.key_prefix", CACHE_KEY_PREFIX)?
            // Env file
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?;
        settings.validate()?;
        Ok(settings)
    }

    /// ## Summary
    /// Checks the settings that deserialization alone cannot.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` for an empty cache key prefix or invalid group names.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.cache.key_prefix.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "cache.key_prefix must not be empty".to_string(),
            ));
        }
        self.groups
            .validate()
            .map_err(|e| CoreError::InvalidConfiguration(format!("groups: {e}")))?;
        tracing::debug!(groups = ?self.groups, "Settings validated");
        Ok(())
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
