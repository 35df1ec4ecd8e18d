use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A group provider or the relationship provider could not answer.
    #[error("Provider lookup failed in {provider}: {message}")]
    ProviderLookupError { provider: String, message: String },

    /// The permission store or the cache could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Casbin error: {0}")]
    CasbinError(#[from] casbin::Error),

    #[error(transparent)]
    CoreError(#[from] sysgroups_core::error::CoreError),

    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl ServiceError {
    /// Build a `ProviderLookupError` attributed to the named provider.
    #[must_use]
    pub fn provider_lookup(provider: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::ProviderLookupError {
            provider: provider.into(),
            message: message.to_string(),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
