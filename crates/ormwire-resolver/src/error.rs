//! Resolution error types

use thiserror::Error;

/// Result type alias for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors that can occur while resolving or assembling ORM configuration
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Metadata driver discriminator is not one of the known drivers
    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    /// A field required by the selected variant is absent
    #[error("{section} requires '{field}' to be set")]
    MissingField { section: String, field: String },

    /// A field is present but cannot be used
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// `db.default` names a connection that is not configured
    #[error("Unknown connection: {0}")]
    UnknownConnection(String),

    /// Cache client could not be instantiated
    #[error("Failed to connect {provider} cache: {message}")]
    CacheConnection { provider: String, message: String },

    /// The ORM bootstrap rejected the assembled configuration
    #[error("Bootstrap error: {0}")]
    Bootstrap(String),

    /// Settings source error
    #[error(transparent)]
    Settings(#[from] ormwire_core::SettingsError),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolveError {
    pub(crate) fn missing(section: impl Into<String>, field: impl Into<String>) -> Self {
        ResolveError::MissingField {
            section: section.into(),
            field: field.into(),
        }
    }

    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolveError::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
