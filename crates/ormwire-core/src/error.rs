//! Settings error types

use thiserror::Error;

/// Result type alias for settings operations
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors that can occur while loading or reading settings
#[derive(Error, Debug)]
pub enum SettingsError {
    /// A source could not be loaded or merged
    #[error("Failed to load settings: {0}")]
    Load(String),

    /// A key exists but its value has the wrong shape
    #[error("Invalid value for '{key}': {message}")]
    Deserialize { key: String, message: String },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for SettingsError {
    fn from(err: config::ConfigError) -> Self {
        SettingsError::Load(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_display() {
        let error = SettingsError::Deserialize {
            key: "app.debug".to_string(),
            message: "expected a boolean".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Invalid value for 'app.debug': expected a boolean"
        );
    }

    #[test]
    fn test_load_display() {
        let error = SettingsError::Load("configuration file \"missing\" not found".to_string());
        assert!(error.to_string().starts_with("Failed to load settings"));
    }
}
