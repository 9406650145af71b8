//! Error types for the service container

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for container operations
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Errors that can occur while loading or reading a container
#[derive(Error, Debug)]
pub enum ContainerError {
    /// No definition file matched the requested name
    #[error("Definition file not found: {name}")]
    DefinitionNotFound { name: String },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A parameter could not be converted to the requested type
    #[error("Failed to convert YAML value: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A definition file is malformed
    #[error("Invalid definition file {path}: {message}")]
    InvalidDefinition { path: PathBuf, message: String },

    /// A definition file imports itself, directly or through other files
    #[error("Circular import of {path}")]
    CircularImport { path: PathBuf },

    /// No service or live instance registered under the id
    #[error("Service not found: {id}")]
    ServiceNotFound { id: String },

    /// The live instance has a different type than requested
    #[error("Service '{id}' is not a {expected}")]
    TypeMismatch { id: String, expected: &'static str },

    /// A `%name%` placeholder names an undefined parameter
    #[error("Parameter not found: {name}")]
    ParameterNotFound { name: String },
}
