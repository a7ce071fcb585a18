//! Error types for the configuration framework

use thiserror::Error;

/// Main error type for schema declaration, value resolution and file loading
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A raw value could not be coerced to the field's type, or was rejected
    /// by one of the field's validators
    #[error("Invalid field value: {value}")]
    InvalidField { value: String },

    /// A schema declaration or a nested section is malformed
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// Configuration file is missing or could not be opened
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration file was read but its content does not parse
    #[error("Broken configuration file {path}: {message}")]
    BrokenConfig { path: String, message: String },

    /// No parser is registered for the file extension
    #[error("Unknown configuration format: {path}")]
    UnknownConfigFormat { path: String },

    /// Read-only field already holds an assigned value
    #[error("Field {field} is read-only")]
    ReadOnlyField { field: String },

    /// Field name is not declared on the schema
    #[error("Unknown field: {field}")]
    UnknownField { field: String },

    /// A value provider failed to produce a value
    #[error("Value provider {provider} failed: {message}")]
    Provider { provider: String, message: String },

    /// Filesystem errors outside of configuration discovery
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// Schema could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// Build an `InvalidField` error from anything printable
    pub fn invalid_field(value: impl ToString) -> Self {
        ConfigError::InvalidField {
            value: value.to_string(),
        }
    }

    /// Whether the error came from coercing or validating a single value
    pub fn is_field_error(&self) -> bool {
        matches!(
            self,
            ConfigError::InvalidField { .. } | ConfigError::ReadOnlyField { .. }
        )
    }
}
