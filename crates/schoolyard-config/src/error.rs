//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment could not read or extract the configuration.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// A required value is missing or blank.
    #[error("Configuration value '{field}' is not configured")]
    NotConfigured { field: String },

    /// A value is present but unusable.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
