//! Error types for the admission-control library

use thiserror::Error;

/// Result type alias for callgate operations
pub type Result<T> = std::result::Result<T, GateError>;

/// Main error type for the admission-control library
#[derive(Error, Debug)]
pub enum GateError {
    /// The endpoint has no rate-limit configuration and no default profile exists
    #[error("no rate limit configuration for endpoint: {0}")]
    EndpointNotConfigured(String),

    /// A blocking wait was cancelled by its deadline
    #[error("wait for rate limit cancelled: {0}")]
    Cancelled(String),

    /// Alert lookup by id failed
    #[error("alert not found: {0}")]
    AlertNotFound(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GateError {
    /// Whether the error indicates the caller was refused admission outright,
    /// as opposed to a transient wait/cancellation condition.
    pub fn is_configuration_failure(&self) -> bool {
        matches!(self, GateError::EndpointNotConfigured(_) | GateError::Config(_))
    }
}
