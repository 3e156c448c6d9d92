//! Error types for zone provisioning
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for provisioning operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zone provisioning
#[derive(Error, Debug)]
pub enum Error {
    /// A required configuration value is absent or empty
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Configuration is present but malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A provider request (service activation or zone operation) failed
    #[error("Provider request failed ({provider}): {message}")]
    ProviderRequestFailed {
        /// Provider name
        provider: String,
        /// Error message, as reported by the provider
        message: String,
    },

    /// Export store-related errors
    #[error("Export store error: {0}")]
    ExportStore(String),

    /// Local I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Zone not found
    #[error("Zone not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "configuration missing" error
    pub fn missing(msg: impl Into<String>) -> Self {
        Self::ConfigurationMissing(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider request error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderRequestFailed {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an export store error
    pub fn export_store(msg: impl Into<String>) -> Self {
        Self::ExportStore(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error comes from local configuration rather than a provider
    ///
    /// The binary maps these to its configuration exit code.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationMissing(_) | Self::Config(_) | Self::InvalidInput(_)
        )
    }

    /// Whether this error means the requested zone does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
