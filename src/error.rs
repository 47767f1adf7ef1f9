//! Error types for registry-audit
//!
//! Only failures that abort the whole run live here (registry page fetches,
//! dataset I/O, configuration problems). Per-crate failures are deliberately
//! not errors: they are converted into [`crate::types::SkipReason`] values at
//! the layer where they occur and travel through the pipeline as data, so a
//! single bad crate can never take the crawl down with it.

use thiserror::Error;

/// Result type alias for registry-audit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for registry-audit
///
/// Every variant here is fatal to the current operation: the pipeline does
/// not retry any of them.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "pipeline.max_concurrent_checks")
        key: Option<String>,
    },

    /// Registry returned a response the client could not use
    #[error("registry error: {0}")]
    Registry(String),

    /// Network error while talking to the registry listing endpoint
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset file is missing, truncated, or malformed
    #[error("dataset error: {0}")]
    Dataset(String),

    /// External tool could not be located or prepared
    #[error("external tool error: {0}")]
    ExternalTool(String),
}
