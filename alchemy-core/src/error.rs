//! Error types for the combination engine.
//!
//! Uses thiserror for ergonomic error definition. Store and generator
//! failures have their own enums and fold into [`AlchemyError`].

use crate::id::ElementId;
use std::time::Duration;

/// Main error type surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum AlchemyError {
    /// Malformed or missing ids. No I/O was performed.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The id does not exist in the store. Nothing was mutated.
    #[error("Unknown element: {0}")]
    UnknownElement(ElementId),

    /// The generator failed or timed out. Nothing was mutated; callers may retry.
    #[error("Generation failed: {0}")]
    GenerationFailed(#[from] GeneratorError),

    /// The durable store could not be reached or read.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The engine could not be constructed from its configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AlchemyError {
    /// Whether the caller sent something wrong (as opposed to a server fault).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AlchemyError::InvalidInput { .. } | AlchemyError::UnknownElement(_)
        )
    }

    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AlchemyError::GenerationFailed(_))
    }
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be reached
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot written by an incompatible version
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// Snapshot violates a uniqueness constraint
    #[error("Corrupt store: {reason}")]
    Corrupt { reason: String },
}

/// Element generator errors
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AlchemyError>;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for generator operations
pub type GeneratorResult<T> = std::result::Result<T, GeneratorError>;
