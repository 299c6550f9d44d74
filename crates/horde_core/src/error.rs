//! Error types for the AI core.
//!
//! Only setup and tooling paths return errors. Runtime outcomes such as a
//! denied attack token or a vanished target are plain data.

use thiserror::Error;

/// Result type alias using [`AiError`].
pub type Result<T> = std::result::Result<T, AiError>;

/// Top-level error type for the AI core.
#[derive(Debug, Error)]
pub enum AiError {
    /// Configuration rejected at construction time.
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfig {
        /// Offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(u64),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Replay could not be read or written.
    #[error("Replay error: {0}")]
    ReplayError(String),

    /// Replay produced a different final state than recorded.
    #[error("Replay mismatch at tick {tick}: expected hash {expected}, got {actual}")]
    ReplayMismatch {
        /// Tick at which the hashes were compared.
        tick: u64,
        /// Hash stored in the replay.
        expected: u64,
        /// Hash produced by re-running.
        actual: u64,
    },
}

impl AiError {
    /// Shorthand for an [`AiError::InvalidConfig`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
