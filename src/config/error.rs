//! Error types and result aliases.
//!
//! Defines the core `GuardError` enumeration and common `Result` type.

use thiserror::Error;

/// Session guard errors.
#[derive(Debug, Error)]
pub enum GuardError {
    /// Configuration error. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Session cookie could not be sealed.
    #[error("session crypto error: {0}")]
    Crypto(String),

    /// Session could not be serialized.
    #[error("session encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Result type alias for `GuardError`.
pub type Result<T> = std::result::Result<T, GuardError>;
