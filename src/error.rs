//! Custom error types for fieldseal
//!
//! This module defines the error hierarchy for the encryption subsystem using
//! thiserror for ergonomic error definitions.

use thiserror::Error;

/// The main error type for fieldseal operations
#[derive(Error, Debug)]
pub enum SealError {
    /// Validation errors: empty plaintext, malformed keys, short passphrases.
    /// These carry specific messages because they reveal no secret information.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication/integrity failures. Always a single generic message
    /// regardless of which envelope field was corrupted or why the key was
    /// wrong, so decryption never acts as an oracle.
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Configuration errors, e.g. decrypting an envelope with no key set
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage errors from the record store
    #[error("Storage error: {0}")]
    Storage(String),

    /// Migration run failures
    #[error("Migration error: {0}")]
    Migration(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl SealError {
    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is an authentication/integrity error
    pub fn is_crypto(&self) -> bool {
        matches!(self, Self::Crypto(_))
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for SealError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SealError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for fieldseal operations
pub type SealResult<T> = Result<T, SealError>;
