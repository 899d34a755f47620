//! Runtime configuration for the encryption subsystem
//!
//! One environment-scoped secret gates server-tier encryption. Its absence or
//! a malformed value always means "encryption disabled"; construction never
//! fails. Only individual operations that require the key will error.

use crate::crypto::ServerKey;

/// Environment variable holding the 64-hex-char server key
pub const ENCRYPTION_KEY_ENV: &str = "FIELDSEAL_ENCRYPTION_KEY";

/// Environment variable holding the default data file path
pub const DATA_FILE_ENV: &str = "FIELDSEAL_DATA_FILE";

/// Injected encryption configuration
///
/// Passed explicitly into the envelope service rather than read ad hoc from
/// process state, so the ciphers stay pure and independently testable.
#[derive(Debug, Clone, Default)]
pub struct EncryptionConfig {
    server_key: Option<ServerKey>,
}

impl EncryptionConfig {
    /// Create a configuration with an explicit key (or none)
    pub fn new(server_key: Option<ServerKey>) -> Self {
        Self { server_key }
    }

    /// Configuration with server-tier encryption disabled
    pub fn disabled() -> Self {
        Self { server_key: None }
    }

    /// Build from an optional hex-encoded key value
    ///
    /// A missing or malformed value disables encryption; it is never an
    /// error at this point.
    pub fn from_hex(value: Option<&str>) -> Self {
        let server_key = value.and_then(|v| ServerKey::from_hex(v).ok());
        Self { server_key }
    }

    /// Build from the process environment
    pub fn from_env() -> Self {
        Self::from_hex(std::env::var(ENCRYPTION_KEY_ENV).ok().as_deref())
    }

    /// Whether a validly shaped server key is configured
    pub fn is_enabled(&self) -> bool {
        self.server_key.is_some()
    }

    /// Get the configured server key, if any
    pub fn server_key(&self) -> Option<&ServerKey> {
        self.server_key.as_ref()
    }
}
