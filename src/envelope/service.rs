//! Transparent field encryption service
//!
//! Sits between domain code and the server-tier cipher. When no server key is
//! configured every operation degrades to the identity function, so call
//! sites never branch on whether encryption is active. Stored values are
//! self-describing: classifying a field needs nothing beyond its own shape.

use serde::Deserialize;

use crate::config::EncryptionConfig;
use crate::crypto::server::{self, ServerEnvelope};
use crate::error::{SealError, SealResult};

/// Classification of a stored field value
///
/// A total parse: every string maps to exactly one variant. Only
/// [`StoredField::Envelope`] is treated as ciphertext; the other two are the
/// backward-compatibility path for legacy plaintext and for field content
/// that happens to be JSON without being an envelope.
#[derive(Debug, Clone)]
pub enum StoredField {
    /// A well-formed server envelope
    Envelope(ServerEnvelope),
    /// Valid JSON that is not an envelope; passes through as plaintext
    OtherJson,
    /// Not JSON at all; legacy plaintext
    Plaintext,
}

impl StoredField {
    /// Classify a raw stored string
    pub fn parse(raw: &str) -> Self {
        let value = match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value) => value,
            Err(_) => return Self::Plaintext,
        };

        if !server::is_envelope(&value) {
            return Self::OtherJson;
        }

        match ServerEnvelope::deserialize(value) {
            Ok(envelope) => Self::Envelope(envelope),
            Err(_) => Self::OtherJson,
        }
    }

    /// Whether this field holds server-tier ciphertext
    pub fn is_envelope(&self) -> bool {
        matches!(self, Self::Envelope(_))
    }
}

/// The transparent encryption service for server-tier fields
#[derive(Debug, Clone)]
pub struct EnvelopeService {
    config: EncryptionConfig,
}

impl EnvelopeService {
    /// Create a service with an injected configuration
    pub fn new(config: EncryptionConfig) -> Self {
        Self { config }
    }

    /// Create a service configured from the process environment
    pub fn from_env() -> Self {
        Self::new(EncryptionConfig::from_env())
    }

    /// Whether server-tier encryption is active
    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// Encrypt a value, or pass it through unchanged when disabled
    ///
    /// The encrypted form is the envelope serialized to a JSON string, so the
    /// storage column type stays textual.
    pub fn encrypt_value(&self, plaintext: &str) -> SealResult<String> {
        match self.config.server_key() {
            None => Ok(plaintext.to_string()),
            Some(key) => {
                let envelope = server::encrypt(plaintext, key)?;
                serde_json::to_string(&envelope)
                    .map_err(|e| SealError::Json(format!("Failed to serialize envelope: {}", e)))
            }
        }
    }

    /// Decrypt a stored value, or pass it through unchanged
    ///
    /// Plaintext and non-envelope JSON always pass through. An envelope with
    /// no key configured is a loud configuration error; silently returning
    /// ciphertext-bearing structure as if it were plaintext would be worse.
    pub fn decrypt_value(&self, value: &str) -> SealResult<String> {
        match StoredField::parse(value) {
            StoredField::Envelope(envelope) => match self.config.server_key() {
                Some(key) => server::decrypt(&envelope, key),
                None => Err(SealError::Config(
                    "Cannot decrypt: no encryption key configured".to_string(),
                )),
            },
            StoredField::OtherJson | StoredField::Plaintext => Ok(value.to_string()),
        }
    }

    /// Encrypt an optional field in place of its storage slot
    ///
    /// `None` is never wrapped; an empty string has nothing to protect and
    /// passes through, keeping the encrypt side total for well-formed input.
    pub fn encrypt_field(&self, value: Option<&str>) -> SealResult<Option<String>> {
        match value {
            None => Ok(None),
            Some("") => Ok(Some(String::new())),
            Some(plaintext) => Ok(Some(self.encrypt_value(plaintext)?)),
        }
    }

    /// Decrypt an optional stored field value
    ///
    /// The field-level helper behind all domain wrappers. `None` passes
    /// through; anything that does not classify as an envelope is returned
    /// unchanged. Cryptographic failures on real envelopes still propagate.
    pub fn decrypt_field(&self, value: Option<&str>) -> SealResult<Option<String>> {
        match value {
            None => Ok(None),
            Some(raw) => Ok(Some(self.decrypt_value(raw)?)),
        }
    }

    /// Map a per-item decrypt function over a collection
    ///
    /// Preserves order and length; fails on the first item that fails.
    pub fn decrypt_records<T, F>(&self, items: &[T], decrypt_fn: F) -> SealResult<Vec<T>>
    where
        F: Fn(&Self, &T) -> SealResult<T>,
    {
        items.iter().map(|item| decrypt_fn(self, item)).collect()
    }
}
