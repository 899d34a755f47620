//! Server-tier field encryption using AES-256-GCM
//!
//! Encrypts individual string fields under a deployment-wide key. Each call
//! generates a fresh random IV, so encrypting the same plaintext twice never
//! yields the same envelope. The GCM authentication tag is stored separately
//! so tampering with any part of the envelope is detected at decrypt time.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{SealError, SealResult};

/// Size of the AES-GCM IV in bytes (96 bits)
const IV_SIZE: usize = 12;

/// Size of the GCM authentication tag in bytes (128 bits)
const TAG_SIZE: usize = 16;

/// Expected length of a hex-encoded server key
const KEY_HEX_LEN: usize = 64;

/// The deployment-wide 256-bit server encryption key
///
/// Constructed only from a 64-character hex string or by random generation.
/// The backing bytes are zeroed when the key is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ServerKey([u8; 32]);

impl ServerKey {
    /// Parse a key from its 64-character hexadecimal representation
    pub fn from_hex(hex_str: &str) -> SealResult<Self> {
        if hex_str.len() != KEY_HEX_LEN {
            return Err(SealError::Validation(format!(
                "Server key must be exactly {} hexadecimal characters, got {}",
                KEY_HEX_LEN,
                hex_str.len()
            )));
        }

        let mut bytes = hex::decode(hex_str).map_err(|_| {
            SealError::Validation(format!(
                "Server key must be exactly {} hexadecimal characters",
                KEY_HEX_LEN
            ))
        })?;

        let mut key = Self([0u8; 32]);
        key.0.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(key)
    }

    /// Generate a fresh random key for provisioning a new deployment
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// Hex-encode the key for provisioning output
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get the raw key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

// Never print key material in Debug output
impl fmt::Debug for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerKey([REDACTED])")
    }
}

/// A server-tier encrypted field value
///
/// Stored as a JSON string in an ordinary text column. The field names are
/// part of the storage format and must not change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEnvelope {
    /// The encrypted payload (base64 encoded)
    pub ciphertext: String,
    /// The IV used for this encryption (base64 encoded)
    pub iv: String,
    /// The GCM authentication tag (base64 encoded)
    #[serde(rename = "authTag")]
    pub auth_tag: String,
    /// Scheme generation for future algorithm upgrades
    #[serde(default = "default_version")]
    pub version: u8,
}

fn default_version() -> u8 {
    1
}

impl ServerEnvelope {
    fn new(ciphertext: &[u8], iv: &[u8], auth_tag: &[u8]) -> Self {
        Self {
            ciphertext: STANDARD.encode(ciphertext),
            iv: STANDARD.encode(iv),
            auth_tag: STANDARD.encode(auth_tag),
            version: 1,
        }
    }

    fn decode_field(value: &str, name: &str) -> SealResult<Vec<u8>> {
        STANDARD
            .decode(value)
            .map_err(|_| SealError::Validation(format!("Invalid encrypted data: bad {} encoding", name)))
    }
}

/// Check whether a parsed JSON value has the server envelope shape
///
/// True iff the value is an object with string `ciphertext`, `iv` and
/// `authTag` fields and a numeric `version`. Used by the envelope service's
/// field classification, not by call sites directly.
pub fn is_envelope(value: &serde_json::Value) -> bool {
    value.get("ciphertext").is_some_and(|v| v.is_string())
        && value.get("iv").is_some_and(|v| v.is_string())
        && value.get("authTag").is_some_and(|v| v.is_string())
        && value.get("version").is_some_and(|v| v.is_number())
}

/// Encrypt a field value under the server key
///
/// Generates a random IV for each call; the resulting envelope is
/// non-deterministic even for identical plaintext.
pub fn encrypt(plaintext: &str, key: &ServerKey) -> SealResult<ServerEnvelope> {
    if plaintext.is_empty() {
        return Err(SealError::Validation(
            "Plaintext must not be empty".to_string(),
        ));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| SealError::Crypto(format!("Failed to create cipher: {}", e)))?;

    // Fresh random IV per call
    let mut iv_bytes = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv_bytes);
    let nonce = Nonce::from_slice(&iv_bytes);

    // aes-gcm appends the tag to the ciphertext; split it into its own field
    let mut ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| SealError::Crypto(format!("Encryption failed: {}", e)))?;
    let auth_tag = ciphertext.split_off(ciphertext.len() - TAG_SIZE);

    Ok(ServerEnvelope::new(&ciphertext, &iv_bytes, &auth_tag))
}

/// Decrypt a server envelope back to the original field value
///
/// Fails with a single generic error on a wrong key or any tampering of
/// `ciphertext`, `iv` or `authTag`; GCM rejects the payload rather than
/// returning corrupted plaintext.
pub fn decrypt(envelope: &ServerEnvelope, key: &ServerKey) -> SealResult<String> {
    if envelope.version != 1 {
        return Err(SealError::Validation(format!(
            "Unsupported encryption version: {}",
            envelope.version
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| SealError::Crypto(format!("Failed to create cipher: {}", e)))?;

    let iv_bytes = ServerEnvelope::decode_field(&envelope.iv, "iv")?;
    if iv_bytes.len() != IV_SIZE {
        return Err(SealError::Validation(format!(
            "Invalid encrypted data: expected {}-byte iv, got {}",
            IV_SIZE,
            iv_bytes.len()
        )));
    }
    let nonce = Nonce::from_slice(&iv_bytes);

    let auth_tag = ServerEnvelope::decode_field(&envelope.auth_tag, "authTag")?;
    if auth_tag.len() != TAG_SIZE {
        return Err(SealError::Validation(format!(
            "Invalid encrypted data: expected {}-byte authTag, got {}",
            TAG_SIZE,
            auth_tag.len()
        )));
    }

    let mut combined = ServerEnvelope::decode_field(&envelope.ciphertext, "ciphertext")?;
    combined.extend_from_slice(&auth_tag);

    let plaintext = cipher
        .decrypt(nonce, combined.as_ref())
        .map_err(|_| SealError::Crypto("Decryption failed: invalid key or corrupted data".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|e| SealError::Crypto(format!("Invalid UTF-8 in decrypted data: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> ServerKey {
        ServerKey::from_hex(&"ab".repeat(32)).unwrap()
    }

    fn tamper(field: &str) -> String {
        let mut bytes = STANDARD.decode(field).unwrap();
        bytes[0] ^= 0xFF;
        STANDARD.encode(&bytes)
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let key = test_key();
        let envelope = encrypt("Groceries at the corner shop", &key).unwrap();
        let decrypted = decrypt(&envelope, &key).unwrap();
        assert_eq!(decrypted, "Groceries at the corner shop");
    }

    #[test]
    fn test_different_ivs_per_call() {
        let key = test_key();
        let first = encrypt("same plaintext", &key).unwrap();
        let second = encrypt("same plaintext", &key).unwrap();

        // Random IVs make ciphertext non-deterministic
        assert_ne!(first.iv, second.iv);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn test_empty_plaintext_rejected() {
        let key = test_key();
        let err = encrypt("", &key).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_key_must_be_64_hex_chars() {
        assert!(ServerKey::from_hex("ab").unwrap_err().is_validation());
        assert!(ServerKey::from_hex(&"ab".repeat(31)).unwrap_err().is_validation());
        assert!(ServerKey::from_hex(&"zz".repeat(32)).unwrap_err().is_validation());
        assert!(ServerKey::from_hex(&format!("{}a", "ab".repeat(32)))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_generated_key_round_trips_hex() {
        let key = ServerKey::generate();
        let hex_str = key.to_hex();
        assert_eq!(hex_str.len(), 64);
        let parsed = ServerKey::from_hex(&hex_str).unwrap();
        assert_eq!(parsed.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = test_key();
        let other = ServerKey::from_hex(&"cd".repeat(32)).unwrap();

        let envelope = encrypt("sensitive notes", &key).unwrap();
        let err = decrypt(&envelope, &other).unwrap_err();
        assert!(err.is_crypto());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = test_key();
        let mut envelope = encrypt("sensitive notes", &key).unwrap();
        envelope.ciphertext = tamper(&envelope.ciphertext);
        assert!(decrypt(&envelope, &key).unwrap_err().is_crypto());
    }

    #[test]
    fn test_tampered_iv_fails() {
        let key = test_key();
        let mut envelope = encrypt("sensitive notes", &key).unwrap();
        envelope.iv = tamper(&envelope.iv);
        assert!(decrypt(&envelope, &key).unwrap_err().is_crypto());
    }

    #[test]
    fn test_tampered_auth_tag_fails() {
        let key = test_key();
        let mut envelope = encrypt("sensitive notes", &key).unwrap();
        envelope.auth_tag = tamper(&envelope.auth_tag);
        assert!(decrypt(&envelope, &key).unwrap_err().is_crypto());
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let key = test_key();
        let mut envelope = encrypt("sensitive notes", &key).unwrap();
        envelope.version = 2;
        assert!(decrypt(&envelope, &key).unwrap_err().is_validation());
    }

    #[test]
    fn test_envelope_serializes_with_wire_names() {
        let key = test_key();
        let envelope = encrypt("wire check", &key).unwrap();
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"authTag\""));
        assert!(json.contains("\"iv\""));
        assert!(json.contains("\"version\":1"));
    }

    #[test]
    fn test_is_envelope_shape_check() {
        let key = test_key();
        let envelope = encrypt("shape check", &key).unwrap();
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(is_envelope(&value));

        assert!(!is_envelope(&serde_json::json!(null)));
        assert!(!is_envelope(&serde_json::json!({})));
        assert!(!is_envelope(&serde_json::json!("plain string")));
        assert!(!is_envelope(&serde_json::json!({
            "ciphertext": "abc", "iv": "def", "authTag": "ghi", "version": "1"
        })));
        // The E2E envelope shape must never be detected as a server envelope
        assert!(!is_envelope(&serde_json::json!({
            "encrypted": "abc", "nonce": "def", "version": 1
        })));
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = test_key();
        let debug = format!("{:?}", key);
        assert!(!debug.contains("ab"));
        assert!(debug.contains("REDACTED"));
    }
}
