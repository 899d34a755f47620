//! Client-side end-to-end encryption primitives
//!
//! The E2E tier encrypts data before it leaves the client, under a key
//! derived from a user passphrase the server never sees. Key derivation uses
//! PBKDF2-HMAC-SHA-512 with a high fixed iteration count; the payload cipher
//! is the XSalsa20-Poly1305 secretbox construction, which authenticates and
//! encrypts in one step so the envelope needs only two fields.
//!
//! The server stores the per-user salt (not secret) and a one-way
//! verification hash of the derived key; the key itself stays in client
//! session storage via the base64 round trip on [`E2eKey`].

use base64::{engine::general_purpose::STANDARD, Engine};
use crypto_secretbox::aead::rand_core::RngCore;
use crypto_secretbox::{
    aead::{Aead, KeyInit, OsRng},
    Nonce, XSalsa20Poly1305,
};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{SealError, SealResult};

/// PBKDF2 work factor. High enough to make offline passphrase guessing
/// expensive, low enough for sub-second interactive derivation.
pub const PBKDF2_ITERATIONS: u32 = 310_000;

/// Size of the per-user salt in bytes (128 bits)
const SALT_SIZE: usize = 16;

/// Size of the secretbox nonce in bytes (192 bits)
const NONCE_SIZE: usize = 24;

/// Minimum accepted passphrase length
const MIN_PASSPHRASE_LEN: usize = 8;

/// Recovery code alphabet: 32 symbols, excluding the visually ambiguous
/// characters 0, O, I and 1
const RECOVERY_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of random bytes in a recovery code
const RECOVERY_CODE_BYTES: usize = 16;

/// A passphrase-derived 256-bit E2E key
///
/// Exists only in client memory; the backing bytes are zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct E2eKey([u8; 32]);

impl E2eKey {
    /// Get the raw key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encode the key as base64 for session-local persistence
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Decode a key previously encoded with [`E2eKey::to_base64`]
    pub fn from_base64(encoded: &str) -> SealResult<Self> {
        let mut bytes = STANDARD
            .decode(encoded)
            .map_err(|_| SealError::Validation("Key must be valid base64".to_string()))?;

        if bytes.len() != 32 {
            return Err(SealError::Validation(format!(
                "Key must be exactly 32 bytes, got {}",
                bytes.len()
            )));
        }

        let mut key = Self([0u8; 32]);
        key.0.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(key)
    }

    /// One-way verification hash of the key (base64 of the SHA-256 digest)
    ///
    /// Stored server-side so a re-entered passphrase can be checked for
    /// correctness without the key itself ever being stored or transmitted.
    pub fn verification_hash(&self) -> String {
        let digest = Sha256::digest(self.0);
        STANDARD.encode(digest)
    }
}

// Never print key material in Debug output
impl fmt::Debug for E2eKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E2eKey([REDACTED])")
    }
}

/// An E2E-tier encrypted value
///
/// Structurally disjoint from the server envelope (different field names) so
/// the two tiers can never be cross-detected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct E2eEnvelope {
    /// The authenticated ciphertext (base64 encoded)
    pub encrypted: String,
    /// The nonce used for this encryption (base64 encoded)
    pub nonce: String,
    /// Scheme generation for future algorithm upgrades
    #[serde(default = "default_version")]
    pub version: u8,
}

fn default_version() -> u8 {
    1
}

/// Check whether a parsed JSON value has the E2E envelope shape
pub fn is_envelope(value: &serde_json::Value) -> bool {
    value.get("encrypted").is_some_and(|v| v.is_string())
        && value.get("nonce").is_some_and(|v| v.is_string())
        && value.get("version").is_some_and(|v| v.is_number())
}

/// Generate a fresh random per-user salt (base64, 128 bits)
///
/// Stored alongside the user record; the salt is not secret.
pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    STANDARD.encode(salt)
}

/// Derive the E2E key from a passphrase and the user's salt
///
/// Deterministic: the same passphrase and salt always yield the same key,
/// which is what lets the user reconstitute it across sessions.
pub fn derive_key(passphrase: &str, salt: &str) -> SealResult<E2eKey> {
    if passphrase.len() < MIN_PASSPHRASE_LEN {
        return Err(SealError::Validation(format!(
            "Passphrase must be at least {} characters",
            MIN_PASSPHRASE_LEN
        )));
    }

    let salt_bytes = STANDARD
        .decode(salt)
        .map_err(|_| SealError::Validation("Salt must be valid base64".to_string()))?;

    // Derive straight into the newtype so no unzeroized copy of the key
    // lingers on the stack
    let mut key = E2eKey([0u8; 32]);
    pbkdf2_hmac::<Sha512>(
        passphrase.as_bytes(),
        &salt_bytes,
        PBKDF2_ITERATIONS,
        &mut key.0,
    );

    Ok(key)
}

/// Encrypt a value under the E2E key
///
/// Uses a fresh random 24-byte nonce per call.
pub fn encrypt(plaintext: &str, key: &E2eKey) -> SealResult<E2eEnvelope> {
    if plaintext.is_empty() {
        return Err(SealError::Validation(
            "Plaintext must not be empty".to_string(),
        ));
    }

    let cipher = XSalsa20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|e| SealError::Crypto(format!("Failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let encrypted = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| SealError::Crypto(format!("Encryption failed: {}", e)))?;

    Ok(E2eEnvelope {
        encrypted: STANDARD.encode(&encrypted),
        nonce: STANDARD.encode(nonce_bytes),
        version: 1,
    })
}

/// Decrypt an E2E envelope
///
/// Fails with a single generic error on a wrong key or any tampering; the
/// Poly1305 authenticator rejects the payload rather than silently returning
/// corrupted plaintext.
pub fn decrypt(envelope: &E2eEnvelope, key: &E2eKey) -> SealResult<String> {
    if envelope.version != 1 {
        return Err(SealError::Validation(format!(
            "Unsupported encryption version: {}",
            envelope.version
        )));
    }

    let cipher = XSalsa20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|e| SealError::Crypto(format!("Failed to create cipher: {}", e)))?;

    let nonce_bytes = STANDARD
        .decode(&envelope.nonce)
        .map_err(|_| SealError::Validation("Invalid encrypted data: bad nonce encoding".to_string()))?;
    if nonce_bytes.len() != NONCE_SIZE {
        return Err(SealError::Validation(format!(
            "Invalid encrypted data: expected {}-byte nonce, got {}",
            NONCE_SIZE,
            nonce_bytes.len()
        )));
    }
    let nonce = Nonce::from_slice(&nonce_bytes);

    let encrypted = STANDARD.decode(&envelope.encrypted).map_err(|_| {
        SealError::Validation("Invalid encrypted data: bad ciphertext encoding".to_string())
    })?;

    let plaintext = cipher
        .decrypt(nonce, encrypted.as_ref())
        .map_err(|_| SealError::Crypto("Decryption failed: invalid key or corrupted data".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|e| SealError::Crypto(format!("Invalid UTF-8 in decrypted data: {}", e)))
}

/// Generate a recovery code: 16 random symbols in 4-character blocks
///
/// Drawn from an independent random source to the key material. The code is
/// an out-of-band backup artifact; binding it to key material is the
/// caller's responsibility.
pub fn generate_recovery_code() -> String {
    let mut bytes = [0u8; RECOVERY_CODE_BYTES];
    OsRng.fill_bytes(&mut bytes);

    let symbols: Vec<char> = bytes
        .iter()
        .map(|b| RECOVERY_ALPHABET[(b % 32) as usize] as char)
        .collect();

    symbols
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
}
