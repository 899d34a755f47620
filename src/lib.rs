//! fieldseal - transparent field-level encryption for financial records
//!
//! This library protects sensitive text fields (descriptions, notes, account
//! numbers) in a financial record-keeping application. It provides two
//! independently operable encryption tiers plus a transparent wrapper that
//! lets the rest of the application read and write domain objects without
//! knowing whether encryption is active.
//!
//! # Architecture
//!
//! - `crypto::server`: AES-256-GCM field cipher keyed by a deployment-wide
//!   secret
//! - `crypto::client`: end-to-end cipher keyed by a passphrase-derived key
//!   the server never sees
//! - `envelope`: per-field envelope detection and transparent encrypt/decrypt
//! - `migrate`: batch engine that retrofits encryption onto legacy plaintext
//! - `config`: injected key configuration
//! - `cli`: handlers for the migration binary
//!
//! # Example
//!
//! ```rust
//! use fieldseal::config::EncryptionConfig;
//! use fieldseal::envelope::EnvelopeService;
//!
//! let service = EnvelopeService::new(EncryptionConfig::disabled());
//! // With no key configured, values pass through unchanged
//! assert_eq!(service.encrypt_value("lunch").unwrap(), "lunch");
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod migrate;
pub mod models;

pub use error::{SealError, SealResult};
