//! Transparent field encryption over the server tier
//!
//! The envelope service decides per field whether to encrypt, decrypt or
//! pass through unchanged, and exposes domain-shaped wrappers built on a
//! generic field-pair helper. The E2E tier is client-only and has no
//! server-side transparent wrapper.

pub mod fields;
pub mod service;

pub use service::{EnvelopeService, StoredField};
