//! Cryptographic primitives for fieldseal
//!
//! Two independent tiers: server-tier AES-256-GCM keyed by a deployment-wide
//! secret, and client-tier XSalsa20-Poly1305 keyed by a passphrase-derived
//! key the server never observes. Both are pure, stateless functions over
//! their inputs.

pub mod client;
pub mod server;

pub use client::{E2eEnvelope, E2eKey};
pub use server::{ServerEnvelope, ServerKey};
