//! Thin, uniform wrappers around the cryptographic primitives the streaming
//! engine composes: PBKDF2-HMAC-SHA1 key derivation, incremental
//! HMAC-SHA256, and CSPRNG-backed random byte generation.
//!
//! AES-256-CBC lives in [`crate::cipher`] rather than here, since its
//! incremental block-buffering behavior is part of the engine's core
//! difficulty, not a thin pass-through.

pub mod kdf;
pub mod mac;
pub mod rng;

pub use kdf::derive_pbkdf2_sha1;
pub use mac::HmacSha256;
pub use rng::random_bytes;
