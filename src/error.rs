//! Error types for the RNCryptor v3 streaming engine.
//!
//! # Security Classification
//!
//! [`CryptorError::HmacMismatch`] is deliberately the single outcome for every
//! form of ciphertext tampering, truncation, or padding corruption detected
//! during decryption. Distinguishing "bad padding" from "bad MAC" to a caller
//! would open a padding-oracle side channel; this crate collapses both into
//! one variant by design.

use thiserror::Error;

/// Errors produced by [`crate::Encryptor`] and [`crate::Decryptor`].
///
/// All four variants are fatal: once returned, the cryptor that produced it
/// has latched into a failed state and will return the same error on any
/// further `update` call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptorError {
    /// The container's version or options byte could not be recognized.
    ///
    /// This is only returned for a header that is structurally present but
    /// invalid (wrong version byte, reserved option bits set). A header that
    /// is merely incomplete is not an error — `update` returns and waits for
    /// more bytes.
    #[error("unrecognized container header: {reason}")]
    UnknownHeader { reason: String },

    /// HMAC verification failed, or the container was truncated, or the
    /// final block's PKCS#7 padding was invalid.
    ///
    /// **[INTEGRITY VIOLATION]** All three causes are reported identically
    /// to avoid giving an attacker a padding-oracle signal.
    #[error(
        "HMAC verification failed — wrong password/keys, corrupted data, or truncated container"
    )]
    HmacMismatch,

    /// A caller-supplied parameter was invalid: a raw key of the wrong
    /// length, or a decryptor constructed in the wrong mode for the
    /// container it was asked to read.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A primitive adapter (AES, HMAC, PBKDF2, CSPRNG) failed in a way that
    /// should be impossible given valid inputs.
    #[error("internal cryptographic primitive error: {0}")]
    Internal(String),
}
