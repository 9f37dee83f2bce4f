//! PBKDF2 key derivation, deriving key material directly into a fixed-size
//! [`zeroize::Zeroizing`] buffer so it never sits unprotected in an
//! intermediate `Vec`.

use std::num::NonZeroU32;

use zeroize::Zeroizing;

/// Number of PBKDF2 rounds used by the v3 container format for both the
/// encryption-key and HMAC-key derivations.
pub const ROUNDS: u32 = 10_000;

/// Output length, in bytes, of each derived key.
pub const KEY_LEN: usize = 32;

/// Derive a 32-byte key from `password` and `salt` using PBKDF2-HMAC-SHA1.
///
/// The v3 format invokes this twice per password-mode session — once per
/// salt — always with [`ROUNDS`] iterations, before any plaintext or
/// ciphertext is processed.
#[must_use]
pub fn derive_pbkdf2_sha1(password: &[u8], salt: &[u8], rounds: u32, out_len: usize) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(vec![0u8; out_len]);
    let iterations = NonZeroU32::new(rounds).expect("PBKDF2 round count must be nonzero");
    ring::pbkdf2::derive(
        ring::pbkdf2::PBKDF2_HMAC_SHA1,
        iterations,
        salt,
        password,
        &mut out,
    );
    out
}

/// Derive the fixed-size 32-byte key used directly by the streaming engine.
#[must_use]
pub fn derive_key(password: &[u8], salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let derived = derive_pbkdf2_sha1(password, salt, ROUNDS, KEY_LEN);
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&derived);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_key_is_deterministic() {
        let a = derive_key(b"hunter2", b"saltsalt");
        let b = derive_key(b"hunter2", b"saltsalt");
        assert_eq!(*a, *b);
    }

    #[test]
    fn derive_key_differs_by_salt() {
        let a = derive_key(b"hunter2", b"salt-one");
        let b = derive_key(b"hunter2", b"salt-two");
        assert_ne!(*a, *b);
    }
}
