//! CSPRNG-backed random byte generation for nonces and salts.

use rand::RngCore;

/// Fill a fixed-size array with cryptographically secure random bytes.
///
/// Used for fresh IVs and salts on every container — IV and salt material
/// must never repeat across sessions.
#[must_use]
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::rng().fill_bytes(&mut buf);
    buf
}
