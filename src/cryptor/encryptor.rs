use zeroize::Zeroizing;

use crate::cipher::CbcEncryptor;
use crate::error::CryptorError;
use crate::header::{self, IV_LEN, Mode, SALT_LEN};
use crate::primitives::{kdf, mac::HmacSha256, rng::random_bytes};

/// Streaming encryptor for the v3 container format.
///
/// The header is emitted with the first call to [`Encryptor::update`] (or by
/// [`Encryptor::finalize`] alone, for empty plaintext) rather than eagerly
/// from the constructor, so a caller that never writes anything still gets
/// exactly one well-formed container out of `finalize`.
///
/// Because [`Encryptor::finalize`] consumes `self`, calling `update` after
/// `finalize` is a compile error rather than a runtime state to check for —
/// an "already finalized" error kind simply cannot arise here.
pub struct Encryptor {
    cipher: CbcEncryptor,
    hmac: HmacSha256,
    pending_header: Option<Vec<u8>>,
}

impl Encryptor {
    /// Start a password-mode container: fresh encryption/HMAC salts and IV
    /// are generated, and both keys are derived via PBKDF2 — every container
    /// gets unique salts and IV.
    #[must_use]
    pub fn with_password(password: &str) -> Self {
        let encryption_salt = random_bytes::<SALT_LEN>();
        let hmac_salt = random_bytes::<SALT_LEN>();
        let iv = random_bytes::<IV_LEN>();

        let encryption_key = kdf::derive_key(password.as_bytes(), &encryption_salt);
        let hmac_key = kdf::derive_key(password.as_bytes(), &hmac_salt);
        let header_bytes = header::serialize(Mode::Password, Some((encryption_salt, hmac_salt)), iv);

        Self::new(&encryption_key, &hmac_key, iv, header_bytes)
    }

    /// Start a key-mode container from caller-supplied 32-byte keys. A fresh
    /// IV is still generated per container.
    #[must_use]
    pub fn with_keys(encryption_key: [u8; 32], hmac_key: [u8; 32]) -> Self {
        let iv = random_bytes::<IV_LEN>();
        let header_bytes = header::serialize(Mode::Key, None, iv);
        Self::new(&encryption_key, &hmac_key, iv, header_bytes)
    }

    fn new(encryption_key: &[u8; 32], hmac_key: &[u8; 32], iv: [u8; IV_LEN], header_bytes: Vec<u8>) -> Self {
        let mut hmac = HmacSha256::new(hmac_key);
        // HMAC authenticates the header too, not just the ciphertext —
        // a tampered options byte or salt must fail verification.
        hmac.update(&header_bytes);
        Self {
            cipher: CbcEncryptor::new(encryption_key, &iv),
            hmac,
            pending_header: Some(header_bytes),
        }
    }

    /// Encrypt another chunk of plaintext, returning bytes ready to write to
    /// the container (possibly prefixed by the header, on the first call).
    pub fn update(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, CryptorError> {
        let mut out = self.pending_header.take().unwrap_or_default();
        let ciphertext = self.cipher.update(plaintext);
        self.hmac.update(&ciphertext);
        out.extend(ciphertext);
        Ok(out)
    }

    /// Apply PKCS#7 padding to any buffered plaintext, encrypt the final
    /// block(s), and append the HMAC trailer that authenticates the whole
    /// container.
    pub fn finalize(mut self) -> Result<Vec<u8>, CryptorError> {
        let mut out = self.pending_header.take().unwrap_or_default();
        let ciphertext = self.cipher.finalize();
        self.hmac.update(&ciphertext);
        out.extend(ciphertext);

        let tag: Zeroizing<[u8; 32]> = Zeroizing::new(self.hmac.finalize());
        out.extend_from_slice(&*tag);
        Ok(out)
    }
}
