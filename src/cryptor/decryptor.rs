use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::cipher::CbcDecryptor;
use crate::error::CryptorError;
use crate::header::{self, ParsedHeader};
use crate::primitives::{kdf, mac::HmacSha256};
use crate::trailer::TrailerTracker;

/// Where this decryptor's keys come from, fixed at construction and matched
/// against the container's own mode byte once the header is parsed.
enum Source {
    Password(Zeroizing<String>),
    Keys {
        encryption_key: Zeroizing<[u8; 32]>,
        hmac_key: Zeroizing<[u8; 32]>,
    },
}

enum DecState {
    AwaitingHeader { header_buf: Vec<u8> },
    Decrypting {
        cipher: CbcDecryptor,
        hmac: HmacSha256,
        trailer: TrailerTracker,
        plaintext: Zeroizing<Vec<u8>>,
    },
    /// A hard failure (bad header, mode mismatch) has already been reported;
    /// any further call returns the same error rather than panicking on a
    /// state it doesn't recognize.
    Failed(CryptorError),
}

/// Streaming decryptor for the v3 container format.
///
/// Plaintext is never released before the HMAC trailer has been verified:
/// [`Decryptor::update`] always returns an empty `Vec`, buffering
/// verified-pending plaintext internally, and [`Decryptor::finalize`]
/// returns the complete plaintext only after the constant-time MAC
/// comparison succeeds. A weaker contract that streams plaintext during
/// `update` and relies on the caller to discard it on failure was
/// considered and rejected in favor of this stricter one.
pub struct Decryptor {
    source: Source,
    state: DecState,
}

impl Decryptor {
    #[must_use]
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            source: Source::Password(Zeroizing::new(password.into())),
            state: DecState::AwaitingHeader { header_buf: Vec::new() },
        }
    }

    #[must_use]
    pub fn with_keys(encryption_key: [u8; 32], hmac_key: [u8; 32]) -> Self {
        Self {
            source: Source::Keys {
                encryption_key: Zeroizing::new(encryption_key),
                hmac_key: Zeroizing::new(hmac_key),
            },
            state: DecState::AwaitingHeader { header_buf: Vec::new() },
        }
    }

    /// Feed another chunk of container bytes. Always returns an empty
    /// `Vec` on success — see the buffered-until-finalize contract above.
    pub fn update(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CryptorError> {
        if let DecState::Failed(e) = &self.state {
            return Err(e.clone());
        }

        let transition = if let DecState::AwaitingHeader { header_buf } = &mut self.state {
            header_buf.extend_from_slice(chunk);
            match header::parse(header_buf) {
                Ok(None) => None,
                Err(e) => {
                    let err = CryptorError::UnknownHeader { reason: e.to_string() };
                    self.state = DecState::Failed(err.clone());
                    return Err(err);
                }
                Ok(Some(parsed)) => {
                    let header_prefix = header_buf[..parsed.consumed].to_vec();
                    let leftover = header_buf[parsed.consumed..].to_vec();
                    Some((parsed, header_prefix, leftover))
                }
            }
        } else {
            None
        };

        let Some((parsed, header_prefix, leftover)) = transition else {
            return self.feed_decrypting(chunk);
        };

        match self.enter_decrypting(&parsed, &header_prefix) {
            Ok(state) => self.state = state,
            Err(e) => {
                self.state = DecState::Failed(e.clone());
                return Err(e);
            }
        }
        self.feed_decrypting(&leftover)
    }

    /// Build the `Decrypting` state from a just-parsed header, deriving or
    /// selecting keys and rejecting a header whose mode doesn't match how
    /// this decryptor was constructed.
    fn enter_decrypting(&self, parsed: &ParsedHeader, header_prefix: &[u8]) -> Result<DecState, CryptorError> {
        let (encryption_key, hmac_key): (Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>) = match (&self.source, parsed.mode) {
            (Source::Password(password), header::Mode::Password) => {
                let encryption_salt = parsed
                    .encryption_salt
                    .expect("password-mode header always carries an encryption salt");
                let hmac_salt = parsed.hmac_salt.expect("password-mode header always carries an HMAC salt");
                (
                    kdf::derive_key(password.as_bytes(), &encryption_salt),
                    kdf::derive_key(password.as_bytes(), &hmac_salt),
                )
            }
            (Source::Keys { encryption_key, hmac_key }, header::Mode::Key) => {
                (Zeroizing::new(**encryption_key), Zeroizing::new(**hmac_key))
            }
            (Source::Password(_), header::Mode::Key) => {
                return Err(CryptorError::InvalidParameter(
                    "decryptor was constructed with a password but the container is key-mode".into(),
                ));
            }
            (Source::Keys { .. }, header::Mode::Password) => {
                return Err(CryptorError::InvalidParameter(
                    "decryptor was constructed with raw keys but the container is password-mode".into(),
                ));
            }
        };

        let mut hmac = HmacSha256::new(&hmac_key);
        hmac.update(header_prefix);

        Ok(DecState::Decrypting {
            cipher: CbcDecryptor::new(&encryption_key, &parsed.iv),
            hmac,
            trailer: TrailerTracker::new(),
            plaintext: Zeroizing::new(Vec::new()),
        })
    }

    fn feed_decrypting(&mut self, data: &[u8]) -> Result<Vec<u8>, CryptorError> {
        match &mut self.state {
            DecState::Decrypting { cipher, hmac, trailer, plaintext } => {
                let released = trailer.push(data);
                hmac.update(&released);
                plaintext.extend(cipher.update(&released).iter().copied());
                Ok(Vec::new())
            }
            DecState::AwaitingHeader { .. } => Ok(Vec::new()),
            DecState::Failed(e) => Err(e.clone()),
        }
    }

    /// Verify the HMAC trailer in constant time and, only on success,
    /// return the fully decrypted and unpadded plaintext.
    pub fn finalize(self) -> Result<Vec<u8>, CryptorError> {
        let (cipher, hmac, trailer, mut plaintext) = match self.state {
            DecState::Decrypting { cipher, hmac, trailer, plaintext } => (cipher, hmac, trailer, plaintext),
            DecState::Failed(e) => return Err(e),
            DecState::AwaitingHeader { .. } => return Err(CryptorError::HmacMismatch),
        };

        let expected_tag = trailer.take().ok_or(CryptorError::HmacMismatch)?;
        let actual_tag = hmac.finalize();
        if !bool::from(actual_tag.ct_eq(&expected_tag)) {
            return Err(CryptorError::HmacMismatch);
        }

        let tail = cipher.finalize().map_err(|_| CryptorError::HmacMismatch)?;
        plaintext.extend(tail.iter().copied());
        Ok(std::mem::take(&mut *plaintext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cryptor::Encryptor;

    fn encrypt_with_password(password: &str, plaintext: &[u8]) -> Vec<u8> {
        let mut enc = Encryptor::with_password(password);
        let mut out = enc.update(plaintext).unwrap();
        out.extend(enc.finalize().unwrap());
        out
    }

    #[test]
    fn roundtrips_with_correct_password() {
        let container = encrypt_with_password("hunter2", b"the quick brown fox");
        let mut dec = Decryptor::with_password("hunter2");
        dec.update(&container).unwrap();
        assert_eq!(dec.finalize().unwrap(), b"the quick brown fox");
    }

    #[test]
    fn update_never_releases_plaintext_early() {
        let container = encrypt_with_password("hunter2", b"some secret payload");
        let mut dec = Decryptor::with_password("hunter2");
        for byte in &container {
            let released = dec.update(std::slice::from_ref(byte)).unwrap();
            assert!(released.is_empty());
        }
    }

    #[test]
    fn wrong_password_fails_at_finalize() {
        let container = encrypt_with_password("hunter2", b"the quick brown fox");
        let mut dec = Decryptor::with_password("not the password");
        dec.update(&container).unwrap();
        assert_eq!(dec.finalize(), Err(CryptorError::HmacMismatch));
    }

    #[test]
    fn tampered_ciphertext_byte_fails_at_finalize() {
        let mut container = encrypt_with_password("hunter2", b"the quick brown fox, jumping");
        let mid = container.len() / 2;
        container[mid] ^= 0x01;

        let mut dec = Decryptor::with_password("hunter2");
        dec.update(&container).unwrap();
        assert_eq!(dec.finalize(), Err(CryptorError::HmacMismatch));
    }

    #[test]
    fn truncated_container_fails() {
        let mut container = encrypt_with_password("hunter2", b"the quick brown fox");
        container.truncate(container.len() - 1);

        let mut dec = Decryptor::with_password("hunter2");
        dec.update(&container).unwrap();
        assert_eq!(dec.finalize(), Err(CryptorError::HmacMismatch));
    }

    #[test]
    fn arbitrary_chunking_matches_single_shot() {
        let container = encrypt_with_password("hunter2", &(0..500u32).map(|i| (i % 256) as u8).collect::<Vec<_>>());

        let mut dec = Decryptor::with_password("hunter2");
        for chunk in container.chunks(13) {
            dec.update(chunk).unwrap();
        }
        let plaintext = dec.finalize().unwrap();
        assert_eq!(plaintext, (0..500u32).map(|i| (i % 256) as u8).collect::<Vec<_>>());
    }

    #[test]
    fn key_mode_roundtrips_and_rejects_password_decryptor() {
        let encryption_key = [0x42u8; 32];
        let hmac_key = [0x24u8; 32];
        let mut enc = Encryptor::with_keys(encryption_key, hmac_key);
        let mut container = enc.update(b"payload").unwrap();
        container.extend(enc.finalize().unwrap());

        let mut dec = Decryptor::with_keys(encryption_key, hmac_key);
        dec.update(&container).unwrap();
        assert_eq!(dec.finalize().unwrap(), b"payload");

        let mut wrong_mode = Decryptor::with_password("hunter2");
        assert!(matches!(
            wrong_mode.update(&container),
            Err(CryptorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn unknown_version_is_rejected_immediately() {
        let mut dec = Decryptor::with_password("hunter2");
        let err = dec.update(&[0x02, 0x01]).unwrap_err();
        assert!(matches!(err, CryptorError::UnknownHeader { .. }));
    }

    #[test]
    fn errors_latch_and_repeat_on_further_calls() {
        let mut dec = Decryptor::with_password("hunter2");
        let first = dec.update(&[0x02, 0x01]).unwrap_err();
        let second = dec.update(b"more bytes").unwrap_err();
        assert_eq!(first, second);
        assert_eq!(dec.finalize().unwrap_err(), first);
    }
}
