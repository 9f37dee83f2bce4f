//! A streaming implementation of the RNCryptor v3 container format:
//! AES-256-CBC encryption with PKCS#7 padding, authenticated
//! encrypt-then-MAC with HMAC-SHA256, and PBKDF2-derived keys for
//! password-based containers.
//!
//! Both the one-shot functions ([`encrypt`], [`decrypt`], and their
//! `_with_keys` counterparts) and the incremental [`Encryptor`]/[`Decryptor`]
//! types operate on the same wire format and interoperate freely — a
//! container produced by [`encrypt`] can be consumed chunk-by-chunk through
//! [`Decryptor::update`], and vice versa.
//!
//! ```
//! let container = rncryptor::encrypt(b"attack at dawn", "correct horse battery staple").unwrap();
//! let plaintext = rncryptor::decrypt(&container, "correct horse battery staple").unwrap();
//! assert_eq!(plaintext, b"attack at dawn");
//! ```

pub mod cipher;
pub mod cryptor;
pub mod error;
pub mod header;
pub mod primitives;
pub mod trailer;

use std::io::{Read, Write};

use tracing::instrument;

pub use cryptor::{Decryptor, Encryptor};
pub use error::CryptorError;

/// Buffer size used by [`encrypt_reader_to_writer`] and
/// [`decrypt_reader_to_writer`] when pulling chunks from a reader.
const STREAM_BUFFER_LEN: usize = 64 * 1024;

/// Encrypt `plaintext` under `password` in a single call, returning a
/// complete v3 container.
#[instrument(level = "debug", skip(plaintext, password), fields(plaintext_len = plaintext.len()))]
pub fn encrypt(plaintext: &[u8], password: &str) -> Result<Vec<u8>, CryptorError> {
    let mut cryptor = Encryptor::with_password(password);
    let mut out = cryptor.update(plaintext)?;
    out.extend(cryptor.finalize()?);
    Ok(out)
}

/// Decrypt a complete v3 `container` under `password` in a single call.
#[instrument(level = "debug", skip(container, password), fields(container_len = container.len()))]
pub fn decrypt(container: &[u8], password: &str) -> Result<Vec<u8>, CryptorError> {
    let mut cryptor = Decryptor::with_password(password);
    cryptor.update(container)?;
    cryptor.finalize()
}

/// Encrypt `plaintext` in key mode under caller-supplied 32-byte keys.
#[instrument(level = "debug", skip_all, fields(plaintext_len = plaintext.len()))]
pub fn encrypt_with_keys(
    plaintext: &[u8],
    encryption_key: &[u8; 32],
    hmac_key: &[u8; 32],
) -> Result<Vec<u8>, CryptorError> {
    let mut cryptor = Encryptor::with_keys(*encryption_key, *hmac_key);
    let mut out = cryptor.update(plaintext)?;
    out.extend(cryptor.finalize()?);
    Ok(out)
}

/// Decrypt a complete v3 `container` in key mode under caller-supplied
/// 32-byte keys.
#[instrument(level = "debug", skip_all, fields(container_len = container.len()))]
pub fn decrypt_with_keys(
    container: &[u8],
    encryption_key: &[u8; 32],
    hmac_key: &[u8; 32],
) -> Result<Vec<u8>, CryptorError> {
    let mut cryptor = Decryptor::with_keys(*encryption_key, *hmac_key);
    cryptor.update(container)?;
    cryptor.finalize()
}

/// Stream-encrypt everything remaining in `reader` under `password`,
/// writing the container to `writer` as it's produced rather than
/// buffering the whole plaintext in memory.
///
/// A trivial adapter over [`Encryptor`] — file/stream glue is outside the
/// core engine's concerns, but the crate should still offer a complete
/// synchronous I/O story without forcing callers to hand-roll the chunking
/// loop themselves.
#[instrument(level = "debug", skip_all)]
pub fn encrypt_reader_to_writer(
    reader: &mut impl Read,
    writer: &mut impl Write,
    password: &str,
) -> Result<(), CryptorError> {
    let mut cryptor = Encryptor::with_password(password);
    let mut buf = [0u8; STREAM_BUFFER_LEN];
    loop {
        let read = reader
            .read(&mut buf)
            .map_err(|e| CryptorError::Internal(e.to_string()))?;
        if read == 0 {
            break;
        }
        let chunk = cryptor.update(&buf[..read])?;
        writer
            .write_all(&chunk)
            .map_err(|e| CryptorError::Internal(e.to_string()))?;
    }
    let tail = cryptor.finalize()?;
    writer
        .write_all(&tail)
        .map_err(|e| CryptorError::Internal(e.to_string()))
}

/// Stream-decrypt everything remaining in `reader` under `password`,
/// writing verified plaintext to `writer` only after the trailing HMAC has
/// been checked (see [`Decryptor`] for the buffered-until-finalize
/// contract this preserves even when driven over a file).
#[instrument(level = "debug", skip_all)]
pub fn decrypt_reader_to_writer(
    reader: &mut impl Read,
    writer: &mut impl Write,
    password: &str,
) -> Result<(), CryptorError> {
    let mut cryptor = Decryptor::with_password(password);
    let mut buf = [0u8; STREAM_BUFFER_LEN];
    loop {
        let read = reader
            .read(&mut buf)
            .map_err(|e| CryptorError::Internal(e.to_string()))?;
        if read == 0 {
            break;
        }
        cryptor.update(&buf[..read])?;
    }
    let plaintext = cryptor.finalize()?;
    writer
        .write_all(&plaintext)
        .map_err(|e| CryptorError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_mode_one_shot_roundtrips() {
        let container = encrypt(b"attack at dawn", "correct horse battery staple").unwrap();
        assert_eq!(decrypt(&container, "correct horse battery staple").unwrap(), b"attack at dawn");
    }

    #[test]
    fn key_mode_one_shot_roundtrips() {
        let encryption_key = [0xAAu8; 32];
        let hmac_key = [0xBBu8; 32];
        let container = encrypt_with_keys(b"attack at dawn", &encryption_key, &hmac_key).unwrap();
        assert_eq!(
            decrypt_with_keys(&container, &encryption_key, &hmac_key).unwrap(),
            b"attack at dawn"
        );
    }

    #[test]
    fn wrong_password_one_shot_fails() {
        let container = encrypt(b"attack at dawn", "correct horse battery staple").unwrap();
        assert!(decrypt(&container, "wrong password").is_err());
    }
}
