//! AES-256-CBC with PKCS#7 padding, driven incrementally.
//!
//! This is where the engine's core difficulty lives: the public RustCrypto
//! `cbc` crate only exposes whole-buffer padded encryption, so an
//! incremental engine has to hold the chaining cipher's low-level
//! `BlockEncryptMut`/`BlockDecryptMut` traits directly and manage its own
//! partial-block buffer across `update` calls. On decrypt, the last
//! complete ciphertext block is held back until `finalize`, since only then
//! is it known which trailing bytes are PKCS#7 padding rather than
//! plaintext — output lags one block behind ciphertext consumption.

use aes::Aes256;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, generic_array::GenericArray};
use thiserror::Error;
use zeroize::Zeroizing;

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

type Block = GenericArray<u8, cbc::cipher::consts::U16>;
type CbcEnc = cbc::Encryptor<Aes256>;
type CbcDec = cbc::Decryptor<Aes256>;

/// Failures specific to the block-cipher engine. Both variants are folded
/// into [`crate::CryptorError::HmacMismatch`] by the caller: a decryptor
/// must never distinguish "bad padding" from "bad MAC" to avoid a
/// padding-oracle side channel.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherError {
    /// `finalize` was reached with a ciphertext buffer that is not exactly
    /// one block — the container was truncated mid-block.
    #[error("ciphertext was not a whole number of blocks")]
    InvalidLength,
    /// The final decrypted block's PKCS#7 padding was not well-formed.
    #[error("invalid PKCS#7 padding")]
    InvalidPadding,
}

/// Incremental AES-256-CBC encryptor with PKCS#7 padding applied on
/// `finalize`.
pub struct CbcEncryptor {
    inner: CbcEnc,
    /// Plaintext not yet encrypted: the partial-block remainder across
    /// `update` calls, and the PKCS#7-padded remainder during `finalize`.
    buffer: Zeroizing<Vec<u8>>,
}

impl CbcEncryptor {
    #[must_use]
    pub fn new(key: &[u8; 32], iv: &[u8; 16]) -> Self {
        Self {
            inner: CbcEnc::new(key.into(), iv.into()),
            buffer: Zeroizing::new(Vec::with_capacity(BLOCK_LEN)),
        }
    }

    /// Encrypt as many whole blocks as `input` completes, buffering any
    /// remainder for the next call.
    pub fn update(&mut self, input: &[u8]) -> Vec<u8> {
        self.buffer.extend_from_slice(input);
        let whole_len = (self.buffer.len() / BLOCK_LEN) * BLOCK_LEN;

        let mut out = Vec::with_capacity(whole_len);
        for chunk in self.buffer[..whole_len].chunks_exact(BLOCK_LEN) {
            let mut block: Block = Block::clone_from_slice(chunk);
            self.inner.encrypt_block_mut(&mut block);
            out.extend_from_slice(&block);
        }
        self.buffer.drain(..whole_len);
        out
    }

    /// Pad the remaining buffer with PKCS#7 and encrypt the final block(s).
    /// PKCS#7 always adds at least one byte, so this always emits at least
    /// one block, even for empty plaintext.
    #[must_use]
    pub fn finalize(mut self) -> Vec<u8> {
        let pad_len = BLOCK_LEN - (self.buffer.len() % BLOCK_LEN);
        #[allow(clippy::cast_possible_truncation)]
        self.buffer.resize(self.buffer.len() + pad_len, pad_len as u8);

        let mut out = Vec::with_capacity(self.buffer.len());
        for chunk in self.buffer.chunks_exact(BLOCK_LEN) {
            let mut block: Block = Block::clone_from_slice(chunk);
            self.inner.encrypt_block_mut(&mut block);
            out.extend_from_slice(&block);
        }
        out
    }
}

/// Incremental AES-256-CBC decryptor that strips PKCS#7 padding on
/// `finalize`.
pub struct CbcDecryptor {
    inner: CbcDec,
    /// Ciphertext not yet decrypted, always holding back the final complete
    /// block until `finalize` can strip its padding.
    buffer: Zeroizing<Vec<u8>>,
}

impl CbcDecryptor {
    #[must_use]
    pub fn new(key: &[u8; 32], iv: &[u8; 16]) -> Self {
        Self {
            inner: CbcDec::new(key.into(), iv.into()),
            buffer: Zeroizing::new(Vec::with_capacity(BLOCK_LEN * 2)),
        }
    }

    /// Decrypt every complete block except the last, which stays buffered.
    pub fn update(&mut self, input: &[u8]) -> Zeroizing<Vec<u8>> {
        self.buffer.extend_from_slice(input);
        let whole_blocks = self.buffer.len() / BLOCK_LEN;
        let blocks_to_release = whole_blocks.saturating_sub(1);
        let release_len = blocks_to_release * BLOCK_LEN;

        let mut out = Zeroizing::new(Vec::with_capacity(release_len));
        for chunk in self.buffer[..release_len].chunks_exact(BLOCK_LEN) {
            let mut block: Block = Block::clone_from_slice(chunk);
            self.inner.decrypt_block_mut(&mut block);
            out.extend_from_slice(&block);
        }
        self.buffer.drain(..release_len);
        out
    }

    /// Decrypt the final held-back block and strip its PKCS#7 padding.
    pub fn finalize(mut self) -> Result<Zeroizing<Vec<u8>>, CipherError> {
        if self.buffer.len() != BLOCK_LEN {
            return Err(CipherError::InvalidLength);
        }
        let mut block: Block = Block::clone_from_slice(&self.buffer);
        self.inner.decrypt_block_mut(&mut block);

        let pad_len = *block.last().expect("block is non-empty") as usize;
        if pad_len == 0 || pad_len > BLOCK_LEN {
            return Err(CipherError::InvalidPadding);
        }
        if !block[BLOCK_LEN - pad_len..].iter().all(|&b| b as usize == pad_len) {
            return Err(CipherError::InvalidPadding);
        }
        Ok(Zeroizing::new(block[..BLOCK_LEN - pad_len].to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(plaintext: &[u8], chunk_sizes: &[usize]) {
        let key = [0x11u8; 32];
        let iv = [0x22u8; 16];

        let mut enc = CbcEncryptor::new(&key, &iv);
        let mut ciphertext = Vec::new();
        let mut offset = 0;
        for &size in chunk_sizes {
            let end = (offset + size).min(plaintext.len());
            ciphertext.extend(enc.update(&plaintext[offset..end]));
            offset = end;
        }
        ciphertext.extend(enc.update(&plaintext[offset..]));
        ciphertext.extend(enc.finalize());

        assert_eq!(ciphertext.len() % BLOCK_LEN, 0);
        assert!(!ciphertext.is_empty());

        let mut dec = CbcDecryptor::new(&key, &iv);
        let mut plaintext_out = Vec::new();
        for chunk in ciphertext.chunks(7) {
            plaintext_out.extend(dec.update(chunk).iter().copied());
        }
        plaintext_out.extend(dec.finalize().unwrap().iter().copied());

        assert_eq!(plaintext_out, plaintext);
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        roundtrip(b"", &[]);
    }

    #[test]
    fn one_byte_roundtrips() {
        roundtrip(b"a", &[1]);
    }

    #[test]
    fn exact_block_roundtrips() {
        roundtrip(&[7u8; 16], &[16]);
    }

    #[test]
    fn multi_block_arbitrary_chunking_roundtrips() {
        let plaintext: Vec<u8> = (0..200u32).map(|i| (i % 256) as u8).collect();
        roundtrip(&plaintext, &[1, 7, 13, 31, 1]);
    }

    #[test]
    fn truncated_ciphertext_fails_on_finalize() {
        let key = [0x11u8; 32];
        let iv = [0x22u8; 16];
        let mut enc = CbcEncryptor::new(&key, &iv);
        let mut ciphertext = enc.update(b"hello world");
        ciphertext.extend(enc.finalize());
        ciphertext.truncate(ciphertext.len() - 1);

        let mut dec = CbcDecryptor::new(&key, &iv);
        dec.update(&ciphertext);
        assert_eq!(dec.finalize().unwrap_err(), CipherError::InvalidLength);
    }

    #[test]
    fn tampered_padding_is_rejected() {
        let key = [0x11u8; 32];
        let iv = [0x22u8; 16];
        let mut enc = CbcEncryptor::new(&key, &iv);
        let mut ciphertext = enc.update(b"hello world");
        ciphertext.extend(enc.finalize());
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xFF;

        let mut dec = CbcDecryptor::new(&key, &iv);
        dec.update(&ciphertext);
        assert_eq!(dec.finalize().unwrap_err(), CipherError::InvalidPadding);
    }
}
