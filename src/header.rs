//! Header codec for the v3 RNCryptor container.
//!
//! ```text
//! password mode: 0x03 | 0x01 | encSalt[8] | hmacSalt[8] | IV[16]   (34 bytes)
//! key mode:      0x03 | 0x00 | IV[16]                              (18 bytes)
//! ```

use thiserror::Error;

/// Constant version byte for the v3 container format.
pub const VERSION: u8 = 0x03;

/// Size, in bytes, of a PBKDF2 salt.
pub const SALT_LEN: usize = 8;

/// Size, in bytes, of the AES-CBC initialization vector.
pub const IV_LEN: usize = 16;

/// Header length for a password-mode container.
pub const PASSWORD_HEADER_LEN: usize = 2 + SALT_LEN + SALT_LEN + IV_LEN;

/// Header length for a key-mode container.
pub const KEY_HEADER_LEN: usize = 2 + IV_LEN;

/// Which of the two v3 operating modes a header describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Options bit 0 set: encryption/HMAC keys are derived from a password.
    Password,
    /// Options bit 0 clear: caller supplies raw encryption/HMAC keys.
    Key,
}

impl Mode {
    const fn options_byte(self) -> u8 {
        match self {
            Mode::Password => 0x01,
            Mode::Key => 0x00,
        }
    }
}

/// A header successfully parsed from a byte prefix.
#[derive(Debug, Clone)]
pub struct ParsedHeader {
    pub mode: Mode,
    pub encryption_salt: Option<[u8; SALT_LEN]>,
    pub hmac_salt: Option<[u8; SALT_LEN]>,
    pub iv: [u8; IV_LEN],
    /// Number of bytes of the input this header consumed.
    pub consumed: usize,
}

/// Fatal header-parsing failures. A header that is merely incomplete is
/// represented by `parse` returning `Ok(None)`, not an error here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("unsupported container version 0x{0:02x}, expected 0x{:02x}", VERSION)]
    UnsupportedVersion(u8),
    #[error("options byte 0x{0:02x} has reserved bits set")]
    ReservedOptionBits(u8),
}

/// Serialize a header for a fresh container.
///
/// `salts` must be `Some` for [`Mode::Password`] and `None` for
/// [`Mode::Key`]; this invariant is upheld by the two call sites in
/// [`crate::Encryptor`], not re-validated here.
#[must_use]
pub fn serialize(mode: Mode, salts: Option<([u8; SALT_LEN], [u8; SALT_LEN])>, iv: [u8; IV_LEN]) -> Vec<u8> {
    let mut out = Vec::with_capacity(PASSWORD_HEADER_LEN);
    out.push(VERSION);
    out.push(mode.options_byte());
    if let Some((encryption_salt, hmac_salt)) = salts {
        out.extend_from_slice(&encryption_salt);
        out.extend_from_slice(&hmac_salt);
    }
    out.extend_from_slice(&iv);
    out
}

/// Attempt to parse a header from the start of `buf`.
///
/// Returns `Ok(None)` when `buf` is a valid prefix but too short to contain
/// a complete header yet (the version byte alone is not enough to know
/// whether salts follow, so at least 2 bytes are needed before that can be
/// determined). Returns `Err` only for a header that is fully present but
/// structurally invalid.
pub fn parse(buf: &[u8]) -> Result<Option<ParsedHeader>, HeaderError> {
    if buf.is_empty() {
        return Ok(None);
    }
    let version = buf[0];
    if version != VERSION {
        return Err(HeaderError::UnsupportedVersion(version));
    }
    if buf.len() < 2 {
        return Ok(None);
    }
    let options = buf[1];
    if options & !0x01 != 0 {
        return Err(HeaderError::ReservedOptionBits(options));
    }
    let mode = if options & 0x01 != 0 { Mode::Password } else { Mode::Key };
    let needed = match mode {
        Mode::Password => PASSWORD_HEADER_LEN,
        Mode::Key => KEY_HEADER_LEN,
    };
    if buf.len() < needed {
        return Ok(None);
    }

    let (encryption_salt, hmac_salt, iv_offset) = match mode {
        Mode::Password => {
            let mut enc = [0u8; SALT_LEN];
            enc.copy_from_slice(&buf[2..2 + SALT_LEN]);
            let mut hmac = [0u8; SALT_LEN];
            hmac.copy_from_slice(&buf[2 + SALT_LEN..2 + 2 * SALT_LEN]);
            (Some(enc), Some(hmac), 2 + 2 * SALT_LEN)
        }
        Mode::Key => (None, None, 2),
    };
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&buf[iv_offset..iv_offset + IV_LEN]);

    Ok(Some(ParsedHeader {
        mode,
        encryption_salt,
        hmac_salt,
        iv,
        consumed: needed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_header_roundtrip() {
        let salts = ([1u8; SALT_LEN], [2u8; SALT_LEN]);
        let iv = [3u8; IV_LEN];
        let bytes = serialize(Mode::Password, Some(salts), iv);
        assert_eq!(bytes.len(), PASSWORD_HEADER_LEN);

        let parsed = parse(&bytes).unwrap().unwrap();
        assert_eq!(parsed.mode, Mode::Password);
        assert_eq!(parsed.encryption_salt.unwrap(), salts.0);
        assert_eq!(parsed.hmac_salt.unwrap(), salts.1);
        assert_eq!(parsed.iv, iv);
        assert_eq!(parsed.consumed, PASSWORD_HEADER_LEN);
    }

    #[test]
    fn key_header_roundtrip() {
        let iv = [9u8; IV_LEN];
        let bytes = serialize(Mode::Key, None, iv);
        assert_eq!(bytes.len(), KEY_HEADER_LEN);

        let parsed = parse(&bytes).unwrap().unwrap();
        assert_eq!(parsed.mode, Mode::Key);
        assert!(parsed.encryption_salt.is_none());
        assert!(parsed.hmac_salt.is_none());
        assert_eq!(parsed.iv, iv);
        assert_eq!(parsed.consumed, KEY_HEADER_LEN);
    }

    #[test]
    fn incremental_parse_reports_need_more_input() {
        let bytes = serialize(Mode::Password, Some(([0; SALT_LEN], [0; SALT_LEN])), [0; IV_LEN]);
        for split in 0..bytes.len() {
            assert!(parse(&bytes[..split]).unwrap().is_none(), "split={split}");
        }
        assert!(parse(&bytes).unwrap().is_some());
    }

    #[test]
    fn rejects_unsupported_version() {
        let bytes = [0x02, 0x01];
        assert_eq!(parse(&bytes), Err(HeaderError::UnsupportedVersion(0x02)));
    }

    #[test]
    fn rejects_reserved_option_bits() {
        let bytes = [VERSION, 0x03];
        assert_eq!(parse(&bytes), Err(HeaderError::ReservedOptionBits(0x03)));
    }
}
