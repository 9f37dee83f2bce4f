//! Incremental HMAC-SHA256 wrapping `ring::hmac`: build a
//! [`ring::hmac::Context`] once, feed it bytes as they become available, and
//! sign at the end.

use ring::hmac;

/// 32-byte HMAC-SHA256 output.
pub const MAC_LEN: usize = 32;

/// An incremental HMAC-SHA256 computation spanning an entire container.
pub struct HmacSha256 {
    context: hmac::Context,
}

impl HmacSha256 {
    /// Start a new HMAC computation keyed with `key` (32 bytes for this
    /// format, though `ring` itself accepts any key length).
    #[must_use]
    pub fn new(key: &[u8]) -> Self {
        let key = hmac::Key::new(hmac::HMAC_SHA256, key);
        Self {
            context: hmac::Context::with_key(&key),
        }
    }

    /// Feed more authenticated bytes into the running computation.
    pub fn update(&mut self, data: &[u8]) {
        self.context.update(data);
    }

    /// Finalize and return the 32-byte tag. Consumes the context — a
    /// `HmacSha256` authenticates exactly one container.
    #[must_use]
    pub fn finalize(self) -> [u8; MAC_LEN] {
        let tag = self.context.sign();
        let mut out = [0u8; MAC_LEN];
        out.copy_from_slice(tag.as_ref());
        out
    }
}
