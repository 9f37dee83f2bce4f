//! HMAC trailer buffering for the v3 container's final 32 bytes.
//!
//! The ciphertext stream and the HMAC trailer share one byte stream with no
//! length prefix, so a streaming reader can't know it has reached the
//! trailer until it has seen the *next* bytes and confirmed they don't
//! arrive. `TrailerTracker` holds back the last
//! [`MAC_LEN`] bytes seen so far, releasing only the prefix that is provably
//! not part of the trailer.

/// Length, in bytes, of the HMAC-SHA256 trailer appended to every container.
pub const MAC_LEN: usize = 32;

/// Buffers trailing bytes so that exactly the last [`MAC_LEN`] bytes fed to
/// it are available on demand, while everything earlier is released
/// immediately for downstream processing (decryption, MAC authentication).
#[derive(Debug, Default)]
pub struct TrailerTracker {
    held: Vec<u8>,
}

impl TrailerTracker {
    #[must_use]
    pub fn new() -> Self {
        Self { held: Vec::with_capacity(MAC_LEN * 2) }
    }

    /// Feed more bytes from the tail of the container. Returns the prefix
    /// that is now guaranteed not to be part of the trailer.
    pub fn push(&mut self, input: &[u8]) -> Vec<u8> {
        self.held.extend_from_slice(input);
        if self.held.len() <= MAC_LEN {
            return Vec::new();
        }
        let release_len = self.held.len() - MAC_LEN;
        self.held.drain(..release_len)
    }

    /// Consume the tracker, returning the held trailer if exactly
    /// [`MAC_LEN`] bytes were ever withheld, or `None` for a container that
    /// ended before a complete trailer arrived.
    #[must_use]
    pub fn take(self) -> Option<[u8; MAC_LEN]> {
        self.held.try_into().ok()
    }
}
