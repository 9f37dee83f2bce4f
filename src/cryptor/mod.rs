//! The streaming cryptor state machines: [`Encryptor`] and [`Decryptor`]
//! compose the header codec, block cipher, and HMAC primitives into the
//! full v3 container protocol.

mod decryptor;
mod encryptor;

pub use decryptor::Decryptor;
pub use encryptor::Encryptor;
