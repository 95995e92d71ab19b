//! Shared helpers: byte decoding and stable hashing.

pub mod encoding;
pub mod hashing;

pub use encoding::decode_text;
pub use hashing::stable_hash;
