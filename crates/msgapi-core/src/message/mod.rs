//! Typed gateway messages and their plaintext payload codec.
//!
//! A payload is a one-byte type tag followed by the variant's layout. This
//! module converts between [`Message`] values and unpadded payload bytes;
//! padding and encryption happen in [`crate::envelope`].

mod codec;
mod types;

pub use codec::{decode, encode};
pub use types::*;
