//! `msgapi` cryptographic primitives
//!
//! Everything in the message envelope layer that touches a crypto library
//! lives here, so the codec and envelope logic in `msgapi-core` only sees
//! byte buffers and the [`CryptoProvider`] trait.
//!
//! ## Crypto primitives
//!
//! - **Box**: X25519 + XSalsa20-Poly1305, NaCl `crypto_box` compatible
//! - **SecretBox**: XSalsa20-Poly1305 with a 32-byte symmetric key
//! - **Lookup hashes**: HMAC-SHA256 under fixed public keys
//! - **Callback MAC**: HMAC-SHA256 under the gateway secret

pub mod compare;
pub mod encoding;
pub mod error;
pub mod hashing;
pub mod keys;
pub mod mac;
pub mod provider;

pub use compare::{secure_compare, secure_compare_str};
pub use encoding::{bytes_to_hex, hex_to_array, hex_to_bytes};
pub use error::CryptoError;
pub use hashing::{EMAIL_HMAC_KEY, PHONENO_HMAC_KEY, hash_email, hash_phone_no};
pub use keys::{
    BOX_OVERHEAD, KEY_SIZE, KeyPair, NONCE_SIZE, Nonce, SymmetricKey, derive_public_key,
    key_from_slice, nonce_from_slice,
};
pub use mac::{CallbackFields, calculate_mac, verify_mac};
#[cfg(any(test, feature = "test-utils"))]
pub use provider::ScriptedProvider;
pub use provider::{CryptoProvider, NaclProvider};
