//! Key pair and nonce types.
//!
//! Each gateway identity owns a long-lived X25519 key pair. The private key
//! is the raw 32-byte scalar as stored by the gateway tooling; clamping is
//! left to the X25519 implementation.

use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Size of X25519 keys and of the secret box symmetric key.
pub const KEY_SIZE: usize = 32;

/// Size of an XSalsa20 nonce.
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag prepended to every box and secret box.
pub const BOX_OVERHEAD: usize = 16;

/// 24-byte nonce for box and secret box operations.
pub type Nonce = [u8; NONCE_SIZE];

/// 32-byte symmetric key for secret box operations.
pub type SymmetricKey = [u8; KEY_SIZE];

/// An X25519 key pair for a gateway identity.
///
/// Immutable once built; the private half is wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    private_key: [u8; KEY_SIZE],
    public_key: [u8; KEY_SIZE],
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(self.public_key))
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl KeyPair {
    /// Build a key pair from a private key, deriving the public half.
    pub fn from_private_key(private_key: [u8; KEY_SIZE]) -> Self {
        let public_key = derive_public_key(&private_key);
        Self {
            private_key,
            public_key,
        }
    }

    /// Reconstruct from raw private key bytes supplied by the caller.
    pub fn from_private_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut arr = key_from_slice(bytes)?;
        let key_pair = Self::from_private_key(arr);
        arr.zeroize();
        Ok(key_pair)
    }

    /// Get the private key. Handle with care.
    pub const fn private_key(&self) -> &[u8; KEY_SIZE] {
        &self.private_key
    }

    pub const fn public_key(&self) -> &[u8; KEY_SIZE] {
        &self.public_key
    }
}

/// Derive the X25519 public key for a private key.
pub fn derive_public_key(private_key: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
    let secret = StaticSecret::from(*private_key);
    PublicKey::from(&secret).to_bytes()
}

/// Convert caller-supplied key bytes into a fixed-size key.
pub fn key_from_slice(bytes: &[u8]) -> Result<[u8; KEY_SIZE], CryptoError> {
    <[u8; KEY_SIZE]>::try_from(bytes).map_err(|_| CryptoError::InvalidKeyLength {
        expected: KEY_SIZE,
        actual: bytes.len(),
    })
}

/// Convert caller-supplied nonce bytes into a fixed-size nonce.
pub fn nonce_from_slice(bytes: &[u8]) -> Result<Nonce, CryptoError> {
    <Nonce>::try_from(bytes).map_err(|_| CryptoError::InvalidNonceLength {
        expected: NONCE_SIZE,
        actual: bytes.len(),
    })
}
