//! Primitive provider for box and secret box encryption.
//!
//! [`CryptoProvider`] is the seam between the envelope logic and the crypto
//! engine. Callers construct a provider explicitly and hand it to the
//! envelope service; there is no process-wide default instance.

use crypto_box::aead::{Aead, Nonce as AeadNonce};
use crypto_box::{PublicKey as BoxPublicKey, SalsaBox, SecretKey as BoxSecretKey};
use crypto_secretbox::{KeyInit, XSalsa20Poly1305};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::keys::{KEY_SIZE, KeyPair, NONCE_SIZE, Nonce, SymmetricKey};

/// Authenticated encryption engine used by the envelope layer.
///
/// `seal_*` must be deterministic for identical inputs and `open_*` must
/// report authentication failure as [`CryptoError::DecryptionFailed`],
/// never as an empty plaintext.
pub trait CryptoProvider: Send + Sync {
    /// Fill `buf` from a cryptographically secure random source.
    fn fill_random(&self, buf: &mut [u8]) -> Result<(), CryptoError>;

    /// Public-key authenticated encryption. Output is tag || ciphertext.
    fn seal_box(
        &self,
        plaintext: &[u8],
        nonce: &Nonce,
        sender_private_key: &[u8; KEY_SIZE],
        recipient_public_key: &[u8; KEY_SIZE],
    ) -> Result<Vec<u8>, CryptoError>;

    fn open_box(
        &self,
        ciphertext: &[u8],
        recipient_private_key: &[u8; KEY_SIZE],
        sender_public_key: &[u8; KEY_SIZE],
        nonce: &Nonce,
    ) -> Result<Vec<u8>, CryptoError>;

    /// Symmetric authenticated encryption. Output is tag || ciphertext.
    fn seal_secret_box(
        &self,
        plaintext: &[u8],
        nonce: &Nonce,
        key: &SymmetricKey,
    ) -> Result<Vec<u8>, CryptoError>;

    fn open_secret_box(
        &self,
        ciphertext: &[u8],
        nonce: &Nonce,
        key: &SymmetricKey,
    ) -> Result<Vec<u8>, CryptoError>;

    /// Generate a fresh identity key pair.
    ///
    /// Fails only if the random source is unavailable.
    fn generate_key_pair(&self) -> Result<KeyPair, CryptoError> {
        let mut private_key = [0u8; KEY_SIZE];
        self.fill_random(&mut private_key)?;
        let key_pair = KeyPair::from_private_key(private_key);
        private_key.zeroize();
        Ok(key_pair)
    }

    fn derive_public_key(&self, private_key: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
        crate::keys::derive_public_key(private_key)
    }

    /// Generate a random 24-byte nonce.
    fn random_nonce(&self) -> Result<Nonce, CryptoError> {
        let mut nonce = [0u8; NONCE_SIZE];
        self.fill_random(&mut nonce)?;
        Ok(nonce)
    }

    /// Generate a random 32-byte symmetric key.
    fn symmetric_key(&self) -> Result<SymmetricKey, CryptoError> {
        let mut key = [0u8; KEY_SIZE];
        self.fill_random(&mut key)?;
        Ok(key)
    }
}

/// NaCl-compatible provider backed by the RustCrypto `crypto_box` and
/// `crypto_secretbox` crates and the operating system RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaclProvider;

impl NaclProvider {
    pub const fn new() -> Self {
        Self
    }
}

fn salsa_box(private_key: &[u8; KEY_SIZE], public_key: &[u8; KEY_SIZE]) -> SalsaBox {
    SalsaBox::new(
        &BoxPublicKey::from(*public_key),
        &BoxSecretKey::from(*private_key),
    )
}

fn secret_box(key: &SymmetricKey) -> Result<XSalsa20Poly1305, CryptoError> {
    XSalsa20Poly1305::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength {
        expected: KEY_SIZE,
        actual: key.len(),
    })
}

impl CryptoProvider for NaclProvider {
    fn fill_random(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| CryptoError::RandomUnavailable(e.to_string()))
    }

    fn seal_box(
        &self,
        plaintext: &[u8],
        nonce: &Nonce,
        sender_private_key: &[u8; KEY_SIZE],
        recipient_public_key: &[u8; KEY_SIZE],
    ) -> Result<Vec<u8>, CryptoError> {
        salsa_box(sender_private_key, recipient_public_key)
            .encrypt(AeadNonce::<SalsaBox>::from_slice(nonce), plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    }

    fn open_box(
        &self,
        ciphertext: &[u8],
        recipient_private_key: &[u8; KEY_SIZE],
        sender_public_key: &[u8; KEY_SIZE],
        nonce: &Nonce,
    ) -> Result<Vec<u8>, CryptoError> {
        salsa_box(recipient_private_key, sender_public_key)
            .decrypt(AeadNonce::<SalsaBox>::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    fn seal_secret_box(
        &self,
        plaintext: &[u8],
        nonce: &Nonce,
        key: &SymmetricKey,
    ) -> Result<Vec<u8>, CryptoError> {
        secret_box(key)?
            .encrypt(crypto_secretbox::Nonce::from_slice(nonce), plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    }

    fn open_secret_box(
        &self,
        ciphertext: &[u8],
        nonce: &Nonce,
        key: &SymmetricKey,
    ) -> Result<Vec<u8>, CryptoError> {
        secret_box(key)?
            .decrypt(crypto_secretbox::Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

/// Provider whose random draws come from a script before falling back to
/// the OS RNG. Lets tests pin padding lengths and keys.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    inner: NaclProvider,
    script: std::sync::Mutex<std::collections::VecDeque<u8>>,
    draws: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl ScriptedProvider {
    pub fn new(script: impl IntoIterator<Item = u8>) -> Self {
        Self {
            inner: NaclProvider,
            script: std::sync::Mutex::new(script.into_iter().collect()),
            draws: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of `fill_random` calls made so far.
    pub fn draws(&self) -> usize {
        self.draws.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Scripted bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().map_or(0, |script| script.len())
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl CryptoProvider for ScriptedProvider {
    fn fill_random(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        self.draws
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let mut script = self
            .script
            .lock()
            .map_err(|e| CryptoError::RandomUnavailable(e.to_string()))?;
        for byte in buf.iter_mut() {
            match script.pop_front() {
                Some(scripted) => *byte = scripted,
                None => {
                    let mut fresh = [0u8; 1];
                    self.inner.fill_random(&mut fresh)?;
                    *byte = fresh[0];
                }
            }
        }
        Ok(())
    }

    fn seal_box(
        &self,
        plaintext: &[u8],
        nonce: &Nonce,
        sender_private_key: &[u8; KEY_SIZE],
        recipient_public_key: &[u8; KEY_SIZE],
    ) -> Result<Vec<u8>, CryptoError> {
        self.inner
            .seal_box(plaintext, nonce, sender_private_key, recipient_public_key)
    }

    fn open_box(
        &self,
        ciphertext: &[u8],
        recipient_private_key: &[u8; KEY_SIZE],
        sender_public_key: &[u8; KEY_SIZE],
        nonce: &Nonce,
    ) -> Result<Vec<u8>, CryptoError> {
        self.inner
            .open_box(ciphertext, recipient_private_key, sender_public_key, nonce)
    }

    fn seal_secret_box(
        &self,
        plaintext: &[u8],
        nonce: &Nonce,
        key: &SymmetricKey,
    ) -> Result<Vec<u8>, CryptoError> {
        self.inner.seal_secret_box(plaintext, nonce, key)
    }

    fn open_secret_box(
        &self,
        ciphertext: &[u8],
        nonce: &Nonce,
        key: &SymmetricKey,
    ) -> Result<Vec<u8>, CryptoError> {
        self.inner.open_secret_box(ciphertext, nonce, key)
    }
}
