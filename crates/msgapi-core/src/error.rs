//! Error types for the `msgapi` core library.

use msgapi_crypto::CryptoError;
use thiserror::Error;

/// Result type alias using `msgapi` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for envelope operations.
///
/// None of these are retried internally; decoding is all-or-nothing.
#[derive(Debug, Error)]
pub enum Error {
    /// Box or secret box failed authentication, or opened to nothing
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Decrypted payload does not follow its variant's layout
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Leading type tag names no known message variant
    #[error("Unsupported message type: 0x{0:02x}")]
    UnsupportedMessageType(u8),

    /// Caller misuse: wrong-length keys or nonces, bad hex, oversized input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Crypto engine failure (random source, encryption backend)
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::DecryptionFailed => Self::DecryptionFailed,
            CryptoError::InvalidKeyLength { .. }
            | CryptoError::InvalidNonceLength { .. }
            | CryptoError::InvalidHex(_) => Self::InvalidInput(err.to_string()),
            CryptoError::EncryptionFailed(_) | CryptoError::RandomUnavailable(_) => {
                Self::Crypto(err.to_string())
            }
        }
    }
}
