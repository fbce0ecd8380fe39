//! Hex conversion at the transport boundary.
//!
//! Blob ids, keys and boxes cross the gateway API as hex strings. Malformed
//! input is rejected, never truncated.

use crate::error::CryptoError;

/// Decode a hex string (either case) into bytes.
pub fn hex_to_bytes(hex_str: &str) -> Result<Vec<u8>, CryptoError> {
    hex::decode(hex_str).map_err(|e| CryptoError::InvalidHex(e.to_string()))
}

/// Decode a hex string that must describe exactly `N` bytes.
pub fn hex_to_array<const N: usize>(hex_str: &str) -> Result<[u8; N], CryptoError> {
    let mut out = [0u8; N];
    hex::decode_to_slice(hex_str, &mut out).map_err(|e| {
        CryptoError::InvalidHex(format!("{e} (expected {} hex characters)", N * 2))
    })?;
    Ok(out)
}

/// Encode bytes as lower-case hex.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
