//! Callback MACs for incoming gateway messages.
//!
//! The gateway delivers incoming messages to a callback URL and signs each
//! delivery with HMAC-SHA256 over the request fields, keyed with the
//! gateway secret. Verify the MAC before attempting to decrypt the box.

use crate::compare::secure_compare_str;
use crate::hashing::hmac_sha256_hex;

/// Request fields covered by the callback MAC, as received.
#[derive(Debug, Clone, Copy)]
pub struct CallbackFields<'a> {
    /// Sender identity.
    pub from: &'a str,
    /// Gateway identity the message was sent to.
    pub to: &'a str,
    pub message_id: &'a str,
    /// Unix timestamp as sent by the gateway.
    pub date: &'a str,
    /// Nonce, hex encoded.
    pub nonce: &'a str,
    /// Box, hex encoded.
    pub box_hex: &'a str,
}

/// Compute the callback MAC (hex) for `fields` under `secret`.
pub fn calculate_mac(fields: &CallbackFields<'_>, secret: &str) -> String {
    hmac_sha256_hex(
        secret.as_bytes(),
        &[
            fields.from.as_bytes(),
            fields.to.as_bytes(),
            fields.message_id.as_bytes(),
            fields.date.as_bytes(),
            fields.nonce.as_bytes(),
            fields.box_hex.as_bytes(),
        ],
    )
}

/// Check a received MAC in constant time. Hex case is ignored.
pub fn verify_mac(fields: &CallbackFields<'_>, secret: &str, mac: &str) -> bool {
    secure_compare_str(&calculate_mac(fields, secret), &mac.to_ascii_lowercase())
}
