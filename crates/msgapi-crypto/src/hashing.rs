//! Lookup hashes for email addresses and phone numbers.
//!
//! The gateway resolves identities from hashed contact data. The HMAC keys
//! are public constants shipped with every client, so these hashes only
//! keep raw addresses out of request logs; they are not secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC key for email lookup hashes.
pub const EMAIL_HMAC_KEY: [u8; 32] = [
    0x30, 0xa5, 0x50, 0x0f, 0xed, 0x97, 0x01, 0xfa, 0x6d, 0xef, 0xdb, 0x61, 0x08, 0x41, 0x90, 0x0f,
    0xeb, 0xb8, 0xe4, 0x30, 0x88, 0x1f, 0x7a, 0xd8, 0x16, 0x82, 0x62, 0x64, 0xec, 0x09, 0xba, 0xd7,
];

/// HMAC key for phone number lookup hashes.
pub const PHONENO_HMAC_KEY: [u8; 32] = [
    0x85, 0xad, 0xf8, 0x22, 0x69, 0x53, 0xf3, 0xd9, 0x6c, 0xfd, 0x5d, 0x09, 0xbf, 0x29, 0x55, 0x5e,
    0xb9, 0x55, 0xfc, 0xd8, 0xaa, 0x5e, 0xc4, 0xf9, 0xfc, 0xd8, 0x69, 0xe2, 0x58, 0x37, 0x07, 0x23,
];

/// Characters stripped from both ends of an email address.
const EMAIL_TRIM: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0b'];

/// HMAC-SHA256 over the concatenation of `parts`, hex encoded.
pub(crate) fn hmac_sha256_hex(key: &[u8], parts: &[&[u8]]) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    for part in parts {
        mac.update(part);
    }
    hex::encode(mac.finalize().into_bytes())
}

/// Hash an email address for identity lookup.
///
/// The address is trimmed and ASCII lower-cased first, so `" Foo@Bar.com"`
/// and `"foo@bar.com"` hash identically.
pub fn hash_email(email: &str) -> String {
    let clean = email.trim_matches(EMAIL_TRIM).to_ascii_lowercase();
    hmac_sha256_hex(&EMAIL_HMAC_KEY, &[clean.as_bytes()])
}

/// Hash a phone number (E.164) for identity lookup.
///
/// Every non-digit character is dropped first.
pub fn hash_phone_no(phone_no: &str) -> String {
    let clean: String = phone_no.chars().filter(char::is_ascii_digit).collect();
    hmac_sha256_hex(&PHONENO_HMAC_KEY, &[clean.as_bytes()])
}
