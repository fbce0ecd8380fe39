//! Constant-time comparison of secrets.

use subtle::ConstantTimeEq;

/// Compare two byte strings without leaking where they differ.
///
/// Length is not treated as secret: inputs of different length return
/// `false` immediately. Equal-length inputs are compared in full.
pub fn secure_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// String form of [`secure_compare`], e.g. for hex-encoded MACs.
pub fn secure_compare_str(a: &str, b: &str) -> bool {
    secure_compare(a.as_bytes(), b.as_bytes())
}
