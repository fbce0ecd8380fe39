//! Self-describing random padding for message payloads.
//!
//! Every payload is followed by N bytes of value N, 1 <= N <= 255, with N
//! drawn fresh per message. The pad length is chosen by rejection sampling
//! a single random byte, not by reducing a wider draw modulo 255.

use msgapi_crypto::CryptoProvider;

use crate::error::{Error, Result};

/// Draw a padding length in `1..=255`.
pub fn generate_pad_len<P: CryptoProvider + ?Sized>(provider: &P) -> Result<u8> {
    let mut draw = [0u8; 1];
    loop {
        provider.fill_random(&mut draw)?;
        if draw[0] != 0 {
            return Ok(draw[0]);
        }
    }
}

/// Append `pad_len` bytes of value `pad_len`.
pub fn pad(mut payload: Vec<u8>, pad_len: u8) -> Vec<u8> {
    payload.resize(payload.len() + usize::from(pad_len), pad_len);
    payload
}

/// Remove padding, trusting the last byte as the pad count.
///
/// Fails when nothing would remain of the payload.
pub fn strip(mut data: Vec<u8>) -> Result<Vec<u8>> {
    let Some(&pad_len) = data.last() else {
        return Err(Error::MalformedMessage("empty padded payload".into()));
    };
    let real_len = data
        .len()
        .checked_sub(usize::from(pad_len))
        .filter(|&len| len >= 1)
        .ok_or_else(|| {
            Error::MalformedMessage(format!(
                "padding of {pad_len} bytes leaves no payload in {} bytes",
                data.len()
            ))
        })?;
    data.truncate(real_len);
    Ok(data)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use msgapi_crypto::{NaclProvider, ScriptedProvider};
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn zero_draws_are_rejected_not_reduced() {
        let provider = ScriptedProvider::new([0, 0, 0, 17]);
        assert_eq!(generate_pad_len(&provider).unwrap(), 17);
        assert_eq!(provider.draws(), 4);
    }

    #[test]
    fn max_draw_is_kept() {
        let provider = ScriptedProvider::new([255]);
        assert_eq!(generate_pad_len(&provider).unwrap(), 255);
        assert_eq!(provider.draws(), 1);
    }

    #[test]
    fn generated_lengths_stay_in_range() {
        let provider = NaclProvider::new();
        for _ in 0..2000 {
            let n = generate_pad_len(&provider).unwrap();
            assert!(n >= 1);
        }
    }

    #[test]
    fn pad_appends_self_describing_bytes() {
        assert_eq!(pad(vec![0x01, b'a'], 3), vec![0x01, b'a', 3, 3, 3]);
    }

    #[test]
    fn strip_removes_padding() {
        assert_eq!(strip(vec![0x01, b'a', 2, 2]).unwrap(), vec![0x01, b'a']);
    }

    #[test]
    fn strip_rejects_padding_that_consumes_everything() {
        assert!(matches!(strip(vec![2, 2]), Err(Error::MalformedMessage(_))));
        assert!(matches!(strip(vec![9, 9]), Err(Error::MalformedMessage(_))));
        assert!(matches!(strip(vec![]), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn strip_with_zero_count_keeps_everything() {
        assert_eq!(strip(vec![0x01, 0x00]).unwrap(), vec![0x01, 0x00]);
    }

    proptest! {
        #[test]
        fn strip_inverts_pad(payload in proptest::collection::vec(any::<u8>(), 1..300), pad_len in 1u8..=255) {
            let padded = pad(payload.clone(), pad_len);
            prop_assert_eq!(padded.len(), payload.len() + usize::from(pad_len));
            prop_assert_eq!(strip(padded).unwrap(), payload);
        }

        #[test]
        fn pad_len_is_never_zero(script in proptest::collection::vec(any::<u8>(), 0..16)) {
            let provider = ScriptedProvider::new(script);
            let n = generate_pad_len(&provider).unwrap();
            prop_assert!(n >= 1);
        }
    }
}
