//! Payload codec for gateway messages.
//!
//! Decoding dispatches strictly on the first byte. Text must be valid UTF-8
//! and file payloads must be a non-empty JSON object; both are rejected as
//! malformed otherwise.

use msgapi_crypto::Nonce;
use serde_json::Value;

use super::types::*;
use crate::error::{Error, Result};

/// Serialize a message into its unpadded payload (type tag included).
pub fn encode(message: &Message) -> Result<Vec<u8>> {
    let mut out = vec![message.type_tag()];
    match message {
        Message::Text(text) => {
            if text.is_empty() {
                return Err(Error::InvalidInput("text message must not be empty".into()));
            }
            out.extend_from_slice(text.as_bytes());
        }
        Message::Image(image) => {
            out.extend_from_slice(&image.blob_id);
            out.extend_from_slice(&image.size.to_le_bytes());
            out.extend_from_slice(&image.nonce);
        }
        Message::Location(location) => encode_location(location, &mut out)?,
        Message::File(file) => {
            let json = serde_json::to_vec(file)
                .map_err(|e| Error::InvalidInput(format!("file message: {e}")))?;
            out.extend_from_slice(&json);
        }
        Message::DeliveryReceipt(receipt) => {
            out.push(receipt.receipt_type.into());
            for id in &receipt.message_ids {
                out.extend_from_slice(id);
            }
        }
    }
    Ok(out)
}

fn encode_location(location: &LocationMessage, out: &mut Vec<u8>) -> Result<()> {
    if !location.latitude.is_finite() || !location.longitude.is_finite() {
        return Err(Error::InvalidInput(
            "location coordinates must be finite".into(),
        ));
    }
    if location.address.iter().any(|line| line.contains('\n')) {
        return Err(Error::InvalidInput(
            "location address lines must not contain newlines".into(),
        ));
    }

    let mut text = format!("{},{}", location.latitude, location.longitude);
    if location.accuracy != 0 {
        text.push_str(&format!(",{}", location.accuracy));
    }
    for line in &location.address {
        text.push('\n');
        text.push_str(line);
    }
    out.extend_from_slice(text.as_bytes());
    Ok(())
}

/// Parse an unpadded payload into a message.
pub fn decode(data: &[u8]) -> Result<Message> {
    let Some((&tag, body)) = data.split_first() else {
        return Err(Error::MalformedMessage("empty payload".into()));
    };

    match tag {
        TEXT_TYPE => decode_text(body),
        IMAGE_TYPE => decode_image(data),
        LOCATION_TYPE => decode_location(body),
        FILE_TYPE => decode_file(body),
        DELIVERY_RECEIPT_TYPE => decode_delivery_receipt(data),
        other => Err(Error::UnsupportedMessageType(other)),
    }
}

fn decode_text(body: &[u8]) -> Result<Message> {
    if body.is_empty() {
        return Err(Error::MalformedMessage("text message is too short".into()));
    }
    let text = std::str::from_utf8(body)
        .map_err(|e| Error::MalformedMessage(format!("text message is not UTF-8: {e}")))?;
    Ok(Message::Text(text.to_string()))
}

fn decode_image(data: &[u8]) -> Result<Message> {
    if data.len() != IMAGE_MESSAGE_LEN {
        return Err(Error::MalformedMessage(format!(
            "image message must be {IMAGE_MESSAGE_LEN} bytes, got {}",
            data.len()
        )));
    }

    let mut blob_id = [0u8; BLOB_ID_LEN];
    let mut size = [0u8; IMAGE_FILE_SIZE_LEN];
    let mut nonce: Nonce = [0u8; IMAGE_NONCE_LEN];
    let size_at = 1 + BLOB_ID_LEN;
    let nonce_at = size_at + IMAGE_FILE_SIZE_LEN;
    blob_id.copy_from_slice(&data[1..size_at]);
    size.copy_from_slice(&data[size_at..nonce_at]);
    nonce.copy_from_slice(&data[nonce_at..]);

    Ok(Message::Image(ImageMessage {
        blob_id,
        size: u32::from_le_bytes(size),
        nonce,
    }))
}

fn decode_location(body: &[u8]) -> Result<Message> {
    let text = std::str::from_utf8(body)
        .map_err(|e| Error::MalformedMessage(format!("location message is not UTF-8: {e}")))?;
    let mut lines = text.split('\n');
    let points: Vec<&str> = lines.next().unwrap_or_default().split(',').collect();
    if points.len() < 2 {
        return Err(Error::MalformedMessage(
            "invalid latitude and longitude".into(),
        ));
    }

    let coordinate = |raw: &str| {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| Error::MalformedMessage(format!("invalid coordinate {raw:?}")))
    };
    let latitude = coordinate(points[0])?;
    let longitude = coordinate(points[1])?;
    let accuracy = points.get(2).map_or(0, |raw| leading_accuracy(raw));

    Ok(Message::Location(LocationMessage {
        latitude,
        longitude,
        accuracy,
        address: lines.map(str::to_string).collect(),
    }))
}

/// Leading integer of an accuracy field, so `"25.000000"` and `"12m"` both
/// count. Negative values clamp to 0 and overflow saturates at `u32::MAX`.
fn leading_accuracy(raw: &str) -> u32 {
    let raw = raw.trim_start();
    let digits = match raw.as_bytes().first() {
        Some(b'-') => return 0,
        Some(b'+') => &raw[1..],
        _ => raw,
    };
    digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u32, |acc, digit| {
            acc.saturating_mul(10).saturating_add(u32::from(digit - b'0'))
        })
}

fn decode_file(body: &[u8]) -> Result<Message> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| Error::MalformedMessage(format!("file message JSON: {e}")))?;
    match value.as_object() {
        Some(fields) if !fields.is_empty() => {}
        _ => {
            return Err(Error::MalformedMessage(
                "file message is not a JSON object".into(),
            ));
        }
    }
    let file: FileMessage = serde_json::from_value(value)
        .map_err(|e| Error::MalformedMessage(format!("file message fields: {e}")))?;
    Ok(Message::File(file))
}

fn decode_delivery_receipt(data: &[u8]) -> Result<Message> {
    if data.len() < 2 || (data.len() - 2) % MESSAGE_ID_LEN != 0 {
        return Err(Error::MalformedMessage(format!(
            "delivery receipt length {} is not 2 + n * {MESSAGE_ID_LEN}",
            data.len()
        )));
    }

    let message_ids = data[2..]
        .chunks_exact(MESSAGE_ID_LEN)
        .map(|chunk| {
            let mut id = [0u8; MESSAGE_ID_LEN];
            id.copy_from_slice(chunk);
            id
        })
        .collect();

    Ok(Message::DeliveryReceipt(DeliveryReceipt {
        receipt_type: ReceiptType::from(data[1]),
        message_ids,
    }))
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn sample_image() -> ImageMessage {
        ImageMessage {
            blob_id: [0xab; BLOB_ID_LEN],
            size: 0x0102_0304,
            nonce: [0x5a; IMAGE_NONCE_LEN],
        }
    }

    fn sample_file(thumbnail: Option<&str>) -> FileMessage {
        FileMessage {
            blob_id: "0123456789abcdef0123456789abcdef".into(),
            key: "00".repeat(32),
            mime_type: "application/pdf".into(),
            file_name: "report.pdf".into(),
            size: 48_213,
            index: 0,
            thumbnail_blob_id: thumbnail.map(str::to_string),
        }
    }

    fn assert_malformed(result: Result<Message>) {
        assert!(
            matches!(result, Err(Error::MalformedMessage(_))),
            "expected MalformedMessage, got {result:?}"
        );
    }

    #[test]
    fn text_encodes_as_tag_plus_utf8() {
        let encoded = encode(&Message::Text("äöü".into())).unwrap();
        assert_eq!(encoded[0], TEXT_TYPE);
        assert_eq!(&encoded[1..], "äöü".as_bytes());
    }

    #[test]
    fn empty_text_is_rejected_on_encode() {
        assert!(matches!(
            encode(&Message::Text(String::new())),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn text_with_tag_only_is_malformed() {
        assert_malformed(decode(&[TEXT_TYPE]));
    }

    #[test]
    fn text_with_invalid_utf8_is_malformed() {
        assert_malformed(decode(&[TEXT_TYPE, 0xff, 0xfe]));
    }

    #[test]
    fn image_layout_is_fixed() {
        let encoded = encode(&Message::Image(sample_image())).unwrap();
        assert_eq!(encoded.len(), IMAGE_MESSAGE_LEN);
        assert_eq!(encoded[0], IMAGE_TYPE);
        assert_eq!(&encoded[1..17], &[0xab; 16]);
        assert_eq!(&encoded[17..21], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&encoded[21..], &[0x5a; 24]);
        assert_eq!(
            decode(&encoded).unwrap(),
            Message::Image(sample_image())
        );
    }

    #[test]
    fn image_with_wrong_length_is_malformed() {
        let encoded = encode(&Message::Image(sample_image())).unwrap();
        assert_malformed(decode(&encoded[..44]));
        let mut longer = encoded;
        longer.push(0);
        assert_eq!(longer.len(), 46);
        assert_malformed(decode(&longer));
    }

    #[test]
    fn file_json_uses_short_keys_and_omits_missing_thumbnail() {
        let encoded = encode(&Message::File(sample_file(None))).unwrap();
        assert_eq!(encoded[0], FILE_TYPE);
        let json: Value = serde_json::from_slice(&encoded[1..]).unwrap();
        let object = json.as_object().unwrap();
        for key in ["b", "k", "m", "n", "s", "i"] {
            assert!(object.contains_key(key), "missing key {key}");
        }
        assert!(!object.contains_key("t"));
        assert_eq!(object["s"], 48_213);
        assert_eq!(object["i"], 0);
    }

    #[test]
    fn file_json_includes_thumbnail_when_present() {
        let file = sample_file(Some("fedcba9876543210fedcba9876543210"));
        let encoded = encode(&Message::File(file.clone())).unwrap();
        let json: Value = serde_json::from_slice(&encoded[1..]).unwrap();
        assert_eq!(json["t"], "fedcba9876543210fedcba9876543210");
        assert_eq!(decode(&encoded).unwrap(), Message::File(file));
    }

    #[test]
    fn file_decode_tolerates_missing_index_and_unknown_keys() {
        let mut payload = vec![FILE_TYPE];
        payload.extend_from_slice(
            br#"{"b":"aa","k":"bb","m":"text/plain","n":"a.txt","s":3,"d":"caption"}"#,
        );
        let Message::File(file) = decode(&payload).unwrap() else {
            panic!("expected file message");
        };
        assert_eq!(file.index, 0);
        assert_eq!(file.thumbnail_blob_id, None);
        assert_eq!(file.size, 3);
    }

    #[test]
    fn file_decode_rejects_bad_json_uniformly() {
        let bodies: [&[u8]; 6] = [
            b"not json",
            b"{}",
            b"[]",
            b"null",
            br#"["aa","bb","text/plain","a.txt",3]"#,
            br#"{"b":"aa","k":"bb","m":"text/plain","n":"a.txt"}"#,
        ];
        for body in bodies {
            let mut payload = vec![FILE_TYPE];
            payload.extend_from_slice(body);
            assert_malformed(decode(&payload));
        }
    }

    #[test]
    fn delivery_receipt_layout() {
        let receipt = DeliveryReceipt {
            receipt_type: ReceiptType::Read,
            message_ids: vec![[1; 8], [2; 8]],
        };
        let encoded = encode(&Message::DeliveryReceipt(receipt.clone())).unwrap();
        assert_eq!(encoded.len(), 2 + 16);
        assert_eq!(&encoded[..2], &[DELIVERY_RECEIPT_TYPE, 0x02]);
        assert_eq!(
            decode(&encoded).unwrap(),
            Message::DeliveryReceipt(receipt)
        );
    }

    #[test]
    fn delivery_receipt_without_ids_is_valid() {
        let decoded = decode(&[DELIVERY_RECEIPT_TYPE, 0x01]).unwrap();
        assert_eq!(
            decoded,
            Message::DeliveryReceipt(DeliveryReceipt {
                receipt_type: ReceiptType::Received,
                message_ids: vec![],
            })
        );
    }

    #[test]
    fn delivery_receipt_with_partial_id_is_malformed() {
        let mut payload = vec![DELIVERY_RECEIPT_TYPE, 0x01];
        payload.extend_from_slice(&[7; 7]);
        assert_eq!(payload.len(), 9);
        assert_malformed(decode(&payload));
        assert_malformed(decode(&[DELIVERY_RECEIPT_TYPE]));
    }

    #[test]
    fn location_with_accuracy_and_address() {
        let decoded = decode(b"\x1047.3769,8.5417,25\nThreema HQ\nZurich").unwrap();
        assert_eq!(
            decoded,
            Message::Location(LocationMessage {
                latitude: 47.3769,
                longitude: 8.5417,
                accuracy: 25,
                address: vec!["Threema HQ".into(), "Zurich".into()],
            })
        );
    }

    #[test]
    fn location_accuracy_defaults_to_zero() {
        let Message::Location(location) = decode(b"\x10-33.8688,151.2093,about").unwrap() else {
            panic!("expected location");
        };
        assert_eq!(location.accuracy, 0);
        assert!(location.address.is_empty());

        let Message::Location(location) = decode(b"\x10-33.8688,151.2093").unwrap() else {
            panic!("expected location");
        };
        assert_eq!(location.accuracy, 0);
    }

    #[test]
    fn location_accuracy_takes_leading_integer() {
        let cases: [(&[u8], u32); 8] = [
            (b"25", 25),
            (b"25.000000", 25),
            (b"12m", 12),
            (b" 7", 7),
            (b"+9", 9),
            (b"-5", 0),
            (b".5", 0),
            (b"99999999999", u32::MAX),
        ];
        for (raw, expected) in cases {
            let mut payload = b"\x1047.3769,8.5417,".to_vec();
            payload.extend_from_slice(raw);
            let Message::Location(location) = decode(&payload).unwrap() else {
                panic!("expected location");
            };
            assert_eq!(
                location.accuracy,
                expected,
                "{}",
                String::from_utf8_lossy(raw)
            );
        }
    }

    #[test]
    fn location_without_longitude_is_malformed() {
        assert_malformed(decode(b"\x1047.3769"));
        assert_malformed(decode(b"\x10"));
        assert_malformed(decode(b"\x10north,east"));
    }

    #[test]
    fn location_encode_omits_zero_accuracy() {
        let location = LocationMessage {
            latitude: 1.5,
            longitude: -2.25,
            accuracy: 0,
            address: vec![],
        };
        let encoded = encode(&Message::Location(location)).unwrap();
        assert_eq!(&encoded[1..], b"1.5,-2.25");
    }

    #[test]
    fn location_encode_rejects_multiline_address_parts() {
        let location = LocationMessage {
            latitude: 1.0,
            longitude: 2.0,
            accuracy: 0,
            address: vec!["a\nb".into()],
        };
        assert!(matches!(
            encode(&Message::Location(location)),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn unknown_tag_is_unsupported_not_malformed() {
        assert!(matches!(
            decode(&[0x7f, 1, 2, 3]),
            Err(Error::UnsupportedMessageType(0x7f))
        ));
    }

    #[test]
    fn empty_payload_is_malformed() {
        assert_malformed(decode(&[]));
    }

    fn arb_message() -> impl Strategy<Value = Message> {
        let text = ".{1,64}".prop_map(Message::Text);
        let image = (any::<[u8; BLOB_ID_LEN]>(), any::<u32>(), any::<[u8; IMAGE_NONCE_LEN]>())
            .prop_map(|(blob_id, size, nonce)| {
                Message::Image(ImageMessage {
                    blob_id,
                    size,
                    nonce,
                })
            });
        let location = (
            -90.0f64..90.0,
            -180.0f64..180.0,
            any::<u32>(),
            proptest::collection::vec("[^\n]{0,16}", 0..4),
        )
            .prop_map(|(latitude, longitude, accuracy, address)| {
                Message::Location(LocationMessage {
                    latitude,
                    longitude,
                    accuracy,
                    address,
                })
            });
        let file = (
            "[0-9a-f]{32}",
            "[0-9a-f]{64}",
            "[a-z]{1,8}/[a-z]{1,8}",
            ".{0,24}",
            any::<u64>(),
            proptest::option::of("[0-9a-f]{32}"),
        )
            .prop_map(|(blob_id, key, mime_type, file_name, size, thumbnail_blob_id)| {
                Message::File(FileMessage {
                    blob_id,
                    key,
                    mime_type,
                    file_name,
                    size,
                    index: 0,
                    thumbnail_blob_id,
                })
            });
        let receipt = (
            any::<u8>(),
            proptest::collection::vec(any::<[u8; MESSAGE_ID_LEN]>(), 0..8),
        )
            .prop_map(|(receipt_type, message_ids)| {
                Message::DeliveryReceipt(DeliveryReceipt {
                    receipt_type: ReceiptType::from(receipt_type),
                    message_ids,
                })
            });
        prop_oneof![text, image, location, file, receipt]
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(message in arb_message()) {
            let encoded = encode(&message).unwrap();
            prop_assert_eq!(encoded[0], message.type_tag());
            prop_assert_eq!(decode(&encoded).unwrap(), message);
        }

        #[test]
        fn decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..96)) {
            let _ = decode(&data);
        }
    }
}
