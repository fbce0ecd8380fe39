//! Message types exchanged through the gateway.

use msgapi_crypto::{Nonce, bytes_to_hex};
use serde::{Deserialize, Serialize};

/// Type tag of a text message.
pub const TEXT_TYPE: u8 = 0x01;
/// Type tag of an image message.
pub const IMAGE_TYPE: u8 = 0x02;
/// Type tag of a location message.
pub const LOCATION_TYPE: u8 = 0x10;
/// Type tag of a file message.
pub const FILE_TYPE: u8 = 0x17;
/// Type tag of a delivery receipt.
pub const DELIVERY_RECEIPT_TYPE: u8 = 0x80;

/// Length of a message id inside a delivery receipt.
pub const MESSAGE_ID_LEN: usize = 8;
/// Length of a binary blob id.
pub const BLOB_ID_LEN: usize = 16;
/// Length of the little-endian size field of an image message.
pub const IMAGE_FILE_SIZE_LEN: usize = 4;
/// Length of the nonce field of an image message.
pub const IMAGE_NONCE_LEN: usize = 24;
/// Exact payload length of an image message, tag included.
pub const IMAGE_MESSAGE_LEN: usize = 1 + BLOB_ID_LEN + IMAGE_FILE_SIZE_LEN + IMAGE_NONCE_LEN;

/// Practical text limit of the gateway. Longer texts are rejected by the
/// transport, not by this crate, unless [`crate::EnvelopeConfig`] sets a cap.
pub const RECOMMENDED_MAX_TEXT_BYTES: usize = 3500;

/// Message id as carried in delivery receipts.
pub type MessageId = [u8; MESSAGE_ID_LEN];

/// A decrypted gateway message, one variant per type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(String),
    Image(ImageMessage),
    Location(LocationMessage),
    File(FileMessage),
    DeliveryReceipt(DeliveryReceipt),
}

impl Message {
    /// The type tag this message is serialized with.
    pub const fn type_tag(&self) -> u8 {
        match self {
            Self::Text(_) => TEXT_TYPE,
            Self::Image(_) => IMAGE_TYPE,
            Self::Location(_) => LOCATION_TYPE,
            Self::File(_) => FILE_TYPE,
            Self::DeliveryReceipt(_) => DELIVERY_RECEIPT_TYPE,
        }
    }

    /// Short variant name for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Location(_) => "location",
            Self::File(_) => "file",
            Self::DeliveryReceipt(_) => "delivery_receipt",
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => write!(f, "text message: {text}"),
            Self::Image(image) => write!(
                f,
                "image message: blob {} ({} bytes)",
                image.blob_id_hex(),
                image.size
            ),
            Self::Location(location) => write!(
                f,
                "location message: {},{} (accuracy {})",
                location.latitude, location.longitude, location.accuracy
            ),
            Self::File(file) => write!(
                f,
                "file message: {} ({}, {} bytes)",
                file.file_name, file.mime_type, file.size
            ),
            Self::DeliveryReceipt(receipt) => write!(
                f,
                "delivery receipt ({:?}) for {} message(s)",
                receipt.receipt_type,
                receipt.message_ids.len()
            ),
        }
    }
}

/// Reference to an encrypted image uploaded to the blob server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMessage {
    pub blob_id: [u8; BLOB_ID_LEN],
    /// Size of the encrypted image blob in bytes.
    pub size: u32,
    /// Nonce the image box was sealed with.
    pub nonce: Nonce,
}

impl ImageMessage {
    /// Blob id in the hex form the blob server expects.
    pub fn blob_id_hex(&self) -> String {
        bytes_to_hex(&self.blob_id)
    }
}

/// Geographic location with an optional address.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationMessage {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy in meters; 0 when unknown.
    pub accuracy: u32,
    /// Free-text address lines (name, street, city, ...).
    pub address: Vec<String>,
}

/// Reference to an encrypted file uploaded to the blob server.
///
/// Serialized as the compact JSON object of the file message payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMessage {
    /// Blob id, hex.
    #[serde(rename = "b")]
    pub blob_id: String,
    /// Symmetric key of the file and thumbnail blobs, hex.
    #[serde(rename = "k")]
    pub key: String,
    #[serde(rename = "m")]
    pub mime_type: String,
    #[serde(rename = "n")]
    pub file_name: String,
    /// Size of the original file in bytes.
    #[serde(rename = "s")]
    pub size: u64,
    #[serde(rename = "i", default)]
    pub index: u32,
    /// Thumbnail blob id, hex.
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_blob_id: Option<String>,
}

/// Delivery receipt kinds known to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptType {
    Received,
    Read,
    UserAcknowledged,
    UserDeclined,
    Other(u8),
}

impl From<u8> for ReceiptType {
    fn from(byte: u8) -> Self {
        match byte {
            0x01 => Self::Received,
            0x02 => Self::Read,
            0x03 => Self::UserAcknowledged,
            0x04 => Self::UserDeclined,
            other => Self::Other(other),
        }
    }
}

impl From<ReceiptType> for u8 {
    fn from(receipt_type: ReceiptType) -> Self {
        match receipt_type {
            ReceiptType::Received => 0x01,
            ReceiptType::Read => 0x02,
            ReceiptType::UserAcknowledged => 0x03,
            ReceiptType::UserDeclined => 0x04,
            ReceiptType::Other(other) => other,
        }
    }
}

/// Acknowledgement for one or more previously sent messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub receipt_type: ReceiptType,
    pub message_ids: Vec<MessageId>,
}

impl DeliveryReceipt {
    /// Message ids in the hex form used by the gateway API.
    pub fn message_ids_hex(&self) -> Vec<String> {
        self.message_ids.iter().map(|id| bytes_to_hex(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_message_len_is_45() {
        assert_eq!(IMAGE_MESSAGE_LEN, 45);
    }

    #[test]
    fn receipt_type_byte_roundtrip() {
        for byte in 0..=u8::MAX {
            assert_eq!(u8::from(ReceiptType::from(byte)), byte);
        }
        assert_eq!(ReceiptType::from(2), ReceiptType::Read);
        assert_eq!(ReceiptType::from(9), ReceiptType::Other(9));
    }

    #[test]
    fn type_tags_are_distinct() {
        let tags = [
            TEXT_TYPE,
            IMAGE_TYPE,
            LOCATION_TYPE,
            FILE_TYPE,
            DELIVERY_RECEIPT_TYPE,
        ];
        let unique: std::collections::HashSet<_> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
    }

    #[test]
    fn message_ids_hex() {
        let receipt = DeliveryReceipt {
            receipt_type: ReceiptType::Received,
            message_ids: vec![[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]],
        };
        assert_eq!(receipt.message_ids_hex(), vec!["0123456789abcdef"]);
    }

    #[test]
    fn display_summarises_without_payload_bytes() {
        let message = Message::Text("hello".into());
        assert_eq!(message.to_string(), "text message: hello");
        assert_eq!(message.kind(), "text");
        assert_eq!(message.type_tag(), TEXT_TYPE);
    }
}
