//! Box envelopes for gateway messages, files and images.
//!
//! Messages are serialized, padded and sealed into a public-key box. Files
//! and thumbnails are sealed into secret boxes under a fresh single-use key
//! with fixed nonces; images are boxed raw under a random nonce.

use msgapi_crypto::{
    CryptoProvider, KEY_SIZE, NaclProvider, Nonce, SymmetricKey, bytes_to_hex, hex_to_array,
    key_from_slice, nonce_from_slice,
};
use tracing::{debug, warn};

use crate::config::EnvelopeConfig;
use crate::error::{Error, Result};
use crate::message::{self, BLOB_ID_LEN, FileMessage, ImageMessage, Message};
use crate::padding;

const fn fixed_nonce(last: u8) -> Nonce {
    let mut nonce = [0u8; msgapi_crypto::NONCE_SIZE];
    nonce[msgapi_crypto::NONCE_SIZE - 1] = last;
    nonce
}

/// Nonce for file blobs. Safe to reuse because every file gets a fresh key.
pub const FILE_NONCE: Nonce = fixed_nonce(0x01);

/// Nonce for thumbnail blobs. Differs from [`FILE_NONCE`] so a thumbnail
/// ciphertext never opens on the file path under the shared key.
pub const FILE_THUMBNAIL_NONCE: Nonce = fixed_nonce(0x02);

/// Outcome of encrypting a blob.
#[derive(Clone)]
pub struct EncryptResult {
    ciphertext: Vec<u8>,
    key: Option<SymmetricKey>,
    nonce: Nonce,
}

impl std::fmt::Debug for EncryptResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptResult")
            .field("size", &self.size())
            .field("key", &self.key.map(|_| "[REDACTED]"))
            .field("nonce", &bytes_to_hex(&self.nonce))
            .finish_non_exhaustive()
    }
}

impl EncryptResult {
    /// Rebuild a result from stored parts, e.g. a blob uploaded earlier.
    ///
    /// When only the nonce and size of an image were kept, build a
    /// [`Message::Image`] directly and pass it to
    /// [`EnvelopeService::encrypt_message`] instead.
    pub const fn new(ciphertext: Vec<u8>, key: Option<SymmetricKey>, nonce: Nonce) -> Self {
        Self {
            ciphertext,
            key,
            nonce,
        }
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn into_ciphertext(self) -> Vec<u8> {
        self.ciphertext
    }

    /// Symmetric key; `None` for box-mode results.
    pub const fn key(&self) -> Option<&SymmetricKey> {
        self.key.as_ref()
    }

    pub const fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// Ciphertext length in bytes.
    pub fn size(&self) -> usize {
        self.ciphertext.len()
    }
}

/// Blob reference returned by the blob server after an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Blob id, hex.
    pub blob_id: String,
}

impl UploadResult {
    pub fn new(blob_id: impl Into<String>) -> Self {
        Self {
            blob_id: blob_id.into(),
        }
    }
}

/// Metadata describing a file before upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAnalysis {
    pub mime_type: String,
    pub file_name: String,
    /// Size of the unencrypted file in bytes.
    pub size: u64,
}

/// Encrypts and decrypts gateway envelopes with an explicitly supplied
/// crypto provider.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeService<P = NaclProvider> {
    provider: P,
    config: EnvelopeConfig,
}

impl<P: CryptoProvider> EnvelopeService<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, EnvelopeConfig::default())
    }

    pub const fn with_config(provider: P, config: EnvelopeConfig) -> Self {
        Self { provider, config }
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    pub const fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    /// Encrypt a text message.
    pub fn encrypt_text(
        &self,
        text: &str,
        sender_private_key: &[u8],
        recipient_public_key: &[u8],
        nonce: &[u8],
    ) -> Result<Vec<u8>> {
        if let Some(max) = self.config.max_text_bytes {
            if text.len() > max {
                return Err(Error::InvalidInput(format!(
                    "text of {} bytes exceeds limit of {max}",
                    text.len()
                )));
            }
        }
        self.encrypt_message(
            &Message::Text(text.to_string()),
            sender_private_key,
            recipient_public_key,
            nonce,
        )
    }

    /// Encrypt an image message referencing an uploaded, boxed image.
    ///
    /// `image` is the result of [`Self::encrypt_image`] for the uploaded blob.
    pub fn encrypt_image_message(
        &self,
        upload: &UploadResult,
        image: &EncryptResult,
        sender_private_key: &[u8],
        recipient_public_key: &[u8],
        nonce: &[u8],
    ) -> Result<Vec<u8>> {
        let blob_id = hex_to_array::<BLOB_ID_LEN>(&upload.blob_id)?;
        let size = u32::try_from(image.size()).map_err(|_| {
            Error::InvalidInput(format!("image of {} bytes is too large", image.size()))
        })?;
        let message = Message::Image(ImageMessage {
            blob_id,
            size,
            nonce: *image.nonce(),
        });
        self.encrypt_message(&message, sender_private_key, recipient_public_key, nonce)
    }

    /// Encrypt a file message referencing an uploaded file and, optionally,
    /// its thumbnail.
    ///
    /// The thumbnail id is only included when it is non-empty.
    #[allow(clippy::too_many_arguments)]
    pub fn encrypt_file_message(
        &self,
        upload: &UploadResult,
        file: &EncryptResult,
        thumbnail: Option<&UploadResult>,
        analysis: &FileAnalysis,
        sender_private_key: &[u8],
        recipient_public_key: &[u8],
        nonce: &[u8],
    ) -> Result<Vec<u8>> {
        let key = file
            .key()
            .ok_or_else(|| Error::InvalidInput("file result carries no symmetric key".into()))?;
        let message = Message::File(FileMessage {
            blob_id: upload.blob_id.clone(),
            key: bytes_to_hex(key),
            mime_type: analysis.mime_type.clone(),
            file_name: analysis.file_name.clone(),
            size: analysis.size,
            index: 0,
            thumbnail_blob_id: thumbnail
                .filter(|thumb| !thumb.blob_id.is_empty())
                .map(|thumb| thumb.blob_id.clone()),
        });
        self.encrypt_message(&message, sender_private_key, recipient_public_key, nonce)
    }

    /// Serialize, pad and box any message.
    pub fn encrypt_message(
        &self,
        message: &Message,
        sender_private_key: &[u8],
        recipient_public_key: &[u8],
        nonce: &[u8],
    ) -> Result<Vec<u8>> {
        let sender_private_key = key_from_slice(sender_private_key)?;
        let recipient_public_key = key_from_slice(recipient_public_key)?;
        let nonce = nonce_from_slice(nonce)?;

        let payload = message::encode(message)?;
        let pad_len = padding::generate_pad_len(&self.provider)?;
        let padded = padding::pad(payload, pad_len);
        debug!(
            kind = message.kind(),
            padded_len = padded.len(),
            "sealing message box"
        );
        Ok(self
            .provider
            .seal_box(&padded, &nonce, &sender_private_key, &recipient_public_key)?)
    }

    /// Open a message box and decode the message inside.
    pub fn decrypt(
        &self,
        box_data: &[u8],
        recipient_private_key: &[u8],
        sender_public_key: &[u8],
        nonce: &[u8],
    ) -> Result<Message> {
        let recipient_private_key = key_from_slice(recipient_private_key)?;
        let sender_public_key = key_from_slice(sender_public_key)?;
        let nonce = nonce_from_slice(nonce)?;

        let data = self
            .provider
            .open_box(box_data, &recipient_private_key, &sender_public_key, &nonce)
            .inspect_err(|_| debug!(box_len = box_data.len(), "message box failed to open"))?;
        if data.is_empty() {
            return Err(Error::DecryptionFailed);
        }

        let payload = padding::strip(data)?;
        let message = message::decode(&payload).inspect_err(|e| {
            warn!(
                type_tag = payload[0],
                payload_len = payload.len(),
                error = %e,
                "rejected decrypted message"
            );
        })?;
        debug!(kind = message.kind(), "decrypted message");
        Ok(message)
    }

    /// Encrypt a file under a fresh random key.
    pub fn encrypt_file(&self, data: &[u8]) -> Result<EncryptResult> {
        let key = self.provider.symmetric_key()?;
        let ciphertext = self.provider.seal_secret_box(data, &FILE_NONCE, &key)?;
        debug!(size = ciphertext.len(), "encrypted file blob");
        Ok(EncryptResult::new(ciphertext, Some(key), FILE_NONCE))
    }

    pub fn decrypt_file(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        let key = key_from_slice(key)?;
        Ok(self.provider.open_secret_box(data, &FILE_NONCE, &key)?)
    }

    /// Encrypt a thumbnail under the key of the file it belongs to.
    pub fn encrypt_file_thumbnail(&self, data: &[u8], key: &[u8]) -> Result<EncryptResult> {
        let key: [u8; KEY_SIZE] = key_from_slice(key)?;
        let ciphertext = self
            .provider
            .seal_secret_box(data, &FILE_THUMBNAIL_NONCE, &key)?;
        debug!(size = ciphertext.len(), "encrypted thumbnail blob");
        Ok(EncryptResult::new(ciphertext, Some(key), FILE_THUMBNAIL_NONCE))
    }

    pub fn decrypt_file_thumbnail(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        let key = key_from_slice(key)?;
        Ok(self
            .provider
            .open_secret_box(data, &FILE_THUMBNAIL_NONCE, &key)?)
    }

    /// Box raw image bytes under a freshly generated nonce.
    ///
    /// No type tag and no padding are added.
    pub fn encrypt_image(
        &self,
        data: &[u8],
        sender_private_key: &[u8],
        recipient_public_key: &[u8],
    ) -> Result<EncryptResult> {
        let sender_private_key = key_from_slice(sender_private_key)?;
        let recipient_public_key = key_from_slice(recipient_public_key)?;
        let nonce = self.provider.random_nonce()?;
        let ciphertext =
            self.provider
                .seal_box(data, &nonce, &sender_private_key, &recipient_public_key)?;
        debug!(size = ciphertext.len(), "encrypted image blob");
        Ok(EncryptResult::new(ciphertext, None, nonce))
    }

    pub fn decrypt_image(
        &self,
        data: &[u8],
        sender_public_key: &[u8],
        recipient_private_key: &[u8],
        nonce: &[u8],
    ) -> Result<Vec<u8>> {
        let sender_public_key = key_from_slice(sender_public_key)?;
        let recipient_private_key = key_from_slice(recipient_private_key)?;
        let nonce = nonce_from_slice(nonce)?;
        Ok(self
            .provider
            .open_box(data, &recipient_private_key, &sender_public_key, &nonce)?)
    }
}
