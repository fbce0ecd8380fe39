//! `msgapi` Core Library
//!
//! The message envelope layer of the gateway SDK:
//! - Typed messages and their binary/JSON payload codec
//! - Self-describing random padding
//! - Box and secret box envelopes for messages, files and images
//! - Configuration resolution and tracing setup
//! - Common error types

pub mod config;
pub mod envelope;
pub mod error;
pub mod message;
pub mod padding;
pub mod tracing_init;

pub use config::{Config, EnvelopeConfig, LogConfig};
pub use envelope::{
    EncryptResult, EnvelopeService, FILE_NONCE, FILE_THUMBNAIL_NONCE, FileAnalysis, UploadResult,
};
pub use error::{Error, Result};
pub use message::{
    DeliveryReceipt, FileMessage, ImageMessage, LocationMessage, Message, ReceiptType,
};
