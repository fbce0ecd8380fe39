//! Configuration resolution for msgapi.
//!
//! Implements layered config resolution:
//! 1. Built-in defaults
//! 2. Optional JSON settings file
//! 3. Environment variables (highest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

const ENV_MAX_TEXT_BYTES: &str = "MSGAPI_MAX_TEXT_BYTES";
const ENV_LOG_FILTER: &str = "MSGAPI_LOG_FILTER";
const ENV_LOG_JSON: &str = "MSGAPI_LOG_JSON";

/// Complete msgapi configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub envelope: EnvelopeConfig,
    #[serde(default)]
    pub logging: LogConfig,
}

/// Envelope service limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EnvelopeConfig {
    /// Reject outgoing texts longer than this many UTF-8 bytes.
    /// Unset by default; the gateway itself enforces
    /// [`crate::message::RECOMMENDED_MAX_TEXT_BYTES`].
    #[serde(default)]
    pub max_text_bytes: Option<usize>,
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON log lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "msgapi=info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

/// Load configuration: defaults, then `path` if given, then the process
/// environment.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_config_file(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, |name| std::env::var(name).ok())?;
    Ok(config)
}

/// Read a JSON settings file. Missing sections and fields take defaults.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply `MSGAPI_*` overrides, reading variables through `lookup`.
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(ENV_MAX_TEXT_BYTES) {
        let max = val.trim().parse::<usize>().map_err(|e| {
            Error::Config(format!("{ENV_MAX_TEXT_BYTES}={val:?} is not a byte count: {e}"))
        })?;
        config.envelope.max_text_bytes = Some(max);
    }
    if let Some(val) = lookup(ENV_LOG_FILTER) {
        config.logging.filter = val;
    }
    if let Some(val) = lookup(ENV_LOG_JSON) {
        config.logging.json = parse_bool(&val)
            .ok_or_else(|| Error::Config(format!("{ENV_LOG_JSON}={val:?} is not a boolean")))?;
    }
    Ok(())
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
