//! Tracing/logging initialization for applications embedding msgapi.
//!
//! Sets up `tracing_subscriber` with an env-filter and optional JSON output.
//! The library itself only emits events; installing a subscriber is left to
//! the application.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;
use crate::error::{Error, Result};

/// Build the filter: `RUST_LOG` when set, otherwise `config.filter`.
fn env_filter(config: &LogConfig) -> Result<EnvFilter> {
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| config.filter.clone());
    EnvFilter::try_new(&directives)
        .map_err(|e| Error::Config(format!("invalid log filter {directives:?}: {e}")))
}

/// Initialise the global tracing subscriber.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    let env_filter = env_filter(config)?;
    let installed = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };
    installed.map_err(|e| Error::Config(format!("tracing subscriber already set: {e}")))
}
