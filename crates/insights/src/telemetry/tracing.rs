//! Structured logging setup.
//!
//! Installs a `tracing-subscriber` fmt layer filtered by an `EnvFilter`. `RUST_LOG` takes
//! precedence over the configured level.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{InsightError, Result};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. `perf_insights=debug`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Include the event target in each line.
    #[serde(default = "default_with_target")]
    pub with_target: bool,

    /// Colorize output.
    #[serde(default)]
    pub ansi: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_with_target() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            with_target: default_with_target(),
            ansi: false,
        }
    }
}

impl TelemetryConfig {
    /// Build the filter, preferring `RUST_LOG` when it is set and valid.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.log_level).map_err(|e| {
                InsightError::Configuration(format!(
                    "invalid log level '{}': {}",
                    self.log_level, e
                ))
            }),
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`InsightError::Configuration`] when the level directive is invalid or a global
/// subscriber is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<()> {
    let filter = config.env_filter()?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(config.with_target)
                .with_ansi(config.ansi),
        )
        .with(filter)
        .try_init()
        .map_err(|e| InsightError::Configuration(format!("tracing already initialized: {}", e)))
}
