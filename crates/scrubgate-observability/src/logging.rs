//! Logging setup
//!
//! One global `tracing` subscriber, filtered by level (overridable through
//! `RUST_LOG`) and rendered either human-readable or as JSON lines.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Invalid log format '{}'. Use 'pretty' or 'json'", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level: trace, debug, info, warn, error
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Per-request metadata events. Request text is never logged.
    #[serde(default)]
    pub log_requests: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            log_requests: false,
        }
    }
}

impl LoggingConfig {
    /// Filter built from `RUST_LOG` when set, else from the configured level
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = match self.level.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => self.level.to_lowercase(),
                _ => "info".to_string(),
            };
            EnvFilter::new(level)
        })
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_target(true);

    match config.format {
        LogFormat::Pretty => builder.try_init()?,
        LogFormat::Json => builder.json().flatten_event(true).try_init()?,
    }

    Ok(())
}
