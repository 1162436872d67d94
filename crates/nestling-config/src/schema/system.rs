//! Logging configuration types.

use serde::{Deserialize, Serialize};

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[derive(Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// `tracing_subscriber::EnvFilter` directive for the nestling crates.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "nestling=debug",
            LogLevel::Info => "nestling=info",
            LogLevel::Warning => "nestling=warn",
            LogLevel::Error => "nestling=error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
