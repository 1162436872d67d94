//! Compositor and replay configuration types.

use serde::{Deserialize, Serialize};

/// Embedding compositor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Socket the client renderer connects to. `None` picks an anonymous name.
    pub socket_name: Option<String>,
    /// Capacity of the embedding event bus (valid range: 1-4096).
    pub event_capacity: u32,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            socket_name: None,
            event_capacity: 64,
        }
    }
}

/// Settings for `nestling replay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// How long the host waits for the compositor to go quiet after each
    /// replayed event, in milliseconds (valid range: 1-5000).
    pub settle_timeout_ms: u32,
    /// Device pixel ratio of headless windows (valid range: 1.0-4.0).
    pub device_pixel_ratio: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            settle_timeout_ms: 50,
            device_pixel_ratio: 1.0,
        }
    }
}
