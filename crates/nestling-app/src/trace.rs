//! Recorded session traces.
//!
//! A trace is a JSON document describing the host side of a session (an
//! optional widget to bind as the primary output, the screen's device pixel
//! ratio) and the client's protocol events in the order they arrived:
//!
//! ```json
//! {
//!   "widget": { "x": 0, "y": 0, "width": 800, "height": 600 },
//!   "device_pixel_ratio": 2.0,
//!   "events": [
//!     { "event": "toplevel_created", "surface": 1 },
//!     { "event": "title_changed", "surface": 1, "title": "Editor" }
//!   ]
//! }
//! ```

use std::path::Path;

use nestling_common::types::Rect;
use nestling_common::NestlingError;
use nestling_compositor::ProtocolEvent;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Trace {
    /// Geometry of the host widget, in device pixels.
    pub widget: Option<Rect>,
    /// Overrides the configured ratio when present.
    pub device_pixel_ratio: Option<f64>,
    pub events: Vec<ProtocolEvent>,
}

impl Trace {
    pub fn from_json(json: &str) -> Result<Self, NestlingError> {
        serde_json::from_str(json).map_err(|e| NestlingError::Trace(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, NestlingError> {
        let content = std::fs::read_to_string(path)?;
        let trace = Self::from_json(&content)
            .map_err(|e| NestlingError::Trace(format!("{}: {e}", path.display())))?;
        tracing::info!(
            path = %path.display(),
            events = trace.events.len(),
            "loaded trace"
        );
        Ok(trace)
    }
}
