//! Configuration schema types for Nestling.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod compositor;
mod system;

pub use compositor::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Nestling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct NestlingConfig {
    pub compositor: CompositorConfig,
    pub logging: LoggingConfig,
    pub replay: ReplayConfig,
}

// =============================================================================
// Tests
// =============================================================================
