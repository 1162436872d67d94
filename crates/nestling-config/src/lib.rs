//! Nestling configuration system.
//!
//! TOML-based configuration for the embedding compositor and its replay
//! tooling. All sections use sensible defaults so partial configs work out
//! of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use nestling_config::{config_to_json, load_config};
//!
//! let config = load_config().expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{NestlingConfig, CONFIG_SCHEMA_VERSION};

use nestling_common::ConfigError;

/// Load config from the platform default path and validate it.
pub fn load_config() -> Result<NestlingConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &NestlingConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
