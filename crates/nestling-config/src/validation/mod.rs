//! Full configuration validation.
//!
//! Validates numeric ranges and the socket name format, collecting every
//! problem into a single `ConfigError`.

mod helpers;


use std::sync::LazyLock;

use nestling_common::ConfigError;
use regex::Regex;

use crate::schema::NestlingConfig;

use helpers::check_range;

/// Socket names live in the runtime directory; path separators are not allowed.
static SOCKET_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").unwrap());

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &NestlingConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    if let Some(name) = &config.compositor.socket_name {
        if !is_valid_socket_name(name) {
            errors.push(format!(
                "compositor.socket_name = {name:?} must match [A-Za-z0-9._-]+"
            ));
        }
    }
    check_range(
        &mut errors,
        "compositor.event_capacity",
        config.compositor.event_capacity,
        1..=4096,
    );

    check_range(
        &mut errors,
        "replay.settle_timeout_ms",
        config.replay.settle_timeout_ms,
        1..=5000,
    );
    check_range(
        &mut errors,
        "replay.device_pixel_ratio",
        config.replay.device_pixel_ratio,
        1.0..=4.0,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

/// Whether `name` is usable as an embedding socket name.
pub fn is_valid_socket_name(name: &str) -> bool {
    name != "." && name != ".." && SOCKET_NAME_RE.is_match(name)
}
