//! Session and socket identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A fresh random identifier in hyphenated form.
pub fn new_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Eight hex digits, short enough for socket names and log lines.
pub fn new_correlation_id() -> String {
    let mut simple = Uuid::new_v4().simple().to_string();
    simple.truncate(8);
    simple
}

/// Anonymous socket name used when the embedder does not supply one.
pub fn default_socket_name() -> String {
    format!("nestling-{}", new_correlation_id())
}

/// Identifies one embedding session (one Compositor lifetime) in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
