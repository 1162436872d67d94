use std::path::PathBuf;

use crate::types::{SurfaceId, WindowId};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CompositorError {
    #[error("unknown surface: {0}")]
    UnknownSurface(SurfaceId),

    #[error("popup {surface} references unknown parent {parent}")]
    UnknownParent { surface: SurfaceId, parent: SurfaceId },

    #[error("unknown window: {0}")]
    UnknownWindow(WindowId),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to spawn compositor thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    #[error("compositor thread panicked")]
    ThreadPanicked,

    #[error("compositor thread is not running")]
    Disconnected,
}

#[derive(Debug, thiserror::Error)]
pub enum NestlingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Compositor(#[from] CompositorError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("trace error: {0}")]
    Trace(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("compositor.event_capacity".into());
        assert_eq!(
            err.to_string(),
            "config validation error: compositor.event_capacity"
        );
    }

    #[test]
    fn compositor_error_display() {
        let err = CompositorError::UnknownSurface(SurfaceId(7));
        assert_eq!(err.to_string(), "unknown surface: surface-7");

        let err = CompositorError::UnknownParent {
            surface: SurfaceId(3),
            parent: SurfaceId(9),
        };
        assert_eq!(
            err.to_string(),
            "popup surface-3 references unknown parent surface-9"
        );

        let err = CompositorError::UnknownWindow(WindowId(12));
        assert_eq!(err.to_string(), "unknown window: window-12");

        let err = CompositorError::Transport("socket in use".into());
        assert_eq!(err.to_string(), "transport error: socket in use");
    }

    #[test]
    fn nestling_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: NestlingError = config_err.into();
        assert!(matches!(err, NestlingError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn nestling_error_from_compositor() {
        let err: NestlingError = CompositorError::Disconnected.into();
        assert!(matches!(err, NestlingError::Compositor(_)));
        assert_eq!(err.to_string(), "compositor thread is not running");
    }

    #[test]
    fn nestling_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: NestlingError = io_err.into();
        assert!(matches!(err, NestlingError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn thread_spawn_keeps_source() {
        use std::error::Error;
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "no threads left");
        let err = CompositorError::ThreadSpawn(io_err);
        assert!(err.source().is_some());
    }
}
