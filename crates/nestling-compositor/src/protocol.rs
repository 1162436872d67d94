//! Boundary with the display-protocol delivery layer.
//!
//! The wire format is somebody else's problem: inbound requests arrive as
//! [`ProtocolEvent`]s and outbound traffic leaves through a [`ShellClient`].

use std::sync::{Arc, Mutex, PoisonError};

use nestling_common::types::{OutputId, Point, Rect, Size, SurfaceId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A request from the client, already decoded by the protocol layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProtocolEvent {
    /// A new top-level surface was created.
    ToplevelCreated { surface: SurfaceId },
    /// A new popup surface was created. `position` is the unconstrained
    /// position relative to the parent, in logical units.
    PopupCreated {
        surface: SurfaceId,
        parent: SurfaceId,
        position: Point,
    },
    /// The client destroyed the surface handle.
    SurfaceDestroyed { surface: SurfaceId },
    /// The client set (or cleared) its window geometry.
    WindowGeometryChanged {
        surface: SurfaceId,
        geometry: Option<Rect>,
    },
    /// The surface's content size changed.
    DestinationSizeChanged { surface: SurfaceId, size: Size },
    TitleChanged { surface: SurfaceId, title: String },
    FullscreenChanged { surface: SurfaceId, fullscreen: bool },
}

impl ProtocolEvent {
    pub fn surface(&self) -> SurfaceId {
        match self {
            ProtocolEvent::ToplevelCreated { surface }
            | ProtocolEvent::PopupCreated { surface, .. }
            | ProtocolEvent::SurfaceDestroyed { surface }
            | ProtocolEvent::WindowGeometryChanged { surface, .. }
            | ProtocolEvent::DestinationSizeChanged { surface, .. }
            | ProtocolEvent::TitleChanged { surface, .. }
            | ProtocolEvent::FullscreenChanged { surface, .. } => *surface,
        }
    }
}

/// Traffic from the compositor to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum ClientRequest {
    Close { surface: SurfaceId },
    PopupDone { surface: SurfaceId },
    Fullscreen { surface: SurfaceId, size: Size },
    OutputAdded { output: OutputId },
    OutputRemoved { output: OutputId },
    LogicalPosition { output: OutputId, position: Point },
    LogicalSize { output: OutputId, size: Size },
}

/// Delivery layer for outbound client requests.
///
/// Lives on the compositor thread; implementations must not call back into
/// the compositor.
pub trait ShellClient: Send {
    fn deliver(&mut self, request: ClientRequest);
}

/// A `ShellClient` that keeps every request in memory.
///
/// Clones share the same log, so a clone kept outside the compositor thread
/// can inspect what was sent.
#[derive(Debug, Clone, Default)]
pub struct RecordingClient {
    requests: Arc<Mutex<Vec<ClientRequest>>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far.
    pub fn requests(&self) -> Vec<ClientRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<ClientRequest> {
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *requests)
    }
}

impl ShellClient for RecordingClient {
    fn deliver(&mut self, request: ClientRequest) {
        debug!(?request, "client request");
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
    }
}
