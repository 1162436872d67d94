//! Per-surface state mirrored from the protocol layer.

use nestling_common::types::{Point, Rect, Size, SurfaceId, SurfaceRole};

use crate::geometry::client_rect;
use crate::protocol::ProtocolEvent;

/// Which observable attribute an event touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceChange {
    /// Window geometry or destination size; the effective client rect may differ.
    Geometry,
    Title,
    Fullscreen,
    None,
}

/// Last known attributes of a client surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceState {
    pub role: SurfaceRole,
    pub parent: Option<SurfaceId>,
    /// Unconstrained popup position relative to the parent, logical units.
    pub position: Point,
    pub title: String,
    pub fullscreen: bool,
    pub window_geometry: Option<Rect>,
    pub destination_size: Size,
}

impl SurfaceState {
    pub fn toplevel() -> Self {
        Self {
            role: SurfaceRole::Toplevel,
            parent: None,
            position: Point::default(),
            title: String::new(),
            fullscreen: false,
            window_geometry: None,
            destination_size: Size::default(),
        }
    }

    pub fn popup(parent: SurfaceId, position: Point) -> Self {
        Self {
            role: SurfaceRole::Popup,
            parent: Some(parent),
            position,
            ..Self::toplevel()
        }
    }

    pub fn is_toplevel(&self) -> bool {
        self.role == SurfaceRole::Toplevel
    }

    /// The rectangle the client wants shown.
    pub fn client_rect(&self) -> Rect {
        client_rect(self.window_geometry, self.destination_size)
    }

    /// Fold an attribute event into the state.
    ///
    /// Lifecycle events are not attribute changes and report `None`.
    pub fn apply(&mut self, event: &ProtocolEvent) -> SurfaceChange {
        match event {
            ProtocolEvent::WindowGeometryChanged { geometry, .. } => {
                self.window_geometry = *geometry;
                SurfaceChange::Geometry
            }
            ProtocolEvent::DestinationSizeChanged { size, .. } => {
                self.destination_size = *size;
                SurfaceChange::Geometry
            }
            ProtocolEvent::TitleChanged { title, .. } => {
                self.title.clone_from(title);
                SurfaceChange::Title
            }
            ProtocolEvent::FullscreenChanged { fullscreen, .. } => {
                self.fullscreen = *fullscreen;
                SurfaceChange::Fullscreen
            }
            ProtocolEvent::ToplevelCreated { .. }
            | ProtocolEvent::PopupCreated { .. }
            | ProtocolEvent::SurfaceDestroyed { .. } => SurfaceChange::None,
        }
    }
}
