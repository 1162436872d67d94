//! The host windowing toolkit, as seen from the UI thread.
//!
//! Everything behind [`WindowHost`] must only be touched on the UI thread;
//! the compositor reaches it through `UiCommand`s and hears back through
//! [`HostEvent`]s.

mod headless;

pub use headless::{HeadlessHost, HeadlessWindow};

use nestling_common::types::{Point, Rect, Size, SurfaceId, SurfaceRole, WindowId};
use serde::{Deserialize, Serialize};

/// The embedding widget supplied by the application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostWidget {
    /// Native window backing the widget.
    pub window: WindowId,
    pub geometry: Rect,
    pub device_pixel_ratio: f64,
}

/// Notifications from the host toolkit about windows the compositor knows.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    WindowGeometryChanged { window: WindowId, geometry: Rect },
    /// The window moved to a screen with a different device pixel ratio.
    ScaleFactorChanged { window: WindowId, ratio: f64 },
    /// The user asked to close a window that shows an embedded surface.
    CloseRequested { window: WindowId },
    WindowDestroyed { window: WindowId },
}

impl HostEvent {
    pub fn window(&self) -> WindowId {
        match self {
            HostEvent::WindowGeometryChanged { window, .. }
            | HostEvent::ScaleFactorChanged { window, .. }
            | HostEvent::CloseRequested { window }
            | HostEvent::WindowDestroyed { window } => *window,
        }
    }
}

/// Stacking parent for a popup window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "window", rename_all = "snake_case")]
pub enum TransientParent {
    /// The native top-level window that contains the embedding widget.
    HostToplevel,
    Window(WindowId),
}

/// Outcome of a native close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Let the toolkit close the window.
    Proceed,
    /// Keep the window open; the client was asked to close instead.
    Cancel,
}

/// Operations the compositor needs from the host windowing toolkit.
pub trait WindowHost {
    fn create_window(&mut self, window: WindowId, role: SurfaceRole);
    fn destroy_window(&mut self, window: WindowId);
    fn has_window(&self, window: WindowId) -> bool;
    /// Screen position of a window, if it exists.
    fn window_position(&self, window: WindowId) -> Option<Point>;
    /// Screen position of the embedding widget's top-left corner.
    fn host_surface_origin(&self) -> Point;

    fn resize(&mut self, window: WindowId, size: Size);
    fn set_position(&mut self, window: WindowId, position: Point);
    fn set_minimum_size(&mut self, window: WindowId, size: Size);
    fn set_maximum_size(&mut self, window: WindowId, size: Size);
    fn set_title(&mut self, window: WindowId, title: &str);
    fn set_transient_parent(&mut self, window: WindowId, parent: TransientParent);
    /// Mark a window as a frameless, transparent popup.
    fn set_popup_flags(&mut self, window: WindowId);
    fn show(&mut self, window: WindowId);
    fn hide(&mut self, window: WindowId);

    fn embed_surface(&mut self, window: WindowId, surface: SurfaceId);
    fn remove_surface(&mut self, window: WindowId, surface: SurfaceId);
    fn set_content_offset(&mut self, window: WindowId, surface: SurfaceId, offset: Point);
}
