//! In-memory `WindowHost`.
//!
//! Keeps window state in a map and queues the `HostEvent`s a real toolkit
//! would emit. Used by the replay binary and by tests.

use std::collections::BTreeMap;

use nestling_common::types::{Point, Rect, Size, SurfaceId, SurfaceRole, WindowId};
use serde::Serialize;
use tracing::trace;

use super::{HostEvent, HostWidget, TransientParent, WindowHost};

/// State of one headless window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeadlessWindow {
    /// `None` for windows adopted from the application.
    pub role: Option<SurfaceRole>,
    pub geometry: Rect,
    pub title: String,
    pub visible: bool,
    pub minimum_size: Option<Size>,
    pub maximum_size: Option<Size>,
    pub transient_parent: Option<TransientParent>,
    pub popup: bool,
    pub transparent: bool,
    pub surfaces: Vec<SurfaceId>,
    pub content_offset: Point,
}

impl HeadlessWindow {
    fn constrain(&self, size: Size) -> Size {
        let mut size = size;
        if let Some(min) = self.minimum_size {
            size.width = size.width.max(min.width);
            size.height = size.height.max(min.height);
        }
        if let Some(max) = self.maximum_size {
            size.width = size.width.min(max.width);
            size.height = size.height.min(max.height);
        }
        size
    }
}

pub struct HeadlessHost {
    windows: BTreeMap<WindowId, HeadlessWindow>,
    events: Vec<HostEvent>,
    device_pixel_ratio: f64,
    surface_origin: Point,
}

impl HeadlessHost {
    /// A host whose single screen has the given device pixel ratio.
    pub fn new(device_pixel_ratio: f64) -> Self {
        Self {
            windows: BTreeMap::new(),
            events: Vec::new(),
            device_pixel_ratio,
            surface_origin: Point::default(),
        }
    }

    /// Register the application's embedding widget and describe it for binding.
    pub fn adopt_widget(&mut self, geometry: Rect) -> HostWidget {
        let window = WindowId::next();
        self.windows.insert(
            window,
            HeadlessWindow {
                geometry,
                visible: true,
                ..HeadlessWindow::default()
            },
        );
        self.surface_origin = geometry.top_left();
        HostWidget {
            window,
            geometry,
            device_pixel_ratio: self.device_pixel_ratio,
        }
    }

    pub fn window(&self, window: WindowId) -> Option<&HeadlessWindow> {
        self.windows.get(&window)
    }

    pub fn windows(&self) -> impl Iterator<Item = (WindowId, &HeadlessWindow)> {
        self.windows.iter().map(|(id, window)| (*id, window))
    }

    /// Drain the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    /// Resize as if the user dragged the window border.
    pub fn user_resize(&mut self, window: WindowId, size: Size) {
        self.resize(window, size);
    }

    /// Move a window to a screen with a different pixel ratio.
    pub fn move_to_screen(&mut self, window: WindowId, ratio: f64) {
        if self.windows.contains_key(&window) {
            self.events.push(HostEvent::ScaleFactorChanged { window, ratio });
        }
    }

    fn set_geometry(&mut self, window: WindowId, geometry: Rect) {
        let Some(state) = self.windows.get_mut(&window) else {
            return;
        };
        if state.geometry == geometry {
            return;
        }
        state.geometry = geometry;
        self.events
            .push(HostEvent::WindowGeometryChanged { window, geometry });
    }

    fn apply_constraints(&mut self, window: WindowId) {
        let Some(state) = self.windows.get(&window) else {
            return;
        };
        let size = state.constrain(state.geometry.size());
        let geometry = Rect::from_parts(state.geometry.top_left(), size);
        self.set_geometry(window, geometry);
    }
}

impl WindowHost for HeadlessHost {
    fn create_window(&mut self, window: WindowId, role: SurfaceRole) {
        trace!(%window, ?role, "create window");
        self.windows.insert(
            window,
            HeadlessWindow {
                role: Some(role),
                ..HeadlessWindow::default()
            },
        );
        if self.device_pixel_ratio != 1.0 {
            self.events.push(HostEvent::ScaleFactorChanged {
                window,
                ratio: self.device_pixel_ratio,
            });
        }
    }

    fn destroy_window(&mut self, window: WindowId) {
        if self.windows.remove(&window).is_some() {
            trace!(%window, "destroy window");
            self.events.push(HostEvent::WindowDestroyed { window });
        }
    }

    fn has_window(&self, window: WindowId) -> bool {
        self.windows.contains_key(&window)
    }

    fn window_position(&self, window: WindowId) -> Option<Point> {
        self.windows.get(&window).map(|w| w.geometry.top_left())
    }

    fn host_surface_origin(&self) -> Point {
        self.surface_origin
    }

    fn resize(&mut self, window: WindowId, size: Size) {
        let Some(state) = self.windows.get(&window) else {
            return;
        };
        let geometry = Rect::from_parts(state.geometry.top_left(), state.constrain(size));
        self.set_geometry(window, geometry);
    }

    fn set_position(&mut self, window: WindowId, position: Point) {
        let Some(state) = self.windows.get(&window) else {
            return;
        };
        let geometry = Rect::from_parts(position, state.geometry.size());
        self.set_geometry(window, geometry);
    }

    fn set_minimum_size(&mut self, window: WindowId, size: Size) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.minimum_size = Some(size);
        }
        self.apply_constraints(window);
    }

    fn set_maximum_size(&mut self, window: WindowId, size: Size) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.maximum_size = Some(size);
        }
        self.apply_constraints(window);
    }

    fn set_title(&mut self, window: WindowId, title: &str) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.title = title.to_owned();
        }
    }

    fn set_transient_parent(&mut self, window: WindowId, parent: TransientParent) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.transient_parent = Some(parent);
        }
    }

    fn set_popup_flags(&mut self, window: WindowId) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.popup = true;
            state.transparent = true;
        }
    }

    fn show(&mut self, window: WindowId) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.visible = true;
        }
    }

    fn hide(&mut self, window: WindowId) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.visible = false;
        }
    }

    fn embed_surface(&mut self, window: WindowId, surface: SurfaceId) {
        if let Some(state) = self.windows.get_mut(&window) {
            if !state.surfaces.contains(&surface) {
                state.surfaces.push(surface);
            }
        }
    }

    fn remove_surface(&mut self, window: WindowId, surface: SurfaceId) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.surfaces.retain(|s| *s != surface);
        }
    }

    fn set_content_offset(&mut self, window: WindowId, _surface: SurfaceId, offset: Point) {
        if let Some(state) = self.windows.get_mut(&window) {
            state.content_offset = offset;
        }
    }
}
