//! Reactions to host window events.

use nestling_common::types::{Rect, SurfaceId, WindowId};
use nestling_common::CompositorError;

use super::{Compositor, WindowKind};
use crate::chrome::Chrome;
use crate::geometry::scale_factor;
use crate::host::HostEvent;

impl Compositor {
    pub(super) fn handle_host(&mut self, event: HostEvent) {
        match event {
            HostEvent::WindowGeometryChanged { window, geometry } => {
                self.on_window_geometry(window, geometry);
            }
            HostEvent::ScaleFactorChanged { window, ratio } => {
                self.on_scale_factor(window, ratio);
            }
            HostEvent::CloseRequested { window } => self.on_close_requested(window),
            HostEvent::WindowDestroyed { window } => self.on_window_destroyed(window),
        }
    }

    /// The surface shown in `window`, if any.
    fn window_surface(&self, window: WindowId) -> Option<SurfaceId> {
        let record = self.windows.get(&window)?;
        match record.kind {
            WindowKind::Popup { surface, .. } => Some(surface),
            WindowKind::Primary | WindowKind::Toplevel => self
                .outputs
                .get(&record.output)?
                .chrome()
                .map(|chrome| chrome.surface()),
        }
    }

    fn on_window_geometry(&mut self, window: WindowId, geometry: Rect) {
        let Some(record) = self.windows.get_mut(&window) else {
            tracing::trace!(%window, "geometry for unknown window");
            return;
        };
        record.geometry = geometry;
        let record = *record;

        if !matches!(record.kind, WindowKind::Popup { .. }) {
            if let Some(output) = self.outputs.get_mut(&record.output) {
                output.set_geometry(geometry, self.client.as_mut());
            }
        }
        if let Some(surface) = self.window_surface(window) {
            self.with_chrome(surface, |chrome, ctx, _| {
                chrome.on_window_size(geometry.size(), ctx);
            });
        }
    }

    /// Republish the output, then resync every chrome that draws at its
    /// scale: the top-level in the window and the popups anchored on it.
    fn on_scale_factor(&mut self, window: WindowId, ratio: f64) {
        let Some(record) = self.windows.get(&window).copied() else {
            return;
        };
        if matches!(record.kind, WindowKind::Popup { .. }) {
            return;
        }
        let Some(output) = self.outputs.get_mut(&record.output) else {
            return;
        };
        if !output.set_scale(scale_factor(ratio), self.client.as_mut()) {
            return;
        }

        let surfaces: Vec<SurfaceId> = output
            .chrome()
            .map(Chrome::surface)
            .into_iter()
            .chain(
                self.popups
                    .values()
                    .filter(|chrome| chrome.output() == record.output)
                    .map(Chrome::surface),
            )
            .collect();
        for surface in surfaces {
            let window_size = self
                .surface_window(surface)
                .and_then(|window| self.windows.get(&window))
                .map(|record| record.geometry.size())
                .unwrap_or_default();
            self.with_chrome(surface, |chrome, ctx, state| {
                chrome.rescale(state, window_size, ctx);
            });
        }
    }

    fn on_close_requested(&mut self, window: WindowId) {
        let Some(surface) = self.window_surface(window) else {
            tracing::debug!(
                error = %CompositorError::UnknownWindow(window),
                "close request without a surface"
            );
            return;
        };
        tracing::info!(%window, %surface, "forwarding close request to client");
        self.with_chrome(surface, |chrome, ctx, _| chrome.request_close(ctx));
    }

    /// A host window went away underneath us.
    fn on_window_destroyed(&mut self, window: WindowId) {
        let Some(record) = self.windows.get(&window).copied() else {
            return;
        };
        tracing::debug!(%window, kind = ?record.kind, "host window destroyed");
        match record.kind {
            WindowKind::Primary => {
                if self.primary == Some(record.output) {
                    self.primary = None;
                    self.widget = None;
                }
                self.retire_output(record.output);
            }
            WindowKind::Toplevel => self.retire_output(record.output),
            WindowKind::Popup { surface, .. } => {
                self.windows.remove(&window);
                if let Some(chrome) = self.popups.remove(&surface) {
                    chrome.detach(&self.ui);
                    self.forget_surface_window(surface, window);
                }
            }
        }
    }
}
