//! Popup windows.

use nestling_common::types::{Point, Rect, Size, SurfaceId, SurfaceRole, WindowId};
use nestling_common::{CompositorError, EmbedEvent};

use super::{Compositor, SurfaceRecord, WindowKind, WindowRecord};
use crate::chrome::{Chrome, ChromeParams, SyncContext};
use crate::dispatch::{PopupAnchor, UiCommand};
use crate::surface::SurfaceState;

impl Compositor {
    pub(super) fn on_popup_created(&mut self, surface: SurfaceId, parent: SurfaceId, position: Point) {
        if self.surfaces.contains_key(&surface) {
            tracing::warn!(%surface, "duplicate surface id, ignoring");
            return;
        }
        let Some((parent_window, parent_record)) = self
            .surfaces
            .get(&parent)
            .and_then(|record| record.window)
            .and_then(|window| Some((window, *self.windows.get(&window)?)))
        else {
            tracing::warn!(
                error = %CompositorError::UnknownParent { surface, parent },
                "dropping popup"
            );
            return;
        };

        let anchor = match parent_record.kind {
            WindowKind::Primary => PopupAnchor::HostSurface,
            WindowKind::Toplevel | WindowKind::Popup { .. } => PopupAnchor::Window(parent_window),
        };
        let state = SurfaceState::popup(parent, position);

        let window = WindowId::next();
        self.ui.send(UiCommand::CreateWindow {
            window,
            role: SurfaceRole::Popup,
        });
        self.windows.insert(
            window,
            WindowRecord {
                output: parent_record.output,
                geometry: Rect::default(),
                kind: WindowKind::Popup { surface, anchor },
            },
        );

        let mut ctx = SyncContext {
            ui: &self.ui,
            deferred: &mut self.deferred,
            scale: self
                .outputs
                .get(&parent_record.output)
                .map_or(1, |output| output.scale()),
        };
        let params = ChromeParams {
            surface,
            role: SurfaceRole::Popup,
            output: parent_record.output,
            window,
            follows_size: true,
        };
        let mut chrome = Chrome::attach(params, &state, Size::default(), &mut ctx);
        let ready = chrome.take_surface_ready();
        self.popups.insert(surface, chrome);
        self.surfaces.insert(
            surface,
            SurfaceRecord {
                state,
                window: Some(window),
            },
        );

        tracing::info!(%surface, %parent, %window, ?anchor, "popup attached");
        self.events
            .publish(EmbedEvent::SurfaceAttached { surface, window });
        if ready {
            self.on_surface_ready(surface, window);
        }
    }

    pub(super) fn release_popup(&mut self, surface: SurfaceId, window: WindowId) {
        if let Some(chrome) = self.popups.remove(&surface) {
            chrome.detach(&self.ui);
            self.events
                .publish(EmbedEvent::SurfaceDetached { surface, window });
        }
        self.windows.remove(&window);
        self.ui.send(UiCommand::DestroyWindow { window });
    }
}
