//! Top-level placement and teardown.

use nestling_common::types::{OutputId, Rect, SurfaceId, SurfaceRole, WindowId};
use nestling_common::EmbedEvent;

use super::{Compositor, SurfaceRecord, WindowKind};
use crate::chrome::SyncContext;
use crate::dispatch::UiCommand;
use crate::surface::SurfaceState;

impl Compositor {
    pub(super) fn on_toplevel_created(&mut self, surface: SurfaceId) {
        if self.surfaces.contains_key(&surface) {
            tracing::warn!(%surface, "duplicate surface id, ignoring");
            return;
        }
        self.surfaces.insert(
            surface,
            SurfaceRecord {
                state: SurfaceState::toplevel(),
                window: None,
            },
        );

        let output = match self.vacant_active_output() {
            Some(output) => {
                tracing::debug!(%surface, %output, "reusing output");
                output
            }
            None => {
                let window = WindowId::next();
                self.ui.send(UiCommand::CreateWindow {
                    window,
                    role: SurfaceRole::Toplevel,
                });
                let output = self.create_output(
                    window,
                    WindowKind::Toplevel,
                    Rect::default(),
                    self.host_scale,
                );
                if self.primary.is_none() && self.warm.is_none() {
                    self.warm = Some(output);
                }
                output
            }
        };
        self.attach_toplevel(output, surface);
    }

    /// The primary output, or the warm one while no widget is bound, if it
    /// has no chrome.
    fn vacant_active_output(&self) -> Option<OutputId> {
        let active = self.primary.or(self.warm)?;
        let output = self.outputs.get(&active)?;
        (!output.has_chrome()).then_some(active)
    }

    fn attach_toplevel(&mut self, output_id: OutputId, surface: SurfaceId) {
        let Some(record) = self.surfaces.get_mut(&surface) else {
            return;
        };
        let Some(output) = self.outputs.get_mut(&output_id) else {
            return;
        };
        let window = output.window();
        let mut ctx = SyncContext {
            ui: &self.ui,
            deferred: &mut self.deferred,
            scale: output.scale(),
        };
        let chrome = output.attach(surface, &record.state, &mut ctx);
        let ready = chrome.take_surface_ready();
        record.window = Some(window);

        tracing::info!(%surface, %window, output = %output_id, "top-level attached");
        self.events
            .publish(EmbedEvent::SurfaceAttached { surface, window });
        if ready {
            self.on_surface_ready(surface, window);
        }
    }

    pub(super) fn on_surface_destroyed(&mut self, surface: SurfaceId) {
        let Some(record) = self.surfaces.remove(&surface) else {
            tracing::debug!(%surface, "destroy for unknown surface");
            return;
        };
        let Some(window) = record.window else {
            return;
        };
        match record.state.role {
            SurfaceRole::Toplevel => self.release_toplevel(surface, window),
            SurfaceRole::Popup => self.release_popup(surface, window),
        }
    }

    fn release_toplevel(&mut self, surface: SurfaceId, window: WindowId) {
        let Some(record) = self.windows.get(&window).copied() else {
            return;
        };
        let Some(output) = self.outputs.get_mut(&record.output) else {
            return;
        };
        if output.chrome().map(|c| c.surface()) != Some(surface) {
            return;
        }
        output.detach(&self.ui);
        self.events
            .publish(EmbedEvent::SurfaceDetached { surface, window });

        match record.kind {
            // The widget stays bound, ready for the next top-level.
            WindowKind::Primary | WindowKind::Popup { .. } => {}
            WindowKind::Toplevel if self.primary.is_none() && self.warm == Some(record.output) => {
                tracing::debug!(%window, "keeping warm window for reuse");
                self.ui.send(UiCommand::Hide { window });
            }
            WindowKind::Toplevel => {
                self.retire_output(record.output);
                self.ui.send(UiCommand::DestroyWindow { window });
            }
        }
    }
}
