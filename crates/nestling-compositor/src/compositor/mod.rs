//! The compositor: owns every Output and Chrome and reacts to protocol and
//! host events. Lives on the compositor thread.

mod host_events;
mod popup;
mod toplevel;


use std::collections::{BTreeMap, HashMap};

use nestling_common::types::{OutputId, Rect, SurfaceId, SurfaceRole, WindowId};
use nestling_common::{CompositorError, EmbedEvent, EventBus, SessionId};

use crate::chrome::{Chrome, Deferred, DeferredAction, SyncContext};
use crate::dispatch::{CompositorTask, PopupAnchor, UiCommand, UiSender};
use crate::geometry::{scale_factor, to_logical_size, to_window_point};
use crate::host::HostWidget;
use crate::output::Output;
use crate::protocol::{ClientRequest, ProtocolEvent, ShellClient};
use crate::surface::{SurfaceChange, SurfaceState};

/// What a known window is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowKind {
    /// The application's embedding widget.
    Primary,
    /// A compositor-created top-level window.
    Toplevel,
    /// A compositor-created popup window, anchored on readiness.
    Popup {
        surface: SurfaceId,
        anchor: PopupAnchor,
    },
}

#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    /// The output this window belongs to (its parent's, for popups).
    output: OutputId,
    geometry: Rect,
    kind: WindowKind,
}

#[derive(Debug)]
struct SurfaceRecord {
    state: SurfaceState,
    /// The window currently showing this surface.
    window: Option<WindowId>,
}

pub struct Compositor {
    session: SessionId,
    socket_name: String,
    client: Box<dyn ShellClient>,
    ui: UiSender,
    events: EventBus,
    widget: Option<HostWidget>,
    primary: Option<OutputId>,
    /// The first compositor-created output while no widget is bound.
    warm: Option<OutputId>,
    /// Scale new windows start with, until the host reports their own.
    host_scale: i32,
    outputs: BTreeMap<OutputId, Output>,
    windows: HashMap<WindowId, WindowRecord>,
    surfaces: HashMap<SurfaceId, SurfaceRecord>,
    popups: HashMap<SurfaceId, Chrome>,
    deferred: Vec<Deferred>,
    next_output: u32,
}

impl Compositor {
    pub fn new(
        socket_name: impl Into<String>,
        client: Box<dyn ShellClient>,
        ui: UiSender,
        events: EventBus,
    ) -> Self {
        let session = SessionId::new();
        let socket_name = socket_name.into();
        tracing::info!(%session, socket = %socket_name, "compositor started");
        Self {
            session,
            socket_name,
            client,
            ui,
            events,
            widget: None,
            primary: None,
            warm: None,
            host_scale: 1,
            outputs: BTreeMap::new(),
            windows: HashMap::new(),
            surfaces: HashMap::new(),
            popups: HashMap::new(),
            deferred: Vec::new(),
            next_output: 1,
        }
    }

    /// Device pixel ratio of the screen new windows open on.
    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.host_scale = scale_factor(ratio);
        self
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Socket clients connect to.
    pub fn socket_name(&self) -> &str {
        &self.socket_name
    }

    pub fn widget(&self) -> Option<&HostWidget> {
        self.widget.as_ref()
    }

    pub fn primary_output(&self) -> Option<OutputId> {
        self.primary
    }

    pub fn output(&self, id: OutputId) -> Option<&Output> {
        self.outputs.get(&id)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.values()
    }

    /// Window currently showing `surface`.
    pub fn surface_window(&self, surface: SurfaceId) -> Option<WindowId> {
        self.surfaces.get(&surface)?.window
    }

    pub fn window_output(&self, window: WindowId) -> Option<OutputId> {
        self.windows.get(&window).map(|record| record.output)
    }

    /// Whether `surface` has produced valid geometry in its current window.
    pub fn is_ready(&self, surface: SurfaceId) -> bool {
        self.chrome(surface).is_some_and(Chrome::is_ready)
    }

    /// Process one task. Returns `false` when the compositor should stop.
    pub fn handle(&mut self, task: CompositorTask) -> bool {
        match task {
            CompositorTask::Protocol(event) => self.handle_protocol(event),
            CompositorTask::Host(event) => self.handle_host(event),
            CompositorTask::BindWidget(widget) => self.bind_widget(widget),
            CompositorTask::Stop => return false,
        }
        self.flush_deferred();
        true
    }

    fn handle_protocol(&mut self, event: ProtocolEvent) {
        match event {
            ProtocolEvent::ToplevelCreated { surface } => self.on_toplevel_created(surface),
            ProtocolEvent::PopupCreated {
                surface,
                parent,
                position,
            } => self.on_popup_created(surface, parent, position),
            ProtocolEvent::SurfaceDestroyed { surface } => self.on_surface_destroyed(surface),
            event => {
                let surface = event.surface();
                let Some(record) = self.surfaces.get_mut(&surface) else {
                    tracing::debug!(
                        error = %CompositorError::UnknownSurface(surface),
                        "ignoring surface event"
                    );
                    return;
                };
                let change = record.state.apply(&event);
                self.sync_surface(surface, change);
            }
        }
    }

    /// Bind the application's embedding widget as the primary output, or
    /// unbind it with `None`.
    fn bind_widget(&mut self, widget: Option<HostWidget>) {
        if let Some(id) = self.primary.take() {
            tracing::info!(output = %id, "unbinding primary widget");
            self.retire_output(id);
        }
        self.widget = widget;
        let Some(widget) = widget else {
            return;
        };
        let scale = scale_factor(widget.device_pixel_ratio);
        self.host_scale = scale;
        let id = self.create_output(widget.window, WindowKind::Primary, widget.geometry, scale);
        self.primary = Some(id);
    }

    fn create_output(
        &mut self,
        window: WindowId,
        kind: WindowKind,
        geometry: Rect,
        scale: i32,
    ) -> OutputId {
        let id = OutputId(self.next_output);
        self.next_output += 1;
        let owned = kind != WindowKind::Primary;
        let output = Output::new(id, window, owned, geometry, scale, self.client.as_mut());
        self.outputs.insert(id, output);
        self.windows.insert(
            window,
            WindowRecord {
                output: id,
                geometry,
                kind,
            },
        );
        self.events
            .publish(EmbedEvent::OutputCreated { output: id, window });
        id
    }

    /// Remove an output and its chrome. The host window is left alone.
    fn retire_output(&mut self, id: OutputId) {
        let Some(output) = self.outputs.remove(&id) else {
            return;
        };
        let window = output.window();
        if let Some(surface) = output.retire(&self.ui, self.client.as_mut()) {
            self.forget_surface_window(surface, window);
        }
        self.windows.remove(&window);
        if self.warm == Some(id) {
            self.warm = None;
        }
        self.events.publish(EmbedEvent::OutputRemoved { output: id });
    }

    fn forget_surface_window(&mut self, surface: SurfaceId, window: WindowId) {
        if let Some(record) = self.surfaces.get_mut(&surface) {
            record.window = None;
        }
        self.events
            .publish(EmbedEvent::SurfaceDetached { surface, window });
    }

    fn scale_of(&self, window: WindowId) -> i32 {
        self.windows
            .get(&window)
            .and_then(|record| self.outputs.get(&record.output))
            .map_or(1, Output::scale)
    }

    fn chrome(&self, surface: SurfaceId) -> Option<&Chrome> {
        let record = self.surfaces.get(&surface)?;
        let chrome = match record.state.role {
            SurfaceRole::Popup => self.popups.get(&surface)?,
            SurfaceRole::Toplevel => {
                let output = self.windows.get(&record.window?)?.output;
                self.outputs.get(&output)?.chrome()?
            }
        };
        (chrome.surface() == surface).then_some(chrome)
    }

    /// Run `f` against the chrome showing `surface`, then report readiness.
    fn with_chrome<R>(
        &mut self,
        surface: SurfaceId,
        f: impl FnOnce(&mut Chrome, &mut SyncContext<'_>, &SurfaceState) -> R,
    ) -> Option<R> {
        let record = self.surfaces.get(&surface)?;
        let window = record.window?;
        let scale = self.scale_of(window);
        let chrome = match record.state.role {
            SurfaceRole::Popup => self.popups.get_mut(&surface)?,
            SurfaceRole::Toplevel => {
                let output = self.windows.get(&window)?.output;
                self.outputs.get_mut(&output)?.chrome_mut()?
            }
        };
        if chrome.surface() != surface {
            return None;
        }
        let mut ctx = SyncContext {
            ui: &self.ui,
            deferred: &mut self.deferred,
            scale,
        };
        let result = f(chrome, &mut ctx, &record.state);
        let ready = chrome.take_surface_ready();
        if ready {
            self.on_surface_ready(surface, window);
        }
        Some(result)
    }

    fn sync_surface(&mut self, surface: SurfaceId, change: SurfaceChange) {
        let title_changed = self.with_chrome(surface, |chrome, ctx, state| match change {
            SurfaceChange::Geometry => {
                chrome.on_client_rect(state.client_rect(), ctx);
                false
            }
            SurfaceChange::Title => chrome.on_title(&state.title, ctx),
            SurfaceChange::Fullscreen => {
                chrome.on_fullscreen(state.fullscreen, ctx);
                false
            }
            SurfaceChange::None => false,
        });
        if title_changed == Some(true) {
            if let (Some(window), Some(record)) =
                (self.surface_window(surface), self.surfaces.get(&surface))
            {
                self.events.publish(EmbedEvent::TitleChanged {
                    window,
                    title: record.state.title.clone(),
                });
            }
        }
    }

    fn on_surface_ready(&mut self, surface: SurfaceId, window: WindowId) {
        tracing::debug!(%surface, %window, "surface ready");
        self.events
            .publish(EmbedEvent::SurfaceReady { surface, window });
        let Some(record) = self.windows.get(&window) else {
            return;
        };
        match record.kind {
            // The widget is visible already.
            WindowKind::Primary => return,
            WindowKind::Toplevel => self.ui.send(UiCommand::Show { window }),
            WindowKind::Popup { anchor, .. } => {
                let position = self
                    .surfaces
                    .get(&surface)
                    .map(|record| record.state.position)
                    .unwrap_or_default();
                let offset = to_window_point(position, self.scale_of(window));
                self.ui.send(UiCommand::ShowPopup {
                    window,
                    anchor,
                    offset,
                });
            }
        }
        self.events.publish(EmbedEvent::WindowShown { window });
    }

    /// Send the client requests queued while handling the last task.
    ///
    /// Requests for surfaces that no longer exist are dropped.
    fn flush_deferred(&mut self) {
        for Deferred { surface, action } in std::mem::take(&mut self.deferred) {
            let Some(record) = self.surfaces.get(&surface) else {
                tracing::trace!(%surface, ?action, "surface gone, dropping request");
                continue;
            };
            let request = match action {
                DeferredAction::Close => ClientRequest::Close { surface },
                DeferredAction::PopupDone => ClientRequest::PopupDone { surface },
                DeferredAction::Fullscreen(size) => ClientRequest::Fullscreen { surface, size },
                DeferredAction::ReassertFullscreen => {
                    let Some(window) = record.window else {
                        continue;
                    };
                    let Some(geometry) = self.windows.get(&window).map(|w| w.geometry) else {
                        continue;
                    };
                    let size = to_logical_size(geometry.size(), self.scale_of(window));
                    if size.is_empty() {
                        continue;
                    }
                    ClientRequest::Fullscreen { surface, size }
                }
            };
            self.client.deliver(request);
        }
    }
}

impl Drop for Compositor {
    fn drop(&mut self) {
        for (surface, chrome) in std::mem::take(&mut self.popups) {
            let window = chrome.window();
            chrome.detach(&self.ui);
            self.ui.send(UiCommand::DestroyWindow { window });
            self.events
                .publish(EmbedEvent::SurfaceDetached { surface, window });
        }
        let ids: Vec<OutputId> = self.outputs.keys().copied().collect();
        for id in ids {
            let owned_window = self
                .outputs
                .get(&id)
                .filter(|output| output.is_owned())
                .map(Output::window);
            self.retire_output(id);
            if let Some(window) = owned_window {
                self.ui.send(UiCommand::DestroyWindow { window });
            }
        }
        self.deferred.clear();
        self.surfaces.clear();
        self.events.publish(EmbedEvent::SessionEnded);
        tracing::info!(session = %self.session, "compositor stopped");
    }
}
