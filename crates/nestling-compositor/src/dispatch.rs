//! Queues between the UI thread and the compositor thread.
//!
//! The compositor never touches host windows directly: it posts
//! [`UiCommand`]s, and the UI thread applies them with
//! [`UiDispatcher::pump`]. Host notifications travel back as
//! [`CompositorTask`]s through a [`CompositorHandle`].

use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::time::Duration;

use nestling_common::types::{Point, Size, SurfaceId, SurfaceRole, WindowId};
use nestling_common::CompositorError;

use crate::host::{CloseDecision, HostEvent, HostWidget, TransientParent, WindowHost};
use crate::protocol::ProtocolEvent;

/// Work for the compositor thread.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositorTask {
    Protocol(ProtocolEvent),
    Host(HostEvent),
    /// Bind (or with `None`, unbind) the application's embedding widget.
    BindWidget(Option<HostWidget>),
    Stop,
}

/// Cloneable entry point into the compositor thread's queue.
#[derive(Debug, Clone)]
pub struct CompositorHandle {
    sender: mpsc::Sender<CompositorTask>,
}

impl CompositorHandle {
    pub(crate) fn new(sender: mpsc::Sender<CompositorTask>) -> Self {
        Self { sender }
    }

    /// Feed a decoded protocol event to the compositor.
    pub fn deliver(&self, event: ProtocolEvent) -> Result<(), CompositorError> {
        self.post(CompositorTask::Protocol(event))
    }

    /// Report a host toolkit event.
    pub fn notify(&self, event: HostEvent) -> Result<(), CompositorError> {
        self.post(CompositorTask::Host(event))
    }

    pub fn bind_widget(&self, widget: Option<HostWidget>) -> Result<(), CompositorError> {
        self.post(CompositorTask::BindWidget(widget))
    }

    pub(crate) fn stop(&self) -> Result<(), CompositorError> {
        self.post(CompositorTask::Stop)
    }

    fn post(&self, task: CompositorTask) -> Result<(), CompositorError> {
        self.sender
            .send(task)
            .map_err(|mpsc::SendError(task)| {
                tracing::debug!(?task, "compositor thread gone, dropping task");
                CompositorError::Disconnected
            })
    }
}

/// Where a popup is anchored when it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupAnchor {
    /// Relative to the embedding widget.
    HostSurface,
    /// Relative to another compositor-created window.
    Window(WindowId),
}

/// A host window operation, applied on the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    CreateWindow { window: WindowId, role: SurfaceRole },
    DestroyWindow { window: WindowId },
    /// Show `surface` inside `window` and intercept native close requests.
    EmbedSurface { window: WindowId, surface: SurfaceId },
    RemoveSurface { window: WindowId, surface: SurfaceId },
    SetContentOffset {
        window: WindowId,
        surface: SurfaceId,
        offset: Point,
    },
    Resize { window: WindowId, size: Size },
    /// Fix the window at exactly `size` (minimum and maximum).
    PinSize { window: WindowId, size: Size },
    SetTitle { window: WindowId, title: String },
    Show { window: WindowId },
    Hide { window: WindowId },
    ShowPopup {
        window: WindowId,
        anchor: PopupAnchor,
        /// Offset from the anchor's origin, in window pixels.
        offset: Point,
    },
}

impl UiCommand {
    pub fn window(&self) -> WindowId {
        match self {
            UiCommand::CreateWindow { window, .. }
            | UiCommand::DestroyWindow { window }
            | UiCommand::EmbedSurface { window, .. }
            | UiCommand::RemoveSurface { window, .. }
            | UiCommand::SetContentOffset { window, .. }
            | UiCommand::Resize { window, .. }
            | UiCommand::PinSize { window, .. }
            | UiCommand::SetTitle { window, .. }
            | UiCommand::Show { window }
            | UiCommand::Hide { window }
            | UiCommand::ShowPopup { window, .. } => *window,
        }
    }
}

/// Compositor-side end of the UI queue. Sending never blocks.
#[derive(Debug, Clone)]
pub struct UiSender {
    sender: mpsc::Sender<UiCommand>,
}

impl UiSender {
    pub fn send(&self, command: UiCommand) {
        if self.sender.send(command).is_err() {
            tracing::trace!("UI thread gone, dropping command");
        }
    }
}

/// Create the UI queue.
pub fn ui_channel() -> (UiSender, UiDispatcher) {
    let (sender, receiver) = mpsc::channel();
    (
        UiSender { sender },
        UiDispatcher {
            receiver,
            compositor: None,
            embedded: HashMap::new(),
        },
    )
}

/// UI-thread end of the queue: applies commands to the host.
pub struct UiDispatcher {
    receiver: mpsc::Receiver<UiCommand>,
    compositor: Option<CompositorHandle>,
    embedded: HashMap<WindowId, HashSet<SurfaceId>>,
}

impl UiDispatcher {
    /// Route intercepted close requests to this compositor.
    pub fn attach_compositor(&mut self, handle: CompositorHandle) {
        self.compositor = Some(handle);
    }

    /// Apply every queued command. Returns how many were taken off the queue.
    pub fn pump(&mut self, host: &mut dyn WindowHost) -> usize {
        let mut count = 0;
        while let Ok(command) = self.receiver.try_recv() {
            self.apply(command, host);
            count += 1;
        }
        count
    }

    /// Wait up to `timeout` for a command, then apply everything queued.
    pub fn pump_timeout(&mut self, host: &mut dyn WindowHost, timeout: Duration) -> usize {
        match self.receiver.recv_timeout(timeout) {
            Ok(command) => {
                self.apply(command, host);
                1 + self.pump(host)
            }
            Err(_) => 0,
        }
    }

    /// Native close interception for windows that show an embedded surface.
    ///
    /// Such a window stays open and the compositor is asked to forward a
    /// close request to the client instead.
    pub fn close_requested(&self, window: WindowId) -> CloseDecision {
        let intercepted = self
            .embedded
            .get(&window)
            .is_some_and(|surfaces| !surfaces.is_empty());
        if !intercepted {
            return CloseDecision::Proceed;
        }
        if let Some(handle) = &self.compositor {
            if let Err(e) = handle.notify(HostEvent::CloseRequested { window }) {
                tracing::warn!(%window, error = %e, "could not forward close request");
            }
        }
        CloseDecision::Cancel
    }

    fn apply(&mut self, command: UiCommand, host: &mut dyn WindowHost) {
        let window = command.window();
        let creates = matches!(command, UiCommand::CreateWindow { .. });
        if !creates && !host.has_window(window) {
            tracing::trace!(%window, ?command, "window gone, dropping command");
            return;
        }

        match command {
            UiCommand::CreateWindow { window, role } => host.create_window(window, role),
            UiCommand::DestroyWindow { window } => {
                self.embedded.remove(&window);
                host.destroy_window(window);
            }
            UiCommand::EmbedSurface { window, surface } => {
                self.embedded.entry(window).or_default().insert(surface);
                host.embed_surface(window, surface);
            }
            UiCommand::RemoveSurface { window, surface } => {
                if let Some(surfaces) = self.embedded.get_mut(&window) {
                    surfaces.remove(&surface);
                    if surfaces.is_empty() {
                        self.embedded.remove(&window);
                    }
                }
                host.remove_surface(window, surface);
            }
            UiCommand::SetContentOffset {
                window,
                surface,
                offset,
            } => host.set_content_offset(window, surface, offset),
            UiCommand::Resize { window, size } => host.resize(window, size),
            UiCommand::PinSize { window, size } => {
                host.set_minimum_size(window, size);
                host.set_maximum_size(window, size);
            }
            UiCommand::SetTitle { window, title } => host.set_title(window, &title),
            UiCommand::Show { window } => host.show(window),
            UiCommand::Hide { window } => host.hide(window),
            UiCommand::ShowPopup {
                window,
                anchor,
                offset,
            } => show_popup(host, window, anchor, offset),
        }
    }
}

fn show_popup(host: &mut dyn WindowHost, window: WindowId, anchor: PopupAnchor, offset: Point) {
    let (parent, origin) = match anchor {
        PopupAnchor::HostSurface => (TransientParent::HostToplevel, host.host_surface_origin()),
        PopupAnchor::Window(parent) => {
            let origin = host.window_position(parent).unwrap_or_else(|| {
                tracing::warn!(%window, %parent, "popup parent window is gone");
                Point::default()
            });
            (TransientParent::Window(parent), origin)
        }
    };
    host.set_transient_parent(window, parent);
    host.set_position(window, origin + offset);
    host.set_popup_flags(window);
    host.show(window);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HeadlessHost;
    use nestling_common::types::Rect;

    #[test]
    fn commands_for_destroyed_windows_are_dropped() {
        let (ui, mut dispatcher) = ui_channel();
        let mut host = HeadlessHost::new(1.0);
        let window = WindowId::next();

        ui.send(UiCommand::CreateWindow {
            window,
            role: SurfaceRole::Toplevel,
        });
        ui.send(UiCommand::DestroyWindow { window });
        ui.send(UiCommand::Resize {
            window,
            size: Size::new(10, 10),
        });
        ui.send(UiCommand::Show { window });

        assert_eq!(dispatcher.pump(&mut host), 4);
        assert!(!host.has_window(window));
    }

    #[test]
    fn pin_size_fixes_window() {
        let (ui, mut dispatcher) = ui_channel();
        let mut host = HeadlessHost::new(1.0);
        let window = WindowId::next();
        ui.send(UiCommand::CreateWindow {
            window,
            role: SurfaceRole::Popup,
        });
        ui.send(UiCommand::PinSize {
            window,
            size: Size::new(200, 100),
        });
        dispatcher.pump(&mut host);

        let state = host.window(window).unwrap();
        assert_eq!(state.minimum_size, Some(Size::new(200, 100)));
        assert_eq!(state.maximum_size, Some(Size::new(200, 100)));
        assert_eq!(state.geometry.size(), Size::new(200, 100));
    }

    #[test]
    fn close_is_intercepted_only_while_embedded() {
        let (ui, mut dispatcher) = ui_channel();
        let (tasks_tx, tasks_rx) = mpsc::channel();
        dispatcher.attach_compositor(CompositorHandle::new(tasks_tx));
        let mut host = HeadlessHost::new(1.0);
        let window = WindowId::next();
        let surface = SurfaceId(1);

        ui.send(UiCommand::CreateWindow {
            window,
            role: SurfaceRole::Toplevel,
        });
        dispatcher.pump(&mut host);
        assert_eq!(dispatcher.close_requested(window), CloseDecision::Proceed);

        ui.send(UiCommand::EmbedSurface { window, surface });
        dispatcher.pump(&mut host);
        assert_eq!(dispatcher.close_requested(window), CloseDecision::Cancel);
        assert_eq!(
            tasks_rx.try_recv().unwrap(),
            CompositorTask::Host(HostEvent::CloseRequested { window })
        );

        ui.send(UiCommand::RemoveSurface { window, surface });
        dispatcher.pump(&mut host);
        assert_eq!(dispatcher.close_requested(window), CloseDecision::Proceed);
        assert!(tasks_rx.try_recv().is_err());
    }

    #[test]
    fn popup_anchored_to_host_surface() {
        let (ui, mut dispatcher) = ui_channel();
        let mut host = HeadlessHost::new(1.0);
        host.adopt_widget(Rect::new(100, 100, 800, 600));
        let window = WindowId::next();

        ui.send(UiCommand::CreateWindow {
            window,
            role: SurfaceRole::Popup,
        });
        ui.send(UiCommand::ShowPopup {
            window,
            anchor: PopupAnchor::HostSurface,
            offset: Point::new(10, 20),
        });
        dispatcher.pump(&mut host);

        let state = host.window(window).unwrap();
        assert_eq!(state.geometry.top_left(), Point::new(110, 120));
        assert_eq!(state.transient_parent, Some(TransientParent::HostToplevel));
        assert!(state.popup && state.transparent && state.visible);
    }

    #[test]
    fn popup_anchored_to_window() {
        let (ui, mut dispatcher) = ui_channel();
        let mut host = HeadlessHost::new(1.0);
        let parent = WindowId::next();
        let window = WindowId::next();

        ui.send(UiCommand::CreateWindow {
            window: parent,
            role: SurfaceRole::Toplevel,
        });
        ui.send(UiCommand::CreateWindow {
            window,
            role: SurfaceRole::Popup,
        });
        dispatcher.pump(&mut host);
        host.set_position(parent, Point::new(300, 40));

        ui.send(UiCommand::ShowPopup {
            window,
            anchor: PopupAnchor::Window(parent),
            offset: Point::new(5, 5),
        });
        dispatcher.pump(&mut host);

        let state = host.window(window).unwrap();
        assert_eq!(state.geometry.top_left(), Point::new(305, 45));
        assert_eq!(state.transient_parent, Some(TransientParent::Window(parent)));
    }

    #[test]
    fn pump_timeout_returns_zero_when_idle() {
        let (_ui, mut dispatcher) = ui_channel();
        let mut host = HeadlessHost::new(1.0);
        assert_eq!(
            dispatcher.pump_timeout(&mut host, Duration::from_millis(5)),
            0
        );
    }

    #[test]
    fn handle_reports_disconnect() {
        let (tx, rx) = mpsc::channel();
        let handle = CompositorHandle::new(tx);
        drop(rx);
        assert!(matches!(
            handle.deliver(ProtocolEvent::ToplevelCreated {
                surface: SurfaceId(1)
            }),
            Err(CompositorError::Disconnected)
        ));
    }
}
