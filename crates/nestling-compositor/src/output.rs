//! Output: one host window presented to the client as a display.

use nestling_common::types::{OutputId, Rect, SurfaceId, SurfaceRole, WindowId};

use crate::chrome::{Chrome, ChromeParams, SyncContext};
use crate::dispatch::UiSender;
use crate::geometry::{logical_geometry, LogicalGeometry};
use crate::protocol::{ClientRequest, ShellClient};
use crate::surface::SurfaceState;

pub struct Output {
    id: OutputId,
    window: WindowId,
    /// The compositor created the window (as opposed to the primary widget).
    owned: bool,
    geometry: Rect,
    scale: i32,
    published: Option<LogicalGeometry>,
    chrome: Option<Chrome>,
}

impl Output {
    /// Announce a new output to the client and publish its geometry.
    pub(crate) fn new(
        id: OutputId,
        window: WindowId,
        owned: bool,
        geometry: Rect,
        scale: i32,
        client: &mut dyn ShellClient,
    ) -> Self {
        tracing::info!(%id, %window, owned, ?geometry, scale, "output created");
        client.deliver(ClientRequest::OutputAdded { output: id });
        let mut output = Self {
            id,
            window,
            owned,
            geometry,
            scale: scale.max(1),
            published: None,
            chrome: None,
        };
        output.republish(client);
        output
    }

    pub fn id(&self) -> OutputId {
        self.id
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Chromes on compositor-created windows resize the window to the client.
    pub fn follows_size(&self) -> bool {
        self.owned
    }

    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Logical geometry last sent to the client.
    pub fn published(&self) -> Option<LogicalGeometry> {
        self.published
    }

    pub fn chrome(&self) -> Option<&Chrome> {
        self.chrome.as_ref()
    }

    pub(crate) fn chrome_mut(&mut self) -> Option<&mut Chrome> {
        self.chrome.as_mut()
    }

    pub fn has_chrome(&self) -> bool {
        self.chrome.is_some()
    }

    pub(crate) fn set_geometry(&mut self, geometry: Rect, client: &mut dyn ShellClient) {
        self.geometry = geometry;
        self.republish(client);
    }

    /// Returns whether the scale actually changed.
    pub(crate) fn set_scale(&mut self, scale: i32, client: &mut dyn ShellClient) -> bool {
        let scale = scale.max(1);
        if scale == self.scale {
            return false;
        }
        tracing::debug!(id = %self.id, scale, "output scale changed");
        self.scale = scale;
        self.republish(client);
        true
    }

    /// Send logical position and size when they differ from what the client
    /// last saw. Empty windows are not published.
    fn republish(&mut self, client: &mut dyn ShellClient) {
        let logical = logical_geometry(self.geometry, self.scale);
        if logical.size.is_empty() || self.published == Some(logical) {
            return;
        }
        self.published = Some(logical);
        client.deliver(ClientRequest::LogicalPosition {
            output: self.id,
            position: logical.position,
        });
        client.deliver(ClientRequest::LogicalSize {
            output: self.id,
            size: logical.size,
        });
    }

    /// Put a top-level surface into this output's window, replacing any
    /// chrome already there.
    pub(crate) fn attach(
        &mut self,
        surface: SurfaceId,
        state: &SurfaceState,
        ctx: &mut SyncContext<'_>,
    ) -> &mut Chrome {
        self.detach(ctx.ui);
        let params = ChromeParams {
            surface,
            role: SurfaceRole::Toplevel,
            output: self.id,
            window: self.window,
            follows_size: self.follows_size(),
        };
        self.chrome
            .insert(Chrome::attach(params, state, self.geometry.size(), ctx))
    }

    /// Drop the chrome, returning the surface it showed.
    pub(crate) fn detach(&mut self, ui: &UiSender) -> Option<SurfaceId> {
        let chrome = self.chrome.take()?;
        let surface = chrome.surface();
        chrome.detach(ui);
        Some(surface)
    }

    /// Tear down: detach the chrome and tell the client the output is gone.
    pub(crate) fn retire(mut self, ui: &UiSender, client: &mut dyn ShellClient) -> Option<SurfaceId> {
        let surface = self.detach(ui);
        tracing::info!(id = %self.id, window = %self.window, "output removed");
        client.deliver(ClientRequest::OutputRemoved { output: self.id });
        surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chrome::Deferred;
    use crate::dispatch::ui_channel;
    use crate::protocol::RecordingClient;
    use nestling_common::types::{Point, Size};

    fn output(geometry: Rect, scale: i32, client: &mut RecordingClient) -> Output {
        Output::new(OutputId(1), WindowId(77), true, geometry, scale, client)
    }

    #[test]
    fn new_output_announces_and_publishes() {
        let mut client = RecordingClient::new();
        let out = output(Rect::new(10, 20, 800, 600), 1, &mut client);
        assert_eq!(
            client.take(),
            vec![
                ClientRequest::OutputAdded { output: OutputId(1) },
                ClientRequest::LogicalPosition {
                    output: OutputId(1),
                    position: Point::new(10, 20)
                },
                ClientRequest::LogicalSize {
                    output: OutputId(1),
                    size: Size::new(800, 600)
                },
            ]
        );
        assert!(out.follows_size());
    }

    #[test]
    fn empty_window_is_not_published() {
        let mut client = RecordingClient::new();
        let out = output(Rect::default(), 1, &mut client);
        assert_eq!(
            client.take(),
            vec![ClientRequest::OutputAdded { output: OutputId(1) }]
        );
        assert_eq!(out.published(), None);
    }

    #[test]
    fn geometry_is_published_only_when_logical_values_change() {
        let mut client = RecordingClient::new();
        let mut out = output(Rect::new(0, 0, 800, 600), 2, &mut client);
        client.take();

        // 400.5 rounds to 401.
        out.set_geometry(Rect::new(0, 0, 801, 600), &mut client);
        assert_eq!(client.take().len(), 2);

        out.set_geometry(Rect::new(0, 0, 801, 600), &mut client);
        assert!(client.take().is_empty());

        out.set_geometry(Rect::new(1, 0, 801, 600), &mut client);
        // 0.5 rounds to 1.
        assert_eq!(client.take().len(), 2);
    }

    #[test]
    fn scale_change_republishes() {
        let mut client = RecordingClient::new();
        let mut out = output(Rect::new(200, 100, 1600, 1200), 1, &mut client);
        client.take();

        assert!(out.set_scale(2, &mut client));
        assert_eq!(
            client.take(),
            vec![
                ClientRequest::LogicalPosition {
                    output: OutputId(1),
                    position: Point::new(100, 50)
                },
                ClientRequest::LogicalSize {
                    output: OutputId(1),
                    size: Size::new(800, 600)
                },
            ]
        );
        assert_eq!(
            out.published(),
            Some(LogicalGeometry {
                position: Point::new(100, 50),
                size: Size::new(800, 600)
            })
        );

        assert!(!out.set_scale(2, &mut client));
        assert!(client.take().is_empty());
    }

    #[test]
    fn attach_replaces_previous_chrome() {
        let mut client = RecordingClient::new();
        let mut out = output(Rect::new(0, 0, 800, 600), 1, &mut client);
        let (ui, _dispatcher) = ui_channel();
        let mut deferred: Vec<Deferred> = Vec::new();
        let state = SurfaceState::toplevel();

        let mut ctx = SyncContext {
            ui: &ui,
            deferred: &mut deferred,
            scale: 1,
        };
        out.attach(SurfaceId(1), &state, &mut ctx);
        out.attach(SurfaceId(2), &state, &mut ctx);
        assert_eq!(out.chrome().map(Chrome::surface), Some(SurfaceId(2)));

        assert_eq!(out.detach(&ui), Some(SurfaceId(2)));
        assert!(!out.has_chrome());
        assert_eq!(out.detach(&ui), None);
    }

    #[test]
    fn retire_reports_removal() {
        let mut client = RecordingClient::new();
        let out = output(Rect::new(0, 0, 800, 600), 1, &mut client);
        client.take();
        let (ui, _dispatcher) = ui_channel();
        assert_eq!(out.retire(&ui, &mut client), None);
        assert_eq!(
            client.take(),
            vec![ClientRequest::OutputRemoved { output: OutputId(1) }]
        );
    }
}
