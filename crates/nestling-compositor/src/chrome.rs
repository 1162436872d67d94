//! Chrome: keeps one host window and one client surface in sync.
//!
//! Four channels run from construction until the chrome is detached:
//!
//! 1. client geometry: content offset, window size and readiness
//! 2. window size: fullscreen target for top-levels
//! 3. title: window title for top-levels
//! 4. fullscreen: re-assert fullscreen whenever the client leaves it
//!
//! Each channel remembers its last value and ignores repeats. Requests to
//! the client are queued as [`Deferred`] and flushed after the current task.

use nestling_common::types::{OutputId, Rect, Size, SurfaceId, SurfaceRole, WindowId};

use crate::dispatch::{UiCommand, UiSender};
use crate::geometry::{content_offset, to_logical_size, to_window_size};
use crate::surface::SurfaceState;

/// A client request that is sent after the current task completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deferred {
    pub surface: SurfaceId,
    pub action: DeferredAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    Close,
    PopupDone,
    /// Fullscreen target with a size already in logical units.
    Fullscreen(Size),
    /// Fullscreen target at the window's size when the request is sent.
    ReassertFullscreen,
}

/// What a channel needs to act.
pub(crate) struct SyncContext<'a> {
    pub ui: &'a UiSender,
    pub deferred: &'a mut Vec<Deferred>,
    /// Scale factor of the output the window belongs to.
    pub scale: i32,
}

impl SyncContext<'_> {
    fn defer(&mut self, surface: SurfaceId, action: DeferredAction) {
        self.deferred.push(Deferred { surface, action });
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ChromeParams {
    pub surface: SurfaceId,
    pub role: SurfaceRole,
    pub output: OutputId,
    pub window: WindowId,
    /// Resize the window to the client's geometry.
    pub follows_size: bool,
}

#[derive(Debug)]
pub struct Chrome {
    surface: SurfaceId,
    role: SurfaceRole,
    output: OutputId,
    window: WindowId,
    follows_size: bool,
    ready: bool,
    ready_pending: bool,
    last_client_rect: Option<Rect>,
    last_window_size: Option<Size>,
    last_title: Option<String>,
    last_fullscreen: Option<bool>,
}

impl Chrome {
    /// Embed the surface into the window and evaluate every channel once.
    pub(crate) fn attach(
        params: ChromeParams,
        state: &SurfaceState,
        window_size: Size,
        ctx: &mut SyncContext<'_>,
    ) -> Self {
        let mut chrome = Self {
            surface: params.surface,
            role: params.role,
            output: params.output,
            window: params.window,
            follows_size: params.follows_size,
            ready: false,
            ready_pending: false,
            last_client_rect: None,
            last_window_size: None,
            last_title: None,
            last_fullscreen: None,
        };
        tracing::debug!(
            surface = %chrome.surface,
            window = %chrome.window,
            follows_size = chrome.follows_size,
            "attaching chrome"
        );
        ctx.ui.send(UiCommand::EmbedSurface {
            window: chrome.window,
            surface: chrome.surface,
        });
        chrome.on_client_rect(state.client_rect(), ctx);
        chrome.on_window_size(window_size, ctx);
        chrome.on_title(&state.title, ctx);
        chrome.on_fullscreen(state.fullscreen, ctx);
        chrome
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn output(&self) -> OutputId {
        self.output
    }

    pub fn role(&self) -> SurfaceRole {
        self.role
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// True exactly once, after the first valid client geometry.
    pub fn take_surface_ready(&mut self) -> bool {
        std::mem::take(&mut self.ready_pending)
    }

    /// Channel 1: the effective client rectangle changed. Returns whether
    /// the window was asked to change size.
    pub(crate) fn on_client_rect(&mut self, rect: Rect, ctx: &mut SyncContext<'_>) -> bool {
        if self.last_client_rect == Some(rect) {
            return false;
        }
        self.last_client_rect = Some(rect);
        if !rect.is_valid() {
            return false;
        }

        ctx.ui.send(UiCommand::SetContentOffset {
            window: self.window,
            surface: self.surface,
            offset: content_offset(rect, ctx.scale),
        });
        if self.follows_size {
            let size = to_window_size(rect.size(), ctx.scale);
            let window = self.window;
            ctx.ui.send(match self.role {
                SurfaceRole::Popup => UiCommand::PinSize { window, size },
                SurfaceRole::Toplevel => UiCommand::Resize { window, size },
            });
        }
        if !self.ready {
            self.ready = true;
            self.ready_pending = true;
        }
        self.follows_size
    }

    /// Channel 2: the host window's size changed.
    pub(crate) fn on_window_size(&mut self, size: Size, ctx: &mut SyncContext<'_>) {
        if self.last_window_size == Some(size) {
            return;
        }
        self.last_window_size = Some(size);
        if size.is_empty() || self.role != SurfaceRole::Toplevel {
            return;
        }
        let size = to_logical_size(size, ctx.scale);
        ctx.defer(self.surface, DeferredAction::Fullscreen(size));
    }

    /// Channel 3: the client's title changed. Returns whether the window
    /// title was updated.
    pub(crate) fn on_title(&mut self, title: &str, ctx: &mut SyncContext<'_>) -> bool {
        if self.role != SurfaceRole::Toplevel || self.last_title.as_deref() == Some(title) {
            return false;
        }
        self.last_title = Some(title.to_owned());
        ctx.ui.send(UiCommand::SetTitle {
            window: self.window,
            title: title.to_owned(),
        });
        true
    }

    /// Channel 4: the client's fullscreen state changed.
    pub(crate) fn on_fullscreen(&mut self, fullscreen: bool, ctx: &mut SyncContext<'_>) {
        if self.role != SurfaceRole::Toplevel || self.last_fullscreen == Some(fullscreen) {
            return;
        }
        self.last_fullscreen = Some(fullscreen);
        if !fullscreen {
            ctx.defer(self.surface, DeferredAction::ReassertFullscreen);
        }
    }

    /// The output's scale changed. Everything derived from it is sent again.
    ///
    /// When the window is resized to the new scale, the fullscreen target
    /// follows from the resulting geometry change instead.
    pub(crate) fn rescale(
        &mut self,
        state: &SurfaceState,
        window_size: Size,
        ctx: &mut SyncContext<'_>,
    ) {
        tracing::debug!(surface = %self.surface, scale = ctx.scale, "rescaling chrome");
        self.last_client_rect = None;
        self.last_window_size = None;
        if !self.on_client_rect(state.client_rect(), ctx) {
            self.on_window_size(window_size, ctx);
        }
    }

    /// Ask the client to close the surface (or dismiss the popup).
    pub(crate) fn request_close(&self, ctx: &mut SyncContext<'_>) {
        let action = match self.role {
            SurfaceRole::Toplevel => DeferredAction::Close,
            SurfaceRole::Popup => DeferredAction::PopupDone,
        };
        ctx.defer(self.surface, action);
    }

    /// Stop mirroring and take the surface out of the window.
    pub(crate) fn detach(self, ui: &UiSender) {
        tracing::debug!(surface = %self.surface, window = %self.window, "detaching chrome");
        ui.send(UiCommand::RemoveSurface {
            window: self.window,
            surface: self.surface,
        });
    }
}
