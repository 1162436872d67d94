//! Nested compositor core.
//!
//! Embeds an external client's surfaces into host windows:
//! - `Compositor` places top-levels and popups and owns every output
//! - `Output` presents one host window to the client as a display
//! - `Chrome` keeps a window and a client surface in sync
//! - `CompositorThread` runs all of it off the UI thread
//!
//! Host windows are only touched on the UI thread through `UiDispatcher`.

pub mod chrome;
pub mod compositor;
pub mod dispatch;
pub mod geometry;
pub mod host;
pub mod output;
pub mod protocol;
pub mod surface;
pub mod thread;

#[cfg(test)]
mod testing;

pub use chrome::Chrome;
pub use compositor::Compositor;
pub use dispatch::{
    ui_channel, CompositorHandle, CompositorTask, PopupAnchor, UiCommand, UiDispatcher, UiSender,
};
pub use host::{
    CloseDecision, HeadlessHost, HeadlessWindow, HostEvent, HostWidget, TransientParent,
    WindowHost,
};
pub use output::Output;
pub use protocol::{ClientRequest, ProtocolEvent, RecordingClient, ShellClient};
pub use thread::{CompositorOptions, CompositorThread, ThreadState};
