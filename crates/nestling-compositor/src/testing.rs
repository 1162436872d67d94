//! Synchronous stand-in for the two-thread setup, for tests.
//!
//! Runs the compositor, the UI dispatcher and a headless host on one thread
//! and shuttles work between them until everything settles.

use std::sync::mpsc;

use nestling_common::types::{Rect, WindowId};
use nestling_common::{EmbedEvent, EventBus, EventReceiver};

use crate::compositor::Compositor;
use crate::dispatch::{ui_channel, CompositorHandle, CompositorTask, UiDispatcher};
use crate::host::{CloseDecision, HeadlessHost, HostWidget};
use crate::protocol::{ClientRequest, ProtocolEvent, RecordingClient};

const MAX_SETTLE_ROUNDS: usize = 1000;

pub(crate) struct Harness {
    pub compositor: Compositor,
    pub host: HeadlessHost,
    pub dispatcher: UiDispatcher,
    pub client: RecordingClient,
    pub handle: CompositorHandle,
    tasks: mpsc::Receiver<CompositorTask>,
    events: EventReceiver,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_ratio(1.0)
    }

    pub fn with_ratio(device_pixel_ratio: f64) -> Self {
        let (ui, mut dispatcher) = ui_channel();
        let (sender, tasks) = mpsc::channel();
        let handle = CompositorHandle::new(sender);
        dispatcher.attach_compositor(handle.clone());
        let client = RecordingClient::new();
        let bus = EventBus::new(256);
        let events = bus.subscribe();
        let compositor = Compositor::new("nestling-test", Box::new(client.clone()), ui, bus)
            .with_device_pixel_ratio(device_pixel_ratio);
        Self {
            compositor,
            host: HeadlessHost::new(device_pixel_ratio),
            dispatcher,
            client,
            handle,
            tasks,
            events,
        }
    }

    /// Adopt a widget with `geometry` and bind it as the primary output.
    pub fn bind_widget(&mut self, geometry: Rect) -> HostWidget {
        let widget = self.host.adopt_widget(geometry);
        self.handle.bind_widget(Some(widget)).unwrap();
        self.settle();
        widget
    }

    pub fn deliver(&mut self, event: ProtocolEvent) {
        self.handle.deliver(event).unwrap();
        self.settle();
    }

    /// Simulate the user closing a window.
    pub fn close_window(&mut self, window: WindowId) -> CloseDecision {
        let decision = self.dispatcher.close_requested(window);
        self.settle();
        decision
    }

    /// Shuttle tasks, UI commands and host events until nothing moves.
    pub fn settle(&mut self) {
        for _ in 0..MAX_SETTLE_ROUNDS {
            let mut progressed = false;
            while let Ok(task) = self.tasks.try_recv() {
                self.compositor.handle(task);
                progressed = true;
            }
            if self.dispatcher.pump(&mut self.host) > 0 {
                progressed = true;
            }
            for event in self.host.take_events() {
                self.handle.notify(event).unwrap();
                progressed = true;
            }
            if !progressed {
                return;
            }
        }
        panic!("compositor did not settle after {MAX_SETTLE_ROUNDS} rounds");
    }

    pub fn take_requests(&self) -> Vec<ClientRequest> {
        self.client.take()
    }

    pub fn take_events(&mut self) -> Vec<EmbedEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
