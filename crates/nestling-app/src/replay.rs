//! Trace replay: drives a real compositor thread against a headless host.
//!
//! This thread plays the UI side. After each protocol event it pumps UI
//! commands into the host and forwards the host's reactions back to the
//! compositor until nothing arrives within the settle timeout.

use std::time::Duration;

use nestling_common::types::WindowId;
use nestling_common::{EmbedEvent, EventReceiver, NestlingError};
use nestling_compositor::{
    ui_channel, ClientRequest, CompositorHandle, CompositorOptions, CompositorThread,
    HeadlessHost, HeadlessWindow, RecordingClient, ShellClient, UiDispatcher,
};
use serde::Serialize;
use tokio::sync::broadcast::error::TryRecvError;

use crate::trace::Trace;

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub socket_name: Option<String>,
    pub event_capacity: usize,
    pub settle_timeout: Duration,
    /// Used when the trace does not carry its own ratio.
    pub device_pixel_ratio: f64,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            socket_name: None,
            event_capacity: 64,
            settle_timeout: Duration::from_millis(50),
            device_pixel_ratio: 1.0,
        }
    }
}

impl From<&nestling_config::NestlingConfig> for ReplayOptions {
    fn from(config: &nestling_config::NestlingConfig) -> Self {
        Self {
            socket_name: config.compositor.socket_name.clone(),
            event_capacity: config.compositor.event_capacity as usize,
            settle_timeout: Duration::from_millis(u64::from(config.replay.settle_timeout_ms)),
            device_pixel_ratio: config.replay.device_pixel_ratio,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WindowReport {
    pub id: WindowId,
    #[serde(flatten)]
    pub window: HeadlessWindow,
}

/// What the session looked like once the trace was exhausted.
///
/// `windows` is captured before the compositor stops; `requests` and
/// `events` run through teardown.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub socket_name: String,
    pub windows: Vec<WindowReport>,
    pub requests: Vec<ClientRequest>,
    pub events: Vec<EmbedEvent>,
}

pub fn run(trace: &Trace, options: ReplayOptions) -> Result<ReplayReport, NestlingError> {
    let ratio = trace.device_pixel_ratio.unwrap_or(options.device_pixel_ratio);
    let (ui, mut dispatcher) = ui_channel();
    let client = RecordingClient::new();

    let thread = CompositorThread::spawn(
        CompositorOptions {
            socket_name: options.socket_name,
            event_capacity: options.event_capacity,
            device_pixel_ratio: ratio,
        },
        ui,
        {
            let client = client.clone();
            move |_| Ok(Box::new(client) as Box<dyn ShellClient>)
        },
    )?;
    let socket_name = thread.socket_name().to_owned();
    let mut receiver = thread.events().subscribe();
    let handle = thread.handle();
    dispatcher.attach_compositor(handle.clone());

    let mut host = HeadlessHost::new(ratio);
    let mut session = Session {
        dispatcher: &mut dispatcher,
        host: &mut host,
        handle: &handle,
        timeout: options.settle_timeout,
    };

    if let Some(geometry) = trace.widget {
        let widget = session.host.adopt_widget(geometry);
        tracing::info!(window = %widget.window, ?geometry, "binding host widget");
        handle.bind_widget(Some(widget))?;
        session.settle()?;
    }

    for (index, event) in trace.events.iter().enumerate() {
        tracing::debug!(index, ?event, "replaying");
        handle.deliver(event.clone())?;
        session.settle()?;
    }

    let windows = host
        .windows()
        .map(|(id, window)| WindowReport {
            id,
            window: window.clone(),
        })
        .collect();

    thread.stop()?;
    // Teardown commands are still queued.
    dispatcher.pump(&mut host);

    Ok(ReplayReport {
        socket_name,
        windows,
        requests: client.take(),
        events: drain_events(&mut receiver),
    })
}

struct Session<'a> {
    dispatcher: &'a mut UiDispatcher,
    host: &'a mut HeadlessHost,
    handle: &'a CompositorHandle,
    timeout: Duration,
}

impl Session<'_> {
    fn settle(&mut self) -> Result<(), NestlingError> {
        loop {
            let applied = self.dispatcher.pump_timeout(&mut *self.host, self.timeout);
            let events = self.host.take_events();
            if applied == 0 && events.is_empty() {
                return Ok(());
            }
            for event in events {
                self.handle.notify(event)?;
            }
        }
    }
}

fn drain_events(receiver: &mut EventReceiver) -> Vec<EmbedEvent> {
    let mut events = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event report is missing lagged events");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    events
}
