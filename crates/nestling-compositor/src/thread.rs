//! Dedicated thread that owns the compositor.

use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use nestling_common::{default_socket_name, CompositorError, EventBus};

use crate::compositor::Compositor;
use crate::dispatch::{CompositorHandle, CompositorTask, UiSender};
use crate::protocol::ShellClient;

/// Lifecycle of a [`CompositorThread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct CompositorOptions {
    /// Socket name clients connect to; an anonymous one is chosen when unset.
    pub socket_name: Option<String>,
    /// Capacity of the embed event channel.
    pub event_capacity: usize,
    /// Device pixel ratio of the screen new windows open on.
    pub device_pixel_ratio: f64,
}

impl Default for CompositorOptions {
    fn default() -> Self {
        Self {
            socket_name: None,
            event_capacity: 64,
            device_pixel_ratio: 1.0,
        }
    }
}

/// Runs a [`Compositor`] on its own thread until stopped.
///
/// Dropping the thread stops it and waits for the compositor to tear down.
pub struct CompositorThread {
    handle: CompositorHandle,
    state: Arc<Mutex<ThreadState>>,
    join: Option<JoinHandle<Result<(), CompositorError>>>,
    events: EventBus,
    socket_name: String,
}

impl CompositorThread {
    /// Start the thread. `connect` runs on the new thread with the socket
    /// name and produces the delivery layer; its failure ends the session.
    pub fn spawn<F>(
        options: CompositorOptions,
        ui: UiSender,
        connect: F,
    ) -> Result<Self, CompositorError>
    where
        F: FnOnce(&str) -> Result<Box<dyn ShellClient>, CompositorError> + Send + 'static,
    {
        let socket_name = options.socket_name.unwrap_or_else(default_socket_name);
        let events = EventBus::new(options.event_capacity);
        let (sender, receiver) = mpsc::channel();
        let state = Arc::new(Mutex::new(ThreadState::Idle));
        let ratio = options.device_pixel_ratio;

        let join = thread::Builder::new()
            .name("compositor".into())
            .spawn({
                let socket_name = socket_name.clone();
                let events = events.clone();
                let state = Arc::clone(&state);
                move || run(socket_name, ratio, receiver, ui, events, state, connect)
            })
            .map_err(CompositorError::ThreadSpawn)?;

        Ok(Self {
            handle: CompositorHandle::new(sender),
            state,
            join: Some(join),
            events,
            socket_name,
        })
    }

    /// A handle for posting work to the compositor.
    pub fn handle(&self) -> CompositorHandle {
        self.handle.clone()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn socket_name(&self) -> &str {
        &self.socket_name
    }

    pub fn state(&self) -> ThreadState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop the compositor and wait until the thread has finished.
    pub fn stop(mut self) -> Result<(), CompositorError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), CompositorError> {
        let Some(join) = self.join.take() else {
            return Ok(());
        };
        // The thread may already be gone after a failed connect.
        let _ = self.handle.stop();
        match join.join() {
            Ok(result) => result,
            Err(_) => {
                set_state(&self.state, ThreadState::Stopped);
                Err(CompositorError::ThreadPanicked)
            }
        }
    }
}

impl Drop for CompositorThread {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!(error = %e, "compositor thread did not stop cleanly");
        }
    }
}

fn set_state(state: &Mutex<ThreadState>, next: ThreadState) {
    let mut current = state.lock().unwrap_or_else(PoisonError::into_inner);
    tracing::debug!(from = ?*current, to = ?next, "compositor thread state");
    *current = next;
}

fn run<F>(
    socket_name: String,
    device_pixel_ratio: f64,
    receiver: mpsc::Receiver<CompositorTask>,
    ui: UiSender,
    events: EventBus,
    state: Arc<Mutex<ThreadState>>,
    connect: F,
) -> Result<(), CompositorError>
where
    F: FnOnce(&str) -> Result<Box<dyn ShellClient>, CompositorError>,
{
    let client = match connect(&socket_name) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(socket = %socket_name, error = %e, "embedding socket failed");
            set_state(&state, ThreadState::Stopped);
            return Err(e);
        }
    };

    let mut compositor = Compositor::new(socket_name, client, ui, events)
        .with_device_pixel_ratio(device_pixel_ratio);
    set_state(&state, ThreadState::Running);

    while let Ok(task) = receiver.recv() {
        if !compositor.handle(task) {
            break;
        }
    }

    set_state(&state, ThreadState::Stopping);
    drop(compositor);
    set_state(&state, ThreadState::Stopped);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use nestling_common::types::{Rect, Size, SurfaceId};
    use nestling_common::EmbedEvent;

    use crate::dispatch::ui_channel;
    use crate::host::{HeadlessHost, WindowHost};
    use crate::protocol::{ClientRequest, ProtocolEvent, RecordingClient};

    fn wait_for(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "timed out");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn runs_and_stops() {
        let (ui, _dispatcher) = ui_channel();
        let client = RecordingClient::new();
        let thread = CompositorThread::spawn(CompositorOptions::default(), ui, {
            let client = client.clone();
            move |_| Ok(Box::new(client) as Box<dyn ShellClient>)
        })
        .unwrap();

        wait_for(|| thread.state() == ThreadState::Running);
        assert!(thread.socket_name().starts_with("nestling-"));

        let state = Arc::clone(&thread.state);
        thread.stop().unwrap();
        assert_eq!(*state.lock().unwrap(), ThreadState::Stopped);
    }

    #[test]
    fn uses_configured_socket_name() {
        let (ui, _dispatcher) = ui_channel();
        let options = CompositorOptions {
            socket_name: Some("nestling-test.0".into()),
            ..CompositorOptions::default()
        };
        let seen = Arc::new(Mutex::new(String::new()));
        let thread = CompositorThread::spawn(options, ui, {
            let seen = Arc::clone(&seen);
            move |name| {
                *seen.lock().unwrap() = name.to_owned();
                Ok(Box::new(RecordingClient::new()) as Box<dyn ShellClient>)
            }
        })
        .unwrap();
        thread.stop().unwrap();
        assert_eq!(*seen.lock().unwrap(), "nestling-test.0");
    }

    #[test]
    fn connect_failure_is_fatal() {
        let (ui, _dispatcher) = ui_channel();
        let thread = CompositorThread::spawn(CompositorOptions::default(), ui, |_| {
            Err(CompositorError::Transport("address in use".into()))
        })
        .unwrap();

        wait_for(|| thread.state() == ThreadState::Stopped);
        assert!(thread.handle().deliver(ProtocolEvent::ToplevelCreated {
            surface: SurfaceId(1)
        })
        .is_err());
        assert!(matches!(thread.stop(), Err(CompositorError::Transport(_))));
    }

    #[test]
    fn drives_headless_host_across_threads() {
        let (ui, mut dispatcher) = ui_channel();
        let client = RecordingClient::new();
        let thread = CompositorThread::spawn(CompositorOptions::default(), ui, {
            let client = client.clone();
            move |_| Ok(Box::new(client) as Box<dyn ShellClient>)
        })
        .unwrap();
        dispatcher.attach_compositor(thread.handle());
        let mut events = thread.events().subscribe();
        let mut host = HeadlessHost::new(1.0);
        let handle = thread.handle();

        handle
            .deliver(ProtocolEvent::ToplevelCreated {
                surface: SurfaceId(1),
            })
            .unwrap();
        handle
            .deliver(ProtocolEvent::WindowGeometryChanged {
                surface: SurfaceId(1),
                geometry: Some(Rect::new(0, 0, 640, 480)),
            })
            .unwrap();

        wait_for(|| {
            dispatcher.pump_timeout(&mut host, Duration::from_millis(10));
            for event in host.take_events() {
                handle.notify(event).unwrap();
            }
            let shown = host.windows().any(|(_, window)| window.visible);
            shown
                && client
                    .requests()
                    .iter()
                    .any(|r| matches!(r, ClientRequest::Fullscreen { .. }))
        });

        let (window, state) = host.windows().next().unwrap();
        assert!(state.visible);
        assert!(host.has_window(window));
        assert_eq!(state.geometry.size(), Size::new(640, 480));

        thread.stop().unwrap();
        let mut ended = false;
        while let Ok(event) = events.try_recv() {
            ended |= event == EmbedEvent::SessionEnded;
        }
        assert!(ended);
    }
}
