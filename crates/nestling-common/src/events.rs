use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{OutputId, SurfaceId, WindowId};

/// Observable milestones of an embedding session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EmbedEvent {
    OutputCreated { output: OutputId, window: WindowId },
    OutputRemoved { output: OutputId },
    SurfaceAttached { surface: SurfaceId, window: WindowId },
    SurfaceDetached { surface: SurfaceId, window: WindowId },
    SurfaceReady { surface: SurfaceId, window: WindowId },
    WindowShown { window: WindowId },
    TitleChanged { window: WindowId, title: String },
    SessionEnded,
    #[serde(other)]
    Unknown,
}

pub type EventReceiver = broadcast::Receiver<EmbedEvent>;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EmbedEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: EmbedEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}
