pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{CompositorError, ConfigError, NestlingError};
pub use events::{EmbedEvent, EventBus, EventReceiver};
pub use id::{default_socket_name, new_correlation_id, new_id, SessionId};
pub use types::{OutputId, Point, Rect, Size, SurfaceId, SurfaceRole, WindowId};

pub type Result<T> = std::result::Result<T, NestlingError>;
