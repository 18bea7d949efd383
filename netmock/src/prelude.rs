//! Convenience re-exports for tests.
//!
//! ```
//! use netmock::prelude::*;
//! ```

pub use crate::error::{SocketError, SocketResult};
pub use crate::event::factory::{
    CloseEventInit, EventInit, MessageEventInit, create_close_event, create_event,
    create_message_event,
};
pub use crate::event::target::Listener;
pub use crate::event::{CLOSE_NORMAL, Event, EventPayload};
pub use crate::message::Message;
pub use crate::net::{SimNet, WeakSimNet};
pub use crate::server::{CloseOptions, Server, ServerOptions};
pub use crate::socket::{ReadyState, SocketId, WebSocket};
