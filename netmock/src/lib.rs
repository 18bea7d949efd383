//! # Netmock
//!
//! An in-process mock of the client/server socket lifecycle for tests.
//!
//! A [`SimNet`] holds an address registry and a deterministic step queue.
//! Tests bind a [`Server`] to an address, point a [`WebSocket`] at it, and
//! pump the net with [`SimNet::step`] or [`SimNet::run_until_idle`]. Each
//! handshake, delivery, and failure resolves as an explicit step, in the
//! order it was scheduled, on a single thread with no I/O.
//!
//! ```
//! use netmock::prelude::*;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut net = SimNet::new();
//! let server = Server::bind(&net, "ws://localhost:8080", ServerOptions::new()).unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! server.on_message(Rc::new(move |_client, data: &Message| {
//!     sink.borrow_mut().push(data.clone());
//! }));
//!
//! let socket = WebSocket::connect(&net, "ws://localhost:8080", &[]).unwrap();
//! net.run_until_idle();
//! assert_eq!(socket.ready_state(), ReadyState::Open);
//!
//! socket.send("ping").unwrap();
//! net.run_until_idle();
//! assert_eq!(*seen.borrow(), vec![Message::text("ping")]);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

/// Address parsing and normalization.
pub mod addr;
/// Error types for socket and net operations.
pub mod error;
/// Events, their factories, and listener registration.
pub mod event;
/// Thread-local default net for code that cannot thread a handle through.
pub mod installer;
/// Message payloads exchanged between endpoints.
pub mod message;
/// The simulated net: address registry and deterministic step queue.
pub mod net;
/// Convenience re-exports.
pub mod prelude;
/// Future resolving a client handshake outcome.
pub mod ready;
/// Server endpoint bound to an address.
pub mod server;
/// Client connection endpoint.
pub mod socket;

mod registry;
mod steps;

pub use error::{SocketError, SocketResult};
pub use event::{Event, EventPayload};
pub use message::Message;
pub use net::{SimNet, WeakSimNet};
pub use ready::StateFuture;
pub use server::{CloseOptions, Server, ServerOptions};
pub use socket::{ReadyState, SocketId, WebSocket};
