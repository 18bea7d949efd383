//! Event object model and listener dispatch substrate.
//!
//! Both endpoint kinds build on this module: the client endpoint dispatches
//! full event objects through an [`EventTarget`] registry, while the server
//! endpoint reuses the same registration semantics with typed callbacks (see
//! `server`). Events are immutable records after construction; the dispatching
//! endpoint stamps the target exactly once, at dispatch-preparation time.

/// Event construction factory.
pub mod factory;
/// Single-slot handler adapter over the listener registry.
pub mod slot;
/// Listener registry and dispatch.
pub mod target;

pub use factory::{
    CloseEventInit, EventInit, MessageEventInit, create_close_event, create_event,
    create_message_event,
};
pub use slot::HandlerSlot;
pub use target::{EventTarget, Listener};

use std::cell::Cell;
use std::time::SystemTime;

use crate::message::Message;
use crate::socket::WebSocket;

/// Status code for a clean, normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Status code for an endpoint going away.
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// Status code for a protocol error.
pub const CLOSE_PROTOCOL_ERROR: u16 = 1002;
/// Status code for an unsupported data type.
pub const CLOSE_UNSUPPORTED: u16 = 1003;
/// Status code reserved for "no status present".
pub const CLOSE_NO_STATUS: u16 = 1005;
/// Status code for an abnormal closure without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Payload carried by an event, distinguishing the two specializations.
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// A plain event (`open`, `error`) with no payload.
    None,
    /// A message event carrying data from the peer.
    Message {
        /// The delivered payload.
        data: Message,
        /// Address of the endpoint that originated the message.
        origin: String,
        /// Last event id, unused by this mock but part of the event shape.
        last_event_id: String,
    },
    /// A close event describing how the connection ended.
    Close {
        /// Close status code.
        code: u16,
        /// Human-readable close reason.
        reason: String,
        /// Whether the connection closed cleanly.
        was_clean: bool,
    },
}

/// An event delivered to listener callbacks.
///
/// Constructed through the [`factory`] functions; the non-empty event type is
/// enforced there. The propagation and default flags use interior mutability
/// so listeners holding `&Event` can record them, but the dispatcher itself
/// does not interpret them.
#[derive(Debug, Clone)]
pub struct Event {
    kind: String,
    bubbles: bool,
    cancelable: bool,
    composed: bool,
    time_stamp: SystemTime,
    target: Option<WebSocket>,
    current_target: Option<WebSocket>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    immediate_propagation_stopped: Cell<bool>,
    payload: EventPayload,
}

impl Event {
    pub(crate) fn new(
        kind: String,
        bubbles: bool,
        cancelable: bool,
        composed: bool,
        payload: EventPayload,
    ) -> Self {
        Self {
            kind,
            bubbles,
            cancelable,
            composed,
            time_stamp: SystemTime::now(),
            target: None,
            current_target: None,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
            immediate_propagation_stopped: Cell::new(false),
            payload,
        }
    }

    /// The event type this event was dispatched under.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Whether the event bubbles.
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Whether the event is cancelable.
    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    /// Whether the event propagates across shadow boundaries.
    pub fn composed(&self) -> bool {
        self.composed
    }

    /// Wall-clock construction time.
    pub fn time_stamp(&self) -> SystemTime {
        self.time_stamp
    }

    /// The endpoint the event was dispatched on, once prepared for dispatch.
    pub fn target(&self) -> Option<&WebSocket> {
        self.target.as_ref()
    }

    /// The endpoint currently handling the event.
    pub fn current_target(&self) -> Option<&WebSocket> {
        self.current_target.as_ref()
    }

    /// The payload carried by this event.
    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// The message payload, if this is a message event.
    pub fn message_data(&self) -> Option<&Message> {
        match &self.payload {
            EventPayload::Message { data, .. } => Some(data),
            _ => None,
        }
    }

    /// The origin address, if this is a message event.
    pub fn origin(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Message { origin, .. } => Some(origin),
            _ => None,
        }
    }

    /// The close code, if this is a close event.
    pub fn close_code(&self) -> Option<u16> {
        match &self.payload {
            EventPayload::Close { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The close reason, if this is a close event.
    pub fn close_reason(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Close { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Whether the close was clean, if this is a close event.
    pub fn was_clean(&self) -> Option<bool> {
        match &self.payload {
            EventPayload::Close { was_clean, .. } => Some(*was_clean),
            _ => None,
        }
    }

    /// Records that the default action should be suppressed.
    ///
    /// Only honored for cancelable events; dispatch itself attaches no
    /// default actions, so the flag is informational.
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    /// Whether `prevent_default` has been recorded.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Records a propagation stop. Dispatch does not interpret the flag.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    /// Whether `stop_propagation` has been recorded.
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// Records an immediate propagation stop. Dispatch does not interpret
    /// the flag.
    pub fn stop_immediate_propagation(&self) {
        self.immediate_propagation_stopped.set(true);
    }

    /// Whether `stop_immediate_propagation` has been recorded.
    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped.get()
    }

    /// Stamps the target endpoint. First stamp wins; dispatch preparation
    /// calls this exactly once per event.
    pub(crate) fn set_target(&mut self, target: WebSocket) {
        if self.target.is_none() {
            self.current_target = Some(target.clone());
            self.target = Some(target);
        }
    }
}
