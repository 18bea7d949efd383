//! Event construction from configuration records.
//!
//! Endpoints never build [`Event`] values directly; they describe the event
//! with an init record and let the factory apply defaults and stamp the
//! target. A non-empty event type is a construction contract: the factories
//! assert it rather than producing a typeless event.

use super::{CLOSE_NORMAL, Event, EventPayload};
use crate::message::Message;
use crate::socket::WebSocket;

/// Configuration for a plain event.
#[derive(Debug, Clone, Default)]
pub struct EventInit {
    /// Event type; must be non-empty.
    pub kind: String,
    /// Whether the event bubbles.
    pub bubbles: bool,
    /// Whether the event is cancelable.
    pub cancelable: bool,
    /// Whether the event propagates across shadow boundaries.
    pub composed: bool,
    /// Endpoint to stamp as target, when dispatch preparation is known.
    pub target: Option<WebSocket>,
}

impl EventInit {
    /// Init record for an event of the given type.
    pub fn of(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Self::default()
        }
    }

    /// Sets the target endpoint.
    pub fn target(mut self, target: WebSocket) -> Self {
        self.target = Some(target);
        self
    }
}

/// Configuration for a message event.
#[derive(Debug, Clone)]
pub struct MessageEventInit {
    /// Event type; defaults to `message`, must be non-empty.
    pub kind: String,
    /// Delivered payload.
    pub data: Message,
    /// Address of the originating endpoint.
    pub origin: String,
    /// Last event id; empty unless the caller supplies one.
    pub last_event_id: String,
    /// Endpoint to stamp as target.
    pub target: Option<WebSocket>,
}

impl MessageEventInit {
    /// Init record for a `message` event carrying `data`.
    pub fn of(data: Message) -> Self {
        Self {
            kind: "message".to_string(),
            data,
            origin: String::new(),
            last_event_id: String::new(),
            target: None,
        }
    }

    /// Overrides the event type (used for custom emitted events).
    pub fn kind(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    /// Sets the origin address.
    pub fn origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }

    /// Sets the target endpoint.
    pub fn target(mut self, target: WebSocket) -> Self {
        self.target = Some(target);
        self
    }
}

/// Configuration for a close event.
#[derive(Debug, Clone, Default)]
pub struct CloseEventInit {
    /// Close status code; defaults to the normal-closure code.
    pub code: Option<u16>,
    /// Close reason; defaults to empty.
    pub reason: Option<String>,
    /// Whether the close was clean. When absent, defaults to `true` exactly
    /// when the effective code is the normal-closure code.
    pub was_clean: Option<bool>,
    /// Endpoint to stamp as target.
    pub target: Option<WebSocket>,
}

impl CloseEventInit {
    /// Init record with an explicit close code.
    pub fn with_code(code: u16) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    /// Sets the close reason.
    pub fn reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    /// Sets the clean-close flag explicitly.
    pub fn was_clean(mut self, was_clean: bool) -> Self {
        self.was_clean = Some(was_clean);
        self
    }

    /// Sets the target endpoint.
    pub fn target(mut self, target: WebSocket) -> Self {
        self.target = Some(target);
        self
    }
}

/// Builds a plain event from its init record.
///
/// # Panics
///
/// Panics when `init.kind` is empty; a typeless event is a contract
/// violation, not a runtime condition.
pub fn create_event(init: EventInit) -> Event {
    assert!(!init.kind.is_empty(), "event type must be non-empty");
    let mut event = Event::new(
        init.kind,
        init.bubbles,
        init.cancelable,
        init.composed,
        EventPayload::None,
    );
    if let Some(target) = init.target {
        event.set_target(target);
    }
    event
}

/// Builds a message event from its init record.
///
/// # Panics
///
/// Panics when `init.kind` is empty.
pub fn create_message_event(init: MessageEventInit) -> Event {
    assert!(!init.kind.is_empty(), "event type must be non-empty");
    let mut event = Event::new(
        init.kind,
        false,
        false,
        false,
        EventPayload::Message {
            data: init.data,
            origin: init.origin,
            last_event_id: init.last_event_id,
        },
    );
    if let Some(target) = init.target {
        event.set_target(target);
    }
    event
}

/// Builds a close event from its init record.
///
/// The code defaults to [`CLOSE_NORMAL`]; `was_clean` defaults to `true`
/// exactly when the effective code is the normal-closure code and no
/// explicit value was supplied.
pub fn create_close_event(init: CloseEventInit) -> Event {
    let code = init.code.unwrap_or(CLOSE_NORMAL);
    let was_clean = init.was_clean.unwrap_or(code == CLOSE_NORMAL);
    let mut event = Event::new(
        "close".to_string(),
        false,
        false,
        false,
        EventPayload::Close {
            code,
            reason: init.reason.unwrap_or_default(),
            was_clean,
        },
    );
    if let Some(target) = init.target {
        event.set_target(target);
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_event_defaults() {
        let event = create_event(EventInit::of("open"));
        assert_eq!(event.kind(), "open");
        assert!(!event.bubbles());
        assert!(!event.cancelable());
        assert!(event.target().is_none());
        assert!(matches!(event.payload(), EventPayload::None));
    }

    #[test]
    #[should_panic(expected = "event type must be non-empty")]
    fn empty_type_is_a_contract_violation() {
        let _ = create_event(EventInit::default());
    }

    #[test]
    fn message_event_carries_payload_and_origin() {
        let event = create_message_event(
            MessageEventInit::of(Message::text("hi")).origin("ws://example.com/"),
        );
        assert_eq!(event.kind(), "message");
        assert_eq!(event.message_data(), Some(&Message::text("hi")));
        assert_eq!(event.origin(), Some("ws://example.com/"));
    }

    #[test]
    fn close_event_defaults_to_clean_normal_closure() {
        let event = create_close_event(CloseEventInit::default());
        assert_eq!(event.close_code(), Some(CLOSE_NORMAL));
        assert_eq!(event.was_clean(), Some(true));
        assert_eq!(event.close_reason(), Some(""));
    }

    #[test]
    fn close_event_non_normal_code_is_unclean_by_default() {
        let event = create_close_event(CloseEventInit::with_code(1005).reason("going away"));
        assert_eq!(event.close_code(), Some(1005));
        assert_eq!(event.was_clean(), Some(false));
        assert_eq!(event.close_reason(), Some("going away"));
    }

    #[test]
    fn explicit_was_clean_wins_over_the_default() {
        let event = create_close_event(CloseEventInit::with_code(1005).was_clean(true));
        assert_eq!(event.was_clean(), Some(true));

        let event = create_close_event(CloseEventInit::with_code(CLOSE_NORMAL).was_clean(false));
        assert_eq!(event.was_clean(), Some(false));
    }
}
