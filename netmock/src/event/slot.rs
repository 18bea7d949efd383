//! Single-slot handler adapter.
//!
//! The `on*` handler properties of the client endpoint hold at most one
//! callback per event type, layered over the multi-listener registry. The
//! slot tracks the currently installed callback and forwards add/remove to
//! the generic registry, keeping replacement semantics out of the endpoint
//! state machine.

use super::target::{EventTarget, Listener};

/// Tracks the single installed handler for one event type.
pub struct HandlerSlot {
    kind: &'static str,
    current: Option<Listener>,
}

impl std::fmt::Debug for HandlerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerSlot")
            .field("kind", &self.kind)
            .field("installed", &self.current.is_some())
            .finish()
    }
}

impl HandlerSlot {
    /// Creates an empty slot for the given event type.
    pub fn new(kind: &'static str) -> Self {
        Self { kind, current: None }
    }

    /// Installs `callback` as the sole slot handler, removing any previous
    /// one from the registry. `None` clears the slot.
    pub fn set(&mut self, registry: &mut EventTarget, callback: Option<Listener>) {
        if let Some(previous) = self.current.take() {
            registry.remove_listener(self.kind, &previous);
        }
        if let Some(callback) = callback {
            registry.add_listener(self.kind, &callback);
            self.current = Some(callback);
        }
    }

    /// The currently installed handler, if any.
    pub fn current(&self) -> Option<&Listener> {
        self.current.as_ref()
    }
}
