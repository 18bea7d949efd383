//! Listener registry and dispatch.
//!
//! Each endpoint owns one [`EventTarget`]: a mapping from event type to an
//! insertion-ordered sequence of callbacks. Registration is idempotent per
//! callback identity (`Rc` pointer equality), removal of an absent callback
//! is a no-op, and dispatch reports whether any listener handled the event.

use std::collections::HashMap;
use std::rc::Rc;

use super::Event;

/// A listener callback held by the registry.
///
/// Identity comparisons use `Rc::ptr_eq`.
pub type Listener = Rc<dyn Fn(&Event)>;

/// Per-endpoint listener registry.
#[derive(Default)]
pub struct EventTarget {
    listeners: HashMap<String, Vec<Listener>>,
}

impl EventTarget {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `kind`. Registering the same callback twice
    /// for the same type keeps a single entry.
    pub fn add_listener(&mut self, kind: &str, callback: &Listener) {
        let entries = self.listeners.entry(kind.to_string()).or_default();
        if !entries.iter().any(|existing| Rc::ptr_eq(existing, callback)) {
            entries.push(Rc::clone(callback));
        }
    }

    /// Removes `callback` from the entries for `kind`; no-op when absent.
    pub fn remove_listener(&mut self, kind: &str, callback: &Listener) {
        if let Some(entries) = self.listeners.get_mut(kind) {
            entries.retain(|existing| !Rc::ptr_eq(existing, callback));
            if entries.is_empty() {
                self.listeners.remove(kind);
            }
        }
    }

    /// Returns a snapshot of the listeners registered for `kind`.
    ///
    /// Dispatch works from this snapshot, so listeners added or removed by a
    /// running callback only affect later dispatches.
    pub fn snapshot(&self, kind: &str) -> Vec<Listener> {
        self.listeners.get(kind).cloned().unwrap_or_default()
    }

    /// Returns `true` if at least one listener is registered for `kind`.
    pub fn has_listeners(&self, kind: &str) -> bool {
        self.listeners.get(kind).is_some_and(|entries| !entries.is_empty())
    }

    /// Dispatches `event` to every listener registered for its type, in
    /// registration order, synchronously on the current call stack.
    ///
    /// Returns `false` when no listeners exist for the type.
    pub fn dispatch(&self, event: &Event) -> bool {
        let snapshot = self.snapshot(event.kind());
        if snapshot.is_empty() {
            return false;
        }
        for listener in &snapshot {
            listener(event);
        }
        true
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(kind, entries)| (kind.as_str(), entries.len()))
            .collect();
        f.debug_struct("EventTarget").field("listeners", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::factory::{EventInit, create_event};
    use std::cell::RefCell;

    fn counter_listener(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> Listener {
        let log = Rc::clone(log);
        Rc::new(move |_event: &Event| log.borrow_mut().push(tag))
    }

    #[test]
    fn dispatch_without_listeners_reports_not_handled() {
        let target = EventTarget::new();
        assert!(!target.dispatch(&create_event(EventInit::of("open"))));
    }

    #[test]
    fn duplicate_registration_is_collapsed() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let listener = counter_listener(&log, "once");

        let mut target = EventTarget::new();
        target.add_listener("message", &listener);
        target.add_listener("message", &listener);

        assert!(target.dispatch(&create_event(EventInit::of("message"))));
        assert_eq!(*log.borrow(), vec!["once"]);
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = counter_listener(&log, "first");
        let second = counter_listener(&log, "second");

        let mut target = EventTarget::new();
        target.add_listener("open", &first);
        target.add_listener("open", &second);
        target.dispatch(&create_event(EventInit::of("open")));

        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn removing_an_unregistered_listener_is_a_no_op() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let registered = counter_listener(&log, "kept");
        let stranger = counter_listener(&log, "stranger");

        let mut target = EventTarget::new();
        target.add_listener("close", &registered);
        target.remove_listener("close", &stranger);
        target.remove_listener("never-added", &stranger);

        target.dispatch(&create_event(EventInit::of("close")));
        assert_eq!(*log.borrow(), vec!["kept"]);
    }

    #[test]
    fn removal_empties_the_entry() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let listener = counter_listener(&log, "gone");

        let mut target = EventTarget::new();
        target.add_listener("open", &listener);
        target.remove_listener("open", &listener);

        assert!(!target.has_listeners("open"));
        assert!(!target.dispatch(&create_event(EventInit::of("open"))));
    }

    #[test]
    fn snapshot_isolates_dispatch_from_mutation() {
        // The registry snapshots at dispatch start; a listener registered by
        // a running callback is not invoked until the next dispatch.
        let target = Rc::new(RefCell::new(EventTarget::new()));
        let log = Rc::new(RefCell::new(Vec::new()));

        let late = counter_listener(&log, "late");
        let eager = {
            let target = Rc::clone(&target);
            let log = Rc::clone(&log);
            let late = late.clone();
            Rc::new(move |_event: &Event| {
                log.borrow_mut().push("eager");
                target.borrow_mut().add_listener("tick", &late);
            }) as Listener
        };

        target.borrow_mut().add_listener("tick", &eager);

        let event = create_event(EventInit::of("tick"));
        let snapshot = target.borrow().snapshot("tick");
        for listener in &snapshot {
            listener(&event);
        }
        assert_eq!(*log.borrow(), vec!["eager"]);

        let snapshot = target.borrow().snapshot("tick");
        for listener in &snapshot {
            listener(&event);
        }
        assert_eq!(*log.borrow(), vec!["eager", "eager", "late"]);
    }
}
