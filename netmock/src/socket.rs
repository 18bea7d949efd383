//! Client connection endpoint.
//!
//! `WebSocket` mimics the observable lifecycle of the native client object:
//! construct with an address, (maybe) reach OPEN after one deferred hop,
//! exchange messages, close. All handshake outcomes (no server at the
//! address, accept-predicate rejection, sub-protocol negotiation failure)
//! are decided synchronously at construction but surfaced as deferred error
//! and close events, so the caller can finish wiring its handlers before the
//! first event fires.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::addr;
use crate::error::{SocketError, SocketResult};
use crate::event::Event;
use crate::event::factory::{CloseEventInit, create_close_event};
use crate::event::slot::HandlerSlot;
use crate::event::target::{EventTarget, Listener};
use crate::installer;
use crate::message::Message;
use crate::net::{SimNet, WeakSimNet};
use crate::ready::StateFuture;
use crate::steps::{RejectReason, Step};

/// Unique identity of a socket within its net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(pub(crate) u64);

/// Readiness state of a connection endpoint.
///
/// Transitions only move forward; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    /// Handshake scheduled but not yet resolved.
    Connecting,
    /// Connection established; sends are allowed.
    Open,
    /// Close in progress.
    Closing,
    /// Terminal state; no transition leaves it.
    Closed,
}

impl ReadyState {
    /// Numeric value matching the protocol constants (0 through 3).
    pub fn value(self) -> u16 {
        match self {
            ReadyState::Connecting => 0,
            ReadyState::Open => 1,
            ReadyState::Closing => 2,
            ReadyState::Closed => 3,
        }
    }
}

struct SocketInner {
    url: String,
    protocol: String,
    ready_state: ReadyState,
    target: EventTarget,
    on_open: HandlerSlot,
    on_message: HandlerSlot,
    on_error: HandlerSlot,
    on_close: HandlerSlot,
}

/// A client connection endpoint handle.
///
/// Cloning yields another handle to the same endpoint; identity comparisons
/// (registry membership, event targets) follow the endpoint, not the handle.
#[derive(Clone)]
pub struct WebSocket {
    id: SocketId,
    net: WeakSimNet,
    inner: Rc<RefCell<SocketInner>>,
}

impl PartialEq for WebSocket {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for WebSocket {}

impl fmt::Debug for WebSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("WebSocket");
        out.field("id", &self.id);
        if let Ok(inner) = self.inner.try_borrow() {
            out.field("url", &inner.url)
                .field("ready_state", &inner.ready_state);
        }
        out.finish()
    }
}

impl WebSocket {
    /// Opens a connection to `url` through `net`, offering `protocols` for
    /// sub-protocol negotiation.
    ///
    /// Address validation failures are synchronous errors. Everything else,
    /// including the absence of a server at the address, resolves through a
    /// single deferred step: the returned endpoint is `Connecting` until the
    /// net is pumped, and the caller can attach handlers in between without
    /// missing the first event.
    pub fn connect(net: &SimNet, url: &str, protocols: &[&str]) -> SocketResult<WebSocket> {
        let url = addr::normalize(url)?;
        let socket = WebSocket {
            id: net.allocate_socket_id(),
            net: net.downgrade(),
            inner: Rc::new(RefCell::new(SocketInner {
                url: url.clone(),
                protocol: protocols.first().map(|p| p.to_string()).unwrap_or_default(),
                ready_state: ReadyState::Connecting,
                target: EventTarget::new(),
                on_open: HandlerSlot::new("open"),
                on_message: HandlerSlot::new("message"),
                on_error: HandlerSlot::new("error"),
                on_close: HandlerSlot::new("close"),
            })),
        };

        let Some(server) = net.attach_socket(&socket, &url) else {
            net.schedule(Step::RefuseSocket {
                socket: socket.clone(),
            });
            return Ok(socket);
        };

        if let Some(verify) = server.verify_client() {
            if !verify() {
                net.schedule(Step::RejectSocket {
                    socket: socket.clone(),
                    reason: RejectReason::VerifyClient,
                });
                return Ok(socket);
            }
        }

        if let Some(select) = server.select_protocol() {
            let offered: Vec<String> = protocols.iter().map(|p| p.to_string()).collect();
            let selected = select(&offered);
            if !selected.is_empty() && !offered.contains(&selected) {
                net.schedule(Step::RejectSocket {
                    socket: socket.clone(),
                    reason: RejectReason::SubProtocol,
                });
                return Ok(socket);
            }
            socket.inner.borrow_mut().protocol = selected;
        }

        net.schedule(Step::OpenSocket {
            socket: socket.clone(),
            server,
        });
        Ok(socket)
    }

    /// Opens a connection through the net installed on the current thread
    /// (see [`crate::installer`]).
    pub fn connect_installed(url: &str, protocols: &[&str]) -> SocketResult<WebSocket> {
        let net = installer::installed().ok_or(SocketError::NoNetInstalled)?;
        Self::connect(&net, url, protocols)
    }

    /// The endpoint's identity within its net.
    pub fn id(&self) -> SocketId {
        self.id
    }

    /// The normalized address this endpoint connected to.
    pub fn url(&self) -> String {
        self.inner.borrow().url.clone()
    }

    /// The negotiated sub-protocol; empty when none was selected.
    pub fn protocol(&self) -> String {
        self.inner.borrow().protocol.clone()
    }

    /// Current readiness state.
    pub fn ready_state(&self) -> ReadyState {
        self.inner.borrow().ready_state
    }

    /// Sends a payload to the server.
    ///
    /// Sending before the handshake resolved is a usage error and detaches
    /// this endpoint from the address; sending on a closing or closed
    /// endpoint is a usage error. Sending when the server already closed is
    /// silently dropped.
    pub fn send(&self, data: impl Into<Message>) -> SocketResult<()> {
        match self.ready_state() {
            ReadyState::Connecting => {
                if let Ok(net) = self.net.upgrade() {
                    net.remove_socket(self, &self.url());
                }
                Err(SocketError::InvalidState(
                    "cannot send while still in CONNECTING state".to_string(),
                ))
            }
            ReadyState::Closing | ReadyState::Closed => Err(SocketError::InvalidState(
                "socket is already in CLOSING or CLOSED state".to_string(),
            )),
            ReadyState::Open => {
                let net = self.net.upgrade()?;
                let url = self.url();
                if let Some(server) = net.server_lookup(&url) {
                    net.schedule(Step::ForwardToServer {
                        server,
                        sender: self.clone(),
                        data: data.into(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Closes the connection. No-op unless the endpoint is open.
    ///
    /// Detaches from the registry, moves to `Closed`, dispatches a clean
    /// normal-closure close event to this endpoint, and notifies the
    /// server's close subscribers for this one peer. Siblings attached to
    /// the same address are unaffected.
    pub fn close(&self) {
        if self.ready_state() != ReadyState::Open {
            return;
        }
        let Ok(net) = self.net.upgrade() else {
            return;
        };
        let url = self.url();
        let server = net.server_lookup(&url);

        net.remove_socket(self, &url);
        self.move_to_state(ReadyState::Closed);
        self.deliver(create_close_event(
            CloseEventInit::default().target(self.clone()),
        ));

        if let Some(server) = server {
            server.notify_close(Some(self.clone()));
        }
    }

    /// Resolves once the handshake outcome is known: the first state other
    /// than `Connecting`. Requires something to pump the net's step queue.
    pub fn ready(&self) -> StateFuture {
        StateFuture::new(self.clone())
    }

    /// Registers a listener for `kind`; duplicate registrations of the same
    /// callback are collapsed to one entry.
    pub fn add_event_listener(&self, kind: &str, listener: &Listener) {
        self.inner.borrow_mut().target.add_listener(kind, listener);
    }

    /// Removes a previously registered listener; no-op when absent.
    pub fn remove_event_listener(&self, kind: &str, listener: &Listener) {
        self.inner.borrow_mut().target.remove_listener(kind, listener);
    }

    /// Dispatches an event on this endpoint, stamping it as target if no
    /// target was set. Returns `false` when no listener handled it.
    pub fn dispatch_event(&self, mut event: Event) -> bool {
        event.set_target(self.clone());
        self.deliver(event)
    }

    /// Installs the single-slot `open` handler; `None` clears it.
    pub fn set_onopen(&self, handler: Option<Listener>) {
        let mut inner = self.inner.borrow_mut();
        let SocketInner { target, on_open, .. } = &mut *inner;
        on_open.set(target, handler);
    }

    /// Installs the single-slot `message` handler; `None` clears it.
    pub fn set_onmessage(&self, handler: Option<Listener>) {
        let mut inner = self.inner.borrow_mut();
        let SocketInner {
            target, on_message, ..
        } = &mut *inner;
        on_message.set(target, handler);
    }

    /// Installs the single-slot `error` handler; `None` clears it.
    pub fn set_onerror(&self, handler: Option<Listener>) {
        let mut inner = self.inner.borrow_mut();
        let SocketInner {
            target, on_error, ..
        } = &mut *inner;
        on_error.set(target, handler);
    }

    /// Installs the single-slot `close` handler; `None` clears it.
    pub fn set_onclose(&self, handler: Option<Listener>) {
        let mut inner = self.inner.borrow_mut();
        let SocketInner {
            target, on_close, ..
        } = &mut *inner;
        on_close.set(target, handler);
    }

    /// Moves the state machine forward. Backward transitions and transitions
    /// out of `Closed` are ignored; a real transition wakes state futures.
    pub(crate) fn move_to_state(&self, state: ReadyState) {
        {
            let mut inner = self.inner.borrow_mut();
            if state <= inner.ready_state {
                return;
            }
            inner.ready_state = state;
        }
        if let Ok(net) = self.net.upgrade() {
            net.wake_socket(self.id);
        }
    }

    /// Delivers an already-prepared event to this endpoint's listeners.
    ///
    /// Works from a snapshot taken at dispatch start, with no inner borrow
    /// held while callbacks run.
    pub(crate) fn deliver(&self, event: Event) -> bool {
        let snapshot = self.inner.borrow().target.snapshot(event.kind());
        if snapshot.is_empty() {
            return false;
        }
        for listener in &snapshot {
            listener(&event);
        }
        true
    }

    pub(crate) fn net_handle(&self) -> &WeakSimNet {
        &self.net
    }
}
