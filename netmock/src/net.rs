//! The net: process-scoped coordination for endpoints.
//!
//! `SimNet` owns all shared mutable state of the mock (the address registry
//! and the deferred-step queue) and provides the pump that drives deferred
//! work. It is the explicit, constructible stand-in for a process-wide
//! singleton: tests create one per case (or call [`SimNet::reset`] between
//! cases) and endpoints reach it through weak handles, so dropping the net
//! invalidates every endpoint cleanly.
//!
//! Execution is single-threaded and cooperative. A deferred step runs to
//! completion before the next one begins; registry operations are single
//! atomic borrows, so no endpoint ever observes a partially updated
//! registry. No `RefCell` borrow is held while user callbacks run, which
//! makes it safe for a callback to create endpoints, send, or close.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::task::Waker;

use tracing::instrument;

use crate::addr;
use crate::error::{SocketError, SocketResult};
use crate::event::factory::{CloseEventInit, EventInit, create_close_event, create_event};
use crate::registry::AddressRegistry;
use crate::server::Server;
use crate::socket::{ReadyState, SocketId, WebSocket};
use crate::steps::{ScheduledStep, Step, StepQueue};

#[derive(Debug, Default)]
struct NetInner {
    registry: AddressRegistry,
    queue: StepQueue,
    next_socket_id: u64,
    state_wakers: HashMap<SocketId, Vec<Waker>>,
    steps_processed: u64,
}

/// The shared net that endpoints attach to.
///
/// Cloning yields another handle to the same net. All state lives behind a
/// single `Rc<RefCell<..>>`; handles held by endpoints are weak, so the net
/// is gone once the last `SimNet` handle drops.
#[derive(Debug, Clone, Default)]
pub struct SimNet {
    inner: Rc<RefCell<NetInner>>,
}

impl SimNet {
    /// Creates an empty net with no bound addresses and no pending steps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a weak handle to this net.
    pub fn downgrade(&self) -> WeakSimNet {
        WeakSimNet {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Processes the next deferred step.
    ///
    /// Returns `true` if more steps are pending afterwards, `false` when the
    /// queue is empty (including when it was already empty). Steps scheduled
    /// by callbacks running inside this step are processed on later calls.
    #[instrument(skip(self))]
    pub fn step(&mut self) -> bool {
        let next = self.inner.borrow_mut().queue.pop_next();
        let Some(scheduled) = next else {
            return false;
        };
        self.inner.borrow_mut().steps_processed += 1;
        tracing::trace!(sequence = scheduled.sequence(), "processing deferred step");
        self.process_step(scheduled);
        !self.inner.borrow().queue.is_empty()
    }

    /// Processes deferred steps until the queue drains.
    ///
    /// Callbacks may keep scheduling new steps; those are processed too, in
    /// scheduling order.
    #[instrument(skip(self))]
    pub fn run_until_idle(&mut self) {
        while self.step() {}
        tracing::debug!(
            steps_processed = self.steps_processed(),
            "net idle, step queue drained"
        );
    }

    /// Returns `true` if deferred steps are waiting to run.
    pub fn has_pending_steps(&self) -> bool {
        !self.inner.borrow().queue.is_empty()
    }

    /// Number of deferred steps waiting to run.
    pub fn pending_steps(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Total number of steps processed since construction or the last reset.
    pub fn steps_processed(&self) -> u64 {
        self.inner.borrow().steps_processed
    }

    /// Clears the registry, the step queue, and all registered wakers.
    ///
    /// Endpoints created before the reset keep their local state but are no
    /// longer attached to anything; intended for isolation between test
    /// cases sharing one net.
    pub fn reset(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.registry.clear();
        inner.queue.clear();
        inner.state_wakers.clear();
        inner.steps_processed = 0;
        tracing::debug!("net reset");
    }

    /// The server bound at `url`, if any. Pure read; unknown or malformed
    /// addresses report absent.
    pub fn server_at(&self, url: &str) -> Option<Server> {
        let url = addr::normalize(url).ok()?;
        self.inner.borrow().registry.server_lookup(&url)
    }

    /// Snapshot of the sockets attached at `url`. Pure read; unknown or
    /// malformed addresses report an empty set. Mutating the snapshot does
    /// not affect the registry.
    pub fn sockets_at(&self, url: &str) -> Vec<WebSocket> {
        match addr::normalize(url) {
            Ok(url) => self.inner.borrow().registry.sockets_lookup(&url),
            Err(_) => Vec::new(),
        }
    }

    pub(crate) fn allocate_socket_id(&self) -> SocketId {
        let mut inner = self.inner.borrow_mut();
        let id = SocketId(inner.next_socket_id);
        inner.next_socket_id += 1;
        id
    }

    pub(crate) fn schedule(&self, step: Step) {
        let sequence = self.inner.borrow_mut().queue.schedule(step);
        tracing::trace!(sequence, "scheduled deferred step");
    }

    pub(crate) fn attach_server(&self, server: &Server, url: &str) -> bool {
        let attached = self.inner.borrow_mut().registry.attach_server(server, url);
        tracing::debug!(url, attached, "attach server");
        attached
    }

    pub(crate) fn attach_socket(&self, socket: &WebSocket, url: &str) -> Option<Server> {
        self.inner.borrow_mut().registry.attach_socket(socket, url)
    }

    pub(crate) fn server_lookup(&self, url: &str) -> Option<Server> {
        self.inner.borrow().registry.server_lookup(url)
    }

    pub(crate) fn sockets_lookup(&self, url: &str) -> Vec<WebSocket> {
        self.inner.borrow().registry.sockets_lookup(url)
    }

    pub(crate) fn remove_server(&self, url: &str) {
        self.inner.borrow_mut().registry.remove_server(url);
        tracing::debug!(url, "removed server");
    }

    pub(crate) fn remove_socket(&self, socket: &WebSocket, url: &str) {
        self.inner.borrow_mut().registry.remove_socket(socket, url);
    }

    pub(crate) fn register_state_waker(&self, id: SocketId, waker: Waker) {
        self.inner
            .borrow_mut()
            .state_wakers
            .entry(id)
            .or_default()
            .push(waker);
    }

    pub(crate) fn wake_socket(&self, id: SocketId) {
        let wakers = self.inner.borrow_mut().state_wakers.remove(&id);
        if let Some(wakers) = wakers {
            for waker in wakers {
                waker.wake();
            }
        }
    }

    /// Runs one step to completion. No `NetInner` borrow is held here, so
    /// callbacks are free to call back into the net.
    fn process_step(&self, scheduled: ScheduledStep) {
        match scheduled.into_step() {
            Step::OpenSocket { socket, server } => {
                // The server may have force-closed the socket while the
                // handshake was in flight; CLOSED is terminal.
                if socket.ready_state() != ReadyState::Connecting {
                    return;
                }
                socket.move_to_state(ReadyState::Open);
                socket.deliver(create_event(EventInit::of("open").target(socket.clone())));
                server.notify_connection(socket);
            }
            Step::RefuseSocket { socket } => {
                socket.move_to_state(ReadyState::Closed);
                socket.deliver(create_event(EventInit::of("error").target(socket.clone())));
                socket.deliver(create_close_event(
                    CloseEventInit::default().target(socket.clone()),
                ));
                tracing::error!(url = %socket.url(), "connection failed: no server is listening");
            }
            Step::RejectSocket { socket, reason } => {
                let url = socket.url();
                self.remove_socket(&socket, &url);
                socket.move_to_state(ReadyState::Closed);
                socket.deliver(create_event(EventInit::of("error").target(socket.clone())));
                socket.deliver(create_close_event(
                    CloseEventInit::default().target(socket.clone()),
                ));
                tracing::error!(url = %url, %reason, "connection failed");
            }
            Step::ForwardToServer {
                server,
                sender,
                data,
            } => {
                server.notify_message(sender, &data);
            }
            Step::DeliverEvent { target, event } => {
                target.deliver(event);
            }
        }
    }
}

/// Weak handle to a [`SimNet`].
///
/// Endpoints hold these so they never keep the net alive; operations on an
/// endpoint whose net has been dropped fail with [`SocketError::Shutdown`]
/// or degrade to no-ops, matching the silent no-op taxonomy.
#[derive(Debug, Clone)]
pub struct WeakSimNet {
    inner: Weak<RefCell<NetInner>>,
}

impl WeakSimNet {
    /// Upgrades to a strong handle, failing when the net has been dropped.
    pub fn upgrade(&self) -> SocketResult<SimNet> {
        self.inner
            .upgrade()
            .map(|inner| SimNet { inner })
            .ok_or(SocketError::Shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ServerOptions;

    #[test]
    fn steps_run_in_scheduling_order() {
        let mut net = SimNet::new();
        let _server = Server::bind(&net, "ws://ordered", ServerOptions::new()).unwrap();
        let first = WebSocket::connect(&net, "ws://ordered", &[]).unwrap();
        let second = WebSocket::connect(&net, "ws://ordered", &[]).unwrap();

        assert_eq!(net.pending_steps(), 2);

        // First constructed, first resolved.
        net.step();
        assert_eq!(first.ready_state(), ReadyState::Open);
        assert_eq!(second.ready_state(), ReadyState::Connecting);

        net.step();
        assert_eq!(second.ready_state(), ReadyState::Open);
        assert!(!net.has_pending_steps());
    }

    #[test]
    fn step_reports_remaining_work() {
        let mut net = SimNet::new();
        assert!(!net.step());

        let _server = Server::bind(&net, "ws://remaining", ServerOptions::new()).unwrap();
        let _a = WebSocket::connect(&net, "ws://remaining", &[]).unwrap();
        let _b = WebSocket::connect(&net, "ws://remaining", &[]).unwrap();

        assert!(net.step());
        assert!(!net.step());
        assert_eq!(net.steps_processed(), 2);
    }

    #[test]
    fn reset_clears_registry_and_queue() {
        let mut net = SimNet::new();
        let _server = Server::bind(&net, "ws://fresh", ServerOptions::new()).unwrap();
        let _socket = WebSocket::connect(&net, "ws://fresh", &[]).unwrap();
        assert!(net.has_pending_steps());

        net.reset();
        assert!(!net.has_pending_steps());
        assert!(net.server_at("ws://fresh").is_none());
        assert!(net.sockets_at("ws://fresh").is_empty());

        // The address is free to bind again.
        let rebound = Server::bind(&net, "ws://fresh", ServerOptions::new());
        assert!(rebound.is_ok());
        net.run_until_idle();
    }

    #[test]
    fn upgrade_after_drop_reports_shutdown() {
        let net = SimNet::new();
        let weak = net.downgrade();
        assert!(weak.upgrade().is_ok());

        drop(net);
        assert_eq!(weak.upgrade().unwrap_err(), SocketError::Shutdown);
    }
}
