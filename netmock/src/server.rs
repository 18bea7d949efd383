//! Server endpoint bound to an address.
//!
//! A `Server` owns one address in its net's registry for its lifetime.
//! Clients reach it through [`WebSocket::connect`]; the server observes them
//! through typed subscriber lists (connection, message, close) rather than a
//! string-keyed event map, and pushes data back through [`Server::send`] and
//! [`Server::emit`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::addr;
use crate::error::{SocketError, SocketResult};
use crate::event::factory::{
    CloseEventInit, EventInit, MessageEventInit, create_close_event, create_event,
    create_message_event,
};
use crate::installer;
use crate::message::Message;
use crate::net::{SimNet, WeakSimNet};
use crate::socket::{ReadyState, WebSocket};
use crate::steps::Step;

/// Handshake predicate: accept or reject an incoming client.
pub type VerifyClient = Rc<dyn Fn() -> bool>;
/// Sub-protocol selector: pick one of the offered protocols (or return an
/// empty string to select none).
pub type SelectProtocol = Rc<dyn Fn(&[String]) -> String>;

/// Subscriber for accepted clients.
pub type ConnectionHandler = Rc<dyn Fn(WebSocket)>;
/// Subscriber for client payloads; receives the sending endpoint.
pub type MessageHandler = Rc<dyn Fn(WebSocket, &Message)>;
/// Subscriber for closures. `Some` carries the closing client; `None` means
/// the server itself shut the address down.
pub type CloseHandler = Rc<dyn Fn(Option<WebSocket>)>;

/// Configuration applied at bind time.
#[derive(Clone, Default)]
pub struct ServerOptions {
    verify_client: Option<VerifyClient>,
    select_protocol: Option<SelectProtocol>,
    mock_global: bool,
}

impl ServerOptions {
    /// Options with no handshake hooks and no global installation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a predicate consulted for every incoming client; returning
    /// `false` rejects the handshake.
    pub fn verify_client(mut self, verify: VerifyClient) -> Self {
        self.verify_client = Some(verify);
        self
    }

    /// Installs a sub-protocol selector consulted for every incoming client.
    pub fn select_protocol(mut self, select: SelectProtocol) -> Self {
        self.select_protocol = Some(select);
        self
    }

    /// Makes `bind` install the server's net as the thread-local default for
    /// [`WebSocket::connect_installed`], restoring the previous one on
    /// [`Server::stop`].
    pub fn mock_global(mut self, mock_global: bool) -> Self {
        self.mock_global = mock_global;
        self
    }
}

impl fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOptions")
            .field("verify_client", &self.verify_client.is_some())
            .field("select_protocol", &self.select_protocol.is_some())
            .field("mock_global", &self.mock_global)
            .finish()
    }
}

/// Parameters for closing a server (or simulating a peer-initiated close).
#[derive(Debug, Clone, Default)]
pub struct CloseOptions {
    /// Close status code; defaults to the normal-closure code.
    pub code: Option<u16>,
    /// Close reason; defaults to empty.
    pub reason: Option<String>,
    /// Clean-close flag; when absent, derived from the effective code.
    pub was_clean: Option<bool>,
}

impl CloseOptions {
    /// Close with an explicit status code.
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
}

#[derive(Default)]
struct ServerEvents {
    connection: Vec<ConnectionHandler>,
    message: Vec<MessageHandler>,
    close: Vec<CloseHandler>,
}

struct ServerInner {
    url: String,
    options: ServerOptions,
    events: ServerEvents,
    /// Remembered installer state when `mock_global` swapped the
    /// thread-local net; `None` until `bind` installs, consumed by `stop`.
    restore: Option<Option<SimNet>>,
}

/// A server handle bound to one address.
#[derive(Clone)]
pub struct Server {
    net: WeakSimNet,
    inner: Rc<RefCell<ServerInner>>,
}

impl PartialEq for Server {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Server {}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Server");
        if let Ok(inner) = self.inner.try_borrow() {
            out.field("url", &inner.url)
                .field("options", &inner.options);
        }
        out.finish()
    }
}

impl Server {
    /// Binds a server to `url` in `net`.
    ///
    /// Fails with [`SocketError::AddressInUse`] when another server already
    /// owns the address, and with [`SocketError::InvalidUrl`] when the
    /// address does not parse.
    pub fn bind(net: &SimNet, url: &str, options: ServerOptions) -> SocketResult<Server> {
        let url = addr::normalize(url)?;
        let mock_global = options.mock_global;
        let server = Server {
            net: net.downgrade(),
            inner: Rc::new(RefCell::new(ServerInner {
                url: url.clone(),
                options,
                events: ServerEvents::default(),
                restore: None,
            })),
        };
        if !net.attach_server(&server, &url) {
            return Err(SocketError::AddressInUse(url));
        }
        if mock_global {
            server.inner.borrow_mut().restore = Some(installer::install(net.clone()));
        }
        tracing::debug!(url = %url, "server bound");
        Ok(server)
    }

    /// The normalized address this server is bound to.
    pub fn url(&self) -> String {
        self.inner.borrow().url.clone()
    }

    /// Subscribes to accepted clients; duplicate registrations of the same
    /// callback are collapsed to one entry.
    pub fn on_connection(&self, handler: ConnectionHandler) {
        let list = &mut self.inner.borrow_mut().events.connection;
        if !list.iter().any(|known| Rc::ptr_eq(known, &handler)) {
            list.push(handler);
        }
    }

    /// Subscribes to client payloads.
    pub fn on_message(&self, handler: MessageHandler) {
        let list = &mut self.inner.borrow_mut().events.message;
        if !list.iter().any(|known| Rc::ptr_eq(known, &handler)) {
            list.push(handler);
        }
    }

    /// Subscribes to closures, both per-client and server-initiated.
    pub fn on_close(&self, handler: CloseHandler) {
        let list = &mut self.inner.borrow_mut().events.close;
        if !list.iter().any(|known| Rc::ptr_eq(known, &handler)) {
            list.push(handler);
        }
    }

    /// Broadcasts `data` as a `message` event to every attached client.
    pub fn send(&self, data: impl Into<Message>) -> SocketResult<()> {
        self.emit("message", data)
    }

    /// Sends `data` as a `message` event to one client.
    pub fn send_to(&self, client: &WebSocket, data: impl Into<Message>) -> SocketResult<()> {
        self.emit_to(client, "message", data)
    }

    /// Sends `data` to one client under an arbitrary event type. Delivery is
    /// deferred through the net's step queue; a client that already detached
    /// is still delivered to, matching direct delivery semantics.
    pub fn emit_to(
        &self,
        client: &WebSocket,
        kind: &str,
        data: impl Into<Message>,
    ) -> SocketResult<()> {
        let net = self.net.upgrade()?;
        let event = create_message_event(
            MessageEventInit::of(data.into())
                .kind(kind)
                .origin(&self.url())
                .target(client.clone()),
        );
        net.schedule(Step::DeliverEvent {
            target: client.clone(),
            event,
        });
        Ok(())
    }

    /// Broadcasts `data` to every attached client under an arbitrary event
    /// type. Delivery is deferred through the net's step queue.
    pub fn emit(&self, kind: &str, data: impl Into<Message>) -> SocketResult<()> {
        let net = self.net.upgrade()?;
        let url = self.url();
        let data = data.into();
        for client in net.sockets_lookup(&url) {
            let event = create_message_event(
                MessageEventInit::of(data.clone())
                    .kind(kind)
                    .origin(&url)
                    .target(client.clone()),
            );
            net.schedule(Step::DeliverEvent {
                target: client,
                event,
            });
        }
        Ok(())
    }

    /// Clients currently attached to this server's address.
    pub fn clients(&self) -> Vec<WebSocket> {
        match self.net.upgrade() {
            Ok(net) => net.sockets_lookup(&self.url()),
            Err(_) => Vec::new(),
        }
    }

    /// Closes the server: releases the address, then closes every attached
    /// client with a close event built from `options`, and finally notifies
    /// close subscribers once with no client.
    ///
    /// The address is released before any client observes the close, so a
    /// close handler can bind a replacement server immediately.
    pub fn close(&self, options: CloseOptions) {
        let Ok(net) = self.net.upgrade() else {
            return;
        };
        let url = self.url();
        let peers = net.sockets_lookup(&url);
        net.remove_server(&url);
        tracing::debug!(url = %url, peers = peers.len(), "server closing");

        for peer in &peers {
            peer.move_to_state(ReadyState::Closed);
            let mut init = CloseEventInit::default().target(peer.clone());
            init.code = options.code;
            init.reason = options.reason.clone();
            init.was_clean = options.was_clean;
            peer.deliver(create_close_event(init));
        }
        self.notify_close(None);
    }

    /// Simulates a server-side failure: every attached client moves to
    /// `Closed` and receives an `error` event. The address stays bound.
    pub fn simulate_error(&self) {
        let Ok(net) = self.net.upgrade() else {
            return;
        };
        let url = self.url();
        for peer in net.sockets_lookup(&url) {
            peer.move_to_state(ReadyState::Closed);
            peer.deliver(create_event(EventInit::of("error")));
        }
    }

    /// Releases the address and restores the thread-local net swapped in by
    /// `mock_global`, if any. Attached clients are not notified.
    pub fn stop(&self) {
        let restore = self.inner.borrow_mut().restore.take();
        if let Some(previous) = restore {
            match previous {
                Some(net) => {
                    installer::install(net);
                }
                None => {
                    installer::uninstall();
                }
            }
        }
        if let Ok(net) = self.net.upgrade() {
            net.remove_server(&self.url());
        }
    }

    pub(crate) fn verify_client(&self) -> Option<VerifyClient> {
        self.inner.borrow().options.verify_client.clone()
    }

    pub(crate) fn select_protocol(&self) -> Option<SelectProtocol> {
        self.inner.borrow().options.select_protocol.clone()
    }

    pub(crate) fn notify_connection(&self, client: WebSocket) {
        let snapshot = self.inner.borrow().events.connection.clone();
        for handler in &snapshot {
            handler(client.clone());
        }
    }

    pub(crate) fn notify_message(&self, sender: WebSocket, data: &Message) {
        let snapshot = self.inner.borrow().events.message.clone();
        for handler in &snapshot {
            handler(sender.clone(), data);
        }
    }

    pub(crate) fn notify_close(&self, client: Option<WebSocket>) {
        let snapshot = self.inner.borrow().events.close.clone();
        for handler in &snapshot {
            handler(client.clone());
        }
    }
}
