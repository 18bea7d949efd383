//! Message flow in both directions, broadcast, custom event types, and the
//! send-state taxonomy.

use std::cell::RefCell;
use std::rc::Rc;

use netmock::prelude::*;
use serde::{Deserialize, Serialize};

fn open_pair(net: &mut SimNet, url: &str) -> (Server, WebSocket) {
    let server = Server::bind(net, url, ServerOptions::new()).unwrap();
    let socket = WebSocket::connect(net, url, &[]).unwrap();
    net.run_until_idle();
    assert_eq!(socket.ready_state(), ReadyState::Open);
    (server, socket)
}

#[test]
fn client_send_reaches_server_subscribers() {
    let mut net = SimNet::new();
    let (server, socket) = open_pair(&mut net, "ws://localhost:8080");

    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = received.clone();
    server.on_message(Rc::new(move |sender: WebSocket, data: &Message| {
        sink.borrow_mut().push((sender, data.clone()));
    }));

    socket.send("ping").unwrap();
    socket.send(Message::binary(vec![1, 2, 3])).unwrap();
    net.run_until_idle();

    let received = received.borrow();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0], (socket.clone(), Message::text("ping")));
    assert_eq!(received[1], (socket.clone(), Message::binary(vec![1, 2, 3])));
}

#[test]
fn server_broadcast_reaches_every_client() {
    let mut net = SimNet::new();
    let server = Server::bind(&net, "ws://localhost:8080", ServerOptions::new()).unwrap();
    let a = WebSocket::connect(&net, "ws://localhost:8080", &[]).unwrap();
    let b = WebSocket::connect(&net, "ws://localhost:8080", &[]).unwrap();
    net.run_until_idle();

    let seen = Rc::new(RefCell::new(Vec::new()));
    for socket in [&a, &b] {
        let sink = seen.clone();
        let id = socket.id();
        socket.set_onmessage(Some(Rc::new(move |event: &Event| {
            sink.borrow_mut().push((
                id,
                event.message_data().cloned(),
                event.origin().map(str::to_string),
            ));
        })));
    }

    server.send("hello").unwrap();
    net.run_until_idle();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    for (_, data, origin) in seen.iter() {
        assert_eq!(data.as_ref(), Some(&Message::text("hello")));
        assert_eq!(origin.as_deref(), Some(server.url().as_str()));
    }
    assert_eq!(seen[0].0, a.id());
    assert_eq!(seen[1].0, b.id());
}

#[test]
fn send_to_targets_one_client() {
    let mut net = SimNet::new();
    let server = Server::bind(&net, "ws://localhost:8080", ServerOptions::new()).unwrap();
    let a = WebSocket::connect(&net, "ws://localhost:8080", &[]).unwrap();
    let b = WebSocket::connect(&net, "ws://localhost:8080", &[]).unwrap();
    net.run_until_idle();

    let seen = Rc::new(RefCell::new(Vec::new()));
    for socket in [&a, &b] {
        let sink = seen.clone();
        let id = socket.id();
        socket.set_onmessage(Some(Rc::new(move |_event: &Event| {
            sink.borrow_mut().push(id);
        })));
    }

    server.send_to(&b, "just for you").unwrap();
    net.run_until_idle();
    assert_eq!(*seen.borrow(), vec![b.id()]);
}

#[test]
fn emit_to_targets_one_client_under_a_custom_event_type() {
    let mut net = SimNet::new();
    let server = Server::bind(&net, "ws://localhost:8080", ServerOptions::new()).unwrap();
    let a = WebSocket::connect(&net, "ws://localhost:8080", &[]).unwrap();
    let b = WebSocket::connect(&net, "ws://localhost:8080", &[]).unwrap();
    net.run_until_idle();

    let seen = Rc::new(RefCell::new(Vec::new()));
    for socket in [&a, &b] {
        let sink = seen.clone();
        let id = socket.id();
        let listener: Listener = Rc::new(move |event: &Event| {
            sink.borrow_mut()
                .push((id, event.kind().to_string(), event.message_data().cloned()));
        });
        socket.add_event_listener("notification", &listener);
    }

    server.emit_to(&a, "notification", "only a hears this").unwrap();
    net.run_until_idle();
    assert_eq!(
        *seen.borrow(),
        vec![(
            a.id(),
            "notification".to_string(),
            Some(Message::text("only a hears this"))
        )]
    );
}

#[test]
fn emit_delivers_under_a_custom_event_type() {
    let mut net = SimNet::new();
    let (server, socket) = open_pair(&mut net, "ws://localhost:8080");

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let listener: Listener = Rc::new(move |event: &Event| {
        sink.borrow_mut()
            .push((event.kind().to_string(), event.message_data().cloned()));
    });
    socket.add_event_listener("notification", &listener);

    server.emit("notification", "ding").unwrap();
    net.run_until_idle();
    assert_eq!(
        *seen.borrow(),
        vec![("notification".to_string(), Some(Message::text("ding")))]
    );
}

#[test]
fn reply_through_send_to_round_trips() {
    let mut net = SimNet::new();
    let (server, socket) = open_pair(&mut net, "ws://localhost:8080");

    let replier = server.clone();
    server.on_message(Rc::new(move |sender: WebSocket, data: &Message| {
        if data.as_text() == Some("ping") {
            replier.send_to(&sender, "pong").unwrap();
        }
    }));

    let replies = Rc::new(RefCell::new(Vec::new()));
    let sink = replies.clone();
    socket.set_onmessage(Some(Rc::new(move |event: &Event| {
        sink.borrow_mut().push(event.message_data().cloned());
    })));

    socket.send("ping").unwrap();
    net.run_until_idle();
    assert_eq!(*replies.borrow(), vec![Some(Message::text("pong"))]);
}

#[test]
fn send_while_connecting_errors_and_detaches() {
    let mut net = SimNet::new();
    let server = Server::bind(&net, "ws://localhost:8080", ServerOptions::new()).unwrap();
    let socket = WebSocket::connect(&net, "ws://localhost:8080", &[]).unwrap();

    let err = socket.send("too early").unwrap_err();
    assert!(matches!(err, SocketError::InvalidState(_)));

    // The endpoint is out of the registry; the already-scheduled handshake
    // still resolves, but the server no longer counts it as a client.
    net.run_until_idle();
    assert!(server.clients().is_empty());
}

#[test]
fn send_after_close_errors() {
    let mut net = SimNet::new();
    let (_server, socket) = open_pair(&mut net, "ws://localhost:8080");

    socket.close();
    assert_eq!(socket.ready_state(), ReadyState::Closed);
    assert!(matches!(
        socket.send("late"),
        Err(SocketError::InvalidState(_))
    ));
}

#[test]
fn send_with_no_server_listening_is_dropped() {
    let mut net = SimNet::new();
    let (server, socket) = open_pair(&mut net, "ws://localhost:8080");

    let received = Rc::new(RefCell::new(0u32));
    let counter = received.clone();
    server.on_message(Rc::new(move |_sender: WebSocket, _data: &Message| {
        *counter.borrow_mut() += 1;
    }));

    // stop() releases the address without closing clients; the socket stays
    // open and its sends go nowhere.
    server.stop();
    assert_eq!(socket.ready_state(), ReadyState::Open);
    socket.send("into the void").unwrap();
    net.run_until_idle();
    assert_eq!(*received.borrow(), 0);
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Greeting {
    who: String,
    count: u32,
}

#[test]
fn json_payloads_round_trip() {
    let mut net = SimNet::new();
    let (server, socket) = open_pair(&mut net, "ws://localhost:8080");

    let decoded = Rc::new(RefCell::new(Vec::new()));
    let sink = decoded.clone();
    server.on_message(Rc::new(move |_sender: WebSocket, data: &Message| {
        sink.borrow_mut().push(data.json_into::<Greeting>().unwrap());
    }));

    let greeting = Greeting {
        who: "netmock".to_string(),
        count: 3,
    };
    socket.send(Message::json(&greeting).unwrap()).unwrap();
    net.run_until_idle();
    assert_eq!(*decoded.borrow(), vec![greeting]);
}
