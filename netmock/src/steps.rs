//! Deferred steps and the step queue.
//!
//! Every asynchronous-looking part of the mock is a deferred step: a unit of
//! work scheduled to run after the current synchronous phase completes. The
//! queue is strictly FIFO with monotonically increasing sequence numbers, so
//! processing order is deterministic: first scheduled, first run. Once
//! scheduled, a step always runs; there is no cancellation.

use std::collections::VecDeque;
use std::fmt;

use crate::event::Event;
use crate::message::Message;
use crate::server::Server;
use crate::socket::WebSocket;

/// Why a handshake was rejected by the server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RejectReason {
    /// The server's accept predicate returned false.
    VerifyClient,
    /// The negotiated sub-protocol was not among the offered ones.
    SubProtocol,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::VerifyClient => write!(f, "authentication failed"),
            RejectReason::SubProtocol => write!(f, "invalid sub-protocol"),
        }
    }
}

/// A unit of deferred work.
#[derive(Debug)]
pub(crate) enum Step {
    /// Complete the handshake: flip the socket to OPEN and notify the server.
    OpenSocket { socket: WebSocket, server: Server },
    /// Fail the handshake because no server is listening at the address.
    RefuseSocket { socket: WebSocket },
    /// Fail the handshake after server-side rejection; detaches the peer.
    RejectSocket {
        socket: WebSocket,
        reason: RejectReason,
    },
    /// Deliver a client payload to the server's message subscribers.
    ForwardToServer {
        server: Server,
        sender: WebSocket,
        data: Message,
    },
    /// Deliver a prepared event to a client endpoint.
    DeliverEvent { target: WebSocket, event: Event },
}

/// A step tagged with its scheduling sequence number.
#[derive(Debug)]
pub(crate) struct ScheduledStep {
    sequence: u64,
    step: Step,
}

impl ScheduledStep {
    /// The deterministic ordering tag assigned at scheduling time.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Consumes the scheduled step and returns the step.
    pub fn into_step(self) -> Step {
        self.step
    }
}

/// FIFO queue of deferred steps.
#[derive(Debug, Default)]
pub(crate) struct StepQueue {
    queue: VecDeque<ScheduledStep>,
    next_sequence: u64,
}

impl StepQueue {
    /// Appends a step to the back of the queue and returns its sequence.
    pub fn schedule(&mut self, step: Step) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queue.push_back(ScheduledStep { sequence, step });
        sequence
    }

    /// Removes and returns the earliest scheduled step.
    pub fn pop_next(&mut self) -> Option<ScheduledStep> {
        self.queue.pop_front()
    }

    /// Returns `true` if no steps are pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of pending steps.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Drops all pending steps. Used for test isolation between cases.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
