//! Future resolving a client handshake outcome.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::SocketResult;
use crate::socket::{ReadyState, WebSocket};

/// Future returned by [`WebSocket::ready`].
///
/// Resolves with the first state other than `Connecting`: `Open` for an
/// accepted handshake, `Closed` for a refused or rejected one. Something must
/// pump the net's step queue for the handshake to resolve; polling alone does
/// not advance it.
#[derive(Debug)]
pub struct StateFuture {
    socket: WebSocket,
    completed: bool,
}

impl StateFuture {
    pub(crate) fn new(socket: WebSocket) -> Self {
        Self {
            socket,
            completed: false,
        }
    }
}

impl Future for StateFuture {
    type Output = SocketResult<ReadyState>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.completed {
            return Poll::Pending;
        }

        let net = match self.socket.net_handle().upgrade() {
            Ok(net) => net,
            Err(err) => {
                self.completed = true;
                return Poll::Ready(Err(err));
            }
        };

        let state = self.socket.ready_state();
        if state != ReadyState::Connecting {
            self.completed = true;
            return Poll::Ready(Ok(state));
        }

        net.register_state_waker(self.socket.id(), cx.waker().clone());
        Poll::Pending
    }
}
