//! Thread-local default net.
//!
//! Code under test that constructs its connections through
//! [`WebSocket::connect_installed`](crate::socket::WebSocket::connect_installed)
//! does not need a net handle threaded through it; a test installs one here
//! (directly or via `ServerOptions::mock_global`) and restores it afterwards.

use std::cell::RefCell;

use crate::net::SimNet;

thread_local! {
    static INSTALLED: RefCell<Option<SimNet>> = const { RefCell::new(None) };
}

/// Installs `net` as the current thread's default, returning the previously
/// installed one so the caller can restore it.
pub fn install(net: SimNet) -> Option<SimNet> {
    INSTALLED.with(|cell| cell.borrow_mut().replace(net))
}

/// Removes the current thread's default net, if any.
pub fn uninstall() -> Option<SimNet> {
    INSTALLED.with(|cell| cell.borrow_mut().take())
}

/// The current thread's default net, if one is installed.
pub fn installed() -> Option<SimNet> {
    INSTALLED.with(|cell| cell.borrow().clone())
}
