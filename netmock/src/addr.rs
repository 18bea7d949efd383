//! Address normalization and validation.
//!
//! Endpoints are keyed in the registry by their normalized address string, so
//! every address goes through [`normalize`] exactly once, at construction.
//! The rules match the protocol family being mocked: a `ws`/`wss` scheme, a
//! non-empty host, no fragment, and a `/` path appended when none is given.

use crate::error::{SocketError, SocketResult};

/// Normalizes and validates an endpoint address.
///
/// Returns the canonical form used as a registry key, or an error when the
/// address is empty, carries the wrong scheme, has no host, or contains a
/// fragment. Validation failures are construction errors: they surface
/// synchronously, before any handshake step is scheduled.
pub fn normalize(raw: &str) -> SocketResult<String> {
    if raw.is_empty() {
        return Err(SocketError::InvalidUrl("url is required".to_string()));
    }
    if raw.contains('#') {
        return Err(SocketError::InvalidUrl(format!(
            "url fragment exists: {raw}"
        )));
    }

    let (scheme, rest) = raw
        .split_once("://")
        .ok_or_else(|| SocketError::InvalidUrl(format!("url scheme missing: {raw}")))?;

    let scheme = scheme.to_ascii_lowercase();
    if scheme != "ws" && scheme != "wss" {
        return Err(SocketError::InvalidUrl(format!(
            "url scheme incorrect: {raw}"
        )));
    }

    let (authority, path) = match rest.split_once('/') {
        Some((authority, tail)) => (authority, format!("/{tail}")),
        None => (rest, "/".to_string()),
    };

    if authority.is_empty() {
        return Err(SocketError::InvalidUrl(format!("url host missing: {raw}")));
    }

    Ok(format!("{scheme}://{authority}{path}"))
}
