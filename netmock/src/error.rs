use thiserror::Error;

/// Errors that can occur while constructing or using mock endpoints.
///
/// Construction and usage errors surface synchronously as `Err` values;
/// protocol-level rejections (no server at the address, a rejected
/// handshake) are never errors and are delivered as events instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocketError {
    /// The supplied address is missing or malformed for this protocol family.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// A server is already listening on the address.
    #[error("address already bound: {0}")]
    AddressInUse(String),
    /// The endpoint is in the wrong state for the requested operation.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// No net has been installed for the current thread.
    #[error("no net installed on this thread")]
    NoNetInstalled,
    /// The net has been dropped and is no longer accessible.
    #[error("net has been shut down")]
    Shutdown,
}

/// A type alias for `Result<T, SocketError>`.
pub type SocketResult<T> = Result<T, SocketError>;
