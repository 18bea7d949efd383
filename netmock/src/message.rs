//! Message payloads exchanged between endpoints.
//!
//! Payloads are delivered by reference-equal clone: the value a client passes
//! to `send` is the value the server's message callbacks observe, and vice
//! versa. Structured payloads go through serde_json.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A payload carried by a message event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A UTF-8 text payload.
    Text(String),
    /// A binary payload.
    Binary(Vec<u8>),
}

impl Message {
    /// Creates a text message.
    pub fn text(data: impl Into<String>) -> Self {
        Message::Text(data.into())
    }

    /// Creates a binary message.
    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Message::Binary(data.into())
    }

    /// Serializes a value to a JSON text message.
    pub fn json<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(Message::Text(serde_json::to_string(value)?))
    }

    /// Deserializes a JSON text message into a value.
    ///
    /// Binary payloads are parsed as raw JSON bytes.
    pub fn json_into<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        match self {
            Message::Text(text) => serde_json::from_str(text),
            Message::Binary(bytes) => serde_json::from_slice(bytes),
        }
    }

    /// Returns the text payload, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(text) => Some(text),
            Message::Binary(_) => None,
        }
    }

    /// Returns the binary payload, if this is a binary message.
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Message::Text(_) => None,
            Message::Binary(bytes) => Some(bytes),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Message::Text(text) => text.len(),
            Message::Binary(bytes) => bytes.len(),
        }
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Message {
    fn from(data: &str) -> Self {
        Message::Text(data.to_string())
    }
}

impl From<String> for Message {
    fn from(data: String) -> Self {
        Message::Text(data)
    }
}

impl From<Vec<u8>> for Message {
    fn from(data: Vec<u8>) -> Self {
        Message::Binary(data)
    }
}
