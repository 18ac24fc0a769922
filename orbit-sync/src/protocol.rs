//! Wire format for the bidirectional event channel.
//!
//! Every WebSocket text frame is one JSON envelope:
//! ```text
//! {"event": "<name>", "data": { ... }}
//! ```
//!
//! Server → client: `connection_response`, `config_updated`, `state_changed`.
//! Client → server: `button_interaction`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// A button record was persisted. Payload: the stored record.
pub const EVENT_CONFIG_UPDATED: &str = "config_updated";
/// An interaction was relayed, or (to the sender only) rejected.
pub const EVENT_STATE_CHANGED: &str = "state_changed";
/// Sent once to a new subscriber.
pub const EVENT_CONNECTION_RESPONSE: &str = "connection_response";
/// Inbound hover/click from a client.
pub const EVENT_BUTTON_INTERACTION: &str = "button_interaction";

/// Protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Encode error: {0}")]
    EncodeError(String),
    #[error("Decode error: {0}")]
    DecodeError(String),
}

/// One event on the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Build an envelope from any serializable payload.
    pub fn from_payload<T: Serialize + ?Sized>(
        event: impl Into<String>,
        payload: &T,
    ) -> Result<Self, ProtocolError> {
        let data =
            serde_json::to_value(payload).map_err(|e| ProtocolError::EncodeError(e.to_string()))?;
        Ok(Self::new(event, data))
    }

    /// `connection_response {status: "connected"}`.
    pub fn connected() -> Self {
        Self::new(EVENT_CONNECTION_RESPONSE, json!({ "status": "connected" }))
    }

    /// `state_changed {status: "error", message}`. Sent to one client only.
    pub fn interaction_error(message: impl Into<String>) -> Self {
        Self::new(
            EVENT_STATE_CHANGED,
            json!({ "status": "error", "message": message.into() }),
        )
    }

    /// Encode to a JSON text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::EncodeError(e.to_string()))
    }

    /// Decode from a JSON text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::DecodeError(e.to_string()))
    }

    /// Deserialize `data` into a typed payload.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| ProtocolError::DecodeError(e.to_string()))
    }
}
