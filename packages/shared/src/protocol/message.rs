//! Message envelope and typed message kinds.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use super::drawing::{LineSegment, SurfaceSnapshot};

/// Raw wire envelope. A missing `data` field reads as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub r#type: String,
    #[serde(default)]
    pub data: Value,
}

/// Every message kind the protocol knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    ClientReady,
    GetCanvasState,
    CanvasState,
    CanvasStateFromServer,
    DrawLine,
    Clear,
}

impl MessageKind {
    pub const ALL: [MessageKind; 6] = [
        MessageKind::ClientReady,
        MessageKind::GetCanvasState,
        MessageKind::CanvasState,
        MessageKind::CanvasStateFromServer,
        MessageKind::DrawLine,
        MessageKind::Clear,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::ClientReady => "client-ready",
            MessageKind::GetCanvasState => "get-canvas-state",
            MessageKind::CanvasState => "canvas-state",
            MessageKind::CanvasStateFromServer => "canvas-state-from-server",
            MessageKind::DrawLine => "draw-line",
            MessageKind::Clear => "clear",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons an inbound frame could not be turned into a [`Message`].
///
/// None of these are fatal to a connection; callers log and move on.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown message type '{0}'")]
    UnknownType(String),

    #[error("invalid payload for '{kind}': {source}")]
    InvalidPayload {
        kind: MessageKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Typed protocol message. The payload shape is fixed per variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// client → server: the socket is open and the client wants the current surface.
    ClientReady,
    /// server → client: capture your surface and answer with `CanvasState`.
    GetCanvasState,
    /// client → server: answer to `GetCanvasState`.
    CanvasState(SurfaceSnapshot),
    /// server → client: a peer's surface, to be painted as-is.
    CanvasStateFromServer(SurfaceSnapshot),
    DrawLine(LineSegment),
    Clear,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::ClientReady => MessageKind::ClientReady,
            Message::GetCanvasState => MessageKind::GetCanvasState,
            Message::CanvasState(_) => MessageKind::CanvasState,
            Message::CanvasStateFromServer(_) => MessageKind::CanvasStateFromServer,
            Message::DrawLine(_) => MessageKind::DrawLine,
            Message::Clear => MessageKind::Clear,
        }
    }

    /// Parse one text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        Self::try_from(envelope)
    }

    /// Render as a text frame. Kinds without payload carry `"data": null`.
    pub fn encode(&self) -> String {
        let data = match self {
            Message::CanvasState(snapshot) | Message::CanvasStateFromServer(snapshot) => {
                Value::String(snapshot.as_str().to_string())
            }
            // Serializing into a `Value` cannot fail for these types.
            Message::DrawLine(segment) => serde_json::to_value(segment).unwrap_or_else(|e| {
                tracing::error!("Failed to serialize line segment: {}", e);
                Value::Null
            }),
            Message::ClientReady | Message::GetCanvasState | Message::Clear => Value::Null,
        };

        json!({ "type": self.kind().as_str(), "data": data }).to_string()
    }
}

impl TryFrom<Envelope> for Message {
    type Error = ProtocolError;

    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        let kind = MessageKind::from_wire(&envelope.r#type)
            .ok_or_else(|| ProtocolError::UnknownType(envelope.r#type.clone()))?;

        // Payload-free kinds ignore whatever `data` holds.
        let message = match kind {
            MessageKind::ClientReady => Message::ClientReady,
            MessageKind::GetCanvasState => Message::GetCanvasState,
            MessageKind::Clear => Message::Clear,
            MessageKind::CanvasState => Message::CanvasState(payload(kind, envelope.data)?),
            MessageKind::CanvasStateFromServer => {
                Message::CanvasStateFromServer(payload(kind, envelope.data)?)
            }
            MessageKind::DrawLine => Message::DrawLine(payload(kind, envelope.data)?),
        };

        Ok(message)
    }
}

fn payload<T: serde::de::DeserializeOwned>(
    kind: MessageKind,
    data: Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|source| ProtocolError::InvalidPayload { kind, source })
}
