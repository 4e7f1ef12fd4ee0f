//! Error types for the drawing client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not open the WebSocket
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The socket failed after the session was established
    #[error("Connection lost: {0}")]
    ConnectionLost(String),
}
