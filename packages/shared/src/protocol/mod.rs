//! Wire protocol spoken over the `/ws` endpoint.
//!
//! Every frame is a UTF-8 JSON object `{ "type": <string>, "data": <json|null> }`.
//! [`Envelope`] is the raw shape, [`Message`] the typed view with one payload
//! schema per kind.

mod drawing;
mod message;

pub use drawing::{Color, LINE_WIDTH, LineSegment, Point, SurfaceSnapshot};
pub use message::{Envelope, Message, MessageKind, ProtocolError};
