//! Client side of the drawing protocol.
//!
//! A [`ClientSession`] owns the local surface and turns pointer input into
//! outbound frames and inbound frames into surface updates. It never touches
//! the socket directly: outbound frames go into an unbounded channel that a
//! writer task drains, so the session can be driven from a single loop
//! without locks.

use tegaki_shared::protocol::{Color, LineSegment, Message, MessageKind, Point};
use tokio::sync::mpsc;

use crate::engine::DrawEngine;

/// Outbound half of the connection, one encoded frame per item.
pub type OutboundChannel = mpsc::UnboundedSender<String>;

pub struct ClientSession<E: DrawEngine> {
    engine: E,
    outbound: OutboundChannel,
    drawing: bool,
    prev_point: Option<Point>,
    color: Color,
}

impl<E: DrawEngine> ClientSession<E> {
    pub fn new(engine: E, outbound: OutboundChannel) -> Self {
        Self {
            engine,
            outbound,
            drawing: false,
            prev_point: None,
            color: Color::default(),
        }
    }

    /// Announce readiness. Call once the socket is open.
    pub fn on_open(&mut self) {
        self.send(&Message::ClientReady);
    }

    /// Apply one inbound text frame.
    ///
    /// Returns the kind that was acted on, or `None` when the frame was
    /// malformed or not meant for a client.
    pub fn handle_text(&mut self, text: &str) -> Option<MessageKind> {
        let message = match Message::decode(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Ignoring inbound frame: {}", e);
                return None;
            }
        };
        let kind = message.kind();

        match message {
            Message::GetCanvasState => {
                let snapshot = self.engine.capture_snapshot();
                tracing::debug!("Answering surface request ({} bytes)", snapshot.as_str().len());
                self.send(&Message::CanvasState(snapshot));
            }
            Message::CanvasStateFromServer(snapshot) => {
                if let Err(e) = self.engine.apply_snapshot(&snapshot) {
                    tracing::warn!("Could not apply surface from peer: {}", e);
                    return None;
                }
                tracing::info!("Received current surface from peer");
            }
            Message::DrawLine(segment) => self.engine.apply_segment(&segment),
            Message::Clear => self.engine.clear(),
            Message::ClientReady | Message::CanvasState(_) => {
                tracing::warn!("Ignoring '{}' sent to a client", kind);
                return None;
            }
        }

        Some(kind)
    }

    pub fn pointer_down(&mut self, point: Point) {
        self.drawing = true;
        self.prev_point = Some(point);
    }

    /// Draw from the previous point to `point` and share the segment.
    /// Does nothing unless the pointer is down.
    pub fn pointer_move(&mut self, point: Point) {
        if !self.drawing {
            return;
        }
        let Some(previous_point) = self.prev_point.replace(point) else {
            return;
        };

        let segment = LineSegment::new(previous_point, point, self.color.clone());
        self.engine.apply_segment(&segment);
        self.send(&Message::DrawLine(segment));
    }

    pub fn pointer_up(&mut self) {
        self.drawing = false;
        self.prev_point = None;
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Wipe the local surface and tell every peer to do the same.
    pub fn clear(&mut self) {
        self.engine.clear();
        self.send(&Message::Clear);
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    fn send(&self, message: &Message) {
        if self.outbound.send(message.encode()).is_err() {
            tracing::debug!("Connection closed, dropping outbound '{}'", message.kind());
        }
    }
}
