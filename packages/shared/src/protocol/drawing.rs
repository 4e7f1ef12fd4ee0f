//! Drawing payloads carried inside protocol messages.

use serde::{Deserialize, Serialize};

/// Stroke width of every line segment, in surface pixels.
pub const LINE_WIDTH: u32 = 2;

/// Surface-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// CSS-style color value such as `#ff0000`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self("#000000".to_string())
    }
}

/// One stroke step produced while the pointer is down.
///
/// `prevPoint` is accepted on input for compatibility with older browser
/// clients; output always uses `previousPoint`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    #[serde(rename = "previousPoint", alias = "prevPoint")]
    pub previous_point: Point,
    #[serde(rename = "currentPoint")]
    pub current_point: Point,
    pub color: Color,
}

impl LineSegment {
    pub fn new(previous_point: Point, current_point: Point, color: Color) -> Self {
        Self {
            previous_point,
            current_point,
            color,
        }
    }
}

/// Opaque encoding of a whole drawing surface.
///
/// The relay never looks inside; it forwards the exact bytes it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceSnapshot(String);

impl SurfaceSnapshot {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
