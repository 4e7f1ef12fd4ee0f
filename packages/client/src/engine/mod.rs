//! Drawing surface abstraction.
//!
//! The session only talks to a [`DrawEngine`]; how pixels are produced is up
//! to the implementation. [`RasterCanvas`] is the in-memory engine used by the
//! CLI client.

mod color;
mod raster;

use tegaki_shared::protocol::{LineSegment, SurfaceSnapshot};
use thiserror::Error;

pub use color::{Rgba, TRANSPARENT, parse_color};
pub use raster::{DEFAULT_HEIGHT, DEFAULT_WIDTH, RasterCanvas, SNAPSHOT_PREFIX};

/// A snapshot that could not be painted. The surface is left untouched.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unsupported snapshot encoding")]
    UnsupportedEncoding,

    #[error("snapshot is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("snapshot truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("snapshot is {actual_width}x{actual_height}, surface is {width}x{height}")]
    SizeMismatch {
        width: u16,
        height: u16,
        actual_width: u16,
        actual_height: u16,
    },
}

/// Renders segments and moves whole surfaces in and out as snapshots.
pub trait DrawEngine {
    fn apply_segment(&mut self, segment: &LineSegment);

    /// Wipe the whole surface.
    fn clear(&mut self);

    fn capture_snapshot(&self) -> SurfaceSnapshot;

    /// Paint a snapshot taken from another surface over this one.
    fn apply_snapshot(&mut self, snapshot: &SurfaceSnapshot) -> Result<(), SnapshotError>;
}
