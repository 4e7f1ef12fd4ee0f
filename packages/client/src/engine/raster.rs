//! In-memory RGBA raster implementing [`DrawEngine`].

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tegaki_shared::protocol::{LINE_WIDTH, LineSegment, Point, SurfaceSnapshot};

use super::{
    DrawEngine, SnapshotError,
    color::{Rgba, TRANSPARENT, color_or_black},
};

pub const DEFAULT_WIDTH: u16 = 200;
pub const DEFAULT_HEIGHT: u16 = 150;

/// Data-URL prefix of every snapshot produced by [`RasterCanvas`].
pub const SNAPSHOT_PREFIX: &str = "data:application/x-tegaki-raster;base64,";

/// Width and height, big-endian u16 each.
const HEADER_LEN: usize = 4;

/// How far outside the surface endpoints may lie before being clamped.
const COORDINATE_MARGIN: i64 = 4096;

/// RGBA surface, row-major, fully transparent when blank.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterCanvas {
    width: u16,
    height: u16,
    pixels: Vec<Rgba>,
}

impl RasterCanvas {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![TRANSPARENT; usize::from(width) * usize::from(height)],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgba> {
        self.index(i64::from(x), i64::from(y))
            .map(|index| self.pixels[index])
    }

    pub fn painted_pixels(&self) -> usize {
        self.pixels.iter().filter(|pixel| **pixel != TRANSPARENT).count()
    }

    pub fn is_blank(&self) -> bool {
        self.painted_pixels() == 0
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        let in_bounds =
            (0..i64::from(self.width)).contains(&x) && (0..i64::from(self.height)).contains(&y);
        in_bounds.then(|| y as usize * usize::from(self.width) + x as usize)
    }

    /// Stamp a `LINE_WIDTH` square centered on (x, y).
    fn stamp(&mut self, x: i64, y: i64, color: Rgba) {
        let width = i64::from(LINE_WIDTH);
        let start = -(width / 2);
        for dy in start..start + width {
            for dx in start..start + width {
                if let Some(index) = self.index(x + dx, y + dy) {
                    self.pixels[index] = color;
                }
            }
        }
    }

    fn to_grid(&self, point: Point) -> (i64, i64) {
        // Float-to-int casts saturate and map NaN to 0.
        let clamp_x = |v: f64| {
            (v.round() as i64).clamp(-COORDINATE_MARGIN, i64::from(self.width) + COORDINATE_MARGIN)
        };
        let clamp_y = |v: f64| {
            (v.round() as i64).clamp(-COORDINATE_MARGIN, i64::from(self.height) + COORDINATE_MARGIN)
        };
        (clamp_x(point.x), clamp_y(point.y))
    }

    fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.pixels.len() * 4);
        bytes.extend_from_slice(&self.width.to_be_bytes());
        bytes.extend_from_slice(&self.height.to_be_bytes());
        for pixel in &self.pixels {
            bytes.extend_from_slice(pixel);
        }
        bytes
    }
}

impl Default for RasterCanvas {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl DrawEngine for RasterCanvas {
    /// Bresenham line between the two points.
    fn apply_segment(&mut self, segment: &LineSegment) {
        let color = color_or_black(&segment.color);
        let (mut x0, mut y0) = self.to_grid(segment.previous_point);
        let (x1, y1) = self.to_grid(segment.current_point);

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.stamp(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn clear(&mut self) {
        self.pixels.fill(TRANSPARENT);
    }

    fn capture_snapshot(&self) -> SurfaceSnapshot {
        SurfaceSnapshot::new(format!("{}{}", SNAPSHOT_PREFIX, STANDARD.encode(self.encode())))
    }

    /// Non-transparent snapshot pixels are painted over the current surface.
    fn apply_snapshot(&mut self, snapshot: &SurfaceSnapshot) -> Result<(), SnapshotError> {
        let encoded = snapshot
            .as_str()
            .strip_prefix(SNAPSHOT_PREFIX)
            .ok_or(SnapshotError::UnsupportedEncoding)?;
        let bytes = STANDARD.decode(encoded)?;

        if bytes.len() < HEADER_LEN {
            return Err(SnapshotError::Truncated {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let width = u16::from_be_bytes([bytes[0], bytes[1]]);
        let height = u16::from_be_bytes([bytes[2], bytes[3]]);
        if (width, height) != (self.width, self.height) {
            return Err(SnapshotError::SizeMismatch {
                width: self.width,
                height: self.height,
                actual_width: width,
                actual_height: height,
            });
        }

        let expected = HEADER_LEN + self.pixels.len() * 4;
        if bytes.len() != expected {
            return Err(SnapshotError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }

        for (pixel, chunk) in self
            .pixels
            .iter_mut()
            .zip(bytes[HEADER_LEN..].chunks_exact(4))
        {
            let incoming = [chunk[0], chunk[1], chunk[2], chunk[3]];
            if incoming != TRANSPARENT {
                *pixel = incoming;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tegaki_shared::protocol::Color;

    const RED: Rgba = [255, 0, 0, 255];
    const BLUE: Rgba = [0, 0, 255, 255];

    fn segment(from: (f64, f64), to: (f64, f64), color: &str) -> LineSegment {
        LineSegment::new(
            Point::new(from.0, from.1),
            Point::new(to.0, to.1),
            Color::new(color),
        )
    }

    #[test]
    fn test_new_canvas_is_blank() {
        // テスト項目: 新しいキャンバスは何も描かれていない
        let canvas = RasterCanvas::new(16, 8);
        assert!(canvas.is_blank());
        assert_eq!(canvas.pixel(15, 7), Some(TRANSPARENT));
        assert_eq!(canvas.pixel(16, 0), None);
    }

    #[test]
    fn test_diagonal_segment_paints_endpoints_and_middle() {
        // テスト項目: 斜めの線分が始点・中間・終点を塗る
        // given (前提条件):
        let mut canvas = RasterCanvas::new(32, 32);

        // when (操作):
        canvas.apply_segment(&segment((0.0, 0.0), (10.0, 10.0), "#ff0000"));

        // then (期待する結果):
        assert_eq!(canvas.pixel(0, 0), Some(RED));
        assert_eq!(canvas.pixel(5, 5), Some(RED));
        assert_eq!(canvas.pixel(10, 10), Some(RED));
        assert_eq!(canvas.pixel(20, 20), Some(TRANSPARENT));
    }

    #[test]
    fn test_segment_outside_surface_is_clipped() {
        // テスト項目: 範囲外にはみ出した線分は範囲内だけが塗られ、巨大な座標でも終わる
        // given (前提条件):
        let mut canvas = RasterCanvas::new(8, 8);

        // when (操作):
        canvas.apply_segment(&segment((-1e12, 4.0), (1e12, 4.0), "#0000ff"));
        canvas.apply_segment(&segment((f64::NAN, 0.0), (f64::INFINITY, 0.0), "#0000ff"));

        // then (期待する結果):
        assert_eq!(canvas.pixel(0, 4), Some(BLUE));
        assert_eq!(canvas.pixel(7, 4), Some(BLUE));
    }

    #[test]
    fn test_clear_twice_leaves_surface_empty() {
        // テスト項目: clear を 2 回続けても毎回空になる
        // given (前提条件):
        let mut canvas = RasterCanvas::new(16, 16);
        canvas.apply_segment(&segment((1.0, 1.0), (8.0, 3.0), "#ff0000"));

        // when (操作) / then (期待する結果):
        canvas.clear();
        assert!(canvas.is_blank());
        canvas.clear();
        assert!(canvas.is_blank());
    }

    #[test]
    fn test_snapshot_reproduces_surface() {
        // テスト項目: スナップショットを別のキャンバスに適用すると同じ内容になる
        // given (前提条件):
        let mut source = RasterCanvas::new(24, 12);
        source.apply_segment(&segment((0.0, 0.0), (10.0, 10.0), "#ff0000"));
        source.apply_segment(&segment((20.0, 1.0), (3.0, 11.0), "#00f"));

        // when (操作):
        let snapshot = source.capture_snapshot();
        let mut target = RasterCanvas::new(24, 12);
        target.apply_snapshot(&snapshot).unwrap();

        // then (期待する結果):
        assert!(snapshot.as_str().starts_with(SNAPSHOT_PREFIX));
        assert_eq!(target, source);
        assert_eq!(target.capture_snapshot(), snapshot);
    }

    #[test]
    fn test_snapshot_paints_over_existing_strokes() {
        // テスト項目: スナップショットは既存の線の上に重ねて描かれる
        // given (前提条件):
        let mut source = RasterCanvas::new(16, 16);
        source.apply_segment(&segment((0.0, 0.0), (0.0, 10.0), "#ff0000"));
        let mut target = RasterCanvas::new(16, 16);
        target.apply_segment(&segment((12.0, 0.0), (12.0, 10.0), "#0000ff"));

        // when (操作):
        target.apply_snapshot(&source.capture_snapshot()).unwrap();

        // then (期待する結果):
        assert_eq!(target.pixel(0, 5), Some(RED));
        assert_eq!(target.pixel(12, 5), Some(BLUE));
    }

    #[test]
    fn test_invalid_snapshots_leave_surface_untouched() {
        // テスト項目: 不正なスナップショットはエラーになり、キャンバスは変わらない
        // given (前提条件):
        let mut canvas = RasterCanvas::new(8, 8);
        canvas.apply_segment(&segment((0.0, 0.0), (7.0, 7.0), "#ff0000"));
        let before = canvas.clone();
        let other_size = RasterCanvas::new(4, 4).capture_snapshot();
        let truncated = SurfaceSnapshot::new(format!(
            "{}{}",
            SNAPSHOT_PREFIX,
            STANDARD.encode([0u8, 8, 0, 8, 1, 2])
        ));

        // when (操作):
        let png = canvas.apply_snapshot(&SurfaceSnapshot::new("data:image/png;base64,AAAA"));
        let garbage = canvas.apply_snapshot(&SurfaceSnapshot::new(format!(
            "{}***",
            SNAPSHOT_PREFIX
        )));
        let mismatch = canvas.apply_snapshot(&other_size);
        let short = canvas.apply_snapshot(&truncated);

        // then (期待する結果):
        assert!(matches!(png, Err(SnapshotError::UnsupportedEncoding)));
        assert!(matches!(garbage, Err(SnapshotError::Base64(_))));
        assert!(matches!(mismatch, Err(SnapshotError::SizeMismatch { .. })));
        assert!(matches!(short, Err(SnapshotError::Truncated { .. })));
        assert_eq!(canvas, before);
    }
}
