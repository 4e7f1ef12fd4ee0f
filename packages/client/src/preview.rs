//! Terminal preview of a [`RasterCanvas`].

use crate::engine::{RasterCanvas, TRANSPARENT};

/// Width of the preview in characters.
pub const PREVIEW_COLUMNS: u16 = 80;

/// Render the surface as ASCII art, at most `columns` characters wide.
///
/// Each character covers a block of pixels and is `#` if any pixel in the
/// block is painted. Blocks are twice as tall as they are wide to make up for
/// terminal cell proportions.
pub fn render_ascii(canvas: &RasterCanvas, columns: u16) -> String {
    let columns = columns.max(1);
    let cell_width = canvas.width().div_ceil(columns).max(1);
    let cell_height = cell_width.saturating_mul(2);

    let mut output = String::new();
    output.push('+');
    output.push_str(&"-".repeat(usize::from(canvas.width().div_ceil(cell_width))));
    output.push_str("+\n");

    for top in (0..canvas.height()).step_by(usize::from(cell_height)) {
        output.push('|');
        for left in (0..canvas.width()).step_by(usize::from(cell_width)) {
            let painted = (top..top.saturating_add(cell_height).min(canvas.height())).any(|y| {
                (left..left.saturating_add(cell_width).min(canvas.width()))
                    .any(|x| canvas.pixel(x, y).is_some_and(|pixel| pixel != TRANSPARENT))
            });
            output.push(if painted { '#' } else { ' ' });
        }
        output.push_str("|\n");
    }

    output.push('+');
    output.push_str(&"-".repeat(usize::from(canvas.width().div_ceil(cell_width))));
    output.push_str("+\n");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DrawEngine;
    use tegaki_shared::protocol::{Color, LineSegment, Point};

    #[test]
    fn test_blank_canvas_renders_empty_frame() {
        let canvas = RasterCanvas::new(4, 4);

        let rendered = render_ascii(&canvas, 80);

        assert_eq!(rendered, "+----+\n|    |\n|    |\n+----+\n");
    }

    #[test]
    fn test_stroke_is_visible_in_downscaled_preview() {
        // テスト項目: 縮小表示でも描いた線が '#' として見える
        // given (前提条件):
        let mut canvas = RasterCanvas::new(40, 20);
        canvas.apply_segment(&LineSegment::new(
            Point::new(0.0, 10.0),
            Point::new(39.0, 10.0),
            Color::new("#ff0000"),
        ));

        // when (操作):
        let rendered = render_ascii(&canvas, 20);

        // then (期待する結果):
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 5 + 2);
        assert!(lines.iter().all(|line| line.chars().count() == 22));
        assert_eq!(lines[3], format!("|{}|", "#".repeat(20)));
        assert_eq!(lines[1], format!("|{}|", " ".repeat(20)));
    }
}
