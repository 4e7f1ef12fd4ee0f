//! Color parsing for the raster engine.

use tegaki_shared::protocol::Color;

/// RGBA pixel value.
pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

const BLACK: Rgba = [0, 0, 0, 255];

/// Parse `#rgb` or `#rrggbb`. Returns `None` for anything else.
pub fn parse_color(color: &Color) -> Option<Rgba> {
    let hex = color.as_str().trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        3 => {
            let mut rgba = BLACK;
            for (channel, digit) in rgba.iter_mut().zip(hex.chars()) {
                let value = digit.to_digit(16)? as u8;
                *channel = value * 17;
            }
            Some(rgba)
        }
        6 => {
            let mut rgba = BLACK;
            for (channel, start) in rgba.iter_mut().zip([0, 2, 4]) {
                *channel = u8::from_str_radix(&hex[start..start + 2], 16).ok()?;
            }
            Some(rgba)
        }
        _ => None,
    }
}

/// Like [`parse_color`], falling back to opaque black.
pub(super) fn color_or_black(color: &Color) -> Rgba {
    parse_color(color).unwrap_or(BLACK)
}
