//! Left/right placement of the image and text zones on content slides.
//!
//! All coordinates are EMUs (914400 per inch).

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const EMU_PER_INCH: i64 = 914_400;

/// Default slide size: 10" x 7.5".
pub const DEFAULT_SLIDE_SIZE: SlideSize = SlideSize {
    width: 10 * EMU_PER_INCH,
    height: 7 * EMU_PER_INCH + EMU_PER_INCH / 2,
};

const MARGIN: i64 = EMU_PER_INCH / 2;
const IMAGE_TOP: i64 = EMU_PER_INCH;
const IMAGE_HEIGHT: i64 = 4 * EMU_PER_INCH;
const TEXT_TOP: i64 = EMU_PER_INCH / 2;
const TEXT_HEIGHT: i64 = 5 * EMU_PER_INCH;

/// Convert inches to EMUs.
pub fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH as f64).round() as i64
}

/// Slide dimensions in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideSize {
    pub width: i64,
    pub height: i64,
}

impl Default for SlideSize {
    fn default() -> Self {
        DEFAULT_SLIDE_SIZE
    }
}

/// A rectangle on the slide canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Which half of the slide holds the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Even-indexed content slides put the image on the left.
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// How the text zone behaves when a slide has no image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutStyle {
    /// Text keeps its half of the slide.
    Fixed,
    /// Text spans the full width between margins.
    #[default]
    Adaptive,
}

impl FromStr for LayoutStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "adaptive" => Ok(Self::Adaptive),
            other => Err(Error::ConfigError(format!("unknown layout style '{}'", other))),
        }
    }
}

impl fmt::Display for LayoutStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fixed => "fixed",
            Self::Adaptive => "adaptive",
        })
    }
}

/// Resolved zones for one content slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideLayout {
    pub image_side: Side,
    pub image: Option<Zone>,
    pub text: Zone,
}

impl LayoutStyle {
    /// Place image and text for the content slide at `index`.
    pub fn place(&self, index: usize, has_image: bool, size: SlideSize) -> SlideLayout {
        let half = size.width / 2;
        let half_width = half - MARGIN;
        let side = Side::for_index(index);
        let (image_left, text_left) = match side {
            Side::Left => (MARGIN, half),
            Side::Right => (half, MARGIN),
        };

        let image = has_image.then_some(Zone {
            x: image_left,
            y: IMAGE_TOP,
            width: half_width,
            height: IMAGE_HEIGHT,
        });

        let text = match (self, has_image) {
            (Self::Adaptive, false) => Zone {
                x: MARGIN,
                y: TEXT_TOP,
                width: size.width - 2 * MARGIN,
                height: TEXT_HEIGHT,
            },
            _ => Zone {
                x: text_left,
                y: TEXT_TOP,
                width: half_width,
                height: TEXT_HEIGHT,
            },
        };

        SlideLayout {
            image_side: side,
            image,
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_index_puts_image_left() {
        let layout = LayoutStyle::Fixed.place(0, true, SlideSize::default());
        let image = layout.image.unwrap();
        assert_eq!(layout.image_side, Side::Left);
        assert_eq!(image, Zone { x: inches(0.5), y: inches(1.0), width: inches(4.5), height: inches(4.0) });
        assert_eq!(layout.text, Zone { x: inches(5.0), y: inches(0.5), width: inches(4.5), height: inches(5.0) });
    }

    #[test]
    fn test_odd_index_puts_image_right() {
        let layout = LayoutStyle::Fixed.place(1, true, SlideSize::default());
        assert_eq!(layout.image_side, Side::Right);
        assert_eq!(layout.image.unwrap().x, inches(5.0));
        assert_eq!(layout.text.x, inches(0.5));
    }

    #[test]
    fn test_missing_image_fixed_keeps_half() {
        let layout = LayoutStyle::Fixed.place(0, false, SlideSize::default());
        assert!(layout.image.is_none());
        assert_eq!(layout.text.x, inches(5.0));
        assert_eq!(layout.text.width, inches(4.5));
    }

    #[test]
    fn test_missing_image_adaptive_spans_width() {
        let layout = LayoutStyle::Adaptive.place(1, false, SlideSize::default());
        assert!(layout.image.is_none());
        assert_eq!(layout.text.x, inches(0.5));
        assert_eq!(layout.text.width, inches(9.0));
    }

    #[test]
    fn test_wide_slide_scales_halves() {
        let wide = SlideSize { width: 12_192_000, height: 6_858_000 };
        let layout = LayoutStyle::Adaptive.place(0, true, wide);
        assert_eq!(layout.text.x, 6_096_000);
        assert_eq!(layout.image.unwrap().width, 6_096_000 - inches(0.5));
    }
}
