//! Fonts for page rendering
//!
//! Layout only needs measurements ([`FontMetrics`]); drawing needs a
//! [`PageFont`]. `GlyphFont` wraps a TrueType/OpenType face, `BlockFont`
//! is a built-in fixed-advance face that draws solid blocks.

use std::path::Path;

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::error::{PitchPageError, Result};

/// Text used to measure line height: one ascender, one descender
const HEIGHT_PROBE: &str = "hg";

/// Measurements the layout engine needs from a font
pub trait FontMetrics {
    /// Rendered advance width of `text` in pixels
    fn text_width(&self, text: &str) -> f32;

    /// Ink height of a line from the top of ascenders to the bottom of descenders
    fn glyph_height(&self) -> u32;
}

/// A font that can also draw onto a page
pub trait PageFont: FontMetrics + Send + Sync {
    /// Draw `text` with its top-left corner at `(x, y)`
    fn draw_line(&self, canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>);
}

// ============================================================================
// GlyphFont
// ============================================================================

/// Outline font at a fixed pixel size
pub struct GlyphFont {
    font: FontVec,
    scale: PxScale,
    glyph_height: u32,
}

impl std::fmt::Debug for GlyphFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphFont")
            .field("scale", &self.scale)
            .field("glyph_height", &self.glyph_height)
            .finish()
    }
}

impl GlyphFont {
    /// Parse font data and fix the pixel size
    ///
    /// # Errors
    /// * `FontLoad` - If the data is not a usable font or the size is not positive
    pub fn from_bytes(data: Vec<u8>, size_px: f32) -> Result<Self> {
        if !(size_px > 0.0) {
            return Err(PitchPageError::FontLoad {
                reason: format!("font size must be positive, got {}", size_px),
            });
        }
        let font = FontVec::try_from_vec(data).map_err(|e| PitchPageError::FontLoad {
            reason: e.to_string(),
        })?;

        let mut glyph_font = GlyphFont {
            font,
            scale: PxScale::from(size_px),
            glyph_height: 0,
        };
        glyph_font.glyph_height = glyph_font.measure_ink_height(HEIGHT_PROBE);
        Ok(glyph_font)
    }

    /// Load a font file from disk
    pub fn from_file(path: &Path, size_px: f32) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| PitchPageError::FontLoad {
            reason: format!("{}: {}", path.display(), e),
        })?;
        GlyphFont::from_bytes(data, size_px)
    }

    pub fn scale(&self) -> PxScale {
        self.scale
    }

    /// Vertical extent of the outlines of `probe`, falling back to the
    /// font's line height when nothing has ink
    fn measure_ink_height(&self, probe: &str) -> u32 {
        let scaled = self.font.as_scaled(self.scale);
        let mut caret = 0.0_f32;
        let mut top = f32::MAX;
        let mut bottom = f32::MIN;

        for c in probe.chars() {
            let mut glyph = scaled.scaled_glyph(c);
            glyph.position = point(caret, scaled.ascent());
            caret += scaled.h_advance(glyph.id);
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                top = top.min(bounds.min.y);
                bottom = bottom.max(bounds.max.y);
            }
        }

        if top > bottom {
            scaled.height().ceil().max(1.0) as u32
        } else {
            (bottom - top).round().max(1.0) as u32
        }
    }
}

impl FontMetrics for GlyphFont {
    fn text_width(&self, text: &str) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        let mut width = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }

    fn glyph_height(&self) -> u32 {
        self.glyph_height
    }
}

impl PageFont for GlyphFont {
    fn draw_line(&self, canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        draw_text_mut(canvas, color, x, y, self.scale, &self.font, text);
    }
}

// ============================================================================
// BlockFont
// ============================================================================

/// Fixed-advance font that renders each visible character as a solid block
///
/// Needs no font file, so previews and tests render without assets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockFont {
    advance: f32,
    height: u32,
}

impl BlockFont {
    pub fn new(advance: f32, height: u32) -> Self {
        BlockFont {
            advance: advance.max(1.0),
            height: height.max(1),
        }
    }

    /// Proportions roughly matching a regular outline face at `size_px`
    pub fn for_size(size_px: f32) -> Self {
        BlockFont::new((size_px * 0.55).round(), (size_px * 0.9).round() as u32)
    }
}

impl FontMetrics for BlockFont {
    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance
    }

    fn glyph_height(&self) -> u32 {
        self.height
    }
}

impl PageFont for BlockFont {
    fn draw_line(&self, canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        let block_width = ((self.advance * 0.8).round() as u32).max(1);
        for (i, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let left = x + (i as f32 * self.advance).round() as i32;
            let rect = Rect::at(left, y).of_size(block_width, self.height);
            draw_filled_rect_mut(canvas, rect, color);
        }
    }
}
