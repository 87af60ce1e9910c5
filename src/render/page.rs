//! Page layout and rendering
//!
//! Text is wrapped, split into pages by a running vertical cursor, and each
//! page is drawn on a fresh copy of the background template. All pages are
//! encoded before anything is returned.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{PitchPageError, Result};
use crate::render::font::{BlockFont, FontMetrics, GlyphFont, PageFont};
use crate::render::wrap::wrap_text;

// ============================================================================
// Settings
// ============================================================================

/// Encoding used for rendered pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageFormat {
    #[default]
    Jpeg,
    Png,
}

impl PageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            PageFormat::Jpeg => "jpg",
            PageFormat::Png => "png",
        }
    }
}

/// Geometry of the text block on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Left edge of every line
    pub origin_x: u32,
    /// Top of the first line on each page
    pub origin_y: u32,
    /// Space kept free on the right of the longest line
    pub right_margin: u32,
    /// Extra pixels between lines
    pub line_pad: u32,
    /// Line steps kept free at the bottom of each page
    pub bottom_margin_lines: u32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        LayoutParams {
            origin_x: 150,
            origin_y: 140,
            right_margin: 10,
            line_pad: 3,
            bottom_margin_lines: 3,
        }
    }
}

/// Everything needed to build a [`PageRenderer`] from files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// TrueType/OpenType font; the built-in block font is used when unset
    pub font_path: Option<PathBuf>,
    /// Background image; a blank page is used when unset
    pub template_path: Option<PathBuf>,
    /// Size of the blank page used without a template
    pub blank_size: (u32, u32),
    pub font_size: f32,
    pub text_color: [u8; 3],
    pub layout: LayoutParams,
    pub format: PageFormat,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            font_path: None,
            template_path: None,
            blank_size: (1000, 1400),
            font_size: 30.0,
            text_color: [1, 22, 55],
            layout: LayoutParams::default(),
            format: PageFormat::Jpeg,
            jpeg_quality: 75,
        }
    }
}

// ============================================================================
// Layout
// ============================================================================

/// A line of text positioned on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedLine {
    pub text: String,
    pub x: i32,
    pub y: i32,
}

/// Lines grouped into pages, in reading order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageLayout {
    pub pages: Vec<Vec<PlacedLine>>,
}

impl PageLayout {
    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn num_lines(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }
}

/// Vertical distance from one line to the next
pub fn line_step<F: FontMetrics + ?Sized>(font: &F, params: &LayoutParams) -> i64 {
    font.glyph_height() as i64 + params.line_pad as i64
}

/// Widest a line may be before it is wrapped
pub fn max_line_width(canvas_width: u32, params: &LayoutParams) -> f32 {
    canvas_width as f32 - params.origin_x as f32 - params.right_margin as f32
}

/// Place pre-wrapped lines onto pages
///
/// Before each line, if it would cross `canvas_height - bottom_margin_lines
/// * step`, the current page is closed and a new one started. The open page
/// is always closed at the end, so at least one page exists.
pub fn paginate(lines: Vec<String>, step: i64, canvas_height: u32, params: &LayoutParams) -> PageLayout {
    let bottom = canvas_height as i64 - params.bottom_margin_lines as i64 * step;
    let top = params.origin_y as i64;

    let mut pages = Vec::new();
    let mut current = Vec::new();
    let mut cursor = top;

    for text in lines {
        if cursor + step > bottom {
            pages.push(std::mem::take(&mut current));
            cursor = top;
        }
        current.push(PlacedLine {
            text,
            x: params.origin_x as i32,
            y: cursor as i32,
        });
        cursor += step;
    }
    pages.push(current);

    PageLayout { pages }
}

/// Wrap and paginate `text` for a canvas of the given size
pub fn layout<F: FontMetrics + ?Sized>(
    text: &str,
    font: &F,
    canvas_size: (u32, u32),
    params: &LayoutParams,
) -> PageLayout {
    let (width, height) = canvas_size;
    let lines = wrap_text(text, font, max_line_width(width, params));
    paginate(lines, line_step(font, params), height, params)
}

// ============================================================================
// Rendering
// ============================================================================

/// One encoded page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Zero-based position in the page sequence
    pub index: usize,
    pub bytes: Vec<u8>,
    pub format: PageFormat,
}

impl RenderedPage {
    /// Suggested file name, e.g. `page_01.jpg`
    pub fn filename(&self) -> String {
        format!("page_{:02}.{}", self.index + 1, self.format.extension())
    }
}

/// Load a background template image
pub fn load_template(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).map_err(|e| PitchPageError::ResourceLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(image.to_rgb8())
}

/// Renders text onto copies of an immutable background template
pub struct PageRenderer {
    font: Box<dyn PageFont>,
    template: RgbImage,
    params: LayoutParams,
    color: Rgb<u8>,
    format: PageFormat,
    jpeg_quality: u8,
}

impl std::fmt::Debug for PageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRenderer")
            .field("template", &self.template.dimensions())
            .field("params", &self.params)
            .field("format", &self.format)
            .finish()
    }
}

impl PageRenderer {
    /// Build a renderer from a loaded font and template
    ///
    /// # Errors
    /// * `ResourceLoad` - If the template has zero width or height
    pub fn new(font: Box<dyn PageFont>, template: RgbImage, params: LayoutParams) -> Result<Self> {
        let (width, height) = template.dimensions();
        if width == 0 || height == 0 {
            return Err(PitchPageError::ResourceLoad {
                path: "template".to_string(),
                reason: format!("template is {}x{}", width, height),
            });
        }
        Ok(PageRenderer {
            font,
            template,
            params,
            color: Rgb([1, 22, 55]),
            format: PageFormat::Jpeg,
            jpeg_quality: 75,
        })
    }

    /// Load font and template as described by `settings`
    ///
    /// # Errors
    /// * `FontLoad` / `ResourceLoad` - If either resource cannot be loaded
    /// * `Config` - If the JPEG quality is outside 1-100
    pub fn from_settings(settings: &RenderSettings) -> Result<Self> {
        let font: Box<dyn PageFont> = match &settings.font_path {
            Some(path) => Box::new(GlyphFont::from_file(path, settings.font_size)?),
            None => Box::new(BlockFont::for_size(settings.font_size)),
        };
        let template = match &settings.template_path {
            Some(path) => load_template(path)?,
            None => {
                let (w, h) = settings.blank_size;
                RgbImage::from_pixel(w, h, Rgb([250, 248, 240]))
            }
        };

        log::info!(
            "Page renderer ready: template {}x{}, font {}",
            template.width(),
            template.height(),
            settings
                .font_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in blocks".to_string())
        );

        PageRenderer::new(font, template, settings.layout)?
            .with_color(Rgb(settings.text_color))
            .with_format(settings.format, settings.jpeg_quality)
    }

    pub fn with_color(mut self, color: Rgb<u8>) -> Self {
        self.color = color;
        self
    }

    /// Choose the page encoding
    ///
    /// # Errors
    /// * `Config` - If the JPEG quality is outside 1-100
    pub fn with_format(mut self, format: PageFormat, jpeg_quality: u8) -> Result<Self> {
        if !(1..=100).contains(&jpeg_quality) {
            return Err(PitchPageError::Config {
                reason: format!("jpeg quality must be 1-100, got {}", jpeg_quality),
            });
        }
        self.format = format;
        self.jpeg_quality = jpeg_quality;
        Ok(self)
    }

    pub fn template_size(&self) -> (u32, u32) {
        self.template.dimensions()
    }

    /// Compute page layout for `text` without drawing
    pub fn layout(&self, text: &str) -> PageLayout {
        layout(text, &*self.font, self.template.dimensions(), &self.params)
    }

    /// Lay out, draw and encode every page for `text`
    ///
    /// # Errors
    /// * `Encode` - If a page fails to encode
    pub fn render(&self, text: &str) -> Result<Vec<RenderedPage>> {
        let page_layout = self.layout(text);
        log::debug!(
            "Laid out {} lines on {} page(s)",
            page_layout.num_lines(),
            page_layout.num_pages()
        );

        page_layout
            .pages
            .iter()
            .enumerate()
            .map(|(index, lines)| {
                let canvas = self.draw_page(lines);
                Ok(RenderedPage {
                    index,
                    bytes: self.encode(&canvas)?,
                    format: self.format,
                })
            })
            .collect()
    }

    /// Draw lines on a fresh copy of the template
    pub fn draw_page(&self, lines: &[PlacedLine]) -> RgbImage {
        let mut canvas = self.template.clone();
        for line in lines {
            self.font.draw_line(&mut canvas, line.x, line.y, &line.text, self.color);
        }
        canvas
    }

    fn encode(&self, canvas: &RgbImage) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let encoded = match self.format {
            PageFormat::Jpeg => JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality).encode_image(canvas),
            PageFormat::Png => canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png),
        };
        encoded.map_err(|e| PitchPageError::Encode {
            reason: format!("page encoding failed: {}", e),
        })?;
        Ok(bytes)
    }
}
