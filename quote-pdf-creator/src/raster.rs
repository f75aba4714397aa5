//! Document rasterization
//!
//! Paints a laid-out quote into an RGB bitmap with fontdue glyph coverage.
//! The bitmap is what gets tiled onto PDF pages.

use crate::document::{layout_quote_document, DocumentLayout, DrawCommand};
use crate::error::{ExportError, Result};
use crate::fonts::FontContext;
use crate::options::ExportOptions;
use crate::pagination::RenderedImage;
use crate::quote::QuoteSnapshot;
use crate::typography::TextStyle;
use image::{Rgb, RgbImage};
use log::debug;
use std::path::Path;

/// Largest bitmap edge accepted, matching common canvas limits
pub const MAX_BITMAP_DIMENSION: u32 = 32_767;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Captures a quote as a bitmap
pub trait Rasterizer {
    fn rasterize(&self, snapshot: &QuoteSnapshot) -> Result<RenderedBitmap>;
}

/// A captured document
#[derive(Debug, Clone)]
pub struct RenderedBitmap {
    image: RgbImage,
}

impl RenderedBitmap {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Uniform white bitmap, mostly useful as a stand-in document
    pub fn blank(width: u32, height: u32) -> Self {
        Self { image: RgbImage::from_pixel(width, height, BACKGROUND) }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn rendered_image(&self) -> RenderedImage {
        RenderedImage::new(self.image.width(), self.image.height())
    }

    /// Packed 8-bit RGB samples, row major
    pub fn rgb_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Write the bitmap as a PNG preview
    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| ExportError::raster(format!("could not write preview {}: {}", path.display(), e)))
    }
}

/// Rasterizer that lays out and paints the quote with system or supplied fonts
pub struct FontRasterizer {
    fonts: FontContext,
    options: ExportOptions,
}

impl FontRasterizer {
    pub fn new(fonts: FontContext, options: ExportOptions) -> Self {
        Self { fonts, options }
    }

    /// Load fonts according to `options` and build a rasterizer
    pub fn from_options(options: ExportOptions) -> Result<Self> {
        let fonts = FontContext::load(options.font_path.as_deref())
            .map_err(|e| ExportError::raster(format!("{:#}", e)))?;
        Ok(Self::new(fonts, options))
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ExportOptions) {
        self.options = options;
    }

    pub fn layout(&self, snapshot: &QuoteSnapshot) -> DocumentLayout {
        layout_quote_document(snapshot, &self.fonts, &self.options)
    }

    pub fn paint(&self, layout: &DocumentLayout) -> Result<RenderedBitmap> {
        if layout.width == 0 || layout.height == 0 {
            return Err(ExportError::raster("document has no visible area"));
        }
        if layout.width > MAX_BITMAP_DIMENSION || layout.height > MAX_BITMAP_DIMENSION {
            return Err(ExportError::raster(format!(
                "document bitmap {}x{} exceeds the {}px limit",
                layout.width, layout.height, MAX_BITMAP_DIMENSION
            )));
        }

        let mut canvas = RgbImage::from_pixel(layout.width, layout.height, BACKGROUND);
        for command in &layout.commands {
            match command {
                DrawCommand::Fill { x, y, width, height, color } => {
                    fill_rect(&mut canvas, *x, *y, *width, *height, *color);
                }
                DrawCommand::Text { x, y, text, style } => {
                    self.draw_text(&mut canvas, *x, *y, text, style);
                }
            }
        }
        Ok(RenderedBitmap::new(canvas))
    }

    fn draw_text(&self, canvas: &mut RgbImage, x: f32, top: f32, text: &str, style: &TextStyle) {
        let (font, synthetic_bold) = self.fonts.face(style.weight);
        let baseline = top + self.fonts.ascent(style.size);
        let mut pen_x = x;
        let mut previous: Option<char> = None;

        for ch in text.chars() {
            if let Some(prev) = previous {
                pen_x += font.horizontal_kern(prev, ch, style.size).unwrap_or(0.0);
            }
            let (metrics, coverage) = font.rasterize(ch, style.size);
            let glyph_left = (pen_x + metrics.xmin as f32).round() as i64;
            let glyph_top = (baseline - metrics.height as f32 - metrics.ymin as f32).round() as i64;

            blend_glyph(canvas, glyph_left, glyph_top, metrics.width, &coverage, style.color);
            if synthetic_bold {
                blend_glyph(canvas, glyph_left + 1, glyph_top, metrics.width, &coverage, style.color);
            }

            pen_x += metrics.advance_width;
            previous = Some(ch);
        }
    }
}

impl Rasterizer for FontRasterizer {
    fn rasterize(&self, snapshot: &QuoteSnapshot) -> Result<RenderedBitmap> {
        let layout = self.layout(snapshot);
        debug!(
            "Rasterizing quote: {}x{} px, {} draw commands",
            layout.width,
            layout.height,
            layout.commands.len()
        );
        self.paint(&layout)
    }
}

fn fill_rect(canvas: &mut RgbImage, x: f32, y: f32, width: f32, height: f32, color: [u8; 3]) {
    let x0 = x.max(0.0).round() as u32;
    let y0 = y.max(0.0).round() as u32;
    let x1 = ((x + width).round().max(0.0) as u32).min(canvas.width());
    let y1 = ((y + height).round().max(0.0) as u32).min(canvas.height());
    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px, py, Rgb(color));
        }
    }
}

/// Alpha-blend an 8-bit coverage mask onto the canvas, clipping at the edges
fn blend_glyph(canvas: &mut RgbImage, left: i64, top: i64, width: usize, coverage: &[u8], color: [u8; 3]) {
    if width == 0 {
        return;
    }
    let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);
    for (index, &alpha) in coverage.iter().enumerate() {
        if alpha == 0 {
            continue;
        }
        let px = left + (index % width) as i64;
        let py = top + (index / width) as i64;
        if px < 0 || py < 0 || px >= canvas_w || py >= canvas_h {
            continue;
        }
        let pixel = canvas.get_pixel_mut(px as u32, py as u32);
        let a = alpha as u32;
        for channel in 0..3 {
            let under = pixel.0[channel] as u32;
            pixel.0[channel] = ((color[channel] as u32 * a + under * (255 - a)) / 255) as u8;
        }
    }
}
