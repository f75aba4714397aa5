//! Page tiling for rasterized documents
//!
//! A rendered quote is a single tall bitmap. It is scaled to the content width
//! of the output page and then drawn once per page, shifted upwards by one
//! usable page height each time, so that every page window shows the next
//! vertical slice of the document.

use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};

/// Output page geometry in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
}

impl PageLayout {
    pub const A4: PageLayout = PageLayout {
        page_width: 210.0,
        page_height: 297.0,
        margin: 5.0,
    };

    pub fn new(page_width: f32, page_height: f32, margin: f32) -> Self {
        Self { page_width, page_height, margin }
    }

    /// Width available to the image once both side margins are removed
    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Vertical space per page between the top and bottom margins
    pub fn usable_height(&self) -> f32 {
        self.page_height - 2.0 * self.margin
    }

    /// Full height of `image` after uniform scaling to the content width
    pub fn scaled_height(&self, image: &RenderedImage) -> f32 {
        image.pixel_height as f32 * self.content_width() / image.pixel_width as f32
    }

    pub fn validate(&self) -> Result<()> {
        let values = [self.page_width, self.page_height, self.margin];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ExportError::geometry(format!("non-finite page layout {:?}", self)));
        }
        if self.margin < 0.0 {
            return Err(ExportError::geometry(format!("negative margin {}", self.margin)));
        }
        if self.page_height <= 2.0 * self.margin {
            return Err(ExportError::geometry(format!(
                "page height {} leaves no room inside margins of {}",
                self.page_height, self.margin
            )));
        }
        if self.page_width <= 2.0 * self.margin {
            return Err(ExportError::geometry(format!(
                "page width {} leaves no room inside margins of {}",
                self.page_width, self.margin
            )));
        }
        Ok(())
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::A4
    }
}

/// Pixel size of a captured document bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedImage {
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl RenderedImage {
    pub fn new(pixel_width: u32, pixel_height: u32) -> Self {
        Self { pixel_width, pixel_height }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pixel_width == 0 || self.pixel_height == 0 {
            return Err(ExportError::geometry(format!(
                "rendered image has empty dimensions {}x{}",
                self.pixel_width, self.pixel_height
            )));
        }
        Ok(())
    }
}

/// Where the document image is drawn on one output page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub page_index: usize,
    /// Offset of the image top from the top of the content area, in mm.
    /// Zero on the first page and increasingly negative afterwards.
    pub vertical_offset: f32,
}

/// What to do when the scaled image fills its last page exactly.
///
/// `Keep` emits one more page after an exact fit. That page shows nothing
/// of the document; it is what the quote tool has always produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingPage {
    #[default]
    Keep,
    Drop,
}

/// Tile `image` across pages of `layout`, keeping the trailing page after an exact fit.
pub fn compute_placements(image: &RenderedImage, layout: &PageLayout) -> Result<Vec<Placement>> {
    compute_placements_with(image, layout, TrailingPage::Keep)
}

pub fn compute_placements_with(
    image: &RenderedImage,
    layout: &PageLayout,
    trailing: TrailingPage,
) -> Result<Vec<Placement>> {
    image.validate()?;
    layout.validate()?;

    let scaled_height = layout.scaled_height(image);
    let usable_height = layout.usable_height();

    if scaled_height <= usable_height {
        return Ok(vec![Placement { page_index: 0, vertical_offset: 0.0 }]);
    }

    let whole_pages = (scaled_height / usable_height).floor();
    let exact_fit = scaled_height - whole_pages * usable_height == 0.0;

    // Page i (i >= 1) exists while scaled_height - i * usable_height >= 0.
    let page_count = match (exact_fit, trailing) {
        (true, TrailingPage::Drop) => whole_pages as usize,
        _ => whole_pages as usize + 1,
    };

    Ok((0..page_count)
        .map(|page_index| Placement {
            page_index,
            vertical_offset: 0.0 - page_index as f32 * usable_height,
        })
        .collect())
}

/// Number of output pages `compute_placements` would produce
pub fn page_count(image: &RenderedImage, layout: &PageLayout) -> Result<usize> {
    Ok(compute_placements(image, layout)?.len())
}
