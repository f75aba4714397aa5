//! Font management for the document rasterizer
//!
//! Loads a regular and (when available) a bold face with fontdue and exposes
//! the metrics the layout needs. Fonts are looked up from an explicit path,
//! the `QUOTE_PDF_FONT` environment variable, then a list of common system
//! locations.

use anyhow::{anyhow, Context, Result};
use fontdue::{Font, FontSettings};
use log::{debug, info};
use std::path::Path;

/// Environment variable naming a TTF/OTF file to use for the regular face
pub const FONT_ENV_VAR: &str = "QUOTE_PDF_FONT";

pub(crate) const REGULAR_CANDIDATES: &[(&str, &str)] = &[
    ("Liberation Sans", "/usr/share/fonts/truetype/liberation2/LiberationSans-Regular.ttf"),
    ("Liberation Sans", "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf"),
    ("DejaVu Sans", "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
    ("Noto Sans", "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf"),
    ("Arial", "C:\\Windows\\Fonts\\arial.ttf"),
    ("Segoe UI", "C:\\Windows\\Fonts\\segoeui.ttf"),
    ("Helvetica", "/System/Library/Fonts/Helvetica.ttc"),
    ("Arial", "/Library/Fonts/Arial.ttf"),
];

const BOLD_CANDIDATES: &[(&str, &str)] = &[
    ("Liberation Sans Bold", "/usr/share/fonts/truetype/liberation2/LiberationSans-Bold.ttf"),
    ("Liberation Sans Bold", "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf"),
    ("DejaVu Sans Bold", "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
    ("Noto Sans Bold", "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf"),
    ("Arial Bold", "C:\\Windows\\Fonts\\arialbd.ttf"),
    ("Arial Bold", "/Library/Fonts/Arial Bold.ttf"),
];

/// Font weight used by a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

/// Loaded faces plus the name they were loaded under
#[derive(Clone)]
pub struct FontContext {
    pub regular: Font,
    pub regular_name: String,
    pub bold: Option<Font>,
    pub bold_name: Option<String>,
}

impl FontContext {
    /// Load fonts, preferring `explicit_path`, then the environment override,
    /// then the system candidates.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(FONT_ENV_VAR);
        let preferred = explicit_path.or(env_path.as_deref().map(Path::new));

        let (regular, regular_name) = match preferred {
            Some(path) => {
                let font = Self::load_font_file(path)?;
                (font, path.display().to_string())
            }
            None => Self::load_first(REGULAR_CANDIDATES)?
                .ok_or_else(|| anyhow!("No suitable document font found; set {}", FONT_ENV_VAR))?,
        };

        // A custom regular face is not paired with an unrelated system bold.
        let bold = if preferred.is_some() { None } else { Self::load_first(BOLD_CANDIDATES)? };
        let (bold, bold_name) = match bold {
            Some((font, name)) => (Some(font), Some(name)),
            None => (None, None),
        };

        info!(
            "Loaded fonts: regular={}, bold={}",
            regular_name,
            bold_name.as_deref().unwrap_or("(synthesized)")
        );

        Ok(Self { regular, regular_name, bold, bold_name })
    }

    /// Build a context from in-memory font data
    pub fn from_bytes(regular: Vec<u8>, bold: Option<Vec<u8>>) -> Result<Self> {
        let regular = Font::from_bytes(regular, FontSettings::default())
            .map_err(|e| anyhow!("Failed to parse regular font: {}", e))?;
        let bold = bold
            .map(|data| {
                Font::from_bytes(data, FontSettings::default())
                    .map_err(|e| anyhow!("Failed to parse bold font: {}", e))
            })
            .transpose()?;
        let bold_name = bold.as_ref().map(|_| "in-memory bold".to_string());
        Ok(Self {
            regular,
            regular_name: "in-memory".to_string(),
            bold,
            bold_name,
        })
    }

    fn load_first(candidates: &[(&str, &str)]) -> Result<Option<(Font, String)>> {
        for (font_name, font_path) in candidates {
            let path = Path::new(font_path);
            if path.exists() {
                debug!("Loading font {} from {}", font_name, font_path);
                let font = Self::load_font_file(path)?;
                return Ok(Some((font, font_name.to_string())));
            }
        }
        Ok(None)
    }

    fn load_font_file(path: &Path) -> Result<Font> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read font {}", path.display()))?;
        Font::from_bytes(data, FontSettings::default())
            .map_err(|e| anyhow!("Failed to load font from {}: {}", path.display(), e))
    }

    /// Face for `weight`, and whether bold has to be faked by overstriking
    pub fn face(&self, weight: Weight) -> (&Font, bool) {
        match (weight, &self.bold) {
            (Weight::Bold, Some(bold)) => (bold, false),
            (Weight::Bold, None) => (&self.regular, true),
            (Weight::Regular, _) => (&self.regular, false),
        }
    }

    /// Advance width of `text` at `size` pixels, kerning included
    pub fn text_width(&self, text: &str, size: f32, weight: Weight) -> f32 {
        let (font, synthetic_bold) = self.face(weight);
        let mut width = 0.0;
        let mut previous: Option<char> = None;
        for ch in text.chars() {
            if let Some(prev) = previous {
                width += font.horizontal_kern(prev, ch, size).unwrap_or(0.0);
            }
            width += font.metrics(ch, size).advance_width;
            previous = Some(ch);
        }
        if synthetic_bold && !text.is_empty() {
            width += 1.0;
        }
        width
    }

    /// Distance from the top of a line box to its baseline
    pub fn ascent(&self, size: f32) -> f32 {
        self.regular
            .horizontal_line_metrics(size)
            .map(|m| m.ascent)
            .unwrap_or(size * 0.8)
    }

    pub fn line_height(&self, size: f32, line_spacing: f32) -> f32 {
        let natural = self
            .regular
            .horizontal_line_metrics(size)
            .map(|m| m.new_line_size)
            .unwrap_or(size * 1.2);
        natural * line_spacing
    }
}
