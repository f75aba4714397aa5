//! Export configuration

use crate::error::{ExportError, Result};
use crate::pagination::{PageLayout, TrailingPage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for one export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Output page in millimetres
    pub layout: PageLayout,
    /// Bitmap pixels per document pixel
    pub render_scale: f32,
    /// Width of the rendered document in document pixels
    pub document_width: f32,
    pub trailing_page: TrailingPage,
    /// Font file overriding the system font search
    pub font_path: Option<PathBuf>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            layout: PageLayout::A4,
            render_scale: 2.0,
            document_width: 800.0,
            trailing_page: TrailingPage::Keep,
            font_path: None,
        }
    }
}

impl ExportOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        let options: ExportOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        if !(self.render_scale.is_finite() && self.render_scale > 0.0) {
            return Err(ExportError::geometry(format!("render scale must be positive, got {}", self.render_scale)));
        }
        if !(self.document_width.is_finite() && self.document_width >= 100.0) {
            return Err(ExportError::geometry(format!(
                "document width must be at least 100px, got {}",
                self.document_width
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let options = ExportOptions::from_json(r#"{"render_scale": 1.5, "trailing_page": "drop"}"#).unwrap();
        assert_eq!(options.render_scale, 1.5);
        assert_eq!(options.trailing_page, TrailingPage::Drop);
        assert_eq!(options.layout, PageLayout::A4);
        assert_eq!(options.document_width, 800.0);
    }

    #[test]
    fn rejects_bad_layout() {
        let json = r#"{"layout": {"page_width": 210.0, "page_height": 10.0, "margin": 5.0}}"#;
        assert!(matches!(ExportOptions::from_json(json), Err(ExportError::InvalidGeometry(_))));
    }

    #[test]
    fn rejects_non_positive_scale() {
        let options = ExportOptions { render_scale: 0.0, ..ExportOptions::default() };
        assert!(options.validate().is_err());
    }
}
