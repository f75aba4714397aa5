//! Error types for quote export

use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that can abort a quote export
#[derive(Error, Debug)]
pub enum ExportError {
    /// Image dimensions or page layout that cannot be paginated
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Capturing the rendered document as a bitmap failed
    #[error("Rasterization failed: {0}")]
    RasterizationFailure(String),

    /// The quote snapshot could not be decoded
    #[error("Invalid quote data: {0}")]
    InvalidQuote(#[from] serde_json::Error),

    /// PDF object construction or serialization failed
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn geometry(message: impl Into<String>) -> Self {
        ExportError::InvalidGeometry(message.into())
    }

    pub fn raster(message: impl Into<String>) -> Self {
        ExportError::RasterizationFailure(message.into())
    }
}
