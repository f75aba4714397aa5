//! Export boundary: snapshot in, PDF file out
//!
//! Every step runs before anything touches the disk, and the file is written
//! under a temporary name and renamed into place, so a failed export never
//! leaves a partial file behind.

use crate::error::Result;
use crate::options::ExportOptions;
use crate::pagination::{compute_placements_with, Placement, RenderedImage};
use crate::pdf_writer::QuotePdfGenerator;
use crate::quote::QuoteSnapshot;
use crate::raster::Rasterizer;
use log::{debug, error, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Outcome of a successful export
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    pub file_name: String,
    pub image: RenderedImage,
    pub placements: Vec<Placement>,
}

impl ExportReport {
    pub fn page_count(&self) -> usize {
        self.placements.len()
    }
}

/// A finished PDF held in memory
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub image: RenderedImage,
    pub placements: Vec<Placement>,
}

/// File name derived from the client and the quote date, e.g.
/// `Quote_Dana_Reyes_2026_10_19.pdf`
pub fn export_file_name(snapshot: &QuoteSnapshot) -> String {
    format!(
        "Quote_{}_{}.pdf",
        file_name_part(&snapshot.client_name, "client"),
        file_name_part(&snapshot.date, "undated")
    )
}

fn file_name_part(raw: &str, fallback: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return fallback.to_string();
    }
    trimmed
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}

/// Rasterize `snapshot`, tile it onto pages and assemble the PDF in memory
pub fn render_quote_pdf<R: Rasterizer + ?Sized>(
    snapshot: &QuoteSnapshot,
    rasterizer: &R,
    options: &ExportOptions,
) -> Result<RenderedPdf> {
    options.validate()?;

    let bitmap = rasterizer.rasterize(snapshot)?;
    let image = bitmap.rendered_image();
    let placements = compute_placements_with(&image, &options.layout, options.trailing_page)?;
    info!(
        "Paginating {}x{} px document onto {} page(s)",
        image.pixel_width,
        image.pixel_height,
        placements.len()
    );

    let title = if snapshot.client_name.trim().is_empty() {
        "Quote".to_string()
    } else {
        format!("Quote for {}", snapshot.client_name.trim())
    };
    let bytes = QuotePdfGenerator::new(options.layout)
        .with_title(title)
        .generate(&bitmap, &placements)?;

    Ok(RenderedPdf { bytes, image, placements })
}

/// Export `snapshot` as a PDF inside `output_dir`.
///
/// Failures are logged here and returned unchanged; there is no retry.
pub fn export_quote<R: Rasterizer + ?Sized>(
    snapshot: &QuoteSnapshot,
    rasterizer: &R,
    options: &ExportOptions,
    output_dir: &Path,
) -> Result<ExportReport> {
    let file_name = export_file_name(snapshot);
    info!("Exporting quote to {}", output_dir.join(&file_name).display());

    let result = render_quote_pdf(snapshot, rasterizer, options).and_then(|pdf| {
        let path = output_dir.join(&file_name);
        write_file_atomically(output_dir, &path, &pdf.bytes)?;
        Ok(ExportReport {
            path,
            file_name: file_name.clone(),
            image: pdf.image,
            placements: pdf.placements,
        })
    });

    match &result {
        Ok(report) => info!("Saved {} ({} pages)", report.path.display(), report.page_count()),
        Err(e) => error!("Error generating PDF {}: {}", file_name, e),
    }
    result
}

/// Write `bytes` to a temporary file in `dir`, then rename it over `path`.
/// The temporary file is removed if any step fails.
fn write_file_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = NamedTempFile::new_in(dir)?;
    debug!("Writing {} bytes to {}", bytes.len(), file.path().display());
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn atomic_write_replaces_existing_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Quote_A_undated.pdf");
        std::fs::write(&path, b"an older, longer export").unwrap();

        write_file_atomically(dir.path(), &path, b"%PDF-1.5").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5");
        assert_eq!(dir_entries(dir.path()), vec!["Quote_A_undated.pdf".to_string()]);
    }

    #[test]
    fn atomic_write_into_missing_directory_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let path = missing.join("Quote_A_undated.pdf");

        let err = write_file_atomically(&missing, &path, b"%PDF-1.5").unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
        assert!(!path.exists());
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[test]
    fn file_name_replaces_punctuation() {
        let snapshot = QuoteSnapshot {
            client_name: "Dana Reyes".to_string(),
            date: "2026-10-19".to_string(),
            ..QuoteSnapshot::new()
        };
        assert_eq!(export_file_name(&snapshot), "Quote_Dana_Reyes_2026_10_19.pdf");
    }

    #[test]
    fn file_name_handles_missing_and_non_ascii_parts() {
        let snapshot = QuoteSnapshot {
            client_name: "  Zoë & Co.  ".to_string(),
            ..QuoteSnapshot::new()
        };
        assert_eq!(export_file_name(&snapshot), "Quote_Zo____Co__undated.pdf");
        assert_eq!(export_file_name(&QuoteSnapshot::new()), "Quote_client_undated.pdf");
    }
}
