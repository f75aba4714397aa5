use lopdf::Document;
use quote_pdf_creator::{
    export_quote, render_quote_pdf, ExportError, ExportOptions, LineItem, PageLayout, QuoteSnapshot,
    Rasterizer, RenderedBitmap, TrailingPage,
};
use std::cell::Cell;

/// Stand-in for a real renderer: a white bitmap of a fixed size
struct FixedRasterizer {
    width: u32,
    height: u32,
    calls: Cell<usize>,
}

impl FixedRasterizer {
    fn new(width: u32, height: u32) -> Self {
        Self { width, height, calls: Cell::new(0) }
    }
}

impl Rasterizer for FixedRasterizer {
    fn rasterize(&self, _snapshot: &QuoteSnapshot) -> quote_pdf_creator::Result<RenderedBitmap> {
        self.calls.set(self.calls.get() + 1);
        Ok(RenderedBitmap::blank(self.width, self.height))
    }
}

struct BrokenRasterizer;

impl Rasterizer for BrokenRasterizer {
    fn rasterize(&self, _snapshot: &QuoteSnapshot) -> quote_pdf_creator::Result<RenderedBitmap> {
        Err(ExportError::RasterizationFailure("image failed to load".to_string()))
    }
}

fn sample_quote() -> QuoteSnapshot {
    QuoteSnapshot {
        date: "2026-10-19".to_string(),
        client_name: "Dana Reyes".to_string(),
        subject: "Event security".to_string(),
        body: "Thank you for the opportunity.".to_string(),
        tax_percentage: Some("10".to_string()),
        line_items: vec![
            LineItem::new("Guard", "Front gate", "2", "35", "70"),
            LineItem::new("Supervisor", "On site", "1", "55", "55"),
        ],
    }
}

#[test]
fn exports_multi_page_pdf_into_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let rasterizer = FixedRasterizer::new(1200, 4200);
    let snapshot = sample_quote();
    let before = snapshot.clone();

    let report = export_quote(&snapshot, &rasterizer, &ExportOptions::default(), dir.path()).unwrap();

    assert_eq!(report.file_name, "Quote_Dana_Reyes_2026_10_19.pdf");
    assert_eq!(report.path, dir.path().join(&report.file_name));
    assert_eq!(report.page_count(), 3);
    assert_eq!(rasterizer.calls.get(), 1);
    assert_eq!(snapshot, before);

    let doc = Document::load(&report.path).unwrap();
    assert_eq!(doc.get_pages().len(), 3);

    // only the finished PDF remains; the temporary file was renamed away
    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from(&report.file_name)]);
}

#[test]
fn rasterization_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let err = export_quote(&sample_quote(), &BrokenRasterizer, &ExportOptions::default(), dir.path())
        .unwrap_err();

    assert!(matches!(err, ExportError::RasterizationFailure(_)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn zero_sized_capture_is_invalid_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let rasterizer = FixedRasterizer::new(0, 0);
    let err = export_quote(&sample_quote(), &rasterizer, &ExportOptions::default(), dir.path())
        .unwrap_err();

    assert!(matches!(err, ExportError::InvalidGeometry(_)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn trailing_page_policy_applies_to_exact_fit() {
    // 1200x3444 scales to exactly two usable A4 heights
    let rasterizer = FixedRasterizer::new(1200, 3444);

    let kept = render_quote_pdf(&sample_quote(), &rasterizer, &ExportOptions::default()).unwrap();
    assert_eq!(kept.placements.len(), 3);
    assert_eq!(Document::load_mem(&kept.bytes).unwrap().get_pages().len(), 3);

    let options = ExportOptions { trailing_page: TrailingPage::Drop, ..ExportOptions::default() };
    let dropped = render_quote_pdf(&sample_quote(), &rasterizer, &options).unwrap();
    assert_eq!(dropped.placements.len(), 2);
}

#[test]
fn custom_layout_changes_page_count() {
    // Letter-ish page with generous margins: content 175.9mm wide, 239.4mm tall
    let options = ExportOptions {
        layout: PageLayout::new(215.9, 279.4, 20.0),
        ..ExportOptions::default()
    };
    let rasterizer = FixedRasterizer::new(1600, 1600);
    let pdf = render_quote_pdf(&sample_quote(), &rasterizer, &options).unwrap();
    assert_eq!(pdf.placements.len(), 1);

    let tall = FixedRasterizer::new(1600, 5000);
    let pdf = render_quote_pdf(&sample_quote(), &tall, &options).unwrap();
    // 5000 * 175.9 / 1600 = 549.7mm over 239.4mm pages
    assert_eq!(pdf.placements.len(), 3);
}

#[test]
fn exporting_twice_is_deterministic_in_pages() {
    let rasterizer = FixedRasterizer::new(800, 2000);
    let first = render_quote_pdf(&sample_quote(), &rasterizer, &ExportOptions::default()).unwrap();
    let second = render_quote_pdf(&sample_quote(), &rasterizer, &ExportOptions::default()).unwrap();
    assert_eq!(first.placements, second.placements);
    assert_eq!(first.image, second.image);
}
