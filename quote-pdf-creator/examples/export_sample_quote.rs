use anyhow::{Context, Result};
use quote_pdf_creator::{
    export_quote, ExportOptions, FontRasterizer, LineItem, QuoteSnapshot, QuoteTotals, Rasterizer,
};
use std::path::PathBuf;

fn main() -> Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut quote = QuoteSnapshot::new();
    quote.date = "2026-10-19".to_string();
    quote.client_name = "Dana Reyes".to_string();
    quote.subject = "Security coverage for the autumn fair".to_string();
    quote.body = "Dear Dana,\n\nThank you for the opportunity to quote on this event. \
                  Pricing below covers staffing for both days."
        .to_string();
    quote.tax_percentage = Some("8.25".to_string());

    let quote = quote
        .with_line_item(0, LineItem::new("Officer", "Unarmed, uniformed", "12", "38.00", "456.00"))
        .with_line_item_added()
        .with_line_item(1, LineItem::new("Supervisor", "On-site lead", "2", "55.00", "110.00"));

    let totals = QuoteTotals::from_snapshot(&quote);
    println!(
        "Subtotal ${}  Tax ${}  Total ${}",
        totals.subtotal, totals.tax_amount, totals.grand_total
    );

    let options = ExportOptions::default();
    let rasterizer = FontRasterizer::from_options(options.clone()).context("loading fonts")?;

    rasterizer
        .rasterize(&quote)?
        .save_png(&output_dir.join("quote_preview.png"))?;

    let report = export_quote(&quote, &rasterizer, &options, &output_dir)?;
    println!("Wrote {} ({} pages)", report.path.display(), report.page_count());
    Ok(())
}
