//! Quote PDF Creator
//!
//! Renders a quote snapshot into a bitmap, tiles the bitmap across fixed-size
//! pages and writes the result as a PDF.

pub mod document;
pub mod error;
pub mod export;
pub mod fonts;
pub mod options;
pub mod pagination;
pub mod pdf_writer;
pub mod quote;
pub mod raster;
pub mod totals;
pub mod typography;

// Re-export commonly used functions and types
pub use error::{ExportError, Result};
pub use export::{export_file_name, export_quote, render_quote_pdf, ExportReport, RenderedPdf};
pub use fonts::FontContext;
pub use options::ExportOptions;
pub use pagination::{
    compute_placements, compute_placements_with, page_count, PageLayout, Placement, RenderedImage,
    TrailingPage,
};
pub use quote::{LineItem, QuoteSnapshot};
pub use raster::{FontRasterizer, Rasterizer, RenderedBitmap};
pub use totals::{parse_amount, Amount, QuoteTotals};

use libc::{c_char, c_int, c_void};
use log::error;
use std::ffi::CStr;
use std::path::Path;

/// Load fonts and create an exporter handle. Returns null when no font is usable.
#[no_mangle]
pub extern "C" fn init_quote_exporter() -> *mut c_void {
    match FontRasterizer::from_options(ExportOptions::default()) {
        Ok(rasterizer) => Box::into_raw(Box::new(rasterizer)) as *mut c_void,
        Err(e) => {
            error!("Exporter initialization failed: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Release a handle from `init_quote_exporter`
#[no_mangle]
pub extern "C" fn cleanup_quote_exporter(context: *mut c_void) {
    if !context.is_null() {
        unsafe {
            let _ = Box::from_raw(context as *mut FontRasterizer);
        }
    }
}

/// Set page size and margin (millimetres) and the render scale for a handle
#[no_mangle]
pub extern "C" fn set_page_layout(
    context: *mut c_void,
    page_width: f32,
    page_height: f32,
    margin: f32,
    render_scale: f32,
) -> c_int {
    if context.is_null() {
        return -1;
    }
    let rasterizer = unsafe { &mut *(context as *mut FontRasterizer) };

    let options = ExportOptions {
        layout: PageLayout::new(page_width, page_height, margin),
        render_scale,
        ..rasterizer.options().clone()
    };
    if let Err(e) = options.validate() {
        error!("Rejected page layout: {}", e);
        return -1;
    }
    rasterizer.set_options(options);
    0
}

/// Export a JSON quote snapshot into `output_dir` using a handle's settings
#[no_mangle]
pub extern "C" fn export_quote_with_context(
    context: *mut c_void,
    quote_json: *const c_char,
    output_dir: *const c_char,
) -> c_int {
    if context.is_null() || quote_json.is_null() || output_dir.is_null() {
        return -1;
    }
    let rasterizer = unsafe { &*(context as *const FontRasterizer) };
    let quote_json = unsafe { CStr::from_ptr(quote_json).to_string_lossy().into_owned() };
    let output_dir = unsafe { CStr::from_ptr(output_dir).to_string_lossy().into_owned() };

    let snapshot = match QuoteSnapshot::from_json(&quote_json) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("Error generating PDF: {}", e);
            return -1;
        }
    };

    match export_quote(&snapshot, rasterizer, rasterizer.options(), Path::new(&output_dir)) {
        Ok(_) => 0,
        Err(_) => -1, // already logged by export_quote
    }
}
