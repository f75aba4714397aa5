//! Quote GUI DLL
//!
//! PDF export bridge for the quote form. The host calls
//! `export_quote_pdf_ffi` when the user asks for a download.

use quote_pdf_creator::{export_quote, ExportOptions, FontRasterizer, QuoteSnapshot};
use simplelog::{Config, LevelFilter, WriteLogger};
use std::ffi::CStr;
use std::fs::File;
use std::os::raw::{c_char, c_int};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Status codes returned across the FFI boundary
pub const EXPORT_OK: c_int = 0;
pub const EXPORT_FAILED: c_int = -1;
pub const EXPORT_BUSY: c_int = -2;

static EXPORT_IN_FLIGHT: AtomicBool = AtomicBool::new(false);

/// Marks an export as running; released on drop
pub struct ExportGuard {
    flag: &'static AtomicBool,
}

impl ExportGuard {
    /// Claim `flag`, or `None` if another export holds it
    pub fn try_acquire(flag: &'static AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Send log output to `log_path`. Returns -1 if the file cannot be created
/// or a logger is already installed.
#[no_mangle]
pub extern "C" fn init_logging_ffi(log_path: *const c_char) -> c_int {
    if log_path.is_null() {
        return EXPORT_FAILED;
    }
    let log_path = unsafe { CStr::from_ptr(log_path).to_string_lossy().into_owned() };

    let file = match File::create(&log_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Could not create log file {}: {}", log_path, e);
            return EXPORT_FAILED;
        }
    };
    match WriteLogger::init(LevelFilter::Info, Config::default(), file) {
        Ok(()) => EXPORT_OK,
        Err(_) => EXPORT_FAILED,
    }
}

/// Export a quote to PDF.
///
/// - `quote_json`: snapshot of the form, as JSON
/// - `options_json`: optional `ExportOptions` JSON; null uses the defaults
/// - `output_dir`: directory the PDF is written into
/// - `out_file_name` / `out_len`: optional buffer receiving the NUL-terminated
///   file name that was written (truncated to fit)
///
/// Returns 0 on success, -1 on failure and -2 when another export is still running.
#[no_mangle]
pub extern "C" fn export_quote_pdf_ffi(
    quote_json: *const c_char,
    options_json: *const c_char,
    output_dir: *const c_char,
    out_file_name: *mut c_char,
    out_len: usize,
) -> c_int {
    if quote_json.is_null() || output_dir.is_null() {
        return EXPORT_FAILED;
    }

    let _guard = match ExportGuard::try_acquire(&EXPORT_IN_FLIGHT) {
        Some(guard) => guard,
        None => {
            log::warn!("Export requested while another export is running");
            return EXPORT_BUSY;
        }
    };

    let quote_json = unsafe { CStr::from_ptr(quote_json).to_string_lossy().into_owned() };
    let output_dir = unsafe { CStr::from_ptr(output_dir).to_string_lossy().into_owned() };
    let options_json = if options_json.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(options_json).to_string_lossy().into_owned() })
    };

    match run_export(&quote_json, options_json.as_deref(), Path::new(&output_dir)) {
        Ok(file_name) => {
            unsafe { write_c_string(&file_name, out_file_name, out_len) };
            EXPORT_OK
        }
        Err(e) => {
            log::error!("Error generating PDF: {}", e);
            EXPORT_FAILED
        }
    }
}

fn run_export(
    quote_json: &str,
    options_json: Option<&str>,
    output_dir: &Path,
) -> quote_pdf_creator::Result<String> {
    let snapshot = QuoteSnapshot::from_json(quote_json)?;
    let options = match options_json {
        Some(json) => ExportOptions::from_json(json)?,
        None => ExportOptions::default(),
    };
    let rasterizer = FontRasterizer::from_options(options.clone())?;
    let report = export_quote(&snapshot, &rasterizer, &options, output_dir)?;
    Ok(report.file_name)
}

/// Copy `value` into a caller buffer of `len` bytes, always NUL terminating.
unsafe fn write_c_string(value: &str, buffer: *mut c_char, len: usize) {
    if buffer.is_null() || len == 0 {
        return;
    }
    let bytes = value.as_bytes();
    let count = bytes.len().min(len - 1);
    std::ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, buffer, count);
    *buffer.add(count) = 0;
}
