//! C FFI bindings for u-datalens.
//!
//! # Design
//!
//! - **Opaque handle**: `*mut InsightContext` owns the parsed data and its insights
//! - **`#[repr(C)]`**: column statistics are copied into [`CColumnStats`]
//! - **Integer error codes**: 0 = success, positive = success with a note, negative = error
//! - **Thread-local error message**: `datalens_last_error()`
//! - **`catch_unwind`**: entry points that run the engine are wrapped so panics never cross the boundary
//! - **Strings**: returned `char*` values are owned by the caller and released with `datalens_string_free`
//!
//! # Safety
//!
//! Null pointer arguments return [`DATALENS_ERR_NULL_PTR`] (or a null pointer).

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic;
use std::ptr;

use crate::csv_parser::CsvParser;
use crate::dataframe::DataFrame;
use crate::error::InsightError;
use crate::insights::{compute_insights_with, InsightConfig, Insights};

// ── Error handling ────────────────────────────────────────────────────

/// Error codes returned by FFI functions.
pub const DATALENS_OK: i32 = 0;
/// The requested correlation is undefined (zero variance or too few aligned rows).
pub const DATALENS_UNDEFINED: i32 = 1;
pub const DATALENS_ERR_NULL_PTR: i32 = -1;
pub const DATALENS_ERR_INVALID_INPUT: i32 = -2;
pub const DATALENS_ERR_PARSE_FAILED: i32 = -3;
pub const DATALENS_ERR_EMPTY_INPUT: i32 = -4;
pub const DATALENS_ERR_PANIC: i32 = -99;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = CString::new(msg).ok();
    });
}

/// Maps a record-source error to an FFI error code.
fn error_code(err: &InsightError) -> i32 {
    match err {
        InsightError::EmptyInput => DATALENS_ERR_EMPTY_INPUT,
        InsightError::InvalidConfig(_) => DATALENS_ERR_INVALID_INPUT,
        InsightError::UnreadableSource(_)
        | InsightError::MalformedSource { .. }
        | InsightError::DimensionMismatch { .. } => DATALENS_ERR_PARSE_FAILED,
    }
}

/// Returns the last error message, or null if no error.
/// The returned string is valid until the next FFI call on this thread.
///
/// # Safety
/// The caller must not free the returned pointer.
#[no_mangle]
pub extern "C" fn datalens_last_error() -> *const c_char {
    LAST_ERROR.with(|cell| {
        let borrow = cell.borrow();
        match borrow.as_ref() {
            Some(cstr) => cstr.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Clears the last error message.
#[no_mangle]
pub extern "C" fn datalens_clear_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

// ── Insight Context (opaque handle) ──────────────────────────────────

/// Opaque handle holding the parsed dataset and its insights.
pub struct InsightContext {
    dataframe: DataFrame,
    insights: Insights,
}

/// C-compatible column statistics.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CColumnStats {
    /// Column index.
    pub index: u32,
    /// Number of rows.
    pub count: u64,
    /// Number of missing cells.
    pub missing: u64,
    /// 1 if the column was inferred as numeric, else 0.
    pub is_numeric: u8,
    /// Mean of the numeric cells. NaN when absent.
    pub mean: f64,
    /// Sample standard deviation. NaN when absent.
    pub std_dev: f64,
    /// Minimum. NaN when absent.
    pub min: f64,
    /// Maximum. NaN when absent.
    pub max: f64,
    /// Distinct non-missing values. -1 when absent.
    pub unique: i64,
}

fn analyze(csv: &str, delimiter: u8, numeric_threshold: f64) -> Result<InsightContext, InsightError> {
    let config = InsightConfig::new().numeric_threshold(numeric_threshold);
    config.validate()?;
    let dataframe = CsvParser::new().delimiter(delimiter).parse_str(csv)?;
    let insights = compute_insights_with(&dataframe, &config);
    Ok(InsightContext {
        dataframe,
        insights,
    })
}

/// Parses CSV text and computes its insights.
///
/// `delimiter` is the field separator byte (e.g. `','`); `numeric_threshold`
/// must lie in `[0, 1)` (use 0.8 for the default heuristic).
///
/// Returns null on failure; `datalens_last_error()` describes the cause.
///
/// # Safety
/// - `csv_data` must be a valid null-terminated UTF-8 string.
/// - The returned handle must be freed with `datalens_free`.
#[no_mangle]
pub unsafe extern "C" fn datalens_analyze_csv(
    csv_data: *const c_char,
    delimiter: u8,
    numeric_threshold: f64,
) -> *mut InsightContext {
    let result = panic::catch_unwind(|| {
        if csv_data.is_null() {
            set_last_error("null csv_data pointer");
            return ptr::null_mut();
        }

        let c_str = unsafe { CStr::from_ptr(csv_data) };
        let csv = match c_str.to_str() {
            Ok(s) => s,
            Err(e) => {
                set_last_error(&format!("invalid UTF-8: {e}"));
                return ptr::null_mut();
            }
        };

        match analyze(csv, delimiter, numeric_threshold) {
            Ok(ctx) => Box::into_raw(Box::new(ctx)),
            Err(e) => {
                set_last_error(&e.to_string());
                ptr::null_mut()
            }
        }
    });

    match result {
        Ok(ptr) => ptr,
        Err(_) => {
            set_last_error("panic in datalens_analyze_csv");
            ptr::null_mut()
        }
    }
}

/// Parses CSV text like [`datalens_analyze_csv`] but reports failures as an
/// error code, writing the handle to `out` on success.
///
/// # Safety
/// `csv_data` must be a valid null-terminated string; `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn datalens_try_analyze_csv(
    csv_data: *const c_char,
    delimiter: u8,
    numeric_threshold: f64,
    out: *mut *mut InsightContext,
) -> i32 {
    if csv_data.is_null() || out.is_null() {
        set_last_error("null pointer argument");
        return DATALENS_ERR_NULL_PTR;
    }
    let result = panic::catch_unwind(|| {
        let csv = match unsafe { CStr::from_ptr(csv_data) }.to_str() {
            Ok(s) => s,
            Err(e) => {
                set_last_error(&format!("invalid UTF-8: {e}"));
                return Err(DATALENS_ERR_PARSE_FAILED);
            }
        };
        analyze(csv, delimiter, numeric_threshold).map_err(|e| {
            set_last_error(&e.to_string());
            error_code(&e)
        })
    });

    match result {
        Ok(Ok(ctx)) => {
            unsafe { *out = Box::into_raw(Box::new(ctx)) };
            DATALENS_OK
        }
        Ok(Err(code)) => {
            unsafe { *out = ptr::null_mut() };
            code
        }
        Err(_) => {
            set_last_error("panic in datalens_try_analyze_csv");
            DATALENS_ERR_PANIC
        }
    }
}

/// Frees an insight context.
///
/// # Safety
/// `ctx` must be a valid pointer from `datalens_analyze_csv`, or null.
#[no_mangle]
pub unsafe extern "C" fn datalens_free(ctx: *mut InsightContext) {
    if !ctx.is_null() {
        let _ = unsafe { Box::from_raw(ctx) };
    }
}

/// Returns the number of rows, or -1 for a null context.
///
/// # Safety
/// `ctx` must be a valid context or null.
#[no_mangle]
pub unsafe extern "C" fn datalens_row_count(ctx: *const InsightContext) -> i64 {
    if ctx.is_null() {
        set_last_error("null context");
        return -1;
    }
    let ctx = unsafe { &*ctx };
    ctx.dataframe.row_count() as i64
}

/// Returns the number of columns, or -1 for a null context.
///
/// # Safety
/// `ctx` must be a valid context or null.
#[no_mangle]
pub unsafe extern "C" fn datalens_col_count(ctx: *const InsightContext) -> i64 {
    if ctx.is_null() {
        set_last_error("null context");
        return -1;
    }
    let ctx = unsafe { &*ctx };
    ctx.dataframe.column_count() as i64
}

/// Returns the size of the correlation matrix (number of numeric columns),
/// or -1 for a null context.
///
/// # Safety
/// `ctx` must be a valid context or null.
#[no_mangle]
pub unsafe extern "C" fn datalens_numeric_count(ctx: *const InsightContext) -> i64 {
    if ctx.is_null() {
        set_last_error("null context");
        return -1;
    }
    let ctx = unsafe { &*ctx };
    ctx.insights.matrix.len() as i64
}

/// Copies the statistics of column `index` into `out`.
///
/// # Safety
/// `ctx` must be valid. `out` must point to a writable `CColumnStats`.
#[no_mangle]
pub unsafe extern "C" fn datalens_column_stats(
    ctx: *const InsightContext,
    index: u32,
    out: *mut CColumnStats,
) -> i32 {
    if ctx.is_null() || out.is_null() {
        set_last_error("null pointer argument");
        return DATALENS_ERR_NULL_PTR;
    }
    let ctx = unsafe { &*ctx };
    let Some(stats) = ctx.insights.stats.get(index as usize) else {
        set_last_error(&format!("column index {index} out of range"));
        return DATALENS_ERR_INVALID_INPUT;
    };

    let summary = CColumnStats {
        index,
        count: stats.count as u64,
        missing: stats.missing as u64,
        is_numeric: u8::from(stats.is_numeric),
        mean: stats.mean.unwrap_or(f64::NAN),
        std_dev: stats.std_dev.unwrap_or(f64::NAN),
        min: stats.min.unwrap_or(f64::NAN),
        max: stats.max.unwrap_or(f64::NAN),
        unique: stats.unique.map_or(-1, |u| u as i64),
    };
    unsafe { *out = summary };
    DATALENS_OK
}

/// Returns the name of column `index` as a newly allocated string, or null.
///
/// # Safety
/// `ctx` must be valid. Free the result with `datalens_string_free`.
#[no_mangle]
pub unsafe extern "C" fn datalens_column_name(ctx: *const InsightContext, index: u32) -> *mut c_char {
    if ctx.is_null() {
        set_last_error("null context");
        return ptr::null_mut();
    }
    let ctx = unsafe { &*ctx };
    match ctx.dataframe.column_names().get(index as usize) {
        Some(name) => into_c_string(name.clone()),
        None => {
            set_last_error(&format!("column index {index} out of range"));
            ptr::null_mut()
        }
    }
}

/// Reads correlation cell `(i, j)` of the numeric-column matrix.
///
/// Returns [`DATALENS_OK`] and writes the coefficient, or
/// [`DATALENS_UNDEFINED`] and writes NaN when the coefficient is undefined.
///
/// # Safety
/// `ctx` must be valid. `out` must point to a writable `double`.
#[no_mangle]
pub unsafe extern "C" fn datalens_correlation(
    ctx: *const InsightContext,
    i: u32,
    j: u32,
    out: *mut f64,
) -> i32 {
    if ctx.is_null() || out.is_null() {
        set_last_error("null pointer argument");
        return DATALENS_ERR_NULL_PTR;
    }
    let ctx = unsafe { &*ctx };
    let n = ctx.insights.matrix.len();
    let (i, j) = (i as usize, j as usize);
    if i >= n || j >= n {
        set_last_error(&format!("matrix index ({i}, {j}) out of range for {n} columns"));
        return DATALENS_ERR_INVALID_INPUT;
    }

    match ctx.insights.matrix.get(i, j) {
        Some(r) => {
            unsafe { *out = r };
            DATALENS_OK
        }
        None => {
            unsafe { *out = f64::NAN };
            DATALENS_UNDEFINED
        }
    }
}

/// Serializes the insights as JSON (`{"stats": [...], "matrix": {...}}`).
///
/// # Safety
/// `ctx` must be valid. Free the result with `datalens_string_free`.
#[no_mangle]
pub unsafe extern "C" fn datalens_to_json(ctx: *const InsightContext) -> *mut c_char {
    if ctx.is_null() {
        set_last_error("null context");
        return ptr::null_mut();
    }
    let ctx = unsafe { &*ctx };
    into_c_string(ctx.insights.to_json())
}

/// Frees a string returned by this library.
///
/// # Safety
/// `s` must come from `datalens_to_json` / `datalens_column_name`, or be null.
#[no_mangle]
pub unsafe extern "C" fn datalens_string_free(s: *mut c_char) {
    if !s.is_null() {
        let _ = unsafe { CString::from_raw(s) };
    }
}

fn into_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c) => c.into_raw(),
        Err(e) => {
            set_last_error(&format!("string contains NUL byte: {e}"));
            ptr::null_mut()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze_str(csv: &str) -> *mut InsightContext {
        let c = CString::new(csv).unwrap();
        unsafe { datalens_analyze_csv(c.as_ptr(), b',', 0.8) }
    }

    fn last_error() -> String {
        let p = datalens_last_error();
        assert!(!p.is_null());
        unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned()
    }

    #[test]
    fn ffi_analyze_basic() {
        let ctx = analyze_str("x,y,label\n1,2,a\n2,4,b\n3,6,a\n");
        assert!(!ctx.is_null());
        unsafe {
            assert_eq!(datalens_row_count(ctx), 3);
            assert_eq!(datalens_col_count(ctx), 3);
            assert_eq!(datalens_numeric_count(ctx), 2);
            datalens_free(ctx);
        }
    }

    #[test]
    fn ffi_column_stats() {
        let ctx = analyze_str("x,label\n1,a\n,b\n3,a\n");
        let mut out = CColumnStats {
            index: 0,
            count: 0,
            missing: 0,
            is_numeric: 0,
            mean: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
            unique: 0,
        };
        unsafe {
            assert_eq!(datalens_column_stats(ctx, 0, &mut out), DATALENS_OK);
            assert_eq!(out.count, 3);
            assert_eq!(out.missing, 1);
            assert_eq!(out.is_numeric, 1);
            assert_eq!(out.mean, 2.0);
            assert_eq!(out.unique, -1);

            assert_eq!(datalens_column_stats(ctx, 1, &mut out), DATALENS_OK);
            assert_eq!(out.is_numeric, 0);
            assert!(out.mean.is_nan());
            assert_eq!(out.unique, 2);

            assert_eq!(
                datalens_column_stats(ctx, 9, &mut out),
                DATALENS_ERR_INVALID_INPUT
            );
            datalens_free(ctx);
        }
    }

    #[test]
    fn ffi_correlation_cells() {
        let ctx = analyze_str("a,k,b\n1,5,2\n2,5,4\n3,5,6\n");
        let mut r = 0.0;
        unsafe {
            assert_eq!(datalens_correlation(ctx, 0, 0, &mut r), DATALENS_OK);
            assert_eq!(r, 1.0);
            assert_eq!(datalens_correlation(ctx, 0, 2, &mut r), DATALENS_OK);
            assert!((r - 1.0).abs() < 1e-12);
            assert_eq!(datalens_correlation(ctx, 0, 1, &mut r), DATALENS_UNDEFINED);
            assert!(r.is_nan());
            assert_eq!(
                datalens_correlation(ctx, 3, 0, &mut r),
                DATALENS_ERR_INVALID_INPUT
            );
            datalens_free(ctx);
        }
    }

    #[test]
    fn ffi_json_and_names() {
        let ctx = analyze_str("x,y\n1,2\n2,4\n");
        unsafe {
            let name = datalens_column_name(ctx, 1);
            assert_eq!(CStr::from_ptr(name).to_str().unwrap(), "y");
            datalens_string_free(name);
            assert!(datalens_column_name(ctx, 5).is_null());

            let json = datalens_to_json(ctx);
            let text = CStr::from_ptr(json).to_str().unwrap().to_owned();
            datalens_string_free(json);
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(value["matrix"]["columns"], serde_json::json!(["x", "y"]));
            datalens_free(ctx);
        }
    }

    #[test]
    fn ffi_empty_input_sets_error() {
        datalens_clear_error();
        let ctx = analyze_str("a,b\n");
        assert!(ctx.is_null());
        assert!(last_error().contains("no data rows"));
    }

    #[test]
    fn ffi_try_analyze_error_codes() {
        let mut ctx: *mut InsightContext = ptr::null_mut();
        let empty = CString::new("").unwrap();
        let ragged = CString::new("a,b\n1\n").unwrap();
        let good = CString::new("a\n1\n").unwrap();
        unsafe {
            assert_eq!(
                datalens_try_analyze_csv(empty.as_ptr(), b',', 0.8, &mut ctx),
                DATALENS_ERR_EMPTY_INPUT
            );
            assert!(ctx.is_null());
            assert_eq!(
                datalens_try_analyze_csv(ragged.as_ptr(), b',', 0.8, &mut ctx),
                DATALENS_ERR_PARSE_FAILED
            );
            assert_eq!(
                datalens_try_analyze_csv(good.as_ptr(), b',', 1.5, &mut ctx),
                DATALENS_ERR_INVALID_INPUT
            );
            assert_eq!(
                datalens_try_analyze_csv(ptr::null(), b',', 0.8, &mut ctx),
                DATALENS_ERR_NULL_PTR
            );
            assert_eq!(
                datalens_try_analyze_csv(good.as_ptr(), b',', 0.8, &mut ctx),
                DATALENS_OK
            );
            assert!(!ctx.is_null());
            datalens_free(ctx);
        }
    }

    #[test]
    fn ffi_null_pointers() {
        unsafe {
            assert!(datalens_analyze_csv(ptr::null(), b',', 0.8).is_null());
            assert_eq!(datalens_row_count(ptr::null()), -1);
            assert_eq!(datalens_col_count(ptr::null()), -1);
            assert_eq!(datalens_numeric_count(ptr::null()), -1);
            assert!(datalens_to_json(ptr::null()).is_null());
            let mut r = 0.0;
            assert_eq!(
                datalens_correlation(ptr::null(), 0, 0, &mut r),
                DATALENS_ERR_NULL_PTR
            );
            datalens_free(ptr::null_mut());
            datalens_string_free(ptr::null_mut());
        }
    }

    #[test]
    fn ffi_semicolon_delimiter() {
        let c = CString::new("a;b\n1;2\n2;1\n").unwrap();
        let ctx = unsafe { datalens_analyze_csv(c.as_ptr(), b';', 0.8) };
        assert!(!ctx.is_null());
        unsafe {
            assert_eq!(datalens_col_count(ctx), 2);
            datalens_free(ctx);
        }
    }
}
