//! C FFI bindings for sweep-core
//!
//! This crate provides a C-compatible API so a host UI can upload CSV bytes,
//! choose merge options, read the resulting tables and fetch export payloads.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use sweep_core::{
    parse_csv_bytes, Error, LineEnding, MergeConfig, Session, Table, TextEncoding,
};

pub const SWEEP_OK: c_int = 0;
pub const SWEEP_COLUMN_MISMATCH: c_int = 1;
pub const SWEEP_NO_INPUT: c_int = 2;
pub const SWEEP_PARSE_ERROR: c_int = 3;
pub const SWEEP_ENCODING_ERROR: c_int = 4;
pub const SWEEP_INVALID_ARGUMENT: c_int = -1;

/// Encoding selectors accepted by the byte functions
pub const SWEEP_ENCODING_LATIN1: c_int = 0;
pub const SWEEP_ENCODING_UTF8: c_int = 1;

/// Opaque handle to one user session
pub struct FfiSession {
    inner: Option<Session>,
}

impl FfiSession {
    fn tables(&self) -> &[Table] {
        self.inner
            .as_ref()
            .map(|s| s.table_set().tables())
            .unwrap_or_default()
    }
}

fn status_of(error: &Error) -> c_int {
    match error {
        Error::ColumnMismatch { .. } => SWEEP_COLUMN_MISMATCH,
        Error::NoInput => SWEEP_NO_INPUT,
        Error::Encoding { .. } => SWEEP_ENCODING_ERROR,
        _ => SWEEP_PARSE_ERROR,
    }
}

fn encoding_of(code: c_int) -> Option<TextEncoding> {
    match code {
        SWEEP_ENCODING_LATIN1 => Some(TextEncoding::Latin1),
        SWEEP_ENCODING_UTF8 => Some(TextEncoding::Utf8),
        _ => None,
    }
}

unsafe fn table_at<'a>(session: *const FfiSession, index: usize) -> Option<&'a Table> {
    if session.is_null() {
        return None;
    }
    (*session).tables().get(index)
}

fn into_c_string(s: &str) -> *mut c_char {
    CString::new(s)
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

/// Create an empty session
#[no_mangle]
pub extern "C" fn sweep_session_new() -> *mut FfiSession {
    Box::into_raw(Box::new(FfiSession { inner: None }))
}

/// Free a session
///
/// # Safety
/// - `session` must be a valid pointer returned by `sweep_session_new` or null
#[no_mangle]
pub unsafe extern "C" fn sweep_session_free(session: *mut FfiSession) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Decode an uploaded CSV file and add it to the session
///
/// Adding a file resets the session to the unmerged uploads.
///
/// # Safety
/// - `session` must be a valid pointer returned by `sweep_session_new`
/// - `name` must be a valid C string
/// - `data` must point to `len` readable bytes
#[no_mangle]
pub unsafe extern "C" fn sweep_session_add_csv(
    session: *mut FfiSession,
    name: *const c_char,
    data: *const u8,
    len: usize,
    encoding: c_int,
) -> c_int {
    if session.is_null() || name.is_null() || (data.is_null() && len > 0) {
        return SWEEP_INVALID_ARGUMENT;
    }

    let Some(encoding) = encoding_of(encoding) else {
        return SWEEP_INVALID_ARGUMENT;
    };

    let name = match CStr::from_ptr(name).to_str() {
        Ok(s) => s,
        Err(_) => return SWEEP_INVALID_ARGUMENT,
    };

    let bytes = if len == 0 {
        &[][..]
    } else {
        std::slice::from_raw_parts(data, len)
    };

    let table = match parse_csv_bytes(bytes, name, encoding) {
        Ok(t) => t,
        Err(e) => return status_of(&e),
    };

    let session = &mut *session;
    match session.inner.as_mut() {
        Some(inner) => inner.add_upload(table),
        None => match Session::new(vec![table]) {
            Ok(s) => session.inner = Some(s),
            Err(e) => return status_of(&e),
        },
    }
    SWEEP_OK
}

/// Merge the uploads with the given options
///
/// Returns `SWEEP_COLUMN_MISMATCH` when the tables cannot be combined; the
/// previous tables stay current in that case.
///
/// # Safety
/// - `session` must be a valid pointer returned by `sweep_session_new`
#[no_mangle]
pub unsafe extern "C" fn sweep_session_merge(
    session: *mut FfiSession,
    align_headers_to_first: bool,
    drop_duplicate_rows: bool,
    drop_empty_rows: bool,
    crlf: bool,
) -> c_int {
    if session.is_null() {
        return SWEEP_INVALID_ARGUMENT;
    }

    let Some(inner) = (*session).inner.as_mut() else {
        return SWEEP_NO_INPUT;
    };

    let config = MergeConfig {
        align_headers_to_first,
        drop_duplicate_rows,
        drop_empty_rows,
        line_ending: if crlf { LineEnding::Crlf } else { LineEnding::Lf },
    };

    match inner.apply(&config) {
        Ok(_) => SWEEP_OK,
        Err(e) => status_of(&e),
    }
}

/// Show the uploads unmerged again
///
/// # Safety
/// - `session` must be a valid pointer returned by `sweep_session_new`
#[no_mangle]
pub unsafe extern "C" fn sweep_session_decline_merge(session: *mut FfiSession) -> c_int {
    if session.is_null() {
        return SWEEP_INVALID_ARGUMENT;
    }

    match (*session).inner.as_mut() {
        Some(inner) => {
            inner.decline_merge();
            SWEEP_OK
        }
        None => SWEEP_NO_INPUT,
    }
}

/// Get the number of tables currently shown
///
/// # Safety
/// - `session` must be a valid pointer returned by `sweep_session_new`
#[no_mangle]
pub unsafe extern "C" fn sweep_session_table_count(session: *const FfiSession) -> usize {
    if session.is_null() {
        return 0;
    }
    (*session).tables().len()
}

/// Get the row count of a table
///
/// # Safety
/// - `session` must be a valid pointer returned by `sweep_session_new`
#[no_mangle]
pub unsafe extern "C" fn sweep_table_row_count(session: *const FfiSession, table: usize) -> usize {
    table_at(session, table).map_or(0, Table::row_count)
}

/// Get the column count of a table
///
/// # Safety
/// - `session` must be a valid pointer returned by `sweep_session_new`
#[no_mangle]
pub unsafe extern "C" fn sweep_table_col_count(session: *const FfiSession, table: usize) -> usize {
    table_at(session, table).map_or(0, Table::column_count)
}

/// Get a column name by index
///
/// # Safety
/// - `session` must be a valid pointer returned by `sweep_session_new`
/// - Returns null if an index is out of bounds
/// - Caller must free the returned string with `sweep_free_string`
#[no_mangle]
pub unsafe extern "C" fn sweep_table_col_name(
    session: *const FfiSession,
    table: usize,
    col: usize,
) -> *mut c_char {
    table_at(session, table)
        .and_then(|t| t.columns.get(col))
        .map_or(ptr::null_mut(), |c| into_c_string(&c.name))
}

/// Get a cell value as a string
///
/// # Safety
/// - `session` must be a valid pointer returned by `sweep_session_new`
/// - Returns null if an index is out of bounds or the cell is absent
/// - Caller must free the returned string with `sweep_free_string`
#[no_mangle]
pub unsafe extern "C" fn sweep_table_cell(
    session: *const FfiSession,
    table: usize,
    row: usize,
    col: usize,
) -> *mut c_char {
    table_at(session, table)
        .and_then(|t| t.rows.get(row))
        .and_then(|r| r.get(col))
        .and_then(|c| c.as_str())
        .map_or(ptr::null_mut(), into_c_string)
}

/// Get the download name of a table
///
/// # Safety
/// - `session` must be a valid pointer returned by `sweep_session_new`
/// - Caller must free the returned string with `sweep_free_string`
#[no_mangle]
pub unsafe extern "C" fn sweep_export_name(session: *const FfiSession, table: usize) -> *mut c_char {
    match table_at(session, table) {
        Some(_) => into_c_string(&sweep_core::export_file_name(table + 1)),
        None => ptr::null_mut(),
    }
}

/// Encode a table as CSV bytes using the session's line ending
///
/// Returns `SWEEP_ENCODING_ERROR` when a value cannot be written in the
/// requested encoding and `SWEEP_INVALID_ARGUMENT` for a bad table index.
///
/// # Safety
/// - `session` must be a valid pointer returned by `sweep_session_new`
/// - `out_data` and `out_len` must be valid pointers; they receive the buffer
///   (null on failure) and its byte count
/// - Caller must free the returned buffer with `sweep_free_bytes`
#[no_mangle]
pub unsafe extern "C" fn sweep_export_bytes(
    session: *const FfiSession,
    table: usize,
    encoding: c_int,
    out_data: *mut *mut u8,
    out_len: *mut usize,
) -> c_int {
    if session.is_null() || out_data.is_null() || out_len.is_null() {
        return SWEEP_INVALID_ARGUMENT;
    }
    *out_data = ptr::null_mut();
    *out_len = 0;

    let Some(inner) = (*session).inner.as_ref() else {
        return SWEEP_NO_INPUT;
    };
    let Some(encoding) = encoding_of(encoding) else {
        return SWEEP_INVALID_ARGUMENT;
    };
    let Some(table) = inner.table_set().tables().get(table) else {
        return SWEEP_INVALID_ARGUMENT;
    };

    match sweep_core::encode_csv(table, inner.line_ending(), encoding) {
        Ok(bytes) => {
            let bytes = bytes.into_boxed_slice();
            *out_len = bytes.len();
            *out_data = Box::into_raw(bytes) as *mut u8;
            SWEEP_OK
        }
        Err(e) => status_of(&e),
    }
}

/// Free a buffer returned by `sweep_export_bytes`
///
/// # Safety
/// - `data` and `len` must come from the same `sweep_export_bytes` call, or `data` is null
#[no_mangle]
pub unsafe extern "C" fn sweep_free_bytes(data: *mut u8, len: usize) {
    if !data.is_null() {
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(data, len)));
    }
}

/// Free a string returned by other FFI functions
///
/// # Safety
/// - `s` must be a valid pointer returned by a sweep_* function or null
#[no_mangle]
pub unsafe extern "C" fn sweep_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
