//! C ABI surface: opaque handle lifecycle, per-field config setters,
//! one-shot parse, indexed row/field accessors, last-error getters, and the
//! streaming `stream_open`/`stream_feed`/`stream_end` triple.
//!
//! Every exported function validates its pointer arguments and never lets a
//! panic unwind across the boundary: each body runs inside `catch_unwind`,
//! converting a caught panic into the same sentinel/error path a normal
//! failure would take.

use std::ffi::{c_char, CStr, CString};
use std::os::raw::c_int;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use crate::config::Config;
use crate::core::machine::Parser;
use crate::error::{ErrorInfo, ParseError};
use crate::streaming::StreamingParser;

/// Opaque handle for a one-shot parser.
pub struct OcsvParser {
    inner: Parser,
    last_error_info: Option<ErrorInfo>,
    last_error_message: Option<CString>,
    field_cache: Vec<Vec<CString>>,
}

impl OcsvParser {
    fn new(config: Config) -> Result<Self, ParseError> {
        Ok(OcsvParser {
            inner: Parser::new(config)?,
            last_error_info: None,
            last_error_message: None,
            field_cache: Vec::new(),
        })
    }

    fn record_error(&mut self, err: &ParseError, input: &[u8]) {
        let info = ErrorInfo::from_parse_error(err, input);
        self.last_error_message = CString::new(info.format()).ok();
        self.last_error_info = Some(info);
    }

    fn rebuild_field_cache(&mut self) {
        self.field_cache = self
            .inner
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|f| CString::new(f.as_str()).unwrap_or_default())
                    .collect()
            })
            .collect();
    }
}

fn catch<F: FnOnce() -> R, R>(default: R, f: F) -> R {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or(default)
}

unsafe fn handle<'a>(ptr: *mut OcsvParser) -> Option<&'a mut OcsvParser> {
    if ptr.is_null() {
        None
    } else {
        Some(&mut *ptr)
    }
}

#[no_mangle]
pub extern "C" fn ocsv_parser_create() -> *mut OcsvParser {
    catch(ptr::null_mut(), || match OcsvParser::new(Config::default()) {
        Ok(parser) => Box::into_raw(Box::new(parser)),
        Err(_) => ptr::null_mut(),
    })
}

#[no_mangle]
pub extern "C" fn ocsv_parser_destroy(parser: *mut OcsvParser) {
    catch((), || {
        if !parser.is_null() {
            unsafe {
                drop(Box::from_raw(parser));
            }
        }
    })
}

#[no_mangle]
pub extern "C" fn ocsv_parser_clear(parser: *mut OcsvParser) -> c_int {
    catch(-1, || unsafe {
        match handle(parser) {
            Some(p) => {
                p.inner.clear();
                p.last_error_info = None;
                p.last_error_message = None;
                p.field_cache.clear();
                0
            }
            None => -1,
        }
    })
}

macro_rules! byte_setter {
    ($name:ident, $field:ident) => {
        #[no_mangle]
        pub extern "C" fn $name(parser: *mut OcsvParser, value: u8) -> c_int {
            catch(-1, || unsafe {
                match handle(parser) {
                    Some(p) => {
                        let mut config = *p.inner.config();
                        config.$field = value;
                        match p.inner.set_config(config) {
                            Ok(()) => 0,
                            Err(_) => -1,
                        }
                    }
                    None => -1,
                }
            })
        }
    };
}

byte_setter!(ocsv_set_delimiter, delimiter);
byte_setter!(ocsv_set_quote, quote);
byte_setter!(ocsv_set_escape, escape);
byte_setter!(ocsv_set_comment, comment);

macro_rules! bool_setter {
    ($name:ident, $field:ident) => {
        #[no_mangle]
        pub extern "C" fn $name(parser: *mut OcsvParser, value: c_int) -> c_int {
            catch(-1, || unsafe {
                match handle(parser) {
                    Some(p) => {
                        let mut config = *p.inner.config();
                        config.$field = value != 0;
                        match p.inner.set_config(config) {
                            Ok(()) => 0,
                            Err(_) => -1,
                        }
                    }
                    None => -1,
                }
            })
        }
    };
}

bool_setter!(ocsv_set_skip_empty_lines, skip_empty_lines);
bool_setter!(ocsv_set_trim, trim);
bool_setter!(ocsv_set_relaxed, relaxed);
bool_setter!(ocsv_set_skip_lines_with_error, skip_lines_with_error);

#[no_mangle]
pub extern "C" fn ocsv_set_max_row_size(parser: *mut OcsvParser, value: usize) -> c_int {
    catch(-1, || unsafe {
        match handle(parser) {
            Some(p) => {
                let mut config = *p.inner.config();
                config.max_row_size = value;
                match p.inner.set_config(config) {
                    Ok(()) => 0,
                    Err(_) => -1,
                }
            }
            None => -1,
        }
    })
}

#[no_mangle]
pub extern "C" fn ocsv_set_line_window(parser: *mut OcsvParser, from_line: i64, to_line: i64) -> c_int {
    catch(-1, || unsafe {
        match handle(parser) {
            Some(p) => {
                let mut config = *p.inner.config();
                config.from_line = from_line;
                config.to_line = to_line;
                match p.inner.set_config(config) {
                    Ok(()) => 0,
                    Err(_) => -1,
                }
            }
            None => -1,
        }
    })
}

/// Parse a complete buffer. Returns 0 on success, -1 on a null handle, 1 on
/// a parse error recorded in the last-error getters.
#[no_mangle]
pub extern "C" fn ocsv_parse(parser: *mut OcsvParser, data: *const u8, len: usize) -> c_int {
    catch(-1, || unsafe {
        let p = match handle(parser) {
            Some(p) => p,
            None => return -1,
        };
        if data.is_null() && len != 0 {
            return -1;
        }
        let slice = if len == 0 {
            &[]
        } else {
            std::slice::from_raw_parts(data, len)
        };

        if p.inner.config().skip_lines_with_error {
            let config = *p.inner.config();
            return match crate::recovery::parse_with_recovery(
                config,
                crate::recovery::RecoveryPolicy::SkipRow,
                slice,
            ) {
                Ok(outcome) => {
                    p.inner.clear();
                    for row in outcome.rows {
                        p.inner.push_row(row);
                    }
                    if let Some(warning) = outcome.warnings.into_iter().next() {
                        p.last_error_message = CString::new(warning.format()).ok();
                        p.last_error_info = Some(warning);
                    }
                    p.rebuild_field_cache();
                    0
                }
                Err(err) => {
                    p.record_error(&err, slice);
                    p.rebuild_field_cache();
                    1
                }
            };
        }

        match p.inner.parse(slice) {
            Ok(()) => {
                p.rebuild_field_cache();
                0
            }
            Err(err) => {
                p.record_error(&err, slice);
                p.rebuild_field_cache();
                1
            }
        }
    })
}

#[no_mangle]
pub extern "C" fn ocsv_row_count(parser: *const OcsvParser) -> i64 {
    catch(-1, || unsafe {
        if parser.is_null() {
            return -1;
        }
        (*parser).inner.rows().len() as i64
    })
}

#[no_mangle]
pub extern "C" fn ocsv_row_field_count(parser: *const OcsvParser, row: i64) -> i64 {
    catch(-1, || unsafe {
        if parser.is_null() || row < 0 {
            return -1;
        }
        match (*parser).inner.rows().get(row as usize) {
            Some(r) => r.len() as i64,
            None => -1,
        }
    })
}

/// Returns a null-terminated UTF-8 pointer valid until the next
/// `ocsv_parse`/`ocsv_parser_clear`/`ocsv_parser_destroy` call, or null if
/// the indices are out of range.
#[no_mangle]
pub extern "C" fn ocsv_get_field(parser: *const OcsvParser, row: i64, field: i64) -> *const c_char {
    catch(ptr::null(), || unsafe {
        if parser.is_null() || row < 0 || field < 0 {
            return ptr::null();
        }
        match (*parser).field_cache.get(row as usize) {
            Some(r) => match r.get(field as usize) {
                Some(s) => s.as_ptr(),
                None => ptr::null(),
            },
            None => ptr::null(),
        }
    })
}

#[no_mangle]
pub extern "C" fn ocsv_last_error_kind(parser: *const OcsvParser) -> c_int {
    catch(-1, || unsafe {
        if parser.is_null() {
            return -1;
        }
        match &(*parser).last_error_info {
            Some(info) => info.kind.as_ffi_code(),
            None => 0,
        }
    })
}

#[no_mangle]
pub extern "C" fn ocsv_last_error_line(parser: *const OcsvParser) -> i64 {
    catch(-1, || unsafe {
        if parser.is_null() {
            return -1;
        }
        (*parser)
            .last_error_info
            .as_ref()
            .map(|i| i.line)
            .unwrap_or(0)
    })
}

#[no_mangle]
pub extern "C" fn ocsv_last_error_column(parser: *const OcsvParser) -> i64 {
    catch(-1, || unsafe {
        if parser.is_null() {
            return -1;
        }
        (*parser)
            .last_error_info
            .as_ref()
            .map(|i| i.column)
            .unwrap_or(0)
    })
}

/// Lifetime matches the parser; null if there is no recorded error.
#[no_mangle]
pub extern "C" fn ocsv_last_error_message(parser: *const OcsvParser) -> *const c_char {
    catch(ptr::null(), || unsafe {
        if parser.is_null() {
            return ptr::null();
        }
        match &(*parser).last_error_message {
            Some(msg) => msg.as_ptr(),
            None => ptr::null(),
        }
    })
}

// --- Streaming surface -----------------------------------------------------

type CRowCallback = extern "C" fn(*const *const c_char, usize, i64, *mut std::os::raw::c_void) -> c_int;
type CErrorCallback = extern "C" fn(c_int, i64, i64, *const c_char, i64, *mut std::os::raw::c_void) -> c_int;
// Argument order: (kind, line, column, message, row_number, user_data).

pub struct OcsvStream {
    inner: StreamingParser,
}

#[no_mangle]
pub extern "C" fn ocsv_stream_open(
    delimiter: u8,
    quote: u8,
) -> *mut OcsvStream {
    catch(ptr::null_mut(), || {
        let config = Config {
            delimiter,
            quote,
            ..Config::default()
        };
        match StreamingParser::new(config) {
            Ok(inner) => Box::into_raw(Box::new(OcsvStream { inner })),
            Err(_) => ptr::null_mut(),
        }
    })
}

#[no_mangle]
pub extern "C" fn ocsv_stream_close(stream: *mut OcsvStream) {
    catch((), || {
        if !stream.is_null() {
            unsafe {
                drop(Box::from_raw(stream));
            }
        }
    })
}

/// Returns 1 if parsing should continue, 0 if a callback requested an early
/// stop, -1 on a null handle or invalid arguments.
#[no_mangle]
pub extern "C" fn ocsv_stream_feed(
    stream: *mut OcsvStream,
    data: *const u8,
    len: usize,
    row_cb: CRowCallback,
    error_cb: CErrorCallback,
    user_data: *mut std::os::raw::c_void,
) -> c_int {
    catch(-1, || unsafe {
        if stream.is_null() || (data.is_null() && len != 0) {
            return -1;
        }
        let slice = if len == 0 {
            &[]
        } else {
            std::slice::from_raw_parts(data, len)
        };
        let s = &mut *stream;
        drive_stream(&mut s.inner, row_cb, error_cb, user_data, |inner, on_row, on_error| {
            inner.feed(slice, on_row, on_error)
        })
    })
}

#[no_mangle]
pub extern "C" fn ocsv_stream_end(
    stream: *mut OcsvStream,
    row_cb: CRowCallback,
    error_cb: CErrorCallback,
    user_data: *mut std::os::raw::c_void,
) -> c_int {
    catch(-1, || unsafe {
        if stream.is_null() {
            return -1;
        }
        let s = &mut *stream;
        drive_stream(&mut s.inner, row_cb, error_cb, user_data, |inner, on_row, on_error| {
            inner.end(on_row, on_error)
        })
    })
}

/// Shared glue between `stream_feed`/`stream_end`: wraps the raw C
/// callbacks as Rust closures that marshal rows/errors into C-representable
/// argument lists for exactly the duration of one driver call.
unsafe fn drive_stream(
    inner: &mut StreamingParser,
    row_cb: CRowCallback,
    error_cb: CErrorCallback,
    user_data: *mut std::os::raw::c_void,
    run: impl FnOnce(
        &mut StreamingParser,
        &mut crate::streaming::RowCallback,
        &mut crate::streaming::ErrorCallback,
    ) -> Result<bool, ParseError>,
) -> c_int {
    let mut on_row = |row: &[String], row_number: i64| -> bool {
        let cstrings: Vec<CString> = row
            .iter()
            .map(|f| CString::new(f.as_str()).unwrap_or_default())
            .collect();
        let ptrs: Vec<*const c_char> = cstrings.iter().map(|c| c.as_ptr()).collect();
        row_cb(ptrs.as_ptr(), ptrs.len(), row_number, user_data) != 0
    };
    let mut on_error = |info: &ErrorInfo, row_number: i64| -> bool {
        let message = CString::new(info.format()).unwrap_or_default();
        error_cb(
            info.kind.as_ffi_code(),
            info.line,
            info.column,
            message.as_ptr(),
            row_number,
            user_data,
        ) != 0
    };
    match run(inner, &mut on_row, &mut on_error) {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(_) => 1,
    }
}
