//! Error model: the internal [`ParseError`] Rust-facing error type and the
//! FFI-facing [`ErrorInfo`] value object.

use thiserror::Error;

/// Result alias used throughout the crate's Rust-facing API.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Exhaustive error taxonomy. Not every variant can be raised by the state
/// machine itself — some exist only so the core exposes a taxonomy that
/// external collaborators (host I/O, schema validation) reuse.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Host-side only; the core never raises this, but hosts reuse the kind.
    #[error("file not found")]
    FileNotFound,
    /// Reserved; the core does not validate UTF-8.
    #[error("invalid UTF-8")]
    InvalidUtf8,
    /// EOF reached while inside a quoted field.
    #[error("unterminated quote")]
    UnterminatedQuote,
    /// A byte other than quote/delimiter/LF/CR followed a closing quote and
    /// `relaxed == false`.
    #[error("invalid character after closing quote")]
    InvalidCharacterAfterQuote,
    /// Accumulated row bytes exceeded `Config::max_row_size`.
    #[error("row size exceeded the configured maximum")]
    MaxRowSizeExceeded,
    /// A single field exceeded a configured field-size bound.
    #[error("field size exceeded the configured maximum")]
    MaxFieldSizeExceeded,
    /// Reported by an external validator, not by the state machine proper.
    #[error("inconsistent column count")]
    InconsistentColumnCount,
    /// Reserved for non-RFC escape modes.
    #[error("invalid escape sequence")]
    InvalidEscapeSequence,
    /// Zero-length input where the caller required at least one row.
    #[error("empty input")]
    EmptyInput,
    /// Underlying allocator failure.
    #[error("memory allocation failed")]
    MemoryAllocationFailed,
}

impl ErrorKind {
    /// Stable small integer used by the FFI surface (`ocsv_error_kind`).
    pub fn as_ffi_code(self) -> i32 {
        match self {
            ErrorKind::FileNotFound => 1,
            ErrorKind::InvalidUtf8 => 2,
            ErrorKind::UnterminatedQuote => 3,
            ErrorKind::InvalidCharacterAfterQuote => 4,
            ErrorKind::MaxRowSizeExceeded => 5,
            ErrorKind::MaxFieldSizeExceeded => 6,
            ErrorKind::InconsistentColumnCount => 7,
            ErrorKind::InvalidEscapeSequence => 8,
            ErrorKind::EmptyInput => 9,
            ErrorKind::MemoryAllocationFailed => 10,
        }
    }
}

/// Rust-facing error, returned by `Parser::parse` and the drivers. Carries
/// enough to construct an [`ErrorInfo`] without re-scanning the input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} at line {line}, column {column}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub line: i64,
    pub column: i64,
    /// Byte offset into the input that triggered the failure; the context
    /// snippet and column are rendered lazily from it at read time.
    pub offset: usize,
}

impl ParseError {
    pub fn new(kind: ErrorKind, line: i64, column: i64, offset: usize) -> Self {
        ParseError {
            kind,
            line,
            column,
            offset,
        }
    }

    /// Invalid configuration detected by `Config::validate` — reported at
    /// line/column 0 since it precedes any parse.
    pub fn config(kind: ErrorKind) -> Self {
        ParseError::new(kind, 0, 0, 0)
    }
}

/// Length of the context snippet window on each side of a fault offset.
const CONTEXT_WINDOW: usize = 20;
const CONTEXT_MARKER: &str = "<-- HERE -->";

/// Owned error payload exposed across the FFI boundary and from
/// `Parser::last_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub line: i64,
    pub column: i64,
    pub message: String,
    pub context: String,
}

impl ErrorInfo {
    /// Build an `ErrorInfo` from a `ParseError` and the input it occurred in,
    /// rendering the `<-- HERE -->` context snippet lazily at read time.
    pub fn from_parse_error(err: &ParseError, input: &[u8]) -> Self {
        ErrorInfo {
            kind: err.kind,
            line: err.line,
            column: err.column,
            message: err.kind.to_string(),
            context: render_context(input, err.offset),
        }
    }

    /// An `ErrorInfo` with no fault offset — used for config-time errors.
    pub fn from_kind(kind: ErrorKind) -> Self {
        ErrorInfo {
            kind,
            line: 0,
            column: 0,
            message: kind.to_string(),
            context: String::new(),
        }
    }

    /// Render `kind, line:column, context` as a single user-reportable line.
    pub fn format(&self) -> String {
        if self.context.is_empty() {
            format!("{} at line {}, column {}", self.message, self.line, self.column)
        } else {
            format!(
                "{} at line {}, column {}: {}",
                self.message, self.line, self.column, self.context
            )
        }
    }
}

impl Default for ErrorInfo {
    fn default() -> Self {
        ErrorInfo {
            kind: ErrorKind::EmptyInput,
            line: 0,
            column: 0,
            message: String::new(),
            context: String::new(),
        }
    }
}

/// Render a `<= 20`-byte-on-each-side window around `offset`, inserting the
/// literal `<-- HERE -->` marker at the fault position. Bytes outside valid
/// UTF-8 are replaced lossily since the context is for diagnostics only —
/// the engine itself never interprets field content as UTF-8.
fn render_context(input: &[u8], offset: usize) -> String {
    if input.is_empty() {
        return String::new();
    }
    let offset = offset.min(input.len());
    let start = offset.saturating_sub(CONTEXT_WINDOW);
    let end = (offset + CONTEXT_WINDOW).min(input.len());

    let before = String::from_utf8_lossy(&input[start..offset]);
    let after = String::from_utf8_lossy(&input[offset..end]);
    format!("{before}{CONTEXT_MARKER}{after}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_marker_is_inserted_at_offset() {
        let input = b"a,b,c\n1,2,3\n";
        let ctx = render_context(input, 6);
        assert!(ctx.contains(CONTEXT_MARKER));
        assert_eq!(ctx, format!("a,b,c\n{CONTEXT_MARKER}1,2,3\n"));
    }

    #[test]
    fn context_on_empty_input_is_empty() {
        assert_eq!(render_context(b"", 0), "");
    }

    #[test]
    fn context_window_is_clamped_at_bounds() {
        let input = b"xy";
        let ctx = render_context(input, 1);
        assert_eq!(ctx, format!("x{CONTEXT_MARKER}y"));
    }

    #[test]
    fn error_kind_ffi_codes_are_stable() {
        assert_eq!(ErrorKind::FileNotFound.as_ffi_code(), 1);
        assert_eq!(ErrorKind::MemoryAllocationFailed.as_ffi_code(), 10);
    }

    #[test]
    fn error_info_format_includes_kind_and_position() {
        let err = ParseError::new(ErrorKind::UnterminatedQuote, 3, 5, 10);
        let info = ErrorInfo::from_parse_error(&err, b"a,\"unterminated");
        let formatted = info.format();
        assert!(formatted.contains("unterminated quote"));
        assert!(formatted.contains("line 3"));
        assert!(formatted.contains("column 5"));
    }

    #[test]
    fn host_side_only_kinds_construct_without_a_parse_offset() {
        // FileNotFound never comes from the state machine itself — the core
        // exposes the kind so a host's own file-open failure can be reported
        // through the same `ErrorInfo` shape as a parse-time error.
        let info = ErrorInfo::from_kind(ErrorKind::FileNotFound);
        assert_eq!(info.kind, ErrorKind::FileNotFound);
        assert_eq!(info.line, 0);
        assert_eq!(info.context, "");
    }

    #[test]
    fn default_error_info_is_the_empty_input_placeholder() {
        let info = ErrorInfo::default();
        assert_eq!(info.kind, ErrorKind::EmptyInput);
        assert_eq!(info.line, 0);
    }
}
