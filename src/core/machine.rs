//! Byte-driven RFC 4180 state machine: the parser core every driver
//! (single-shot, recovery, streaming, parallel) ultimately runs.
//!
//! One `Parser` processes a complete input or a sequence of chunks fed to
//! `process`, followed by `finish` to flush whatever is pending at
//! end-of-input. All four states (`FieldStart`, `InField`, `InQuotedField`,
//! `QuoteInQuote`) are represented; `InField`/`InQuotedField` use the byte
//! primitives to bulk-copy runs of uninteresting bytes instead of appending
//! one byte at a time.

use crate::config::Config;
use crate::core::field;
use crate::core::simd;
use crate::core::table::{ByteClass, CharTable};
use crate::error::{ErrorKind, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    InField,
    InQuotedField,
    QuoteInQuote,
}

/// Owns every field and row it has materialized; destroyed or `clear`ed
/// explicitly by the caller.
pub struct Parser {
    config: Config,
    table: CharTable,
    state: State,
    field_buffer: Vec<u8>,
    field_was_quoted: bool,
    current_row: Vec<String>,
    rows: Vec<Vec<String>>,
    line_number: i64,
    line_start_offset: usize,
    base_offset: usize,
    last_error: Option<ParseError>,
    error_count: usize,
    halted: bool,
    skipping_comment: bool,
    /// Set when a CR in `InField`/`QuoteInQuote` has already emitted the
    /// pending field; a following `LF` must close the row without emitting
    /// a second, spurious empty field. A following non-`LF` byte (or
    /// end-of-input) means the CR itself was the row terminator.
    cr_pending_row_close: bool,
}

impl Parser {
    pub fn new(config: Config) -> Result<Self, ParseError> {
        config.validate()?;
        let table = CharTable::build(&config);
        log::debug!(
            "parser created: delimiter={:?} quote={:?} relaxed={} comment={:?}",
            config.delimiter as char,
            config.quote as char,
            config.relaxed,
            if config.comment == 0 { None } else { Some(config.comment as char) },
        );
        Ok(Parser {
            config,
            table,
            state: State::FieldStart,
            field_buffer: Vec::with_capacity(1024),
            field_was_quoted: false,
            current_row: Vec::new(),
            rows: Vec::new(),
            line_number: 1,
            line_start_offset: 0,
            base_offset: 0,
            last_error: None,
            error_count: 0,
            halted: false,
            skipping_comment: false,
            cr_pending_row_close: false,
        })
    }

    /// Reset to a freshly-constructed state, releasing every owned field
    /// and row, without reallocating the parser itself.
    pub fn clear(&mut self) {
        self.state = State::FieldStart;
        self.field_buffer.clear();
        self.field_was_quoted = false;
        self.current_row.clear();
        self.rows.clear();
        self.line_number = 1;
        self.line_start_offset = 0;
        self.base_offset = 0;
        self.last_error = None;
        self.error_count = 0;
        self.halted = false;
        self.skipping_comment = false;
        self.cr_pending_row_close = false;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) -> Result<(), ParseError> {
        config.validate()?;
        self.table = CharTable::build(&config);
        self.config = config;
        Ok(())
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    /// Remove and return the row at `index`, used by the streaming driver
    /// to hand rows to its callback without waiting for the whole parse to
    /// finish.
    pub(crate) fn take_row(&mut self, index: usize) -> Vec<String> {
        self.rows.remove(index)
    }

    /// Append an already-materialized row, used by callers (the FFI
    /// surface's `skip_lines_with_error` path) that ran a different driver
    /// and want the result reflected in this handle's own `rows` for the
    /// accessors to read.
    pub(crate) fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn last_error(&self) -> Option<&ParseError> {
        self.last_error.as_ref()
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn line_number(&self) -> i64 {
        self.line_number
    }

    pub(crate) fn is_mid_quoted_field(&self) -> bool {
        matches!(self.state, State::InQuotedField | State::QuoteInQuote)
    }

    /// Parse a complete, self-contained input: `process` then `finish`.
    pub fn parse(&mut self, data: &[u8]) -> Result<(), ParseError> {
        self.process(data)?;
        self.finish()
    }

    /// Reset transient per-row state without losing already-emitted rows,
    /// used by the recovery driver to discard a partially built row.
    pub(crate) fn reset_row_state(&mut self) {
        self.state = State::FieldStart;
        self.field_buffer.clear();
        self.field_was_quoted = false;
        self.current_row.clear();
        self.cr_pending_row_close = false;
        self.skipping_comment = false;
    }

    /// Discard the row in progress and resume as if `offset` were the start
    /// of a fresh input, used by the recovery driver after skipping past a
    /// broken row to the next safe newline.
    pub(crate) fn resume_at(&mut self, offset: usize) {
        log::trace!("recovery: resuming scan at offset {offset}, line {}", self.line_number + 1);
        self.reset_row_state();
        self.base_offset = offset;
        self.line_start_offset = offset;
        self.line_number += 1;
    }

    /// Best-effort textual preview of the row currently under construction,
    /// joining already-emitted fields and the pending field buffer with the
    /// configured delimiter. Used by recovery policies that preserve a
    /// discarded row's decoded prefix as a warning.
    pub(crate) fn partial_row_preview(&self) -> String {
        let mut parts: Vec<String> = self.current_row.clone();
        if !self.field_buffer.is_empty() {
            parts.push(String::from_utf8_lossy(&self.field_buffer).into_owned());
        }
        parts.join(&(self.config.delimiter as char).to_string())
    }

    /// Process one chunk of input, carrying state across calls. Does not
    /// flush a pending field/row at the end of `data` — call `finish` once
    /// the whole input has been fed.
    pub fn process(&mut self, data: &[u8]) -> Result<(), ParseError> {
        let len = data.len();
        let mut i = 0usize;

        if self.skipping_comment {
            match simd::find_byte(data, b'\n', 0) {
                -1 => {
                    self.base_offset += len;
                    return Ok(());
                }
                pos => {
                    i = pos as usize + 1;
                    self.start_new_line(i);
                    self.skipping_comment = false;
                }
            }
        }

        while i < len && !self.halted {
            let b = data[i];

            if self.config.comment != 0
                && self.state == State::FieldStart
                && self.current_row.is_empty()
                && b == self.config.comment
            {
                log::trace!("skipping comment line at line {}", self.line_number);
                match simd::find_byte(data, b'\n', i) {
                    -1 => {
                        self.skipping_comment = true;
                        self.base_offset += len;
                        return Ok(());
                    }
                    pos => {
                        i = pos as usize + 1;
                        self.start_new_line(i);
                        continue;
                    }
                }
            }

            match self.state {
                State::FieldStart => self.step_field_start(data, &mut i)?,
                State::InField => self.step_in_field(data, &mut i)?,
                State::InQuotedField => self.step_in_quoted_field(data, &mut i)?,
                State::QuoteInQuote => self.step_quote_in_quote(data, &mut i)?,
            }
        }

        self.base_offset += len;
        Ok(())
    }

    fn step_field_start(&mut self, data: &[u8], i: &mut usize) -> Result<(), ParseError> {
        let b = data[*i];
        let cls = self.table.classify(b);

        if self.cr_pending_row_close && cls != ByteClass::Lf {
            // The CR already emitted its field; this byte isn't the LF that
            // would fold into it, so the CR terminated its row on its own.
            self.cr_pending_row_close = false;
            self.emit_row(*i);
        }

        match cls {
            ByteClass::Quote => {
                self.state = State::InQuotedField;
                self.field_was_quoted = true;
                *i += 1;
            }
            ByteClass::Delimiter => {
                self.emit_field(*i)?;
                *i += 1;
            }
            ByteClass::Lf => {
                self.close_row_on_lf(*i)?;
                *i += 1;
            }
            ByteClass::Cr => {
                // Absorbed; resolved by the next byte (see `cr_pending_row_close`).
                *i += 1;
            }
            ByteClass::Normal => {
                self.append_bytes(&data[*i..*i + 1], *i)?;
                self.state = State::InField;
                *i += 1;
            }
        }
        Ok(())
    }

    fn step_in_field(&mut self, data: &[u8], i: &mut usize) -> Result<(), ParseError> {
        let (pos, found) =
            simd::find_any_of_3(data, self.config.delimiter, b'\n', b'\r', *i);
        if pos < 0 {
            self.append_bytes(&data[*i..], *i)?;
            *i = data.len();
            return Ok(());
        }
        let pos = pos as usize;
        self.append_bytes(&data[*i..pos], *i)?;
        *i = pos;

        match self.table.classify(found) {
            ByteClass::Delimiter => {
                self.emit_field(*i)?;
                *i += 1;
            }
            ByteClass::Lf => {
                self.close_row_on_lf(*i)?;
                *i += 1;
            }
            ByteClass::Cr => {
                self.emit_field(*i)?;
                self.cr_pending_row_close = true;
                *i += 1;
            }
            ByteClass::Quote | ByteClass::Normal => unreachable!("needle set is fixed"),
        }
        Ok(())
    }

    fn step_in_quoted_field(&mut self, data: &[u8], i: &mut usize) -> Result<(), ParseError> {
        let pos = simd::find_quote(data, self.config.quote, *i);
        if pos < 0 {
            self.append_bytes(&data[*i..], *i)?;
            *i = data.len();
            return Ok(());
        }
        let pos = pos as usize;
        self.append_bytes(&data[*i..pos], *i)?;
        *i = pos + 1;
        self.state = State::QuoteInQuote;
        Ok(())
    }

    fn step_quote_in_quote(&mut self, data: &[u8], i: &mut usize) -> Result<(), ParseError> {
        let b = data[*i];
        match self.table.classify(b) {
            ByteClass::Quote => {
                self.append_bytes(&[self.config.quote], *i)?;
                self.state = State::InQuotedField;
                *i += 1;
            }
            ByteClass::Delimiter => {
                self.emit_field(*i)?;
                *i += 1;
            }
            ByteClass::Lf => {
                self.close_row_on_lf(*i)?;
                *i += 1;
            }
            ByteClass::Cr => {
                self.emit_field(*i)?;
                self.cr_pending_row_close = true;
                *i += 1;
            }
            ByteClass::Normal => {
                if self.config.relaxed {
                    // Resolve the closing quote as a false alarm: drop it,
                    // keep the stray byte, and fall back to unquoted field
                    // scanning so a following delimiter/newline still ends
                    // the field normally.
                    self.append_bytes(&data[*i..*i + 1], *i)?;
                    self.state = State::InField;
                    *i += 1;
                } else {
                    return Err(self.make_error(ErrorKind::InvalidCharacterAfterQuote, *i));
                }
            }
        }
        Ok(())
    }

    /// Handles the `FieldStart`/`InField`/`QuoteInQuote` `LF` transitions,
    /// which all emit the row — but must not also insert a spurious empty
    /// field if a CR already emitted one moments ago.
    fn close_row_on_lf(&mut self, offset: usize) -> Result<(), ParseError> {
        if self.cr_pending_row_close {
            self.cr_pending_row_close = false;
            self.emit_row(offset + 1);
        } else {
            self.emit_field(offset)?;
            self.emit_row(offset + 1);
        }
        Ok(())
    }

    fn emit_field(&mut self, offset: usize) -> Result<(), ParseError> {
        let raw = std::mem::take(&mut self.field_buffer);
        let raw = if self.config.trim && !self.field_was_quoted {
            field::trim_ascii_whitespace(&raw).to_vec()
        } else {
            raw
        };
        self.field_was_quoted = false;
        self.state = State::FieldStart;
        let _ = offset;
        self.current_row.push(String::from_utf8_lossy(&raw).into_owned());
        Ok(())
    }

    fn emit_row(&mut self, offset: usize) {
        let row_number = self.line_number;
        let row = std::mem::take(&mut self.current_row);
        self.start_new_line(offset);

        if row_number < self.config.from_line {
            return;
        }
        if self.config.to_line != -1 && row_number > self.config.to_line {
            self.halted = true;
            return;
        }
        if self.config.skip_empty_lines && row.len() == 1 && row[0].is_empty() {
            if self.config.to_line != -1 && row_number == self.config.to_line {
                self.halted = true;
            }
            return;
        }
        self.rows.push(row);
        if self.config.to_line != -1 && row_number == self.config.to_line {
            self.halted = true;
        }
    }

    fn start_new_line(&mut self, offset: usize) {
        self.line_number += 1;
        self.line_start_offset = self.base_offset + offset;
    }

    fn append_bytes(&mut self, bytes: &[u8], offset: usize) -> Result<(), ParseError> {
        if self.config.max_row_size > 0 {
            let row_len: usize = self.current_row.iter().map(|f| f.len()).sum();
            let projected = row_len + self.field_buffer.len() + bytes.len();
            if projected > self.config.max_row_size {
                return Err(self.make_error(ErrorKind::MaxRowSizeExceeded, offset));
            }
        }
        self.field_buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn make_error(&mut self, kind: ErrorKind, offset: usize) -> ParseError {
        let abs_offset = self.base_offset + offset;
        let column = (abs_offset.saturating_sub(self.line_start_offset) + 1) as i64;
        let err = ParseError::new(kind, self.line_number, column, abs_offset);
        log::debug!("parse error: {kind:?} at line {}, column {column}", self.line_number);
        self.last_error = Some(err.clone());
        self.error_count += 1;
        err
    }

    /// End-of-input flush: closes whatever row is still open.
    pub fn finish(&mut self) -> Result<(), ParseError> {
        match self.state {
            State::InField | State::QuoteInQuote => {
                self.emit_field(self.field_buffer.len())?;
                self.emit_row(0);
            }
            State::InQuotedField => {
                if self.config.relaxed {
                    self.emit_field(self.field_buffer.len())?;
                    self.emit_row(0);
                } else {
                    return Err(self.make_error(ErrorKind::UnterminatedQuote, 0));
                }
            }
            State::FieldStart => {
                if self.cr_pending_row_close {
                    self.cr_pending_row_close = false;
                    self.emit_row(0);
                } else if !self.current_row.is_empty() {
                    self.emit_field(0)?;
                    self.emit_row(0);
                }
            }
        }
        Ok(())
    }
}
