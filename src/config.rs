//! Value object describing delimiter, quote, comment prefix, bounds, and
//! mode flags.

use crate::error::{ErrorKind, ParseError};

/// Copied per parser; cheap to pass and clone, and independent of any other
/// copy once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub delimiter: u8,
    pub quote: u8,
    /// 0 means "use RFC 4180 doubled-quote escaping". A non-zero value is
    /// reserved for non-RFC escape modes (see `ErrorKind::InvalidEscapeSequence`);
    /// today it only signals `parallel::parse_parallel` to fall back to a
    /// single-threaded parse, since the quote-parity pre-scan can't reason
    /// about an alternate escape byte.
    pub escape: u8,
    /// 0 disables comment handling.
    pub comment: u8,
    pub skip_empty_lines: bool,
    pub trim: bool,
    pub relaxed: bool,
    pub skip_lines_with_error: bool,
    /// 0 = unlimited.
    pub max_row_size: usize,
    pub from_line: i64,
    /// -1 = EOF.
    pub to_line: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            delimiter: b',',
            quote: b'"',
            escape: 0,
            comment: 0,
            skip_empty_lines: false,
            trim: false,
            relaxed: false,
            skip_lines_with_error: false,
            max_row_size: 0,
            from_line: 1,
            to_line: -1,
        }
    }
}

impl Config {
    /// Reject a configuration whose bytes conflict with each other before
    /// parsing begins.
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.delimiter == self.quote {
            return Err(ParseError::config(ErrorKind::InvalidEscapeSequence));
        }
        if self.delimiter == b'\n' || self.delimiter == b'\r' {
            return Err(ParseError::config(ErrorKind::InvalidEscapeSequence));
        }
        if !self.delimiter.is_ascii() || !self.quote.is_ascii() {
            return Err(ParseError::config(ErrorKind::InvalidEscapeSequence));
        }
        if self.comment != 0 {
            if self.comment == self.delimiter || self.comment == self.quote {
                return Err(ParseError::config(ErrorKind::InvalidEscapeSequence));
            }
            if !self.comment.is_ascii() {
                return Err(ParseError::config(ErrorKind::InvalidEscapeSequence));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn delimiter_equal_to_quote_is_rejected() {
        let cfg = Config {
            delimiter: b'"',
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn delimiter_of_newline_is_rejected() {
        let cfg = Config {
            delimiter: b'\n',
            ..Config::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = Config {
            delimiter: b'\r',
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn comment_equal_to_delimiter_or_quote_is_rejected() {
        let cfg = Config {
            comment: b',',
            ..Config::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = Config {
            comment: b'"',
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn comment_disabled_by_default() {
        assert_eq!(Config::default().comment, 0);
    }
}
