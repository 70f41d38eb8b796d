//! Safe-boundary scanning shared by the recovery driver (skip to the next
//! row) and the parallel driver (split the input into independent chunks).
//!
//! A "safe" newline is one a lightweight quote-parity pre-scan confirms is
//! not inside a quoted field: starting from a position already known to be
//! outside quotes (a row boundary), count quote bytes as they're seen and
//! treat a newline as safe only while that count is even.

use crate::core::simd;

/// First `\n` at or after `start` that a quote-parity scan from `start`
/// confirms lies outside a quoted field. `start` itself must already be
/// outside a quoted field (e.g. the beginning of the input or just after a
/// previously confirmed safe newline).
pub fn find_safe_newline(data: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut pos = start;
    let mut in_quotes = false;
    loop {
        let next_quote = simd::find_quote(data, quote, pos);
        let next_lf = simd::find_byte(data, b'\n', pos);

        if next_lf < 0 {
            return None;
        }
        let next_lf = next_lf as usize;

        match next_quote {
            q if q >= 0 && (q as usize) < next_lf => {
                in_quotes = !in_quotes;
                pos = q as usize + 1;
            }
            _ => {
                if in_quotes {
                    // The newline itself is inside an open quoted field;
                    // it cannot be a safe split. Keep scanning past it.
                    pos = next_lf + 1;
                } else {
                    return Some(next_lf);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_unquoted_newline() {
        let data = b"a,b\nc,d\n";
        assert_eq!(find_safe_newline(data, 0, b'"'), Some(3));
    }

    #[test]
    fn skips_newlines_embedded_in_quoted_fields() {
        let data = b"\"a\nb\",c\nd,e\n";
        assert_eq!(find_safe_newline(data, 0, b'"'), Some(7));
    }

    #[test]
    fn returns_none_when_no_unquoted_newline_remains() {
        let data = b"\"unterminated with a \n newline inside\"";
        assert_eq!(find_safe_newline(data, 0, b'"'), None);
    }

    #[test]
    fn resumes_scanning_from_a_nonzero_start() {
        let data = b"a,b\nc,d\ne,f\n";
        let first = find_safe_newline(data, 0, b'"').unwrap();
        let second = find_safe_newline(data, first + 1, b'"').unwrap();
        assert_eq!(second, 7);
    }
}
