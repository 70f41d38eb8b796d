//! Field extraction and quote handling: trimming unquoted fields.
//!
//! The state machine (`core::machine`) appends directly to `field_buffer`
//! byte-by-byte, or via the SIMD bulk-copy fast path, rather than slicing
//! the original input — each parser owns materialized `String` fields
//! rather than borrowing from the input buffer. Doubled-quote unescaping
//! happens inline in `machine::Parser::step_quote_in_quote`, one byte at a
//! time as the state machine already walks the buffer; there is no
//! separate post-hoc unescape pass.

/// Trim ASCII whitespace from both ends. Applied only to unquoted fields —
/// see DESIGN.md for the reasoning.
#[inline]
pub fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|b| !b.is_ascii_whitespace()) {
        None => &[],
        Some(start) => {
            // A non-whitespace byte exists (just found at `start`), so
            // `rposition` with the same predicate is guaranteed `Some`.
            let end = bytes
                .iter()
                .rposition(|b| !b.is_ascii_whitespace())
                .unwrap_or(start);
            &bytes[start..=end]
        }
    }
}
