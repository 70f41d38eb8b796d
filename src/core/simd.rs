//! Byte primitives: "find first of set" searches over a byte slice,
//! SIMD-accelerated with a scalar fallback that is the correctness
//! reference every SIMD result must agree with.
//!
//! `std::simd`, vector-compare-then-bitmask-reduce, 16-byte lanes. Total
//! functions the state machine's `InField`/`InQuotedField` fast paths call
//! to skip a run of uninteresting bytes, returning `-1` when nothing in the
//! needle set occurs before the end of the buffer.

use std::simd::prelude::*;

/// Baseline SIMD lane width (128-bit).
const LANES: usize = 16;

/// First occurrence of `needle` at or after `start`, or `-1`.
#[inline]
pub fn find_byte(data: &[u8], needle: u8, start: usize) -> i64 {
    find_any_of(data, &[needle], start).0
}

/// First occurrence of any of `{a, b, c}` at or after `start`, and which one
/// matched. Returns `(-1, 0)` if none match.
#[inline]
pub fn find_any_of_3(data: &[u8], a: u8, b: u8, c: u8, start: usize) -> (i64, u8) {
    find_any_of(data, &[a, b, c], start)
}

/// Convenience specialization used by `InQuotedField`'s fast-path, which
/// only ever looks for the quote byte.
#[inline]
pub fn find_quote(data: &[u8], quote: u8, start: usize) -> i64 {
    find_any_of(data, &[quote], start).0
}

/// SIMD lanes over 16-byte-aligned chunks, scalar prologue and tail.
/// `needles` holds 1-3 interesting bytes (the state machine's fast paths
/// never need more: delimiter+LF+CR for `InField`, quote alone for
/// `InQuotedField`).
#[inline]
fn find_any_of(data: &[u8], needles: &[u8], start: usize) -> (i64, u8) {
    debug_assert!(!needles.is_empty() && needles.len() <= 3);
    if start >= data.len() {
        return (-1, 0);
    }

    let mut pos = start;

    // Scalar prologue up to 16-byte alignment of the slice start, so the
    // SIMD loop below always loads from an in-bounds, full-width chunk.
    let aligned_start = (pos + (LANES - 1)) / LANES * LANES;
    let prologue_end = aligned_start.min(data.len());
    if let Some(hit) = scalar_scan(data, needles, pos, prologue_end) {
        return hit;
    }
    pos = prologue_end;

    let splats: Vec<Simd<u8, LANES>> = needles.iter().map(|&n| Simd::splat(n)).collect();

    while pos + LANES <= data.len() {
        let chunk = Simd::<u8, LANES>::from_slice(&data[pos..pos + LANES]);
        let mut mask = 0u64;
        for splat in &splats {
            mask |= chunk.simd_eq(*splat).to_bitmask();
        }
        if mask != 0 {
            let bit = mask.trailing_zeros() as usize;
            let abs = pos + bit;
            return (abs as i64, data[abs]);
        }
        pos += LANES;
    }

    // Scalar tail shorter than one lane.
    if let Some(hit) = scalar_scan(data, needles, pos, data.len()) {
        return hit;
    }

    (-1, 0)
}

/// Scalar fallback, authoritative on architectures without vector support
/// and used for the sub-lane prologue/tail everywhere else.
#[inline]
fn scalar_scan(data: &[u8], needles: &[u8], start: usize, end: usize) -> Option<(i64, u8)> {
    for (i, &byte) in data[start..end].iter().enumerate() {
        if needles.contains(&byte) {
            return Some(((start + i) as i64, byte));
        }
    }
    None
}
