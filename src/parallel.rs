//! Parallel driver: splits a complete input at safe row boundaries, parses
//! each chunk with an independent state machine on a rayon thread, then
//! concatenates the resulting rows in original order.

use rayon::prelude::*;

use crate::config::Config;
use crate::core::machine::Parser;
use crate::error::ParseError;
use crate::split::find_safe_newline;

/// Below this input size, parallelizing costs more than it saves; the
/// driver delegates to a single `Parser` instead.
pub const DEFAULT_THRESHOLD_BYTES: usize = 10 * 1024 * 1024;

/// `0` means "auto": `min(hardware_threads, max(cpu/2, 4), 8)`.
pub fn recommended_threads(requested: usize) -> usize {
    if requested != 0 {
        return requested;
    }
    let hw = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    hw.min(4.max(hw / 2)).min(8).max(1)
}

/// Parse `input` with up to `threads` workers (`0` = auto), falling back to
/// a single `Parser` below `threshold_bytes` or when the configuration
/// makes safe splitting ambiguous (a non-default `escape` byte implies a
/// non-RFC escaping mode the quote-parity pre-scan cannot reason about).
pub fn parse_parallel(
    config: Config,
    input: &[u8],
    threads: usize,
    threshold_bytes: usize,
) -> Result<Vec<Vec<String>>, ParseError> {
    config.validate()?;

    if input.len() < threshold_bytes || config.escape != 0 {
        log::debug!(
            "parallel driver: falling back to single-threaded ({} bytes, threshold {}, escape={})",
            input.len(),
            threshold_bytes,
            config.escape,
        );
        let mut parser = Parser::new(config)?;
        parser.parse(input)?;
        return Ok(parser.into_rows());
    }

    let chunk_count = recommended_threads(threads).max(1);
    let boundaries = split_boundaries(input, config.quote, chunk_count);
    log::debug!(
        "parallel driver: splitting {} bytes into {} chunks at boundaries {:?}",
        input.len(),
        boundaries.len().saturating_sub(1),
        boundaries,
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(chunk_count)
        .build()
        .map_err(|_| ParseError::config(crate::error::ErrorKind::MemoryAllocationFailed))?;

    let results: Vec<Result<Vec<Vec<String>>, ParseError>> = pool.install(|| {
        boundaries
            .par_windows(2)
            .map(|w| {
                let (start, end) = (w[0], w[1]);
                let mut parser = Parser::new(config)?;
                parser.parse(&input[start..end])?;
                Ok(parser.into_rows())
            })
            .collect()
    });

    let mut merged = Vec::new();
    for result in results {
        merged.extend(result?);
    }
    Ok(merged)
}

/// Target `chunk_count` roughly-equal-sized byte ranges, each boundary
/// adjusted forward to the next safe (not-inside-a-quote) newline. Returns
/// `chunk_count + 1` offsets: `[0, b1, b2, ..., input.len()]`.
fn split_boundaries(input: &[u8], quote: u8, chunk_count: usize) -> Vec<usize> {
    let mut boundaries = vec![0usize];
    let target_size = (input.len() / chunk_count).max(1);
    let mut cursor = 0usize;

    while boundaries.len() < chunk_count {
        let target = cursor + target_size;
        if target >= input.len() {
            break;
        }
        match find_safe_newline(input, target, quote) {
            Some(pos) if pos + 1 < input.len() => {
                boundaries.push(pos + 1);
                cursor = pos + 1;
            }
            _ => break,
        }
    }
    boundaries.push(input.len());
    boundaries
}
