#![feature(portable_simd)]
//! High-throughput RFC 4180 CSV parsing engine: a byte-driven state machine
//! accelerated by a character-classification table and SIMD byte search,
//! with recovery, streaming, and parallel drivers layered on top, and a C
//! ABI for embedding in host runtimes.
//!
//! No panics escape production code paths; fallible operations return
//! `Result` and the FFI surface additionally catches unwinds at the
//! boundary.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod config;
pub mod core;
pub mod error;
pub mod ffi;
pub mod parallel;
pub mod recovery;
pub mod split;
pub mod streaming;

pub use config::Config;
pub use core::machine::Parser;
pub use error::{ErrorInfo, ErrorKind, ParseError};
pub use parallel::{parse_parallel, DEFAULT_THRESHOLD_BYTES};
pub use recovery::{parse_with_recovery, RecoveryOutcome, RecoveryPolicy};
pub use streaming::StreamingParser;

/// Parse a complete, in-memory input. `config.skip_lines_with_error` picks
/// the driver: unset, the thinnest possible `FailFast` entry point; set, the
/// recovery driver's `SkipRow` policy, so a caller that never constructs a
/// `RecoveryPolicy` directly still gets row-skipping behavior from `Config`
/// alone.
pub fn parse(config: Config, input: &[u8]) -> Result<Vec<Vec<String>>, ParseError> {
    if config.skip_lines_with_error {
        let outcome = recovery::parse_with_recovery(config, RecoveryPolicy::SkipRow, input)?;
        return Ok(outcome.rows);
    }
    let mut parser = Parser::new(config)?;
    parser.parse(input)?;
    Ok(parser.into_rows())
}
