//! Recovery policies wrapping the state machine core: fail-fast, skip-row,
//! best-effort, and collect-all-errors.

use crate::config::Config;
use crate::core::machine::Parser;
use crate::error::{ErrorInfo, ParseError};
use crate::split::find_safe_newline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPolicy {
    FailFast,
    SkipRow,
    BestEffort,
    CollectAllErrors { max_errors: usize },
}

/// Rows plus any warnings accumulated by a non-fail-fast policy. On
/// `FailFast`, a parse error is returned directly rather than appearing
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecoveryOutcome {
    pub rows: Vec<Vec<String>>,
    pub warnings: Vec<ErrorInfo>,
}

/// Parse `input` under `policy`, draining ownership of the input's rows
/// into the returned outcome (or the error, for `FailFast`).
pub fn parse_with_recovery(
    config: Config,
    policy: RecoveryPolicy,
    input: &[u8],
) -> Result<RecoveryOutcome, ParseError> {
    let mut parser = Parser::new(config)?;

    if policy == RecoveryPolicy::FailFast {
        parser.parse(input)?;
        return Ok(RecoveryOutcome {
            rows: parser.into_rows(),
            warnings: Vec::new(),
        });
    }

    let max_errors = match policy {
        RecoveryPolicy::CollectAllErrors { max_errors } => max_errors,
        _ => usize::MAX,
    };

    let mut cursor = 0usize;
    let mut warnings = Vec::new();

    loop {
        match parser.process(&input[cursor..]) {
            Ok(()) => break,
            Err(err) => {
                let preview = if policy == RecoveryPolicy::BestEffort {
                    Some(parser.partial_row_preview())
                } else {
                    None
                };

                if warnings.len() < max_errors {
                    let mut info = ErrorInfo::from_parse_error(&err, input);
                    if let Some(preview) = preview {
                        if !preview.is_empty() {
                            info.context = format!("{} (partial row: {preview})", info.context);
                        }
                    }
                    warnings.push(info);
                }

                match find_safe_newline(input, err.offset, parser.config().quote) {
                    Some(newline_pos) => {
                        cursor = newline_pos + 1;
                        parser.resume_at(cursor);
                    }
                    None => {
                        cursor = input.len();
                        parser.resume_at(cursor);
                        break;
                    }
                }
            }
        }
    }

    if let Err(err) = parser.finish() {
        if warnings.len() < max_errors {
            warnings.push(ErrorInfo::from_parse_error(&err, input));
        }
    }

    Ok(RecoveryOutcome {
        rows: parser.into_rows(),
        warnings,
    })
}
