//! Marker Scanner
//!
//! Finds the first `start .. end` block in a raw completion. The scan is
//! non-greedy: the block closes at the first end token after the leftmost
//! start token, so a second block later in the text is left alone.

use std::ops::Range;

/// A well-formed marker block located in a raw completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch<'a> {
    /// Text between the two tokens, trimmed.
    pub payload: &'a str,
    /// Byte range of the whole block, tokens included.
    pub span: Range<usize>,
}

/// Result of scanning a completion for one marker convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome<'a> {
    /// The start token never appears.
    Absent,
    /// A start token was found at this byte offset but nothing closes it.
    Unclosed { start: usize },
    /// The leftmost start token and the nearest end token after it.
    Found(MarkerMatch<'a>),
}

/// Scans `raw` for the leftmost `start_token .. end_token` block.
pub fn scan<'a>(raw: &'a str, start_token: &str, end_token: &str) -> ScanOutcome<'a> {
    if start_token.is_empty() || end_token.is_empty() {
        return ScanOutcome::Absent;
    }

    let Some(start) = raw.find(start_token) else {
        return ScanOutcome::Absent;
    };
    let body_start = start + start_token.len();

    match raw[body_start..].find(end_token) {
        Some(offset) => {
            let body_end = body_start + offset;
            ScanOutcome::Found(MarkerMatch {
                payload: raw[body_start..body_end].trim(),
                span: start..body_end + end_token.len(),
            })
        }
        None => ScanOutcome::Unclosed { start },
    }
}
