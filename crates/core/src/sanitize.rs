//! Response Sanitizer
//!
//! Produces the text handed to speech synthesis. The matched marker block is
//! cut out first, then every remaining `[[...]]` token, then any orphaned
//! `[[` or `]]` pair, so the output never carries a delimiter sequence.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static BRACKET_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[[^\[\]]*\]\]").expect("bracket token pattern is valid"));

/// Removes `span` (if given) and all bracket tokens from `raw`, then trims.
///
/// A span that is out of bounds or not on a char boundary is ignored; the
/// generic token pass still runs.
pub fn sanitize(raw: &str, span: Option<Range<usize>>) -> String {
    let mut text = match span {
        Some(span) if raw.get(span.clone()).is_some() => {
            let mut cut = String::with_capacity(raw.len() - span.len());
            cut.push_str(&raw[..span.start]);
            cut.push_str(&raw[span.end..]);
            cut
        }
        _ => raw.to_string(),
    };

    loop {
        let stripped = BRACKET_TOKEN.replace_all(&text, "");
        let stripped = stripped.replace("[[", "").replace("]]", "");
        if stripped == text {
            break;
        }
        text = stripped;
    }

    text.trim().to_string()
}

/// True when `text` still contains a bracket-pair delimiter.
#[cfg(test)]
pub(crate) fn has_delimiters(text: &str) -> bool {
    text.contains("[[") || text.contains("]]")
}
