//! Regions of a document that must never be read as note markup.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::codec::spans::{spans_of, spans_of_group, SpanSet};

// The guard group in front of the inline patterns stands in for a "not preceded by" check, so the
// protected region is capture group 1.
static INLINE_MATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(?:^|[^$])(\$[^\s$](?:.*?\S)?\$)").expect("inline math pattern is valid")
});
static DISPLAY_MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\$\$.*?\$\$").expect("display math pattern is valid"));
static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(?:^|[^`])(`[^`].*?`)").expect("inline code pattern is valid"));
static DISPLAY_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("display code pattern is valid"));

/// Seeds the ignore set for `text`: existing inline notes, inline and display math, inline and
/// display code. Members may overlap.
pub fn initial_ignore_spans(text: &str, inline_note: &Regex) -> SpanSet {
    let mut spans = SpanSet::new();
    spans.extend(spans_of(inline_note, text));
    spans.extend(spans_of_group(&INLINE_MATH, text, 1));
    spans.extend(spans_of(&DISPLAY_MATH, text));
    spans.extend(spans_of_group(&INLINE_CODE, text, 1));
    spans.extend(spans_of(&DISPLAY_CODE, text));
    tracing::debug!("Seeded {} ignore spans", spans.len());
    spans
}
