//! Half-open byte ranges over a document and the set of ranges already claimed by a match.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` byte range over document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `other` lies within this span widened by one byte on each side.
    pub fn covers(&self, other: &Span) -> bool {
        other.start >= self.start.saturating_sub(1) && other.end <= self.end + 1
    }

    /// Number of bytes shared with `other`.
    pub fn overlap(&self, other: &Span) -> usize {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        end.saturating_sub(start)
    }
}

impl From<regex::Match<'_>> for Span {
    fn from(m: regex::Match<'_>) -> Self {
        Span::new(m.start(), m.end())
    }
}

/// Spans of every non-overlapping match of `pattern`, left to right.
pub fn spans_of(pattern: &Regex, text: &str) -> Vec<Span> {
    pattern.find_iter(text).map(Span::from).collect()
}

/// Like [`spans_of`], but records the span of capture `group` instead of the whole match.
///
/// Used for patterns that consume a guard character in front of the region they protect.
pub fn spans_of_group(pattern: &Regex, text: &str, group: usize) -> Vec<Span> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(group).map(Span::from))
        .collect()
}

/// Regions of a document that later matches must not claim again.
///
/// Spans are only ever added or rolled back in LIFO order; membership tests use the one-byte
/// tolerance of [`Span::covers`]. Overlapping members are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanSet {
    spans: Vec<Span>,
}

impl SpanSet {
    pub fn new() -> Self {
        SpanSet::default()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn push(&mut self, span: Span) {
        self.spans.push(span);
    }

    /// Removes the most recently claimed span.
    pub fn pop(&mut self) -> Option<Span> {
        self.spans.pop()
    }

    pub fn contains(&self, span: &Span) -> bool {
        self.spans.iter().any(|member| member.covers(span))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter()
    }
}

impl Extend<Span> for SpanSet {
    fn extend<T: IntoIterator<Item = Span>>(&mut self, iter: T) {
        self.spans.extend(iter);
    }
}

impl FromIterator<Span> for SpanSet {
    fn from_iter<T: IntoIterator<Item = Span>>(iter: T) -> Self {
        SpanSet {
            spans: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_spans_of_orders_matches_left_to_right() {
        let re = Regex::new(r"a+").unwrap();
        let spans = spans_of(&re, "aa b aaa");
        assert_eq!(spans, vec![Span::new(0, 2), Span::new(5, 8)]);
    }

    #[test]
    fn test_spans_of_group_uses_capture_bounds() {
        let re = Regex::new(r"(?:^|[^`])(`[^`]+`)").unwrap();
        let spans = spans_of_group(&re, "x `code` y", 1);
        assert_eq!(spans, vec![Span::new(2, 8)]);
    }

    #[test]
    fn test_contains_tolerates_one_byte() {
        let set: SpanSet = vec![Span::new(10, 20)].into_iter().collect();
        assert!(set.contains(&Span::new(10, 20)));
        assert!(set.contains(&Span::new(9, 21)));
        assert!(set.contains(&Span::new(12, 15)));
        assert!(!set.contains(&Span::new(8, 20)));
        assert!(!set.contains(&Span::new(10, 22)));
    }

    #[test]
    fn test_contains_at_document_start() {
        let set: SpanSet = vec![Span::new(0, 5)].into_iter().collect();
        assert!(set.contains(&Span::new(0, 6)));
        assert!(!set.contains(&Span::new(0, 7)));
    }

    #[test]
    fn test_pop_restores_previous_state() {
        let mut set: SpanSet = vec![Span::new(0, 4)].into_iter().collect();
        let before = set.clone();
        set.push(Span::new(10, 14));
        assert!(set.contains(&Span::new(10, 14)));
        assert_eq!(set.pop(), Some(Span::new(10, 14)));
        assert_eq!(set, before);
        assert!(!set.contains(&Span::new(10, 14)));
    }

    #[test]
    fn test_overlap() {
        assert_eq!(Span::new(0, 10).overlap(&Span::new(5, 15)), 5);
        assert_eq!(Span::new(0, 10).overlap(&Span::new(10, 15)), 0);
    }
}
