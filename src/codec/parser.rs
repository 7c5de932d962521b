//! Note Parser: turns matched text into fields, tags and an identifier.
//!
//! The scanner only depends on the [`NoteParser`] trait. [`FieldParser`] is the implementation
//! used by default:
//!
//! - inline notes read `[Type] first field Second: ... Tags: a b ID: 123`, where the field markers
//!   are the note type's own field names;
//! - custom-pattern notes map capture groups to the note type's fields in order, followed by the
//!   optional tag and identifier groups appended by [`PatternVariant::compose`].
//!
//! A note type the schema does not know, or a cloze-type note without any `{{cN::...}}` deletion,
//! is reported as [`ParseOutcome::NotANote`].

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet},
};

use crate::{
    codec::format::Formatter,
    note::{NoteId, ParseOutcome, ParsedNote},
};

/// Note-type to ordered field names.
pub type FieldSchema = BTreeMap<String, Vec<String>>;

/// Trailing group matching a `Tags: ...` line.
pub const TAG_PATTERN: &str = r"(Tags: .*)";
/// Trailing group matching an `ID: 123` annotation, optionally in an HTML comment.
pub const ID_PATTERN: &str = r"\n?(?:<!--)?(?:ID: (\d+).*)";

static INLINE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:<!--)?ID: (\d+)(?:-->)?\s*$").expect("inline id pattern is valid")
});
static INLINE_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([^\]\n]+)\]").expect("inline type pattern is valid"));
static INLINE_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(?:^|\s)Tags:(.*)\z").expect("inline tags pattern is valid"));
static CLOZE_DELETION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{c\d+::").expect("cloze pattern is valid"));

/// Which optional trailing groups a custom pattern variant carries.
///
/// Variants are tried in the order of [`PatternVariant::PRIORITY`]: a more specific variant claims
/// its span before a less specific one can match a subset of the same text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternVariant {
    TagsAndId,
    Tags,
    Id,
    Bare,
}

impl PatternVariant {
    pub const PRIORITY: [PatternVariant; 4] = [
        PatternVariant::TagsAndId,
        PatternVariant::Tags,
        PatternVariant::Id,
        PatternVariant::Bare,
    ];

    pub fn has_tags(&self) -> bool {
        matches!(self, PatternVariant::TagsAndId | PatternVariant::Tags)
    }

    pub fn has_id(&self) -> bool {
        matches!(self, PatternVariant::TagsAndId | PatternVariant::Id)
    }

    /// Source of the concrete pattern for `base`.
    pub fn compose(&self, base: &str) -> String {
        let tags = if self.has_tags() { TAG_PATTERN } else { "" };
        let id = if self.has_id() { ID_PATTERN } else { "" };
        format!("{base}{tags}{id}")
    }
}

/// Inputs the parser needs besides the matched text.
pub struct ParseContext<'a> {
    pub fields: &'a FieldSchema,
    pub formatter: &'a dyn Formatter,
    /// Identifier claimed from the document's declared list for this discovery.
    pub declared_id: Option<NoteId>,
}

pub trait NoteParser: Sync {
    /// Parses the text enclosed by the inline note markers.
    fn parse_inline(&self, text: &str, ctx: &ParseContext<'_>) -> ParseOutcome;

    /// Parses a match of `variant` of the custom pattern registered for `note_type`.
    fn parse_pattern(
        &self,
        note_type: &str,
        caps: &Captures<'_>,
        variant: PatternVariant,
        ctx: &ParseContext<'_>,
    ) -> ParseOutcome;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FieldParser;

fn is_cloze_type(note_type: &str) -> bool {
    note_type.to_lowercase().contains("cloze")
}

fn split_tags(text: &str) -> Vec<String> {
    text.trim()
        .trim_start_matches("Tags:")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Byte ranges of every `name:` marker in `text` that starts a word.
fn field_markers(text: &str, name: &str) -> Vec<(usize, usize)> {
    let marker = format!("{name}:");
    text.match_indices(&marker)
        .filter(|(idx, _)| {
            *idx == 0
                || text[..*idx]
                    .chars()
                    .next_back()
                    .map(char::is_whitespace)
                    .unwrap_or(false)
        })
        .map(|(idx, _)| (idx, idx + marker.len()))
        .collect()
}

/// Splits inline note text into raw field values keyed by field name.
///
/// Each field takes its first marker that does not sit inside an earlier, longer marker, so
/// `Extra:` never splits `Back Extra:`.
fn split_inline_fields(text: &str, field_names: &[String]) -> BTreeMap<String, String> {
    let mut candidates = field_names
        .iter()
        .enumerate()
        .skip(1)
        .flat_map(|(idx, name)| {
            field_markers(text, name)
                .into_iter()
                .map(move |(start, content)| (start, content, idx))
        })
        .collect::<Vec<(usize, usize, usize)>>();
    candidates.sort_by_key(|&(start, content, _)| (start, Reverse(content)));

    let mut markers = Vec::new();
    let mut seen = BTreeSet::new();
    let mut claimed = 0;
    for (start, content, idx) in candidates {
        if start < claimed || seen.contains(&idx) {
            continue;
        }
        seen.insert(idx);
        claimed = content;
        markers.push((start, content, idx));
    }

    let mut raw: BTreeMap<String, String> = field_names
        .iter()
        .map(|name| (name.clone(), String::new()))
        .collect();
    if let Some(first) = field_names.first() {
        let end = markers.first().map(|m| m.0).unwrap_or(text.len());
        raw.insert(first.clone(), text[..end].trim().to_string());
    }
    for (pos, (_, content_start, idx)) in markers.iter().enumerate() {
        let end = markers.get(pos + 1).map(|m| m.0).unwrap_or(text.len());
        raw.insert(
            field_names[*idx].clone(),
            text[*content_start..end].trim().to_string(),
        );
    }
    raw
}

fn finish(
    note_type: &str,
    raw_fields: BTreeMap<String, String>,
    tags: Vec<String>,
    id: Option<NoteId>,
    ctx: &ParseContext<'_>,
) -> ParseOutcome {
    let cloze = is_cloze_type(note_type);
    if cloze && !raw_fields.values().any(|v| CLOZE_DELETION.is_match(v)) {
        tracing::debug!("{note_type} note without cloze deletions is not a note");
        return ParseOutcome::NotANote;
    }
    let fields = raw_fields
        .into_iter()
        .map(|(name, value)| {
            let formatted = ctx.formatter.format(&value, cloze);
            (name, formatted)
        })
        .collect();
    ParseOutcome::Note(ParsedNote {
        note_type: note_type.to_string(),
        fields,
        tags,
        id: id.or(ctx.declared_id),
    })
}

impl NoteParser for FieldParser {
    fn parse_inline(&self, text: &str, ctx: &ParseContext<'_>) -> ParseOutcome {
        let text = text.trim();
        let (body, text_id) = match INLINE_ID.captures(text) {
            Some(caps) => {
                let whole = caps.get(0).map(|m| m.start()).unwrap_or(text.len());
                (&text[..whole], caps[1].parse::<NoteId>().ok())
            }
            None => (text, None),
        };
        let body = body.trim();
        let Some(type_caps) = INLINE_TYPE.captures(body) else {
            return ParseOutcome::NotANote;
        };
        let note_type = type_caps[1].trim();
        let Some(field_names) = ctx.fields.get(note_type) else {
            tracing::debug!("Unknown note type [{note_type}] in inline note");
            return ParseOutcome::NotANote;
        };
        let mut rest = &body[type_caps[0].len()..];
        let mut tags = Vec::new();
        if let Some(tag_caps) = INLINE_TAGS.captures(rest) {
            tags = split_tags(&tag_caps[1]);
            let start = tag_caps.get(0).map(|m| m.start()).unwrap_or(rest.len());
            rest = &rest[..start];
        }
        let raw_fields = split_inline_fields(rest, field_names);
        finish(note_type, raw_fields, tags, text_id, ctx)
    }

    fn parse_pattern(
        &self,
        note_type: &str,
        caps: &Captures<'_>,
        variant: PatternVariant,
        ctx: &ParseContext<'_>,
    ) -> ParseOutcome {
        let Some(field_names) = ctx.fields.get(note_type) else {
            tracing::debug!("No field schema for note type {note_type}");
            return ParseOutcome::NotANote;
        };
        let mut last = caps.len();
        let mut id = None;
        if variant.has_id() {
            last -= 1;
            id = caps.get(last).and_then(|m| m.as_str().parse::<NoteId>().ok());
        }
        let mut tags = Vec::new();
        if variant.has_tags() {
            last -= 1;
            tags = caps
                .get(last)
                .map(|m| split_tags(m.as_str()))
                .unwrap_or_default();
        }
        let raw_fields = field_names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let value = if idx + 1 < last {
                    caps.get(idx + 1)
                        .map(|m| m.as_str().trim().to_string())
                        .unwrap_or_default()
                } else {
                    String::new()
                };
                (name.clone(), value)
            })
            .collect();
        finish(note_type, raw_fields, tags, id, ctx)
    }
}
