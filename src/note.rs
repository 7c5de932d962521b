//! Note records produced by scanning a document.
//!
//! A [`CandidateNote`] is what the extraction passes hand to the reconciler: a model name, a deck,
//! a field map, a tag list and an optional remote identifier. The Note Parser reports its verdict
//! on a piece of matched text as a [`ParseOutcome`], which keeps "not a note of this type" apart
//! from "a note without an identifier" and from "a note bound to identifier N".

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::codec::spans::Span;

/// Separator used when tags travel as a single string.
pub const TAG_SEP: &str = " ";

/// Identifier of a note in the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub u64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(NoteId)
    }
}

impl From<u64> for NoteId {
    fn from(id: u64) -> Self {
        NoteId(id)
    }
}

/// Which extraction pass produced a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteKind {
    /// The whole file as a single front/back card.
    BasicCard,
    /// Text between the inline begin/end markers.
    Inline,
    /// A match of a custom per-note-type pattern.
    Regex,
}

/// Fields, tags and identifier the Note Parser extracted from a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedNote {
    pub note_type: String,
    pub fields: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub id: Option<NoteId>,
}

/// Verdict of the Note Parser on one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The text is a valid note. `id` is `None` when neither the text nor the cursor supplied one.
    Note(ParsedNote),
    /// The text matched syntactically but is not a valid note of this type.
    NotANote,
}

impl ParseOutcome {
    pub fn is_note(&self) -> bool {
        matches!(self, ParseOutcome::Note(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateNote {
    pub kind: NoteKind,
    pub model_name: String,
    pub deck_name: String,
    pub fields: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub id: Option<NoteId>,
    /// Source text the note was extracted from.
    pub raw: String,
    /// Region of the document the note occupies, when it came from a match.
    pub span: Option<Span>,
    /// Offset just past the note text, where an identifier comment would go.
    pub id_offset: Option<usize>,
}

impl CandidateNote {
    pub fn from_parsed(kind: NoteKind, parsed: ParsedNote, deck_name: &str, raw: &str) -> Self {
        CandidateNote {
            kind,
            model_name: parsed.note_type,
            deck_name: deck_name.to_string(),
            fields: parsed.fields,
            tags: parsed.tags,
            id: parsed.id,
            raw: raw.to_string(),
            span: None,
            id_offset: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_id_offset(mut self, offset: usize) -> Self {
        self.id_offset = Some(offset);
        self
    }

    /// Appends tags, skipping empty strings and tags the note already carries.
    pub fn push_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            let tag = tag.as_ref();
            if !tag.is_empty() && !self.tags.iter().any(|t| t == tag) {
                self.tags.push(tag.to_string());
            }
        }
    }
}

/// Normalises a folder-style deck path into an Anki deck name (`a/b` becomes `a::b`).
pub fn to_deck_name(raw: &str) -> String {
    raw.trim()
        .split('/')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<&str>>()
        .join("::")
}

/// Normalises a frontmatter tag into an Anki tag: no leading `#`, no whitespace.
pub fn to_tag_name(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('#')
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("_")
}
