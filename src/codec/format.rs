//! Field-text formatting applied to notes before upload.

use std::collections::BTreeMap;

use crate::note::CandidateNote;

/// Note-type to field to the text that every note of that type carries in that field.
pub type FrozenFields = BTreeMap<String, BTreeMap<String, String>>;

pub trait Formatter: Sync {
    /// Turns raw field text into the representation stored remotely.
    fn format(&self, text: &str, cloze: bool) -> String;

    /// Appends a link back to the source document to `field`, if the note has that field.
    fn add_file_link(&self, note: &mut CandidateNote, url: &str, field: &str) {
        if let Some(value) = note.fields.get_mut(field) {
            value.push_str(&format!(
                "<br><a href=\"{url}\" class=\"obsidian-link\">Obsidian</a>"
            ));
        }
    }

    /// Appends the document's frozen text for the note's type to each field.
    fn apply_frozen_fields(&self, note: &mut CandidateNote, frozen: &FrozenFields) {
        let Some(frozen_for_type) = frozen.get(&note.model_name) else {
            return;
        };
        for (field, value) in note.fields.iter_mut() {
            if let Some(extra) = frozen_for_type.get(field) {
                value.push_str(extra);
            }
        }
    }
}

/// Keeps text as written apart from turning line breaks into `<br>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn format(&self, text: &str, _cloze: bool) -> String {
        text.replace("\r\n", "\n").replace('\n', "<br>")
    }
}
