//! Writing the identifier annotation back into a document's frontmatter.
//!
//! Only the first identifier a document yields is persisted: the frontmatter carries a single
//! identifier per file even when the scan tracked several.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex, RegexBuilder};

use crate::{codec::reconcile::ScanResult, document::Document, document::FRONTMATTER, note::NoteId};

static ID_ONLY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:<!--)?ID: \d+(?:-->)?\s*$").expect("id line pattern is valid")
});
static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{2,}").expect("newline pattern is valid"));

fn property_line(name: &str, with_line_break: bool) -> Regex {
    let tail = if with_line_break { r"\r?\n?" } else { "" };
    RegexBuilder::new(&format!("^{}:.*${tail}", regex::escape(name)))
        .multi_line(true)
        .build()
        .expect("escaped property name is a valid pattern")
}

/// Sets `name: id` in the frontmatter, creating the block or the line as needed.
pub fn set_frontmatter_id(content: &str, id: NoteId, name: &str) -> String {
    let new_line = format!("{name}: {id}");
    let Some(caps) = FRONTMATTER.captures(content) else {
        return format!("---\n{new_line}\n---\n{content}");
    };
    let rest = &content[caps[0].len()..];
    let fm = &caps[1];
    let key = property_line(name, false);
    let new_fm = if key.is_match(fm) {
        key.replacen(fm, 1, NoExpand(&new_line)).to_string()
    } else {
        format!("{}\n{new_line}", fm.trim_end())
    };
    format!("---\n{new_fm}\n---\n{rest}")
}

/// Drops the `name` line from the frontmatter; an emptied block is dropped with it.
pub fn remove_frontmatter_property(content: &str, name: &str) -> String {
    let Some(caps) = FRONTMATTER.captures(content) else {
        return content.to_string();
    };
    let rest = &content[caps[0].len()..];
    let key = property_line(name, true);
    let without = key.replacen(&caps[1], 1, "");
    let new_fm = BLANK_RUNS.replace_all(&without, "\n");
    let new_fm = new_fm.trim_end();
    if new_fm.is_empty() {
        return rest.to_string();
    }
    format!("---\n{new_fm}\n---\n{rest}")
}

/// Removes lines holding nothing but a legacy `ID: 123` annotation.
pub fn remove_id_lines(content: &str) -> String {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !ID_ONLY_LINE.is_match(line))
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Rewrites `doc` after a scan (and, if there was one, an upload).
///
/// With no identifiers the document is left alone, unless a deletion marker was present, in which
/// case the identifier property goes away. Otherwise the first identifier is written.
pub fn write_ids(doc: &mut Document, result: &ScanResult, id_property: &str) {
    let ids = result.ids();
    match ids.first() {
        None if result.had_delete_marker => {
            doc.text = remove_frontmatter_property(&remove_id_lines(&doc.text), id_property);
        }
        None => return,
        Some(first) => {
            doc.text = set_frontmatter_id(&remove_id_lines(&doc.text), *first, id_property);
        }
    }
    doc.refresh_frontmatter();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_frontmatter;
    use test_log::test;

    #[test]
    fn test_set_id_creates_block() {
        let out = set_frontmatter_id("Body text\n", NoteId(42), "anki-id");
        assert_eq!(out, "---\nanki-id: 42\n---\nBody text\n");
        assert_eq!(parse_frontmatter(&out)["anki-id"], serde_json::json!(42));
    }

    #[test]
    fn test_set_id_replaces_existing_line() {
        let out = set_frontmatter_id("---\ndeck: A\nanki-id: 1\n---\nbody", NoteId(2), "anki-id");
        assert_eq!(out, "---\ndeck: A\nanki-id: 2\n---\nbody");
    }

    #[test]
    fn test_set_id_appends_line() {
        let out = set_frontmatter_id("---\ndeck: A\n\n---\nbody", NoteId(7), "anki-id");
        assert_eq!(out, "---\ndeck: A\nanki-id: 7\n---\nbody");
    }

    #[test]
    fn test_set_id_escapes_property_name() {
        let out = set_frontmatter_id("---\nidx: 1\n---\n", NoteId(3), "id.");
        assert_eq!(out, "---\nidx: 1\nid.: 3\n---\n");
    }

    #[test]
    fn test_remove_property_keeps_other_keys() {
        let out =
            remove_frontmatter_property("---\nanki-id: 4-delete\ndeck: A\n---\nbody", "anki-id");
        assert_eq!(out, "---\ndeck: A\n---\nbody");
    }

    #[test]
    fn test_remove_last_property_drops_block() {
        let out = remove_frontmatter_property("---\nanki-id: 4-delete\n---\nbody", "anki-id");
        assert_eq!(out, "body");
    }

    #[test]
    fn test_remove_property_without_frontmatter() {
        assert_eq!(remove_frontmatter_property("body", "anki-id"), "body");
    }

    #[test]
    fn test_remove_id_lines() {
        let out = remove_id_lines("Q\r\nID: 12\n<!--ID: 13-->\nA ID: 14 stays\n");
        assert_eq!(out, "Q\nA ID: 14 stays\n");
    }
}
