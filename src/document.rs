//! Markdown documents as the scanner sees them.

use globset::{Glob, GlobSet, GlobSetBuilder};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use walkdir::{DirEntry, WalkDir};

use crate::{codec::format::FrozenFields, config::get_content, error::MdAnkiError};

/// Leading `---` delimited metadata block; group 1 is its body.
pub static FRONTMATTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A---\r?\n(.*?)\r?\n---\r?\n?").expect("frontmatter pattern is valid")
});

pub type Frontmatter = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Raw text; rewritten in place when identifiers are written back.
    pub text: String,
    pub path: String,
    pub url: Option<String>,
    pub frontmatter: Frontmatter,
    pub frozen_fields: FrozenFields,
}

/// Parses the frontmatter block of `text` into a key/value map.
///
/// Text without a block, or with a block that is not a YAML mapping, yields an empty map.
pub fn parse_frontmatter(text: &str) -> Frontmatter {
    let Some(caps) = FRONTMATTER.captures(text) else {
        return Frontmatter::new();
    };
    match serde_yaml::from_str::<Option<Frontmatter>>(&caps[1]) {
        Ok(map) => map.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Ignoring unreadable frontmatter: {e}");
            Frontmatter::new()
        }
    }
}

/// Renders a scalar frontmatter value the way it reads in the source.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

impl Document {
    /// A document whose frontmatter was already parsed by the host.
    pub fn new(path: impl Into<String>, text: impl Into<String>, frontmatter: Frontmatter) -> Self {
        Document {
            text: text.into(),
            path: path.into(),
            url: None,
            frontmatter,
            frozen_fields: FrozenFields::new(),
        }
    }

    /// A document whose frontmatter is read from its own text.
    pub fn from_source(path: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let frontmatter = parse_frontmatter(&text);
        Document::new(path, text, frontmatter)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_frozen_fields(mut self, frozen_fields: FrozenFields) -> Self {
        self.frozen_fields = frozen_fields;
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.frontmatter.get(name)
    }

    /// Base file name with a trailing `.md` removed.
    pub fn note_name(&self) -> String {
        let base = self.path.rsplit('/').next().unwrap_or(&self.path);
        let stem_len = base.len().saturating_sub(3);
        match base.get(stem_len..) {
            Some(ext) if stem_len > 0 && ext.eq_ignore_ascii_case(".md") => {
                base[..stem_len].to_string()
            }
            _ => base.to_string(),
        }
    }

    /// SHA-256 of the current text, hex encoded.
    pub fn content_hash(&self) -> String {
        hex::encode(Sha256::digest(self.text.as_bytes()))
    }

    /// Re-reads the frontmatter map from the current text.
    pub fn refresh_frontmatter(&mut self) {
        self.frontmatter = parse_frontmatter(&self.text);
    }
}

/// Link that opens `relative_path` in the named Obsidian vault.
pub fn obsidian_url(vault_name: &str, relative_path: &str) -> String {
    fn encode(raw: &str) -> String {
        raw.bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    (b as char).to_string()
                }
                _ => format!("%{b:02X}"),
            })
            .collect()
    }
    format!(
        "obsidian://open?vault={}&file={}",
        encode(vault_name),
        encode(relative_path)
    )
}

fn build_globset(globs: &[String]) -> Result<GlobSet, MdAnkiError> {
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        builder.add(Glob::new(glob)?);
    }
    Ok(builder.build()?)
}

/// Markdown files under `root`, sorted, skipping hidden entries and anything `ignored` matches.
pub fn markdown_files<P: AsRef<Path>>(
    root: P,
    ignored: &[String],
) -> Result<Vec<PathBuf>, MdAnkiError> {
    fn is_hidden(entry: &DirEntry) -> bool {
        entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
    }
    let root = root.as_ref();
    let ignored = build_globset(ignored)?;
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_hidden(e) || e.path() == root)
    {
        let path = entry?.into_path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let relative = path.strip_prefix(root)?;
        if ignored.is_match(relative) {
            tracing::debug!("Skipping ignored file {:?}", relative);
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Loads every markdown file under `root` as a [`Document`] with a vault-relative path.
///
/// When `vault_name` is given, each document gets an Obsidian URL.
pub fn load_vault<P: AsRef<Path>>(
    root: P,
    ignored: &[String],
    vault_name: Option<&str>,
) -> Result<Vec<Document>, MdAnkiError> {
    let root = root.as_ref();
    let mut documents = Vec::new();
    for path in markdown_files(root, ignored)? {
        let relative = path
            .strip_prefix(root)?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<String>>()
            .join("/");
        let mut doc = Document::from_source(relative.clone(), get_content(&path)?);
        if let Some(vault) = vault_name {
            doc = doc.with_url(obsidian_url(vault, &relative));
        }
        documents.push(doc);
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use test_log::test;

    #[test]
    fn test_parse_frontmatter_values() {
        let fm = parse_frontmatter("---\ndeck: French\nanki-id: [1, 2]\n---\nbody");
        assert_eq!(fm["deck"], Value::String("French".to_string()));
        assert_eq!(fm["anki-id"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_parse_frontmatter_absent_or_broken() {
        assert!(parse_frontmatter("no frontmatter").is_empty());
        assert!(parse_frontmatter("---\n: : [\n---\n").is_empty());
        assert!(parse_frontmatter("---\njust a string\n---\n").is_empty());
    }

    #[test]
    fn test_note_name_strips_extension() {
        assert_eq!(Document::from_source("dir/Paris.md", "").note_name(), "Paris");
        assert_eq!(Document::from_source("Notes.MD", "").note_name(), "Notes");
        assert_eq!(Document::from_source("readme", "").note_name(), "readme");
        assert_eq!(Document::from_source("notes/Ψυχή", "").note_name(), "Ψυχή");
        assert_eq!(Document::from_source("Ψυχή.md", "").note_name(), "Ψυχή");
        assert_eq!(Document::from_source("ёж", "").note_name(), "ёж");
    }

    #[test]
    fn test_content_hash_tracks_text() {
        let mut doc = Document::from_source("a.md", "hello");
        let before = doc.content_hash();
        assert_eq!(before.len(), 64);
        doc.text.push('!');
        assert_ne!(before, doc.content_hash());
    }

    #[test]
    fn test_obsidian_url_encoding() {
        assert_eq!(
            obsidian_url("My Vault", "dir/a b.md"),
            "obsidian://open?vault=My%20Vault&file=dir%2Fa%20b.md"
        );
    }

    #[test]
    fn test_markdown_files_skip_hidden_and_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::create_dir_all(root.join(".obsidian")).unwrap();
        fs::write(root.join("a.md"), "a").unwrap();
        fs::write(root.join("sub/b.md"), "b").unwrap();
        fs::write(root.join("sub/c.excalidraw.md"), "c").unwrap();
        fs::write(root.join(".obsidian/d.md"), "d").unwrap();
        fs::write(root.join("e.txt"), "e").unwrap();

        let docs = load_vault(root, &["**/*.excalidraw.md".to_string()], Some("v")).unwrap();
        let paths = docs.iter().map(|d| d.path.as_str()).collect::<Vec<&str>>();
        assert_eq!(paths, vec!["a.md", "sub/b.md"]);
        assert_eq!(
            docs[1].url.as_deref(),
            Some("obsidian://open?vault=v&file=sub%2Fb.md")
        );
    }
}
