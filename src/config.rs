//! Settings for scanning documents, and the immutable snapshot a scan runs against.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};

use crate::{
    codec::parser::{FieldSchema, PatternVariant},
    error::MdAnkiError,
    note::{to_deck_name, NoteId},
};

pub const DEFAULT_BEGIN_INLINE: &str = "««";
pub const DEFAULT_END_INLINE: &str = "»»";

/// Frontmatter property names and note delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Syntax {
    #[serde(alias = "deck_frontmatter_property")]
    pub deck_property: String,
    #[serde(alias = "tags_frontmatter_property")]
    pub tags_property: String,
    #[serde(alias = "front_frontmatter_property")]
    pub front_property: String,
    #[serde(alias = "id_frontmatter_property")]
    pub id_property: String,
    pub id_delete_postfix: String,
    pub begin_inline_note: String,
    pub end_inline_note: String,
}

impl Default for Syntax {
    fn default() -> Self {
        Syntax {
            deck_property: "deck".to_string(),
            tags_property: "tags".to_string(),
            front_property: "anki-front".to_string(),
            id_property: "anki-id".to_string(),
            id_delete_postfix: "-delete".to_string(),
            begin_inline_note: DEFAULT_BEGIN_INLINE.to_string(),
            end_inline_note: DEFAULT_END_INLINE.to_string(),
        }
    }
}

/// A user-defined pattern whose matches become notes of `note_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRegex {
    pub note_type: String,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub vault_name: String,
    pub default_deck: String,
    pub default_tag: String,
    pub add_file_link: bool,
    pub ignored_file_globs: Vec<String>,
    pub syntax: Syntax,
    pub fields: FieldSchema,
    pub file_link_fields: BTreeMap<String, String>,
    pub custom_regexps: Vec<CustomRegex>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            vault_name: String::new(),
            default_deck: "Default".to_string(),
            default_tag: "Obsidian_to_Anki".to_string(),
            add_file_link: false,
            ignored_file_globs: vec!["**/*.excalidraw.md".to_string()],
            syntax: Syntax::default(),
            fields: FieldSchema::from([
                (
                    "Basic".to_string(),
                    vec!["Front".to_string(), "Back".to_string()],
                ),
                (
                    "Cloze".to_string(),
                    vec!["Text".to_string(), "Back Extra".to_string()],
                ),
            ]),
            file_link_fields: BTreeMap::new(),
            custom_regexps: Vec::new(),
        }
    }
}

/// The four concrete patterns derived from one custom pattern, in priority order.
#[derive(Debug, Clone)]
pub struct CompiledCustomRegex {
    pub note_type: String,
    pub variants: Vec<(PatternVariant, Regex)>,
}

/// Immutable view of the settings a single scan runs against.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub syntax: Syntax,
    pub fields: FieldSchema,
    pub file_link_fields: BTreeMap<String, String>,
    pub default_deck: String,
    pub default_tags: Vec<String>,
    pub inline_note: Regex,
    pub custom: Vec<CompiledCustomRegex>,
    pub existing_ids: BTreeSet<NoteId>,
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default
    } else {
        trimmed
    }
}

/// Non-greedy pattern for text between the inline note markers, spanning newlines.
pub fn inline_note_regex(begin: &str, end: &str) -> Result<Regex, MdAnkiError> {
    let begin = regex::escape(or_default(begin, DEFAULT_BEGIN_INLINE));
    let end = regex::escape(or_default(end, DEFAULT_END_INLINE));
    Ok(Regex::new(&format!("(?s){begin}(.*?){end}"))?)
}

impl Settings {
    /// Compiles every pattern once so the scan itself cannot fail.
    pub fn compile(&self, existing_ids: BTreeSet<NoteId>) -> Result<ScanSettings, MdAnkiError> {
        let inline_note = inline_note_regex(
            &self.syntax.begin_inline_note,
            &self.syntax.end_inline_note,
        )?;
        let mut custom = Vec::new();
        for entry in self.custom_regexps.iter() {
            if entry.pattern.is_empty() {
                continue;
            }
            let mut variants = Vec::with_capacity(PatternVariant::PRIORITY.len());
            for variant in PatternVariant::PRIORITY {
                let regex = RegexBuilder::new(&variant.compose(&entry.pattern))
                    .multi_line(true)
                    .build()
                    .map_err(|e| {
                        MdAnkiError::Regex(format!(
                            "custom pattern for {} is invalid: {e}",
                            entry.note_type
                        ))
                    })?;
                variants.push((variant, regex));
            }
            custom.push(CompiledCustomRegex {
                note_type: entry.note_type.clone(),
                variants,
            });
        }
        let mut syntax = self.syntax.clone();
        if syntax.id_delete_postfix.is_empty() {
            syntax.id_delete_postfix = Syntax::default().id_delete_postfix;
        }
        let default_tags = self
            .default_tag
            .split_whitespace()
            .map(str::to_string)
            .collect();
        Ok(ScanSettings {
            syntax,
            fields: self.fields.clone(),
            file_link_fields: self.file_link_fields.clone(),
            default_deck: to_deck_name(&self.default_deck),
            default_tags,
            inline_note,
            custom,
            existing_ids,
        })
    }
}

pub trait SettingsProvider: Send + Sync {
    fn get_settings(&self) -> Result<Settings, MdAnkiError>;
    fn set_settings(&self, settings: &Settings) -> Result<(), MdAnkiError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TomlSettingsProvider {
    path: PathBuf,
}

impl TomlSettingsProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlSettingsProvider { path }
    }
}

impl SettingsProvider for TomlSettingsProvider {
    fn get_settings(&self) -> Result<Settings, MdAnkiError> {
        tracing::debug!("Attempting to read settings from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Settings file not found, using defaults.");
            return Ok(Settings::default());
        }
        let content = read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn set_settings(&self, settings: &Settings) -> Result<(), MdAnkiError> {
        tracing::debug!("Attempting to write settings to: {:?}", &self.path);
        let toml_string = toml::to_string(settings)?;
        write(&self.path, toml_string)?;
        Ok(())
    }
}

pub fn get_content<P: AsRef<Path>>(path: P) -> Result<String, MdAnkiError> {
    tracing::debug!("Reading {:?}", path.as_ref());
    Ok(read_to_string(path)?)
}

pub fn set_content<P: AsRef<Path>>(path: P, text: &str) -> Result<(), MdAnkiError> {
    Ok(write(path, text)?)
}
