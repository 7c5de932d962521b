//! Extraction passes and the per-document scan pipeline.
//!
//! A scan runs, in order:
//!
//! 1. the basic-card pass, when the frontmatter declares the deck property; it replaces the other
//!    two passes for that document;
//! 2. otherwise the inline pass followed by the custom-pattern pass for each configured note type;
//! 3. the deletion-marker scan.
//!
//! The ignore set and the identifier cursor are owned by [`scan_document`] and handed to each pass
//! explicitly, so every pass sees the spans claimed before it and claims identifiers strictly in
//! discovery order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{
    codec::{
        cursor::{IdCursor, Slot},
        diagnostic::ScanDiagnostic,
        format::Formatter,
        ignore::initial_ignore_spans,
        parser::{NoteParser, ParseContext},
        reconcile::{Reconciler, ScanResult},
        spans::{Span, SpanSet},
    },
    config::{CompiledCustomRegex, ScanSettings},
    document::{value_to_string, Document, FRONTMATTER},
    note::{to_deck_name, to_tag_name, CandidateNote, NoteId, NoteKind, ParseOutcome, TAG_SEP},
};

static FIRST_H1: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#\s+.+$").expect("heading pattern is valid"));

pub const BASIC_NOTE_TYPE: &str = "Basic";

/// Collaborators a scan runs with.
pub struct ScanContext<'a> {
    pub settings: &'a ScanSettings,
    pub parser: &'a dyn NoteParser,
    pub formatter: &'a dyn Formatter,
}

/// Document-level values shared by every note the document yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSetup {
    pub target_deck: String,
    pub global_tags: Vec<String>,
    pub declared_ids: Vec<NoteId>,
}

/// Frontmatter deck if set and non-empty, else the configured default.
pub fn target_deck(doc: &Document, settings: &ScanSettings) -> String {
    doc.property(&settings.syntax.deck_property)
        .and_then(value_to_string)
        .filter(|deck| !deck.trim().is_empty())
        .map(|deck| to_deck_name(&deck))
        .unwrap_or_else(|| settings.default_deck.clone())
}

/// Tags from the frontmatter tags property, as a list or a separated string.
pub fn global_tags(doc: &Document, settings: &ScanSettings) -> Vec<String> {
    let raw: Vec<String> = match doc.property(&settings.syntax.tags_property) {
        Some(Value::Array(items)) => items.iter().filter_map(value_to_string).collect(),
        Some(value) => value_to_string(value)
            .map(|s| s.split(TAG_SEP).map(str::to_string).collect())
            .unwrap_or_default(),
        None => Vec::new(),
    };
    raw.iter()
        .map(|tag| to_tag_name(tag))
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn value_to_id(value: &Value) -> Option<NoteId> {
    match value {
        Value::Number(n) => n.as_u64().map(NoteId),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Identifiers the document declares, in declaration order.
///
/// A bare integer, a numeric string or a list of them. A value carrying the deletion postfix
/// declares nothing.
pub fn declared_ids(doc: &Document, settings: &ScanSettings) -> Vec<NoteId> {
    let postfix = &settings.syntax.id_delete_postfix;
    match doc.property(&settings.syntax.id_property) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) if s.ends_with(postfix.as_str()) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(value_to_id).collect(),
        Some(value) => value_to_id(value).into_iter().collect(),
    }
}

/// The identifier a deletion marker (`"<id><postfix>"`) asks to delete, if well formed.
pub fn scan_deletions(doc: &Document, settings: &ScanSettings) -> Option<NoteId> {
    let postfix = &settings.syntax.id_delete_postfix;
    let Some(Value::String(raw)) = doc.property(&settings.syntax.id_property) else {
        return None;
    };
    let id = raw
        .strip_suffix(postfix.as_str())
        .and_then(|rest| rest.parse::<NoteId>().ok());
    if id.is_none() && raw.ends_with(postfix.as_str()) {
        tracing::debug!("Ignoring malformed deletion marker {raw:?} in {}", doc.path);
    }
    id
}

pub fn document_setup(doc: &Document, settings: &ScanSettings) -> DocumentSetup {
    DocumentSetup {
        target_deck: target_deck(doc, settings),
        global_tags: global_tags(doc, settings),
        declared_ids: declared_ids(doc, settings),
    }
}

/// Whether the document is turned into a single card instead of being scanned for notes.
pub fn is_basic_card_document(doc: &Document, settings: &ScanSettings) -> bool {
    doc.frontmatter.contains_key(&settings.syntax.deck_property)
}

/// Body with the frontmatter block and the first top-level heading removed.
pub fn card_body(text: &str) -> String {
    let body = FRONTMATTER.replace(text, "");
    let body = body.trim_start();
    let body = FIRST_H1.replace(body, "");
    body.trim().to_string()
}

/// Applies document-level decorations every extracted note receives.
fn decorate(note: &mut CandidateNote, doc: &Document, ctx: &ScanContext<'_>) {
    if let (Some(url), Some(field)) = (
        doc.url.as_deref(),
        ctx.settings.file_link_fields.get(&note.model_name),
    ) {
        ctx.formatter.add_file_link(note, url, field);
    }
    if !doc.frozen_fields.is_empty() {
        ctx.formatter.apply_frozen_fields(note, &doc.frozen_fields);
    }
}

fn with_default_tags(mut note: CandidateNote, settings: &ScanSettings) -> CandidateNote {
    let own = std::mem::take(&mut note.tags);
    note.push_tags(&settings.default_tags);
    note.push_tags(own);
    note
}

/// Turns the whole document into one front/back card.
pub fn scan_basic_card(
    doc: &Document,
    ctx: &ScanContext<'_>,
    setup: &DocumentSetup,
    cursor: &mut IdCursor,
    reconciler: &mut Reconciler<'_>,
) {
    let settings = ctx.settings;
    let default_fields = vec!["Front".to_string(), "Back".to_string()];
    let field_names = settings
        .fields
        .get(BASIC_NOTE_TYPE)
        .unwrap_or(&default_fields);
    let front = doc
        .property(&settings.syntax.front_property)
        .and_then(value_to_string)
        .map(|front| front.trim().to_string())
        .filter(|front| !front.is_empty())
        .unwrap_or_else(|| doc.note_name());
    let back = ctx.formatter.format(&card_body(&doc.text), false);

    let fields: BTreeMap<String, String> = field_names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let value = match idx {
                0 => front.clone(),
                1 => back.clone(),
                _ => String::new(),
            };
            (name.clone(), value)
        })
        .collect();

    let mut note = CandidateNote {
        kind: NoteKind::BasicCard,
        model_name: BASIC_NOTE_TYPE.to_string(),
        deck_name: setup.target_deck.clone(),
        fields,
        tags: settings.default_tags.clone(),
        id: cursor.peek(),
        raw: doc.text.clone(),
        span: None,
        id_offset: None,
    };
    decorate(&mut note, doc, ctx);
    let classification = reconciler.submit(note);
    cursor.advance(classification.slot());
}

/// Extracts every note between the inline begin/end markers, left to right.
///
/// Every match claims a position from the cursor, including matches the parser rejects.
pub fn scan_inline_notes(
    doc: &Document,
    ctx: &ScanContext<'_>,
    setup: &DocumentSetup,
    cursor: &mut IdCursor,
    reconciler: &mut Reconciler<'_>,
) {
    for caps in ctx.settings.inline_note.captures_iter(&doc.text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let parse_ctx = ParseContext {
            fields: &ctx.settings.fields,
            formatter: ctx.formatter,
            declared_id: cursor.peek(),
        };
        match ctx.parser.parse_inline(inner.as_str(), &parse_ctx) {
            ParseOutcome::NotANote => {
                tracing::debug!("Inline match at {} is not a note", whole.start());
                cursor.advance(Slot::Empty);
            }
            ParseOutcome::Note(parsed) => {
                let mut note = with_default_tags(
                    CandidateNote::from_parsed(
                        NoteKind::Inline,
                        parsed,
                        &setup.target_deck,
                        inner.as_str(),
                    ),
                    ctx.settings,
                )
                .with_span(Span::from(whole));
                if note.id.is_none() {
                    note = note.with_id_offset(inner.end());
                }
                decorate(&mut note, doc, ctx);
                let classification = reconciler.submit(note);
                cursor.advance(classification.slot());
            }
        }
    }
}

/// Runs the four variants of one custom pattern over the document.
///
/// A match inside a claimed span is skipped. A processed match claims its span before parsing;
/// if the parser rejects it the span is released again.
///
/// Matches of a variant with an `ID:` group are classified by that identifier and claim a cursor
/// position only when enqueued. Matches of the other variants are always new notes and always
/// claim a cursor position.
pub fn scan_custom_notes(
    doc: &Document,
    ctx: &ScanContext<'_>,
    setup: &DocumentSetup,
    custom: &CompiledCustomRegex,
    ignore: &mut SpanSet,
    cursor: &mut IdCursor,
    reconciler: &mut Reconciler<'_>,
) {
    for (variant, regex) in custom.variants.iter() {
        for caps in regex.captures_iter(&doc.text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let span = Span::from(whole);
            if ignore.contains(&span) {
                continue;
            }
            ignore.push(span);
            let parse_ctx = ParseContext {
                fields: &ctx.settings.fields,
                formatter: ctx.formatter,
                declared_id: cursor.peek(),
            };
            let parsed = match ctx
                .parser
                .parse_pattern(&custom.note_type, &caps, *variant, &parse_ctx)
            {
                ParseOutcome::Note(parsed) => parsed,
                ParseOutcome::NotANote => {
                    ignore.pop();
                    continue;
                }
            };
            let mut note = with_default_tags(
                CandidateNote::from_parsed(
                    NoteKind::Regex,
                    parsed,
                    &setup.target_deck,
                    whole.as_str(),
                ),
                ctx.settings,
            )
            .with_span(span);
            decorate(&mut note, doc, ctx);
            if variant.has_id() {
                let classification = reconciler.submit(note);
                if classification.is_enqueued() {
                    cursor.advance(classification.slot());
                }
            } else {
                // The declared identifier stays in the ledger; the note itself is always new.
                let declared = note.id;
                let classification = reconciler.submit_add(note.with_id_offset(whole.end()));
                cursor.advance(declared.map(Slot::Known).unwrap_or(classification.slot()));
            }
        }
    }
}

/// Scans one document and classifies everything it contains.
#[tracing::instrument(skip_all, fields(path = %doc.path))]
pub fn scan_document(doc: &Document, ctx: &ScanContext<'_>) -> ScanResult {
    let settings = ctx.settings;
    let setup = document_setup(doc, settings);
    let mut cursor = IdCursor::new(setup.declared_ids.clone());
    let mut reconciler = Reconciler::new(
        &settings.existing_ids,
        &doc.path,
        setup.global_tags.clone(),
    );

    if is_basic_card_document(doc, settings) {
        tracing::debug!("Scanning as a single basic card");
        scan_basic_card(doc, ctx, &setup, &mut cursor, &mut reconciler);
    } else {
        let mut ignore = initial_ignore_spans(&doc.text, &settings.inline_note);
        scan_inline_notes(doc, ctx, &setup, &mut cursor, &mut reconciler);
        for custom in settings.custom.iter() {
            scan_custom_notes(
                doc,
                ctx,
                &setup,
                custom,
                &mut ignore,
                &mut cursor,
                &mut reconciler,
            );
        }
    }

    let deletion = scan_deletions(doc, settings);
    if let Some(id) = deletion {
        reconciler.push_diagnostic(ScanDiagnostic::info(format!(
            "Note {id} marked for deletion"
        )));
    }
    let declared = cursor.declared().len();
    if declared > cursor.position() {
        reconciler.push_diagnostic(ScanDiagnostic::warning(format!(
            "{} declares {declared} identifiers but only {} notes were found",
            doc.path,
            cursor.position()
        )));
    }
    let result = reconciler.finish(setup.target_deck, cursor.into_ledger(), deletion);
    tracing::debug!(
        "{} to add, {} to edit, {} to delete",
        result.to_add.len(),
        result.to_edit.len(),
        result.to_delete.len()
    );
    result
}
