//! Note extraction and reconciliation.
//!
//! This module turns one [`Document`](crate::document::Document) into a [`ScanResult`]: notes to
//! add, notes to edit, identifiers to delete, and the identifier ledger used to rewrite the
//! document's frontmatter afterwards.
//!
//! ## Key Components
//!
//! - [`spans`] - byte ranges and the ignore set that keeps matches from claiming text twice
//! - [`ignore`] - seeds the ignore set with inline notes, math and code
//! - [`cursor`] - hands out the document's declared identifiers in discovery order
//! - [`parser`] - the [`NoteParser`] contract and its default [`FieldParser`]
//! - [`format`] - the [`Formatter`] contract and the [`PlainFormatter`]
//! - [`scanner`] - the extraction passes and [`scan_document`]
//! - [`reconcile`] - add / edit / unknown classification against the remote identifiers
//! - [`frontmatter`] - writes the identifier annotation back with [`write_ids`]
//!
//! ## Scanning a document
//!
//! ```rust
//! use std::collections::BTreeSet;
//! use mdanki_core::{
//!     codec::{scan_document, write_ids, FieldParser, PlainFormatter, ScanContext},
//!     config::Settings,
//!     document::Document,
//!     note::NoteId,
//! };
//!
//! let settings = Settings::default();
//! let scan_settings = settings.compile(BTreeSet::from([NoteId(5)])).unwrap();
//! let ctx = ScanContext {
//!     settings: &scan_settings,
//!     parser: &FieldParser,
//!     formatter: &PlainFormatter,
//! };
//! let mut doc = Document::from_source(
//!     "capitals.md",
//!     "---\nanki-id: 5\n---\n««[Basic] Capital of France Back: Paris»»\n",
//! );
//! let result = scan_document(&doc, &ctx);
//! assert_eq!(result.to_edit.len(), 1);
//!
//! write_ids(&mut doc, &result, &settings.syntax.id_property);
//! assert!(doc.text.starts_with("---\nanki-id: 5\n---\n"));
//! ```

pub mod cursor;
pub mod diagnostic;
pub mod format;
pub mod frontmatter;
pub mod ignore;
pub mod parser;
pub mod reconcile;
pub mod scanner;
pub mod spans;

pub use cursor::{IdCursor, Slot};
pub use diagnostic::ScanDiagnostic;
pub use format::{Formatter, FrozenFields, PlainFormatter};
pub use frontmatter::write_ids;
pub use parser::{FieldParser, FieldSchema, NoteParser, ParseContext, PatternVariant};
pub use reconcile::{Classification, Reconciler, ScanResult};
pub use scanner::{scan_document, ScanContext};
pub use spans::{Span, SpanSet};
