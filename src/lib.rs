//! # mdanki-core
//!
//! Extracts flashcard notes embedded in markdown documents and reconciles them against the notes
//! an Anki collection already holds.
//!
//! ## Overview
//!
//! A document can carry notes in three ways:
//!
//! - **Whole-file cards**: a document whose frontmatter declares the deck property becomes a single
//!   front/back card (front from the `anki-front` property or the file name, back from the body).
//! - **Inline notes**: text between configurable markers, `««[Basic] Question Back: Answer»»` by
//!   default.
//! - **Custom-pattern notes**: user-supplied regular expressions per note type, each tried with
//!   and without trailing `Tags:` and `ID:` annotations.
//!
//! Scanning a document yields a three-way diff (add / edit / delete) and a ledger of identifiers,
//! which is written back into the document's frontmatter once the remote store has assigned
//! identifiers to new notes.
//!
//! ## Architecture
//!
//! - **[`config`]**: settings file and the compiled per-scan snapshot
//! - **[`document`]**: documents, frontmatter parsing, vault loading
//! - **[`note`]**: identifiers and candidate notes
//! - **[`codec`]**: extraction passes, reconciliation, identifier write-back
//! - **[`remote`]**: remote store contract, AnkiConnect request payloads, one-document sync
//!
//! Scanning never fails: malformed input degrades to "no notes found", and notes naming unknown
//! identifiers are reported as [`codec::ScanDiagnostic`]s. Fallible work (reading settings,
//! compiling patterns, file I/O, talking to the store) returns [`MdAnkiError`].
//!
//! ## Features
//!
//! - **default**: the library
//! - **bin**: the `mdanki` command line tool

pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod note;
pub mod remote;

pub use error::*;
