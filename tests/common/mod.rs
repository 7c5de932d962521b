//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::{collections::BTreeSet, path::PathBuf};
use tempfile::TempDir;

use mdanki_core::{
    codec::{scan_document, ScanResult},
    codec::{FieldParser, PlainFormatter, ScanContext},
    config::{CustomRegex, ScanSettings, Settings},
    document::Document,
    note::NoteId,
};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times, subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Default settings plus a `Q: ... / A: ...` custom pattern for Basic notes.
#[allow(dead_code)]
pub fn settings_with_qa_pattern() -> Settings {
    Settings {
        custom_regexps: vec![CustomRegex {
            note_type: "Basic".to_string(),
            pattern: r"^Q: (.*)\nA: (.*)".to_string(),
        }],
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn compile(settings: &Settings, existing: &[u64]) -> ScanSettings {
    settings
        .compile(existing.iter().copied().map(NoteId).collect::<BTreeSet<NoteId>>())
        .unwrap()
}

/// Scans `text` as `path` with the default parser and formatter.
#[allow(dead_code)]
pub fn scan(settings: &ScanSettings, path: &str, text: &str) -> ScanResult {
    let ctx = ScanContext {
        settings,
        parser: &FieldParser,
        formatter: &PlainFormatter,
    };
    scan_document(&Document::from_source(path, text), &ctx)
}

/// Create a small vault with two notes, a hidden directory and an ignored drawing.
///
/// Returns the path to the vault directory (e.g. `<temp_dir>/vault/`).
#[allow(dead_code)]
pub fn create_test_vault(temp_dir: &TempDir) -> PathBuf {
    let vault = temp_dir.path().join("vault");
    std::fs::create_dir_all(vault.join("geo")).unwrap();
    std::fs::create_dir_all(vault.join(".obsidian")).unwrap();

    let capitals = "---\ntags: [geo]\n---\n# Capitals\n\n««[Basic] Capital of France Back: Paris»»\n";
    std::fs::write(vault.join("geo").join("capitals.md"), capitals).unwrap();

    let paris = "---\ndeck: Travel/France\nanki-front: What is Paris known for?\n---\n# Paris\n\nThe Eiffel tower.\n";
    std::fs::write(vault.join("paris.md"), paris).unwrap();

    std::fs::write(vault.join(".obsidian").join("workspace.md"), "««[Basic] hidden»»").unwrap();
    std::fs::write(vault.join("sketch.excalidraw.md"), "««[Basic] drawing»»").unwrap();
    std::fs::write(vault.join("notes.txt"), "««[Basic] not markdown»»").unwrap();

    vault
}
