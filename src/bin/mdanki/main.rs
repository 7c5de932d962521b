//! mdanki CLI tool
//!
//! Command-line interface for scanning markdown documents for flashcard notes.
//!
//! ## Commands
//!
//! - `scan <path>`: Scan a file or a vault directory and print the resulting diff as JSON,
//!   together with the AnkiConnect requests that would apply it
//!
//! ## Write-Back Support
//!
//! By default the scan is read-only. `--write` rewrites the identifier property of every document
//! whose notes already have identifiers (edits, and deletions that drop the property).
//!
//! **Warning**: The `--write` flag modifies files in place. Ensure you have backups or are
//! using version control before enabling write-back.

use clap::{Parser, Subcommand};
use mdanki_core::{
    codec::{scan_document, write_ids, FieldParser, PlainFormatter, ScanContext},
    config::{get_content, set_content, SettingsProvider, TomlSettingsProvider},
    document::{load_vault, Document},
    note::NoteId,
    MdAnkiError,
};
use serde_json::json;
use std::{collections::BTreeSet, path::PathBuf};

#[derive(Parser)]
#[command(name = "mdanki")]
#[command(author, version, about = "A tool for extracting flashcard notes from markdown documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a document or vault directory once and print the result
    Scan {
        /// Path to the document or directory to scan
        path: PathBuf,

        /// Configuration file path
        #[arg(short, long, default_value = "mdanki.toml")]
        config: PathBuf,

        /// JSON file holding the array of note identifiers the collection already has
        #[arg(long)]
        existing_ids: Option<PathBuf>,

        /// Write identifier updates back to source files (default: read-only)
        #[arg(short, long)]
        write: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn read_existing_ids(path: Option<&PathBuf>) -> Result<BTreeSet<NoteId>, MdAnkiError> {
    let Some(path) = path else {
        return Ok(BTreeSet::new());
    };
    let ids: Vec<NoteId> = serde_json::from_str(&get_content(path)?)?;
    Ok(ids.into_iter().collect())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            path,
            config,
            existing_ids,
            write,
            verbose,
        } => {
            let default_level = if verbose { "debug" } else { "info" };
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
                )
                .init();

            let settings = TomlSettingsProvider::new(config).get_settings()?;
            let scan_settings = settings.compile(read_existing_ids(existing_ids.as_ref())?)?;
            let ctx = ScanContext {
                settings: &scan_settings,
                parser: &FieldParser,
                formatter: &PlainFormatter,
            };

            let (root, documents) = if path.is_dir() {
                let vault = settings.add_file_link.then_some(settings.vault_name.as_str());
                let documents = load_vault(&path, &settings.ignored_file_globs, vault)?;
                (Some(path.clone()), documents)
            } else {
                let doc = Document::from_source(path.display().to_string(), get_content(&path)?);
                (None, vec![doc])
            };

            let mut reports = Vec::with_capacity(documents.len());
            for mut doc in documents {
                let content_hash = doc.content_hash();
                let result = scan_document(&doc, &ctx);
                for diagnostic in result.diagnostics.iter() {
                    if diagnostic.is_unknown_identifier() {
                        eprintln!("Warning: {diagnostic}");
                    }
                }
                if write {
                    let before = doc.text.clone();
                    write_ids(&mut doc, &result, &settings.syntax.id_property);
                    if doc.text != before {
                        let target = match &root {
                            Some(root) => root.join(&doc.path),
                            None => PathBuf::from(&doc.path),
                        };
                        set_content(&target, &doc.text)?;
                        tracing::info!("Updated {}", target.display());
                    }
                }
                let mut requests = Vec::new();
                if !result.to_add.is_empty() {
                    requests.push(result.create_decks_request());
                    requests.push(result.add_notes_request());
                }
                if !result.to_edit.is_empty() {
                    requests.push(result.update_fields_request());
                    requests.push(result.add_tags_request());
                }
                if !result.to_delete.is_empty() {
                    requests.push(result.delete_notes_request());
                }
                reports.push(json!({
                    "path": doc.path,
                    "content_hash": content_hash,
                    "result": result,
                    "requests": requests,
                }));
            }
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    Ok(())
}
