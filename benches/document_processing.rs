//! Performance benchmarks for document processing
//!
//! Measures:
//! - Scanning a large generated document (inline and custom-pattern notes, code and math)
//! - Writing identifiers back after a scan
//! - Loading and scanning a generated vault
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mdanki_core::{
    codec::{scan_document, write_ids, FieldParser, PlainFormatter, ScanContext},
    config::{CustomRegex, Settings},
    document::{load_vault, Document},
    note::NoteId,
};
use std::collections::BTreeSet;
use tempfile::TempDir;

fn bench_settings() -> Settings {
    Settings {
        custom_regexps: vec![CustomRegex {
            note_type: "Basic".to_string(),
            pattern: r"^Q: (.*)\nA: (.*)".to_string(),
        }],
        ..Default::default()
    }
}

// Every fourth section is a custom-pattern note, every third carries math and code
fn generate_document(sections: usize) -> String {
    let ids = (0..sections as u64)
        .map(|i| (1000 + i).to_string())
        .collect::<Vec<String>>()
        .join(", ");
    let mut text = format!("---\ntags: [bench]\nanki-id: [{ids}]\n---\n# Generated\n\n");
    for i in 0..sections {
        text.push_str(&format!(
            "## Section {i}\n\nSome prose about topic {i}.\n\n««[Basic] Question {i} Back: Answer {i} Tags: t{i}»»\n\n"
        ));
        if i % 4 == 0 {
            text.push_str(&format!("Q: Custom question {i}\nA: Custom answer {i}\n\n"));
        }
        if i % 3 == 0 {
            text.push_str(&format!(
                "Inline math $x_{i}$ and `code {i}`.\n\n```\nQ: fenced {i}\nA: fenced\n```\n\n"
            ));
        }
    }
    text
}

fn bench_scan_large_document(c: &mut Criterion) {
    let text = generate_document(500);
    let existing = (1000..1250).map(NoteId).collect::<BTreeSet<NoteId>>();
    let settings = bench_settings().compile(existing).unwrap();
    let ctx = ScanContext {
        settings: &settings,
        parser: &FieldParser,
        formatter: &PlainFormatter,
    };
    let doc = Document::from_source("generated.md", text);

    c.bench_function("scan_large_document", |b| {
        b.iter(|| scan_document(black_box(&doc), &ctx).to_add.len())
    });
}

fn bench_scan_and_write_ids(c: &mut Criterion) {
    let text = generate_document(100);
    let existing = (1000..1100).map(NoteId).collect::<BTreeSet<NoteId>>();
    let settings = bench_settings().compile(existing).unwrap();
    let ctx = ScanContext {
        settings: &settings,
        parser: &FieldParser,
        formatter: &PlainFormatter,
    };

    c.bench_function("scan_and_write_ids", |b| {
        b.iter(|| {
            let mut doc = Document::from_source("generated.md", text.clone());
            let result = scan_document(&doc, &ctx);
            write_ids(&mut doc, &result, "anki-id");
            doc.text.len()
        })
    });
}

fn bench_vault_scan(c: &mut Criterion) {
    let tempdir = TempDir::new().unwrap();
    for i in 0..50 {
        let dir = tempdir.path().join(format!("topic_{}", i % 5));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("note_{i}.md")), generate_document(10)).unwrap();
    }
    let settings = bench_settings();
    let scan_settings = settings.compile(BTreeSet::new()).unwrap();
    let ctx = ScanContext {
        settings: &scan_settings,
        parser: &FieldParser,
        formatter: &PlainFormatter,
    };

    c.bench_function("vault_scan", |b| {
        b.iter(|| {
            let docs = load_vault(tempdir.path(), &settings.ignored_file_globs, None).unwrap();
            docs.iter()
                .map(|doc| scan_document(doc, &ctx).to_add.len())
                .sum::<usize>()
        })
    });
}

// Benchmark group configuration
criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(50)  // Fewer samples for file I/O benchmarks
        .measurement_time(std::time::Duration::from_secs(10));
    targets =
        bench_scan_large_document,
        bench_scan_and_write_ids,
        bench_vault_scan
}

criterion_main!(benches);
