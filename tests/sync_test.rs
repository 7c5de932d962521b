use test_log::test;

use mdanki_core::{
    codec::{FieldParser, PlainFormatter, ScanContext, Slot},
    config::Settings,
    document::Document,
    note::NoteId,
    remote::{sync_document, MemoryStore, RemoteStore},
};

fn sync(doc: &mut Document, store: &mut MemoryStore) -> mdanki_core::codec::ScanResult {
    let settings = Settings::default()
        .compile(store.existing_ids().unwrap())
        .unwrap();
    let ctx = ScanContext {
        settings: &settings,
        parser: &FieldParser,
        formatter: &PlainFormatter,
    };
    sync_document(doc, &ctx, store).unwrap()
}

#[test]
fn test_sync_adds_then_edits() {
    let mut store = MemoryStore::default();
    let mut doc = Document::from_source(
        "capitals.md",
        "---\ntags: [geo]\n---\n««[Basic] Capital of France Back: Paris»»\n",
    );

    let first = sync(&mut doc, &mut store);
    assert_eq!(first.to_add.len(), 1);
    let Some(Slot::Known(id)) = first.ledger.first().copied() else {
        panic!("created note is bound to an identifier");
    };
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(id).unwrap().tags, vec!["Obsidian_to_Anki", "geo"]);
    assert_eq!(
        doc.text,
        format!("---\ntags: [geo]\nanki-id: {id}\n---\n««[Basic] Capital of France Back: Paris»»\n")
    );

    doc.text = doc.text.replace("Paris", "Paris, on the Seine");
    doc.refresh_frontmatter();
    let second = sync(&mut doc, &mut store);
    assert!(second.to_add.is_empty());
    assert_eq!(second.to_edit.len(), 1);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(id).unwrap().fields["Back"], "Paris, on the Seine");
}

#[test]
fn test_sync_deletes_marked_note() {
    let mut store = MemoryStore::with_ids([NoteId(42)]);
    let mut doc = Document::from_source("gone.md", "---\nanki-id: 42-delete\n---\nSome text\n");

    let result = sync(&mut doc, &mut store);
    assert_eq!(result.to_delete, vec![NoteId(42)]);
    assert!(store.is_empty());
    assert_eq!(doc.text, "Some text\n");
}

#[test]
fn test_refused_note_stays_pending() {
    let mut store = MemoryStore::default();
    let mut doc = Document::from_source("dupes.md", "««[Basic] Same»»\n««[Basic] Same»»\n");

    let result = sync(&mut doc, &mut store);
    assert_eq!(result.to_add.len(), 2);
    assert_eq!(store.len(), 1);
    assert!(matches!(result.ledger[0], Slot::Known(_)));
    assert_eq!(result.ledger[1], Slot::Pending(1));
    assert_eq!(result.ids().len(), 1);
}
