//! The remote note store: request payloads, the store contract and one-document sync.
//!
//! Requests follow the AnkiConnect wire format (`{"action", "version", "params"}`); sending them
//! is left to the caller's transport. [`MemoryStore`] implements [`RemoteStore`] in memory, for
//! dry runs and tests.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    codec::{scan_document, write_ids, ScanContext, ScanResult},
    document::Document,
    error::MdAnkiError,
    note::{CandidateNote, NoteId, TAG_SEP},
};

pub const ANKI_CONNECT_VERSION: u8 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnkiRequest {
    pub action: String,
    pub version: u8,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

pub fn request(action: &str, params: Value) -> AnkiRequest {
    AnkiRequest {
        action: action.to_string(),
        version: ANKI_CONNECT_VERSION,
        params,
    }
}

/// Batches several requests into one round trip.
pub fn multi(actions: Vec<AnkiRequest>) -> AnkiRequest {
    request("multi", json!({ "actions": actions }))
}

pub fn create_deck(deck: &str) -> AnkiRequest {
    request("createDeck", json!({ "deck": deck }))
}

pub fn add_note(note: &CandidateNote) -> AnkiRequest {
    request(
        "addNote",
        json!({
            "note": {
                "deckName": note.deck_name,
                "modelName": note.model_name,
                "fields": note.fields,
                "tags": note.tags,
                "options": {
                    "allowDuplicate": false,
                    "duplicateScope": "deck",
                },
            }
        }),
    )
}

pub fn delete_notes(ids: &[NoteId]) -> AnkiRequest {
    request("deleteNotes", json!({ "notes": ids }))
}

pub fn update_note_fields(id: NoteId, fields: &BTreeMap<String, String>) -> AnkiRequest {
    request(
        "updateNoteFields",
        json!({ "note": { "id": id, "fields": fields } }),
    )
}

pub fn notes_info(ids: &[NoteId]) -> AnkiRequest {
    request("notesInfo", json!({ "notes": ids }))
}

pub fn add_tags(ids: &[NoteId], tags: &str) -> AnkiRequest {
    request("addTags", json!({ "notes": ids, "tags": tags }))
}

pub fn remove_tags(ids: &[NoteId], tags: &str) -> AnkiRequest {
    request("removeTags", json!({ "notes": ids, "tags": tags }))
}

pub fn change_deck(card_ids: &[u64], deck: &str) -> AnkiRequest {
    request("changeDeck", json!({ "cards": card_ids, "deck": deck }))
}

fn edit_ids(result: &ScanResult) -> Vec<NoteId> {
    result.to_edit.iter().filter_map(|note| note.id).collect()
}

impl ScanResult {
    pub fn create_decks_request(&self) -> AnkiRequest {
        let decks = self
            .to_add
            .iter()
            .map(|note| note.deck_name.as_str())
            .collect::<BTreeSet<&str>>();
        multi(decks.into_iter().map(create_deck).collect())
    }

    pub fn add_notes_request(&self) -> AnkiRequest {
        multi(self.to_add.iter().map(add_note).collect())
    }

    pub fn delete_notes_request(&self) -> AnkiRequest {
        delete_notes(&self.to_delete)
    }

    pub fn update_fields_request(&self) -> AnkiRequest {
        multi(
            self.to_edit
                .iter()
                .filter_map(|note| note.id.map(|id| update_note_fields(id, &note.fields)))
                .collect(),
        )
    }

    pub fn notes_info_request(&self) -> AnkiRequest {
        notes_info(&edit_ids(self))
    }

    /// Removes `current_tags` (as reported by `notesInfo`) from every edited note.
    pub fn clear_tags_request(&self, current_tags: &[String]) -> AnkiRequest {
        remove_tags(&edit_ids(self), &current_tags.join(TAG_SEP))
    }

    /// Re-applies each edited note's own tags plus the document's global tags.
    pub fn add_tags_request(&self) -> AnkiRequest {
        let global = self.global_tags.join(TAG_SEP);
        multi(
            self.to_edit
                .iter()
                .filter_map(|note| {
                    note.id.map(|id| {
                        let tags = format!("{}{TAG_SEP}{global}", note.tags.join(TAG_SEP));
                        add_tags(&[id], tags.trim())
                    })
                })
                .collect(),
        )
    }

    /// Moves the cards of edited notes into the document's deck.
    pub fn change_decks_request(&self, card_ids: &[u64]) -> AnkiRequest {
        change_deck(card_ids, &self.target_deck)
    }
}

/// What the engine needs from the store holding the notes.
pub trait RemoteStore {
    fn existing_ids(&self) -> Result<BTreeSet<NoteId>, MdAnkiError>;

    /// Creates `notes`; the result holds one entry per note, in order, `None` where the store
    /// refused the note.
    fn add_notes(&mut self, notes: &[CandidateNote]) -> Result<Vec<Option<NoteId>>, MdAnkiError>;

    fn update_notes(&mut self, notes: &[CandidateNote]) -> Result<(), MdAnkiError>;

    fn delete_notes(&mut self, ids: &[NoteId]) -> Result<(), MdAnkiError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNote {
    pub model_name: String,
    pub deck_name: String,
    pub fields: BTreeMap<String, String>,
    pub tags: Vec<String>,
}

impl From<&CandidateNote> for StoredNote {
    fn from(note: &CandidateNote) -> Self {
        StoredNote {
            model_name: note.model_name.clone(),
            deck_name: note.deck_name.clone(),
            fields: note.fields.clone(),
            tags: note.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStore {
    notes: BTreeMap<NoteId, StoredNote>,
    next_id: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore {
            notes: BTreeMap::new(),
            next_id: 1_600_000_000_000,
        }
    }
}

impl MemoryStore {
    /// A store that already holds placeholder notes under `ids`.
    pub fn with_ids<I: IntoIterator<Item = NoteId>>(ids: I) -> Self {
        let mut store = MemoryStore::default();
        for id in ids {
            store.notes.insert(
                id,
                StoredNote {
                    model_name: String::new(),
                    deck_name: String::new(),
                    fields: BTreeMap::new(),
                    tags: Vec::new(),
                },
            );
            store.next_id = store.next_id.max(id.0 + 1);
        }
        store
    }

    pub fn get(&self, id: NoteId) -> Option<&StoredNote> {
        self.notes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl RemoteStore for MemoryStore {
    fn existing_ids(&self) -> Result<BTreeSet<NoteId>, MdAnkiError> {
        Ok(self.notes.keys().copied().collect())
    }

    fn add_notes(&mut self, notes: &[CandidateNote]) -> Result<Vec<Option<NoteId>>, MdAnkiError> {
        let mut created = Vec::with_capacity(notes.len());
        for note in notes {
            let stored = StoredNote::from(note);
            let duplicate = self.notes.values().any(|existing| {
                existing.model_name == stored.model_name
                    && existing.deck_name == stored.deck_name
                    && existing.fields == stored.fields
            });
            if duplicate {
                tracing::warn!(
                    "Refusing duplicate {} note in {}",
                    stored.model_name,
                    stored.deck_name
                );
                created.push(None);
                continue;
            }
            let id = NoteId(self.next_id);
            self.next_id += 1;
            self.notes.insert(id, stored);
            created.push(Some(id));
        }
        Ok(created)
    }

    fn update_notes(&mut self, notes: &[CandidateNote]) -> Result<(), MdAnkiError> {
        for note in notes {
            let Some(id) = note.id else {
                return Err(MdAnkiError::Remote(
                    "cannot update a note without an identifier".to_string(),
                ));
            };
            let Some(stored) = self.notes.get_mut(&id) else {
                return Err(MdAnkiError::Remote(format!("note {id} does not exist")));
            };
            *stored = StoredNote::from(note);
        }
        Ok(())
    }

    fn delete_notes(&mut self, ids: &[NoteId]) -> Result<(), MdAnkiError> {
        for id in ids {
            self.notes.remove(id);
        }
        Ok(())
    }
}

/// Runs one reconciliation cycle for `doc`: scan, push deletions, edits and additions to `store`,
/// bind the created identifiers and write them back into the document.
///
/// `ctx.settings.existing_ids` must come from `store`.
pub fn sync_document<S: RemoteStore>(
    doc: &mut Document,
    ctx: &ScanContext<'_>,
    store: &mut S,
) -> Result<ScanResult, MdAnkiError> {
    let mut result = scan_document(doc, ctx);
    if !result.to_delete.is_empty() {
        store.delete_notes(&result.to_delete)?;
    }
    if !result.to_edit.is_empty() {
        store.update_notes(&result.to_edit)?;
    }
    if !result.to_add.is_empty() {
        let created = store.add_notes(&result.to_add)?;
        result.assign_created_ids(&created);
    }
    write_ids(doc, &result, &ctx.settings.syntax.id_property);
    tracing::info!(
        "Synced {}: {} added, {} updated, {} deleted",
        doc.path,
        result.to_add.len(),
        result.to_edit.len(),
        result.to_delete.len()
    );
    Ok(result)
}
