//! Classification of candidate notes against the identifiers the remote store already holds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::{
    codec::{cursor::Slot, diagnostic::ScanDiagnostic},
    note::{CandidateNote, NoteId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// New note; `index` is its position in the add list.
    Add { index: usize },
    /// Existing remote note to update.
    Edit(NoteId),
    /// The note names an identifier the remote store does not have. It was skipped.
    Unknown(NoteId),
}

impl Classification {
    /// Ledger entry for a note that was discovered with this classification.
    pub fn slot(&self) -> Slot {
        match self {
            Classification::Add { index } => Slot::Pending(*index),
            Classification::Edit(id) | Classification::Unknown(id) => Slot::Known(*id),
        }
    }

    pub fn is_enqueued(&self) -> bool {
        !matches!(self, Classification::Unknown(_))
    }
}

/// The three-way diff for one document plus what is needed to write identifiers back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub path: String,
    pub target_deck: String,
    pub global_tags: Vec<String>,
    pub to_add: Vec<CandidateNote>,
    pub to_edit: Vec<CandidateNote>,
    pub to_delete: Vec<NoteId>,
    /// One entry per discovered note, in discovery order.
    pub ledger: Vec<Slot>,
    /// The identifier property carried a deletion marker.
    pub had_delete_marker: bool,
    pub diagnostics: Vec<ScanDiagnostic>,
}

impl ScanResult {
    /// Identifiers known so far, in discovery order. Pending adds are left out until
    /// [`ScanResult::assign_created_ids`] resolves them.
    pub fn ids(&self) -> Vec<NoteId> {
        self.ledger.iter().filter_map(Slot::id).collect()
    }

    /// Binds the identifiers the remote store returned for `to_add`, positionally.
    ///
    /// `created[i]` belongs to `to_add[i]`; `None` means the store rejected that note, which stays
    /// pending.
    pub fn assign_created_ids(&mut self, created: &[Option<NoteId>]) {
        for slot in self.ledger.iter_mut() {
            if let Slot::Pending(index) = *slot {
                if let Some(Some(id)) = created.get(index) {
                    *slot = Slot::Known(*id);
                }
            }
        }
        for (note, id) in self.to_add.iter_mut().zip(created.iter()) {
            if id.is_some() {
                note.id = *id;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_edit.is_empty() && self.to_delete.is_empty()
    }
}

pub struct Reconciler<'a> {
    existing_ids: &'a BTreeSet<NoteId>,
    path: String,
    global_tags: Vec<String>,
    to_add: Vec<CandidateNote>,
    to_edit: Vec<CandidateNote>,
    diagnostics: Vec<ScanDiagnostic>,
}

impl<'a> Reconciler<'a> {
    pub fn new(existing_ids: &'a BTreeSet<NoteId>, path: &str, global_tags: Vec<String>) -> Self {
        Reconciler {
            existing_ids,
            path: path.to_string(),
            global_tags,
            to_add: Vec::new(),
            to_edit: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Where a note with `id` would go, without enqueueing anything.
    pub fn classify(&self, id: Option<NoteId>) -> Classification {
        match id {
            None => Classification::Add {
                index: self.to_add.len(),
            },
            Some(id) if self.existing_ids.contains(&id) => Classification::Edit(id),
            Some(id) => Classification::Unknown(id),
        }
    }

    /// Classifies `note` and enqueues it. Add-candidates receive the document's global tags.
    pub fn submit(&mut self, mut note: CandidateNote) -> Classification {
        let classification = self.classify(note.id);
        match classification {
            Classification::Add { .. } => {
                note.push_tags(&self.global_tags);
                self.to_add.push(note);
            }
            Classification::Edit(_) => self.to_edit.push(note),
            Classification::Unknown(id) => {
                tracing::warn!(
                    "Note with id {} in file {} does not exist in Anki!",
                    id,
                    self.path
                );
                self.diagnostics
                    .push(ScanDiagnostic::unknown_identifier(id, self.path.clone()));
            }
        }
        classification
    }

    /// Enqueues `note` as a new note whatever identifier it carries.
    pub fn submit_add(&mut self, mut note: CandidateNote) -> Classification {
        let index = self.to_add.len();
        note.id = None;
        note.push_tags(&self.global_tags);
        self.to_add.push(note);
        Classification::Add { index }
    }

    pub fn push_diagnostic(&mut self, diagnostic: ScanDiagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn finish(
        self,
        target_deck: String,
        ledger: Vec<Slot>,
        deletion: Option<NoteId>,
    ) -> ScanResult {
        ScanResult {
            path: self.path,
            target_deck,
            global_tags: self.global_tags,
            to_add: self.to_add,
            to_edit: self.to_edit,
            to_delete: deletion.into_iter().collect(),
            ledger,
            had_delete_marker: deletion.is_some(),
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{NoteKind, ParsedNote};
    use test_log::test;

    fn note(id: Option<NoteId>) -> CandidateNote {
        CandidateNote::from_parsed(
            NoteKind::Inline,
            ParsedNote {
                note_type: "Basic".to_string(),
                id,
                ..Default::default()
            },
            "Default",
            "",
        )
    }

    #[test]
    fn test_three_way_classification() {
        let existing = BTreeSet::from([NoteId(1)]);
        let mut reconciler = Reconciler::new(&existing, "a.md", vec!["g".to_string()]);

        assert_eq!(reconciler.submit(note(None)), Classification::Add { index: 0 });
        assert_eq!(
            reconciler.submit(note(Some(NoteId(1)))),
            Classification::Edit(NoteId(1))
        );
        assert_eq!(
            reconciler.submit(note(Some(NoteId(2)))),
            Classification::Unknown(NoteId(2))
        );
        assert_eq!(reconciler.submit(note(None)), Classification::Add { index: 1 });

        let result = reconciler.finish("Default".to_string(), vec![], None);
        assert_eq!(result.to_add.len(), 2);
        assert_eq!(result.to_add[0].tags, vec!["g".to_string()]);
        assert_eq!(result.to_edit.len(), 1);
        assert!(result.to_edit[0].tags.is_empty());
        assert_eq!(
            result.diagnostics,
            vec![ScanDiagnostic::unknown_identifier(NoteId(2), "a.md")]
        );
        assert!(!result.had_delete_marker);
    }

    #[test]
    fn test_assign_created_ids_fills_pending_slots() {
        let existing = BTreeSet::new();
        let mut reconciler = Reconciler::new(&existing, "a.md", vec![]);
        let first = reconciler.submit(note(None));
        let second = reconciler.submit(note(None));
        let ledger = vec![Slot::Known(NoteId(9)), first.slot(), Slot::Empty, second.slot()];
        let mut result = reconciler.finish("Default".to_string(), ledger, None);
        assert_eq!(result.ids(), vec![NoteId(9)]);

        result.assign_created_ids(&[Some(NoteId(100)), None]);
        assert_eq!(result.ids(), vec![NoteId(9), NoteId(100)]);
        assert_eq!(result.to_add[0].id, Some(NoteId(100)));
        assert_eq!(result.to_add[1].id, None);
        assert_eq!(result.ledger[3], Slot::Pending(1));
    }

    #[test]
    fn test_submit_add_ignores_identifier() {
        let existing = BTreeSet::from([NoteId(1)]);
        let mut reconciler = Reconciler::new(&existing, "a.md", vec!["g".to_string()]);
        assert_eq!(
            reconciler.submit_add(note(Some(NoteId(1)))),
            Classification::Add { index: 0 }
        );
        assert_eq!(
            reconciler.submit_add(note(Some(NoteId(2)))),
            Classification::Add { index: 1 }
        );
        let result = reconciler.finish("Default".to_string(), vec![], None);
        assert_eq!(result.to_add.len(), 2);
        assert!(result.to_add.iter().all(|n| n.id.is_none()));
        assert_eq!(result.to_add[1].tags, vec!["g".to_string()]);
        assert!(result.to_edit.is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_deletion_sets_marker() {
        let existing = BTreeSet::new();
        let reconciler = Reconciler::new(&existing, "a.md", vec![]);
        let result = reconciler.finish("Default".to_string(), vec![], Some(NoteId(42)));
        assert_eq!(result.to_delete, vec![NoteId(42)]);
        assert!(result.had_delete_marker);
    }
}
