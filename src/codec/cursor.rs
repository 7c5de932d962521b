//! Positional consumption of the identifiers a document declares in its frontmatter.
//!
//! The Nth note discovered while scanning (inline notes first, then custom-pattern notes in
//! pattern-priority order) claims the Nth declared identifier. Text position plays no part.

use serde::{Deserialize, Serialize};

use crate::note::NoteId;

/// What a discovered note left behind in the identifier ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    /// The note is bound to this identifier.
    Known(NoteId),
    /// The note is waiting for the identifier the remote store assigns to add-candidate `index`.
    Pending(usize),
    /// The match was discovered but produced no note.
    Empty,
}

impl Slot {
    pub fn id(&self) -> Option<NoteId> {
        match self {
            Slot::Known(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdCursor {
    declared: Vec<NoteId>,
    claimed: Vec<Slot>,
}

impl IdCursor {
    pub fn new(declared: Vec<NoteId>) -> Self {
        IdCursor {
            declared,
            claimed: Vec::new(),
        }
    }

    /// Number of notes discovered so far.
    pub fn position(&self) -> usize {
        self.claimed.len()
    }

    /// The declared identifier at the current position, if the list reaches that far.
    pub fn peek(&self) -> Option<NoteId> {
        self.declared.get(self.position()).copied()
    }

    /// Records a discovery and moves to the next declared identifier.
    pub fn advance(&mut self, slot: Slot) {
        self.claimed.push(slot);
    }

    pub fn declared(&self) -> &[NoteId] {
        &self.declared
    }

    /// Slots in discovery order.
    pub fn into_ledger(self) -> Vec<Slot> {
        self.claimed
    }
}
