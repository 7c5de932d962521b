//! Non-fatal findings reported while scanning a document.

use serde::{Deserialize, Serialize};

use crate::note::NoteId;

/// Diagnostic information produced during a scan.
///
/// None of these stop the scan: the note they concern is skipped and the rest of the document is
/// processed as usual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanDiagnostic {
    /// A note carries an identifier the remote store does not know.
    ///
    /// The note is neither added nor edited, so a stale identifier never duplicates or orphans a
    /// remote record.
    UnknownIdentifier { id: NoteId, path: String },

    /// A warning about the document (e.g. unreadable frontmatter values)
    Warning(String),

    /// An informational message about the scan
    Info(String),
}

impl ScanDiagnostic {
    pub fn unknown_identifier(id: NoteId, path: impl Into<String>) -> Self {
        Self::UnknownIdentifier {
            id,
            path: path.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning(message.into())
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::Info(message.into())
    }

    pub fn is_unknown_identifier(&self) -> bool {
        matches!(self, Self::UnknownIdentifier { .. })
    }

    /// The identifier this diagnostic is about, if any.
    pub fn as_unknown_identifier(&self) -> Option<NoteId> {
        match self {
            Self::UnknownIdentifier { id, .. } => Some(*id),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScanDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownIdentifier { id, path } => {
                write!(f, "Note with id {id} in file {path} does not exist in Anki")
            }
            Self::Warning(msg) => write!(f, "Warning: {msg}"),
            Self::Info(msg) => write!(f, "Info: {msg}"),
        }
    }
}
