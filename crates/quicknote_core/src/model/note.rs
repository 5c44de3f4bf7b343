//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record stored under the `notes` key.
//! - Generate timestamp-derived identifiers that stay unique within a map.
//! - Validate records at the storage boundary.
//!
//! # Invariants
//! - `NoteId` values have the shape `note_<epoch millis>` when generated here.
//! - `title` is trimmed and non-empty.
//! - `touch` never moves `last_modified` backwards or sideways.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_ID_PREFIX: &str = "note_";

/// Stable identifier of a note.
///
/// Persisted as the key of the notes map, so it serializes as a bare string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Wraps an existing identifier, e.g. one read back from storage or
    /// passed in by a front end.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Builds the identifier for a note created at `epoch_ms`.
    pub fn from_millis(epoch_ms: i64) -> Self {
        Self(format!("{NOTE_ID_PREFIX}{epoch_ms}"))
    }

    /// Returns the first identifier at or after `epoch_ms` that is not yet a
    /// key of `notes`.
    pub fn next_free(notes: &NotesMap, epoch_ms: i64) -> Self {
        let mut candidate_ms = epoch_ms;
        loop {
            let candidate = Self::from_millis(candidate_ms);
            if !notes.contains_key(&candidate) {
                return candidate;
            }
            candidate_ms += 1;
        }
    }

    /// Timestamp part of a generated identifier. `None` for foreign ids.
    pub fn millis(&self) -> Option<i64> {
        self.0.strip_prefix(NOTE_ID_PREFIX)?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every persisted note keyed by id. Ordered so listings are deterministic.
pub type NotesMap = BTreeMap<NoteId, Note>;

/// Persisted note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Display title, trimmed and non-empty.
    pub title: String,
    /// Markdown-flavored body.
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Always `>= created_at`.
    pub last_modified: i64,
}

/// Validation failures for notes decoded from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
    ModifiedBeforeCreated { created_at: i64, last_modified: i64 },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be empty"),
            Self::ModifiedBeforeCreated {
                created_at,
                last_modified,
            } => write!(
                f,
                "lastModified ({last_modified}) is earlier than createdAt ({created_at})"
            ),
        }
    }
}

impl Error for NoteValidationError {}

impl Note {
    /// Creates an empty note. Callers pass an already normalized title.
    pub fn new(title: impl Into<String>, now_ms: i64) -> Self {
        Self {
            title: title.into(),
            content: String::new(),
            created_at: now_ms,
            last_modified: now_ms,
        }
    }

    /// Advances `last_modified` to `now_ms`, or one past its current value
    /// when the clock has not moved forward.
    pub fn touch(&mut self, now_ms: i64) {
        self.last_modified = now_ms.max(self.last_modified + 1);
    }

    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        if self.last_modified < self.created_at {
            return Err(NoteValidationError::ModifiedBeforeCreated {
                created_at: self.created_at,
                last_modified: self.last_modified,
            });
        }
        Ok(())
    }
}

/// One row of the note listing shown in the note selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListItem {
    pub id: NoteId,
    pub title: String,
    pub last_modified: i64,
}

/// Trims a user-provided title, returning `None` when nothing remains.
pub fn normalize_title(title: &str) -> Option<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Projects `notes` into listing rows sorted by `last_modified` descending.
///
/// Equal timestamps fall back to id order so the listing is stable.
pub fn sorted_listing(notes: &NotesMap) -> Vec<NoteListItem> {
    let mut items: Vec<NoteListItem> = notes
        .iter()
        .map(|(id, note)| NoteListItem {
            id: id.clone(),
            title: note.title.clone(),
            last_modified: note.last_modified,
        })
        .collect();
    items.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| a.id.cmp(&b.id))
    });
    items
}
