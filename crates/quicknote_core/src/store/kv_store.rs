//! Typed accessors over a raw key-value backend.
//!
//! # Responsibility
//! - Encode/decode JSON values stored under arbitrary keys.
//! - Expose the notes map and the last-active-note pointer.
//!
//! # Invariants
//! - Malformed values decode to the caller's default.
//! - Backend read failures are errors on the `try_*` accessors and defaults
//!   on the rest.
//! - A notes map with any invalid entry is treated as corrupt as a whole.
//! - Writing the map and writing the pointer are independent; no atomicity
//!   is promised across the two keys.

use super::{KvBackend, StoreError, StoreResult};
use crate::model::note::{NoteId, NotesMap};
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Key holding the JSON-encoded notes map.
pub const NOTES_KEY: &str = "notes";
/// Key holding the plain-text id of the last active note.
pub const LAST_NOTE_ID_KEY: &str = "lastNoteId";
/// Key holding the timestamp of the last issued note id, so ids freed by a
/// delete are not handed out again.
pub const LAST_ISSUED_ID_KEY: &str = "lastIssuedNoteId";
/// Key holding the plain-text theme preference.
pub const DARK_MODE_KEY: &str = "darkMode";

/// JSON-aware store wrapper around a `KvBackend`.
pub struct KvStore<B: KvBackend> {
    backend: B,
}

impl<B: KvBackend> KvStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Decodes the JSON value stored under `key`.
    ///
    /// Absent keys, `null`, backend read failures and shape mismatches all
    /// yield `default`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.try_get(key) {
            Ok(value) => value.unwrap_or(default),
            Err(err) => {
                log_read_error(key, &err);
                default
            }
        }
    }

    /// Like `get`, but surfaces backend read failures.
    ///
    /// Malformed values still decode to `Ok(None)`; only a failed read is an
    /// error.
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let Some(raw) = self.backend.read(key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Option<T>>(&raw) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(
                    "event=store_get module=store status=malformed key={} error={}",
                    key, err
                );
                Ok(None)
            }
        }
    }

    /// Encodes `value` as JSON and stores it under `key`.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set_text(key, &raw)
    }

    pub fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.backend.delete(key)
    }

    /// Reads the raw text under `key` without JSON decoding.
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.backend.read(key).unwrap_or_else(|err| {
            log_read_error(key, &err);
            None
        })
    }

    /// Stores raw text under `key` without JSON encoding.
    pub fn set_text(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.backend.write(key, value)
    }

    /// Returns every stored note, or an empty map when the stored value is
    /// missing, corrupt or unreadable.
    ///
    /// Read-only callers only; anything that writes the map back must use
    /// `try_notes_map` so a failed read is never mistaken for "no notes".
    pub fn notes_map(&self) -> NotesMap {
        self.try_notes_map().unwrap_or_else(|err| {
            log_read_error(NOTES_KEY, &err);
            NotesMap::new()
        })
    }

    /// Returns every stored note. Missing or corrupt values yield an empty
    /// map; a backend read failure is an error.
    pub fn try_notes_map(&self) -> StoreResult<NotesMap> {
        let notes: NotesMap = self.try_get(NOTES_KEY)?.unwrap_or_default();
        for (id, note) in &notes {
            if let Err(err) = note.validate() {
                warn!(
                    "event=store_get module=store status=malformed key={} note_id={} error={}",
                    NOTES_KEY, id, err
                );
                return Ok(NotesMap::new());
            }
        }
        Ok(notes)
    }

    pub fn set_notes_map(&mut self, notes: &NotesMap) -> StoreResult<()> {
        self.set(NOTES_KEY, notes)
    }

    /// Returns the persisted session pointer. The referenced note may no
    /// longer exist.
    pub fn last_note_id(&self) -> Option<NoteId> {
        self.get_text(LAST_NOTE_ID_KEY)
            .filter(|value| !value.is_empty())
            .map(NoteId::new)
    }

    pub fn set_last_note_id(&mut self, id: &NoteId) -> StoreResult<()> {
        self.set_text(LAST_NOTE_ID_KEY, id.as_str())
    }

    /// Returns the timestamp part of the most recently issued note id, if
    /// one was ever recorded.
    pub fn last_issued_id_ms(&self) -> StoreResult<Option<i64>> {
        self.try_get(LAST_ISSUED_ID_KEY)
    }

    pub fn set_last_issued_id_ms(&mut self, epoch_ms: i64) -> StoreResult<()> {
        self.set(LAST_ISSUED_ID_KEY, &epoch_ms)
    }
}

fn log_read_error(key: &str, err: &StoreError) {
    error!(
        "event=store_get module=store status=error key={} error={}",
        key, err
    );
}
