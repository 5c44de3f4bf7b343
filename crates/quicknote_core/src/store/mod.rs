//! Key-value persistence for notes and preferences.
//!
//! # Responsibility
//! - Define the raw text backend contract (`KvBackend`).
//! - Provide SQLite and in-memory backends.
//! - Layer typed JSON accessors for notes and the session pointer on top.
//!
//! # Invariants
//! - Backends store opaque UTF-8 text; only `KvStore` knows about JSON.
//! - Malformed stored values surface as defaults, never as read errors.
//! - Backend failures are distinguishable from absent values via `try_*`.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod kv_store;
pub mod memory;
pub mod sqlite;

pub use kv_store::{KvStore, DARK_MODE_KEY, LAST_ISSUED_ID_KEY, LAST_NOTE_ID_KEY, NOTES_KEY};
pub use memory::MemoryKvBackend;
pub use sqlite::SqliteKvBackend;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error raised by key-value backends and typed store writes.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Serialize(serde_json::Error),
    MissingRequiredTable(&'static str),
    /// Backend refused the write (quota, read-only medium, ...).
    WriteRejected(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize value: {err}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::WriteRejected(reason) => write!(f, "write rejected: {reason}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::MissingRequiredTable(_) | Self::WriteRejected(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Raw text key-value persistence.
///
/// Mirrors a browser-style local storage: one string value per key.
pub trait KvBackend {
    /// Returns the stored text for `key`, or `None` when absent.
    fn read(&self, key: &str) -> StoreResult<Option<String>>;
    /// Inserts or replaces the text stored under `key`.
    fn write(&mut self, key: &str, value: &str) -> StoreResult<()>;
    /// Removes `key`. Removing an absent key is not an error.
    fn delete(&mut self, key: &str) -> StoreResult<()>;
}
