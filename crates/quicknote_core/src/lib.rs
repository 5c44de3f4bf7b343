//! Core domain logic for Quick Note.
//! Notes live in a local key-value store; this crate owns every invariant
//! about them so front ends only bind input and output.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod theme;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CoreConfig, SessionConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteId, NoteListItem, NoteValidationError, NotesMap};
pub use service::export::{ExportError, ExportFile};
pub use service::note_registry::{
    NoteRegistry, PreviewToggle, DEFAULT_NOTE_TITLE, WELCOME_NOTE_TITLE,
};
pub use service::preview::{MarkdownRenderer, PreviewError, RenderError, Renderer};
pub use store::{
    KvBackend, KvStore, MemoryKvBackend, SqliteKvBackend, StoreError, StoreResult,
};
pub use theme::ThemeMode;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
