//! Domain model for quick notes.
//!
//! # Responsibility
//! - Define the persisted note record and its identifier.
//! - Keep the on-disk JSON shape (`title`, `content`, `createdAt`,
//!   `lastModified`) in one place.
//!
//! # Invariants
//! - Every note is addressed by a stable `NoteId` that is never reassigned.
//! - `last_modified >= created_at` for every valid note.

pub mod note;
