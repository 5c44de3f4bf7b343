//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store reads/writes into note use-cases.
//! - Keep front ends decoupled from storage and rendering details.

pub mod export;
pub mod note_registry;
pub mod preview;
pub mod session;
