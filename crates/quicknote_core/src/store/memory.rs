//! In-process key-value backend.

use super::{KvBackend, StoreResult};
use std::collections::HashMap;

/// `HashMap`-backed storage for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvBackend {
    entries: HashMap<String, String>,
}

impl MemoryKvBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds raw text, bypassing any serialization. Useful for simulating
    /// values written by older builds or corrupted by hand.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KvBackend for MemoryKvBackend {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
