//! Key-value persistence
//!
//! The session stores opaque blobs through this trait; hosts back it with
//! whatever they already have (preferences, a settings table, a file).

use crate::error::{Result, SessionError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Blob store keyed by string
pub trait KeyValueStore: Send {
    /// Read the value under `key`
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()>;
}

/// In-memory store
///
/// Clones share the same map, so a host (or test) can keep a handle to
/// inspect what the session wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| SessionError::storage(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| SessionError::storage(e.to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
