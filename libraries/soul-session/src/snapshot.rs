//! Persisted session snapshot
//!
//! JSON document stored under a single key. The `version` field is checked
//! before anything else so a format change never half-decodes into a wrong
//! session.

use crate::error::{Result, SessionError};
use crate::store::KeyValueStore;
use crate::types::{BackingIndex, RepeatMode, Track};
use serde::{Deserialize, Serialize};

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Minimal state needed to resume a session after restart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Schema version
    pub version: u32,

    /// Tracks in backing order
    pub backing: Vec<Track>,

    /// Selected track
    pub current_index: Option<BackingIndex>,

    /// Position within the selected track
    pub position_ms: u64,

    /// Repeat mode
    pub repeat_mode: RepeatMode,

    /// Whether shuffle was on
    pub shuffle_enabled: bool,
}

impl SessionSnapshot {
    /// Serialize to bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize and validate
    ///
    /// Any failure (malformed JSON, unknown version, out-of-range index) is
    /// reported as `PersistenceCorrupt`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| SessionError::PersistenceCorrupt(e.to_string()))?;

        let version = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| SessionError::PersistenceCorrupt("missing version".to_string()))?;
        if version != u64::from(SNAPSHOT_VERSION) {
            return Err(SessionError::PersistenceCorrupt(format!(
                "unsupported version {}",
                version
            )));
        }

        let snapshot: Self = serde_json::from_value(value)
            .map_err(|e| SessionError::PersistenceCorrupt(e.to_string()))?;

        match snapshot.current_index {
            Some(index) if index.get() >= snapshot.backing.len() => {
                Err(SessionError::PersistenceCorrupt(format!(
                    "current index {} outside queue of {}",
                    index,
                    snapshot.backing.len()
                )))
            }
            None if !snapshot.backing.is_empty() => Err(SessionError::PersistenceCorrupt(
                "non-empty queue without selection".to_string(),
            )),
            _ => Ok(snapshot),
        }
    }

    /// Write to `store` under `key`
    pub fn save(&self, store: &mut dyn KeyValueStore, key: &str) -> Result<()> {
        store.set(key, self.encode()?)
    }

    /// Read from `store`
    ///
    /// `Ok(None)` when nothing was ever saved.
    pub fn load(store: &dyn KeyValueStore, key: &str) -> Result<Option<Self>> {
        store
            .get(key)?
            .map(|bytes| Self::decode(&bytes))
            .transpose()
    }
}
