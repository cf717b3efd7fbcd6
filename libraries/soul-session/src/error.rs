//! Error types for session management

use thiserror::Error;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Command issued before a media player was attached, or after the
    /// session loop shut down
    #[error("Session not initialized")]
    NotInitialized,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    InvalidIndex(usize),

    /// Opaque URI could not be resolved to a playable location
    #[error("Failed to resolve {uri}: {reason}")]
    ResolveFailed { uri: String, reason: String },

    /// Media player failed to produce playable audio
    #[error("Load failed ({code}): {message}")]
    LoadFailed { code: String, message: String },

    /// Stored snapshot could not be decoded
    #[error("Persisted session is corrupt: {0}")]
    PersistenceCorrupt(String),

    /// Key-value store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Stable code reported to hosts in `SessionEvent::PlayerError`
    pub fn code(&self) -> &str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::InvalidIndex(_) => "invalid_index",
            Self::ResolveFailed { .. } => "resolve_failed",
            Self::LoadFailed { code, .. } => code,
            Self::PersistenceCorrupt(_) => "persistence_corrupt",
            Self::Storage(_) => "storage",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
