//! Core types for session management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Track in a playback session
///
/// Immutable value owned by the queue. `uri` is opaque to the session and
/// only interpreted by the `UrlResolver` and `MediaPlayer` collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier within a queue
    pub id: String,

    /// Opaque location handed to the resolver
    pub uri: String,

    /// Track title
    #[serde(default)]
    pub title: Option<String>,

    /// Artist name
    #[serde(default)]
    pub artist: Option<String>,

    /// Artwork location
    #[serde(default)]
    pub artwork_uri: Option<String>,

    /// Duration hint; the player's measured duration wins once known
    #[serde(default)]
    pub duration: Option<Duration>,
}

impl Track {
    /// Create a track with only the required fields
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            title: None,
            artist: None,
            artwork_uri: None,
            duration: None,
        }
    }

    /// Set the title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the artist
    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Set the artwork location
    #[must_use]
    pub fn with_artwork(mut self, artwork_uri: impl Into<String>) -> Self {
        self.artwork_uri = Some(artwork_uri.into());
        self
    }

    /// Set the duration hint
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the queue ends
    #[default]
    Off,

    /// Loop the current track
    Track,

    /// Loop the entire queue
    Queue,
}

impl RepeatMode {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Track => "track",
            Self::Queue => "queue",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "off" => Some(Self::Off),
            "track" => Some(Self::Track),
            "queue" => Some(Self::Queue),
            _ => None,
        }
    }

    /// Whether navigation wraps around the ends of the queue
    pub fn wraps(self) -> bool {
        matches!(self, Self::Track | Self::Queue)
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why the active track changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// Same track restarted because repeat mode is `Track`
    RepeatModeLoop,

    /// Natural end of the previous track
    Auto,

    /// Explicit user navigation (next, previous, jump)
    Seek,

    /// Queue contents changed underneath the current selection
    PlaylistChanged,
}

/// Position of a track in the canonical (insertion-ordered) list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackingIndex(pub usize);

impl BackingIndex {
    /// Raw index
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for BackingIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a track in the order it will actually be heard
///
/// Equal to the backing index while shuffle is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaybackIndex(pub usize);

impl PlaybackIndex {
    /// Raw index
    pub fn get(self) -> usize {
        self.0
    }
}

/// Configuration for the session controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Store key the session snapshot lives under
    pub snapshot_key: String,

    /// "Previous" past this position restarts the track (default: 3000)
    pub restart_threshold_ms: u64,

    /// Finish notifications closer than this are collapsed (default: 200)
    pub finish_dedupe_window_ms: u64,

    /// Position update cadence while playing (default: 200)
    pub position_update_interval_ms: u64,

    /// Snapshot cadence while playing (default: 5000)
    pub snapshot_interval_ms: u64,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Initial shuffle state (default: false)
    pub shuffle: bool,
}

impl SessionConfig {
    pub fn restart_threshold(&self) -> Duration {
        Duration::from_millis(self.restart_threshold_ms)
    }

    pub fn finish_dedupe_window(&self) -> Duration {
        Duration::from_millis(self.finish_dedupe_window_ms)
    }

    pub fn position_update_interval(&self) -> Duration {
        Duration::from_millis(self.position_update_interval_ms)
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_interval_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            snapshot_key: "soul.session.snapshot".to_string(),
            restart_threshold_ms: 3000,
            finish_dedupe_window_ms: 200,
            position_update_interval_ms: 200,
            snapshot_interval_ms: 5000,
            repeat: RepeatMode::Off,
            shuffle: false,
        }
    }
}
