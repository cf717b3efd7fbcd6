//! Platform-agnostic media player and URL resolver traits
//!
//! Abstracts the native media framework (AVPlayer, ExoPlayer, a desktop
//! decoder) and the service that turns opaque track URIs into playable
//! locations.

use crate::error::{Result, SessionError};
use std::collections::BTreeMap;
use std::time::Duration;

/// Playable location produced by a `UrlResolver`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUri {
    /// Location the player can open
    pub uri: String,

    /// Request headers required to fetch it
    pub headers: BTreeMap<String, String>,
}

impl ResolvedUri {
    /// Location without extra headers
    pub fn plain(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            headers: BTreeMap::new(),
        }
    }
}

/// Resolves opaque track URIs to playable locations
///
/// Implementations enforce their own timeouts; the session treats any error
/// as `ResolveFailed`.
pub trait UrlResolver: Send {
    /// Resolve `uri`
    ///
    /// # Returns
    /// * `Ok(resolved)` - Location and headers to hand to the player
    /// * `Err(_)` - Track cannot be played right now
    fn resolve(&self, uri: &str) -> Result<ResolvedUri>;
}

/// Resolver that hands URIs to the player unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughResolver;

impl UrlResolver for PassthroughResolver {
    fn resolve(&self, uri: &str) -> Result<ResolvedUri> {
        if uri.is_empty() {
            return Err(SessionError::ResolveFailed {
                uri: String::new(),
                reason: "empty uri".to_string(),
            });
        }
        Ok(ResolvedUri::plain(uri))
    }
}

/// Request to load media into the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Load generation; echo it back in every `PlayerEvent` for this media
    pub generation: u64,

    /// Resolved location
    pub uri: String,

    /// Request headers
    pub headers: BTreeMap<String, String>,
}

/// Platform media player
///
/// The session is the player's only caller and never loads two tracks at
/// once. `load` must return without waiting for the media; readiness, stalls,
/// end of media and failures are reported later as `PlayerEvent`s tagged with
/// the request's generation, delivered on the session's control thread.
pub trait MediaPlayer: Send {
    /// Start loading media, replacing whatever was loaded
    ///
    /// # Returns
    /// * `Ok(())` - Load started; outcome arrives as a `PlayerEvent`
    /// * `Err(_)` - Load rejected immediately
    fn load(&mut self, request: LoadRequest) -> Result<()>;

    /// Start or resume rendering
    fn play(&mut self);

    /// Pause rendering
    fn pause(&mut self);

    /// Unload the media
    fn stop(&mut self);

    /// Seek to position from start of media
    fn seek(&mut self, position: Duration);

    /// Current playback position
    fn position(&self) -> Duration;

    /// Measured media duration, once known
    fn duration(&self) -> Option<Duration>;

    /// Position up to which media is buffered
    fn buffered(&self) -> Duration;
}

/// Callback from the media player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerEvent {
    /// Generation of the load this event belongs to
    pub generation: u64,

    /// What happened
    pub kind: PlayerEventKind,
}

/// Media player callback kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEventKind {
    /// Media can play
    Ready,

    /// Player stalled and is rebuffering
    Buffering,

    /// End of media reached
    Ended,

    /// Media failed to load or play
    Error { code: String, message: String },
}

impl PlayerEvent {
    pub fn ready(generation: u64) -> Self {
        Self {
            generation,
            kind: PlayerEventKind::Ready,
        }
    }

    pub fn buffering(generation: u64) -> Self {
        Self {
            generation,
            kind: PlayerEventKind::Buffering,
        }
    }

    pub fn ended(generation: u64) -> Self {
        Self {
            generation,
            kind: PlayerEventKind::Ended,
        }
    }

    pub fn error(generation: u64, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            generation,
            kind: PlayerEventKind::Error {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
