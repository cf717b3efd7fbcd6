//! Soul Player - Playback Session
//!
//! Platform-agnostic playback session engine for Soul Player.
//!
//! This crate provides:
//! - Track queue with a shuffle permutation over a stable backing order
//! - Repeat modes (Off, Track, Queue) and auto-advance
//! - Playback state machine (idle/buffering/ready/ended)
//! - Sleep timer
//! - Event fan-out to host subscribers
//! - Session snapshot persistence and restore
//! - A tokio control loop serializing commands, player callbacks and timers
//!
//! # Architecture
//!
//! `soul-session` never touches audio output or the network. The native media
//! framework, URL resolution and key-value storage are provided through the
//! `MediaPlayer`, `UrlResolver` and `KeyValueStore` traits. Media player
//! callbacks are tagged with the generation of the load they belong to, so
//! callbacks from a superseded load are ignored.
//!
//! # Example: Basic Session
//!
//! ```rust
//! use soul_session::{
//!     LoadRequest, MediaPlayer, MemoryStore, PlaybackState, PlayerEvent, Result,
//!     SessionConfig, SessionController, Track,
//! };
//! use std::time::Duration;
//!
//! // Implement MediaPlayer for your platform
//! #[derive(Default)]
//! struct MyPlayer {
//!     generation: u64,
//! }
//!
//! impl MediaPlayer for MyPlayer {
//!     fn load(&mut self, request: LoadRequest) -> Result<()> {
//!         // Start loading; report readiness later with `request.generation`
//!         self.generation = request.generation;
//!         Ok(())
//!     }
//!     fn play(&mut self) {}
//!     fn pause(&mut self) {}
//!     fn stop(&mut self) {}
//!     fn seek(&mut self, _position: Duration) {}
//!     fn position(&self) -> Duration {
//!         Duration::ZERO
//!     }
//!     fn duration(&self) -> Option<Duration> {
//!         None
//!     }
//!     fn buffered(&self) -> Duration {
//!         Duration::ZERO
//!     }
//! }
//!
//! let mut session =
//!     SessionController::new(SessionConfig::default(), Box::new(MemoryStore::new()));
//! session.set_media_player(Box::new(MyPlayer::default()));
//!
//! session.add_to_end(
//!     vec![
//!         Track::new("1", "file:///music/one.flac").with_title("One"),
//!         Track::new("2", "file:///music/two.flac").with_title("Two"),
//!     ],
//!     None,
//!     true,
//! )?;
//!
//! session.play()?;
//! assert_eq!(session.get_state(), PlaybackState::Buffering);
//!
//! // The player reports back on the control thread
//! session.handle_player_event(PlayerEvent::ready(1));
//! assert!(session.is_playing());
//! # Ok::<(), soul_session::SessionError>(())
//! ```
//!
//! # Example: Shuffle, Repeat and Sleep Timer
//!
//! ```rust
//! use soul_session::{MemoryStore, RepeatMode, SessionConfig, SessionController};
//! use std::time::Duration;
//!
//! let mut session =
//!     SessionController::new(SessionConfig::default(), Box::new(MemoryStore::new()));
//!
//! session.set_shuffle_mode(true);
//! session.set_repeat_mode(RepeatMode::Queue);
//! session.set_sleep_timer(Duration::from_secs(30 * 60));
//!
//! assert!(session.get_sleep_timer_remaining().is_some());
//! ```

mod clock;
mod controller;
mod error;
mod events;
mod player;
mod queue;
mod runtime;
pub mod shuffle;
mod sleep_timer;
mod snapshot;
pub mod state;
mod store;
pub mod types;

// Public exports
pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use controller::SessionController;
pub use error::{Result, SessionError};
pub use events::{EventBus, SessionEvent, SessionSubscriber, SubscriberId};
pub use player::{
    LoadRequest, MediaPlayer, PassthroughResolver, PlayerEvent, PlayerEventKind, ResolvedUri,
    UrlResolver,
};
pub use queue::TrackQueue;
pub use runtime::{
    player_event_channel, spawn_session, PlayerEventReceiver, PlayerEventSender, SessionCommand,
    SessionHandle,
};
pub use sleep_timer::SleepTimer;
pub use snapshot::{SessionSnapshot, SNAPSHOT_VERSION};
pub use state::{PlaybackState, PlaybackStateMachine};
pub use store::{KeyValueStore, MemoryStore};
pub use types::{
    BackingIndex, PlaybackIndex, RepeatMode, SessionConfig, Track, TransitionReason,
};
