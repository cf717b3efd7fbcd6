//! Session Events
//!
//! Event-based communication with the host. Events are fanned out
//! synchronously, on the control thread, to every registered subscriber in
//! the order the underlying state changes happened:
//! - State changes (idle/buffering/ready/ended)
//! - Track changes (with the reason they happened)
//! - Position updates (periodic, only while playing)
//! - Errors from the resolver or media player

use crate::state::PlaybackState;
use crate::types::TransitionReason;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Events emitted by the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Playback state machine changed state
    PlaybackStateChanged {
        /// The new state
        state: PlaybackState,
    },

    /// A track started loading as the active track
    TrackStarted {
        /// ID of the new (current) track
        track_id: String,
        /// Why the track changed
        reason: TransitionReason,
    },

    /// The outgoing track finished, naturally or by navigation
    ///
    /// Collapsed when emitted within the de-duplication window of the
    /// previous one.
    TrackFinished {
        /// ID of the finished track
        track_id: String,
        /// Position the track was left at
        final_position_ms: u64,
        /// Track duration, if known
        duration_ms: Option<u64>,
    },

    /// Derived "is audio audibly playing" flag flipped
    IsPlayingChanged {
        is_playing: bool,
    },

    /// Position update (periodic, only while playing)
    PositionUpdate {
        /// Current playback position
        position_ms: u64,
        /// Total track duration, if known
        duration_ms: Option<u64>,
        /// Buffered position
        buffered_ms: u64,
    },

    /// Resolve or playback failure
    PlayerError {
        /// Stable error code
        code: String,
        /// Human-readable description
        message: String,
    },

    /// Queue changed (tracks added/removed/reordered)
    QueueChanged {
        /// New queue length
        length: usize,
    },
}

/// Receives session events
///
/// Called on the control thread; implementations should hand work off rather
/// than block.
pub trait SessionSubscriber: Send + Sync {
    fn on_event(&self, event: &SessionEvent);
}

impl<F> SessionSubscriber for F
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent) {
        self(event);
    }
}

/// Handle returned by `EventBus::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Synchronous fan-out to subscribers
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriberId, Arc<dyn SessionSubscriber>)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber
    pub fn subscribe(&mut self, subscriber: Arc<dyn SessionSubscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, subscriber));
        id
    }

    /// Remove a subscriber
    ///
    /// Returns false if `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    /// Deliver `event` to every subscriber, in registration order
    pub fn emit(&self, event: &SessionEvent) {
        for (_, subscriber) in &self.subscribers {
            subscriber.on_event(event);
        }
    }

    /// Number of subscribers
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Check if nobody is listening
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
