//! Playback state machine
//!
//! Tracks the logical state of the loaded media. It is fed facts by the
//! session controller (commands and media player callbacks) and never polls.
//!
//! ```text
//!          load            ready
//!  Idle ─────────▶ Buffering ───────▶ Ready ──── ended ───▶ Ended
//!   ▲                  ▲    ◀── stalled ─┘                    │
//!   └──── error / clear (from any state)    ready (after seek)┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing loaded, or the last load failed
    #[default]
    Idle,

    /// Loading or rebuffering
    Buffering,

    /// Media can play
    Ready,

    /// Media reached its end
    Ended,
}

/// Fact fed into the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackInput {
    /// Controller started loading a track
    Load,

    /// Player can render
    Ready,

    /// Player ran out of buffered data
    Stalled,

    /// Player reached the end of the media
    Ended,

    /// Player or resolver failed
    Error,

    /// Queue emptied
    Clear,
}

/// State change produced by an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PlaybackState,
    pub to: PlaybackState,
}

/// Finite state machine over `PlaybackState`
#[derive(Debug, Clone, Default)]
pub struct PlaybackStateMachine {
    state: PlaybackState,
}

impl PlaybackStateMachine {
    /// Create a machine in `Idle`
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Apply an input
    ///
    /// Returns the transition if the state changed. Inputs that make no sense
    /// in the current state (e.g. `Stalled` while `Idle`) are ignored.
    pub fn apply(&mut self, input: PlaybackInput) -> Option<Transition> {
        use PlaybackState::{Buffering, Ended, Idle, Ready};

        let next = match (self.state, input) {
            (_, PlaybackInput::Load) => Buffering,
            (_, PlaybackInput::Clear) => Idle,
            (Buffering | Ended, PlaybackInput::Ready) => Ready,
            (Ready, PlaybackInput::Stalled) => Buffering,
            (Buffering | Ready, PlaybackInput::Ended) => Ended,
            (Buffering | Ready | Ended, PlaybackInput::Error) => Idle,
            (state, input) => {
                trace!("Ignoring {:?} while {:?}", input, state);
                return None;
            }
        };

        if next == self.state {
            return None;
        }

        let transition = Transition {
            from: self.state,
            to: next,
        };
        self.state = next;
        Some(transition)
    }

    /// Start loading
    pub fn load(&mut self) -> Option<Transition> {
        self.apply(PlaybackInput::Load)
    }

    /// Player ready
    pub fn on_ready(&mut self) -> Option<Transition> {
        self.apply(PlaybackInput::Ready)
    }

    /// Player stalled
    pub fn on_stalled(&mut self) -> Option<Transition> {
        self.apply(PlaybackInput::Stalled)
    }

    /// Player reached the end
    pub fn on_ended(&mut self) -> Option<Transition> {
        self.apply(PlaybackInput::Ended)
    }

    /// Player failed
    pub fn on_error(&mut self) -> Option<Transition> {
        self.apply(PlaybackInput::Error)
    }

    /// Queue emptied
    pub fn clear(&mut self) -> Option<Transition> {
        self.apply(PlaybackInput::Clear)
    }
}
