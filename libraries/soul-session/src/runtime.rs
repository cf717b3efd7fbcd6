//! Tokio control loop
//!
//! Runs a `SessionController` on its own task so host commands, media player
//! callbacks and timers are all serialized onto one logical thread.
//!
//! ```rust,no_run
//! use soul_session::{
//!     player_event_channel, spawn_session, MemoryStore, SessionConfig, SessionController,
//!     TokioClock,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> soul_session::Result<()> {
//! let controller = SessionController::new(SessionConfig::default(), Box::new(MemoryStore::new()))
//!     .with_clock(Arc::new(TokioClock));
//!
//! // Hand `player_tx` to the platform media player so it can report callbacks
//! let (player_tx, player_rx) = player_event_channel();
//! let (session, _task) = spawn_session(controller, player_rx);
//!
//! session.play().await?;
//! # drop(player_tx);
//! # Ok(())
//! # }
//! ```

use crate::{
    controller::SessionController,
    error::{Result, SessionError},
    events::{SessionSubscriber, SubscriberId},
    player::{MediaPlayer, PlayerEvent},
    snapshot::SessionSnapshot,
    state::PlaybackState,
    types::{BackingIndex, RepeatMode, Track},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

const REQUEST_BUFFER: usize = 100;

/// Sender for media player callbacks
pub type PlayerEventSender = mpsc::UnboundedSender<PlayerEvent>;

/// Receiving end consumed by `spawn_session`
pub type PlayerEventReceiver = mpsc::UnboundedReceiver<PlayerEvent>;

/// Create the channel media player callbacks travel on
///
/// Sending never blocks, so player implementations can report from any
/// thread.
pub fn player_event_channel() -> (PlayerEventSender, PlayerEventReceiver) {
    mpsc::unbounded_channel()
}

/// Mutating host commands
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Play,
    Pause,
    SeekTo(Duration),
    SkipTo(usize),
    SkipToNext,
    SkipToPrevious,
    AddToEnd {
        tracks: Vec<Track>,
        start_from_id: Option<String>,
        clear_queue: bool,
    },
    PlayNext(Track),
    RemoveTrack(usize),
    MoveTrack {
        from: usize,
        to: usize,
    },
    Clear,
    SetRepeatMode(RepeatMode),
    SetShuffleMode(bool),
    SetSleepTimer(Duration),
    CancelSleepTimer,
}

impl SessionCommand {
    /// Run the command against a controller
    pub fn apply(self, controller: &mut SessionController) -> Result<()> {
        match self {
            Self::Play => controller.play(),
            Self::Pause => controller.pause(),
            Self::SeekTo(position) => controller.seek_to(position),
            Self::SkipTo(index) => controller.skip_to(index),
            Self::SkipToNext => controller.skip_to_next(),
            Self::SkipToPrevious => controller.skip_to_previous(),
            Self::AddToEnd {
                tracks,
                start_from_id,
                clear_queue,
            } => controller.add_to_end(tracks, start_from_id.as_deref(), clear_queue),
            Self::PlayNext(track) => {
                controller.play_next(track);
                Ok(())
            }
            Self::RemoveTrack(index) => controller.remove_track(index),
            Self::MoveTrack { from, to } => controller.move_track(from, to),
            Self::Clear => {
                controller.clear();
                Ok(())
            }
            Self::SetRepeatMode(mode) => {
                controller.set_repeat_mode(mode);
                Ok(())
            }
            Self::SetShuffleMode(enabled) => {
                controller.set_shuffle_mode(enabled);
                Ok(())
            }
            Self::SetSleepTimer(duration) => {
                controller.set_sleep_timer(duration);
                Ok(())
            }
            Self::CancelSleepTimer => {
                controller.cancel_sleep_timer();
                Ok(())
            }
        }
    }
}

type Job = Box<dyn FnOnce(&mut SessionController) + Send>;

enum Request {
    Command(SessionCommand, oneshot::Sender<Result<()>>),
    With(Job),
}

/// Cloneable handle to a running session
///
/// Every call fails with `NotInitialized` once the loop has stopped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    requests: mpsc::Sender<Request>,
}

/// Spawn the control loop on the current tokio runtime
///
/// The loop stops when every `SessionHandle` is dropped. Give the controller
/// a `TokioClock` so timers follow tokio time.
pub fn spawn_session(
    controller: SessionController,
    player_events: PlayerEventReceiver,
) -> (SessionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(REQUEST_BUFFER);
    let task = tokio::spawn(run_session(controller, rx, player_events));
    (SessionHandle { requests: tx }, task)
}

async fn run_session(
    mut controller: SessionController,
    mut requests: mpsc::Receiver<Request>,
    mut player_events: PlayerEventReceiver,
) {
    let period = controller
        .config()
        .position_update_interval()
        .max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut player_open = true;

    info!("Session loop started");

    loop {
        let deadline = controller.sleep_timer_deadline();

        tokio::select! {
            request = requests.recv() => match request {
                Some(Request::Command(command, reply)) => {
                    debug!("Command {:?}", command);
                    let _ = reply.send(command.apply(&mut controller));
                }
                Some(Request::With(job)) => job(&mut controller),
                None => break,
            },
            event = player_events.recv(), if player_open => match event {
                Some(event) => controller.handle_player_event(event),
                None => {
                    debug!("Player event channel closed");
                    player_open = false;
                }
            },
            _ = ticker.tick() => controller.tick(),
            () = sleep_until(deadline) => controller.tick(),
        }
    }

    info!("Session loop stopped");
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

impl SessionHandle {
    /// Send a command and wait for its result
    pub async fn send(&self, command: SessionCommand) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(Request::Command(command, tx))
            .await
            .map_err(|_| SessionError::NotInitialized)?;
        rx.await.map_err(|_| SessionError::NotInitialized)?
    }

    /// Run `f` on the control loop and return its result
    pub async fn with<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SessionController) -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |controller| {
            let _ = tx.send(f(controller));
        });
        self.requests
            .send(Request::With(job))
            .await
            .map_err(|_| SessionError::NotInitialized)?;
        rx.await.map_err(|_| SessionError::NotInitialized)
    }

    // ===== Commands =====

    pub async fn play(&self) -> Result<()> {
        self.send(SessionCommand::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(SessionCommand::Pause).await
    }

    pub async fn seek_to(&self, position: Duration) -> Result<()> {
        self.send(SessionCommand::SeekTo(position)).await
    }

    pub async fn skip_to(&self, index: usize) -> Result<()> {
        self.send(SessionCommand::SkipTo(index)).await
    }

    pub async fn skip_to_next(&self) -> Result<()> {
        self.send(SessionCommand::SkipToNext).await
    }

    pub async fn skip_to_previous(&self) -> Result<()> {
        self.send(SessionCommand::SkipToPrevious).await
    }

    pub async fn add_to_end(
        &self,
        tracks: Vec<Track>,
        start_from_id: Option<String>,
        clear_queue: bool,
    ) -> Result<()> {
        self.send(SessionCommand::AddToEnd {
            tracks,
            start_from_id,
            clear_queue,
        })
        .await
    }

    pub async fn play_next(&self, track: Track) -> Result<()> {
        self.send(SessionCommand::PlayNext(track)).await
    }

    pub async fn remove_track(&self, index: usize) -> Result<()> {
        self.send(SessionCommand::RemoveTrack(index)).await
    }

    pub async fn move_track(&self, from: usize, to: usize) -> Result<()> {
        self.send(SessionCommand::MoveTrack { from, to }).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.send(SessionCommand::Clear).await
    }

    pub async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
        self.send(SessionCommand::SetRepeatMode(mode)).await
    }

    pub async fn set_shuffle_mode(&self, enabled: bool) -> Result<()> {
        self.send(SessionCommand::SetShuffleMode(enabled)).await
    }

    pub async fn set_sleep_timer(&self, duration: Duration) -> Result<()> {
        self.send(SessionCommand::SetSleepTimer(duration)).await
    }

    pub async fn cancel_sleep_timer(&self) -> Result<()> {
        self.send(SessionCommand::CancelSleepTimer).await
    }

    /// Attach the media player
    pub async fn set_media_player(&self, player: Box<dyn MediaPlayer>) -> Result<()> {
        self.with(move |c| c.set_media_player(player)).await
    }

    /// Restore the saved session, see `SessionController::restore`
    pub async fn restore(&self) -> Result<bool> {
        self.with(SessionController::restore).await?
    }

    pub async fn subscribe(&self, subscriber: Arc<dyn SessionSubscriber>) -> Result<SubscriberId> {
        self.with(move |c| c.subscribe(subscriber)).await
    }

    pub async fn unsubscribe(&self, id: SubscriberId) -> Result<bool> {
        self.with(move |c| c.unsubscribe(id)).await
    }

    // ===== Queries =====

    pub async fn get_sleep_timer_remaining(&self) -> Result<Option<Duration>> {
        self.with(|c| c.get_sleep_timer_remaining()).await
    }

    pub async fn get_queue(&self) -> Result<Vec<Track>> {
        self.with(|c| c.get_queue().to_vec()).await
    }

    pub async fn get_upcoming(&self) -> Result<Vec<Track>> {
        self.with(|c| c.get_upcoming().into_iter().cloned().collect())
            .await
    }

    pub async fn get_current_track(&self) -> Result<Option<Track>> {
        self.with(|c| c.get_current_track().cloned()).await
    }

    pub async fn get_index_track(&self, index: usize) -> Result<Option<Track>> {
        self.with(move |c| c.get_index_track(index).cloned()).await
    }

    pub async fn get_current_index(&self) -> Result<Option<BackingIndex>> {
        self.with(|c| c.get_current_index()).await
    }

    pub async fn get_next_track(&self) -> Result<Option<Track>> {
        self.with(|c| c.get_next_track().cloned()).await
    }

    pub async fn get_position(&self) -> Result<Duration> {
        self.with(|c| c.get_position()).await
    }

    pub async fn get_duration(&self) -> Result<Option<Duration>> {
        self.with(|c| c.get_duration()).await
    }

    pub async fn get_buffered(&self) -> Result<Duration> {
        self.with(|c| c.get_buffered()).await
    }

    pub async fn is_playing(&self) -> Result<bool> {
        self.with(|c| c.is_playing()).await
    }

    pub async fn get_repeat_mode(&self) -> Result<RepeatMode> {
        self.with(|c| c.get_repeat_mode()).await
    }

    pub async fn get_shuffle_mode(&self) -> Result<bool> {
        self.with(|c| c.get_shuffle_mode()).await
    }

    pub async fn get_state(&self) -> Result<PlaybackState> {
        self.with(|c| c.get_state()).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.with(|c| c.snapshot()).await
    }
}
