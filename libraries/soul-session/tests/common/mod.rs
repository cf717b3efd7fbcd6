//! Shared test fixtures: a scriptable media player, a recording subscriber
//! and a harness wiring them to a controller on a manual clock.

#![allow(dead_code)]

use soul_session::{
    LoadRequest, ManualClock, MediaPlayer, MemoryStore, PlayerEvent, PlayerEventSender, Result,
    SessionConfig, SessionController, SessionError, SessionEvent, SessionSubscriber, Track,
    TransitionReason,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn create_test_track(id: &str) -> Track {
    Track::new(id, format!("soul://track/{}", id))
        .with_title(format!("Track {}", id))
        .with_artist("Test Artist")
        .with_duration(Duration::from_secs(180))
}

pub fn create_test_tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| create_test_track(id)).collect()
}

// ===== Fake media player =====

/// Everything the session asked the player to do
#[derive(Debug, Default)]
pub struct PlayerLog {
    pub loads: Vec<LoadRequest>,
    pub plays: usize,
    pub pauses: usize,
    pub stops: usize,
    pub seeks: Vec<Duration>,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub buffered: Duration,
    pub reject_loads: bool,
}

/// Scriptable player; clones share one log
///
/// With a sender attached, every load is answered with `Ready`.
#[derive(Clone, Default)]
pub struct FakePlayer {
    log: Arc<Mutex<PlayerLog>>,
    events: Option<PlayerEventSender>,
}

impl FakePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reporting(events: PlayerEventSender) -> Self {
        Self {
            log: Arc::default(),
            events: Some(events),
        }
    }

    pub fn log(&self) -> MutexGuard<'_, PlayerLog> {
        self.log.lock().unwrap()
    }

    pub fn last_generation(&self) -> u64 {
        self.log()
            .loads
            .last()
            .map(|request| request.generation)
            .expect("nothing loaded")
    }

    pub fn loaded_uris(&self) -> Vec<String> {
        self.log().loads.iter().map(|r| r.uri.clone()).collect()
    }

    pub fn set_position(&self, position: Duration) {
        self.log().position = position;
    }
}

impl MediaPlayer for FakePlayer {
    fn load(&mut self, request: LoadRequest) -> Result<()> {
        let mut log = self.log();
        if log.reject_loads {
            return Err(SessionError::LoadFailed {
                code: "unsupported".to_string(),
                message: "codec not supported".to_string(),
            });
        }

        let generation = request.generation;
        log.loads.push(request);
        log.position = Duration::ZERO;
        drop(log);

        if let Some(events) = &self.events {
            let _ = events.send(PlayerEvent::ready(generation));
        }
        Ok(())
    }

    fn play(&mut self) {
        self.log().plays += 1;
    }

    fn pause(&mut self) {
        self.log().pauses += 1;
    }

    fn stop(&mut self) {
        self.log().stops += 1;
    }

    fn seek(&mut self, position: Duration) {
        let mut log = self.log();
        log.seeks.push(position);
        log.position = position;
    }

    fn position(&self) -> Duration {
        self.log().position
    }

    fn duration(&self) -> Option<Duration> {
        self.log().duration
    }

    fn buffered(&self) -> Duration {
        self.log().buffered
    }
}

// ===== Recording subscriber =====

#[derive(Default)]
pub struct RecordingSubscriber {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingSubscriber {
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn track_started(&self) -> Vec<(String, TransitionReason)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::TrackStarted { track_id, reason } => Some((track_id, reason)),
                _ => None,
            })
            .collect()
    }

    pub fn track_finished(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::TrackFinished { track_id, .. } => Some(track_id),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&SessionEvent) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }
}

impl SessionSubscriber for RecordingSubscriber {
    fn on_event(&self, event: &SessionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ===== Harness =====

pub struct Harness {
    pub session: SessionController,
    pub player: FakePlayer,
    pub events: Arc<RecordingSubscriber>,
    pub clock: ManualClock,
    pub store: MemoryStore,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: MemoryStore) -> Self {
        Self::build(SessionConfig::default(), store, true)
    }

    /// Harness whose controller has no media player attached
    pub fn without_player() -> Self {
        Self::build(SessionConfig::default(), MemoryStore::new(), false)
    }

    fn build(config: SessionConfig, store: MemoryStore, attach_player: bool) -> Self {
        init_tracing();

        let clock = ManualClock::new();
        let player = FakePlayer::new();
        let events = Arc::new(RecordingSubscriber::default());

        let mut session = SessionController::new(config, Box::new(store.clone()))
            .with_clock(Arc::new(clock.clone()))
            .with_shuffle_seed(7);
        session.subscribe(events.clone());
        if attach_player {
            session.set_media_player(Box::new(player.clone()));
        }

        Self {
            session,
            player,
            events,
            clock,
            store,
        }
    }

    /// Replace the queue with `ids` without starting playback
    pub fn queue(&mut self, ids: &[&str]) {
        self.session
            .add_to_end(create_test_tracks(ids), None, true)
            .unwrap();
    }

    /// Report `Ready` for the latest load
    pub fn ready(&mut self) {
        let generation = self.player.last_generation();
        self.session.handle_player_event(PlayerEvent::ready(generation));
    }

    /// Report end of media for the latest load
    pub fn ended(&mut self) {
        let generation = self.player.last_generation();
        self.session.handle_player_event(PlayerEvent::ended(generation));
    }

    /// Queue `ids`, start playing the first and report it ready
    pub fn playing(ids: &[&str]) -> Self {
        let mut harness = Self::new();
        harness.queue(ids);
        harness.session.play().unwrap();
        harness.ready();
        harness
    }

    pub fn current_id(&self) -> Option<String> {
        self.session.get_current_track().map(|t| t.id.clone())
    }
}
