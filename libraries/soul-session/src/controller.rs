//! Session controller - core orchestration
//!
//! Coordinates queue, playback state machine, sleep timer, media player and
//! persistence. Every method runs on the session's control thread; media
//! player callbacks arrive through `handle_player_event` and time-based work
//! through `tick`.

use crate::{
    clock::{Clock, SystemClock},
    error::{Result, SessionError},
    events::{EventBus, SessionEvent, SessionSubscriber, SubscriberId},
    player::{
        LoadRequest, MediaPlayer, PassthroughResolver, PlayerEvent, PlayerEventKind, UrlResolver,
    },
    queue::TrackQueue,
    sleep_timer::SleepTimer,
    snapshot::{SessionSnapshot, SNAPSHOT_VERSION},
    state::{PlaybackState, PlaybackStateMachine, Transition},
    store::KeyValueStore,
    types::{BackingIndex, RepeatMode, SessionConfig, Track, TransitionReason},
};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Media currently handed to the player
#[derive(Debug, Clone)]
struct LoadedTrack {
    generation: u64,
    track_id: String,
}

/// Central session management
///
/// Orchestrates:
/// - Queue management (backing order + shuffle permutation)
/// - Playback state machine (idle/buffering/ready/ended)
/// - Auto-advance under repeat mode
/// - Sleep timer
/// - Event fan-out to subscribers
/// - Snapshot persistence and restore
pub struct SessionController {
    config: SessionConfig,

    // Queue and state
    queue: TrackQueue,
    machine: PlaybackStateMachine,
    sleep_timer: SleepTimer,
    repeat: RepeatMode,

    // Collaborators
    player: Option<Box<dyn MediaPlayer>>,
    resolver: Box<dyn UrlResolver>,
    store: Box<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    events: EventBus,

    // Load tracking; callbacks from older generations are ignored
    generation: u64,
    loaded: Option<LoadedTrack>,

    // User intent to play once the media is ready
    play_when_ready: bool,
    is_playing: bool,

    // Seek applied when the loaded media becomes ready
    pending_seek: Option<Duration>,
    // Position restored from a snapshot, used by the next implicit load
    resume_at: Option<Duration>,

    last_finish_at: Option<Instant>,
    last_position_at: Option<Instant>,
    last_snapshot_at: Option<Instant>,
}

impl SessionController {
    /// Create new session controller
    ///
    /// A media player must be attached with `set_media_player` before
    /// playback commands succeed; queue edits work without one.
    pub fn new(config: SessionConfig, store: Box<dyn KeyValueStore>) -> Self {
        let mut queue = TrackQueue::new();
        queue.set_shuffle(config.shuffle);

        Self {
            repeat: config.repeat,
            config,
            queue,
            machine: PlaybackStateMachine::new(),
            sleep_timer: SleepTimer::new(),
            player: None,
            resolver: Box::new(PassthroughResolver),
            store,
            clock: Arc::new(SystemClock),
            events: EventBus::new(),
            generation: 0,
            loaded: None,
            play_when_ready: false,
            is_playing: false,
            pending_seek: None,
            resume_at: None,
            last_finish_at: None,
            last_position_at: None,
            last_snapshot_at: None,
        }
    }

    /// Use a different time source
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a URL resolver other than the passthrough default
    #[must_use]
    pub fn with_url_resolver(mut self, resolver: Box<dyn UrlResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Make shuffle permutations deterministic
    #[must_use]
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        let mut queue = TrackQueue::with_seed(seed);
        queue.set_shuffle(self.queue.is_shuffled());
        self.queue = queue;
        self
    }

    /// Attach the media player
    ///
    /// Replacing a player unloads whatever the old one was playing.
    pub fn set_media_player(&mut self, player: Box<dyn MediaPlayer>) {
        if self.loaded.is_some() {
            self.unload();
        }
        self.player = Some(player);
    }

    /// Check if a media player is attached
    pub fn has_media_player(&self) -> bool {
        self.player.is_some()
    }

    /// Register an event subscriber
    pub fn subscribe(&mut self, subscriber: Arc<dyn SessionSubscriber>) -> SubscriberId {
        self.events.subscribe(subscriber)
    }

    /// Remove an event subscriber
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.events.unsubscribe(id)
    }

    // ===== Playback Control =====

    /// Start or resume playback
    ///
    /// Loads the current track first if nothing is loaded. At the end of the
    /// queue, restarts the current track.
    pub fn play(&mut self) -> Result<()> {
        self.require_player()?;
        self.play_when_ready = true;

        if self.loaded.is_none() {
            return self.start_track(TransitionReason::PlaylistChanged);
        }

        let at_end = self.machine.state() == PlaybackState::Ended;
        if let Some(player) = self.player.as_mut() {
            if at_end {
                player.seek(Duration::ZERO);
            }
            player.play();
        }

        self.refresh_is_playing();
        Ok(())
    }

    /// Pause playback
    ///
    /// Loads the current track paused if nothing is loaded.
    pub fn pause(&mut self) -> Result<()> {
        self.require_player()?;
        self.play_when_ready = false;

        if self.loaded.is_none() {
            return self.start_track(TransitionReason::PlaylistChanged);
        }

        if let Some(player) = self.player.as_mut() {
            player.pause();
        }

        self.refresh_is_playing();
        Ok(())
    }

    /// Seek within the current track
    pub fn seek_to(&mut self, position: Duration) -> Result<()> {
        self.require_player()?;

        if self.loaded.is_none() {
            debug!("Ignoring seek to {:?}: nothing loaded", position);
            return Ok(());
        }

        self.pending_seek = None;
        if let Some(player) = self.player.as_mut() {
            player.seek(position);
        }
        Ok(())
    }

    /// Skip to next track
    ///
    /// Does nothing at the end of the queue when repeat is off.
    pub fn skip_to_next(&mut self) -> Result<()> {
        self.require_player()?;

        match self.queue.next(self.repeat) {
            Some(next) => self.change_track(next, TransitionReason::Seek),
            None => {
                debug!("End of queue, ignoring skip to next");
                Ok(())
            }
        }
    }

    /// Go to previous track
    ///
    /// If more than 3 seconds into the current track (configurable), restarts
    /// it instead. At the start of the queue with repeat off, also restarts.
    pub fn skip_to_previous(&mut self) -> Result<()> {
        self.require_player()?;

        if self.loaded.is_some() && self.get_position() > self.config.restart_threshold() {
            debug!("Restarting current track");
            self.restart_current();
            return Ok(());
        }

        match self.queue.previous(self.repeat) {
            Some(previous) => self.change_track(previous, TransitionReason::Seek),
            None => {
                debug!("Start of queue, restarting current track");
                self.restart_current();
                Ok(())
            }
        }
    }

    /// Jump to the track at a backing index
    ///
    /// Out-of-range indices are ignored.
    pub fn skip_to(&mut self, index: usize) -> Result<()> {
        self.require_player()?;

        let index = BackingIndex(index);
        if self.queue.at(index).is_none() {
            debug!("Ignoring skip to invalid index {}", index);
            return Ok(());
        }

        self.change_track(index, TransitionReason::Seek)
    }

    // ===== Queue Management =====

    /// Add tracks to the queue
    ///
    /// With `clear_queue` the tracks replace the queue. If `start_from_id`
    /// names a track in the resulting queue, playback jumps to it.
    pub fn add_to_end(
        &mut self,
        tracks: Vec<Track>,
        start_from_id: Option<&str>,
        clear_queue: bool,
    ) -> Result<()> {
        debug!(
            "Adding {} tracks (clear: {}, start: {:?})",
            tracks.len(),
            clear_queue,
            start_from_id
        );

        if clear_queue {
            let start = start_from_id
                .and_then(|id| tracks.iter().position(|t| t.id == id))
                .unwrap_or(0);
            let shuffle = self.queue.is_shuffled();
            self.queue.set_queue(tracks, start, shuffle);
            self.resume_at = None;
        } else {
            self.queue.append(tracks);
        }
        self.emit_queue_changed();

        let target = start_from_id.and_then(|id| self.queue.position_of(id));
        match target {
            Some(index) if self.player.is_some() => {
                return self.change_track(index, TransitionReason::PlaylistChanged);
            }
            Some(index) => {
                self.queue.skip_to(index);
            }
            // The loaded media belonged to the replaced queue
            None if clear_queue => self.unload(),
            None => {}
        }

        self.persist();
        Ok(())
    }

    /// Queue a track to play right after the current one
    pub fn play_next(&mut self, track: Track) {
        debug!("Queueing {} to play next", track.id);
        self.queue.insert_next(track);
        self.emit_queue_changed();
        self.persist();
    }

    /// Remove the track at a backing index
    ///
    /// Removing the playing track loads its successor, or stops when the
    /// queue becomes empty. A finished session loads the successor paused.
    /// Out-of-range indices are ignored.
    pub fn remove_track(&mut self, index: usize) -> Result<()> {
        let index = BackingIndex(index);
        if self.queue.at(index).is_none() {
            debug!("Ignoring removal of invalid index {}", index);
            return Ok(());
        }

        let removed_current = self.queue.remove_at(index);
        self.emit_queue_changed();

        if removed_current {
            self.resume_at = None;
            if self.loaded.is_some() {
                if self.queue.is_empty() {
                    self.unload();
                } else {
                    if self.machine.state() == PlaybackState::Ended {
                        self.play_when_ready = false;
                    }
                    return self.start_track(TransitionReason::PlaylistChanged);
                }
            }
        }

        self.persist();
        Ok(())
    }

    /// Move a track within the queue
    pub fn move_track(&mut self, from: usize, to: usize) -> Result<()> {
        self.queue.move_item(BackingIndex(from), BackingIndex(to))?;
        self.emit_queue_changed();
        self.persist();
        Ok(())
    }

    /// Clear the queue and stop playback
    pub fn clear(&mut self) {
        info!("Clearing session queue");
        self.queue.clear();
        self.resume_at = None;
        self.unload();
        self.emit_queue_changed();
        self.persist();
    }

    // ===== Shuffle & Repeat =====

    /// Set repeat mode
    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        debug!("Repeat mode {}", mode);
        self.repeat = mode;
        self.persist();
    }

    /// Enable or disable shuffle without interrupting playback
    pub fn set_shuffle_mode(&mut self, enabled: bool) {
        debug!("Shuffle {}", if enabled { "on" } else { "off" });
        self.queue.set_shuffle(enabled);
        self.persist();
    }

    // ===== Sleep Timer =====

    /// Pause playback after `duration`
    pub fn set_sleep_timer(&mut self, duration: Duration) {
        info!("Sleep timer set for {:?}", duration);
        self.sleep_timer.start(duration, self.clock.now());
    }

    /// Cancel the sleep timer
    pub fn cancel_sleep_timer(&mut self) {
        if self.sleep_timer.cancel() {
            info!("Sleep timer cancelled");
        }
    }

    /// Time left on the sleep timer
    pub fn get_sleep_timer_remaining(&self) -> Option<Duration> {
        self.sleep_timer.remaining(self.clock.now())
    }

    /// Instant the sleep timer fires, for schedulers
    pub fn sleep_timer_deadline(&self) -> Option<Instant> {
        self.sleep_timer.deadline()
    }

    // ===== Player Callbacks & Time =====

    /// Feed a media player callback into the session
    ///
    /// Callbacks for superseded loads are dropped.
    pub fn handle_player_event(&mut self, event: PlayerEvent) {
        if self.loaded.is_none() || event.generation != self.generation {
            debug!(
                "Dropping stale player event {:?} (generation {}, current {})",
                event.kind, event.generation, self.generation
            );
            return;
        }

        match event.kind {
            PlayerEventKind::Ready => {
                let transition = self.machine.on_ready();
                self.emit_transition(transition);

                if let Some(position) = self.pending_seek.take() {
                    if let Some(player) = self.player.as_mut() {
                        player.seek(position);
                    }
                }
                self.refresh_is_playing();
            }
            PlayerEventKind::Buffering => {
                let transition = self.machine.on_stalled();
                self.emit_transition(transition);
                self.refresh_is_playing();
            }
            PlayerEventKind::Ended => {
                let transition = self.machine.on_ended();
                self.emit_transition(transition);
                self.refresh_is_playing();

                if transition.is_some() {
                    self.auto_advance();
                }
            }
            PlayerEventKind::Error { code, message } => {
                self.fail(SessionError::LoadFailed { code, message });
            }
        }
    }

    /// Run time-based work
    ///
    /// Fires the sleep timer, and while playing emits position updates and
    /// writes periodic snapshots. Call at least every position update
    /// interval.
    pub fn tick(&mut self) {
        let now = self.clock.now();

        if self.sleep_timer.poll(now) {
            info!("Sleep timer fired, pausing playback");
            if let Err(e) = self.pause() {
                warn!("Sleep timer could not pause: {}", e);
            }
        }

        if !self.is_playing {
            return;
        }

        if is_due(self.last_position_at, now, self.config.position_update_interval()) {
            self.last_position_at = Some(now);
            self.emit_position_update();
        }

        if is_due(self.last_snapshot_at, now, self.config.snapshot_interval()) {
            self.persist();
        }
    }

    // ===== Persistence =====

    /// Current state as a snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        let position = if self.loaded.is_some() {
            self.pending_seek.unwrap_or_else(|| self.get_position())
        } else {
            self.resume_at.unwrap_or(Duration::ZERO)
        };

        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            backing: self.queue.all().to_vec(),
            current_index: self.queue.current_index(),
            position_ms: millis(position),
            repeat_mode: self.repeat,
            shuffle_enabled: self.queue.is_shuffled(),
        }
    }

    /// Restore the saved session
    ///
    /// Call once at startup. Returns whether a session was restored; a
    /// corrupt snapshot counts as no session. With a media player attached
    /// the restored track is loaded paused at its saved position.
    pub fn restore(&mut self) -> Result<bool> {
        let snapshot = match SessionSnapshot::load(self.store.as_ref(), &self.config.snapshot_key) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("No saved session");
                return Ok(false);
            }
            Err(SessionError::PersistenceCorrupt(reason)) => {
                warn!("Ignoring corrupt saved session: {}", reason);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        info!(
            "Restoring session with {} tracks at {:?}",
            snapshot.backing.len(),
            snapshot.current_index
        );

        self.unload();
        let start = snapshot.current_index.map_or(0, BackingIndex::get);
        self.queue.set_queue(snapshot.backing, start, snapshot.shuffle_enabled);
        self.repeat = snapshot.repeat_mode;
        self.resume_at =
            (snapshot.position_ms > 0).then(|| Duration::from_millis(snapshot.position_ms));
        self.emit_queue_changed();

        if self.player.is_some() && !self.queue.is_empty() {
            self.play_when_ready = false;
            self.start_track(TransitionReason::PlaylistChanged)?;
        }

        Ok(true)
    }

    // ===== State Queries =====

    /// Get current playback state
    pub fn get_state(&self) -> PlaybackState {
        self.machine.state()
    }

    /// Get all tracks in backing (unshuffled) order
    pub fn get_queue(&self) -> &[Track] {
        self.queue.all()
    }

    /// Get tracks in the order they will be heard
    pub fn get_upcoming(&self) -> Vec<&Track> {
        self.queue
            .playback_order()
            .into_iter()
            .filter_map(|index| self.queue.at(index))
            .collect()
    }

    /// Get currently selected track
    pub fn get_current_track(&self) -> Option<&Track> {
        self.queue.current()
    }

    /// Get track at a backing index
    pub fn get_index_track(&self, index: usize) -> Option<&Track> {
        self.queue.at(BackingIndex(index))
    }

    /// Get backing index of the current track
    pub fn get_current_index(&self) -> Option<BackingIndex> {
        self.queue.current_index()
    }

    /// Peek at the track that plays after the current one
    ///
    /// Used by platform code to preload.
    pub fn get_next_track(&self) -> Option<&Track> {
        self.queue.peek_next(self.repeat)
    }

    /// Get current playback position
    pub fn get_position(&self) -> Duration {
        match (&self.loaded, &self.player) {
            (Some(_), Some(player)) => player.position(),
            _ => self.resume_at.unwrap_or(Duration::ZERO),
        }
    }

    /// Get current track duration
    ///
    /// The player's measurement wins over the track's hint.
    pub fn get_duration(&self) -> Option<Duration> {
        let measured = match (&self.loaded, &self.player) {
            (Some(_), Some(player)) => player.duration(),
            _ => None,
        };
        measured.or_else(|| self.queue.current().and_then(|t| t.duration))
    }

    /// Get buffered position
    pub fn get_buffered(&self) -> Duration {
        match (&self.loaded, &self.player) {
            (Some(_), Some(player)) => player.buffered(),
            _ => Duration::ZERO,
        }
    }

    /// Check if audio is playing (play requested and media ready)
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Get current repeat mode
    pub fn get_repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    /// Check if shuffle is enabled
    pub fn get_shuffle_mode(&self) -> bool {
        self.queue.is_shuffled()
    }

    /// Get configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ===== Internals =====

    fn require_player(&self) -> Result<()> {
        if self.player.is_none() {
            return Err(SessionError::NotInitialized);
        }
        Ok(())
    }

    /// Select `index` and load it
    fn change_track(&mut self, index: BackingIndex, reason: TransitionReason) -> Result<()> {
        self.resume_at = None;
        self.queue.skip_to(index);
        self.start_track(reason)
    }

    /// Load the current track into the player
    ///
    /// Supersedes any in-flight load. Resolve and load failures are reported
    /// through `PlayerError` and leave the machine `Idle`; they are not
    /// returned to the caller.
    fn start_track(&mut self, reason: TransitionReason) -> Result<()> {
        self.require_player()?;

        let Some(track) = self.queue.current().cloned() else {
            debug!("Queue is empty, nothing to load");
            return Ok(());
        };

        self.finish_current();

        self.generation += 1;
        let generation = self.generation;
        self.loaded = Some(LoadedTrack {
            generation,
            track_id: track.id.clone(),
        });
        self.pending_seek = self.resume_at.take().filter(|at| !at.is_zero());

        let transition = self.machine.load();
        self.emit_transition(transition);
        self.refresh_is_playing();

        debug!(
            "Loading {} (generation {}, reason {:?})",
            track.id, generation, reason
        );

        let resolved = match self.resolver.resolve(&track.uri) {
            Ok(resolved) => resolved,
            Err(e) => {
                let err = match e {
                    SessionError::ResolveFailed { .. } => e,
                    other => SessionError::ResolveFailed {
                        uri: track.uri.clone(),
                        reason: other.to_string(),
                    },
                };
                self.fail(err);
                self.persist();
                return Ok(());
            }
        };

        let request = LoadRequest {
            generation,
            uri: resolved.uri,
            headers: resolved.headers,
        };

        let play_when_ready = self.play_when_ready;
        let loaded = match self.player.as_mut() {
            Some(player) => {
                let result = player.load(request);
                if result.is_ok() && play_when_ready {
                    player.play();
                }
                result
            }
            None => Err(SessionError::NotInitialized),
        };

        if let Err(e) = loaded {
            let err = match e {
                SessionError::LoadFailed { .. } => e,
                other => SessionError::LoadFailed {
                    code: other.code().to_string(),
                    message: other.to_string(),
                },
            };
            self.fail(err);
            self.persist();
            return Ok(());
        }

        self.emit_track_started(track.id, reason);
        self.persist();
        Ok(())
    }

    /// Handle the end of the loaded track
    fn auto_advance(&mut self) {
        let result = if self.repeat == RepeatMode::Track {
            self.start_track(TransitionReason::RepeatModeLoop)
        } else {
            match self.queue.next(self.repeat) {
                Some(next) => self.change_track(next, TransitionReason::Auto),
                None => {
                    info!("Reached end of queue");
                    self.finish_current();
                    self.persist();
                    return;
                }
            }
        };

        if let Err(e) = result {
            warn!("Auto-advance failed: {}", e);
        }
    }

    /// Restart the loaded track at position zero
    ///
    /// A track that already ended resumes if play was requested.
    fn restart_current(&mut self) {
        if self.loaded.is_none() {
            return;
        }

        let resume = self.play_when_ready && self.machine.state() == PlaybackState::Ended;
        if let Some(player) = self.player.as_mut() {
            player.seek(Duration::ZERO);
            if resume {
                player.play();
            }
        }
    }

    /// Stop the player and return to `Idle`
    fn unload(&mut self) {
        if self.loaded.take().is_some() {
            if let Some(player) = self.player.as_mut() {
                player.stop();
            }
        }
        self.pending_seek = None;
        self.play_when_ready = false;

        let transition = self.machine.clear();
        self.emit_transition(transition);
        self.refresh_is_playing();
    }

    /// Surface a load failure and return to `Idle`
    ///
    /// The queue is left untouched so the host can retry with `play`.
    fn fail(&mut self, err: SessionError) {
        warn!("Playback failed: {}", err);

        self.loaded = None;
        self.pending_seek = None;

        let transition = self.machine.on_error();
        self.emit_transition(transition);
        self.refresh_is_playing();
        self.emit_player_error(&err);
    }

    fn refresh_is_playing(&mut self) {
        let playing = self.play_when_ready
            && self.loaded.is_some()
            && self.machine.state() == PlaybackState::Ready;

        if playing != self.is_playing {
            self.is_playing = playing;
            self.emit(SessionEvent::IsPlayingChanged { is_playing: playing });
        }
    }

    fn persist(&mut self) {
        let snapshot = self.snapshot();
        self.last_snapshot_at = Some(self.clock.now());

        if let Err(e) = snapshot.save(self.store.as_mut(), &self.config.snapshot_key) {
            warn!("Failed to persist session: {}", e);
        }
    }

    // ===== Event Emission =====

    fn emit(&self, event: SessionEvent) {
        trace!("Emitting {:?}", event);
        self.events.emit(&event);
    }

    fn emit_transition(&self, transition: Option<Transition>) {
        if let Some(transition) = transition {
            debug!("Playback {:?} -> {:?}", transition.from, transition.to);
            self.emit(SessionEvent::PlaybackStateChanged {
                state: transition.to,
            });
        }
    }

    fn emit_track_started(&self, track_id: String, reason: TransitionReason) {
        self.emit(SessionEvent::TrackStarted { track_id, reason });
    }

    /// Emit `TrackFinished` for the loaded track, collapsing repeats inside
    /// the de-duplication window
    fn finish_current(&mut self) {
        let Some(loaded) = self.loaded.as_ref() else {
            return;
        };

        let now = self.clock.now();
        if !is_due(self.last_finish_at, now, self.config.finish_dedupe_window()) {
            trace!("Suppressing duplicate finish for {}", loaded.track_id);
            return;
        }
        self.last_finish_at = Some(now);

        let event = SessionEvent::TrackFinished {
            track_id: loaded.track_id.clone(),
            final_position_ms: millis(self.get_position()),
            duration_ms: self.get_duration().map(millis),
        };
        self.emit(event);
    }

    fn emit_position_update(&self) {
        self.emit(SessionEvent::PositionUpdate {
            position_ms: millis(self.get_position()),
            duration_ms: self.get_duration().map(millis),
            buffered_ms: millis(self.get_buffered()),
        });
    }

    fn emit_player_error(&self, err: &SessionError) {
        self.emit(SessionEvent::PlayerError {
            code: err.code().to_string(),
            message: err.to_string(),
        });
    }

    fn emit_queue_changed(&self) {
        self.emit(SessionEvent::QueueChanged {
            length: self.queue.len(),
        });
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.machine.state())
            .field("queue_len", &self.queue.len())
            .field("current", &self.queue.current_index())
            .field("repeat", &self.repeat)
            .field("shuffle", &self.queue.is_shuffled())
            .field("generation", &self.generation)
            .field("is_playing", &self.is_playing)
            .field("has_player", &self.player.is_some())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

fn is_due(last: Option<Instant>, now: Instant, interval: Duration) -> bool {
    last.map_or(true, |at| now.saturating_duration_since(at) >= interval)
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
