//! Scenario tests for SessionController
//!
//! Drives the controller the way a host and media player would and checks the
//! events, player calls and persisted state that result.

mod common;

use common::{create_test_track, create_test_tracks, Harness};
use soul_session::{
    BackingIndex, KeyValueStore, MemoryStore, PlaybackState, PlayerEvent, RepeatMode, Result,
    ResolvedUri, SessionConfig, SessionController, SessionError, SessionEvent, SessionSnapshot,
    TransitionReason, UrlResolver,
};
use std::time::Duration;

// ============================================================================
// NAVIGATION
// ============================================================================

#[test]
fn test_skip_to_next_reports_seek_and_stops_at_end() {
    let mut h = Harness::playing(&["a", "b"]);
    h.events.clear();

    h.session.skip_to_next().unwrap();
    assert_eq!(h.current_id().as_deref(), Some("b"));
    assert_eq!(
        h.events.track_started(),
        vec![("b".to_string(), TransitionReason::Seek)]
    );

    h.ready();
    let state = h.session.get_state();
    h.events.clear();

    // End of queue with repeat off: nothing changes
    h.session.skip_to_next().unwrap();
    assert_eq!(h.current_id().as_deref(), Some("b"));
    assert_eq!(h.session.get_state(), state);
    assert!(h.events.events().is_empty());
    assert_eq!(h.player.log().loads.len(), 2);
}

#[test]
fn test_skip_to_loads_requested_index() {
    let mut h = Harness::playing(&["a", "b", "c"]);

    h.session.skip_to(2).unwrap();

    assert_eq!(h.session.get_current_index(), Some(BackingIndex(2)));
    assert_eq!(
        h.player.loaded_uris().last().map(String::as_str),
        Some("soul://track/c")
    );
}

#[test]
fn test_skip_to_invalid_index_is_ignored() {
    let mut h = Harness::playing(&["a", "b"]);
    h.events.clear();

    h.session.skip_to(9).unwrap();

    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert!(h.events.events().is_empty());
}

#[test]
fn test_previous_restarts_after_threshold() {
    let mut h = Harness::playing(&["a", "b"]);
    h.session.skip_to_next().unwrap();
    h.ready();

    h.player.set_position(Duration::from_secs(5));
    h.session.skip_to_previous().unwrap();

    // Restarted, still on b
    assert_eq!(h.current_id().as_deref(), Some("b"));
    assert_eq!(h.player.log().seeks, vec![Duration::ZERO]);

    h.player.set_position(Duration::from_secs(1));
    h.session.skip_to_previous().unwrap();

    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(
        h.events.track_started().last(),
        Some(&("a".to_string(), TransitionReason::Seek))
    );
}

#[test]
fn test_previous_at_start_restarts_current() {
    let mut h = Harness::playing(&["a", "b"]);
    h.player.set_position(Duration::from_secs(1));

    h.session.skip_to_previous().unwrap();

    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.player.log().seeks, vec![Duration::ZERO]);
    assert_eq!(h.player.log().loads.len(), 1);
}

#[test]
fn test_previous_after_end_of_queue_restarts() {
    let mut h = Harness::playing(&["a"]);
    h.player.set_position(Duration::from_secs(180));
    h.ended();
    assert_eq!(h.session.get_state(), PlaybackState::Ended);
    let plays = h.player.log().plays;

    h.session.skip_to_previous().unwrap();

    assert_eq!(h.player.log().seeks, vec![Duration::ZERO]);
    assert_eq!(h.player.log().plays, plays + 1);
    assert_eq!(h.player.log().loads.len(), 1);

    h.ready();
    assert_eq!(h.session.get_state(), PlaybackState::Ready);
    assert!(h.session.is_playing());
}

// ============================================================================
// AUTO-ADVANCE
// ============================================================================

#[test]
fn test_auto_advance_on_end() {
    let mut h = Harness::playing(&["a", "b"]);

    h.ended();

    assert_eq!(h.current_id().as_deref(), Some("b"));
    assert_eq!(
        h.events.track_started().last(),
        Some(&("b".to_string(), TransitionReason::Auto))
    );
    assert_eq!(h.events.track_finished(), vec!["a".to_string()]);
    assert_eq!(h.session.get_state(), PlaybackState::Buffering);
}

#[test]
fn test_end_of_queue_stays_ended() {
    let mut h = Harness::playing(&["a"]);
    h.events.clear();

    h.ended();

    assert_eq!(h.session.get_state(), PlaybackState::Ended);
    assert!(!h.session.is_playing());
    assert!(h.events.track_started().is_empty());
    assert_eq!(h.player.log().loads.len(), 1);

    // Playing again restarts the finished track
    let plays = h.player.log().plays;
    h.session.play().unwrap();
    assert_eq!(h.player.log().seeks, vec![Duration::ZERO]);
    assert_eq!(h.player.log().plays, plays + 1);
}

#[test]
fn test_repeat_track_loops() {
    let mut h = Harness::playing(&["a", "b"]);
    h.session.set_repeat_mode(RepeatMode::Track);

    h.ended();

    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(
        h.events.track_started().last(),
        Some(&("a".to_string(), TransitionReason::RepeatModeLoop))
    );
    assert_eq!(h.player.log().loads.len(), 2);
}

#[test]
fn test_repeat_queue_wraps() {
    let mut h = Harness::playing(&["a", "b"]);
    h.session.set_repeat_mode(RepeatMode::Queue);
    h.session.skip_to_next().unwrap();
    h.ready();

    h.ended();

    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(
        h.events.track_started().last(),
        Some(&("a".to_string(), TransitionReason::Auto))
    );
}

#[test]
fn test_next_track_peek_follows_repeat() {
    let mut h = Harness::playing(&["a", "b"]);
    assert_eq!(h.session.get_next_track().map(|t| t.id.as_str()), Some("b"));

    h.session.set_repeat_mode(RepeatMode::Track);
    assert_eq!(h.session.get_next_track().map(|t| t.id.as_str()), Some("a"));
}

// ============================================================================
// PLAYER CALLBACKS
// ============================================================================

#[test]
fn test_stale_callbacks_are_ignored() {
    let mut h = Harness::new();
    h.queue(&["a", "b"]);
    h.session.play().unwrap();
    let first = h.player.last_generation();

    h.session.skip_to_next().unwrap();
    h.session.handle_player_event(PlayerEvent::ended(first));
    h.session.handle_player_event(PlayerEvent::ready(first));

    assert_eq!(h.current_id().as_deref(), Some("b"));
    assert_eq!(h.session.get_state(), PlaybackState::Buffering);
    assert!(!h.session.is_playing());
}

#[test]
fn test_is_playing_follows_intent_and_readiness() {
    let mut h = Harness::new();
    h.queue(&["a"]);

    h.session.play().unwrap();
    assert!(!h.session.is_playing());

    h.ready();
    assert!(h.session.is_playing());

    // Stall
    let generation = h.player.last_generation();
    h.session
        .handle_player_event(PlayerEvent::buffering(generation));
    assert!(!h.session.is_playing());
    h.ready();

    h.session.pause().unwrap();
    assert!(!h.session.is_playing());

    let flips: Vec<bool> = h
        .events
        .events()
        .into_iter()
        .filter_map(|event| match event {
            SessionEvent::IsPlayingChanged { is_playing } => Some(is_playing),
            _ => None,
        })
        .collect();
    assert_eq!(flips, vec![true, false, true, false]);
}

#[test]
fn test_player_error_goes_idle_and_keeps_queue() {
    let mut h = Harness::playing(&["a", "b"]);
    let generation = h.player.last_generation();

    h.session
        .handle_player_event(PlayerEvent::error(generation, "network", "timed out"));

    assert_eq!(h.session.get_state(), PlaybackState::Idle);
    assert!(!h.session.is_playing());
    assert_eq!(h.session.get_queue().len(), 2);
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(
        h.events.count(|e| matches!(
            e,
            SessionEvent::PlayerError { code, message }
                if code == "network" && message.contains("timed out")
        )),
        1
    );

    // No automatic retry; play() retries
    assert_eq!(h.player.log().loads.len(), 1);
    h.session.play().unwrap();
    assert_eq!(h.player.log().loads.len(), 2);
}

#[test]
fn test_rejected_load_reports_error() {
    let mut h = Harness::new();
    h.queue(&["a"]);
    h.player.log().reject_loads = true;

    h.session.play().unwrap();

    assert_eq!(h.session.get_state(), PlaybackState::Idle);
    assert_eq!(
        h.events.count(|e| matches!(
            e,
            SessionEvent::PlayerError { code, .. } if code == "unsupported"
        )),
        1
    );
    assert!(h.events.track_started().is_empty());
}

struct FailingResolver;

impl UrlResolver for FailingResolver {
    fn resolve(&self, uri: &str) -> Result<ResolvedUri> {
        Err(SessionError::ResolveFailed {
            uri: uri.to_string(),
            reason: "token expired".to_string(),
        })
    }
}

#[test]
fn test_resolve_failure_reports_error() {
    let mut h = Harness::new();
    h.session = SessionController::new(SessionConfig::default(), Box::new(h.store.clone()))
        .with_url_resolver(Box::new(FailingResolver));
    h.session.subscribe(h.events.clone());
    h.session.set_media_player(Box::new(h.player.clone()));
    h.queue(&["a"]);

    h.session.play().unwrap();

    assert_eq!(h.session.get_state(), PlaybackState::Idle);
    assert!(h.player.log().loads.is_empty());
    assert_eq!(
        h.events.count(|e| matches!(
            e,
            SessionEvent::PlayerError { code, .. } if code == "resolve_failed"
        )),
        1
    );
}

struct SigningResolver;

impl UrlResolver for SigningResolver {
    fn resolve(&self, uri: &str) -> Result<ResolvedUri> {
        let mut resolved = ResolvedUri::plain(format!("https://cdn.example/{}", uri));
        resolved
            .headers
            .insert("Authorization".to_string(), "Bearer t".to_string());
        Ok(resolved)
    }
}

#[test]
fn test_resolved_uri_and_headers_reach_player() {
    let mut h = Harness::new();
    h.session = SessionController::new(SessionConfig::default(), Box::new(h.store.clone()))
        .with_url_resolver(Box::new(SigningResolver));
    h.session.set_media_player(Box::new(h.player.clone()));
    h.queue(&["a"]);

    h.session.play().unwrap();

    let log = h.player.log();
    assert_eq!(log.loads[0].uri, "https://cdn.example/soul://track/a");
    assert_eq!(
        log.loads[0].headers.get("Authorization").map(String::as_str),
        Some("Bearer t")
    );
}

#[test]
fn test_commands_without_player_are_not_initialized() {
    let mut h = Harness::without_player();
    h.queue(&["a"]);

    assert!(matches!(h.session.play(), Err(SessionError::NotInitialized)));
    assert!(matches!(
        h.session.skip_to_next(),
        Err(SessionError::NotInitialized)
    ));
    assert_eq!(h.session.get_queue().len(), 1);
}

// ============================================================================
// TRACK FINISHED
// ============================================================================

#[test]
fn test_finish_events_are_deduplicated() {
    let mut h = Harness::playing(&["a", "b", "c"]);

    h.session.skip_to_next().unwrap();
    h.session.skip_to_next().unwrap();
    assert_eq!(h.events.track_finished(), vec!["a".to_string()]);

    h.clock.advance(Duration::from_millis(200));
    h.session.skip_to_previous().unwrap();
    assert_eq!(
        h.events.track_finished(),
        vec!["a".to_string(), "c".to_string()]
    );
}

#[test]
fn test_finish_reports_position_and_duration() {
    let mut h = Harness::playing(&["a", "b"]);
    h.player.set_position(Duration::from_millis(1500));

    h.session.skip_to_next().unwrap();

    let finished = h.events.events().into_iter().find_map(|e| match e {
        SessionEvent::TrackFinished {
            final_position_ms,
            duration_ms,
            ..
        } => Some((final_position_ms, duration_ms)),
        _ => None,
    });
    assert_eq!(finished, Some((1500, Some(180_000))));
}

// ============================================================================
// QUEUE EDITS
// ============================================================================

#[test]
fn test_add_to_end_with_start_id_jumps() {
    let mut h = Harness::playing(&["a"]);

    h.session
        .add_to_end(create_test_tracks(&["x", "y", "z"]), Some("y"), true)
        .unwrap();

    assert_eq!(h.session.get_queue().len(), 3);
    assert_eq!(h.current_id().as_deref(), Some("y"));
    assert_eq!(
        h.events.track_started().last(),
        Some(&("y".to_string(), TransitionReason::PlaylistChanged))
    );

    let saved = SessionSnapshot::load(&h.store, &h.session.config().snapshot_key)
        .unwrap()
        .unwrap();
    assert_eq!(saved.current_index, Some(BackingIndex(1)));
}

#[test]
fn test_add_to_end_appends_without_interrupting() {
    let mut h = Harness::playing(&["a"]);

    h.session
        .add_to_end(create_test_tracks(&["b", "c"]), None, false)
        .unwrap();

    assert_eq!(h.session.get_queue().len(), 3);
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.player.log().loads.len(), 1);
    assert!(h.session.is_playing());
}

#[test]
fn test_replacing_queue_without_start_stops() {
    let mut h = Harness::playing(&["a"]);

    h.session
        .add_to_end(create_test_tracks(&["x", "y"]), None, true)
        .unwrap();

    assert_eq!(h.session.get_state(), PlaybackState::Idle);
    assert_eq!(h.player.log().stops, 1);
    assert_eq!(h.current_id().as_deref(), Some("x"));

    h.session.play().unwrap();
    assert_eq!(
        h.player.loaded_uris().last().map(String::as_str),
        Some("soul://track/x")
    );
}

#[test]
fn test_play_next_does_not_change_current() {
    let mut h = Harness::playing(&["a", "b", "c"]);

    h.session.play_next(create_test_track("x"));

    let ids: Vec<&str> = h.session.get_queue().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "x", "b", "c"]);
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.session.get_next_track().map(|t| t.id.as_str()), Some("x"));
    assert_eq!(h.player.log().loads.len(), 1);
}

#[test]
fn test_removing_current_loads_successor() {
    let mut h = Harness::playing(&["a", "b", "c"]);
    h.session.skip_to(1).unwrap();
    h.ready();

    h.session.remove_track(1).unwrap();

    assert_eq!(h.current_id().as_deref(), Some("c"));
    assert_eq!(
        h.events.track_started().last(),
        Some(&("c".to_string(), TransitionReason::PlaylistChanged))
    );
}

#[test]
fn test_removing_current_after_end_loads_paused() {
    let mut h = Harness::playing(&["a", "b"]);
    h.session.skip_to_next().unwrap();
    h.ready();
    h.ended();
    assert_eq!(h.session.get_state(), PlaybackState::Ended);
    let plays = h.player.log().plays;

    h.session.remove_track(1).unwrap();

    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.session.get_state(), PlaybackState::Buffering);
    assert_eq!(h.player.log().loads.len(), 3);
    assert_eq!(h.player.log().plays, plays);

    h.ready();
    assert_eq!(h.session.get_state(), PlaybackState::Ready);
    assert!(!h.session.is_playing());
}

#[test]
fn test_removing_other_track_keeps_playing() {
    let mut h = Harness::playing(&["a", "b", "c"]);

    h.session.remove_track(2).unwrap();
    h.session.remove_track(7).unwrap();

    assert_eq!(h.session.get_queue().len(), 2);
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.player.log().loads.len(), 1);
}

#[test]
fn test_removing_last_track_stops() {
    let mut h = Harness::playing(&["a"]);

    h.session.remove_track(0).unwrap();

    assert_eq!(h.session.get_state(), PlaybackState::Idle);
    assert!(h.session.get_queue().is_empty());
    assert_eq!(h.session.get_current_index(), None);
    assert_eq!(h.player.log().stops, 1);
    assert!(!h.session.is_playing());
}

#[test]
fn test_move_track_keeps_current() {
    let mut h = Harness::playing(&["a", "b", "c"]);

    h.session.move_track(0, 2).unwrap();

    let ids: Vec<&str> = h.session.get_queue().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c", "a"]);
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert!(matches!(
        h.session.move_track(0, 5),
        Err(SessionError::InvalidIndex(5))
    ));
}

#[test]
fn test_clear_stops_and_empties() {
    let mut h = Harness::playing(&["a", "b"]);

    h.session.clear();

    assert!(h.session.get_queue().is_empty());
    assert_eq!(h.session.get_state(), PlaybackState::Idle);
    assert_eq!(
        h.events
            .count(|e| matches!(e, SessionEvent::QueueChanged { length: 0 })),
        1
    );
}

#[test]
fn test_toggling_shuffle_does_not_interrupt() {
    let mut h = Harness::playing(&["a", "b", "c", "d"]);

    h.session.set_shuffle_mode(true);
    assert!(h.session.get_shuffle_mode());
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.session.get_upcoming()[0].id, "a");

    h.session.set_shuffle_mode(false);
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.player.log().loads.len(), 1);
    assert!(h.session.is_playing());
}

// ============================================================================
// SLEEP TIMER & TICK
// ============================================================================

#[test]
fn test_sleep_timer_pauses_exactly_once() {
    let mut h = Harness::playing(&["a"]);

    h.session.set_sleep_timer(Duration::from_millis(1000));
    assert_eq!(
        h.session.get_sleep_timer_remaining(),
        Some(Duration::from_millis(1000))
    );

    h.clock.advance(Duration::from_millis(999));
    h.session.tick();
    assert_eq!(h.player.log().pauses, 0);

    h.clock.advance(Duration::from_millis(1));
    h.session.tick();
    h.session.tick();

    assert_eq!(h.player.log().pauses, 1);
    assert_eq!(h.session.get_sleep_timer_remaining(), None);
    assert!(!h.session.is_playing());
}

#[test]
fn test_cancelled_sleep_timer_never_fires() {
    let mut h = Harness::playing(&["a"]);

    h.session.set_sleep_timer(Duration::from_millis(500));
    h.session.cancel_sleep_timer();
    h.session.cancel_sleep_timer();

    h.clock.advance(Duration::from_secs(1));
    h.session.tick();

    assert_eq!(h.player.log().pauses, 0);
    assert!(h.session.is_playing());
}

#[test]
fn test_position_updates_only_while_playing() {
    let mut h = Harness::new();
    h.queue(&["a"]);
    h.session.pause().unwrap();
    h.ready();

    h.session.tick();
    let updates = |h: &Harness| {
        h.events
            .count(|e| matches!(e, SessionEvent::PositionUpdate { .. }))
    };
    assert_eq!(updates(&h), 0);

    h.session.play().unwrap();
    h.session.tick();
    h.session.tick();
    assert_eq!(updates(&h), 1);

    h.clock.advance(Duration::from_millis(200));
    h.player.set_position(Duration::from_millis(200));
    h.session.tick();
    assert_eq!(updates(&h), 2);
}

#[test]
fn test_tick_persists_position_periodically() {
    let mut h = Harness::playing(&["a"]);
    let key = h.session.config().snapshot_key.clone();

    h.player.set_position(Duration::from_secs(6));
    h.clock.advance(Duration::from_secs(5));
    h.session.tick();

    let saved = SessionSnapshot::load(&h.store, &key).unwrap().unwrap();
    assert_eq!(saved.position_ms, 6000);
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[test]
fn test_restore_resumes_paused_at_saved_position() {
    let store = MemoryStore::new();
    {
        let mut h = Harness::with_store(store.clone());
        h.queue(&["a", "b", "c"]);
        h.session.play().unwrap();
        h.ready();
        h.session.skip_to(1).unwrap();
        h.ready();
        h.player.set_position(Duration::from_secs(42));
        h.session.set_repeat_mode(RepeatMode::Queue);
    }

    let mut h = Harness::with_store(store);
    assert!(h.session.restore().unwrap());

    assert_eq!(h.session.get_queue().len(), 3);
    assert_eq!(h.current_id().as_deref(), Some("b"));
    assert_eq!(h.session.get_repeat_mode(), RepeatMode::Queue);
    assert_eq!(h.player.loaded_uris(), vec!["soul://track/b".to_string()]);
    assert_eq!(h.player.log().plays, 0);

    h.ready();
    assert_eq!(h.player.log().seeks, vec![Duration::from_secs(42)]);
    assert!(!h.session.is_playing());
}

#[test]
fn test_restore_without_player_resumes_on_play() {
    let store = MemoryStore::new();
    {
        let mut h = Harness::with_store(store.clone());
        h.queue(&["a", "b"]);
        h.session.play().unwrap();
        h.ready();
        h.player.set_position(Duration::from_secs(10));
        h.session.set_shuffle_mode(true);
    }

    let mut h = Harness::with_store(store);
    h.session = SessionController::new(SessionConfig::default(), Box::new(h.store.clone()));
    assert!(h.session.restore().unwrap());
    assert!(h.session.get_shuffle_mode());
    assert_eq!(h.session.get_position(), Duration::from_secs(10));

    h.session.set_media_player(Box::new(h.player.clone()));
    h.session.play().unwrap();
    h.ready();

    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.player.log().seeks, vec![Duration::from_secs(10)]);
    assert!(h.session.is_playing());
}

#[test]
fn test_corrupt_snapshot_is_treated_as_absent() {
    let mut store = MemoryStore::new();
    store
        .set(&SessionConfig::default().snapshot_key, b"{\"version\":".to_vec())
        .unwrap();

    let mut h = Harness::with_store(store);
    assert!(!h.session.restore().unwrap());
    assert!(h.session.get_queue().is_empty());
}

#[test]
fn test_nothing_saved_restores_nothing() {
    let mut h = Harness::new();
    assert!(!h.session.restore().unwrap());
}

#[test]
fn test_track_start_is_persisted() {
    let mut h = Harness::new();
    h.queue(&["a", "b"]);
    h.session.play().unwrap();
    h.ready();
    h.session.skip_to_next().unwrap();

    let saved = SessionSnapshot::load(&h.store, &h.session.config().snapshot_key)
        .unwrap()
        .unwrap();
    assert_eq!(saved.current_index, Some(BackingIndex(1)));
    assert_eq!(saved.backing, create_test_tracks(&["a", "b"]));
}
