//! Track queue with shuffle permutation
//!
//! Tracks are stored once, in insertion order (the "backing" list). Shuffle
//! never moves tracks; it overlays a permutation of backing indices that
//! defines the order tracks are heard in (the "playback" order). All public
//! addressing uses backing indices.

use crate::error::{Result, SessionError};
use crate::shuffle;
use crate::types::{BackingIndex, PlaybackIndex, RepeatMode, Track};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Ordered track list with optional shuffle order
///
/// Structure:
/// ```text
/// backing:       [A, B, C, D]      canonical order, never shuffled
/// shuffle_order: [2, 0, 3, 1]      playback order C, A, D, B
/// current:       0                 A (playback position 1)
/// ```
///
/// Invariants upheld by every operation:
/// - `current` is `None` exactly when `backing` is empty, otherwise a valid index
/// - `shuffle_order`, when present, is a permutation of `[0, backing.len())`
#[derive(Debug, Clone)]
pub struct TrackQueue {
    /// Tracks in insertion order
    backing: Vec<Track>,

    /// Playback order as backing indices (present iff shuffle is enabled)
    shuffle_order: Option<Vec<BackingIndex>>,

    /// Selected track
    current: Option<BackingIndex>,

    /// Source of shuffle permutations
    rng: StdRng,
}

impl TrackQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create new empty queue with deterministic shuffling
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            backing: Vec::new(),
            shuffle_order: None,
            current: None,
            rng,
        }
    }

    /// Replace the queue
    ///
    /// With shuffle on, a fresh permutation is generated with `start_index`
    /// first so playback begins there. An invalid `start_index` starts at the
    /// first shuffled track instead. With shuffle off, `start_index` is
    /// clamped into range.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize, shuffle: bool) {
        self.backing = tracks;
        let len = self.backing.len();

        if len == 0 {
            self.current = None;
            self.shuffle_order = shuffle.then(Vec::new);
            return;
        }

        if shuffle {
            let front = (start_index < len).then_some(BackingIndex(start_index));
            let order = shuffle::permutation(len, front, &mut self.rng);
            self.current = order.first().copied();
            self.shuffle_order = Some(order);
        } else {
            self.current = Some(BackingIndex(start_index.min(len - 1)));
            self.shuffle_order = None;
        }

        debug_assert!(self.is_consistent());
    }

    /// Append tracks to the end of the queue
    ///
    /// When shuffled, the new backing indices are added in order after
    /// everything already in the playback order.
    pub fn append(&mut self, tracks: Vec<Track>) {
        if tracks.is_empty() {
            return;
        }

        let start = self.backing.len();
        let added = tracks.len();
        self.backing.extend(tracks);

        if let Some(order) = self.shuffle_order.as_mut() {
            order.extend((start..start + added).map(BackingIndex));
        }

        if self.current.is_none() {
            self.current = self.to_backing(PlaybackIndex(0));
        }

        debug_assert!(self.is_consistent());
    }

    /// Insert a track to play right after the current one
    ///
    /// The track lands after `current` in the backing list, and after the
    /// current track's *playback* position in the shuffle order, so "play
    /// next" holds whether or not shuffle is on.
    pub fn insert_next(&mut self, track: Track) {
        let pos = self.current.map_or(0, |c| c.get() + 1);
        self.backing.insert(pos, track);

        let current_slot = self.current.and_then(|c| self.to_playback(c));
        if let Some(order) = self.shuffle_order.as_mut() {
            for index in order.iter_mut() {
                if index.get() >= pos {
                    index.0 += 1;
                }
            }
            let slot = current_slot.map_or(0, |p| p.get() + 1);
            order.insert(slot, BackingIndex(pos));
        }

        if self.current.is_none() {
            self.current = Some(BackingIndex(pos));
        }

        debug_assert!(self.is_consistent());
    }

    /// Remove the track at `index`
    ///
    /// Returns true if the removed track was the current one. In that case the
    /// track now occupying the vacated playback slot becomes current, wrapping
    /// to the first playback slot when the tail was removed. Out-of-range
    /// indices are ignored.
    pub fn remove_at(&mut self, index: BackingIndex) -> bool {
        let Some(slot) = self.to_playback(index) else {
            return false;
        };

        let was_current = self.current == Some(index);
        self.backing.remove(index.get());

        if let Some(order) = self.shuffle_order.as_mut() {
            order.remove(slot.get());
            for entry in order.iter_mut() {
                if *entry > index {
                    entry.0 -= 1;
                }
            }
        }

        if self.backing.is_empty() {
            self.current = None;
        } else if was_current {
            let slot = if slot.get() < self.backing.len() {
                slot
            } else {
                PlaybackIndex(0)
            };
            self.current = self.to_backing(slot);
        } else if let Some(current) = self.current.as_mut() {
            if *current > index {
                current.0 -= 1;
            }
        }

        debug_assert!(self.is_consistent());
        was_current
    }

    /// Move a track within the backing list
    ///
    /// The same track stays current and, when shuffled, the playback order of
    /// tracks is unchanged.
    pub fn move_item(&mut self, from: BackingIndex, to: BackingIndex) -> Result<()> {
        let len = self.backing.len();
        if from.get() >= len {
            return Err(SessionError::InvalidIndex(from.get()));
        }
        if to.get() >= len {
            return Err(SessionError::InvalidIndex(to.get()));
        }
        if from == to {
            return Ok(());
        }

        let track = self.backing.remove(from.get());
        self.backing.insert(to.get(), track);

        let remap = move |i: BackingIndex| -> BackingIndex {
            if i == from {
                to
            } else if from < to && i > from && i <= to {
                BackingIndex(i.get() - 1)
            } else if to < from && i >= to && i < from {
                BackingIndex(i.get() + 1)
            } else {
                i
            }
        };

        self.current = self.current.map(remap);
        if let Some(order) = self.shuffle_order.as_mut() {
            for entry in order.iter_mut() {
                *entry = remap(*entry);
            }
        }

        debug_assert!(self.is_consistent());
        Ok(())
    }

    /// Remove every track
    ///
    /// Shuffle stays enabled if it was.
    pub fn clear(&mut self) {
        self.backing.clear();
        self.current = None;
        if let Some(order) = self.shuffle_order.as_mut() {
            order.clear();
        }
    }

    /// Track after the current one in playback order
    ///
    /// `Track` and `Queue` repeat wrap to the first playback slot; `Off`
    /// returns `None` at the end.
    pub fn next(&self, repeat: RepeatMode) -> Option<BackingIndex> {
        let slot = self.to_playback(self.current?)?;
        let len = self.backing.len();

        if slot.get() + 1 < len {
            self.to_backing(PlaybackIndex(slot.get() + 1))
        } else if repeat.wraps() {
            self.to_backing(PlaybackIndex(0))
        } else {
            None
        }
    }

    /// Track before the current one in playback order
    pub fn previous(&self, repeat: RepeatMode) -> Option<BackingIndex> {
        let slot = self.to_playback(self.current?)?;
        let len = self.backing.len();

        if slot.get() > 0 {
            self.to_backing(PlaybackIndex(slot.get() - 1))
        } else if repeat.wraps() {
            self.to_backing(PlaybackIndex(len - 1))
        } else {
            None
        }
    }

    /// Track that would play after the current one finishes
    pub fn peek_next(&self, repeat: RepeatMode) -> Option<&Track> {
        if repeat == RepeatMode::Track {
            return self.current();
        }
        self.next(repeat).and_then(|index| self.at(index))
    }

    /// Enable or disable shuffle
    ///
    /// Enabling puts the current track first in a fresh permutation so it
    /// keeps playing; disabling drops the permutation. `current` is a backing
    /// index either way and never needs translating.
    pub fn set_shuffle(&mut self, enabled: bool) {
        if enabled == self.is_shuffled() {
            return;
        }

        self.shuffle_order = if enabled {
            Some(shuffle::permutation(
                self.backing.len(),
                self.current,
                &mut self.rng,
            ))
        } else {
            None
        };

        debug_assert!(self.is_consistent());
    }

    /// Select the track at `index`
    ///
    /// Returns false (and changes nothing) when out of range.
    pub fn skip_to(&mut self, index: BackingIndex) -> bool {
        if index.get() >= self.backing.len() {
            return false;
        }
        self.current = Some(index);
        true
    }

    /// Backing index of the track with `id`
    pub fn position_of(&self, id: &str) -> Option<BackingIndex> {
        self.backing
            .iter()
            .position(|track| track.id == id)
            .map(BackingIndex)
    }

    /// Convert a backing index to its playback position
    pub fn to_playback(&self, index: BackingIndex) -> Option<PlaybackIndex> {
        if index.get() >= self.backing.len() {
            return None;
        }

        match &self.shuffle_order {
            Some(order) => order.iter().position(|&i| i == index).map(PlaybackIndex),
            None => Some(PlaybackIndex(index.get())),
        }
    }

    /// Convert a playback position to its backing index
    pub fn to_backing(&self, slot: PlaybackIndex) -> Option<BackingIndex> {
        if slot.get() >= self.backing.len() {
            return None;
        }

        match &self.shuffle_order {
            Some(order) => order.get(slot.get()).copied(),
            None => Some(BackingIndex(slot.get())),
        }
    }

    /// Backing indices in the order they will be heard
    pub fn playback_order(&self) -> Vec<BackingIndex> {
        match &self.shuffle_order {
            Some(order) => order.clone(),
            None => (0..self.backing.len()).map(BackingIndex).collect(),
        }
    }

    /// Current track
    pub fn current(&self) -> Option<&Track> {
        self.current.and_then(|index| self.at(index))
    }

    /// Backing index of the current track
    pub fn current_index(&self) -> Option<BackingIndex> {
        self.current
    }

    /// Track at a backing index
    pub fn at(&self, index: BackingIndex) -> Option<&Track> {
        self.backing.get(index.get())
    }

    /// All tracks in backing (unshuffled) order
    pub fn all(&self) -> &[Track] {
        &self.backing
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.backing.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.backing.is_empty()
    }

    /// Check if shuffle is enabled
    pub fn is_shuffled(&self) -> bool {
        self.shuffle_order.is_some()
    }

    /// Check the structural invariants
    pub fn is_consistent(&self) -> bool {
        let len = self.backing.len();

        let current_ok = match self.current {
            None => len == 0,
            Some(index) => index.get() < len,
        };

        let order_ok = self
            .shuffle_order
            .as_ref()
            .map_or(true, |order| shuffle::is_permutation(order, len));

        current_ok && order_ok
    }

    #[cfg(test)]
    pub(crate) fn force_shuffle_order(&mut self, order: Vec<BackingIndex>) {
        assert!(shuffle::is_permutation(&order, self.backing.len()));
        self.shuffle_order = Some(order);
    }
}

impl Default for TrackQueue {
    fn default() -> Self {
        Self::new()
    }
}
