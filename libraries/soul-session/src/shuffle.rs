//! Shuffle permutations for queue randomization
//!
//! The queue never reorders its tracks; shuffling produces a permutation of
//! backing indices that defines the order tracks are heard in.

use crate::types::BackingIndex;
use rand::seq::SliceRandom;
use rand::Rng;

/// Generate a random permutation of `[0, len)`
///
/// Fisher-Yates via `SliceRandom::shuffle`.
/// When `front` is a valid index it is moved to the first position, which lets
/// the currently playing track keep playing while everything after it is
/// reshuffled.
pub fn permutation<R: Rng + ?Sized>(
    len: usize,
    front: Option<BackingIndex>,
    rng: &mut R,
) -> Vec<BackingIndex> {
    let mut order: Vec<BackingIndex> = (0..len).map(BackingIndex).collect();
    order.shuffle(rng);

    if let Some(front) = front {
        if let Some(pos) = order.iter().position(|&index| index == front) {
            order.swap(0, pos);
        }
    }

    order
}

/// Check that `order` contains every index in `[0, len)` exactly once
pub fn is_permutation(order: &[BackingIndex], len: usize) -> bool {
    if order.len() != len {
        return false;
    }

    let mut seen = vec![false; len];
    for index in order {
        match seen.get_mut(index.get()) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }

    true
}
