//! Sleep timer
//!
//! A single-shot deadline after which playback is paused. The timer does not
//! own a thread; the controller polls it from its control loop.

use std::time::{Duration, Instant};

/// One-shot pause deadline
#[derive(Debug, Clone, Default)]
pub struct SleepTimer {
    deadline: Option<Instant>,
}

impl SleepTimer {
    /// Create an inactive timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer, replacing any pending deadline
    pub fn start(&mut self, duration: Duration, now: Instant) {
        self.deadline = Some(now + duration);
    }

    /// Disarm the timer
    ///
    /// Returns whether a deadline was pending. Safe to call repeatedly.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Time left before firing
    ///
    /// `None` when inactive, and also once the deadline has passed but the
    /// timer has not been polled yet, so callers never see a zero or negative
    /// remainder.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .and_then(|deadline| deadline.checked_duration_since(now))
            .filter(|left| !left.is_zero())
    }

    /// Pending deadline
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check if a deadline is pending
    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire if due
    ///
    /// Returns true exactly once per armed deadline; the timer is cleared
    /// before returning.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
