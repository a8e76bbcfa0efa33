//! Frame-paced timer queue
//!
//! The host advances the queue once per frame with the frame delta. Due
//! continuations come out in deadline order, ties in scheduling order, so a
//! replay with the same frame deltas fires the same sequence.

use std::time::Duration;

use super::ports::{Continuation, Scheduler};

#[derive(Debug, Clone)]
struct Timer {
    deadline: Duration,
    seq: u64,
    continuation: Continuation,
}

/// Scheduler driven by explicit clock advances
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    now: Duration,
    next_seq: u64,
    timers: Vec<Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the queue was created
    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of continuations still waiting
    #[inline]
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.timers.is_empty()
    }

    /// Move the clock forward
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    /// Remove and return the earliest continuation whose deadline has passed
    pub fn pop_due(&mut self) -> Option<Continuation> {
        let (idx, _) = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= self.now)
            .min_by_key(|(_, t)| (t.deadline, t.seq))?;
        Some(self.timers.remove(idx).continuation)
    }

    /// Time until the next deadline, if anything is pending
    pub fn next_deadline_in(&self) -> Option<Duration> {
        self.timers
            .iter()
            .map(|t| t.deadline.saturating_sub(self.now))
            .min()
    }
}

impl Scheduler for TimerQueue {
    fn after(&mut self, delay: Duration, continuation: Continuation) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(Timer {
            deadline: self.now.saturating_add(delay),
            seq,
            continuation,
        });
    }
}
