//! Rolling-window throttle for authentication attempts.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

pub const DEFAULT_WINDOW_SECS: i64 = 60;
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Tracks recent attempts in a trailing time window.
///
/// Timestamps are appended at the tail and evicted from the head, so the
/// queue is always non-decreasing.
#[derive(Debug, Clone)]
pub struct RateGuard {
    window: Duration,
    limit: usize,
    attempts: VecDeque<DateTime<Utc>>,
}

impl Default for RateGuard {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_WINDOW_SECS), DEFAULT_MAX_ATTEMPTS)
    }
}

impl RateGuard {
    pub fn new(window: Duration, limit: usize) -> Self {
        Self {
            window,
            limit,
            attempts: VecDeque::with_capacity(limit),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of attempts currently held (not evicted).
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    fn evict(&mut self, now: DateTime<Utc>) {
        while let Some(oldest) = self.attempts.front() {
            if now - *oldest > self.window {
                self.attempts.pop_front();
            } else {
                break;
            }
        }
    }

    /// Whether a new attempt at `now` should be rejected.
    pub fn should_throttle(&mut self, now: DateTime<Utc>) -> bool {
        self.evict(now);
        self.attempts.len() >= self.limit
    }

    /// Record an attempt at `now` and return the stored timestamp.
    pub fn record_attempt(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let at = match self.attempts.back() {
            Some(last) if *last > now => *last,
            _ => now,
        };
        self.attempts.push_back(at);
        at
    }

    /// Time until the oldest surviving attempt leaves the window, if throttled.
    pub fn retry_after(&mut self, now: DateTime<Utc>) -> Option<Duration> {
        if !self.should_throttle(now) {
            return None;
        }
        // A zero limit throttles with nothing recorded; wait a full window.
        let remaining = match self.attempts.front() {
            Some(oldest) => self.window - (now - *oldest),
            None => self.window,
        };
        Some(remaining.max(Duration::zero()))
    }

    /// [`retry_after`](Self::retry_after) rounded up to whole seconds.
    pub fn retry_after_secs(&mut self, now: DateTime<Utc>) -> Option<u64> {
        self.retry_after(now).map(|d| {
            let millis = d.num_milliseconds().max(0) as u64;
            millis.div_ceil(1000).max(1)
        })
    }

    pub fn reset(&mut self) {
        self.attempts.clear();
    }
}
