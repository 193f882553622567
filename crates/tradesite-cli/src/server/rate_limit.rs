use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use quanta::{Clock, Instant};

/// Above this many tracked clients, idle entries are swept on the next hit.
const SWEEP_THRESHOLD: usize = 10_000;

/// Sliding-window limiter keyed by client address.
///
/// Only accepted hits are recorded, so a client hammering the endpoint is let back in as soon as its oldest accepted
/// hit leaves the window.
pub struct RateLimiter {
    clock: Clock,
    window: Duration,
    max_hits: usize,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_hits: usize, window: Duration) -> Self {
        Self::with_clock(Clock::new(), max_hits, window)
    }

    pub fn with_clock(clock: Clock, max_hits: usize, window: Duration) -> Self {
        Self {
            clock,
            window,
            max_hits,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Records a hit for `key`, returning `true` if the key is over its limit (in which case nothing is recorded).
    pub fn is_limited(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut hits = self.hits.lock().unwrap_or_else(PoisonError::into_inner);

        if hits.len() > SWEEP_THRESHOLD {
            hits.retain(|_, queue| {
                queue
                    .back()
                    .is_some_and(|last| now.duration_since(*last) <= self.window)
            });
        }

        let queue = hits.entry(key.to_string()).or_default();
        while queue
            .front()
            .is_some_and(|first| now.duration_since(*first) > self.window)
        {
            queue.pop_front();
        }

        if queue.len() >= self.max_hits {
            return true;
        }

        queue.push_back(now);
        false
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
