use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use quanta::{Clock, Instant};

use super::Sample;

/// Default retention window.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60);

/// Default minimum interval between evictions.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone)]
struct Window {
    entries: VecDeque<(Instant, i64)>,
    last_cleanup: Instant,
}

/// A sampling reservoir that keeps every value recorded within a retention window.
///
/// Expired values are evicted lazily: an update that arrives at least `cleanup_interval` after the
/// previous eviction first drops every value older than `retention`.  Reads never evict, so a
/// sample that stops receiving updates keeps reporting its last window.
pub struct TimeLimitedSample {
    clock: Clock,
    retention: Duration,
    cleanup_interval: Duration,
    window: Mutex<Window>,
}

impl TimeLimitedSample {
    /// Creates a new `TimeLimitedSample`.
    pub fn new(clock: Clock, retention: Duration, cleanup_interval: Duration) -> Self {
        let last_cleanup = clock.now();
        Self {
            clock,
            retention,
            cleanup_interval,
            window: Mutex::new(Window { entries: VecDeque::new(), last_cleanup }),
        }
    }

    /// How long values are retained.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    fn evict_expired(&self, window: &mut Window, now: Instant) {
        while let Some((recorded, _)) = window.entries.front() {
            if now.saturating_duration_since(*recorded) > self.retention {
                window.entries.pop_front();
            } else {
                break;
            }
        }
        window.last_cleanup = now;
    }
}

impl Default for TimeLimitedSample {
    fn default() -> Self {
        Self::new(Clock::new(), DEFAULT_RETENTION, DEFAULT_CLEANUP_INTERVAL)
    }
}

impl Clone for TimeLimitedSample {
    fn clone(&self) -> Self {
        Self {
            clock: self.clock.clone(),
            retention: self.retention,
            cleanup_interval: self.cleanup_interval,
            window: Mutex::new(self.window.lock().clone()),
        }
    }
}

impl Sample for TimeLimitedSample {
    fn update(&self, value: i64) {
        let now = self.clock.now();
        let mut window = self.window.lock();
        if now.saturating_duration_since(window.last_cleanup) >= self.cleanup_interval {
            self.evict_expired(&mut window, now);
        }
        window.entries.push_back((now, value));
    }

    fn count(&self) -> usize {
        self.window.lock().entries.len()
    }

    fn values(&self) -> Vec<i64> {
        self.window.lock().entries.iter().map(|(_, value)| *value).collect()
    }

    fn clear(&self) {
        let now = self.clock.now();
        let mut window = self.window.lock();
        window.entries.clear();
        window.last_cleanup = now;
    }
}
