use std::sync::atomic::{AtomicI64, Ordering};

/// A signed, atomically-updated count.
///
/// Counters may be incremented and decremented by arbitrary amounts, including negative deltas.
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicI64,
}

impl Counter {
    /// Creates a new `Counter` starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter by one.
    pub fn increment(&self) {
        self.increment_by(1);
    }

    /// Increments the counter by `delta`.
    pub fn increment_by(&self, delta: i64) {
        self.count.fetch_add(delta, Ordering::Relaxed);
    }

    /// Decrements the counter by one.
    pub fn decrement(&self) {
        self.decrement_by(1);
    }

    /// Decrements the counter by `delta`.
    pub fn decrement_by(&self, delta: i64) {
        self.count.fetch_sub(delta, Ordering::Relaxed);
    }

    /// Current count.
    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Resets the counter to zero.
    pub fn clear(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}
