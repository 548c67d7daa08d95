use std::collections::BTreeMap;
use std::time::Duration;

use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use quanta::{Clock, Instant};

use super::{fastrand_unit, Sample, DEFAULT_SAMPLE_SIZE};

/// Default decay factor, heavily biasing the sample toward the last five minutes.
pub const DEFAULT_ALPHA: f64 = 0.015;

const RESCALE_THRESHOLD: Duration = Duration::from_secs(60 * 60);

// Priorities can collide, most obviously once a long idle gap rescales them all to zero, so each
// key carries the sequence number of its update.
type Key = (OrderedFloat<f64>, u64);

#[derive(Clone)]
struct State {
    values: BTreeMap<Key, i64>,
    landmark: Instant,
    next_rescale: Instant,
    sequence: u64,
}

/// An exponentially-decaying sampling reservoir.
///
/// Uses Cormode et al's [forward decay][fd] to produce a sample biased toward recent values: each
/// value is given the priority `exp(alpha * age) * u`, where `age` is the number of seconds since
/// the landmark and `u` is uniformly random in `(0, 1]`, and only the `capacity` highest-priority
/// values are kept.
///
/// As priorities grow exponentially with the age of the process, the landmark is moved forward
/// once per hour and all stored priorities rescaled to match, which keeps them within the range
/// of `f64`.
///
/// [fd]: http://dimacs.rutgers.edu/~graham/pubs/papers/fwddecay.pdf
pub struct ExpDecaySample {
    capacity: usize,
    alpha: f64,
    clock: Clock,
    state: RwLock<State>,
}

impl ExpDecaySample {
    /// Creates a new `ExpDecaySample` holding up to `capacity` values, decaying by `alpha`.
    pub fn new(capacity: usize, alpha: f64) -> Self {
        Self::with_clock(capacity, alpha, Clock::new())
    }

    /// Creates a new `ExpDecaySample` that reads the time from `clock`.
    pub fn with_clock(capacity: usize, alpha: f64, clock: Clock) -> Self {
        let now = clock.now();
        let state = State {
            values: BTreeMap::new(),
            landmark: now,
            next_rescale: now + RESCALE_THRESHOLD,
            sequence: 0,
        };

        Self { capacity, alpha, clock, state: RwLock::new(state) }
    }

    /// Maximum number of values retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn rescale(&self, state: &mut State, now: Instant) {
        let elapsed = now.saturating_duration_since(state.landmark).as_secs_f64();
        let factor = (-self.alpha * elapsed).exp();

        state.values = std::mem::take(&mut state.values)
            .into_iter()
            .map(|((priority, seq), value)| ((OrderedFloat(priority.0 * factor), seq), value))
            .collect();
        state.landmark = now;
        state.next_rescale = now + RESCALE_THRESHOLD;
    }
}

impl Default for ExpDecaySample {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SIZE, DEFAULT_ALPHA)
    }
}

impl Clone for ExpDecaySample {
    fn clone(&self) -> Self {
        Self {
            capacity: self.capacity,
            alpha: self.alpha,
            clock: self.clock.clone(),
            state: RwLock::new(self.state.read().clone()),
        }
    }
}

impl Sample for ExpDecaySample {
    fn update(&self, value: i64) {
        let now = self.clock.now();
        let mut state = self.state.write();
        if now >= state.next_rescale {
            self.rescale(&mut state, now);
        }

        let age = now.saturating_duration_since(state.landmark).as_secs_f64();
        let priority = OrderedFloat((self.alpha * age).exp() * fastrand_unit());
        let key = (priority, state.sequence);
        state.sequence = state.sequence.wrapping_add(1);

        if state.values.len() < self.capacity {
            state.values.insert(key, value);
            return;
        }

        let lowest = state.values.keys().next().copied();
        if let Some(lowest) = lowest {
            if lowest.0 < priority {
                state.values.remove(&lowest);
                state.values.insert(key, value);
            }
        }
    }

    fn count(&self) -> usize {
        self.state.read().values.len()
    }

    fn values(&self) -> Vec<i64> {
        self.state.read().values.values().copied().collect()
    }

    fn clear(&self) {
        let now = self.clock.now();
        let mut state = self.state.write();
        state.values.clear();
        state.sequence = 0;
        state.landmark = now;
        state.next_rescale = now + RESCALE_THRESHOLD;
    }
}
