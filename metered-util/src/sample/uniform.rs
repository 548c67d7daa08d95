use parking_lot::Mutex;

use super::{fastrand, Sample, DEFAULT_SAMPLE_SIZE};

#[derive(Clone)]
struct Reservoir {
    values: Vec<i64>,
    seen: u64,
}

/// A uniform sampling reservoir.
///
/// [Reservoir sampling][rs] produces a statistically representative sample of a stream, in a
/// fixed space, without knowing the length of the stream in advance.  `UniformSample` is based on
/// Vitter's ["Algorithm R"][vitter_paper]: until the reservoir is full every value is kept, and
/// afterwards the n-th value replaces a random slot with probability `capacity / n`.
///
/// [rs]: https://en.wikipedia.org/wiki/Reservoir_sampling
/// [vitter_paper]: https://www.cs.umd.edu/~samir/498/vitter.pdf
pub struct UniformSample {
    capacity: usize,
    inner: Mutex<Reservoir>,
}

impl UniformSample {
    /// Creates a new `UniformSample` that stores up to `capacity` values.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Reservoir { values: Vec::with_capacity(capacity), seen: 0 }),
        }
    }

    /// Maximum number of values retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for UniformSample {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SIZE)
    }
}

impl Clone for UniformSample {
    fn clone(&self) -> Self {
        Self { capacity: self.capacity, inner: Mutex::new(self.inner.lock().clone()) }
    }
}

impl Sample for UniformSample {
    fn update(&self, value: i64) {
        let mut reservoir = self.inner.lock();
        reservoir.seen += 1;
        if reservoir.values.len() < self.capacity {
            reservoir.values.push(value);
        } else {
            let idx = fastrand(reservoir.seen);
            if idx < self.capacity as u64 {
                reservoir.values[idx as usize] = value;
            }
        }
    }

    fn count(&self) -> usize {
        self.inner.lock().values.len()
    }

    fn values(&self) -> Vec<i64> {
        self.inner.lock().values.clone()
    }

    fn clear(&self) {
        let mut reservoir = self.inner.lock();
        reservoir.values.clear();
        reservoir.seen = 0;
    }
}
