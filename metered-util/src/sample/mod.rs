//! Sample reservoirs.
//!
//! A sample holds a bounded subset of the values recorded into a histogram, which is enough to
//! estimate the distribution of those values without keeping every one of them.  The strategies
//! differ in which values they choose to keep:
//!
//! - [`UniformSample`] keeps a uniformly random subset of everything ever recorded.
//! - [`ExpDecaySample`] keeps a subset biased toward recently recorded values.
//! - [`TimeLimitedSample`] keeps everything recorded within a retention window.
//!
//! All samples are safe to update and read concurrently.  Reads always see a consistent
//! point-in-time set of values.
use std::cell::UnsafeCell;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::Snapshot;

mod exp_decay;
pub use self::exp_decay::{ExpDecaySample, DEFAULT_ALPHA};

mod time_limited;
pub use self::time_limited::{TimeLimitedSample, DEFAULT_CLEANUP_INTERVAL, DEFAULT_RETENTION};

mod uniform;
pub use self::uniform::UniformSample;

/// Default capacity of the size-bounded samples.
///
/// Offers a 99.9% confidence level with a 5% margin of error, assuming a normal distribution.
pub const DEFAULT_SAMPLE_SIZE: usize = 1028;

/// A reservoir of recorded values.
pub trait Sample: Send + Sync {
    /// Records a value.
    fn update(&self, value: i64);

    /// Number of values currently retained.
    fn count(&self) -> usize;

    /// Copy of the values currently retained, in no particular order.
    fn values(&self) -> Vec<i64>;

    /// Point-in-time snapshot of the values currently retained.
    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.values())
    }

    /// Removes every retained value.
    fn clear(&self);
}

thread_local! {
    static FAST_RNG: UnsafeCell<Xoshiro256StarStar> = {
        UnsafeCell::new(Xoshiro256StarStar::from_rng(&mut rand::rng()))
    };
}

fn with_rng<F, T>(f: F) -> T
where
    F: FnOnce(&mut Xoshiro256StarStar) -> T,
{
    FAST_RNG.with(|rng| {
        // SAFETY: We know it's safe to take a mutable reference since we're getting a pointer to a thread-local value,
        // and the reference never outlives the closure executing on this thread.
        let rng = unsafe { &mut *rng.get() };
        f(rng)
    })
}

/// Uniformly random integer in `[0, upper)`.
pub(crate) fn fastrand(upper: u64) -> u64 {
    with_rng(|rng| rng.random_range(0..upper))
}

/// Uniformly random float in `(0, 1]`.
pub(crate) fn fastrand_unit() -> f64 {
    with_rng(|rng| 1.0 - rng.random::<f64>())
}
