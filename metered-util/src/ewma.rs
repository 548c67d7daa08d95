use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::TimeUnit;

/// Interval at which [`Ewma::tick`] is expected to be called for the standard presets.
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

const ONE_MINUTE: Duration = Duration::from_secs(60);
const FIVE_MINUTES: Duration = Duration::from_secs(5 * 60);
const FIFTEEN_MINUTES: Duration = Duration::from_secs(15 * 60);

struct RateState {
    rate: f64,
    initialized: bool,
}

/// An exponentially-weighted moving average.
///
/// Events are accumulated with [`update`](Ewma::update) into an uncounted bucket, and folded into
/// the average each time [`tick`](Ewma::tick) is called.  The caller is responsible for ticking
/// at the interval the average was created with; the presets assume [`TICK_INTERVAL`].
///
/// This is the same decay used for the 1/5/15-minute load averages in Unix `top`.
pub struct Ewma {
    uncounted: AtomicI64,
    state: Mutex<RateState>,
    alpha: f64,
    interval_secs: f64,
}

impl Ewma {
    /// Creates a new [`Ewma`] with the given smoothing constant and tick interval.
    pub fn new(alpha: f64, interval: Duration) -> Ewma {
        Ewma {
            uncounted: AtomicI64::new(0),
            state: Mutex::new(RateState { rate: 0.0, initialized: false }),
            alpha,
            interval_secs: interval.as_secs_f64(),
        }
    }

    /// Creates a new [`Ewma`] averaging over `window`, ticked every [`TICK_INTERVAL`].
    pub fn with_window(window: Duration) -> Ewma {
        let interval = TICK_INTERVAL.as_secs_f64();
        let alpha = 1.0 - (-interval / window.as_secs_f64()).exp();
        Ewma::new(alpha, TICK_INTERVAL)
    }

    /// Creates an [`Ewma`] equivalent to a one-minute load average.
    pub fn one_minute() -> Ewma {
        Ewma::with_window(ONE_MINUTE)
    }

    /// Creates an [`Ewma`] equivalent to a five-minute load average.
    pub fn five_minute() -> Ewma {
        Ewma::with_window(FIVE_MINUTES)
    }

    /// Creates an [`Ewma`] equivalent to a fifteen-minute load average.
    pub fn fifteen_minute() -> Ewma {
        Ewma::with_window(FIFTEEN_MINUTES)
    }

    /// Gets the smoothing constant.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Records `n` new events.
    ///
    /// The events do not affect the rate until the next tick.
    pub fn update(&self, n: i64) {
        self.uncounted.fetch_add(n, Ordering::AcqRel);
    }

    /// Folds all events recorded since the last tick into the average.
    pub fn tick(&self) {
        let count = self.uncounted.swap(0, Ordering::AcqRel);
        let instant_rate = count as f64 / self.interval_secs;

        let mut state = self.state.lock();
        if state.initialized {
            state.rate += self.alpha * (instant_rate - state.rate);
        } else {
            state.rate = instant_rate;
            state.initialized = true;
        }
    }

    /// Gets the current rate, in events per `unit`.
    ///
    /// Reports zero until the first tick.
    pub fn rate(&self, unit: TimeUnit) -> f64 {
        self.state.lock().rate * unit.as_secs_f64()
    }
}

impl Default for Ewma {
    fn default() -> Self {
        Ewma::one_minute()
    }
}
