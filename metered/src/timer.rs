use std::sync::Arc;
use std::time::Duration;

use metered_util::{ExpDecaySample, Snapshot, TimeUnit, DEFAULT_ALPHA, DEFAULT_SAMPLE_SIZE};
use quanta::{Clock, Instant};

use crate::{Histogram, Meter, SampleType};

/// A metric that tracks both the rate and the duration distribution of an operation.
///
/// Durations are truncated to `duration_unit` before being recorded in a biased histogram, and
/// each recorded duration marks the timer's meter once.  Duration statistics are reported in
/// `duration_unit`, rates in calls per `rate_unit`.
pub struct Timer {
    meter: Arc<Meter>,
    histogram: Histogram,
    duration_unit: TimeUnit,
    rate_unit: TimeUnit,
    clock: Clock,
}

impl Timer {
    /// Creates a new `Timer`.
    pub fn new(duration_unit: TimeUnit, rate_unit: TimeUnit) -> Self {
        Self::with_clock(duration_unit, rate_unit, Clock::new())
    }

    /// Creates a new `Timer` that reads the time from `clock`.
    pub fn with_clock(duration_unit: TimeUnit, rate_unit: TimeUnit, clock: Clock) -> Self {
        let sample = ExpDecaySample::with_clock(DEFAULT_SAMPLE_SIZE, DEFAULT_ALPHA, clock.clone());
        Timer {
            meter: Arc::new(Meter::with_clock("calls", rate_unit, clock.clone())),
            histogram: Histogram::with_sample(SampleType::Biased, sample),
            duration_unit,
            rate_unit,
            clock,
        }
    }

    /// Records a duration.
    pub fn update(&self, duration: Duration) {
        let nanos = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
        self.update_nanos(nanos);
    }

    /// Records a duration given in nanoseconds.
    ///
    /// Negative durations are ignored.
    pub fn update_nanos(&self, nanos: i64) {
        if nanos < 0 {
            return;
        }

        self.histogram.update(self.duration_unit.convert(nanos, TimeUnit::Nanoseconds));
        self.meter.mark();
    }

    /// Runs `f`, recording how long it took.
    pub fn time<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = self.clock.now();
        let result = f();
        self.update(self.clock.now().saturating_duration_since(start));
        result
    }

    /// Starts timing an operation.
    ///
    /// The elapsed time is recorded when the returned context is stopped or dropped.
    pub fn start(&self) -> TimerContext<'_> {
        TimerContext { timer: self, start: self.clock.now(), recorded: false }
    }

    /// Unit durations are reported in.
    pub fn duration_unit(&self) -> TimeUnit {
        self.duration_unit
    }

    /// Unit rates are reported in.
    pub fn rate_unit(&self) -> TimeUnit {
        self.rate_unit
    }

    /// Number of durations recorded.
    pub fn count(&self) -> u64 {
        self.meter.count()
    }

    /// The meter tracking how often the operation runs.
    pub fn meter(&self) -> &Arc<Meter> {
        &self.meter
    }

    /// The histogram of recorded durations.
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// One-minute moving average rate.
    pub fn one_minute_rate(&self) -> f64 {
        self.meter.one_minute_rate()
    }

    /// Five-minute moving average rate.
    pub fn five_minute_rate(&self) -> f64 {
        self.meter.five_minute_rate()
    }

    /// Fifteen-minute moving average rate.
    pub fn fifteen_minute_rate(&self) -> f64 {
        self.meter.fifteen_minute_rate()
    }

    /// Mean rate since the timer was created.
    pub fn mean_rate(&self) -> f64 {
        self.meter.mean_rate()
    }

    /// Shortest sampled duration.
    pub fn min(&self) -> f64 {
        self.histogram.min()
    }

    /// Longest sampled duration.
    pub fn max(&self) -> f64 {
        self.histogram.max()
    }

    /// Mean sampled duration.
    pub fn mean(&self) -> f64 {
        self.histogram.mean()
    }

    /// Standard deviation of the sampled durations.
    pub fn std_dev(&self) -> f64 {
        self.histogram.std_dev()
    }

    /// Sampled durations at each of the given quantiles.
    pub fn percentiles(&self, quantiles: &[f64]) -> Vec<f64> {
        self.histogram.percentiles(quantiles)
    }

    /// Copy of the sampled durations.
    pub fn values(&self) -> Vec<i64> {
        self.histogram.values()
    }

    /// Point-in-time snapshot of the sampled durations.
    pub fn snapshot(&self) -> Snapshot {
        self.histogram.snapshot()
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("count", &self.count())
            .field("duration_unit", &self.duration_unit)
            .field("rate_unit", &self.rate_unit)
            .finish_non_exhaustive()
    }
}

/// An in-flight timing started by [`Timer::start`].
#[must_use = "the elapsed time is recorded as soon as the context is dropped"]
pub struct TimerContext<'a> {
    timer: &'a Timer,
    start: Instant,
    recorded: bool,
}

impl TimerContext<'_> {
    /// Stops timing, records the elapsed time and returns it.
    pub fn stop(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let elapsed = self.timer.clock.now().saturating_duration_since(self.start);
        if !self.recorded {
            self.recorded = true;
            self.timer.update(elapsed);
        }
        elapsed
    }
}

impl Drop for TimerContext<'_> {
    fn drop(&mut self) {
        self.record();
    }
}
