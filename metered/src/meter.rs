use std::sync::atomic::{AtomicU64, Ordering};

use metered_util::{Ewma, TimeUnit};
use quanta::{Clock, Instant};

/// A metric that measures the rate at which events occur.
///
/// A meter tracks the all-time number of events, the mean rate since the meter was created, and
/// the 1, 5 and 15-minute exponentially-weighted moving average rates.  Rates are reported in
/// events per `rate_unit`.
///
/// The moving averages only advance when [`tick`](Meter::tick) is called.  Meters created through
/// [`Metrics`](crate::Metrics) are ticked every five seconds by the registry.
pub struct Meter {
    count: AtomicU64,
    m1_rate: Ewma,
    m5_rate: Ewma,
    m15_rate: Ewma,
    start: Instant,
    clock: Clock,
    event_type: String,
    rate_unit: TimeUnit,
}

impl Meter {
    /// Creates a new `Meter`.
    ///
    /// `event_type` describes what is being counted, such as `"requests"`.
    pub fn new(event_type: impl Into<String>, rate_unit: TimeUnit) -> Self {
        Self::with_clock(event_type, rate_unit, Clock::new())
    }

    /// Creates a new `Meter` that reads the time from `clock`.
    pub fn with_clock(event_type: impl Into<String>, rate_unit: TimeUnit, clock: Clock) -> Self {
        Meter {
            count: AtomicU64::new(0),
            m1_rate: Ewma::one_minute(),
            m5_rate: Ewma::five_minute(),
            m15_rate: Ewma::fifteen_minute(),
            start: clock.now(),
            clock,
            event_type: event_type.into(),
            rate_unit,
        }
    }

    /// Marks the occurrence of one event.
    pub fn mark(&self) {
        self.mark_n(1);
    }

    /// Marks the occurrence of `n` events.
    pub fn mark_n(&self, n: u64) {
        self.count.fetch_add(n, Ordering::Relaxed);

        let n = i64::try_from(n).unwrap_or(i64::MAX);
        self.m1_rate.update(n);
        self.m5_rate.update(n);
        self.m15_rate.update(n);
    }

    /// Advances the moving averages by one tick.
    pub fn tick(&self) {
        self.m1_rate.tick();
        self.m5_rate.tick();
        self.m15_rate.tick();
    }

    /// Number of events marked since creation.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// What is being counted.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Unit the rates are expressed in.
    pub fn rate_unit(&self) -> TimeUnit {
        self.rate_unit
    }

    /// One-minute moving average rate.
    pub fn one_minute_rate(&self) -> f64 {
        self.m1_rate.rate(self.rate_unit)
    }

    /// Five-minute moving average rate.
    pub fn five_minute_rate(&self) -> f64 {
        self.m5_rate.rate(self.rate_unit)
    }

    /// Fifteen-minute moving average rate.
    pub fn fifteen_minute_rate(&self) -> f64 {
        self.m15_rate.rate(self.rate_unit)
    }

    /// Mean rate since the meter was created.
    ///
    /// Zero until at least one event has been marked and some time has passed.
    pub fn mean_rate(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }

        let elapsed = self.clock.now().saturating_duration_since(self.start).as_secs_f64();
        if elapsed == 0.0 {
            return 0.0;
        }

        count as f64 / elapsed * self.rate_unit.as_secs_f64()
    }
}

impl std::fmt::Debug for Meter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Meter")
            .field("count", &self.count())
            .field("event_type", &self.event_type)
            .field("rate_unit", &self.rate_unit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::Meter;
    use approx::assert_relative_eq;
    use metered_util::TimeUnit;
    use quanta::Clock;
    use std::time::Duration;

    #[test]
    fn test_counts() {
        let meter = Meter::new("test", TimeUnit::Seconds);
        meter.mark_n(3);
        meter.mark();
        assert_eq!(meter.count(), 4);
        assert_eq!(meter.event_type(), "test");
    }

    #[test]
    fn test_empty_rates_are_zero() {
        let (clock, mock) = Clock::mock();
        let meter = Meter::with_clock("test", TimeUnit::Seconds, clock);
        mock.increment(Duration::from_secs(10));

        assert_eq!(meter.mean_rate(), 0.0);
        assert_eq!(meter.one_minute_rate(), 0.0);
        assert_eq!(meter.five_minute_rate(), 0.0);
        assert_eq!(meter.fifteen_minute_rate(), 0.0);
    }

    #[test]
    fn test_mean_rate() {
        let (clock, mock) = Clock::mock();
        let meter = Meter::with_clock("test", TimeUnit::Minutes, clock);
        meter.mark_n(30);

        // No time has passed yet.
        assert_eq!(meter.mean_rate(), 0.0);

        mock.increment(Duration::from_secs(10));
        assert_relative_eq!(meter.mean_rate(), 180.0, max_relative = 1e-9);
    }

    #[test]
    fn test_moving_averages_after_tick() {
        let meter = Meter::new("test", TimeUnit::Seconds);
        for _ in 0..100_000 {
            meter.mark();
        }
        meter.tick();

        assert_eq!(meter.count(), 100_000);
        assert_relative_eq!(meter.one_minute_rate(), 20_000.0);
        assert_relative_eq!(meter.five_minute_rate(), 20_000.0);
        assert_relative_eq!(meter.fifteen_minute_rate(), 20_000.0);
    }
}
