use std::{fmt, time::Duration};

/// A unit of time.
///
/// Used both to express rates ("events per second") and to scale durations before they are
/// recorded ("timings in milliseconds").  Conversions between units truncate toward zero, in the
/// same way integer division does.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub enum TimeUnit {
    /// Nanoseconds.
    Nanoseconds,
    /// Microseconds.
    Microseconds,
    /// Milliseconds.
    Milliseconds,
    /// Seconds.
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
    /// Days.
    Days,
}

impl TimeUnit {
    /// Number of nanoseconds in one unit.
    pub const fn as_nanos(self) -> u64 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60 * 1_000_000_000,
            TimeUnit::Hours => 60 * 60 * 1_000_000_000,
            TimeUnit::Days => 24 * 60 * 60 * 1_000_000_000,
        }
    }

    /// Number of seconds in one unit, as a float.
    ///
    /// This is the factor a per-second rate is multiplied by to express it in this unit.
    pub fn as_secs_f64(self) -> f64 {
        self.as_nanos() as f64 / TimeUnit::Seconds.as_nanos() as f64
    }

    /// Converts `value`, expressed in `from`, into this unit.
    ///
    /// The result is truncated toward zero and saturates at the bounds of `i64`.
    pub fn convert(self, value: i64, from: TimeUnit) -> i64 {
        let nanos = i128::from(value) * i128::from(from.as_nanos());
        let converted = nanos / i128::from(self.as_nanos());
        converted.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    /// Converts a [`Duration`] into a whole number of this unit, truncating.
    pub fn from_duration(self, duration: Duration) -> i64 {
        let converted = duration.as_nanos() / u128::from(self.as_nanos());
        i64::try_from(converted).unwrap_or(i64::MAX)
    }

    /// Creates a [`Duration`] spanning `value` of this unit.
    pub fn to_duration(self, value: u64) -> Duration {
        let nanos = u128::from(value) * u128::from(self.as_nanos());
        let secs = nanos / 1_000_000_000;
        let subsec = (nanos % 1_000_000_000) as u32;
        Duration::new(u64::try_from(secs).unwrap_or(u64::MAX), subsec)
    }

    /// Short, human-friendly abbreviation of this unit.
    pub const fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Microseconds => "us",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "min",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
