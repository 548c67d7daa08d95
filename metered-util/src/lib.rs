//! Statistical building blocks used by `metered`.
//!
//! This crate holds the numeric state behind the richer metric types: the exponentially-weighted
//! moving average used for meter rates, the sample reservoirs used by histograms, and the
//! point-in-time [`Snapshot`] that distribution statistics are computed from.
//!
//! None of the types here perform I/O or spawn threads.  Anything time-based reads the time
//! through a [`quanta::Clock`], so tests can drive it with [`quanta::Clock::mock`].
#![deny(missing_docs)]

mod ewma;
pub use self::ewma::{Ewma, TICK_INTERVAL};

mod quantile;
pub use self::quantile::{parse_quantiles, Quantile, DEFAULT_QUANTILES};

pub mod sample;
pub use self::sample::{
    ExpDecaySample, Sample, TimeLimitedSample, UniformSample, DEFAULT_ALPHA, DEFAULT_SAMPLE_SIZE,
};

mod snapshot;
pub use self::snapshot::Snapshot;

mod time_unit;
pub use self::time_unit::TimeUnit;
