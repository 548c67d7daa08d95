use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use metered_util::{ExpDecaySample, Sample, Snapshot, UniformSample};

/// The reservoir strategy backing a [`Histogram`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SampleType {
    /// A uniform sample of every value ever recorded.
    Uniform,
    /// A sample biased toward values recorded in the last few minutes.
    Biased,
}

impl SampleType {
    /// Lowercase name of this sample type.
    pub const fn as_str(self) -> &'static str {
        match self {
            SampleType::Uniform => "uniform",
            SampleType::Biased => "biased",
        }
    }

    fn sample(self) -> Box<dyn Sample> {
        match self {
            SampleType::Uniform => Box::<UniformSample>::default(),
            SampleType::Biased => Box::<ExpDecaySample>::default(),
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric that tracks the distribution of a stream of values.
///
/// Values are kept in a bounded [`Sample`], and every statistic is computed from a point-in-time
/// [`Snapshot`] of it.  The all-time count of recorded values is tracked separately, since the
/// sample only ever holds a subset.
pub struct Histogram {
    sample: Box<dyn Sample>,
    sample_type: SampleType,
    count: AtomicU64,
}

impl Histogram {
    /// Creates a new `Histogram` with the default reservoir for `sample_type`.
    pub fn new(sample_type: SampleType) -> Self {
        Histogram { sample: sample_type.sample(), sample_type, count: AtomicU64::new(0) }
    }

    /// Creates a new `Histogram` backed by a specific reservoir.
    ///
    /// `sample_type` is only used to describe the histogram when it is reported.
    pub fn with_sample<S>(sample_type: SampleType, sample: S) -> Self
    where
        S: Sample + 'static,
    {
        Histogram { sample: Box::new(sample), sample_type, count: AtomicU64::new(0) }
    }

    /// Records a value.
    pub fn update(&self, value: i64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sample.update(value);
    }

    /// Number of values recorded since creation, or since the last clear.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// The reservoir strategy of this histogram.
    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// Point-in-time snapshot of the sampled values.
    pub fn snapshot(&self) -> Snapshot {
        self.sample.snapshot()
    }

    /// Copy of the sampled values.
    pub fn values(&self) -> Vec<i64> {
        self.sample.values()
    }

    /// Smallest sampled value.
    pub fn min(&self) -> f64 {
        self.snapshot().min()
    }

    /// Largest sampled value.
    pub fn max(&self) -> f64 {
        self.snapshot().max()
    }

    /// Mean of the sampled values.
    pub fn mean(&self) -> f64 {
        self.snapshot().mean()
    }

    /// Standard deviation of the sampled values.
    pub fn std_dev(&self) -> f64 {
        self.snapshot().std_dev()
    }

    /// Sampled values at each of the given quantiles.
    pub fn percentiles(&self, quantiles: &[f64]) -> Vec<f64> {
        self.snapshot().percentiles(quantiles)
    }

    /// Removes every recorded value and resets the count.
    pub fn clear(&self) {
        self.sample.clear();
        self.count.store(0, Ordering::Relaxed);
    }
}

impl fmt::Debug for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Histogram")
            .field("sample_type", &self.sample_type)
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}
