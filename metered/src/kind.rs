use std::fmt;
use std::sync::Arc;

use crate::snapshot::MetricSnapshot;
use crate::{Counter, Gauge, Histogram, Meter, Timer};

/// Metric kind.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum MetricKind {
    /// Counter type.
    Counter,
    /// Gauge type.
    Gauge,
    /// Meter type.
    Meter,
    /// Histogram type.
    Histogram,
    /// Timer type.
    Timer,
}

impl MetricKind {
    /// Lowercase name of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Meter => "meter",
            MetricKind::Histogram => "histogram",
            MetricKind::Timer => "timer",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered metric.
///
/// Cloning a `Metric` is cheap and yields a handle to the same underlying instance.
#[derive(Clone, Debug)]
pub enum Metric {
    /// A counter.
    Counter(Arc<Counter>),
    /// A gauge.
    Gauge(Arc<Gauge>),
    /// A meter.
    Meter(Arc<Meter>),
    /// A histogram.
    Histogram(Arc<Histogram>),
    /// A timer.
    Timer(Arc<Timer>),
}

impl Metric {
    /// Kind of this metric.
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::Meter(_) => MetricKind::Meter,
            Metric::Histogram(_) => MetricKind::Histogram,
            Metric::Timer(_) => MetricKind::Timer,
        }
    }

    /// Reads the current state of this metric.
    pub fn snapshot(&self) -> MetricSnapshot {
        match self {
            Metric::Counter(counter) => MetricSnapshot::from_counter(counter),
            Metric::Gauge(gauge) => MetricSnapshot::from_gauge(gauge),
            Metric::Meter(meter) => MetricSnapshot::from_meter(meter),
            Metric::Histogram(histogram) => MetricSnapshot::from_histogram(histogram),
            Metric::Timer(timer) => MetricSnapshot::from_timer(timer),
        }
    }

    /// The meter to tick, if this metric has one.
    pub(crate) fn meter(&self) -> Option<&Arc<Meter>> {
        match self {
            Metric::Meter(meter) => Some(meter),
            Metric::Timer(timer) => Some(timer.meter()),
            Metric::Counter(_) | Metric::Gauge(_) | Metric::Histogram(_) => None,
        }
    }
}

impl From<Arc<Counter>> for Metric {
    fn from(counter: Arc<Counter>) -> Self {
        Metric::Counter(counter)
    }
}

impl From<Arc<Gauge>> for Metric {
    fn from(gauge: Arc<Gauge>) -> Self {
        Metric::Gauge(gauge)
    }
}

impl From<Arc<Meter>> for Metric {
    fn from(meter: Arc<Meter>) -> Self {
        Metric::Meter(meter)
    }
}

impl From<Arc<Histogram>> for Metric {
    fn from(histogram: Arc<Histogram>) -> Self {
        Metric::Histogram(histogram)
    }
}

impl From<Arc<Timer>> for Metric {
    fn from(timer: Arc<Timer>) -> Self {
        Metric::Timer(timer)
    }
}

#[cfg(test)]
mod tests {
    use super::{Metric, MetricKind};
    use crate::{Counter, Gauge, Histogram, Meter, SampleType, Timer};
    use metered_util::TimeUnit;
    use std::sync::Arc;

    #[test]
    fn test_kinds() {
        let metrics: Vec<Metric> = vec![
            Arc::new(Counter::new()).into(),
            Arc::new(Gauge::new(|| 1)).into(),
            Arc::new(Meter::new("calls", TimeUnit::Seconds)).into(),
            Arc::new(Histogram::new(SampleType::Uniform)).into(),
            Arc::new(Timer::new(TimeUnit::Milliseconds, TimeUnit::Seconds)).into(),
        ];

        let kinds = metrics.iter().map(Metric::kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                MetricKind::Counter,
                MetricKind::Gauge,
                MetricKind::Meter,
                MetricKind::Histogram,
                MetricKind::Timer
            ]
        );

        let tickable = metrics.iter().filter(|m| m.meter().is_some()).count();
        assert_eq!(tickable, 2);
    }

    #[test]
    fn test_clone_shares_instance() {
        let counter = Arc::new(Counter::new());
        let metric = Metric::Counter(Arc::clone(&counter));
        let copy = metric.clone();

        counter.increment();
        match copy {
            Metric::Counter(c) => assert_eq!(c.count(), 1),
            other => panic!("unexpected kind: {}", other.kind()),
        }
    }
}
