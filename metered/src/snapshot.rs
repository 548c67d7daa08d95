//! Serializable, point-in-time views of metrics.
//!
//! These are what every output format works from: the JSON served over HTTP, and the text and
//! line-protocol reports.  Each metric kind has its own snapshot type with a fixed set of fields.
use metered_util::{Snapshot, DEFAULT_QUANTILES};
use serde::Serialize;

use crate::{Counter, Gauge, GaugeValue, Histogram, Meter, MetricName, Timer};

/// State of a counter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CounterSnapshot {
    /// Current count.
    pub count: i64,
}

/// State of a gauge.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GaugeSnapshot {
    /// Value produced by the gauge callback.
    pub value: GaugeValue,
}

/// State of a meter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MeterSnapshot {
    /// Events marked since creation.
    pub count: u64,
    /// What is being counted.
    pub event_type: String,
    /// Unit the rates are expressed in.
    pub rate_unit: &'static str,
    /// Mean rate since creation.
    pub mean_rate: f64,
    /// One-minute moving average rate.
    pub one_minute_rate: f64,
    /// Five-minute moving average rate.
    pub five_minute_rate: f64,
    /// Fifteen-minute moving average rate.
    pub fifteen_minute_rate: f64,
}

/// State of a histogram.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistogramSnapshot {
    /// Values recorded since creation.
    pub count: u64,
    /// Reservoir strategy.
    pub sample_type: &'static str,
    /// Smallest sampled value.
    pub min: f64,
    /// Largest sampled value.
    pub max: f64,
    /// Mean of the sampled values.
    pub mean: f64,
    /// Standard deviation of the sampled values.
    pub std_dev: f64,
    /// 50th percentile.
    pub median: f64,
    /// 75th percentile.
    pub p75: f64,
    /// 95th percentile.
    pub p95: f64,
    /// 98th percentile.
    pub p98: f64,
    /// 99th percentile.
    pub p99: f64,
    /// 99.9th percentile.
    pub p999: f64,
}

/// State of a timer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimerSnapshot {
    /// Unit of the duration statistics.
    pub duration_unit: &'static str,
    /// Unit of the rate statistics.
    pub rate_unit: &'static str,
    /// How often the timed operation ran.
    pub rate: MeterSnapshot,
    /// Distribution of the recorded durations.
    pub duration: HistogramSnapshot,
}

/// State of any metric.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricSnapshot {
    /// A counter.
    Counter(CounterSnapshot),
    /// A gauge.
    Gauge(GaugeSnapshot),
    /// A meter.
    Meter(MeterSnapshot),
    /// A histogram.
    Histogram(HistogramSnapshot),
    /// A timer.
    Timer(TimerSnapshot),
}

impl MetricSnapshot {
    pub(crate) fn from_counter(counter: &Counter) -> Self {
        MetricSnapshot::Counter(CounterSnapshot { count: counter.count() })
    }

    pub(crate) fn from_gauge(gauge: &Gauge) -> Self {
        MetricSnapshot::Gauge(GaugeSnapshot { value: gauge.value() })
    }

    pub(crate) fn from_meter(meter: &Meter) -> Self {
        MetricSnapshot::Meter(MeterSnapshot::new(meter))
    }

    pub(crate) fn from_histogram(histogram: &Histogram) -> Self {
        MetricSnapshot::Histogram(HistogramSnapshot::new(histogram))
    }

    pub(crate) fn from_timer(timer: &Timer) -> Self {
        MetricSnapshot::Timer(TimerSnapshot {
            duration_unit: timer.duration_unit().as_str(),
            rate_unit: timer.rate_unit().as_str(),
            rate: MeterSnapshot::new(timer.meter()),
            duration: HistogramSnapshot::new(timer.histogram()),
        })
    }
}

impl MeterSnapshot {
    fn new(meter: &Meter) -> Self {
        MeterSnapshot {
            count: meter.count(),
            event_type: meter.event_type().to_string(),
            rate_unit: meter.rate_unit().as_str(),
            mean_rate: meter.mean_rate(),
            one_minute_rate: meter.one_minute_rate(),
            five_minute_rate: meter.five_minute_rate(),
            fifteen_minute_rate: meter.fifteen_minute_rate(),
        }
    }
}

impl HistogramSnapshot {
    fn new(histogram: &Histogram) -> Self {
        let snapshot = histogram.snapshot();
        Self::from_parts(histogram.count(), histogram.sample_type().as_str(), &snapshot)
    }

    fn from_parts(count: u64, sample_type: &'static str, snapshot: &Snapshot) -> Self {
        let [median, p75, p95, p98, p99, p999] = DEFAULT_QUANTILES.map(|q| snapshot.value(q));
        HistogramSnapshot {
            count,
            sample_type,
            min: snapshot.min(),
            max: snapshot.max(),
            mean: snapshot.mean(),
            std_dev: snapshot.std_dev(),
            median,
            p75,
            p95,
            p98,
            p99,
            p999,
        }
    }
}

/// A metric snapshot paired with its name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NamedSnapshot {
    /// Name of the metric.
    pub name: MetricName,
    /// State of the metric.
    pub metric: MetricSnapshot,
}

/// Renders snapshots as a JSON array of `{"name": ..., "metric": {...}}` objects.
pub fn to_json(snapshots: &[NamedSnapshot], pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(snapshots)
    } else {
        serde_json::to_string(snapshots)
    }
}
