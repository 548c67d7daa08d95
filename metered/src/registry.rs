use std::collections::HashMap;
use std::sync::Arc;

use metered_util::TimeUnit;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::trace;

use crate::snapshot::{self, NamedSnapshot};
use crate::ticker::Ticker;
use crate::{
    Counter, Gauge, GaugeValue, Histogram, Meter, Metric, MetricKind, MetricName, SampleType,
    Timer,
};

/// Errors that could occur while looking up metrics.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The name is already registered to a metric of a different kind.
    #[error("metric '{name}' is already registered as a {existing}, not a {requested}")]
    KindMismatch {
        /// Name that was looked up.
        name: MetricName,
        /// Kind of the metric already registered under the name.
        existing: MetricKind,
        /// Kind that was requested.
        requested: MetricKind,
    },
}

struct Inner {
    metrics: RwLock<HashMap<MetricName, Metric>>,
    ticker: Ticker,
}

/// A registry of named metrics.
///
/// `Metrics` is a cheaply-cloneable handle: every clone refers to the same set of metrics.  Each
/// name maps to exactly one metric, created on first use, so concurrent callers asking for the
/// same name always observe the same instance.
///
/// Meters and timers created through the registry have their moving averages ticked by a
/// background thread, which runs for as long as any handle to the registry is alive.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<Inner>,
}

impl Metrics {
    /// Creates a new, empty `Metrics` registry.
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(Inner { metrics: RwLock::new(HashMap::new()), ticker: Ticker::new() }),
        }
    }

    /// Gets the metric registered under `name`, creating it with `factory` if it does not exist.
    ///
    /// `factory` is called at most once, and only if `name` is not yet registered.  It is called
    /// while the registry is locked, so it must not access the registry itself.
    pub fn get_or_create<F>(&self, name: MetricName, factory: F) -> Metric
    where
        F: FnOnce() -> Metric,
    {
        if let Some(metric) = self.inner.metrics.read().get(&name) {
            return metric.clone();
        }

        let mut metrics = self.inner.metrics.write();
        if let Some(metric) = metrics.get(&name) {
            return metric.clone();
        }

        let metric = factory();
        if let Some(meter) = metric.meter() {
            self.inner.ticker.attach(meter);
        }
        trace!(metric = %name, kind = %metric.kind(), "registered metric");
        metrics.insert(name, metric.clone());
        metric
    }

    /// Gets or creates a counter.
    pub fn counter<N>(&self, name: N) -> Result<Arc<Counter>, RegistryError>
    where
        N: Into<MetricName>,
    {
        let name = name.into();
        match self.get_or_create(name.clone(), || Metric::Counter(Arc::default())) {
            Metric::Counter(counter) => Ok(counter),
            other => Err(mismatch(name, &other, MetricKind::Counter)),
        }
    }

    /// Gets or creates a gauge backed by `f`.
    ///
    /// If a gauge is already registered under `name`, it is returned as-is and `f` is discarded.
    pub fn gauge<N, F, V>(&self, name: N, f: F) -> Result<Arc<Gauge>, RegistryError>
    where
        N: Into<MetricName>,
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<GaugeValue>,
    {
        let name = name.into();
        match self.get_or_create(name.clone(), || Metric::Gauge(Arc::new(Gauge::new(f)))) {
            Metric::Gauge(gauge) => Ok(gauge),
            other => Err(mismatch(name, &other, MetricKind::Gauge)),
        }
    }

    /// Gets or creates a meter.
    pub fn meter<N, E>(
        &self,
        name: N,
        event_type: E,
        rate_unit: TimeUnit,
    ) -> Result<Arc<Meter>, RegistryError>
    where
        N: Into<MetricName>,
        E: Into<String>,
    {
        let name = name.into();
        let factory = || Metric::Meter(Arc::new(Meter::new(event_type, rate_unit)));
        match self.get_or_create(name.clone(), factory) {
            Metric::Meter(meter) => Ok(meter),
            other => Err(mismatch(name, &other, MetricKind::Meter)),
        }
    }

    /// Gets or creates a histogram.
    pub fn histogram<N>(
        &self,
        name: N,
        sample_type: SampleType,
    ) -> Result<Arc<Histogram>, RegistryError>
    where
        N: Into<MetricName>,
    {
        let name = name.into();
        let factory = || Metric::Histogram(Arc::new(Histogram::new(sample_type)));
        match self.get_or_create(name.clone(), factory) {
            Metric::Histogram(histogram) => Ok(histogram),
            other => Err(mismatch(name, &other, MetricKind::Histogram)),
        }
    }

    /// Gets or creates a timer.
    pub fn timer<N>(
        &self,
        name: N,
        duration_unit: TimeUnit,
        rate_unit: TimeUnit,
    ) -> Result<Arc<Timer>, RegistryError>
    where
        N: Into<MetricName>,
    {
        let name = name.into();
        let factory = || Metric::Timer(Arc::new(Timer::new(duration_unit, rate_unit)));
        match self.get_or_create(name.clone(), factory) {
            Metric::Timer(timer) => Ok(timer),
            other => Err(mismatch(name, &other, MetricKind::Timer)),
        }
    }

    /// Gets the metric registered under `name`.
    pub fn get(&self, name: &MetricName) -> Option<Metric> {
        self.inner.metrics.read().get(name).cloned()
    }

    /// Removes the metric registered under `name`, returning it if it existed.
    pub fn remove(&self, name: &MetricName) -> Option<Metric> {
        self.inner.metrics.write().remove(name)
    }

    /// Number of registered metrics.
    pub fn len(&self) -> usize {
        self.inner.metrics.read().len()
    }

    /// Returns `true` if no metrics are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.metrics.read().is_empty()
    }

    /// Removes every registered metric.
    pub fn clear(&self) {
        self.inner.metrics.write().clear();
    }

    /// Copy of the registry.
    ///
    /// Adding or removing entries in the returned map does not affect the registry, but the
    /// metrics themselves are shared: updating one is visible through the registry.
    pub fn all(&self) -> HashMap<MetricName, Metric> {
        self.inner.metrics.read().clone()
    }

    /// Copy of the registry, ordered by name.
    pub fn all_sorted(&self) -> Vec<(MetricName, Metric)> {
        let mut metrics = self
            .inner
            .metrics
            .read()
            .iter()
            .map(|(name, metric)| (name.clone(), metric.clone()))
            .collect::<Vec<_>>();
        metrics.sort_by(|a, b| a.0.cmp(&b.0));
        metrics
    }

    /// Reads the current state of every metric, ordered by name.
    ///
    /// Gauge callbacks are invoked without the registry locked.
    pub fn snapshot(&self) -> Vec<NamedSnapshot> {
        self.all_sorted()
            .into_iter()
            .map(|(name, metric)| NamedSnapshot { name, metric: metric.snapshot() })
            .collect()
    }

    /// Renders the current state of every metric as JSON.
    ///
    /// The output is an array of `{"name": ..., "metric": {...}}` objects, ordered by name.
    pub fn to_json(&self) -> serde_json::Result<String> {
        snapshot::to_json(&self.snapshot(), false)
    }

    /// Renders the current state of every metric as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        snapshot::to_json(&self.snapshot(), true)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").field("len", &self.len()).finish_non_exhaustive()
    }
}

fn mismatch(name: MetricName, existing: &Metric, requested: MetricKind) -> RegistryError {
    RegistryError::KindMismatch { name, existing: existing.kind(), requested }
}

#[cfg(test)]
mod tests {
    use super::{Metrics, RegistryError};
    use crate::{GaugeValue, Metric, MetricKind, MetricName, SampleType};
    use metered_util::TimeUnit;
    use std::sync::Arc;

    struct Handler;

    #[test]
    fn test_same_name_same_instance() {
        let metrics = Metrics::new();
        let first = metrics.counter(MetricName::of::<Handler>("requests")).unwrap();
        let second = metrics.counter(MetricName::of::<Handler>("requests")).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(metrics.len(), 1);
    }

    #[test]
    fn test_kind_mismatch() {
        let metrics = Metrics::new();
        metrics.counter("requests").unwrap();

        let err = metrics.meter("requests", "requests", TimeUnit::Seconds).unwrap_err();
        match err {
            RegistryError::KindMismatch { name, existing, requested } => {
                assert_eq!(name, MetricName::from_name("requests"));
                assert_eq!(existing, MetricKind::Counter);
                assert_eq!(requested, MetricKind::Meter);
            }
        }

        let err = metrics.histogram("requests", SampleType::Uniform).unwrap_err();
        assert_eq!(
            err.to_string(),
            "metric 'requests' is already registered as a counter, not a histogram"
        );
    }

    #[test]
    fn test_existing_gauge_keeps_callback() {
        let metrics = Metrics::new();
        let first = metrics.gauge("depth", || 1).unwrap();
        let second = metrics.gauge("depth", || 2).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.value(), GaugeValue::Integer(1));
    }

    #[test]
    fn test_get_remove_clear() {
        let metrics = Metrics::new();
        assert!(metrics.is_empty());

        metrics.counter("a").unwrap();
        metrics.histogram("b", SampleType::Biased).unwrap();
        metrics.timer("c", TimeUnit::Milliseconds, TimeUnit::Seconds).unwrap();
        assert_eq!(metrics.len(), 3);

        let b = MetricName::from_name("b");
        assert!(matches!(metrics.get(&b), Some(Metric::Histogram(_))));
        assert!(matches!(metrics.remove(&b), Some(Metric::Histogram(_))));
        assert!(metrics.get(&b).is_none());
        assert!(metrics.remove(&b).is_none());
        assert_eq!(metrics.len(), 2);

        metrics.clear();
        assert!(metrics.is_empty());
    }

    #[test]
    fn test_sorted_snapshot() {
        let metrics = Metrics::new();
        metrics.counter(("b", "z")).unwrap().increment();
        metrics.counter(("a", "y")).unwrap();
        metrics.counter("x").unwrap();

        let names = metrics.snapshot().into_iter().map(|s| s.name.to_string()).collect::<Vec<_>>();
        assert_eq!(names, vec!["x", "a.y", "b.z"]);
    }

    #[test]
    fn test_json() {
        let metrics = Metrics::new();
        assert_eq!(metrics.to_json().unwrap(), "[]");

        metrics.counter("counter").unwrap().increment();
        assert_eq!(metrics.to_json().unwrap(), r#"[{"name":"counter","metric":{"count":1}}]"#);
    }

    #[test]
    fn test_clones_share_state() {
        let metrics = Metrics::new();
        let clone = metrics.clone();
        clone.counter("shared").unwrap().increment_by(5);

        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics.counter("shared").unwrap().count(), 5);
    }
}
