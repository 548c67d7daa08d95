use std::fmt::{Display, Write as _};

use chrono::Utc;
use metered::{
    snapshot::{HistogramSnapshot, MeterSnapshot},
    GaugeValue, MetricSnapshot, NamedSnapshot,
};
use tracing::trace;

use super::ReportFormatter;
use crate::ReporterError;

/// Renders reports in the plaintext line protocol understood by Graphite.
///
/// Every field of every metric becomes one line:
///
/// ```text
/// <prefix><name>.<field> <value> <unix-epoch-seconds>
/// ```
///
/// Spaces in metric names are replaced with hyphens.  Text gauges have no numeric value and are
/// left out; boolean gauges are written as `1` or `0`.
#[derive(Clone, Debug, Default)]
pub struct LineProtocolFormatter {
    prefix: String,
}

impl LineProtocolFormatter {
    /// Creates a new `LineProtocolFormatter` with no prefix.
    pub fn new() -> Self {
        LineProtocolFormatter { prefix: String::new() }
    }

    /// Creates a new `LineProtocolFormatter` that prepends `prefix` to every metric name.
    ///
    /// A `.` separator is appended to the prefix if it does not already end with one.
    pub fn with_prefix<P>(prefix: P) -> Self
    where
        P: Into<String>,
    {
        let mut prefix = prefix.into();
        if !prefix.is_empty() && !prefix.ends_with('.') {
            prefix.push('.');
        }
        LineProtocolFormatter { prefix }
    }

    /// The prefix prepended to every metric name.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Renders `snapshots` with an explicit timestamp, in seconds since the Unix epoch.
    pub fn render(&self, snapshots: &[NamedSnapshot], timestamp: i64) -> String {
        let mut writer = LineWriter { output: String::new(), timestamp };

        for snapshot in snapshots {
            let name = format!("{}{}", self.prefix, sanitize(&snapshot.name.to_string()));
            match &snapshot.metric {
                MetricSnapshot::Gauge(gauge) => match &gauge.value {
                    GaugeValue::Integer(v) => writer.line(&name, "value", v),
                    GaugeValue::Unsigned(v) => writer.line(&name, "value", v),
                    GaugeValue::Float(v) => writer.line(&name, "value", v),
                    GaugeValue::Bool(v) => writer.line(&name, "value", u8::from(*v)),
                    GaugeValue::Text(text) => {
                        trace!(metric = %name, value = %text, "skipping non-numeric gauge")
                    }
                },
                MetricSnapshot::Counter(counter) => writer.line(&name, "count", counter.count),
                MetricSnapshot::Meter(meter) => writer.meter(&name, meter),
                MetricSnapshot::Histogram(histogram) => writer.histogram(&name, histogram),
                MetricSnapshot::Timer(timer) => {
                    writer.meter(&name, &timer.rate);
                    writer.histogram(&name, &timer.duration);
                }
            }
        }

        writer.output
    }
}

impl ReportFormatter for LineProtocolFormatter {
    fn format(&self, snapshots: &[NamedSnapshot]) -> Result<String, ReporterError> {
        Ok(self.render(snapshots, Utc::now().timestamp()))
    }
}

struct LineWriter {
    output: String,
    timestamp: i64,
}

impl LineWriter {
    fn line(&mut self, name: &str, field: &str, value: impl Display) {
        let _ = writeln!(self.output, "{}.{} {} {}", name, field, value, self.timestamp);
    }

    fn meter(&mut self, name: &str, meter: &MeterSnapshot) {
        self.line(name, "count", meter.count);
        self.line(name, "meanRate", meter.mean_rate);
        self.line(name, "1MinuteRate", meter.one_minute_rate);
        self.line(name, "5MinuteRate", meter.five_minute_rate);
        self.line(name, "15MinuteRate", meter.fifteen_minute_rate);
    }

    fn histogram(&mut self, name: &str, histogram: &HistogramSnapshot) {
        self.line(name, "min", histogram.min);
        self.line(name, "max", histogram.max);
        self.line(name, "mean", histogram.mean);
        self.line(name, "stddev", histogram.std_dev);
        self.line(name, "median", histogram.median);
        self.line(name, "75percentile", histogram.p75);
        self.line(name, "95percentile", histogram.p95);
        self.line(name, "98percentile", histogram.p98);
        self.line(name, "99percentile", histogram.p99);
        self.line(name, "999percentile", histogram.p999);
    }
}

fn sanitize(name: &str) -> String {
    name.replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::LineProtocolFormatter;
    use metered::{MetricName, Metrics, SampleType, TimeUnit};
    use std::io;
    use std::sync::{Arc, Mutex};

    fn fields(output: &str, metric: &str) -> Vec<String> {
        let prefix = format!("{}.", metric);
        output
            .lines()
            .filter_map(|line| line.split(' ').next())
            .filter_map(|path| path.strip_prefix(&prefix))
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_fields_per_kind() {
        let metrics = Metrics::new();
        metrics.counter("requests").unwrap().increment_by(3);
        metrics.gauge("queue depth", || 7u64).unwrap();
        metrics.meter(("web", "hits"), "hits", TimeUnit::Seconds).unwrap().mark_n(2);
        metrics.histogram(("web", "size"), SampleType::Uniform).unwrap().update(5);
        metrics.timer(("web", "latency"), TimeUnit::Milliseconds, TimeUnit::Seconds).unwrap();

        let output = LineProtocolFormatter::new().render(&metrics.snapshot(), 1_600_000_000);

        let meter_fields = ["count", "meanRate", "1MinuteRate", "5MinuteRate", "15MinuteRate"];
        let histogram_fields = [
            "min",
            "max",
            "mean",
            "stddev",
            "median",
            "75percentile",
            "95percentile",
            "98percentile",
            "99percentile",
            "999percentile",
        ];

        assert_eq!(fields(&output, "requests"), vec!["count"]);
        assert_eq!(fields(&output, "queue-depth"), vec!["value"]);
        assert_eq!(fields(&output, "web.hits"), meter_fields.to_vec());
        assert_eq!(fields(&output, "web.size"), histogram_fields.to_vec());
        assert_eq!(
            fields(&output, "web.latency"),
            meter_fields.iter().chain(histogram_fields.iter()).copied().collect::<Vec<_>>()
        );

        assert!(output.contains("requests.count 3 1600000000\n"));
        assert!(output.contains("queue-depth.value 7 1600000000\n"));
        assert!(output.contains("web.hits.count 2 1600000000\n"));
        assert!(output.contains("web.size.max 5 1600000000\n"));
    }

    #[test]
    fn test_prefix_and_gauge_values() {
        let metrics = Metrics::new();
        metrics.gauge("up", || true).unwrap();
        metrics.gauge(MetricName::new("build", "version"), || "1.2.3").unwrap();

        let formatter = LineProtocolFormatter::with_prefix("app");
        assert_eq!(formatter.prefix(), "app.");
        assert_eq!(LineProtocolFormatter::with_prefix("app.").prefix(), "app.");
        assert_eq!(LineProtocolFormatter::with_prefix("").prefix(), "");

        let output = formatter.render(&metrics.snapshot(), 42);
        assert_eq!(output, "app.up.value 1 42\n");
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_skipped_text_gauge_is_logged() {
        let metrics = Metrics::new();
        metrics.gauge(("build", "version"), || "1.2.3").unwrap();

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let output = tracing::subscriber::with_default(subscriber, || {
            LineProtocolFormatter::new().render(&metrics.snapshot(), 42)
        });
        assert_eq!(output, "");

        let logs = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("skipping non-numeric gauge"), "missing log in {}", logs);
        assert!(logs.contains("metric=build.version"));
        assert!(logs.contains("value=1.2.3"));
    }

    #[test]
    fn test_empty_registry() {
        assert_eq!(LineProtocolFormatter::new().render(&[], 42), "");
    }
}
