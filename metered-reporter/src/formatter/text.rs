use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use metered::{
    snapshot::{HistogramSnapshot, MeterSnapshot},
    MetricSnapshot, NamedSnapshot,
};
use metered_util::{parse_quantiles, Quantile, DEFAULT_QUANTILES};

use super::ReportFormatter;
use crate::ReporterError;

const HEADER_WIDTH: usize = 80;

/// Renders reports in a human-readable, plain-text format.
///
/// Each report starts with a header carrying the time it was rendered, followed by one block per
/// metric:
///
/// ```text
/// == 2024-05-01T12:00:00Z =======================================================
///
/// web.latency
///              count = 2
///          mean rate = 0.40 calls/s
///      1-minute rate = 0.00 calls/s
///      ...
/// ```
///
/// Percentiles are labelled the same way as everywhere else: `median`, `p75`, `p999` and so on.
#[derive(Clone, Debug)]
pub struct TextFormatter {
    quantiles: Vec<Quantile>,
}

impl TextFormatter {
    /// Creates a new `TextFormatter`.
    pub fn new() -> Self {
        TextFormatter { quantiles: parse_quantiles(&DEFAULT_QUANTILES) }
    }

    /// Renders `snapshots` as of `now`.
    pub fn render(&self, snapshots: &[NamedSnapshot], now: DateTime<Utc>) -> String {
        let mut output = String::new();

        let header = format!("== {} ", now.to_rfc3339_opts(SecondsFormat::Secs, true));
        let _ = writeln!(output, "{:=<width$}", header, width = HEADER_WIDTH);

        for snapshot in snapshots {
            let mut block = Block::default();
            match &snapshot.metric {
                MetricSnapshot::Counter(counter) => block.field("count", counter.count),
                MetricSnapshot::Gauge(gauge) => block.field("value", &gauge.value),
                MetricSnapshot::Meter(meter) => self.meter(&mut block, meter),
                MetricSnapshot::Histogram(histogram) => self.histogram(&mut block, histogram, ""),
                MetricSnapshot::Timer(timer) => {
                    self.meter(&mut block, &timer.rate);
                    self.histogram(&mut block, &timer.duration, timer.duration_unit);
                }
            }

            output.push('\n');
            let _ = writeln!(output, "{}", snapshot.name);
            block.write_to(&mut output);
        }

        output.push('\n');
        output
    }

    fn meter(&self, block: &mut Block, meter: &MeterSnapshot) {
        let per = format!("{}/{}", meter.event_type, meter.rate_unit);
        block.field("count", meter.count);
        block.field("mean rate", format!("{:.2} {}", meter.mean_rate, per));
        block.field("1-minute rate", format!("{:.2} {}", meter.one_minute_rate, per));
        block.field("5-minute rate", format!("{:.2} {}", meter.five_minute_rate, per));
        block.field("15-minute rate", format!("{:.2} {}", meter.fifteen_minute_rate, per));
    }

    fn histogram(&self, block: &mut Block, histogram: &HistogramSnapshot, unit: &str) {
        let value = |v: f64| {
            if unit.is_empty() {
                format!("{:.2}", v)
            } else {
                format!("{:.2} {}", v, unit)
            }
        };

        // Timers already reported their count through the meter.
        if unit.is_empty() {
            block.field("count", histogram.count);
        }
        block.field("min", value(histogram.min));
        block.field("max", value(histogram.max));
        block.field("mean", value(histogram.mean));
        block.field("stddev", value(histogram.std_dev));

        let percentiles =
            [histogram.median, histogram.p75, histogram.p95, histogram.p98, histogram.p99, histogram.p999];
        for (quantile, v) in self.quantiles.iter().zip(percentiles) {
            block.field(quantile.label(), value(v));
        }
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for TextFormatter {
    fn format(&self, snapshots: &[NamedSnapshot]) -> Result<String, ReporterError> {
        Ok(self.render(snapshots, Utc::now()))
    }
}

/// Field lines of one metric, with labels right-aligned against the `=`.
#[derive(Default)]
struct Block {
    fields: Vec<(String, String)>,
}

impl Block {
    fn field(&mut self, label: &str, value: impl ToString) {
        self.fields.push((label.to_string(), value.to_string()));
    }

    fn write_to(&self, output: &mut String) {
        let width = self.fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 4;
        for (label, value) in &self.fields {
            let _ = writeln!(output, "{:>width$} = {}", label, value, width = width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TextFormatter;
    use chrono::{TimeZone, Utc};
    use metered::{Metrics, SampleType, TimeUnit};

    #[test]
    fn test_header_and_blocks() {
        let metrics = Metrics::new();
        metrics.counter(("jobs", "processed")).unwrap().increment_by(4);
        metrics.gauge("temperature", || 21.5).unwrap();

        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let output = TextFormatter::new().render(&metrics.snapshot(), now);
        let lines = output.lines().collect::<Vec<_>>();

        assert!(lines[0].starts_with("== 2024-05-01T12:00:00Z ="));
        assert_eq!(lines[0].len(), 80);
        assert_eq!(
            &lines[1..],
            &["", "temperature", "    value = 21.5", "", "jobs.processed", "    count = 4", ""]
        );
    }

    #[test]
    fn test_histogram_and_timer_fields() {
        let metrics = Metrics::new();
        let histogram = metrics.histogram("sizes", SampleType::Uniform).unwrap();
        for v in 1..=100 {
            histogram.update(v);
        }
        let timer =
            metrics.timer("latency", TimeUnit::Milliseconds, TimeUnit::Seconds).unwrap();
        timer.update(std::time::Duration::from_millis(20));

        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let output = TextFormatter::default().render(&metrics.snapshot(), now);

        for label in ["median =", "p75 =", "p95 =", "p98 =", "p99 =", "p999 =", "stddev ="] {
            assert!(output.contains(label), "missing {} in {}", label, output);
        }
        assert!(output.contains("  min = 1.00\n"));
        assert!(output.contains("  max = 20.00 ms\n"));
        assert!(output.contains("  mean rate = "));
        assert!(output.contains(" calls/s\n"));
        assert_eq!(output.matches("count =").count(), 2);
    }
}
