//! Scheduled reporters for `metered`.
//!
//! A [`Reporter`] takes a snapshot of a [`Metrics`](metered::Metrics) registry on a fixed period,
//! renders it with a [`ReportFormatter`] and writes the result to a [`ReportSink`].  Three
//! formatters are provided:
//!
//! - [`TextFormatter`], a human-readable report with one block per metric
//! - [`JsonFormatter`], the same JSON served by `metered-exporter-http`
//! - [`LineProtocolFormatter`], the plaintext protocol understood by Graphite
//!
//! and two sinks: [`FileSink`], which appends to a file, and [`TcpSink`], which sends every
//! report over a fresh TCP connection.  [`GraphiteBuilder`] puts the line protocol and a TCP sink
//! together.
//!
//! ```no_run
//! use metered::{Metrics, TimeUnit};
//! use metered_reporter::{GraphiteBuilder, Reporter, TextFormatter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = Metrics::new();
//!
//! let console = Reporter::to_file("/var/log/app/metrics.log", metrics.clone(), TextFormatter::new());
//! console.start(1, TimeUnit::Minutes)?;
//!
//! let graphite = GraphiteBuilder::new()
//!     .with_remote_address("graphite.local:2003")?
//!     .with_prefix("app")
//!     .build(metrics);
//! graphite.start(10, TimeUnit::Seconds)?;
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

mod common;
pub use self::common::{BuildError, ReporterError, ReporterEvent, ReporterState};

mod formatter;
pub use self::formatter::{JsonFormatter, LineProtocolFormatter, ReportFormatter, TextFormatter};

mod graphite;
pub use self::graphite::GraphiteBuilder;

mod reporter;
pub use self::reporter::Reporter;

mod sink;
pub use self::sink::{FileSink, ReportSink, TcpSink};
