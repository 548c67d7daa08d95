//! In-process application metrics.
//!
//! `metered` keeps live statistics about what an application is doing, and exposes them as
//! point-in-time snapshots that can be served or reported elsewhere.
//!
//! # Metric types
//!
//! - [`Counter`]: a signed count that can be incremented and decremented.
//! - [`Gauge`]: a value read on demand from a callback, such as the length of a queue.
//! - [`Meter`]: the rate at which events occur, as a mean rate plus 1, 5 and 15-minute
//!   exponentially-weighted moving averages.
//! - [`Histogram`]: the distribution of a stream of values, estimated from a bounded sample.
//! - [`Timer`]: a meter and a histogram of durations, for timing an operation.
//!
//! # Registry
//!
//! Metrics are usually created through a [`Metrics`] registry, which maps each [`MetricName`] to
//! exactly one metric and keeps the moving averages of meters and timers ticking:
//!
//! ```rust
//! use metered::{Metrics, MetricName, SampleType, TimeUnit};
//!
//! # fn main() -> Result<(), metered::RegistryError> {
//! let metrics = Metrics::new();
//!
//! let name = MetricName::new("server", "requests");
//! let requests = metrics.meter(name, "requests", TimeUnit::Seconds)?;
//! requests.mark();
//!
//! let latency = metrics.timer("latency", TimeUnit::Milliseconds, TimeUnit::Seconds)?;
//! let response = latency.time(|| "hello");
//! assert_eq!(response, "hello");
//!
//! let sizes = metrics.histogram("response_size", SampleType::Uniform)?;
//! sizes.update(512);
//!
//! let json = metrics.to_json().expect("snapshot should serialize");
//! assert!(json.contains("server.requests"));
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

mod counter;
pub use self::counter::Counter;

mod gauge;
pub use self::gauge::{Gauge, GaugeValue};

mod histogram;
pub use self::histogram::{Histogram, SampleType};

mod kind;
pub use self::kind::{Metric, MetricKind};

mod meter;
pub use self::meter::Meter;

mod name;
pub use self::name::MetricName;

mod registry;
pub use self::registry::{Metrics, RegistryError};

pub mod snapshot;
pub use self::snapshot::{MetricSnapshot, NamedSnapshot};

mod ticker;

mod timer;
pub use self::timer::{Timer, TimerContext};

pub use metered_util::TimeUnit;
