use std::thread;
use std::time::Duration;

use metered::{Metrics, TimeUnit};
use metered_reporter::{GraphiteBuilder, Reporter, TextFormatter};
use rand::Rng;

fn main() {
    tracing_subscriber::fmt::init();

    let metrics = Metrics::new();

    let graphite = GraphiteBuilder::new()
        .with_remote_address("localhost:2003")
        .expect("failed to parse remote address")
        .with_prefix("demo")
        .build(metrics.clone());
    graphite.start(10, TimeUnit::Seconds).expect("failed to start Graphite reporter");

    let console = Reporter::to_file("metrics.log", metrics.clone(), TextFormatter::new());
    console.start(30, TimeUnit::Seconds).expect("failed to start file reporter");

    let jobs = metrics.counter(("worker", "jobs")).expect("counter already registered");
    let duration = metrics
        .timer(("worker", "job_duration"), TimeUnit::Milliseconds, TimeUnit::Seconds)
        .expect("timer already registered");

    let mut rng = rand::rng();
    loop {
        jobs.increment();
        duration.time(|| thread::sleep(Duration::from_millis(rng.random_range(5..200))));
    }
}
