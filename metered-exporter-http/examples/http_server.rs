use std::thread;
use std::time::{Duration, Instant};

use metered::{Metrics, SampleType, TimeUnit};
use metered_exporter_http::MetricsListener;
use rand::Rng;

fn main() {
    tracing_subscriber::fmt::init();

    let metrics = Metrics::new();
    let mut listener = MetricsListener::new(metrics.clone());
    let address = listener.start(9000).expect("failed to start metrics listener");
    println!("serving metrics on http://{}/metrics", address);

    let server_loops = metrics.counter(("server", "loops")).expect("counter already registered");
    let payload_sizes = metrics
        .histogram(("server", "payload_size"), SampleType::Biased)
        .expect("histogram already registered");
    let handled = metrics
        .meter(("server", "requests"), "requests", TimeUnit::Seconds)
        .expect("meter already registered");
    let latency = metrics
        .timer(("server", "latency"), TimeUnit::Milliseconds, TimeUnit::Seconds)
        .expect("timer already registered");
    let started = Instant::now();
    metrics
        .gauge("uptime_secs", move || started.elapsed().as_secs())
        .expect("gauge already registered");

    let mut rng = rand::rng();

    // Loop over and over, pretending to do some work.
    loop {
        server_loops.increment();
        handled.mark_n(rng.random_range(1..10));
        payload_sizes.update(rng.random_range(128..65536));
        latency.time(|| thread::sleep(Duration::from_millis(rng.random_range(1..50))));
    }
}
