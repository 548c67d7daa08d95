use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, select, tick, unbounded, Receiver, Sender, TryRecvError};
use metered::Metrics;
use metered_util::TimeUnit;
use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::{FileSink, ReportFormatter, ReportSink, ReporterError, ReporterEvent, ReporterState};

const THREAD_NAME: &str = "metered-reporter";

struct Shared {
    metrics: Metrics,
    formatter: Box<dyn ReportFormatter>,
    sink: Mutex<Box<dyn ReportSink>>,
    runs: AtomicU64,
}

impl Shared {
    fn run(&self) -> Result<usize, ReporterError> {
        let report = self.formatter.format(&self.metrics.snapshot())?;
        self.sink.lock().write_report(report.as_bytes())?;
        self.runs.fetch_add(1, Ordering::AcqRel);
        Ok(report.len())
    }
}

struct Running {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

enum State {
    Idle,
    Running(Running),
    Stopped,
}

impl State {
    fn as_state(&self) -> ReporterState {
        match self {
            State::Idle => ReporterState::Idle,
            State::Running(_) => ReporterState::Running,
            State::Stopped => ReporterState::Stopped,
        }
    }
}

/// Periodically writes a formatted snapshot of a registry to a sink.
///
/// A reporter starts [`Idle`](ReporterState::Idle).  [`start`](Reporter::start) moves it to
/// [`Running`](ReporterState::Running), reporting every period on a background thread, and
/// [`stop`](Reporter::stop) moves it to [`Stopped`](ReporterState::Stopped), after which it never
/// reports on a schedule again.  A report can also be produced at any time with
/// [`run`](Reporter::run).
///
/// Failures while reporting on a schedule are logged and do not interrupt the schedule.
pub struct Reporter {
    shared: Arc<Shared>,
    state: Mutex<State>,
    subscribers: Mutex<Vec<Sender<ReporterEvent>>>,
}

impl Reporter {
    /// Creates a new `Reporter` rendering `metrics` with `formatter` and writing to `sink`.
    pub fn new<F, S>(metrics: Metrics, formatter: F, sink: S) -> Self
    where
        F: ReportFormatter + 'static,
        S: ReportSink + 'static,
    {
        Reporter {
            shared: Arc::new(Shared {
                metrics,
                formatter: Box::new(formatter),
                sink: Mutex::new(Box::new(sink)),
                runs: AtomicU64::new(0),
            }),
            state: Mutex::new(State::Idle),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Creates a new `Reporter` appending reports to the file at `path`.
    pub fn to_file<P, F>(path: P, metrics: Metrics, formatter: F) -> Self
    where
        P: AsRef<Path>,
        F: ReportFormatter + 'static,
    {
        Reporter::new(metrics, formatter, FileSink::new(path))
    }

    /// Starts reporting every `period` of `unit`.
    ///
    /// The first report happens one full period after starting.  [`ReporterEvent::Started`] is
    /// sent to subscribers before this returns.
    ///
    /// ## Errors
    ///
    /// Fails if the reporter is not idle, if the period is zero, or if the reporting thread could
    /// not be spawned.
    pub fn start(&self, period: u64, unit: TimeUnit) -> Result<(), ReporterError> {
        let mut state = self.state.lock();
        if !matches!(*state, State::Idle) {
            return Err(ReporterError::InvalidState(state.as_state()));
        }

        let interval = unit.to_duration(period);
        if interval.is_zero() {
            return Err(ReporterError::InvalidPeriod);
        }

        let (stop, stop_rx) = bounded::<()>(0);
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run_scheduled(&shared, &stop_rx, &tick(interval)))
            .map_err(ReporterError::Spawn)?;

        *state = State::Running(Running { stop, handle });
        debug!(?interval, "reporter started");

        // Sent before releasing the state so a concurrent stop cannot notify first.
        self.notify(ReporterEvent::Started);
        drop(state);
        Ok(())
    }

    /// Renders the current snapshot and writes it to the sink.
    ///
    /// This can be called in any state, and does not count against the schedule.
    ///
    /// ## Errors
    ///
    /// Fails if the snapshot could not be rendered or written.
    pub fn run(&self) -> Result<(), ReporterError> {
        self.shared.run().map(|_| ())
    }

    /// Number of reports written successfully so far.
    pub fn runs(&self) -> u64 {
        self.shared.runs.load(Ordering::Acquire)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ReporterState {
        self.state.lock().as_state()
    }

    /// Subscribes to lifecycle notifications.
    ///
    /// Each subscriber receives every transition that happens after it subscribed, once.
    pub fn subscribe(&self) -> Receiver<ReporterEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Stops reporting.
    ///
    /// Waits for a report in progress to finish.  [`ReporterEvent::Stopped`] is sent to
    /// subscribers before this returns.  Stopping a reporter that is not running does nothing.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        let Running { stop, handle } = match std::mem::replace(&mut *state, State::Stopped) {
            State::Running(running) => running,
            other => {
                *state = other;
                return;
            }
        };
        drop(state);

        drop(stop);
        if handle.join().is_err() {
            error!("reporter thread panicked");
        }
        debug!(runs = self.runs(), "reporter stopped");
        self.notify(ReporterEvent::Stopped);
    }

    fn notify(&self, event: ReporterEvent) {
        // Subscribers that went away are dropped.
        self.subscribers.lock().retain(|subscriber| subscriber.send(event).is_ok());
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_scheduled(shared: &Shared, stop: &Receiver<()>, ticker: &Receiver<Instant>) {
    loop {
        select! {
            recv(stop) -> _ => break,
            recv(ticker) -> _ => {
                // A stop that raced with the tick wins.
                if !matches!(stop.try_recv(), Err(TryRecvError::Empty)) {
                    break;
                }

                match shared.run() {
                    Ok(bytes) => trace!(bytes, "report written"),
                    Err(e) => error!(error = %e, "failed to write report"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Reporter;
    use crate::{JsonFormatter, ReportSink, ReporterError, ReporterEvent, ReporterState};
    use metered::Metrics;
    use metered_util::TimeUnit;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MemorySink(Arc<Mutex<Vec<String>>>);

    impl ReportSink for MemorySink {
        fn write_report(&mut self, report: &[u8]) -> io::Result<()> {
            self.0.lock().unwrap().push(String::from_utf8_lossy(report).into_owned());
            Ok(())
        }
    }

    #[test]
    fn test_run_directly() {
        let metrics = Metrics::new();
        metrics.counter("counter").unwrap().increment();
        let sink = MemorySink::default();
        let reporter = Reporter::new(metrics, JsonFormatter::new(), sink.clone());

        reporter.run().unwrap();
        reporter.run().unwrap();

        assert_eq!(reporter.runs(), 2);
        assert_eq!(reporter.state(), ReporterState::Idle);
        let reports = sink.0.lock().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0], "[{\"name\":\"counter\",\"metric\":{\"count\":1}}]\n");
    }

    #[test]
    fn test_lifecycle() {
        let reporter = Reporter::new(Metrics::new(), JsonFormatter::new(), MemorySink::default());
        let events = reporter.subscribe();

        // Stopping an idle reporter does nothing.
        reporter.stop();
        assert_eq!(reporter.state(), ReporterState::Idle);
        assert!(events.try_recv().is_err());

        reporter.start(1, TimeUnit::Hours).unwrap();
        assert_eq!(reporter.state(), ReporterState::Running);
        assert_eq!(events.try_recv(), Ok(ReporterEvent::Started));

        match reporter.start(1, TimeUnit::Hours) {
            Err(ReporterError::InvalidState(ReporterState::Running)) => {}
            other => panic!("expected InvalidState, got {:?}", other),
        }

        reporter.stop();
        reporter.stop();
        assert_eq!(reporter.state(), ReporterState::Stopped);
        assert_eq!(events.try_iter().collect::<Vec<_>>(), vec![ReporterEvent::Stopped]);

        match reporter.start(1, TimeUnit::Hours) {
            Err(ReporterError::InvalidState(ReporterState::Stopped)) => {}
            other => panic!("expected InvalidState, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_period() {
        let reporter = Reporter::new(Metrics::new(), JsonFormatter::new(), MemorySink::default());
        assert!(matches!(reporter.start(0, TimeUnit::Seconds), Err(ReporterError::InvalidPeriod)));
        assert_eq!(reporter.state(), ReporterState::Idle);
    }

    #[test]
    fn test_every_subscriber_is_notified() {
        let reporter = Reporter::new(Metrics::new(), JsonFormatter::new(), MemorySink::default());
        let first = reporter.subscribe();
        let second = reporter.subscribe();

        reporter.start(1, TimeUnit::Hours).unwrap();
        drop(reporter);

        for events in [first, second] {
            assert_eq!(
                events.iter().collect::<Vec<_>>(),
                vec![ReporterEvent::Started, ReporterEvent::Stopped]
            );
        }
    }

    #[test]
    fn test_started_precedes_stopped_under_concurrent_stop() {
        for _ in 0..50 {
            let reporter =
                Arc::new(Reporter::new(Metrics::new(), JsonFormatter::new(), MemorySink::default()));
            let events = reporter.subscribe();

            let stopper = {
                let reporter = Arc::clone(&reporter);
                std::thread::spawn(move || {
                    while reporter.state() == ReporterState::Idle {
                        std::thread::yield_now();
                    }
                    reporter.stop();
                })
            };

            reporter.start(1, TimeUnit::Hours).unwrap();
            stopper.join().expect("stop thread panicked");

            assert_eq!(reporter.state(), ReporterState::Stopped);
            assert_eq!(
                events.try_iter().collect::<Vec<_>>(),
                vec![ReporterEvent::Started, ReporterEvent::Stopped]
            );
        }
    }
}
