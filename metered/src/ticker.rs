use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use metered_util::TICK_INTERVAL;
use parking_lot::Mutex;
use tracing::{error, trace};

use crate::Meter;

type Meters = Arc<Mutex<Vec<Weak<Meter>>>>;

struct Running {
    // Never sent on; dropping it disconnects the channel, which stops the thread.
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Drives the moving averages of every attached meter.
///
/// The driving thread is spawned when the first meter is attached, and stops when the ticker is
/// dropped.  Meters are held weakly, and forgotten once every other handle to them is gone.
pub(crate) struct Ticker {
    interval: Duration,
    meters: Meters,
    running: Mutex<Option<Running>>,
}

impl Ticker {
    pub(crate) fn new() -> Self {
        Self::with_interval(TICK_INTERVAL)
    }

    pub(crate) fn with_interval(interval: Duration) -> Self {
        Ticker { interval, meters: Arc::default(), running: Mutex::new(None) }
    }

    pub(crate) fn attach(&self, meter: &Arc<Meter>) {
        self.meters.lock().push(Arc::downgrade(meter));

        let mut running = self.running.lock();
        if running.is_none() {
            let (stop_tx, stop_rx) = bounded(0);
            let meters = Arc::clone(&self.meters);
            let interval = self.interval;
            let spawned = thread::Builder::new()
                .name("metered-ticker".to_string())
                .spawn(move || run(interval, &meters, &stop_rx));

            match spawned {
                Ok(handle) => *running = Some(Running { stop: stop_tx, handle }),
                Err(e) => error!(error = %e, "failed to spawn meter tick thread"),
            }
        }
    }

    #[cfg(test)]
    fn attached(&self) -> usize {
        self.meters.lock().len()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(Running { stop, handle }) = self.running.get_mut().take() {
            drop(stop);
            if handle.join().is_err() {
                error!("meter tick thread panicked");
            }
        }
    }
}

fn run(interval: Duration, meters: &Meters, stop: &Receiver<()>) {
    let ticks = tick(interval);
    loop {
        select! {
            recv(stop) -> _ => break,
            recv(ticks) -> _ => tick_meters(meters),
        }
    }
    trace!("meter tick thread stopped");
}

fn tick_meters(meters: &Meters) {
    let mut meters = meters.lock();
    meters.retain(|meter| match meter.upgrade() {
        Some(meter) => {
            meter.tick();
            true
        }
        None => false,
    });
    trace!(meters = meters.len(), "ticked meters");
}
