mod signals;

pub use signals::setup_signal_handlers;

use crate::app::App;
use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static STOP_FLAG: AtomicBool = AtomicBool::new(false);

/// Granularity of the stop-flag check while waiting for the next batch.
const POLL_STEP: Duration = Duration::from_millis(500);

pub struct Watcher {
    app: App,
    interval: Duration,
}

impl Watcher {
    pub fn new(app: App, interval: Duration) -> Self {
        Self { app, interval }
    }

    /// Runs batches back to back, `interval` apart, until a stop is
    /// requested. A failed batch is logged and the next one still runs.
    pub fn run(&self) -> Result<usize> {
        log::info!("Starting watch loop (interval: {}s)", self.interval.as_secs());
        let mut batches = 0;

        loop {
            if should_stop() {
                log::info!("Stop requested, leaving watch loop after {} batch(es)", batches);
                break;
            }

            let loop_start = Instant::now();
            match self.app.run_batch() {
                Ok(outcome) => log::info!("Batch {}: {} alert(s), best channel {}",
                    batches + 1, outcome.alerts.len(), outcome.dashboard.summary.best_channel),
                Err(e) => log::error!("Batch {} failed: {}", batches + 1, e),
            }
            batches += 1;

            self.sleep_until_next_cycle(loop_start);
        }

        Ok(batches)
    }

    fn sleep_until_next_cycle(&self, loop_start: Instant) {
        while !should_stop() {
            let elapsed = loop_start.elapsed();
            if elapsed >= self.interval {
                break;
            }
            std::thread::sleep(POLL_STEP.min(self.interval - elapsed));
        }
    }

    pub fn start(app: App, interval: Duration) -> Result<usize> {
        setup_signal_handlers()?;
        Self::new(app, interval).run()
    }
}

pub fn should_stop() -> bool {
    STOP_FLAG.load(Ordering::Relaxed)
}

pub fn set_stop_flag() {
    STOP_FLAG.store(true, Ordering::Relaxed);
}
