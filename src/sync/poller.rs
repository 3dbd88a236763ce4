use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::fetcher::{Synchronizer, Trigger};

/// Fixed-period refresh that runs regardless of push channel health.
pub struct Poller {
    sync: Arc<Synchronizer>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    pub fn new(sync: Arc<Synchronizer>) -> Self {
        Self {
            sync,
            task: Mutex::new(None),
        }
    }

    /// Start ticking every `period`, first tick one period from now.
    /// Restarting replaces the previous timer.
    pub fn start(&self, period: Duration) {
        let mut task = self.task.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let sync = Arc::clone(&self.sync);
        *task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                debug!("poll tick");
                // Spawned so that stopping the poller never cancels a fetch in flight
                sync.spawn_refresh_all(Trigger::Poll);
            }
        }));

        info!(period_ms = period.as_millis() as u64, "polling started");
    }

    /// Safe to call repeatedly.
    pub fn stop(&self) {
        let mut task = self.task.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(handle) = task.take() {
            handle.abort();
            info!("polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
