use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tracing::info;

use crate::api::{ApiClient, RemoteSource};
use crate::config::Config;
use crate::error::Result;
use crate::models::{EnergyWindow, LightColor};
use crate::push::{LinkState, PushCoordinator};
use crate::state::{Snapshot, Store};
use crate::sync::{Dispatcher, Notice, Poller, Synchronizer, Trigger};
use crate::view::DashboardView;

const NOTICE_CAPACITY: usize = 32;

/// Wires the store, fetchers, poller, push channel and dispatcher together
/// behind a start/stop lifecycle.
///
/// The presentation layer reads through [`SyncEngine::snapshot`] or
/// [`SyncEngine::subscribe`] and forwards user intents through
/// [`SyncEngine::send_control`] and [`SyncEngine::set_energy_window`].
pub struct SyncEngine {
    store: Arc<Store>,
    sync: Arc<Synchronizer>,
    poller: Poller,
    push: PushCoordinator,
    dispatcher: Dispatcher,
    notices: broadcast::Sender<Notice>,
    poll_interval: Duration,
    started: Mutex<bool>,
}

impl SyncEngine {
    pub fn new(config: &Config, source: Arc<dyn RemoteSource>) -> Self {
        let store = Arc::new(Store::new());
        let sync = Arc::new(Synchronizer::new(
            Arc::clone(&source),
            Arc::clone(&store),
            &config.sync,
        ));
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        Self {
            poller: Poller::new(Arc::clone(&sync)),
            push: PushCoordinator::new(&config.push, Arc::clone(&sync)),
            dispatcher: Dispatcher::new(
                source,
                Arc::clone(&sync),
                config.sync.settle_delay(),
                notices.clone(),
            ),
            store,
            sync,
            notices,
            poll_interval: config.sync.poll_interval(),
            started: Mutex::new(false),
        }
    }

    /// Engine talking to the REST backend named in `config`.
    pub fn connect(config: &Config) -> Result<Self> {
        let client = ApiClient::new(&config.api)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    /// Kick off the initial load, open the push channel and start polling.
    /// Calling it again while running does nothing.
    pub fn start(&self) {
        let mut started = self.started.lock().unwrap_or_else(|p| p.into_inner());
        if *started {
            return;
        }
        *started = true;

        info!("sync engine starting");
        self.sync.spawn_refresh_all(Trigger::Initial);
        self.push.start();
        self.poller.start(self.poll_interval);
    }

    /// Stop polling and close the push channel. Fetches already in flight
    /// are left to complete. Safe to call repeatedly.
    pub fn stop(&self) {
        let mut started = self.started.lock().unwrap_or_else(|p| p.into_inner());
        if !*started {
            return;
        }
        *started = false;

        self.poller.stop();
        self.push.stop();
        info!("sync engine stopped");
    }

    /// Like [`SyncEngine::stop`] but waits for the push socket to close.
    pub async fn shutdown(&self) {
        {
            let mut started = self.started.lock().unwrap_or_else(|p| p.into_inner());
            *started = false;
        }
        self.poller.stop();
        self.push.shutdown().await;
        info!("sync engine shut down");
    }

    pub fn is_running(&self) -> bool {
        *self.started.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.store.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn link_state(&self) -> LinkState {
        self.push.state()
    }

    pub fn subscribe_link_state(&self) -> watch::Receiver<LinkState> {
        self.push.subscribe_state()
    }

    pub fn dashboard(&self) -> DashboardView {
        self.store.read(|snapshot| DashboardView::build(snapshot, Utc::now()))
    }

    /// Re-read everything now, outside the poll cadence.
    pub async fn refresh(&self) {
        self.sync.refresh_all(Trigger::Manual).await;
    }

    /// Set one element of a device (or the whole device when `led_id` is
    /// `None`) to `color`. Local state only moves once the settle refresh
    /// reads the result back.
    pub async fn send_control(
        &self,
        device_id: &str,
        led_id: Option<u32>,
        color: LightColor,
    ) -> Result<()> {
        self.dispatcher.send(device_id, led_id, color).await
    }

    pub fn energy_window(&self) -> EnergyWindow {
        self.sync.energy_window()
    }

    /// Change the look-back window; a change triggers an immediate energy
    /// refresh.
    pub async fn set_energy_window(&self, window: EnergyWindow) {
        if self.sync.set_energy_window(window) {
            info!(%window, "energy window changed");
            self.sync.refresh_energy(Trigger::WindowChange).await;
        }
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
