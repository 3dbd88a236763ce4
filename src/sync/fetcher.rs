use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::api::RemoteSource;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::models::EnergyWindow;
use crate::state::{Resource, Store};

/// What caused a refresh; only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Initial,
    Push,
    Poll,
    Settle,
    WindowChange,
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Trigger::Initial => "initial",
            Trigger::Push => "push",
            Trigger::Poll => "poll",
            Trigger::Settle => "settle",
            Trigger::WindowChange => "window_change",
            Trigger::Manual => "manual",
        };
        f.write_str(name)
    }
}

/// The four read operations against the remote source.
///
/// Each one replaces its slice of the snapshot on success and leaves it
/// untouched on failure. They never retry; the next poll or push does.
pub struct Synchronizer {
    source: Arc<dyn RemoteSource>,
    store: Arc<Store>,
    command_limit: u32,
    window: Mutex<EnergyWindow>,
}

impl Synchronizer {
    pub fn new(source: Arc<dyn RemoteSource>, store: Arc<Store>, config: &SyncConfig) -> Self {
        Self {
            source,
            store,
            command_limit: config.command_limit,
            window: Mutex::new(config.energy_window_hours),
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn energy_window(&self) -> EnergyWindow {
        *self.window.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Returns whether the window actually changed.
    pub fn set_energy_window(&self, window: EnergyWindow) -> bool {
        let mut current = self.window.lock().unwrap_or_else(|p| p.into_inner());
        let changed = *current != window;
        *current = window;
        changed
    }

    /// `Ok(false)` means a newer response for the same resource had already
    /// been applied and this one was dropped.
    pub async fn fetch_devices(&self) -> Result<bool> {
        let ticket = self.store.issue(Resource::Devices);

        match self.source.devices().await {
            Ok(devices) => {
                debug!(count = devices.len(), "fetched devices");
                Ok(self.store.replace_devices(ticket, devices))
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch devices");
                Err(e)
            }
        }
    }

    pub async fn fetch_commands(&self, limit: Option<u32>) -> Result<bool> {
        let limit = limit.unwrap_or(self.command_limit);
        let ticket = self.store.issue(Resource::Commands);

        match self.source.commands(limit).await {
            Ok(mut commands) => {
                commands.truncate(limit as usize);
                debug!(count = commands.len(), limit, "fetched commands");
                Ok(self.store.replace_commands(ticket, commands))
            }
            Err(e) => {
                warn!(error = %e, limit, "failed to fetch commands");
                Err(e)
            }
        }
    }

    pub async fn fetch_energy_summary(&self, window: Option<EnergyWindow>) -> Result<bool> {
        let window = window.unwrap_or_else(|| self.energy_window());
        let ticket = self.store.issue(Resource::EnergySummary);

        match self.source.energy_summary(window).await {
            Ok(summary) => {
                debug!(%window, entries = summary.entries, "fetched energy summary");
                Ok(self.store.replace_energy_summary(ticket, summary))
            }
            Err(e) => {
                warn!(error = %e, %window, "failed to fetch energy summary");
                Err(e)
            }
        }
    }

    pub async fn fetch_energy_timeline(&self, window: Option<EnergyWindow>) -> Result<bool> {
        let window = window.unwrap_or_else(|| self.energy_window());
        let ticket = self.store.issue(Resource::EnergyTimeline);

        match self.source.energy_timeline(window).await {
            Ok(timeline) => {
                debug!(%window, samples = timeline.len(), "fetched energy timeline");
                Ok(self.store.replace_energy_timeline(ticket, timeline))
            }
            Err(e) => {
                warn!(error = %e, %window, "failed to fetch energy timeline");
                Err(e)
            }
        }
    }

    /// Run all four fetchers concurrently. A failure in one does not hold
    /// back or roll back the others.
    pub async fn refresh_all(&self, trigger: Trigger) {
        debug!(%trigger, "refreshing all resources");

        let _ = tokio::join!(
            self.fetch_devices(),
            self.fetch_commands(None),
            self.fetch_energy_summary(None),
            self.fetch_energy_timeline(None),
        );
    }

    pub async fn refresh_energy(&self, trigger: Trigger) {
        debug!(%trigger, "refreshing energy resources");

        let _ = tokio::join!(
            self.fetch_energy_summary(None),
            self.fetch_energy_timeline(None),
        );
    }

    /// Fire-and-forget refresh; the returned handle may be ignored.
    pub fn spawn_refresh_all(self: &Arc<Self>, trigger: Trigger) -> tokio::task::JoinHandle<()> {
        let sync = Arc::clone(self);
        tokio::spawn(async move { sync.refresh_all(trigger).await })
    }
}
