pub mod client;
pub mod control;
pub mod resources;

use async_trait::async_trait;

pub use client::ApiClient;
pub use control::{ControlRequest, ControlResponse};

use crate::error::Result;
use crate::models::{CommandRecord, Device, EnergySummary, EnergyTimelineEntry, EnergyWindow};

/// The remote source of truth the engine synchronizes against.
///
/// `ApiClient` is the production implementation; tests substitute their own.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn devices(&self) -> Result<Vec<Device>>;

    async fn commands(&self, limit: u32) -> Result<Vec<CommandRecord>>;

    async fn energy_summary(&self, window: EnergyWindow) -> Result<EnergySummary>;

    async fn energy_timeline(&self, window: EnergyWindow) -> Result<Vec<EnergyTimelineEntry>>;

    async fn control(&self, request: &ControlRequest) -> Result<ControlResponse>;
}
