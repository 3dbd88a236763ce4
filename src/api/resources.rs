use async_trait::async_trait;

use super::client::ApiClient;
use super::control::{ControlRequest, ControlResponse};
use super::RemoteSource;
use crate::error::Result;
use crate::models::{
    CommandRecord, CommandsResponse, Device, DevicesResponse, EnergySummary, EnergyTimelineEntry,
    EnergyWindow, TimelineResponse,
};

impl ApiClient {
    /// Get every known device
    pub async fn get_devices(&self) -> Result<Vec<Device>> {
        let response: DevicesResponse = self.get("/api/devices").await?;
        Ok(response.devices)
    }

    /// Get the most recent commands, newest first
    pub async fn get_commands(&self, limit: u32) -> Result<Vec<CommandRecord>> {
        let response: CommandsResponse = self
            .get(&format!("/api/commands?limit={}", limit))
            .await?;
        Ok(response.commands)
    }

    /// Get aggregate consumption over the window
    pub async fn get_energy_stats(&self, window: EnergyWindow) -> Result<EnergySummary> {
        self.get(&format!("/api/energy/stats?hours={}", window.hours()))
            .await
    }

    /// Get the per-sample timeline over the window, oldest first
    pub async fn get_energy_timeline(
        &self,
        window: EnergyWindow,
    ) -> Result<Vec<EnergyTimelineEntry>> {
        let response: TimelineResponse = self
            .get(&format!("/api/energy/timeline?hours={}", window.hours()))
            .await?;
        Ok(response.timeline)
    }

    pub async fn post_control(&self, request: &ControlRequest) -> Result<ControlResponse> {
        self.post("/api/control", request).await
    }
}

#[async_trait]
impl RemoteSource for ApiClient {
    async fn devices(&self) -> Result<Vec<Device>> {
        self.get_devices().await
    }

    async fn commands(&self, limit: u32) -> Result<Vec<CommandRecord>> {
        self.get_commands(limit).await
    }

    async fn energy_summary(&self, window: EnergyWindow) -> Result<EnergySummary> {
        self.get_energy_stats(window).await
    }

    async fn energy_timeline(&self, window: EnergyWindow) -> Result<Vec<EnergyTimelineEntry>> {
        self.get_energy_timeline(window).await
    }

    async fn control(&self, request: &ControlRequest) -> Result<ControlResponse> {
        self.post_control(request).await
    }
}
