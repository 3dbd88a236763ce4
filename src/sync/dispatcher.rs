use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{error, info};

use super::fetcher::{Synchronizer, Trigger};
use crate::api::{ControlRequest, RemoteSource};
use crate::error::{AppError, Result};
use crate::models::LightColor;
use crate::telemetry::is_online;

/// User-facing signals that must not be swallowed by logging alone.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    ControlFailed {
        device_id: String,
        color: LightColor,
        reason: String,
    },
}

/// Sends control intents and schedules the settle-and-refresh.
///
/// The write is never applied optimistically; local state only changes when
/// the delayed refresh reads back what the backend settled on.
pub struct Dispatcher {
    source: Arc<dyn RemoteSource>,
    sync: Arc<Synchronizer>,
    settle_delay: Duration,
    notices: broadcast::Sender<Notice>,
}

impl Dispatcher {
    pub fn new(
        source: Arc<dyn RemoteSource>,
        sync: Arc<Synchronizer>,
        settle_delay: Duration,
        notices: broadcast::Sender<Notice>,
    ) -> Self {
        Self {
            source,
            sync,
            settle_delay,
            notices,
        }
    }

    /// Check the intent against the local snapshot before spending a round trip.
    fn precheck(&self, device_id: &str, color: &LightColor) -> Result<()> {
        if !color.is_sendable() {
            return Err(AppError::InvalidColor(color.to_string()));
        }

        let last_seen = self
            .sync
            .store()
            .read(|snapshot| snapshot.device(device_id).map(|d| d.last_seen))
            .ok_or_else(|| AppError::UnknownDevice(device_id.to_string()))?;

        if !is_online(last_seen, Utc::now()) {
            return Err(AppError::DeviceOffline(device_id.to_string()));
        }

        Ok(())
    }

    pub async fn send(&self, device_id: &str, led_id: Option<u32>, color: LightColor) -> Result<()> {
        self.precheck(device_id, &color)?;

        let request = ControlRequest {
            device_id: device_id.to_string(),
            led_id,
            color,
        };

        let outcome = self
            .source
            .control(&request)
            .await
            .and_then(|response| response.into_result());

        if let Err(e) = outcome {
            error!(
                device_id = %request.device_id,
                color = %request.color,
                error = %e,
                "control command failed"
            );
            // Nobody listening is fine; the caller still gets the error
            let _ = self.notices.send(Notice::ControlFailed {
                device_id: request.device_id,
                color: request.color,
                reason: e.to_string(),
            });
            return Err(e);
        }

        info!(
            device_id = %request.device_id,
            led_id = ?request.led_id,
            color = %request.color,
            "control command accepted"
        );

        let sync = Arc::clone(&self.sync);
        let delay = self.settle_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sync.refresh_all(Trigger::Settle).await;
        });

        Ok(())
    }
}
