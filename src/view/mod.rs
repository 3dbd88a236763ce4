//! Presentation-ready values derived from a [`Snapshot`].
//!
//! Everything here is recomputed on read from the canonical numeric fields
//! and never stored back.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{CommandRecord, Device, EnergySummary};
use crate::state::Snapshot;
use crate::telemetry::{
    cumulative_series, format_clock, format_duration, format_last_seen, format_total, is_online,
    ChartPoint, Quantity,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub led_id: Option<u32>,
    pub color: String,
    pub is_off: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceView {
    pub id: String,
    pub ip_address: String,
    pub online: bool,
    pub last_seen: String,
    pub slots: Vec<SlotView>,
}

impl DeviceView {
    pub fn from_device(device: &Device, now: DateTime<Utc>) -> Self {
        Self {
            id: device.id.clone(),
            ip_address: device.ip_address.clone(),
            online: is_online(device.last_seen, now),
            last_seen: format_last_seen(device.last_seen, now),
            slots: device
                .color_slots
                .iter()
                .map(|slot| SlotView {
                    led_id: slot.led_id,
                    color: slot.color.to_string(),
                    is_off: slot.color.is_off(),
                })
                .collect(),
        }
    }

    /// Controls are only offered for devices that can act on them.
    pub fn controls_enabled(&self) -> bool {
        self.online
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandView {
    pub id: i64,
    pub device_id: String,
    pub text: String,
    pub success: bool,
    pub time: String,
}

impl From<&CommandRecord> for CommandView {
    fn from(record: &CommandRecord) -> Self {
        Self {
            id: record.id,
            device_id: record.device_id.clone(),
            text: record.display_text().to_string(),
            success: record.success,
            time: record.timestamp.map(format_clock).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub total_energy: String,
    pub total_duration: String,
    pub avg_power: String,
    pub entries: String,
}

impl SummaryView {
    /// A missing summary (not fetched yet) renders the same as an empty window.
    pub fn from_summary(summary: Option<&EnergySummary>) -> Self {
        let summary = summary.cloned().unwrap_or_default();
        Self {
            total_energy: format_total(summary.total_energy_wh, Quantity::Energy),
            total_duration: format_duration(summary.total_duration),
            avg_power: format_total(summary.avg_power, Quantity::Power),
            entries: summary.entries.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub devices: Vec<DeviceView>,
    pub commands: Vec<CommandView>,
    pub summary: SummaryView,
    #[serde(skip)]
    pub chart: Vec<ChartPoint>,
}

impl DashboardView {
    pub fn build(snapshot: &Snapshot, now: DateTime<Utc>) -> Self {
        Self {
            devices: snapshot
                .devices
                .iter()
                .map(|device| DeviceView::from_device(device, now))
                .collect(),
            commands: snapshot.commands.iter().map(CommandView::from).collect(),
            summary: SummaryView::from_summary(snapshot.energy_summary.as_ref()),
            chart: cumulative_series(&snapshot.energy_timeline),
        }
    }

    pub fn online_count(&self) -> usize {
        self.devices.iter().filter(|d| d.online).count()
    }

    /// One-line digest for logs.
    pub fn headline(&self) -> String {
        let total = self
            .chart
            .last()
            .map(ChartPoint::total_label)
            .unwrap_or_else(|| self.summary.total_energy.clone());
        format!(
            "{}/{} devices online, {} commands, {} over {} ({} events, avg {})",
            self.online_count(),
            self.devices.len(),
            self.commands.len(),
            total,
            self.summary.total_duration,
            self.summary.entries,
            self.summary.avg_power,
        )
    }
}
