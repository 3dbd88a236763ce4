use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::timestamp;
use crate::error::AppError;

/// Look-back window for energy queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum EnergyWindow {
    LastHour,
    LastSixHours,
    #[default]
    Day,
    Week,
}

impl EnergyWindow {
    pub const ALL: [EnergyWindow; 4] = [
        EnergyWindow::LastHour,
        EnergyWindow::LastSixHours,
        EnergyWindow::Day,
        EnergyWindow::Week,
    ];

    pub fn hours(self) -> u32 {
        match self {
            EnergyWindow::LastHour => 1,
            EnergyWindow::LastSixHours => 6,
            EnergyWindow::Day => 24,
            EnergyWindow::Week => 168,
        }
    }
}

impl TryFrom<u32> for EnergyWindow {
    type Error = AppError;

    fn try_from(hours: u32) -> Result<Self, Self::Error> {
        EnergyWindow::ALL
            .into_iter()
            .find(|w| w.hours() == hours)
            .ok_or_else(|| {
                AppError::Config(format!(
                    "energy window must be one of 1, 6, 24 or 168 hours, got {}",
                    hours
                ))
            })
    }
}

impl From<EnergyWindow> for u32 {
    fn from(window: EnergyWindow) -> Self {
        window.hours()
    }
}

impl fmt::Display for EnergyWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnergyWindow::Week => f.write_str("7d"),
            other => write!(f, "{}h", other.hours()),
        }
    }
}

/// Aggregate consumption over a look-back window.
///
/// Every field is nullable on the wire: the backend's SUM/AVG over an empty
/// window yields null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergySummary {
    #[serde(default)]
    pub total_energy_wh: Option<f64>,
    /// Seconds
    #[serde(default)]
    pub total_duration: Option<f64>,
    /// Watts
    #[serde(default)]
    pub avg_power: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub entries: u64,
}

/// One timeline sample; `energy_wh` is the delta consumed in that sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyTimelineEntry {
    #[serde(
        default,
        alias = "time_hour",
        deserialize_with = "timestamp::deserialize_lenient"
    )]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub energy_wh: Option<f64>,
    #[serde(default)]
    pub power_watts: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineResponse {
    #[serde(default)]
    pub timeline: Vec<EnergyTimelineEntry>,
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}
