use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::format::{format_clock, format_energy, format_power};
use crate::models::EnergyTimelineEntry;

/// How far before the first sample the synthetic baseline point sits.
pub const BASELINE_LEAD_SECS: i64 = 60;

/// A chart-ready sample with running energy total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub time: Option<DateTime<Utc>>,
    pub cumulative_energy_wh: f64,
    pub power_watts: f64,
    pub energy_delta_wh: f64,
    /// `None` on the baseline point and on samples without a reported color
    pub color: Option<String>,
    pub baseline: bool,
}

impl ChartPoint {
    pub fn time_label(&self) -> String {
        self.time.map(format_clock).unwrap_or_default()
    }

    pub fn total_label(&self) -> String {
        format_energy(self.cumulative_energy_wh)
    }

    /// Shown only for samples that added energy
    pub fn delta_label(&self) -> Option<String> {
        (self.energy_delta_wh > 0.0).then(|| format!("+{}", format_energy(self.energy_delta_wh)))
    }

    pub fn power_label(&self) -> Option<String> {
        (self.power_watts > 0.0).then(|| format_power(self.power_watts))
    }

    pub fn color_label(&self) -> &str {
        match (&self.color, self.baseline) {
            (_, true) => "Start",
            (Some(color), false) => color,
            (None, false) => "N/A",
        }
    }
}

/// Negative, missing and non-finite deltas contribute nothing.
fn sanitize(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// Turn an ascending timeline into a cumulative series.
///
/// A zero baseline point stamped one minute before the first sample is
/// prepended so area charts start from a visible floor. Empty in, empty out.
pub fn cumulative_series(timeline: &[EnergyTimelineEntry]) -> Vec<ChartPoint> {
    let Some(first) = timeline.first() else {
        return Vec::new();
    };

    let mut points = Vec::with_capacity(timeline.len() + 1);
    points.push(ChartPoint {
        time: first
            .time
            .map(|t| t - Duration::seconds(BASELINE_LEAD_SECS)),
        cumulative_energy_wh: 0.0,
        power_watts: 0.0,
        energy_delta_wh: 0.0,
        color: None,
        baseline: true,
    });

    let mut running = 0.0;
    points.extend(timeline.iter().map(|entry| {
        let delta = sanitize(entry.energy_wh);
        running += delta;

        ChartPoint {
            time: entry.time,
            cumulative_energy_wh: running,
            power_watts: entry
                .power_watts
                .filter(|p| p.is_finite())
                .unwrap_or(0.0),
            energy_delta_wh: delta,
            color: entry.color.clone(),
            baseline: false,
        }
    }));

    points
}
