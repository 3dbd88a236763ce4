//! Magnitude-adaptive rendering of energy and power values.
//!
//! Values below one base unit are scaled to milli-units with two decimals,
//! everything else keeps the base unit with three decimals. Always computed
//! from the canonical Wh / W numbers, never stored.

use chrono::{DateTime, Local, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Energy,
    Power,
}

impl Quantity {
    fn base_unit(self) -> &'static str {
        match self {
            Quantity::Energy => "Wh",
            Quantity::Power => "W",
        }
    }

    fn milli_unit(self) -> &'static str {
        match self {
            Quantity::Energy => "mWh",
            Quantity::Power => "mW",
        }
    }
}

pub fn format_quantity(value: f64, quantity: Quantity) -> String {
    if value < 1.0 {
        format!("{:.2} {}", value * 1000.0, quantity.milli_unit())
    } else {
        format!("{:.3} {}", value, quantity.base_unit())
    }
}

pub fn format_energy(wh: f64) -> String {
    format_quantity(wh, Quantity::Energy)
}

pub fn format_power(watts: f64) -> String {
    format_quantity(watts, Quantity::Power)
}

/// Summary variant: a missing or zero total reads "0 Wh" / "0 W".
pub fn format_total(value: Option<f64>, quantity: Quantity) -> String {
    match value {
        Some(v) if v != 0.0 && v.is_finite() => format_quantity(v, quantity),
        _ => format!("0 {}", quantity.base_unit()),
    }
}

/// "2h 5m", "3m 12s" or "42s"
pub fn format_duration(seconds: Option<f64>) -> String {
    let total = match seconds {
        Some(s) if s > 0.0 && s.is_finite() => s.floor() as u64,
        _ => return "0s".to_string(),
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Relative heartbeat age, falling back to a local date-time after a day.
pub fn format_last_seen(last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(seen) = last_seen else {
        return "Never".to_string();
    };

    let secs = (now - seen).num_seconds().max(0);
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        seen.with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

/// Chart axis label, local wall-clock time
pub fn format_clock(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%H:%M:%S").to_string()
}
