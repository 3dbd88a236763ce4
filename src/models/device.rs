use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::color::LightColor;
use super::timestamp;

/// The color of one controllable light element on a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSlot {
    /// `None` for single-element devices reporting only `current_color`
    #[serde(default)]
    pub led_id: Option<u32>,
    pub color: LightColor,
}

/// A networked light as last reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireDevice")]
pub struct Device {
    pub id: String,
    pub ip_address: String,
    /// Always at least one slot
    pub color_slots: Vec<ColorSlot>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl Device {
    /// Color of the first light element, the one single-element devices report.
    pub fn current_color(&self) -> &LightColor {
        static OFF: LightColor = LightColor::Off;
        self.color_slots.first().map_or(&OFF, |slot| &slot.color)
    }

    pub fn slot(&self, led_id: u32) -> Option<&ColorSlot> {
        self.color_slots.iter().find(|s| s.led_id == Some(led_id))
    }

    pub fn has_multiple_elements(&self) -> bool {
        self.color_slots.len() > 1
    }
}

#[derive(Debug, Deserialize)]
struct WireDevice {
    #[serde(alias = "device_id")]
    id: String,
    #[serde(default)]
    ip_address: String,
    #[serde(default)]
    current_color: Option<LightColor>,
    #[serde(default, alias = "color_slots")]
    leds: Option<Vec<ColorSlot>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_lenient")]
    last_seen: Option<DateTime<Utc>>,
}

impl From<WireDevice> for Device {
    fn from(wire: WireDevice) -> Self {
        let mut color_slots = wire.leds.unwrap_or_default();
        if color_slots.is_empty() {
            color_slots.push(ColorSlot {
                led_id: None,
                color: wire.current_color.unwrap_or_default(),
            });
        }

        Self {
            id: wire.id,
            ip_address: wire.ip_address,
            color_slots,
            last_seen: wire.last_seen,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub devices: Vec<Device>,
}
