pub mod color;
pub mod command;
pub mod device;
pub mod energy;
pub mod timestamp;

pub use color::LightColor;
pub use command::{CommandRecord, CommandsResponse};
pub use device::{ColorSlot, Device, DevicesResponse};
pub use energy::{EnergySummary, EnergyTimelineEntry, EnergyWindow, TimelineResponse};
