pub mod aggregate;
pub mod format;
pub mod liveness;

pub use aggregate::{cumulative_series, ChartPoint};
pub use format::{
    format_clock, format_duration, format_energy, format_last_seen, format_power, format_total,
    Quantity,
};
pub use liveness::is_online;
