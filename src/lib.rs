pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod push;
pub mod state;
pub mod sync;
pub mod telemetry;
pub mod view;

// Re-export commonly used items
pub use api::{ApiClient, RemoteSource};
pub use config::Config;
pub use engine::SyncEngine;
pub use error::{AppError, Result};
pub use models::{EnergyWindow, LightColor};
pub use push::LinkState;
pub use state::Snapshot;
pub use sync::Notice;
pub use view::DashboardView;
