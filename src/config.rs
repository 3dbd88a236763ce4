use crate::error::{AppError, Result};
use crate::models::EnergyWindow;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const API_URL_ENV: &str = "LIGHTING_API_URL";
pub const WS_URL_ENV: &str = "LIGHTING_WS_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root for all REST calls, e.g. "http://localhost:5000"
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_command_limit")]
    pub command_limit: u32,
    #[serde(default)]
    pub energy_window_hours: EnergyWindow,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000".into()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_ws_url() -> String {
    "ws://localhost:5000/ws".into()
}

fn default_reconnect_delay_ms() -> u64 {
    5_000
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_command_limit() -> u32 {
    20
}

fn default_settle_delay_ms() -> u64 {
    500
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            command_limit: default_command_limit(),
            energy_window_hours: EnergyWindow::default(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl PushConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Config {
    /// Load configuration from a YAML file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the file if it exists, otherwise fall back to the built-in defaults.
    /// Environment overrides apply in both cases.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = if path.as_ref().exists() {
            Self::parse_yaml(&std::fs::read_to_string(path)?)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config = Self::parse_yaml(content)?;

        config.validate()?;

        Ok(config)
    }

    /// Expand and deserialize without validating
    fn parse_yaml(content: &str) -> Result<Self> {
        // Expand environment variables in the format $(VAR_NAME)
        let expanded = expand_env_vars(content);

        Ok(serde_yaml::from_str(&expanded)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.is_empty() {
                self.api.base_url = url;
            }
        }

        if let Ok(url) = std::env::var(WS_URL_ENV) {
            if !url.is_empty() {
                self.push.ws_url = url;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let base = self.api.base_url.as_str();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                base
            )));
        }

        let ws = self.push.ws_url.as_str();
        if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
            return Err(AppError::Config(format!(
                "push.ws_url must be a ws(s) URL, got '{}'",
                ws
            )));
        }

        if self.push.reconnect_delay_ms == 0 {
            return Err(AppError::Config(
                "push.reconnect_delay_ms cannot be 0".to_string(),
            ));
        }

        if self.sync.poll_interval_ms == 0 {
            return Err(AppError::Config(
                "sync.poll_interval_ms cannot be 0".to_string(),
            ));
        }

        if self.sync.command_limit == 0 {
            return Err(AppError::Config(
                "sync.command_limit cannot be 0".to_string(),
            ));
        }

        if self.api.request_timeout_ms == 0 {
            return Err(AppError::Config(
                "api.request_timeout_ms cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Expand environment variables in the format $(VAR_NAME)
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();

    let re = match regex::Regex::new(r"\$\(([A-Z_][A-Z0-9_]*)\)") {
        Ok(re) => re,
        Err(_) => return result,
    };

    for cap in re.captures_iter(content) {
        let full_match = &cap[0];
        let var_name = &cap[1];

        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(full_match, &value);
        }
    }

    result
}
