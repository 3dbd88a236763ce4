use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::LightColor;

/// Body of `POST /api/control`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlRequest {
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub led_id: Option<u32>,
    pub color: LightColor,
}

/// The backend answers 200 even for rejected commands and reports the
/// outcome in the body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ControlResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ControlResponse {
    /// A missing `success` flag on a 2xx response counts as accepted.
    pub fn into_result(self) -> Result<()> {
        match self.success {
            Some(false) => Err(AppError::ControlRejected(
                self.error
                    .unwrap_or_else(|| "backend reported failure".to_string()),
            )),
            _ => Ok(()),
        }
    }
}
