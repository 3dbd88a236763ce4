use serde_json::Value;

/// Messages the backend pushes over the notification channel
#[derive(Debug, Clone, PartialEq)]
pub enum PushNotification {
    CommandExecuted { data: Value },
    StatusUpdate { data: Value },
    /// Any other `type`, e.g. "command_failed"
    Other(String),
}

impl PushNotification {
    /// Whether this notification means backend state moved.
    pub fn requires_refresh(&self) -> bool {
        matches!(
            self,
            PushNotification::CommandExecuted { .. } | PushNotification::StatusUpdate { .. }
        )
    }

    pub fn kind(&self) -> &str {
        match self {
            PushNotification::CommandExecuted { .. } => "command_executed",
            PushNotification::StatusUpdate { .. } => "status_update",
            PushNotification::Other(kind) => kind,
        }
    }

    pub fn device_id(&self) -> Option<&str> {
        match self {
            PushNotification::CommandExecuted { data }
            | PushNotification::StatusUpdate { data } => {
                data.get("device_id").and_then(Value::as_str)
            }
            PushNotification::Other(_) => None,
        }
    }
}

/// Parse one text frame.
///
/// Not JSON at all is an error. The kind is decided by the `type` string
/// alone, so odd values in other fields never hide a notification. JSON
/// without a string `type` is `Ok(None)` and simply ignored.
pub fn parse_frame(text: &str) -> Result<Option<PushNotification>, serde_json::Error> {
    let mut value: Value = serde_json::from_str(text)?;

    let Some(kind) = value.get("type").and_then(Value::as_str).map(str::to_owned) else {
        return Ok(None);
    };
    let data = value
        .get_mut("data")
        .map(Value::take)
        .unwrap_or(Value::Null);

    Ok(Some(match kind.as_str() {
        "command_executed" => PushNotification::CommandExecuted { data },
        "status_update" => PushNotification::StatusUpdate { data },
        _ => PushNotification::Other(kind),
    }))
}
