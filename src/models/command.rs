use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::timestamp;

/// One entry of the backend's command log, newest first in the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub id: i64,
    /// Human-readable text, e.g. the recognized phrase or "Manual: RED"
    #[serde(default)]
    pub command_text: Option<String>,
    /// Normalized instruction sent to the device, e.g. "COLOR_RED"
    #[serde(default, deserialize_with = "deserialize_text")]
    pub command_sent: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub device_id: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub success: bool,
    #[serde(default, deserialize_with = "timestamp::deserialize_lenient")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl CommandRecord {
    pub fn display_text(&self) -> &str {
        match self.command_text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandsResponse {
    #[serde(default)]
    pub commands: Vec<CommandRecord>,
}

/// Nullable TEXT columns read as empty
fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// SQLite hands booleans back as 0/1
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i != 0,
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_accepts_integers_and_booleans() {
        let json = r#"{"commands": [
            {"id": 2, "timestamp": "2025-03-02 18:04:11", "command_text": "turn the light red",
             "command_sent": "COLOR_RED", "device_id": "esp32_1", "success": 1},
            {"id": 1, "command_text": "mumble", "command_sent": "NONE",
             "device_id": "esp32_1", "success": false}
        ]}"#;
        let response: CommandsResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.commands.len(), 2);
        assert!(response.commands[0].success);
        assert!(response.commands[0].timestamp.is_some());
        assert!(!response.commands[1].success);
        assert_eq!(response.commands[1].timestamp, None);
    }

    #[test]
    fn test_display_text_falls_back_to_unknown() {
        let json = r#"{"id": 7, "command_text": null, "command_sent": "ERROR", "device_id": "d", "success": 0}"#;
        let record: CommandRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.display_text(), "Unknown");
        assert!(!record.success);
    }

    #[test]
    fn test_null_text_columns_do_not_drop_the_page() {
        let json = r#"{"commands": [
            {"id": 9, "command_text": "Manual: BLUE", "command_sent": "COLOR_BLUE",
             "device_id": "esp32_1", "success": 1},
            {"id": 8, "command_text": null, "command_sent": null, "device_id": null,
             "success": 0, "timestamp": null}
        ]}"#;
        let response: CommandsResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.commands.len(), 2);
        assert_eq!(response.commands[0].device_id, "esp32_1");
        assert_eq!(response.commands[1].command_sent, "");
        assert_eq!(response.commands[1].device_id, "");
        assert_eq!(response.commands[1].display_text(), "Unknown");
    }
}
