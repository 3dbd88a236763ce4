use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// A named light color, or the OFF sentinel.
///
/// Tokens the engine does not know are kept as `Unknown` so a device can
/// still be displayed, but they are never sent back to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum LightColor {
    Red,
    Green,
    Blue,
    White,
    Purple,
    Yellow,
    #[default]
    Off,
    Unknown(String),
}

impl LightColor {
    /// Every color a control intent may carry, OFF last.
    pub const PALETTE: [LightColor; 7] = [
        LightColor::Red,
        LightColor::Green,
        LightColor::Blue,
        LightColor::White,
        LightColor::Purple,
        LightColor::Yellow,
        LightColor::Off,
    ];

    pub fn token(&self) -> &str {
        match self {
            LightColor::Red => "RED",
            LightColor::Green => "GREEN",
            LightColor::Blue => "BLUE",
            LightColor::White => "WHITE",
            LightColor::Purple => "PURPLE",
            LightColor::Yellow => "YELLOW",
            LightColor::Off => "OFF",
            LightColor::Unknown(raw) => raw,
        }
    }

    pub fn is_off(&self) -> bool {
        matches!(self, LightColor::Off)
    }

    pub fn is_sendable(&self) -> bool {
        !matches!(self, LightColor::Unknown(_))
    }

    /// Lenient parse used for backend-reported state.
    pub fn from_token(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "RED" => LightColor::Red,
            "GREEN" => LightColor::Green,
            "BLUE" => LightColor::Blue,
            "WHITE" => LightColor::White,
            "PURPLE" => LightColor::Purple,
            "YELLOW" => LightColor::Yellow,
            "OFF" => LightColor::Off,
            _ => LightColor::Unknown(raw.to_string()),
        }
    }
}

impl fmt::Display for LightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Strict parse used for user-initiated control intents.
impl FromStr for LightColor {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match LightColor::from_token(s) {
            LightColor::Unknown(raw) => Err(AppError::InvalidColor(raw)),
            color => Ok(color),
        }
    }
}

impl Serialize for LightColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

impl<'de> Deserialize<'de> for LightColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(LightColor::from_token(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_parse_case_insensitively() {
        assert_eq!("red".parse::<LightColor>().unwrap(), LightColor::Red);
        assert_eq!(" Purple ".parse::<LightColor>().unwrap(), LightColor::Purple);
        assert_eq!("OFF".parse::<LightColor>().unwrap(), LightColor::Off);
    }

    #[test]
    fn test_unknown_token_is_not_sendable() {
        assert!(matches!(
            "magenta".parse::<LightColor>(),
            Err(AppError::InvalidColor(raw)) if raw == "magenta"
        ));

        let reported: LightColor = serde_json::from_str(r#""magenta""#).unwrap();
        assert_eq!(reported, LightColor::Unknown("magenta".into()));
        assert!(!reported.is_sendable());
        assert_eq!(reported.to_string(), "magenta");
    }

    #[test]
    fn test_serializes_as_uppercase_token() {
        assert_eq!(serde_json::to_string(&LightColor::Yellow).unwrap(), r#""YELLOW""#);
        assert!(LightColor::PALETTE.iter().all(LightColor::is_sendable));
        assert!(LightColor::PALETTE[6].is_off());
    }
}
