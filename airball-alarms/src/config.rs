//! Alarm configuration
//!
//! Loaded from its own JSON document, validated once and immutable after.
//!
//! ```json
//! {
//!     "aural_warnings": [[3, 60, "/sounds/caution.wav"], [7, 100, "/sounds/stall.wav"]],
//!     "amixer": ["PCM", 0],
//!     "ss_ttyname": "/dev/ttyUSB0",
//!     "ss_message": "S{}\n",
//!     "ss_multiplier": 25.5
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{ActuatorError, ActuatorResult};
use crate::ladder::{AlarmEntry, AlarmLadder};
use crate::shaker::CommandTemplate;

/// Default player program
pub const DEFAULT_PLAYER: &str = "aplay";
/// Default mixer program
pub const DEFAULT_MIXER: &str = "amixer";
/// Default stick shaker line speed
pub const DEFAULT_SS_RATE: u32 = 9600;
/// Default stick shaker command template
pub const DEFAULT_SS_MESSAGE: &str = "{}\n";

/// Largest accepted `ss_round_digits` magnitude
const MAX_ROUND_DIGITS: i32 = 12;

/// Aural warning and stick shaker settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlarmConfig {
    /// `[threshold, volume, path]` rungs in any order
    pub aural_warnings: Vec<(f64, u8, String)>,
    /// Mixer control and id
    pub amixer: Option<(String, u32)>,
    /// Playback device and card index
    pub aplayer: Option<(String, u32)>,
    /// Program that plays one clip
    pub player_command: String,
    /// Program that sets the mixer volume
    pub mixer_command: String,
    /// Stick shaker tty; the shaker is enabled iff set
    pub ss_ttyname: Option<String>,
    /// Stick shaker line speed
    pub ss_rate: u32,
    /// Stick shaker command template
    pub ss_message: String,
    /// Danger level scale factor
    pub ss_multiplier: f64,
    /// Digits kept when rounding the shake value
    pub ss_round_digits: i32,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            aural_warnings: Vec::new(),
            amixer: None,
            aplayer: None,
            player_command: DEFAULT_PLAYER.to_string(),
            mixer_command: DEFAULT_MIXER.to_string(),
            ss_ttyname: None,
            ss_rate: DEFAULT_SS_RATE,
            ss_message: DEFAULT_SS_MESSAGE.to_string(),
            ss_multiplier: 1.0,
            ss_round_digits: 0,
        }
    }
}

impl AlarmConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> ActuatorResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ActuatorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> ActuatorResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ActuatorError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Check every value against its domain
    pub fn validate(&self) -> ActuatorResult<()> {
        for (threshold, volume, path) in &self.aural_warnings {
            if !threshold.is_finite() {
                return Err(ActuatorError::Config(format!(
                    "aural warning '{}' has a non-finite threshold",
                    path
                )));
            }
            if *volume > 100 {
                return Err(ActuatorError::Config(format!(
                    "aural warning '{}' volume {} is above 100",
                    path, volume
                )));
            }
            if path.trim().is_empty() {
                return Err(ActuatorError::Config(
                    "aural warning with an empty path".to_string(),
                ));
            }
        }

        if self.player_command.trim().is_empty() || self.mixer_command.trim().is_empty() {
            return Err(ActuatorError::Config(
                "player_command and mixer_command must not be empty".to_string(),
            ));
        }

        if self.ss_rate == 0 {
            return Err(ActuatorError::Config("ss_rate must be positive".to_string()));
        }
        if !self.ss_multiplier.is_finite() {
            return Err(ActuatorError::Config(format!(
                "ss_multiplier {} is not finite",
                self.ss_multiplier
            )));
        }
        if self.ss_round_digits.abs() > MAX_ROUND_DIGITS {
            return Err(ActuatorError::Config(format!(
                "ss_round_digits {} is outside [-{}, {}]",
                self.ss_round_digits, MAX_ROUND_DIGITS, MAX_ROUND_DIGITS
            )));
        }

        let template = CommandTemplate::parse(&self.ss_message)?;
        if self.ss_ttyname.is_some() && !template.has_placeholder() {
            log::warn!("ss_message '{}' never carries the shake value", self.ss_message.escape_debug());
        }
        Ok(())
    }

    /// Aural warning ladder, highest threshold first
    pub fn ladder(&self) -> AlarmLadder {
        AlarmLadder::new(
            self.aural_warnings
                .iter()
                .map(|(threshold, volume, path)| AlarmEntry::new(*threshold, *volume, path))
                .collect(),
        )
    }

    /// Whether a stick shaker is configured
    pub fn stick_shaker_enabled(&self) -> bool {
        self.ss_ttyname.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AlarmConfig::from_json("{}").unwrap();
        assert_eq!(config, AlarmConfig::default());
        assert!(config.ladder().is_empty());
        assert!(!config.stick_shaker_enabled());
        assert_eq!(config.ss_message, "{}\n");
    }

    #[test]
    fn parses_full_document() {
        let config = AlarmConfig::from_json(
            r#"{
                "aural_warnings": [[3, 60, "caution.wav"], [7, 100, "stall.wav"]],
                "amixer": ["PCM", 1],
                "aplayer": ["plughw", 0],
                "ss_ttyname": "/dev/ttyUSB0",
                "ss_rate": 115200,
                "ss_message": "S{:.1f}\n",
                "ss_multiplier": 2.5,
                "ss_round_digits": 1
            }"#,
        )
        .unwrap();

        assert_eq!(config.amixer, Some(("PCM".to_string(), 1)));
        assert_eq!(config.ss_rate, 115200);
        assert!(config.stick_shaker_enabled());
        let ladder = config.ladder();
        assert_eq!(ladder.entries()[0].threshold, 7.0);
        assert_eq!(ladder.select(4.0).map(|e| e.volume), Some(60));
    }

    #[test]
    fn rejects_out_of_domain_values() {
        for json in [
            r#"{"aural_warnings": [[3, 101, "a.wav"]]}"#,
            r#"{"aural_warnings": [[3, 50, ""]]}"#,
            r#"{"ss_rate": 0}"#,
            r#"{"ss_round_digits": 40}"#,
            r#"{"ss_message": "{speed}"}"#,
            r#"{"player_command": " "}"#,
            r#"{"unknown_key": 1}"#,
        ] {
            assert!(AlarmConfig::from_json(json).is_err(), "{} should be rejected", json);
        }
    }

    #[test]
    fn bad_template_is_reported_as_such() {
        let err = AlarmConfig::from_json(r#"{"ss_message": "S{"}"#).unwrap_err();
        assert!(matches!(err, ActuatorError::InvalidTemplate { .. }));
    }
}
