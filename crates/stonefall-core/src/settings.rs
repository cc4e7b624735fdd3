//! Tracker tuning knobs.
//!
//! All chances are validated into `[0, 1]` at the boundary; once a
//! settings value is accepted it is never a runtime fault. The optional
//! `settings-loader` feature reads settings from human-editable JSON.

use serde::{Deserialize, Serialize};

/// Rejected settings values.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SettingsError {
    #[error("{name} must be within [0, 1], got {value}")]
    ChanceOutOfRange { name: &'static str, value: f32 },
    #[error("collapse trigger denominator must be nonzero")]
    ZeroTriggerDenominator,
}

#[cfg(feature = "settings-loader")]
#[derive(Debug, thiserror::Error)]
pub enum SettingsLoadError {
    #[error("settings parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] SettingsError),
}

/// Tuning values for the tracker's stochastic processes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// A collapse pass runs on a given tick with probability
    /// `1 / collapse_trigger_denominator`.
    pub collapse_trigger_denominator: u32,

    /// Chance for each frontier position to continue the cascade.
    pub propagate_chance: f32,

    /// Chance for each initial participant to seed the frontier when a
    /// collapse is started from an explosion-like event.
    pub explosion_propagate_chance: f32,

    /// Ticks between scheduling a landslide re-check and running it.
    pub landslide_delay_ticks: i32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            collapse_trigger_denominator: 10,
            propagate_chance: 0.55,
            explosion_propagate_chance: 0.3,
            landslide_delay_ticks: 2,
        }
    }
}

impl TrackerSettings {
    /// Validate all values. Call before handing settings to a tracker.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.collapse_trigger_denominator == 0 {
            return Err(SettingsError::ZeroTriggerDenominator);
        }
        for (name, value) in [
            ("propagate_chance", self.propagate_chance),
            (
                "explosion_propagate_chance",
                self.explosion_propagate_chance,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SettingsError::ChanceOutOfRange { name, value });
            }
        }
        Ok(())
    }

    /// Parse and validate settings from JSON. Missing fields fall back to
    /// their defaults.
    #[cfg(feature = "settings-loader")]
    pub fn from_json(json: &str) -> Result<Self, SettingsLoadError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(TrackerSettings::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_chance_rejected() {
        let settings = TrackerSettings {
            propagate_chance: 1.5,
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::ChanceOutOfRange {
                name: "propagate_chance",
                value: 1.5
            })
        );
    }

    #[test]
    fn zero_denominator_rejected() {
        let settings = TrackerSettings {
            collapse_trigger_denominator: 0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(SettingsError::ZeroTriggerDenominator));
    }

    #[cfg(feature = "settings-loader")]
    #[test]
    fn json_loader_fills_missing_fields() {
        let settings = TrackerSettings::from_json(r#"{ "propagate_chance": 0.25 }"#).unwrap();
        assert_eq!(settings.propagate_chance, 0.25);
        assert_eq!(settings.landslide_delay_ticks, 2);
    }

    #[cfg(feature = "settings-loader")]
    #[test]
    fn json_loader_rejects_invalid_values() {
        assert!(TrackerSettings::from_json(r#"{ "propagate_chance": -0.1 }"#).is_err());
    }
}
