//! Tunable game configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_BASE_EVENT_CHANCE, DEFAULT_BLACKOUT_DAMAGE, DEFAULT_BUILDING_INTEGRITY_TURNS,
    DEFAULT_DEFENSE_EVENT_PENALTY, DEFAULT_DRAWS_INCREASE_PER_DAY,
    DEFAULT_EVENT_CHANCE_INCREASE_PER_DAY, DEFAULT_LIFE_SUPPORT_TURNS, DEFAULT_MAX_EVENT_CHANCE,
    DEFAULT_MAX_HAND_SIZE, DEFAULT_SIGNAL_GOAL, DEFAULT_STARTING_DRAWS, RESOURCE_MAX,
    RESOURCE_MIN,
};
use crate::numbers::u32_to_f32;
use crate::resources::{ResourceKind, StartingResources};
use crate::station::SystemType;

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("config JSON is invalid: {0}")]
    Parse(String),
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f32,
        value: f32,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },
    #[error("base event chance {base:.2} exceeds the cap {max:.2}")]
    ChanceAboveCap { base: f32, max: f32 },
}

/// Turns a dead subsystem may stay down before the game is lost.
/// `None` means the crisis only carries side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisThresholds {
    #[serde(default = "CrisisThresholds::default_life_support")]
    pub life_support: Option<u32>,
    #[serde(default)]
    pub power: Option<u32>,
    #[serde(default)]
    pub comms: Option<u32>,
    #[serde(default = "CrisisThresholds::default_building_integrity")]
    pub building_integrity: Option<u32>,
    #[serde(default)]
    pub defense: Option<u32>,
}

impl CrisisThresholds {
    #[allow(clippy::unnecessary_wraps)]
    const fn default_life_support() -> Option<u32> {
        Some(DEFAULT_LIFE_SUPPORT_TURNS)
    }

    #[allow(clippy::unnecessary_wraps)]
    const fn default_building_integrity() -> Option<u32> {
        Some(DEFAULT_BUILDING_INTEGRITY_TURNS)
    }

    #[must_use]
    pub const fn turns_before_loss(&self, system: SystemType) -> Option<u32> {
        match system {
            SystemType::LifeSupport => self.life_support,
            SystemType::Power => self.power,
            SystemType::Comms => self.comms,
            SystemType::BuildingIntegrity => self.building_integrity,
            SystemType::Defense => self.defense,
        }
    }
}

impl Default for CrisisThresholds {
    fn default() -> Self {
        Self {
            life_support: Self::default_life_support(),
            power: None,
            comms: None,
            building_integrity: Self::default_building_integrity(),
            defense: None,
        }
    }
}

/// Balance knobs read once before play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "GameConfig::default_signal_goal")]
    pub signal_goal: i32,
    #[serde(default)]
    pub starting_resources: StartingResources,
    #[serde(default = "GameConfig::default_starting_draws")]
    pub starting_draws: u32,
    #[serde(default = "GameConfig::default_draws_increase_per_day")]
    pub draws_increase_per_day: u32,
    #[serde(default = "GameConfig::default_base_event_chance")]
    pub base_event_chance: f32,
    #[serde(default = "GameConfig::default_event_chance_increase_per_day")]
    pub event_chance_increase_per_day: f32,
    #[serde(default = "GameConfig::default_max_event_chance")]
    pub max_event_chance: f32,
    #[serde(default = "GameConfig::default_max_hand_size")]
    pub max_hand_size: usize,
    /// Damage dealt to every module per elapsed turn while Power is down.
    #[serde(default = "GameConfig::default_blackout_damage")]
    pub blackout_damage: i32,
    /// Added to the event chance while the Defense crisis is armed.
    #[serde(default = "GameConfig::default_defense_event_chance_penalty")]
    pub defense_event_chance_penalty: f32,
    /// Restrict type-targeted events to modules that are still alive.
    #[serde(default)]
    pub event_targets_alive_only: bool,
    #[serde(default)]
    pub crisis: CrisisThresholds,
}

impl GameConfig {
    const fn default_signal_goal() -> i32 {
        DEFAULT_SIGNAL_GOAL
    }

    const fn default_starting_draws() -> u32 {
        DEFAULT_STARTING_DRAWS
    }

    const fn default_draws_increase_per_day() -> u32 {
        DEFAULT_DRAWS_INCREASE_PER_DAY
    }

    const fn default_base_event_chance() -> f32 {
        DEFAULT_BASE_EVENT_CHANCE
    }

    const fn default_event_chance_increase_per_day() -> f32 {
        DEFAULT_EVENT_CHANCE_INCREASE_PER_DAY
    }

    const fn default_max_event_chance() -> f32 {
        DEFAULT_MAX_EVENT_CHANCE
    }

    const fn default_max_hand_size() -> usize {
        DEFAULT_MAX_HAND_SIZE
    }

    const fn default_blackout_damage() -> i32 {
        DEFAULT_BLACKOUT_DAMAGE
    }

    const fn default_defense_event_chance_penalty() -> f32 {
        DEFAULT_DEFENSE_EVENT_PENALTY
    }

    /// Parse and validate a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_signal_goal()?;
        self.validate_starting_resources()?;
        self.validate_draws()?;
        self.validate_chances()?;
        if self.max_hand_size == 0 {
            return Err(ConfigError::MinViolation {
                field: "max_hand_size",
                min: 1.0,
                value: 0.0,
            });
        }
        if self.blackout_damage < 0 {
            return Err(ConfigError::MinViolation {
                field: "blackout_damage",
                min: 0.0,
                value: resource_to_f32(self.blackout_damage),
            });
        }
        Ok(())
    }

    fn validate_signal_goal(&self) -> Result<(), ConfigError> {
        if !(1..=RESOURCE_MAX).contains(&self.signal_goal) {
            return Err(ConfigError::RangeViolation {
                field: "signal_goal",
                min: 1.0,
                max: resource_to_f32(RESOURCE_MAX),
                value: resource_to_f32(self.signal_goal),
            });
        }
        Ok(())
    }

    fn validate_starting_resources(&self) -> Result<(), ConfigError> {
        for kind in ResourceKind::ALL {
            let value = match kind {
                ResourceKind::Signal => self.starting_resources.signal,
                ResourceKind::Oxygen => self.starting_resources.oxygen,
                ResourceKind::Power => self.starting_resources.power,
                ResourceKind::Hull => self.starting_resources.hull,
            };
            if !(RESOURCE_MIN..=RESOURCE_MAX).contains(&value) {
                return Err(ConfigError::RangeViolation {
                    field: match kind {
                        ResourceKind::Signal => "starting_resources.signal",
                        ResourceKind::Oxygen => "starting_resources.oxygen",
                        ResourceKind::Power => "starting_resources.power",
                        ResourceKind::Hull => "starting_resources.hull",
                    },
                    min: resource_to_f32(RESOURCE_MIN),
                    max: resource_to_f32(RESOURCE_MAX),
                    value: resource_to_f32(value),
                });
            }
        }
        Ok(())
    }

    fn validate_draws(&self) -> Result<(), ConfigError> {
        if self.starting_draws == 0 {
            return Err(ConfigError::MinViolation {
                field: "starting_draws",
                min: 1.0,
                value: u32_to_f32(self.starting_draws),
            });
        }
        Ok(())
    }

    fn validate_chances(&self) -> Result<(), ConfigError> {
        let unit_fields = [
            ("base_event_chance", self.base_event_chance),
            (
                "event_chance_increase_per_day",
                self.event_chance_increase_per_day,
            ),
            ("max_event_chance", self.max_event_chance),
            (
                "defense_event_chance_penalty",
                self.defense_event_chance_penalty,
            ),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RangeViolation {
                    field,
                    min: 0.0,
                    max: 1.0,
                    value,
                });
            }
        }
        if self.base_event_chance > self.max_event_chance {
            return Err(ConfigError::ChanceAboveCap {
                base: self.base_event_chance,
                max: self.max_event_chance,
            });
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            signal_goal: Self::default_signal_goal(),
            starting_resources: StartingResources::default(),
            starting_draws: Self::default_starting_draws(),
            draws_increase_per_day: Self::default_draws_increase_per_day(),
            base_event_chance: Self::default_base_event_chance(),
            event_chance_increase_per_day: Self::default_event_chance_increase_per_day(),
            max_event_chance: Self::default_max_event_chance(),
            max_hand_size: Self::default_max_hand_size(),
            blackout_damage: Self::default_blackout_damage(),
            defense_event_chance_penalty: Self::default_defense_event_chance_penalty(),
            event_targets_alive_only: false,
            crisis: CrisisThresholds::default(),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
const fn resource_to_f32(value: i32) -> f32 {
    value as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = GameConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.crisis.turns_before_loss(SystemType::LifeSupport), Some(2));
        assert_eq!(
            cfg.crisis.turns_before_loss(SystemType::BuildingIntegrity),
            Some(3)
        );
        assert_eq!(cfg.crisis.turns_before_loss(SystemType::Power), None);
    }

    #[test]
    fn empty_json_uses_defaults() {
        let cfg = GameConfig::from_json("{}").unwrap();
        assert_eq!(cfg, GameConfig::default());
    }

    #[test]
    fn crisis_threshold_can_be_disabled() {
        let cfg = GameConfig::from_json(r#"{ "crisis": { "life_support": null, "power": 4 } }"#)
            .unwrap();
        assert_eq!(cfg.crisis.life_support, None);
        assert_eq!(cfg.crisis.power, Some(4));
        assert_eq!(cfg.crisis.building_integrity, Some(3));
    }

    #[test]
    fn rejects_out_of_range_chance() {
        let cfg = GameConfig {
            base_event_chance: 1.4,
            ..GameConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::RangeViolation {
                field: "base_event_chance",
                ..
            })
        ));

        let cfg = GameConfig {
            base_event_chance: 0.9,
            max_event_chance: 0.5,
            ..GameConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ChanceAboveCap { .. })
        ));
    }

    #[test]
    fn rejects_degenerate_counts() {
        let cfg = GameConfig {
            max_hand_size: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MinViolation {
                field: "max_hand_size",
                ..
            })
        ));

        let cfg = GameConfig {
            signal_goal: 0,
            ..GameConfig::default()
        };
        assert!(cfg.validate().is_err());

        let err = GameConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
