//! Station modules: per-unit health and disabled state.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical module kind. Several units may share a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    OxygenGenerator,
    Co2Scrubber,
    Reactor,
    SolarArray,
    Antenna,
    CommsRelay,
    HullSection,
    StructuralFrame,
    PointDefense,
    ShieldEmitter,
    CrewQuarters,
    Hydroponics,
}

impl ModuleType {
    pub const ALL: [Self; 12] = [
        Self::OxygenGenerator,
        Self::Co2Scrubber,
        Self::Reactor,
        Self::SolarArray,
        Self::Antenna,
        Self::CommsRelay,
        Self::HullSection,
        Self::StructuralFrame,
        Self::PointDefense,
        Self::ShieldEmitter,
        Self::CrewQuarters,
        Self::Hydroponics,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::OxygenGenerator => "oxygen_generator",
            Self::Co2Scrubber => "co2_scrubber",
            Self::Reactor => "reactor",
            Self::SolarArray => "solar_array",
            Self::Antenna => "antenna",
            Self::CommsRelay => "comms_relay",
            Self::HullSection => "hull_section",
            Self::StructuralFrame => "structural_frame",
            Self::PointDefense => "point_defense",
            Self::ShieldEmitter => "shield_emitter",
            Self::CrewQuarters => "crew_quarters",
            Self::Hydroponics => "hydroponics",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Stable identifier for a module, as authored in the station layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(pub String);

impl ModuleId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Record of a mutation that changed the module's health or disabled flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthChange {
    pub before: i32,
    pub after: i32,
    pub disabled: bool,
}

impl HealthChange {
    #[must_use]
    pub const fn delta(&self) -> i32 {
        self.after - self.before
    }
}

/// A single physical station unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationModule {
    id: ModuleId,
    module_type: ModuleType,
    max_health: i32,
    health: i32,
    disabled: bool,
}

impl StationModule {
    /// Create a module at full health. `max_health` is raised to 1 when smaller.
    #[must_use]
    pub fn new(id: ModuleId, module_type: ModuleType, max_health: i32) -> Self {
        let max_health = max_health.max(1);
        Self {
            id,
            module_type,
            max_health,
            health: max_health,
            disabled: false,
        }
    }

    #[must_use]
    pub const fn id(&self) -> &ModuleId {
        &self.id
    }

    #[must_use]
    pub const fn module_type(&self) -> ModuleType {
        self.module_type
    }

    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    #[must_use]
    pub const fn max_health(&self) -> i32 {
        self.max_health
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    #[must_use]
    pub const fn is_damaged(&self) -> bool {
        self.health < self.max_health
    }

    /// Alive means neither disabled nor at zero health.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.disabled && self.health > 0
    }

    /// Apply damage. Ignored for non-positive amounts and for disabled modules.
    pub fn damage(&mut self, amount: i32) -> Option<HealthChange> {
        if amount <= 0 || self.disabled {
            return None;
        }
        let before = self.health;
        self.health = self.health.saturating_sub(amount).max(0);
        if self.health == 0 {
            self.disabled = true;
        }
        self.change_since(before, false)
    }

    /// Apply repair. Any repair that leaves health above zero re-enables the module.
    pub fn repair(&mut self, amount: i32) -> Option<HealthChange> {
        if amount <= 0 {
            return None;
        }
        let before = self.health;
        let was_disabled = self.disabled;
        self.health = self.health.saturating_add(amount).min(self.max_health);
        if self.health > 0 {
            self.disabled = false;
        }
        self.change_since(before, was_disabled)
    }

    /// Force the disabled flag without touching health.
    pub fn set_disabled(&mut self, value: bool) {
        self.disabled = value;
    }

    fn change_since(&self, before: i32, was_disabled: bool) -> Option<HealthChange> {
        let changed = self.health != before || self.disabled != was_disabled;
        changed.then_some(HealthChange {
            before,
            after: self.health,
            disabled: self.disabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reactor(max: i32) -> StationModule {
        StationModule::new(ModuleId::new("reactor-a"), ModuleType::Reactor, max)
    }

    #[test]
    fn new_module_starts_full_and_clamps_max() {
        let module = reactor(0);
        assert_eq!(module.max_health(), 1);
        assert_eq!(module.health(), 1);
        assert!(!module.is_disabled());
    }

    #[test]
    fn damage_clamps_at_zero_and_disables() {
        let mut module = reactor(5);
        let change = module.damage(3).expect("health changed");
        assert_eq!(change.before, 5);
        assert_eq!(change.after, 2);
        assert_eq!(change.delta(), -3);

        let change = module.damage(10).expect("health changed");
        assert_eq!(change.after, 0);
        assert!(change.disabled);
        assert!(module.is_disabled());
        assert!(!module.is_alive());
    }

    #[test]
    fn damage_ignores_non_positive_and_disabled() {
        let mut module = reactor(5);
        assert!(module.damage(0).is_none());
        assert!(module.damage(-2).is_none());
        module.set_disabled(true);
        assert!(module.damage(2).is_none());
        assert_eq!(module.health(), 5);
    }

    #[test]
    fn repair_clamps_to_max_and_revives() {
        let mut module = reactor(5);
        module.damage(5);
        assert!(module.is_disabled());

        let change = module.repair(2).expect("health changed");
        assert_eq!(change.after, 2);
        assert!(!change.disabled);
        assert!(!module.is_disabled());

        let change = module.repair(99).expect("health changed");
        assert_eq!(change.after, 5);
        assert!(module.repair(1).is_none(), "already at max health");
        assert!(module.repair(-1).is_none());
    }

    #[test]
    fn repair_at_full_health_lifts_forced_disable() {
        let mut module = reactor(3);
        module.set_disabled(true);
        let change = module.repair(1).expect("disabled flag changed");
        assert_eq!(change.delta(), 0);
        assert!(!change.disabled);
        assert!(!module.is_disabled());
        assert!(module.repair(1).is_none(), "nothing left to change");
    }

    #[test]
    fn module_type_keys_are_snake_case() {
        for kind in ModuleType::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.key()));
        }
    }
}
