//! Shared station resource counters.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    DEFAULT_STARTING_HULL, DEFAULT_STARTING_OXYGEN, DEFAULT_STARTING_POWER,
    DEFAULT_STARTING_SIGNAL, RESOURCE_MAX, RESOURCE_MIN,
};

/// Named resource counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Signal,
    Oxygen,
    Power,
    Hull,
}

impl ResourceKind {
    pub const ALL: [Self; 4] = [Self::Signal, Self::Oxygen, Self::Power, Self::Hull];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal => write!(f, "signal"),
            Self::Oxygen => write!(f, "oxygen"),
            Self::Power => write!(f, "power"),
            Self::Hull => write!(f, "hull"),
        }
    }
}

/// Resource deltas carried by a card. Missing fields default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResourceDeltas {
    #[serde(default)]
    pub signal: i32,
    #[serde(default)]
    pub oxygen: i32,
    #[serde(default)]
    pub power: i32,
    #[serde(default)]
    pub hull: i32,
}

impl ResourceDeltas {
    #[must_use]
    pub const fn signal(amount: i32) -> Self {
        Self {
            signal: amount,
            oxygen: 0,
            power: 0,
            hull: 0,
        }
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.signal == 0 && self.oxygen == 0 && self.power == 0 && self.hull == 0
    }
}

/// Clamped resource counters, each within `[0, 99]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    signal: i32,
    oxygen: i32,
    power: i32,
    hull: i32,
}

impl Default for ResourcePool {
    fn default() -> Self {
        Self::new(StartingResources::default())
    }
}

impl ResourcePool {
    #[must_use]
    pub fn new(start: StartingResources) -> Self {
        Self {
            signal: clamp_resource(start.signal),
            oxygen: clamp_resource(start.oxygen),
            power: clamp_resource(start.power),
            hull: clamp_resource(start.hull),
        }
    }

    #[must_use]
    pub const fn get(&self, kind: ResourceKind) -> i32 {
        match kind {
            ResourceKind::Signal => self.signal,
            ResourceKind::Oxygen => self.oxygen,
            ResourceKind::Power => self.power,
            ResourceKind::Hull => self.hull,
        }
    }

    #[must_use]
    pub const fn signal(&self) -> i32 {
        self.signal
    }

    #[must_use]
    pub const fn oxygen(&self) -> i32 {
        self.oxygen
    }

    #[must_use]
    pub const fn power(&self) -> i32 {
        self.power
    }

    #[must_use]
    pub const fn hull(&self) -> i32 {
        self.hull
    }

    /// Apply a delta to one counter. Returns true when the stored value changed.
    pub fn apply(&mut self, kind: ResourceKind, delta: i32) -> bool {
        let slot = self.slot_mut(kind);
        let before = *slot;
        *slot = clamp_resource(before.saturating_add(delta));
        *slot != before
    }

    /// Apply every delta of a card. Returns true when any counter changed.
    pub fn apply_deltas(&mut self, deltas: &ResourceDeltas) -> bool {
        let mut changed = false;
        changed |= self.apply(ResourceKind::Signal, deltas.signal);
        changed |= self.apply(ResourceKind::Oxygen, deltas.oxygen);
        changed |= self.apply(ResourceKind::Power, deltas.power);
        changed |= self.apply(ResourceKind::Hull, deltas.hull);
        changed
    }

    /// Force a counter to zero. Returns true when the stored value changed.
    pub fn zero(&mut self, kind: ResourceKind) -> bool {
        let slot = self.slot_mut(kind);
        let changed = *slot != RESOURCE_MIN;
        *slot = RESOURCE_MIN;
        changed
    }

    fn slot_mut(&mut self, kind: ResourceKind) -> &mut i32 {
        match kind {
            ResourceKind::Signal => &mut self.signal,
            ResourceKind::Oxygen => &mut self.oxygen,
            ResourceKind::Power => &mut self.power,
            ResourceKind::Hull => &mut self.hull,
        }
    }
}

/// Opening values for the resource pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingResources {
    #[serde(default = "StartingResources::default_signal")]
    pub signal: i32,
    #[serde(default = "StartingResources::default_oxygen")]
    pub oxygen: i32,
    #[serde(default = "StartingResources::default_power")]
    pub power: i32,
    #[serde(default = "StartingResources::default_hull")]
    pub hull: i32,
}

impl StartingResources {
    const fn default_signal() -> i32 {
        DEFAULT_STARTING_SIGNAL
    }

    const fn default_oxygen() -> i32 {
        DEFAULT_STARTING_OXYGEN
    }

    const fn default_power() -> i32 {
        DEFAULT_STARTING_POWER
    }

    const fn default_hull() -> i32 {
        DEFAULT_STARTING_HULL
    }
}

impl Default for StartingResources {
    fn default() -> Self {
        Self {
            signal: Self::default_signal(),
            oxygen: Self::default_oxygen(),
            power: Self::default_power(),
            hull: Self::default_hull(),
        }
    }
}

const fn clamp_resource(value: i32) -> i32 {
    if value < RESOURCE_MIN {
        RESOURCE_MIN
    } else if value > RESOURCE_MAX {
        RESOURCE_MAX
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_clamp_to_bounds() {
        let mut pool = ResourcePool::new(StartingResources {
            signal: 95,
            oxygen: 3,
            power: 50,
            hull: 50,
        });
        assert!(pool.apply_deltas(&ResourceDeltas {
            signal: 10,
            oxygen: -10,
            power: 0,
            hull: 0,
        }));
        assert_eq!(pool.signal(), RESOURCE_MAX);
        assert_eq!(pool.oxygen(), RESOURCE_MIN);
        assert_eq!(pool.power(), 50);
    }

    #[test]
    fn starting_values_are_clamped() {
        let pool = ResourcePool::new(StartingResources {
            signal: -4,
            oxygen: 400,
            power: 1,
            hull: 2,
        });
        assert_eq!(pool.signal(), 0);
        assert_eq!(pool.oxygen(), 99);
    }

    #[test]
    fn apply_reports_unchanged_when_pinned() {
        let mut pool = ResourcePool::new(StartingResources {
            signal: 0,
            ..StartingResources::default()
        });
        assert!(!pool.apply(ResourceKind::Signal, -3));
        assert!(!pool.zero(ResourceKind::Signal));
        assert!(pool.zero(ResourceKind::Oxygen));
        assert_eq!(pool.get(ResourceKind::Oxygen), 0);
    }

    #[test]
    fn deltas_parse_with_defaults() {
        let deltas: ResourceDeltas = serde_json::from_str(r#"{"signal": 2}"#).unwrap();
        assert_eq!(deltas, ResourceDeltas::signal(2));
        assert!(!deltas.is_zero());
        assert!(ResourceDeltas::default().is_zero());
    }
}
