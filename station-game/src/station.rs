//! Module registry and subsystem aggregates.
//!
//! The station owns every module and groups the watched ones into
//! [`SubsystemAggregate`]s. Every mutation goes through the station so that the
//! owning aggregate is recomputed before anything else can read it.
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::data::StationLayout;
use crate::event::{EventKind, EventLog};
use crate::module::{HealthChange, ModuleId, ModuleType, StationModule};

/// Named subsystem watched by the crisis engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemType {
    LifeSupport,
    Power,
    Comms,
    BuildingIntegrity,
    Defense,
}

impl SystemType {
    /// Evaluation order for crisis ticks.
    pub const ALL: [Self; 5] = [
        Self::LifeSupport,
        Self::Power,
        Self::Comms,
        Self::BuildingIntegrity,
        Self::Defense,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::LifeSupport => "Life Support",
            Self::Power => "Power",
            Self::Comms => "Comms",
            Self::BuildingIntegrity => "Building Integrity",
            Self::Defense => "Defense",
        }
    }
}

impl fmt::Display for SystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Combined health of every module assigned to one subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsystemAggregate {
    system: SystemType,
    members: SmallVec<[usize; 4]>,
    current_hp: i32,
    max_hp: i32,
}

impl SubsystemAggregate {
    fn new(system: SystemType, members: SmallVec<[usize; 4]>, modules: &[StationModule]) -> Self {
        let mut aggregate = Self {
            system,
            members,
            current_hp: 0,
            max_hp: 0,
        };
        aggregate.recalculate(modules);
        aggregate
    }

    fn recalculate(&mut self, modules: &[StationModule]) {
        let (current, max) = self
            .members
            .iter()
            .filter_map(|idx| modules.get(*idx))
            .fold((0_i32, 0_i32), |(cur, max), module| {
                (
                    cur.saturating_add(module.health().max(0)),
                    max.saturating_add(module.max_health().max(0)),
                )
            });
        self.current_hp = current;
        self.max_hp = max;
    }

    #[must_use]
    pub const fn system(&self) -> SystemType {
        self.system
    }

    #[must_use]
    pub const fn current_hp(&self) -> i32 {
        self.current_hp
    }

    #[must_use]
    pub const fn max_hp(&self) -> i32 {
        self.max_hp
    }

    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current_hp <= 0
    }

    /// Indices of member modules in the station registry.
    #[must_use]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    fn contains(&self, idx: usize) -> bool {
        self.members.contains(&idx)
    }

    fn changed_event(&self) -> EventKind {
        EventKind::AggregateChanged {
            system: self.system,
            current_hp: self.current_hp,
            max_hp: self.max_hp,
            dead: self.is_dead(),
        }
    }
}

/// All station modules plus their subsystem groupings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    modules: Vec<StationModule>,
    aggregates: Vec<SubsystemAggregate>,
}

impl Station {
    /// Build modules and aggregates. Systems without member modules get no aggregate.
    #[must_use]
    pub fn from_layout(layout: &StationLayout) -> Self {
        let modules: Vec<StationModule> = layout.modules.iter().map(|spec| spec.build()).collect();
        let aggregates = SystemType::ALL
            .iter()
            .filter_map(|system| {
                let members: SmallVec<[usize; 4]> = layout
                    .modules
                    .iter()
                    .enumerate()
                    .filter(|(_, spec)| spec.system == Some(*system))
                    .map(|(idx, _)| idx)
                    .collect();
                (!members.is_empty())
                    .then(|| SubsystemAggregate::new(*system, members, &modules))
            })
            .collect();
        Self {
            modules,
            aggregates,
        }
    }

    #[must_use]
    pub fn modules(&self) -> &[StationModule] {
        &self.modules
    }

    #[must_use]
    pub fn module(&self, idx: usize) -> Option<&StationModule> {
        self.modules.get(idx)
    }

    #[must_use]
    pub fn index_of(&self, id: &ModuleId) -> Option<usize> {
        self.modules.iter().position(|module| module.id() == id)
    }

    #[must_use]
    pub fn find(&self, id: &ModuleId) -> Option<&StationModule> {
        self.modules.iter().find(|module| module.id() == id)
    }

    #[must_use]
    pub fn aggregates(&self) -> &[SubsystemAggregate] {
        &self.aggregates
    }

    #[must_use]
    pub fn aggregate(&self, system: SystemType) -> Option<&SubsystemAggregate> {
        self.aggregates
            .iter()
            .find(|aggregate| aggregate.system == system)
    }

    /// Whether the subsystem exists and has no health left.
    #[must_use]
    pub fn is_system_dead(&self, system: SystemType) -> bool {
        self.aggregate(system).is_some_and(SubsystemAggregate::is_dead)
    }

    /// Subsystem a module is grouped under, if any.
    #[must_use]
    pub fn system_of(&self, idx: usize) -> Option<SystemType> {
        self.aggregates
            .iter()
            .find(|aggregate| aggregate.contains(idx))
            .map(SubsystemAggregate::system)
    }

    pub fn damage_module(
        &mut self,
        idx: usize,
        amount: i32,
        events: &mut EventLog,
    ) -> Option<HealthChange> {
        let change = self.modules.get_mut(idx)?.damage(amount);
        self.after_module_change(idx, change, events);
        change
    }

    pub fn repair_module(
        &mut self,
        idx: usize,
        amount: i32,
        events: &mut EventLog,
    ) -> Option<HealthChange> {
        let change = self.modules.get_mut(idx)?.repair(amount);
        self.after_module_change(idx, change, events);
        change
    }

    /// Force a module's disabled flag. Health and aggregates are untouched.
    pub fn set_module_disabled(&mut self, idx: usize, disabled: bool) {
        if let Some(module) = self.modules.get_mut(idx) {
            module.set_disabled(disabled);
        }
    }

    /// Damage every module once. Returns how many modules actually changed.
    pub fn damage_all(&mut self, amount: i32, events: &mut EventLog) -> usize {
        (0..self.modules.len())
            .filter(|idx| self.damage_module(*idx, amount, events).is_some())
            .count()
    }

    /// Indices of modules of `module_type`, optionally restricted to alive ones.
    #[must_use]
    pub fn indices_of_type(
        &self,
        module_type: ModuleType,
        alive_only: bool,
    ) -> SmallVec<[usize; 4]> {
        self.modules
            .iter()
            .enumerate()
            .filter(|(_, module)| module.module_type() == module_type)
            .filter(|(_, module)| !alive_only || module.is_alive())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Uniform pick among modules of one type.
    pub fn random_of_type<R: Rng + ?Sized>(
        &self,
        module_type: ModuleType,
        alive_only: bool,
        rng: &mut R,
    ) -> Option<usize> {
        pick_uniform(&self.indices_of_type(module_type, alive_only), rng)
    }

    /// Uniform pick among all modules.
    pub fn random_module<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.modules.is_empty() {
            return None;
        }
        Some(rng.gen_range(0..self.modules.len()))
    }

    fn after_module_change(
        &mut self,
        idx: usize,
        change: Option<HealthChange>,
        events: &mut EventLog,
    ) {
        let Some(change) = change else {
            return;
        };
        if let Some(module) = self.modules.get(idx) {
            events.push(EventKind::ModuleHealthChanged {
                module: module.id().clone(),
                before: change.before,
                after: change.after,
                disabled: change.disabled,
            });
        }
        let modules = &self.modules;
        for aggregate in self
            .aggregates
            .iter_mut()
            .filter(|aggregate| aggregate.contains(idx))
        {
            aggregate.recalculate(modules);
            events.push(aggregate.changed_event());
        }
    }
}

fn pick_uniform<R: Rng + ?Sized>(candidates: &[usize], rng: &mut R) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    candidates.get(rng.gen_range(0..candidates.len())).copied()
}
