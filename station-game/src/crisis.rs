//! Per-subsystem crisis countdowns and subsystem-down side effects.
//!
//! A subsystem whose aggregate is dead arms a crisis. While armed, every
//! elapsed turn decrements the countdown; reaching zero while still dead loses
//! the game. Recovery cancels the crisis immediately and resets it. Each
//! subsystem also carries a side effect that applies while it is down.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::constants::LOG_TARGET_CRISIS;
use crate::event::{EventKind, EventLog};
use crate::resources::{ResourceKind, ResourcePool};
use crate::station::{Station, SystemType};

/// Countdown state for one subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CrisisState {
    pub armed: bool,
    /// Remaining turns before loss; `None` when the system never ends the game.
    pub turns_left: Option<u32>,
    /// Whether the once-per-entry side effect already fired.
    pub one_shot_applied: bool,
}

/// Mutable state the crisis engine reads and writes during an evaluation.
pub struct CrisisContext<'a> {
    pub station: &'a mut Station,
    pub resources: &'a mut ResourcePool,
    pub events: &'a mut EventLog,
    pub cfg: &'a GameConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisEngine {
    states: [CrisisState; 5],
}

const fn slot(system: SystemType) -> usize {
    match system {
        SystemType::LifeSupport => 0,
        SystemType::Power => 1,
        SystemType::Comms => 2,
        SystemType::BuildingIntegrity => 3,
        SystemType::Defense => 4,
    }
}

impl CrisisEngine {
    #[must_use]
    pub const fn state(&self, system: SystemType) -> &CrisisState {
        &self.states[slot(system)]
    }

    #[must_use]
    pub const fn is_armed(&self, system: SystemType) -> bool {
        self.state(system).armed
    }

    /// Extra event-draw probability contributed by active crises.
    #[must_use]
    pub fn event_chance_penalty(&self, cfg: &GameConfig) -> f32 {
        if self.is_armed(SystemType::Defense) {
            cfg.defense_event_chance_penalty
        } else {
            0.0
        }
    }

    /// Re-evaluate every subsystem. `turn_elapsed` is true exactly once per
    /// successful card draw. Returns the subsystem that ran out of turns, if any.
    pub fn evaluate(
        &mut self,
        ctx: &mut CrisisContext<'_>,
        turn_elapsed: bool,
    ) -> Option<SystemType> {
        let armed_before: [bool; 5] = self.states.map(|state| state.armed);

        if turn_elapsed
            && armed_before[slot(SystemType::Power)]
            && ctx.station.is_system_dead(SystemType::Power)
        {
            let hit = ctx
                .station
                .damage_all(ctx.cfg.blackout_damage, ctx.events);
            debug!(
                target: LOG_TARGET_CRISIS,
                "blackout dealt {} damage to {hit} modules",
                ctx.cfg.blackout_damage
            );
        }

        let mut lost = None;
        for system in SystemType::ALL {
            let dead = ctx.station.is_system_dead(system);
            let state = &mut self.states[slot(system)];

            if !dead {
                if state.armed {
                    *state = CrisisState::default();
                    debug!(target: LOG_TARGET_CRISIS, "{system} crisis cleared");
                    ctx.events.push(EventKind::CrisisCleared { system });
                }
                continue;
            }

            if state.armed {
                if turn_elapsed
                    && armed_before[slot(system)]
                    && let Some(turns) = state.turns_left
                {
                    let turns = turns.saturating_sub(1);
                    state.turns_left = Some(turns);
                    debug!(target: LOG_TARGET_CRISIS, "{system} crisis: {turns} turns left");
                    ctx.events.push(EventKind::CrisisTicked {
                        system,
                        turns_left: Some(turns),
                    });
                    if turns == 0 && lost.is_none() {
                        lost = Some(system);
                    }
                }
            } else {
                state.armed = true;
                state.one_shot_applied = false;
                state.turns_left = ctx
                    .cfg
                    .crisis
                    .turns_before_loss(system)
                    .map(|turns| turns.max(1));
                debug!(
                    target: LOG_TARGET_CRISIS,
                    "{system} crisis armed ({:?} turns)",
                    state.turns_left
                );
                ctx.events.push(EventKind::CrisisEntered {
                    system,
                    turns_left: state.turns_left,
                });
            }

            apply_down_effect(system, state, ctx);
        }
        lost
    }
}

fn apply_down_effect(system: SystemType, state: &mut CrisisState, ctx: &mut CrisisContext<'_>) {
    let changed = match system {
        SystemType::LifeSupport => ctx.resources.zero(ResourceKind::Oxygen),
        SystemType::Comms if !state.one_shot_applied => {
            state.one_shot_applied = true;
            ctx.resources.zero(ResourceKind::Signal)
        }
        SystemType::Comms
        | SystemType::Power
        | SystemType::BuildingIntegrity
        | SystemType::Defense => false,
    };
    if changed {
        ctx.events.push(EventKind::ResourcesChanged {
            resources: *ctx.resources,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ModuleSpec, StationLayout};
    use crate::module::{ModuleId, ModuleType};
    use crate::resources::StartingResources;

    struct Fixture {
        station: Station,
        resources: ResourcePool,
        events: EventLog,
        cfg: GameConfig,
        engine: CrisisEngine,
    }

    impl Fixture {
        fn new() -> Self {
            let spec = |id: &str, module_type, system| ModuleSpec {
                id: ModuleId::new(id),
                module_type,
                max_health: 2,
                system: Some(system),
            };
            let layout = StationLayout {
                modules: vec![
                    spec("o2", ModuleType::OxygenGenerator, SystemType::LifeSupport),
                    spec("reactor", ModuleType::Reactor, SystemType::Power),
                    spec("dish", ModuleType::Antenna, SystemType::Comms),
                    spec("frame", ModuleType::StructuralFrame, SystemType::BuildingIntegrity),
                    spec("turret", ModuleType::PointDefense, SystemType::Defense),
                ],
            };
            Self {
                station: Station::from_layout(&layout),
                resources: ResourcePool::new(StartingResources {
                    signal: 7,
                    ..StartingResources::default()
                }),
                events: EventLog::new(1),
                cfg: GameConfig::default(),
                engine: CrisisEngine::default(),
            }
        }

        fn kill(&mut self, idx: usize) {
            self.station.damage_module(idx, 99, &mut self.events);
        }

        fn heal(&mut self, idx: usize) {
            self.station.repair_module(idx, 1, &mut self.events);
        }

        fn evaluate(&mut self, turn_elapsed: bool) -> Option<SystemType> {
            let mut ctx = CrisisContext {
                station: &mut self.station,
                resources: &mut self.resources,
                events: &mut self.events,
                cfg: &self.cfg,
            };
            self.engine.evaluate(&mut ctx, turn_elapsed)
        }
    }

    #[test]
    fn life_support_loses_after_threshold_turns() {
        let mut fx = Fixture::new();
        fx.kill(0);
        assert_eq!(fx.evaluate(false), None);
        assert_eq!(fx.engine.state(SystemType::LifeSupport).turns_left, Some(2));
        assert_eq!(fx.resources.oxygen(), 0);

        assert_eq!(fx.evaluate(true), None);
        assert_eq!(fx.engine.state(SystemType::LifeSupport).turns_left, Some(1));
        assert_eq!(fx.evaluate(false), None, "no turn, no tick");
        assert_eq!(fx.evaluate(true), Some(SystemType::LifeSupport));
    }

    #[test]
    fn recovery_cancels_and_resets() {
        let mut fx = Fixture::new();
        fx.kill(0);
        fx.evaluate(false);
        fx.evaluate(true);
        fx.heal(0);
        assert_eq!(fx.evaluate(false), None);
        assert!(!fx.engine.is_armed(SystemType::LifeSupport));
        assert!(fx.events.pending().iter().any(|event| matches!(
            event.kind,
            EventKind::CrisisCleared {
                system: SystemType::LifeSupport
            }
        )));

        fx.kill(0);
        fx.evaluate(false);
        assert_eq!(
            fx.engine.state(SystemType::LifeSupport).turns_left,
            Some(2),
            "countdown restarts from the full threshold"
        );
    }

    #[test]
    fn arming_turn_does_not_tick() {
        let mut fx = Fixture::new();
        fx.kill(3);
        assert_eq!(fx.evaluate(true), None);
        assert_eq!(
            fx.engine.state(SystemType::BuildingIntegrity).turns_left,
            Some(3)
        );
    }

    #[test]
    fn comms_resets_signal_once_per_entry() {
        let mut fx = Fixture::new();
        fx.kill(2);
        fx.evaluate(false);
        assert_eq!(fx.resources.signal(), 0);
        fx.resources.apply(ResourceKind::Signal, 4);
        fx.evaluate(true);
        fx.evaluate(false);
        assert_eq!(fx.resources.signal(), 4, "one-shot does not repeat");
        assert_eq!(fx.engine.state(SystemType::Comms).turns_left, None);

        fx.heal(2);
        fx.evaluate(false);
        fx.kill(2);
        fx.evaluate(false);
        assert_eq!(fx.resources.signal(), 0, "re-entry fires again");
    }

    #[test]
    fn power_blackout_damages_once_per_turn() {
        let mut fx = Fixture::new();
        fx.kill(1);
        fx.evaluate(false);
        assert_eq!(fx.station.module(0).unwrap().health(), 2);

        assert_eq!(fx.evaluate(true), None);
        assert_eq!(fx.station.module(0).unwrap().health(), 1);
        fx.evaluate(false);
        assert_eq!(fx.station.module(0).unwrap().health(), 1);

        fx.evaluate(true);
        assert!(fx.engine.is_armed(SystemType::LifeSupport), "blackout killed o2");
        assert!(fx.engine.is_armed(SystemType::Defense));
    }

    #[test]
    fn defense_penalty_applies_while_armed() {
        let mut fx = Fixture::new();
        assert!(fx.engine.event_chance_penalty(&fx.cfg).abs() < f32::EPSILON);
        fx.kill(4);
        fx.evaluate(false);
        assert!((fx.engine.event_chance_penalty(&fx.cfg) - 0.15).abs() < f32::EPSILON);
        fx.heal(4);
        fx.evaluate(false);
        assert!(fx.engine.event_chance_penalty(&fx.cfg).abs() < f32::EPSILON);
    }

    #[test]
    fn threshold_of_zero_is_treated_as_one() {
        let mut fx = Fixture::new();
        fx.cfg.crisis.life_support = Some(0);
        fx.kill(0);
        fx.evaluate(false);
        assert_eq!(fx.engine.state(SystemType::LifeSupport).turns_left, Some(1));
        assert_eq!(fx.evaluate(true), Some(SystemType::LifeSupport));
    }
}
