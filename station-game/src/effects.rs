//! Card effect application.
use rand::Rng;

use crate::data::{CardDefinition, TargetRule};
use crate::event::{EventKind, EventLog};
use crate::module::HealthChange;
use crate::resources::ResourcePool;
use crate::station::Station;

/// What a resolved card actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolution {
    pub target: Option<usize>,
    pub resources_changed: bool,
    pub damage: Option<HealthChange>,
    pub repair: Option<HealthChange>,
}

/// Choose a target for an Event card.
///
/// `SpecificType` picks uniformly among modules of that type. `AnyModule`
/// picks uniformly among all modules only when the card asks for a random
/// target; otherwise the event is untargeted.
pub fn pick_event_target<R: Rng + ?Sized>(
    card: &CardDefinition,
    station: &Station,
    alive_only: bool,
    rng: &mut R,
) -> Option<usize> {
    match card.target_rule {
        TargetRule::SpecificType { module_type } => {
            station.random_of_type(module_type, alive_only, rng)
        }
        TargetRule::AnyModule if card.use_random_target_if_none => station.random_module(rng),
        TargetRule::AnyModule => None,
    }
}

/// Apply a card's effect: resource deltas, then damage, then repair.
pub fn apply_card(
    card: &CardDefinition,
    target: Option<usize>,
    station: &mut Station,
    resources: &mut ResourcePool,
    events: &mut EventLog,
) -> Resolution {
    let mut resolution = Resolution {
        target,
        ..Resolution::default()
    };

    if resources.apply_deltas(&card.effects) {
        resolution.resources_changed = true;
        events.push(EventKind::ResourcesChanged {
            resources: *resources,
        });
    }

    let Some(idx) = target else {
        return resolution;
    };
    if card.module_damage > 0 {
        resolution.damage = station.damage_module(idx, card.module_damage, events);
    }
    if card.module_repair > 0 {
        resolution.repair = station.repair_module(idx, card.module_repair, events);
    }
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CardId, CardKind, ModuleSpec, StationLayout};
    use crate::module::{ModuleId, ModuleType};
    use crate::resources::{ResourceDeltas, StartingResources};
    use crate::station::SystemType;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn station() -> Station {
        let spec = |id: &str, module_type, system| ModuleSpec {
            id: ModuleId::new(id),
            module_type,
            max_health: 4,
            system,
        };
        Station::from_layout(&StationLayout {
            modules: vec![
                spec("hull-a", ModuleType::HullSection, Some(SystemType::BuildingIntegrity)),
                spec("hull-b", ModuleType::HullSection, Some(SystemType::BuildingIntegrity)),
                spec("dish", ModuleType::Antenna, Some(SystemType::Comms)),
            ],
        })
    }

    fn card(rule: TargetRule, damage: i32, repair: i32) -> CardDefinition {
        CardDefinition {
            id: CardId::new("card"),
            name: "Card".into(),
            description: String::new(),
            kind: CardKind::Event,
            draw_weight: 1.0,
            target_rule: rule,
            requires_target: false,
            use_random_target_if_none: false,
            effects: ResourceDeltas {
                signal: 2,
                oxygen: -5,
                power: 0,
                hull: 0,
            },
            module_damage: damage,
            module_repair: repair,
        }
    }

    #[test]
    fn typed_events_only_hit_matching_modules() {
        let station = station();
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let card = card(
            TargetRule::SpecificType {
                module_type: ModuleType::HullSection,
            },
            1,
            0,
        );
        for _ in 0..100 {
            let idx = pick_event_target(&card, &station, false, &mut rng).unwrap();
            assert!(idx < 2);
        }
    }

    #[test]
    fn any_module_needs_random_flag() {
        let station = station();
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let mut card = card(TargetRule::AnyModule, 1, 0);
        assert!(pick_event_target(&card, &station, false, &mut rng).is_none());
        card.use_random_target_if_none = true;
        assert!(pick_event_target(&card, &station, false, &mut rng).is_some());
    }

    #[test]
    fn applies_resources_then_damage_then_repair() {
        let mut station = station();
        let mut resources = ResourcePool::new(StartingResources::default());
        let mut events = EventLog::new(1);
        let card = card(TargetRule::AnyModule, 3, 1);

        let resolution = apply_card(&card, Some(2), &mut station, &mut resources, &mut events);
        assert!(resolution.resources_changed);
        assert_eq!(resolution.damage.map(|c| c.after), Some(1));
        assert_eq!(resolution.repair.map(|c| c.after), Some(2));
        assert_eq!(resources.signal(), 2);
        assert_eq!(resources.oxygen(), 55);

        let kinds: Vec<&EventKind> = events.pending().iter().map(|e| &e.kind).collect();
        assert!(matches!(kinds[0], EventKind::ResourcesChanged { .. }));
        assert!(matches!(
            kinds[1],
            EventKind::ModuleHealthChanged { after: 1, .. }
        ));
        assert!(matches!(
            kinds[3],
            EventKind::ModuleHealthChanged { after: 2, .. }
        ));
    }

    #[test]
    fn untargeted_card_only_moves_resources() {
        let mut station = station();
        let mut resources = ResourcePool::default();
        let mut events = EventLog::new(1);
        let resolution = apply_card(
            &card(TargetRule::AnyModule, 3, 0),
            None,
            &mut station,
            &mut resources,
            &mut events,
        );
        assert!(resolution.damage.is_none());
        assert!(station.modules().iter().all(|m| !m.is_damaged()));
    }
}
