use rand::SeedableRng;
use rand::rngs::SmallRng;
use station_game::deck::DeckState;
use station_game::{
    CardCatalog, CardDefinition, CardId, CardKind, GameConfig, ResourceDeltas, TargetRule,
    event_chance_for_day, max_draws_for_day,
};
use std::collections::HashMap;
use std::convert::TryFrom;

const SAMPLE_SIZE: usize = 5000;
const TOLERANCE: f64 = 0.025;

fn card(id: &str, kind: CardKind, weight: f32) -> CardDefinition {
    CardDefinition {
        id: CardId::new(id),
        name: id.to_string(),
        description: String::new(),
        kind,
        draw_weight: weight,
        target_rule: TargetRule::AnyModule,
        requires_target: false,
        use_random_target_if_none: false,
        effects: ResourceDeltas::default(),
        module_damage: 0,
        module_repair: 0,
    }
}

fn rate(count: usize) -> f64 {
    let total = f64::from(u32::try_from(SAMPLE_SIZE).expect("sample size fits"));
    f64::from(u32::try_from(count).expect("count fits")) / total
}

#[test]
fn roulette_frequencies_track_weights() {
    let deck = DeckState::from_catalog(&CardCatalog::from_decks(
        Vec::new(),
        vec![
            card("heavy", CardKind::Action, 3.0),
            card("medium", CardKind::Action, 1.5),
            card("light", CardKind::Action, 0.5),
            card("never", CardKind::Action, 0.0),
        ],
    ));
    let mut rng = SmallRng::seed_from_u64(0xD3C4);
    let mut counts: HashMap<String, usize> = HashMap::new();
    for _ in 0..SAMPLE_SIZE {
        let drawn = deck
            .draw_random_by_chance(0.0, &mut rng)
            .card
            .expect("action pool has weight");
        *counts.entry(drawn.card.id.0).or_default() += 1;
    }

    assert!(!counts.contains_key("never"), "zero weight is never drawn");
    for (id, expected) in [("heavy", 0.6), ("medium", 0.3), ("light", 0.1)] {
        let observed = rate(counts.get(id).copied().unwrap_or_default());
        assert!(
            (observed - expected).abs() <= TOLERANCE,
            "{id} drifted: observed {observed:.4}, expected {expected:.2}"
        );
    }
}

#[test]
fn pool_choice_tracks_event_chance() {
    let deck = DeckState::from_catalog(&CardCatalog::from_decks(
        vec![card("storm", CardKind::Event, 1.0)],
        vec![card("wrench", CardKind::Action, 1.0)],
    ));
    let mut rng = SmallRng::seed_from_u64(0x5EED);
    let events = (0..SAMPLE_SIZE)
        .filter(|_| deck.draw_random_by_chance(0.35, &mut rng).kind == CardKind::Event)
        .count();
    let observed = rate(events);
    assert!(
        (observed - 0.35).abs() <= TOLERANCE,
        "event share drifted: observed {observed:.4}"
    );
}

#[test]
fn schedule_examples_hold() {
    let cfg = GameConfig::default();
    assert_eq!(max_draws_for_day(&cfg, 3), 12);
    assert!((event_chance_for_day(&cfg, 10) - 0.53).abs() < 1e-5);
    assert!((event_chance_for_day(&cfg, 30) - 0.85).abs() < 1e-6);
}
