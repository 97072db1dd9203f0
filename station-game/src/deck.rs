//! Weighted, non-consuming card draws over the Event and Action pools.
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{ACTION_POOL_ID, EVENT_POOL_ID, LOG_TARGET_DECK};
use crate::data::{CardCatalog, CardDefinition, CardId, CardKind};
use crate::numbers::clamp_unit;

/// Candidate weight telemetry captured during a draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedCandidate {
    pub id: CardId,
    pub weight: f64,
}

/// Why a particular card came out of the deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawTrace {
    /// Identifier for the selection pool (e.g., `station.deck.event`).
    pub pool_id: String,
    /// Probability the Event pool was chosen for this draw.
    pub event_chance: f32,
    /// Roulette sample in `[0, total_weight)`.
    pub roll: f64,
    /// Positive-weight cards considered, in pool order.
    pub candidates: Vec<WeightedCandidate>,
    pub chosen_id: CardId,
}

/// A card picked from one of the pools.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnCard {
    pub card: CardDefinition,
    pub trace: DrawTrace,
}

/// Result of a single draw attempt. `card` is `None` when the chosen pool had
/// nothing drawable, in which case no turn elapses.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawOutcome {
    pub kind: CardKind,
    pub card: Option<DrawnCard>,
}

/// Both draw pools. Cards stay in their pool after being drawn.
#[derive(Debug, Clone, Default)]
pub struct DeckState {
    event_pool: Vec<CardDefinition>,
    action_pool: Vec<CardDefinition>,
}

impl DeckState {
    #[must_use]
    pub fn from_catalog(catalog: &CardCatalog) -> Self {
        Self {
            event_pool: catalog.event_deck.clone(),
            action_pool: catalog.action_deck.clone(),
        }
    }

    #[must_use]
    pub fn pool(&self, kind: CardKind) -> &[CardDefinition] {
        match kind {
            CardKind::Event => &self.event_pool,
            CardKind::Action => &self.action_pool,
        }
    }

    /// Pick the pool by a Bernoulli trial on `event_chance`, then roulette
    /// within it.
    pub fn draw_random_by_chance<R: Rng + ?Sized>(
        &self,
        event_chance: f32,
        rng: &mut R,
    ) -> DrawOutcome {
        let chance = clamp_unit(event_chance);
        let kind = if rng.gen_bool(f64::from(chance)) {
            CardKind::Event
        } else {
            CardKind::Action
        };
        let pool_id = match kind {
            CardKind::Event => EVENT_POOL_ID,
            CardKind::Action => ACTION_POOL_ID,
        };

        let card = draw_weighted(self.pool(kind), rng).map(|(card, roll, candidates)| {
            let trace = DrawTrace {
                pool_id: String::from(pool_id),
                event_chance: chance,
                roll,
                candidates,
                chosen_id: card.id.clone(),
            };
            debug!(
                target: LOG_TARGET_DECK,
                "drew {} card {} (roll {:.3} over {} candidates, event chance {:.2})",
                kind,
                trace.chosen_id,
                trace.roll,
                trace.candidates.len(),
                chance
            );
            DrawnCard {
                card: card.clone(),
                trace,
            }
        });
        if card.is_none() {
            debug!(target: LOG_TARGET_DECK, "{kind} pool has nothing drawable");
        }
        DrawOutcome { kind, card }
    }
}

/// Roulette over positive weights. Returns the card, the sample, and the
/// candidate list, or `None` when the pool has no positive weight.
pub fn draw_weighted<'a, R: Rng + ?Sized>(
    pool: &'a [CardDefinition],
    rng: &mut R,
) -> Option<(&'a CardDefinition, f64, Vec<WeightedCandidate>)> {
    let candidates: Vec<(&CardDefinition, f64)> = pool
        .iter()
        .filter(|card| card.is_drawable())
        .map(|card| (card, f64::from(card.draw_weight)))
        .collect();
    let total: f64 = candidates.iter().map(|(_, weight)| weight).sum();
    if candidates.is_empty() || !total.is_finite() || total <= 0.0 {
        return None;
    }

    let roll = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    let mut chosen = None;
    for (card, weight) in &candidates {
        cumulative += weight;
        if roll < cumulative {
            chosen = Some(*card);
            break;
        }
    }
    // Floating-point accumulation can leave the roll just above the sum.
    let chosen = chosen.or_else(|| candidates.last().map(|(card, _)| *card))?;

    let telemetry = candidates
        .iter()
        .map(|(card, weight)| WeightedCandidate {
            id: card.id.clone(),
            weight: *weight,
        })
        .collect();
    Some((chosen, roll, telemetry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TargetRule;
    use crate::resources::ResourceDeltas;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

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

    fn deck() -> DeckState {
        DeckState::from_catalog(&CardCatalog::from_decks(
            vec![card("flare", CardKind::Event, 1.0)],
            vec![
                card("common", CardKind::Action, 3.0),
                card("rare", CardKind::Action, 1.0),
                card("never", CardKind::Action, 0.0),
            ],
        ))
    }

    #[test]
    fn chance_extremes_pick_the_pool() {
        let deck = deck();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(
                deck.draw_random_by_chance(1.0, &mut rng).kind,
                CardKind::Event
            );
            assert_eq!(
                deck.draw_random_by_chance(0.0, &mut rng).kind,
                CardKind::Action
            );
            assert_eq!(
                deck.draw_random_by_chance(f32::NAN, &mut rng).kind,
                CardKind::Action
            );
            assert_eq!(
                deck.draw_random_by_chance(4.0, &mut rng).kind,
                CardKind::Event
            );
        }
    }

    #[test]
    fn zero_weight_cards_never_drawn() {
        let deck = deck();
        let mut rng = ChaCha20Rng::seed_from_u64(99);
        for _ in 0..2_000 {
            let drawn = deck.draw_random_by_chance(0.0, &mut rng).card.unwrap();
            assert_ne!(drawn.card.id.as_str(), "never");
            assert_eq!(drawn.trace.candidates.len(), 2);
            assert!(drawn.trace.roll < 4.0);
        }
    }

    #[test]
    fn empty_or_weightless_pool_yields_no_card() {
        let deck = DeckState::from_catalog(&CardCatalog::from_decks(
            Vec::new(),
            vec![card("never", CardKind::Action, 0.0)],
        ));
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let outcome = deck.draw_random_by_chance(1.0, &mut rng);
        assert_eq!(outcome.kind, CardKind::Event);
        assert!(outcome.card.is_none());
        assert!(deck.draw_random_by_chance(0.0, &mut rng).card.is_none());
    }

    #[test]
    fn trace_names_pool_and_choice() {
        let deck = deck();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let drawn = deck.draw_random_by_chance(1.0, &mut rng).card.unwrap();
        assert_eq!(drawn.trace.pool_id, EVENT_POOL_ID);
        assert_eq!(drawn.trace.chosen_id, CardId::new("flare"));
        assert!((drawn.trace.event_chance - 1.0).abs() < f32::EPSILON);
    }
}
