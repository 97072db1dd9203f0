use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use station_game::targeting::valid_targets;
use station_game::{CardDefinition, CardId, GameSession, ModuleId, StationModule, TargetingState};

/// Request a policy wants to send to the session next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyMove {
    Draw,
    Play(CardId),
    Target(ModuleId),
    CancelTargeting,
    ReplaceOverflow(usize),
    DiscardOverflow,
}

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub action: PolicyMove,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(action: PolicyMove, rationale: Option<String>) -> Self {
        Self { action, rationale }
    }

    #[must_use]
    pub fn draw() -> Self {
        Self::new(PolicyMove::Draw, None)
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Choose between drawing and playing a held card.
    fn pick_idle(&mut self, session: &GameSession) -> PolicyDecision;

    /// Choose a module for the card awaiting a target. `targets` may be empty.
    fn pick_target(
        &mut self,
        session: &GameSession,
        card: &CardDefinition,
        targets: &[ModuleId],
    ) -> PolicyDecision;

    /// Decide what to do with an Action card drawn into a full hand.
    fn pick_overflow(
        &mut self,
        session: &GameSession,
        incoming: &CardDefinition,
    ) -> PolicyDecision;
}

/// Route the session's current input state to the matching policy hook.
pub fn decide(policy: &mut dyn PlayerPolicy, session: &GameSession) -> PolicyDecision {
    if let Some(incoming) = session
        .hand()
        .pending_overflow()
        .and_then(|id| session.catalog().get(id))
    {
        return policy.pick_overflow(session, incoming);
    }
    if let TargetingState::Targeting(card_id) = session.targeting()
        && let Some(card) = session.catalog().get(card_id)
    {
        let targets = valid_targets(card, session.station().modules());
        return policy.pick_target(session, card, &targets);
    }
    policy.pick_idle(session)
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Random,
    Repairer,
    SignalRush,
}

impl GameplayStrategy {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GameplayStrategy::Random => "Random",
            GameplayStrategy::Repairer => "Repairer",
            GameplayStrategy::SignalRush => "Signal Rush",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            GameplayStrategy::Random => Box::new(RandomPolicy::new(seed)),
            GameplayStrategy::Repairer => Box::new(RepairerPolicy),
            GameplayStrategy::SignalRush => Box::new(SignalRushPolicy),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct RandomPolicy {
    rng: ChaCha20Rng,
    play_chance: f64,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            play_chance: 0.4,
        }
    }
}

struct RepairerPolicy;
struct SignalRushPolicy;

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_idle(&mut self, session: &GameSession) -> PolicyDecision {
        let held = session.hand().cards();
        if held.is_empty() || !self.rng.gen_bool(self.play_chance) {
            return PolicyDecision::draw();
        }
        let idx = self.rng.gen_range(0..held.len());
        PolicyDecision::new(PolicyMove::Play(held[idx].clone()), None)
    }

    fn pick_target(
        &mut self,
        _session: &GameSession,
        _card: &CardDefinition,
        targets: &[ModuleId],
    ) -> PolicyDecision {
        if targets.is_empty() {
            return PolicyDecision::new(
                PolicyMove::CancelTargeting,
                Some("no valid target".to_string()),
            );
        }
        let idx = self.rng.gen_range(0..targets.len());
        PolicyDecision::new(PolicyMove::Target(targets[idx].clone()), None)
    }

    fn pick_overflow(
        &mut self,
        session: &GameSession,
        _incoming: &CardDefinition,
    ) -> PolicyDecision {
        let len = session.hand().cards().len();
        if len == 0 || self.rng.gen_bool(0.5) {
            return PolicyDecision::new(PolicyMove::DiscardOverflow, None);
        }
        PolicyDecision::new(PolicyMove::ReplaceOverflow(self.rng.gen_range(0..len)), None)
    }
}

impl PlayerPolicy for RepairerPolicy {
    fn name(&self) -> &'static str {
        "Repairer"
    }

    fn pick_idle(&mut self, session: &GameSession) -> PolicyDecision {
        let urgent = held_cards(session)
            .filter(|card| card.module_repair > 0 && card.requires_target)
            .filter_map(|card| best_repair_target(session, card).map(|score| (card, score)))
            .min_by_key(|(_, score)| *score);
        if let Some((card, _)) = urgent {
            return PolicyDecision::new(
                PolicyMove::Play(card.id.clone()),
                Some("repair".to_string()),
            );
        }
        if let Some(card) = held_cards(session)
            .find(|card| !card.requires_target && card.effects.signal > 0)
        {
            return PolicyDecision::new(
                PolicyMove::Play(card.id.clone()),
                Some("signal".to_string()),
            );
        }
        PolicyDecision::draw()
    }

    fn pick_target(
        &mut self,
        session: &GameSession,
        _card: &CardDefinition,
        targets: &[ModuleId],
    ) -> PolicyDecision {
        let choice = targets
            .iter()
            .filter_map(|id| repair_priority(session, id).map(|score| (id, score)))
            .min_by_key(|(_, score)| *score)
            .map(|(id, _)| id)
            .or_else(|| targets.first());
        match choice {
            Some(id) => PolicyDecision::new(PolicyMove::Target(id.clone()), None),
            None => PolicyDecision::new(
                PolicyMove::CancelTargeting,
                Some("no valid target".to_string()),
            ),
        }
    }

    fn pick_overflow(
        &mut self,
        session: &GameSession,
        incoming: &CardDefinition,
    ) -> PolicyDecision {
        if incoming.module_repair > 0
            && let Some(idx) = held_cards(session).position(|card| card.module_repair == 0)
        {
            return PolicyDecision::new(
                PolicyMove::ReplaceOverflow(idx),
                Some("keep repair card".to_string()),
            );
        }
        PolicyDecision::new(PolicyMove::DiscardOverflow, None)
    }
}

impl PlayerPolicy for SignalRushPolicy {
    fn name(&self) -> &'static str {
        "Signal Rush"
    }

    fn pick_idle(&mut self, session: &GameSession) -> PolicyDecision {
        if let Some(card) = held_cards(session)
            .filter(|card| card.effects.signal > 0)
            .max_by_key(|card| card.effects.signal)
        {
            return PolicyDecision::new(
                PolicyMove::Play(card.id.clone()),
                Some(format!("signal +{}", card.effects.signal)),
            );
        }
        if !session.armed_systems().is_empty()
            && let Some(card) = held_cards(session).find(|card| {
                card.module_repair > 0
                    && card.requires_target
                    && best_repair_target(session, card).is_some()
            })
        {
            return PolicyDecision::new(
                PolicyMove::Play(card.id.clone()),
                Some("crisis repair".to_string()),
            );
        }
        PolicyDecision::draw()
    }

    fn pick_target(
        &mut self,
        session: &GameSession,
        _card: &CardDefinition,
        targets: &[ModuleId],
    ) -> PolicyDecision {
        let choice = targets
            .iter()
            .find(|id| session.station().find(id).is_some_and(needs_repair))
            .or_else(|| targets.first());
        match choice {
            Some(id) => PolicyDecision::new(PolicyMove::Target(id.clone()), None),
            None => PolicyDecision::new(
                PolicyMove::CancelTargeting,
                Some("no valid target".to_string()),
            ),
        }
    }

    fn pick_overflow(
        &mut self,
        session: &GameSession,
        incoming: &CardDefinition,
    ) -> PolicyDecision {
        let weakest = held_cards(session)
            .enumerate()
            .min_by_key(|(_, card)| card.effects.signal);
        if let Some((idx, card)) = weakest
            && incoming.effects.signal > card.effects.signal
        {
            return PolicyDecision::new(
                PolicyMove::ReplaceOverflow(idx),
                Some(format!("swap out {}", card.id)),
            );
        }
        PolicyDecision::new(PolicyMove::DiscardOverflow, None)
    }
}

fn held_cards(session: &GameSession) -> impl Iterator<Item = &CardDefinition> {
    session
        .hand()
        .cards()
        .iter()
        .filter_map(|id| session.catalog().get(id))
}

fn needs_repair(module: &StationModule) -> bool {
    !module.is_alive() || module.is_damaged()
}

/// Lower is more urgent: modules in a system under crisis first, then by
/// remaining health. `None` for modules that need no repair.
fn repair_priority(session: &GameSession, id: &ModuleId) -> Option<(u8, i32)> {
    let station = session.station();
    let idx = station.index_of(id)?;
    let module = station.module(idx)?;
    if !needs_repair(module) {
        return None;
    }
    let in_crisis = station
        .system_of(idx)
        .is_some_and(|system| session.crisis().is_armed(system));
    Some((u8::from(!in_crisis), module.health()))
}

fn best_repair_target(session: &GameSession, card: &CardDefinition) -> Option<(u8, i32)> {
    valid_targets(card, session.station().modules())
        .iter()
        .filter_map(|id| repair_priority(session, id))
        .min()
}
