//! The simulation context object and its external operations.
//!
//! A [`GameSession`] owns every piece of mutable game state. The presentation
//! layer calls the request methods, drains notifications after each call, and
//! acknowledges finished presentation through
//! [`GameSession::notify_presentation_complete`]. Every rejected request
//! leaves state untouched.
use log::{debug, info, warn};
use thiserror::Error;

use crate::config::GameConfig;
use crate::constants::LOG_TARGET_SESSION;
use crate::crisis::{CrisisContext, CrisisEngine};
use crate::data::{CardCatalog, CardDefinition, CardId, CardKind, StationLayout, TargetRule};
use crate::day::DayState;
use crate::deck::DeckState;
use crate::effects::{apply_card, pick_event_target};
use crate::event::{EventKind, EventLog, SimEvent};
use crate::hand::HandState;
use crate::module::ModuleId;
use crate::numbers::clamp_unit;
use crate::outcome::GameOutcome;
use crate::resources::ResourcePool;
use crate::rng::RngBundle;
use crate::station::{Station, SystemType};
use crate::targeting::{
    StartTransition, TargetingSession, TargetingState, is_valid_target, valid_targets,
};

/// Why a request was ignored.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("the game is over")]
    GameOver,
    #[error("waiting for presentation to finish")]
    Busy,
    #[error("an overflow choice is pending")]
    OverflowPending,
    #[error("unknown card `{0}`")]
    UnknownCard(CardId),
    #[error("card `{0}` is not in the hand")]
    CardNotInHand(CardId),
    #[error("no card is awaiting a target")]
    NotTargeting,
    #[error("unknown module `{0}`")]
    UnknownModule(ModuleId),
    #[error("module `{module}` is not a valid target for `{card}`")]
    InvalidTarget { card: CardId, module: ModuleId },
    #[error("a card is still resolving")]
    ResolutionInFlight,
    #[error("there is no overflow card to place")]
    NothingToChoose,
    #[error("hand index {index} is out of range (hand holds {len})")]
    HandIndexOutOfRange { index: usize, len: usize },
}

/// What a draw request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawResult {
    /// The day's budget was spent; the day advanced instead of drawing.
    DayAdvanced { day: u32 },
    /// The chosen pool had nothing drawable. No turn elapsed.
    NoCard { kind: CardKind },
    /// A card was drawn and a turn elapsed.
    Drawn { card: CardId, kind: CardKind },
    /// The game ended before a card could be drawn.
    Ended { outcome: GameOutcome },
}

/// What playing an Action card did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayResult {
    /// The card now waits for a module click.
    TargetingStarted { valid_targets: Vec<ModuleId> },
    /// The card was already pending and targeting was toggled off.
    TargetingCancelled,
    /// The card needed no target and resolved at once.
    Resolved,
}

/// Aggregate counters for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub turns: u32,
    pub empty_draws: u32,
    pub events_resolved: u32,
    pub actions_played: u32,
    pub overflow_discards: u32,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    cfg: GameConfig,
    catalog: CardCatalog,
    deck: DeckState,
    station: Station,
    resources: ResourcePool,
    hand: HandState,
    targeting: TargetingSession,
    crisis: CrisisEngine,
    day: DayState,
    outcome: GameOutcome,
    busy: bool,
    rng: RngBundle,
    events: EventLog,
    stats: SessionStats,
}

impl GameSession {
    /// Start a session on day one. Inputs are expected to be validated.
    #[must_use]
    pub fn new(catalog: CardCatalog, layout: &StationLayout, cfg: GameConfig, seed: u64) -> Self {
        let station = Station::from_layout(layout);
        warn_unreachable_targets(&catalog, &station);

        let day = DayState::first(&cfg);
        let mut events = EventLog::new(day.day());
        events.push(EventKind::DayChanged {
            day: day.day(),
            draws_allowed: day.draws_allowed(),
            event_chance: day.event_chance(),
        });
        info!(
            target: LOG_TARGET_SESSION,
            "session started (seed {seed}, {} modules, {} cards)",
            station.modules().len(),
            catalog.cards().count()
        );

        Self {
            deck: DeckState::from_catalog(&catalog),
            resources: ResourcePool::new(cfg.starting_resources),
            hand: HandState::new(cfg.max_hand_size),
            targeting: TargetingSession::default(),
            crisis: CrisisEngine::default(),
            outcome: GameOutcome::InProgress,
            busy: false,
            rng: RngBundle::from_user_seed(seed),
            stats: SessionStats::default(),
            catalog,
            station,
            day,
            events,
            cfg,
        }
    }

    // Accessors -------------------------------------------------------------

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.cfg
    }

    #[must_use]
    pub const fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn station(&self) -> &Station {
        &self.station
    }

    #[must_use]
    pub const fn resources(&self) -> &ResourcePool {
        &self.resources
    }

    #[must_use]
    pub const fn hand(&self) -> &HandState {
        &self.hand
    }

    #[must_use]
    pub const fn targeting(&self) -> &TargetingState {
        self.targeting.state()
    }

    #[must_use]
    pub const fn crisis(&self) -> &CrisisEngine {
        &self.crisis
    }

    #[must_use]
    pub const fn day(&self) -> &DayState {
        &self.day
    }

    #[must_use]
    pub const fn outcome(&self) -> GameOutcome {
        self.outcome
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_over()
    }

    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// RNG draw counts as `(deck, targeting)`.
    #[must_use]
    pub const fn rng_draws(&self) -> (u64, u64) {
        self.rng.draw_counts()
    }

    /// Subsystems currently in crisis, in evaluation order.
    #[must_use]
    pub fn armed_systems(&self) -> Vec<SystemType> {
        SystemType::ALL
            .into_iter()
            .filter(|system| self.crisis.is_armed(*system))
            .collect()
    }

    /// Event-draw probability for the next draw, including crisis penalties.
    #[must_use]
    pub fn effective_event_chance(&self) -> f32 {
        clamp_unit(self.day.event_chance() + self.crisis.event_chance_penalty(&self.cfg))
    }

    #[must_use]
    pub fn pending_events(&self) -> &[SimEvent] {
        self.events.pending()
    }

    /// Take every notification emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    // Requests --------------------------------------------------------------

    /// Draw a card, or advance the day when today's budget is spent.
    ///
    /// # Errors
    ///
    /// Rejected after game end, while busy, or while an overflow choice is pending.
    pub fn request_draw(&mut self) -> Result<DrawResult, Rejection> {
        self.guard_idle()?;
        if self.hand.is_choosing_overflow() {
            return self.reject(Rejection::OverflowPending);
        }

        if self.day.budget_exhausted() {
            self.advance_day();
            return Ok(DrawResult::DayAdvanced {
                day: self.day.day(),
            });
        }

        if self.check_win() {
            return Ok(DrawResult::Ended {
                outcome: self.outcome,
            });
        }

        let chance = self.effective_event_chance();
        let outcome = self.deck.draw_random_by_chance(chance, self.rng.deck());
        let Some(drawn) = outcome.card else {
            self.stats.empty_draws = self.stats.empty_draws.saturating_add(1);
            return Ok(DrawResult::NoCard { kind: outcome.kind });
        };
        let card = drawn.card;

        self.day.record_draw();
        self.stats.turns = self.stats.turns.saturating_add(1);
        self.busy = true;
        self.events.push(EventKind::CardDrawn {
            card: card.id.clone(),
            kind: outcome.kind,
            trace: drawn.trace,
        });

        let result = DrawResult::Drawn {
            card: card.id.clone(),
            kind: outcome.kind,
        };
        if self.evaluate_crisis(true) {
            return Ok(result);
        }

        match outcome.kind {
            CardKind::Event => {
                let target = pick_event_target(
                    &card,
                    &self.station,
                    self.cfg.event_targets_alive_only,
                    self.rng.targeting(),
                );
                self.stats.events_resolved = self.stats.events_resolved.saturating_add(1);
                self.resolve(&card, target);
            }
            CardKind::Action => self.receive_action(card.id),
        }
        Ok(result)
    }

    /// Play an Action card from the hand.
    ///
    /// # Errors
    ///
    /// Rejected after game end, while busy, during an overflow choice, or when
    /// the card is unknown or not held.
    pub fn play_action_card(&mut self, card_id: &CardId) -> Result<PlayResult, Rejection> {
        self.guard_idle()?;
        if self.hand.is_choosing_overflow() {
            return self.reject(Rejection::OverflowPending);
        }
        let Some(card) = self.catalog.get(card_id).cloned() else {
            return self.reject(Rejection::UnknownCard(card_id.clone()));
        };
        if !self.hand.contains(card_id) {
            return self.reject(Rejection::CardNotInHand(card_id.clone()));
        }

        if card.requires_target {
            return match self.targeting.start(card_id) {
                StartTransition::Started => Ok(self.announce_targeting(&card)),
                StartTransition::Switched { previous } => {
                    self.events
                        .push(EventKind::TargetingCancelled { card: previous });
                    Ok(self.announce_targeting(&card))
                }
                StartTransition::Toggled => {
                    self.events.push(EventKind::TargetingCancelled {
                        card: card_id.clone(),
                    });
                    Ok(PlayResult::TargetingCancelled)
                }
                StartTransition::Ignored => self.reject(Rejection::ResolutionInFlight),
            };
        }

        if let Some(pending) = self.targeting.cancel() {
            self.events
                .push(EventKind::TargetingCancelled { card: pending });
        }
        self.busy = true;
        self.remove_from_hand(card_id);
        self.stats.actions_played = self.stats.actions_played.saturating_add(1);
        self.resolve(&card, None);
        Ok(PlayResult::Resolved)
    }

    /// Click a module while an Action card awaits its target.
    ///
    /// # Errors
    ///
    /// Rejected when nothing is pending, the module is unknown, or the module
    /// does not satisfy the card's target rule.
    pub fn select_target(&mut self, module_id: &ModuleId) -> Result<(), Rejection> {
        if self.is_over() {
            return self.reject(Rejection::GameOver);
        }
        if self.targeting.is_resolving() {
            return self.reject(Rejection::ResolutionInFlight);
        }
        if self.busy {
            return self.reject(Rejection::Busy);
        }
        let Some(card_id) = self.targeting.pending_card().cloned() else {
            return self.reject(Rejection::NotTargeting);
        };
        let Some(card) = self.catalog.get(&card_id).cloned() else {
            return self.reject(Rejection::UnknownCard(card_id));
        };
        let Some(idx) = self.station.index_of(module_id) else {
            return self.reject(Rejection::UnknownModule(module_id.clone()));
        };
        let valid = self
            .station
            .module(idx)
            .is_some_and(|module| is_valid_target(&card, module));
        if !valid {
            return self.reject(Rejection::InvalidTarget {
                card: card_id,
                module: module_id.clone(),
            });
        }

        self.targeting.begin_resolving();
        self.busy = true;
        self.stats.actions_played = self.stats.actions_played.saturating_add(1);
        self.resolve(&card, Some(idx));
        self.remove_from_hand(&card_id);
        Ok(())
    }

    /// Drop the card awaiting a target.
    ///
    /// # Errors
    ///
    /// Rejected after game end, while a resolution is in flight, or when no
    /// card is pending.
    pub fn cancel_targeting(&mut self) -> Result<(), Rejection> {
        if self.is_over() {
            return self.reject(Rejection::GameOver);
        }
        if self.targeting.is_resolving() {
            return self.reject(Rejection::ResolutionInFlight);
        }
        let Some(card) = self.targeting.cancel() else {
            return self.reject(Rejection::NotTargeting);
        };
        self.events.push(EventKind::TargetingCancelled { card });
        Ok(())
    }

    /// The presentation layer finished animating the last accepted request.
    /// Returns true when this unlocked input.
    pub fn notify_presentation_complete(&mut self) -> bool {
        self.targeting.finish_resolving();
        if !self.busy {
            return false;
        }
        self.busy = false;
        self.events.push(EventKind::InputUnlocked);
        true
    }

    /// Put the overflow card into hand slot `index`, discarding what was there.
    ///
    /// # Errors
    ///
    /// Rejected when no overflow card is pending or the index is out of range.
    pub fn choose_overflow_replacement(&mut self, index: usize) -> Result<(), Rejection> {
        self.guard_idle()?;
        if !self.hand.is_choosing_overflow() {
            return self.reject(Rejection::NothingToChoose);
        }
        let len = self.hand.cards().len();
        let Some(replacement) = self.hand.replace(index) else {
            return self.reject(Rejection::HandIndexOutOfRange { index, len });
        };
        self.events.push(EventKind::CardRemovedFromHand {
            card: replacement.removed.clone(),
        });
        self.events.push(EventKind::CardAddedToHand {
            card: replacement.inserted.clone(),
        });
        self.events.push(EventKind::OverflowResolved {
            kept: Some(replacement.inserted),
            discarded: replacement.removed,
        });
        Ok(())
    }

    /// Throw the overflow card away.
    ///
    /// # Errors
    ///
    /// Rejected when no overflow card is pending.
    pub fn discard_overflow(&mut self) -> Result<(), Rejection> {
        self.guard_idle()?;
        let Some(card) = self.hand.discard_overflow() else {
            return self.reject(Rejection::NothingToChoose);
        };
        self.stats.overflow_discards = self.stats.overflow_discards.saturating_add(1);
        self.events.push(EventKind::OverflowResolved {
            kept: None,
            discarded: card,
        });
        Ok(())
    }

    // Internals -------------------------------------------------------------

    fn guard_idle(&self) -> Result<(), Rejection> {
        if self.is_over() {
            return self.reject(Rejection::GameOver);
        }
        if self.busy {
            return self.reject(Rejection::Busy);
        }
        Ok(())
    }

    #[allow(clippy::unused_self)]
    fn reject<T>(&self, rejection: Rejection) -> Result<T, Rejection> {
        debug!(target: LOG_TARGET_SESSION, "request ignored: {rejection}");
        Err(rejection)
    }

    fn advance_day(&mut self) {
        if let Some(card) = self.targeting.cancel() {
            self.events.push(EventKind::TargetingCancelled { card });
        }
        self.day.advance(&self.cfg);
        self.events.set_day(self.day.day());
        self.events.push(EventKind::DayChanged {
            day: self.day.day(),
            draws_allowed: self.day.draws_allowed(),
            event_chance: self.day.event_chance(),
        });
        info!(
            target: LOG_TARGET_SESSION,
            "day {} begins: {} draws, event chance {:.2}",
            self.day.day(),
            self.day.draws_allowed(),
            self.day.event_chance()
        );
    }

    fn announce_targeting(&mut self, card: &CardDefinition) -> PlayResult {
        let targets = valid_targets(card, self.station.modules());
        self.events.push(EventKind::TargetingStarted {
            card: card.id.clone(),
            valid_targets: targets.clone(),
        });
        PlayResult::TargetingStarted {
            valid_targets: targets,
        }
    }

    fn receive_action(&mut self, card: CardId) {
        match self.hand.add(card) {
            Ok(()) => {
                if let Some(added) = self.hand.cards().last() {
                    self.events.push(EventKind::CardAddedToHand {
                        card: added.clone(),
                    });
                }
            }
            Err(card) => {
                // No card may await a target while a replacement is being chosen.
                if let Some(pending) = self.targeting.cancel() {
                    self.events
                        .push(EventKind::TargetingCancelled { card: pending });
                }
                self.events
                    .push(EventKind::OverflowStarted { card: card.clone() });
                self.hand.start_overflow(card);
            }
        }
    }

    fn remove_from_hand(&mut self, card: &CardId) {
        if self.hand.remove(card) {
            self.events
                .push(EventKind::CardRemovedFromHand { card: card.clone() });
        }
    }

    /// Apply a card, then check the win condition, then re-evaluate crises.
    fn resolve(&mut self, card: &CardDefinition, target: Option<usize>) {
        let resolution = apply_card(
            card,
            target,
            &mut self.station,
            &mut self.resources,
            &mut self.events,
        );
        let target_id = resolution
            .target
            .and_then(|idx| self.station.module(idx))
            .map(|module| module.id().clone());
        debug!(
            target: LOG_TARGET_SESSION,
            "resolved {} on {:?}",
            card.id,
            target_id.as_ref().map(ModuleId::as_str)
        );
        self.events.push(EventKind::CardResolved {
            card: card.id.clone(),
            target: target_id,
        });
        if self.check_win() {
            return;
        }
        self.evaluate_crisis(false);
    }

    /// Returns true when the evaluation ended the game.
    fn evaluate_crisis(&mut self, turn_elapsed: bool) -> bool {
        let mut ctx = CrisisContext {
            station: &mut self.station,
            resources: &mut self.resources,
            events: &mut self.events,
            cfg: &self.cfg,
        };
        match self.crisis.evaluate(&mut ctx, turn_elapsed) {
            Some(system) => self.finish(GameOutcome::Lost { system }),
            None => false,
        }
    }

    fn check_win(&mut self) -> bool {
        if self.resources.signal() >= self.cfg.signal_goal {
            return self.finish(GameOutcome::Won);
        }
        self.is_over()
    }

    fn finish(&mut self, outcome: GameOutcome) -> bool {
        if self.outcome.settle(outcome) {
            if let Some(pending) = self.targeting.cancel() {
                self.events
                    .push(EventKind::TargetingCancelled { card: pending });
            }
            info!(
                target: LOG_TARGET_SESSION,
                "game ended on day {}: {}",
                self.day.day(),
                self.outcome
            );
            self.events.push(EventKind::GameEnded {
                outcome: self.outcome,
            });
        }
        self.is_over()
    }
}

fn warn_unreachable_targets(catalog: &CardCatalog, station: &Station) {
    for card in catalog.cards() {
        if let TargetRule::SpecificType { module_type } = card.target_rule
            && card.touches_modules()
            && !station
                .modules()
                .iter()
                .any(|module| module.module_type() == module_type)
        {
            warn!(
                target: LOG_TARGET_SESSION,
                "card {} targets {module_type} but the station has none",
                card.id
            );
        }
    }
}
