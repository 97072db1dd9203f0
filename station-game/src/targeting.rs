//! Target selection for Action cards.
use serde::{Deserialize, Serialize};

use crate::data::{CardDefinition, CardId};
use crate::module::{ModuleId, StationModule};

/// Where the targeting flow currently sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "card", rename_all = "snake_case")]
pub enum TargetingState {
    #[default]
    Idle,
    /// Waiting for a module click for this card.
    Targeting(CardId),
    /// A valid click was accepted; the card is being resolved and presented.
    Resolving(CardId),
}

/// Result of feeding a `start` request into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartTransition {
    Started,
    /// The same card was selected again and targeting was cancelled.
    Toggled,
    /// Targeting moved from `previous` to the new card.
    Switched { previous: CardId },
    /// Ignored because a resolution is in flight.
    Ignored,
}

/// Whether `module` is an acceptable target for `card`.
#[must_use]
pub fn is_valid_target(card: &CardDefinition, module: &StationModule) -> bool {
    card.target_rule.accepts(module.module_type())
}

/// Ids of every module the card may target, in registry order.
#[must_use]
pub fn valid_targets(card: &CardDefinition, modules: &[StationModule]) -> Vec<ModuleId> {
    modules
        .iter()
        .filter(|module| is_valid_target(card, module))
        .map(|module| module.id().clone())
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingSession {
    state: TargetingState,
}

impl TargetingSession {
    #[must_use]
    pub const fn state(&self) -> &TargetingState {
        &self.state
    }

    #[must_use]
    pub fn pending_card(&self) -> Option<&CardId> {
        match &self.state {
            TargetingState::Targeting(card) => Some(card),
            TargetingState::Idle | TargetingState::Resolving(_) => None,
        }
    }

    #[must_use]
    pub const fn is_resolving(&self) -> bool {
        matches!(self.state, TargetingState::Resolving(_))
    }

    /// Begin, toggle off, or switch targeting.
    pub fn start(&mut self, card: &CardId) -> StartTransition {
        match &self.state {
            TargetingState::Resolving(_) => StartTransition::Ignored,
            TargetingState::Targeting(current) if current == card => {
                self.state = TargetingState::Idle;
                StartTransition::Toggled
            }
            TargetingState::Targeting(current) => {
                let previous = current.clone();
                self.state = TargetingState::Targeting(card.clone());
                StartTransition::Switched { previous }
            }
            TargetingState::Idle => {
                self.state = TargetingState::Targeting(card.clone());
                StartTransition::Started
            }
        }
    }

    /// Drop the pending card. No-op while resolving or idle.
    pub fn cancel(&mut self) -> Option<CardId> {
        if let TargetingState::Targeting(card) = &self.state {
            let card = card.clone();
            self.state = TargetingState::Idle;
            return Some(card);
        }
        None
    }

    /// Accept a validated click: `Targeting(card) -> Resolving(card)`.
    pub fn begin_resolving(&mut self) -> Option<CardId> {
        let card = self.pending_card()?.clone();
        self.state = TargetingState::Resolving(card.clone());
        Some(card)
    }

    /// Presentation for the resolved card finished.
    pub fn finish_resolving(&mut self) {
        if self.is_resolving() {
            self.state = TargetingState::Idle;
        }
    }
}
