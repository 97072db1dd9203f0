//! Externally authored game data: card catalog and station layout.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::constants::{DEFAULT_DRAW_WEIGHT, DEFAULT_MODULE_MAX_HEALTH};
use crate::module::{ModuleId, ModuleType, StationModule};
use crate::resources::ResourceDeltas;
use crate::station::SystemType;

/// Stable identifier for a card definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Whether a card resolves on draw or waits in the hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Event,
    Action,
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event => write!(f, "event"),
            Self::Action => write!(f, "action"),
        }
    }
}

/// Which modules a card may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum TargetRule {
    /// Wildcard.
    #[default]
    AnyModule,
    /// Must match `module_type`.
    SpecificType { module_type: ModuleType },
}

impl TargetRule {
    /// Whether a module of `module_type` satisfies this rule.
    #[must_use]
    pub fn accepts(self, module_type: ModuleType) -> bool {
        match self {
            Self::AnyModule => true,
            Self::SpecificType {
                module_type: required,
            } => required == module_type,
        }
    }
}

/// Immutable card definition loaded from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: CardId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: CardKind,
    /// 0 = never drawn, 1 = normal, 0.2 = rare.
    #[serde(default = "default_draw_weight")]
    pub draw_weight: f32,
    #[serde(default)]
    pub target_rule: TargetRule,
    #[serde(default)]
    pub requires_target: bool,
    #[serde(default)]
    pub use_random_target_if_none: bool,
    #[serde(default)]
    pub effects: ResourceDeltas,
    #[serde(default)]
    pub module_damage: i32,
    #[serde(default)]
    pub module_repair: i32,
}

fn default_draw_weight() -> f32 {
    DEFAULT_DRAW_WEIGHT
}

impl CardDefinition {
    /// Whether this card participates in weighted draws.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.draw_weight > 0.0
    }

    #[must_use]
    pub const fn touches_modules(&self) -> bool {
        self.module_damage > 0 || self.module_repair > 0
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("card id `{0}` appears more than once")]
    DuplicateId(CardId),
    #[error("card `{id}` is a {actual} card but sits in the {expected} deck")]
    KindMismatch {
        id: CardId,
        expected: CardKind,
        actual: CardKind,
    },
    #[error("card `{id}` has invalid draw weight {weight}")]
    InvalidWeight { id: CardId, weight: f32 },
}

/// Event and action decks as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CardCatalog {
    #[serde(default)]
    pub event_deck: Vec<CardDefinition>,
    #[serde(default)]
    pub action_deck: Vec<CardDefinition>,
}

impl CardCatalog {
    /// Create an empty catalog (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the catalog fails validation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    #[must_use]
    pub fn from_decks(event_deck: Vec<CardDefinition>, action_deck: Vec<CardDefinition>) -> Self {
        Self {
            event_deck,
            action_deck,
        }
    }

    /// Check id uniqueness, deck/kind agreement, and weights.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        let decks = [
            (CardKind::Event, &self.event_deck),
            (CardKind::Action, &self.action_deck),
        ];
        for (expected, deck) in decks {
            for card in deck {
                if !seen.insert(card.id.clone()) {
                    return Err(CatalogError::DuplicateId(card.id.clone()));
                }
                if card.kind != expected {
                    return Err(CatalogError::KindMismatch {
                        id: card.id.clone(),
                        expected,
                        actual: card.kind,
                    });
                }
                if !card.draw_weight.is_finite() || card.draw_weight < 0.0 {
                    return Err(CatalogError::InvalidWeight {
                        id: card.id.clone(),
                        weight: card.draw_weight,
                    });
                }
            }
        }
        Ok(())
    }

    /// Look a card up in either deck.
    #[must_use]
    pub fn get(&self, id: &CardId) -> Option<&CardDefinition> {
        self.event_deck
            .iter()
            .chain(self.action_deck.iter())
            .find(|card| &card.id == id)
    }

    pub fn cards(&self) -> impl Iterator<Item = &CardDefinition> {
        self.event_deck.iter().chain(self.action_deck.iter())
    }
}

/// One module entry in the station layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub id: ModuleId,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    #[serde(default = "default_max_health")]
    pub max_health: i32,
    /// Watched subsystem this module belongs to, if any.
    #[serde(default)]
    pub system: Option<SystemType>,
}

fn default_max_health() -> i32 {
    DEFAULT_MODULE_MAX_HEALTH
}

impl ModuleSpec {
    #[must_use]
    pub fn build(&self) -> StationModule {
        StationModule::new(self.id.clone(), self.module_type, self.max_health)
    }
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("module id `{0}` appears more than once")]
    DuplicateId(ModuleId),
    #[error("module `{id}` must have max health of at least 1 (got {max_health})")]
    InvalidMaxHealth { id: ModuleId, max_health: i32 },
    #[error("layout has no modules")]
    Empty,
}

/// Station composition and subsystem membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StationLayout {
    pub modules: Vec<ModuleSpec>,
}

impl StationLayout {
    /// Parse and validate a layout from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the layout fails validation.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let layout: Self = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Check that ids are unique and every module can hold health.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.modules.is_empty() {
            return Err(LayoutError::Empty);
        }
        let mut seen = HashSet::new();
        for spec in &self.modules {
            if !seen.insert(spec.id.clone()) {
                return Err(LayoutError::DuplicateId(spec.id.clone()));
            }
            if spec.max_health < 1 {
                return Err(LayoutError::InvalidMaxHealth {
                    id: spec.id.clone(),
                    max_health: spec.max_health,
                });
            }
        }
        Ok(())
    }
}
