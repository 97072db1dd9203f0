//! Station Crisis Game Engine
//!
//! Deterministic rule engine for a station-management card game: weighted
//! card draws, Action-card targeting, module health and subsystem aggregates,
//! multi-turn crisis countdowns, and day progression. The crate has no UI or
//! timing dependencies; a presentation layer drives a [`GameSession`] and
//! consumes the notifications it emits.

pub mod config;
pub mod constants;
pub mod crisis;
pub mod data;
pub mod day;
pub mod deck;
pub mod effects;
pub mod event;
pub mod hand;
pub mod module;
pub mod numbers;
pub mod outcome;
pub mod resources;
pub mod rng;
pub mod session;
pub mod station;
pub mod targeting;

use anyhow::Context;
use thiserror::Error;

// Re-export commonly used types
pub use config::{ConfigError, CrisisThresholds, GameConfig};
pub use crisis::{CrisisEngine, CrisisState};
pub use data::{
    CardCatalog, CardDefinition, CardId, CardKind, CatalogError, LayoutError, ModuleSpec,
    StationLayout, TargetRule,
};
pub use day::{DayState, event_chance_for_day, max_draws_for_day};
pub use deck::{DeckState, DrawOutcome, DrawTrace, DrawnCard, WeightedCandidate};
pub use event::{EventId, EventKind, EventLog, EventSeverity, SimEvent};
pub use hand::{HandState, OverflowChoice};
pub use module::{HealthChange, ModuleId, ModuleType, StationModule};
pub use outcome::GameOutcome;
pub use resources::{ResourceDeltas, ResourceKind, ResourcePool, StartingResources};
pub use rng::RngBundle;
pub use session::{DrawResult, GameSession, PlayResult, Rejection, SessionStats};
pub use station::{Station, SubsystemAggregate, SystemType};
pub use targeting::{TargetingSession, TargetingState};

/// Trait for abstracting data loading operations.
/// Platform-specific implementations should provide this.
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the card catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or fails validation.
    fn load_card_catalog(&self) -> Result<CardCatalog, Self::Error>;

    /// Load the station layout with subsystem membership.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout cannot be loaded or fails validation.
    fn load_station_layout(&self) -> Result<StationLayout, Self::Error>;

    /// Load the game configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or is out of range.
    fn load_config(&self) -> Result<GameConfig, Self::Error>;
}

/// Errors raised while reading bundled data assets.
#[derive(Debug, Error)]
pub enum DataError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

const DEFAULT_CARDS_JSON: &str = include_str!("../assets/data/cards.json");
const DEFAULT_STATION_JSON: &str = include_str!("../assets/data/station.json");
const DEFAULT_CONFIG_JSON: &str = include_str!("../assets/data/config.json");

/// Loader serving the data assets compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDataLoader;

impl DataLoader for StaticDataLoader {
    type Error = DataError;

    fn load_card_catalog(&self) -> Result<CardCatalog, Self::Error> {
        Ok(CardCatalog::from_json(DEFAULT_CARDS_JSON)?)
    }

    fn load_station_layout(&self) -> Result<StationLayout, Self::Error> {
        Ok(StationLayout::from_json(DEFAULT_STATION_JSON)?)
    }

    fn load_config(&self) -> Result<GameConfig, Self::Error> {
        Ok(GameConfig::from_json(DEFAULT_CONFIG_JSON)?)
    }
}

/// Main game engine that coordinates data loading and session creation.
pub struct GameEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
}

impl<L> GameEngine<L>
where
    L: DataLoader,
{
    /// Create a new game engine with the provided data loader.
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    /// Load and validate every input, then start a session from `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if any data source fails to load or validate.
    pub fn create_session(&self, seed: u64) -> anyhow::Result<GameSession> {
        let catalog = self
            .data_loader
            .load_card_catalog()
            .context("loading card catalog")?;
        let layout = self
            .data_loader
            .load_station_layout()
            .context("loading station layout")?;
        let cfg = self
            .data_loader
            .load_config()
            .context("loading game configuration")?;
        catalog.validate().context("validating card catalog")?;
        layout.validate().context("validating station layout")?;
        cfg.validate().context("validating game configuration")?;
        Ok(GameSession::new(catalog, &layout, cfg, seed))
    }
}

impl Default for GameEngine<StaticDataLoader> {
    fn default() -> Self {
        Self::new(StaticDataLoader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    struct FixtureLoader {
        cfg: GameConfig,
    }

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_card_catalog(&self) -> Result<CardCatalog, Self::Error> {
            Ok(CardCatalog::empty())
        }

        fn load_station_layout(&self) -> Result<StationLayout, Self::Error> {
            Ok(StationLayout {
                modules: vec![ModuleSpec {
                    id: ModuleId::new("reactor"),
                    module_type: ModuleType::Reactor,
                    max_health: 3,
                    system: Some(SystemType::Power),
                }],
            })
        }

        fn load_config(&self) -> Result<GameConfig, Self::Error> {
            Ok(self.cfg.clone())
        }
    }

    #[test]
    fn bundled_assets_load_and_validate() {
        let loader = StaticDataLoader;
        let catalog = loader.load_card_catalog().unwrap();
        assert!(!catalog.event_deck.is_empty());
        assert!(!catalog.action_deck.is_empty());
        let layout = loader.load_station_layout().unwrap();
        let station = Station::from_layout(&layout);
        for system in SystemType::ALL {
            assert!(
                station.aggregate(system).is_some(),
                "bundled station has modules for {system}"
            );
        }
        assert!(loader.load_config().unwrap().validate().is_ok());
    }

    #[test]
    fn engine_rejects_invalid_config() {
        let engine = GameEngine::new(FixtureLoader {
            cfg: GameConfig {
                max_hand_size: 0,
                ..GameConfig::default()
            },
        });
        let err = engine.create_session(1).unwrap_err();
        assert!(format!("{err:#}").contains("max_hand_size"));
    }

    #[test]
    fn engine_builds_session_from_seed() {
        let engine = GameEngine::new(FixtureLoader {
            cfg: GameConfig::default(),
        });
        let mut session = engine.create_session(9).unwrap();
        assert_eq!(session.seed(), 9);
        assert_eq!(session.day().day(), 1);
        let events = session.drain_events();
        assert!(matches!(events[0].kind, EventKind::DayChanged { day: 1, .. }));

        let default_engine = GameEngine::default();
        assert!(default_engine.create_session(9).is_ok());
    }
}
