//! Centralized balance and tuning constants for the station rule engine.
//!
//! Default values for [`crate::config::GameConfig`] live here so that the
//! baseline tuning is reviewed in version control; data assets may override
//! any of them through the config JSON.

// Log targets ---------------------------------------------------------------
pub(crate) const LOG_TARGET_DECK: &str = "station_game::deck";
pub(crate) const LOG_TARGET_CRISIS: &str = "station_game::crisis";
pub(crate) const LOG_TARGET_SESSION: &str = "station_game::session";

// Resources -----------------------------------------------------------------
/// Upper bound for every shared resource counter.
pub const RESOURCE_MAX: i32 = 99;
/// Lower bound for every shared resource counter.
pub const RESOURCE_MIN: i32 = 0;
pub(crate) const DEFAULT_STARTING_SIGNAL: i32 = 0;
pub(crate) const DEFAULT_STARTING_OXYGEN: i32 = 60;
pub(crate) const DEFAULT_STARTING_POWER: i32 = 60;
pub(crate) const DEFAULT_STARTING_HULL: i32 = 60;

// Win condition -------------------------------------------------------------
pub(crate) const DEFAULT_SIGNAL_GOAL: i32 = 10;

// Day progression -----------------------------------------------------------
pub(crate) const DEFAULT_STARTING_DRAWS: u32 = 10;
pub(crate) const DEFAULT_DRAWS_INCREASE_PER_DAY: u32 = 1;
pub(crate) const DEFAULT_BASE_EVENT_CHANCE: f32 = 0.35;
pub(crate) const DEFAULT_EVENT_CHANCE_INCREASE_PER_DAY: f32 = 0.02;
pub(crate) const DEFAULT_MAX_EVENT_CHANCE: f32 = 0.85;

// Hand ----------------------------------------------------------------------
pub(crate) const DEFAULT_MAX_HAND_SIZE: usize = 5;

// Crisis tuning -------------------------------------------------------------
pub(crate) const DEFAULT_LIFE_SUPPORT_TURNS: u32 = 2;
pub(crate) const DEFAULT_BUILDING_INTEGRITY_TURNS: u32 = 3;
pub(crate) const DEFAULT_BLACKOUT_DAMAGE: i32 = 1;
pub(crate) const DEFAULT_DEFENSE_EVENT_PENALTY: f32 = 0.15;

// Module defaults -----------------------------------------------------------
pub(crate) const DEFAULT_MODULE_MAX_HEALTH: i32 = 5;

// Deck ----------------------------------------------------------------------
pub(crate) const DEFAULT_DRAW_WEIGHT: f32 = 1.0;
pub(crate) const EVENT_POOL_ID: &str = "station.deck.event";
pub(crate) const ACTION_POOL_ID: &str = "station.deck.action";
