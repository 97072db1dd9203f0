//! Day bookkeeping: draw budget and event-chance scaling.
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::numbers::{clamp_unit, u32_to_f32};

/// Draws allowed on `day` (1-based).
#[must_use]
pub fn max_draws_for_day(cfg: &GameConfig, day: u32) -> u32 {
    let elapsed = day.saturating_sub(1);
    cfg.starting_draws
        .saturating_add(elapsed.saturating_mul(cfg.draws_increase_per_day))
}

/// Base probability of drawing from the Event pool on `day`, before crisis penalties.
#[must_use]
pub fn event_chance_for_day(cfg: &GameConfig, day: u32) -> f32 {
    let elapsed = u32_to_f32(day.saturating_sub(1));
    let scaled = cfg.base_event_chance + elapsed * cfg.event_chance_increase_per_day;
    clamp_unit(scaled.min(cfg.max_event_chance))
}

/// Current day and its draw budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayState {
    day: u32,
    draws_used: u32,
    draws_allowed: u32,
    event_chance: f32,
}

impl DayState {
    /// Day one with budget and chance computed from `cfg`.
    #[must_use]
    pub fn first(cfg: &GameConfig) -> Self {
        Self::for_day(cfg, 1)
    }

    fn for_day(cfg: &GameConfig, day: u32) -> Self {
        Self {
            day,
            draws_used: 0,
            draws_allowed: max_draws_for_day(cfg, day),
            event_chance: event_chance_for_day(cfg, day),
        }
    }

    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    #[must_use]
    pub const fn draws_used(&self) -> u32 {
        self.draws_used
    }

    #[must_use]
    pub const fn draws_allowed(&self) -> u32 {
        self.draws_allowed
    }

    #[must_use]
    pub const fn draws_remaining(&self) -> u32 {
        self.draws_allowed.saturating_sub(self.draws_used)
    }

    #[must_use]
    pub const fn event_chance(&self) -> f32 {
        self.event_chance
    }

    #[must_use]
    pub const fn budget_exhausted(&self) -> bool {
        self.draws_used >= self.draws_allowed
    }

    /// Count one successful draw against today's budget.
    pub const fn record_draw(&mut self) {
        self.draws_used = self.draws_used.saturating_add(1);
    }

    /// Move to the next day and recompute the budget.
    pub fn advance(&mut self, cfg: &GameConfig) {
        *self = Self::for_day(cfg, self.day.saturating_add(1));
    }
}
