use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use station_game::{
    CardCatalog, DataLoader, GameConfig, GameEngine, GameOutcome, GameSession, Rejection,
    SessionStats, SimEvent, StaticDataLoader, StationLayout,
};
use thiserror::Error;

use crate::logic::policy::{GameplayStrategy, PolicyMove, decide};

pub const DEFAULT_MAX_DAYS: u32 = 60;
const MAX_REQUESTS_PER_DAY: usize = 500;

/// Data shared by every simulated run.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    pub catalog: CardCatalog,
    pub layout: StationLayout,
    pub config: GameConfig,
}

impl TesterAssets {
    /// Load the data bundled with the game crate.
    ///
    /// # Errors
    ///
    /// Returns an error if any bundled asset fails to parse.
    pub fn load_default() -> Result<Self> {
        let loader = StaticDataLoader;
        Ok(Self {
            catalog: loader
                .load_card_catalog()
                .context("loading bundled cards")?,
            layout: loader
                .load_station_layout()
                .context("loading bundled station")?,
            config: loader.load_config().context("loading bundled config")?,
        })
    }
}

/// Serves tester assets with a per-plan configuration override.
struct PlanLoader<'a> {
    assets: &'a TesterAssets,
    config: GameConfig,
}

impl DataLoader for PlanLoader<'_> {
    type Error = Infallible;

    fn load_card_catalog(&self) -> Result<CardCatalog, Self::Error> {
        Ok(self.assets.catalog.clone())
    }

    fn load_station_layout(&self) -> Result<StationLayout, Self::Error> {
        Ok(self.assets.layout.clone())
    }

    fn load_config(&self) -> Result<GameConfig, Self::Error> {
        Ok(self.config.clone())
    }
}

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub max_days: Option<u32>,
    pub setup: Option<fn(&mut GameConfig)>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            max_days: None,
            setup: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_days(mut self, max_days: u32) -> Self {
        self.max_days = Some(max_days);
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: fn(&mut GameConfig)) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// How a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The session reached a win or a loss.
    Ended,
    /// The day cap passed with the game still running.
    Stalled,
    /// The request cap was hit, which points at a policy that cannot progress.
    Halted,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ended => f.write_str("ended"),
            Self::Stalled => f.write_str("stalled"),
            Self::Halted => f.write_str("halted"),
        }
    }
}

/// A policy request the session refused.
#[derive(Debug, Clone, Error)]
#[error("request {step} on day {day} ({action:?}) rejected: {source}")]
pub struct RejectedMove {
    pub step: usize,
    pub day: u32,
    pub action: PolicyMove,
    #[source]
    pub source: Rejection,
}

#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub day: u32,
    pub policy_name: String,
    pub action: PolicyMove,
    pub rationale: Option<String>,
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub status: RunStatus,
    pub outcome: GameOutcome,
    pub days: u32,
    pub max_days: u32,
    pub requests: usize,
    pub stats: SessionStats,
    pub events: Vec<SimEvent>,
    pub decisions: Vec<DecisionRecord>,
    pub rejections: Vec<RejectedMove>,
    pub final_session: GameSession,
}

impl SimulationSummary {
    #[must_use]
    pub const fn game_ended(&self) -> bool {
        matches!(self.status, RunStatus::Ended)
    }

    #[must_use]
    pub fn ending_message(&self) -> String {
        match self.outcome {
            GameOutcome::InProgress => format!("{} on day {}", self.status, self.days),
            GameOutcome::Won => "signal goal reached".to_string(),
            GameOutcome::Lost { .. } => self.outcome.reason().unwrap_or_default(),
        }
    }
}

/// Headless deterministic runner for the core rule engine.
#[derive(Clone)]
pub struct GameTester {
    assets: Arc<TesterAssets>,
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub fn new(assets: Arc<TesterAssets>, verbose: bool) -> Self {
        Self { assets, verbose }
    }

    /// Build a tester over the bundled assets.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled assets fail to load.
    pub fn try_new(verbose: bool) -> Result<Self> {
        Ok(Self::new(Arc::new(TesterAssets::load_default()?), verbose))
    }

    /// Play one game under `plan` from `seed`, acknowledging every
    /// presentation step as soon as it is requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan's configuration does not validate.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let mut config = self.assets.config.clone();
        if let Some(setup) = plan.setup {
            setup(&mut config);
        }
        let engine = GameEngine::new(PlanLoader {
            assets: &self.assets,
            config,
        });
        let mut session = engine.create_session(seed)?;
        let mut policy = plan.strategy.create_policy(seed);

        let max_days = plan.max_days.unwrap_or(DEFAULT_MAX_DAYS);
        let max_requests = MAX_REQUESTS_PER_DAY
            .saturating_mul(usize::try_from(max_days.max(1)).unwrap_or(usize::MAX));

        if self.verbose {
            println!(
                "🎮 Starting simulation | seed:{seed} policy:{} max days:{max_days}",
                plan.strategy.label()
            );
        }

        let mut events = session.drain_events();
        let mut decisions = Vec::new();
        let mut rejections = Vec::new();
        let mut requests = 0;
        let status = loop {
            if session.is_over() {
                break RunStatus::Ended;
            }
            if session.day().day() > max_days {
                break RunStatus::Stalled;
            }
            if requests >= max_requests {
                break RunStatus::Halted;
            }
            if session.is_busy() {
                session.notify_presentation_complete();
                events.extend(session.drain_events());
                continue;
            }

            requests += 1;
            let day = session.day().day();
            let decision = decide(policy.as_mut(), &session);
            if let Err(source) = apply_move(&mut session, &decision.action) {
                debug!("{} request rejected: {source}", policy.name());
                rejections.push(RejectedMove {
                    step: requests,
                    day,
                    action: decision.action.clone(),
                    source,
                });
            }
            decisions.push(DecisionRecord {
                day,
                policy_name: policy.name().to_string(),
                action: decision.action,
                rationale: decision.rationale,
            });
            events.extend(session.drain_events());
        };

        session.notify_presentation_complete();
        events.extend(session.drain_events());

        if self.verbose {
            let resources = session.resources();
            println!(
                "🏁 {status} after {} turns | day {} outcome {} | signal {} oxygen {} power {} hull {}",
                session.stats().turns,
                session.day().day(),
                session.outcome(),
                resources.signal(),
                resources.oxygen(),
                resources.power(),
                resources.hull()
            );
        }

        Ok(SimulationSummary {
            seed,
            strategy: plan.strategy,
            status,
            outcome: session.outcome(),
            days: session.day().day(),
            max_days,
            requests,
            stats: session.stats(),
            events,
            decisions,
            rejections,
            final_session: session,
        })
    }
}

fn apply_move(session: &mut GameSession, action: &PolicyMove) -> Result<(), Rejection> {
    match action {
        PolicyMove::Draw => session.request_draw().map(|_| ()),
        PolicyMove::Play(card) => session.play_action_card(card).map(|_| ()),
        PolicyMove::Target(module) => session.select_target(module),
        PolicyMove::CancelTargeting => session.cancel_targeting(),
        PolicyMove::ReplaceOverflow(index) => session.choose_overflow_replacement(*index),
        PolicyMove::DiscardOverflow => session.discard_overflow(),
    }
}
