use anyhow::{Result, ensure};
use std::collections::HashSet;

use crate::logic::simulation::RunStatus;
use crate::logic::{GameTester, GameplayStrategy, SimulationPlan, SimulationSummary};
use station_game::{EventKind, GameConfig, GameOutcome, SystemType};

/// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

struct CatalogEntry {
    key: &'static str,
    description: &'static str,
    build: fn() -> TestScenario,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        key: "smoke",
        description: "Short Repairer run checking core invariants",
        build: smoke,
    },
    CatalogEntry {
        key: "deterministic-replay",
        description: "Same seed and policy replays the identical event stream",
        build: deterministic_replay,
    },
    CatalogEntry {
        key: "policy-random",
        description: "Random play for up to 60 days",
        build: policy_random,
    },
    CatalogEntry {
        key: "policy-repairer",
        description: "Repair-first play for up to 60 days",
        build: policy_repairer,
    },
    CatalogEntry {
        key: "policy-signal-rush",
        description: "Signal-first play for up to 60 days",
        build: policy_signal_rush,
    },
    CatalogEntry {
        key: "crisis-pressure",
        description: "High event rate; crisis notifications stay well formed",
        build: crisis_pressure,
    },
    CatalogEntry {
        key: "win-condition",
        description: "Low signal goal; reaching it always ends the game",
        build: win_condition,
    },
];

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG
        .iter()
        .map(|entry| (entry.key, entry.description))
        .collect()
}

#[must_use]
pub fn scenario_keys() -> Vec<&'static str> {
    CATALOG.iter().map(|entry| entry.key).collect()
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    CATALOG
        .iter()
        .find(|entry| entry.key == key)
        .map(|entry| (entry.build)())
}

fn invariant_plan(strategy: GameplayStrategy) -> SimulationPlan {
    SimulationPlan::new(strategy)
        .with_expectation(no_rejected_requests)
        .with_expectation(stops_within_caps)
        .with_expectation(input_unlocked_at_rest)
        .with_expectation(event_ids_are_ordered)
        .with_expectation(aggregates_match_modules)
        .with_expectation(resources_in_bounds)
        .with_expectation(single_terminal_event)
}

fn smoke() -> TestScenario {
    TestScenario::simulation(
        "Smoke",
        invariant_plan(GameplayStrategy::Repairer).with_max_days(5),
    )
}

fn deterministic_replay() -> TestScenario {
    let replay = SimulationPlan::new(GameplayStrategy::Random).with_max_days(30);
    let plan = invariant_plan(GameplayStrategy::Random)
        .with_max_days(30)
        .with_expectation(move |summary: &SimulationSummary| replay_matches(&replay, summary));
    TestScenario::simulation("Deterministic Replay", plan)
}

fn policy_random() -> TestScenario {
    TestScenario::simulation("Random Policy", invariant_plan(GameplayStrategy::Random))
}

fn policy_repairer() -> TestScenario {
    TestScenario::simulation(
        "Repairer Policy",
        invariant_plan(GameplayStrategy::Repairer),
    )
}

fn policy_signal_rush() -> TestScenario {
    TestScenario::simulation(
        "Signal Rush Policy",
        invariant_plan(GameplayStrategy::SignalRush),
    )
}

fn crisis_pressure() -> TestScenario {
    let plan = invariant_plan(GameplayStrategy::SignalRush)
        .with_max_days(30)
        .with_setup(hostile_station)
        .with_expectation(crisis_events_are_well_formed)
        .with_expectation(events_were_resolved);
    TestScenario::simulation("Crisis Pressure", plan)
}

fn win_condition() -> TestScenario {
    let plan = invariant_plan(GameplayStrategy::SignalRush)
        .with_setup(short_goal)
        .with_expectation(goal_reached_means_game_over);
    TestScenario::simulation("Win Condition", plan)
}

fn hostile_station(cfg: &mut GameConfig) {
    cfg.base_event_chance = 0.7;
    cfg.event_chance_increase_per_day = 0.05;
    cfg.max_event_chance = 0.95;
}

fn short_goal(cfg: &mut GameConfig) {
    cfg.signal_goal = 3;
}

fn no_rejected_requests(summary: &SimulationSummary) -> Result<()> {
    if let Some(first) = summary.rejections.first() {
        anyhow::bail!(
            "{} requests rejected, first: {first}",
            summary.rejections.len()
        );
    }
    Ok(())
}

fn stops_within_caps(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.status != RunStatus::Halted,
        "policy stopped making progress after {} requests",
        summary.requests
    );
    if summary.status == RunStatus::Stalled {
        ensure!(
            summary.days > summary.max_days,
            "stalled on day {} before the {}-day cap",
            summary.days,
            summary.max_days
        );
    }
    Ok(())
}

fn input_unlocked_at_rest(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        !summary.final_session.is_busy(),
        "input still locked after the last presentation step"
    );
    Ok(())
}

fn event_ids_are_ordered(summary: &SimulationSummary) -> Result<()> {
    for pair in summary.events.windows(2) {
        let (a, b) = (pair[0].id, pair[1].id);
        if a.day == b.day {
            ensure!(b.seq == a.seq + 1, "event ids skipped: {a:?} -> {b:?}");
        } else {
            ensure!(
                b.day > a.day && b.seq == 0,
                "event ids out of order: {a:?} -> {b:?}"
            );
        }
    }
    Ok(())
}

fn aggregates_match_modules(summary: &SimulationSummary) -> Result<()> {
    let station = summary.final_session.station();
    for module in station.modules() {
        ensure!(
            (0..=module.max_health()).contains(&module.health()),
            "module {} health {} outside 0..={}",
            module.id(),
            module.health(),
            module.max_health()
        );
    }
    for aggregate in station.aggregates() {
        let sum: i32 = aggregate
            .members()
            .iter()
            .filter_map(|idx| station.module(*idx))
            .map(|module| module.health().max(0))
            .sum();
        ensure!(
            aggregate.current_hp() == sum,
            "{} aggregate reports {} but members sum to {sum}",
            aggregate.system(),
            aggregate.current_hp()
        );
        ensure!(
            aggregate.is_dead() == (sum <= 0),
            "{} dead flag disagrees with health {sum}",
            aggregate.system()
        );
    }
    Ok(())
}

fn resources_in_bounds(summary: &SimulationSummary) -> Result<()> {
    let resources = summary.final_session.resources();
    for (label, value) in [
        ("signal", resources.signal()),
        ("oxygen", resources.oxygen()),
        ("power", resources.power()),
        ("hull", resources.hull()),
    ] {
        ensure!((0..=99).contains(&value), "{label} {value} outside 0..=99");
    }
    Ok(())
}

fn single_terminal_event(summary: &SimulationSummary) -> Result<()> {
    let endings: Vec<GameOutcome> = summary
        .events
        .iter()
        .filter_map(|event| match event.kind {
            EventKind::GameEnded { outcome } => Some(outcome),
            _ => None,
        })
        .collect();
    if summary.game_ended() {
        ensure!(
            endings == vec![summary.outcome],
            "expected one GameEnded({}), saw {endings:?}",
            summary.outcome
        );
    } else {
        ensure!(endings.is_empty(), "unfinished game emitted {endings:?}");
    }
    Ok(())
}

fn replay_matches(replay: &SimulationPlan, summary: &SimulationSummary) -> Result<()> {
    let again = GameTester::try_new(false)?.run_plan(replay, summary.seed)?;
    ensure!(
        again.events.len() == summary.events.len(),
        "replay emitted {} events, original {}",
        again.events.len(),
        summary.events.len()
    );
    if let Some(idx) = again
        .events
        .iter()
        .zip(&summary.events)
        .position(|(a, b)| a != b)
    {
        anyhow::bail!("replay diverged at event {idx}");
    }
    ensure!(again.outcome == summary.outcome, "replay outcome differs");
    ensure!(
        again.final_session.rng_draws() == summary.final_session.rng_draws(),
        "replay consumed a different number of random draws"
    );
    Ok(())
}

fn crisis_events_are_well_formed(summary: &SimulationSummary) -> Result<()> {
    let mut armed: HashSet<SystemType> = HashSet::new();
    for event in &summary.events {
        match event.kind {
            EventKind::CrisisEntered { system, .. } => {
                ensure!(armed.insert(system), "{system} crisis entered twice");
            }
            EventKind::CrisisTicked { system, .. } => {
                ensure!(armed.contains(&system), "{system} ticked while not armed");
            }
            EventKind::CrisisCleared { system } => {
                ensure!(armed.remove(&system), "{system} cleared while not armed");
            }
            EventKind::GameEnded {
                outcome: GameOutcome::Lost { system },
            } => {
                ensure!(armed.contains(&system), "lost to {system} without a crisis");
            }
            _ => {}
        }
    }
    let expected = summary.final_session.armed_systems();
    let mut still_armed: Vec<SystemType> = armed.into_iter().collect();
    still_armed.sort_unstable();
    ensure!(
        still_armed == expected,
        "notifications leave {still_armed:?} armed, session reports {expected:?}"
    );
    Ok(())
}

fn events_were_resolved(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.stats.turns == 0 || summary.stats.events_resolved > 0,
        "{} turns without a single event card",
        summary.stats.turns
    );
    Ok(())
}

fn goal_reached_means_game_over(summary: &SimulationSummary) -> Result<()> {
    let goal = summary.final_session.config().signal_goal;
    let signal = summary.final_session.resources().signal();
    if signal >= goal {
        ensure!(
            summary.outcome.is_over(),
            "signal {signal} reached goal {goal} but the game continued"
        );
    }
    if summary.outcome == GameOutcome::Won {
        ensure!(signal >= goal, "won with signal {signal} below goal {goal}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_keys_are_unique_and_resolvable() {
        let keys = scenario_keys();
        let unique: HashSet<&str> = keys.iter().copied().collect();
        assert_eq!(unique.len(), keys.len());
        for key in keys {
            assert!(get_scenario(key).is_some(), "{key} does not build");
        }
        assert!(get_scenario("nope").is_none());
    }

    #[test]
    fn smoke_plan_passes_its_own_expectations() {
        let scenario = get_scenario("smoke").unwrap();
        let summary = GameTester::try_new(false)
            .unwrap()
            .run_plan(&scenario.plan, 1337)
            .unwrap();
        for expectation in &scenario.plan.expectations {
            expectation.evaluate(&summary).unwrap();
        }
    }

    #[test]
    fn replay_expectation_holds_for_a_seed() {
        let scenario = get_scenario("deterministic-replay").unwrap();
        let summary = GameTester::try_new(false)
            .unwrap()
            .run_plan(&scenario.plan, 9)
            .unwrap();
        for expectation in &scenario.plan.expectations {
            expectation.evaluate(&summary).unwrap();
        }
    }

    #[test]
    fn hostile_setup_raises_event_chance() {
        let mut cfg = GameConfig::default();
        hostile_station(&mut cfg);
        assert!(cfg.validate().is_ok());
        assert!(cfg.base_event_chance > GameConfig::default().base_event_chance);
    }
}
