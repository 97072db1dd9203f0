pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use policy::GameplayStrategy;
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use simulation::{GameTester, SimulationPlan, SimulationSummary, TesterAssets};
pub use tester::*;
