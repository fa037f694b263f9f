pub mod leader;
pub mod settings;

pub use leader::{HealthReport, LeaderAgent, LeaderConfig, RunResult, RunState};
pub use settings::{ClassifierKind, Settings};
