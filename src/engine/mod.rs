//! Plan/apply engine
//!
//! The engine orchestrates:
//! 1. Planning - Compare the manifest with recorded state
//! 2. Diffing - Show what changes, attribute by attribute
//! 3. Executing - Apply changes in dependency phases with parallelism
//! 4. Refreshing - Read recorded instances back and report drift

pub mod differ;
pub mod executor;
pub mod planner;
pub mod refresh;

pub use executor::{ExecuteOptions, ExecuteSummary, execute, print_summary};
pub use planner::{Action, ExecutionPlan, plan, plan_destroy};
pub use refresh::{Drift, display_drift, refresh_state};
