//! Pipeline entry points for tracking runs.
//!
//! - `run_tracker`: one full run against GitHub and the configured sinks
//! - `preview_tracker`: collect and diff only, no writes
//! - `run_guarded`: top-level backstop turning errors and panics into a status

pub mod diff;
pub mod rank;
pub mod run;

pub use diff::{StarDiff, calculate_diff};
pub use rank::{RankedStargazer, RunSummary, rank_records};
pub use run::{Preview, RunReport, RunStatus, Tracker, preview_tracker, run_guarded, run_tracker};
