//! Profile Matching scoring and ranking engine.
//!
//! For one role, compares every candidate's recorded competency values with
//! the role's targets, maps each gap onto a fixed weight table, averages the
//! weights into Core and Secondary factors per aspect, and combines aspect
//! scores by their configured percentages into a ranked total.
//!
//! The engine is a pure function of its inputs: no I/O, no shared state.
//! Fetching inputs and persisting results belong to the caller.

pub mod aspect;
pub mod calculate;
pub mod error;
pub mod gap;
pub mod ranking;
pub mod types;
pub mod weights;

mod index;

pub use aspect::{aggregate_aspect, AspectFactors};
pub use calculate::calculate;
pub use error::EngineError;
pub use gap::gap;
pub use ranking::{assign_ranks, round_score, total_score};
pub use types::{
    AspectBreakdown, CalculationRequest, CalculationRun, CriterionRow, EngineOptions,
    IssueSeverity, MatchResult, RunIssue,
};
pub use weights::{weight_for_gap, CORE_FACTOR_SHARE, GAP_WEIGHTS, SECONDARY_FACTOR_SHARE};
