use thiserror::Error;

/// Conditions that make a whole calculation run meaningless.
///
/// Per-candidate data gaps and configuration smells are not errors; they are
/// reported as [`crate::RunIssue`]s on an otherwise successful run.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("requested role {requested} but the dataset was loaded for role {loaded}")]
    RoleMismatch { requested: i64, loaded: i64 },

    #[error("role {0} has no target profile")]
    NoTargets(i64),

    #[error("target for role {role_id} references unknown criterion {criterion_id}")]
    UnknownCriterion { role_id: i64, criterion_id: i64 },

    #[error("criterion '{code}' references unknown aspect {aspect_id}")]
    UnknownAspect { code: String, aspect_id: i64 },

    #[error("role {role_id} has more than one target for criterion {criterion_id}")]
    DuplicateTarget { role_id: i64, criterion_id: i64 },

    #[error("candidate {candidate_id} has more than one value for criterion {criterion_id}")]
    DuplicateValue {
        candidate_id: i64,
        criterion_id: i64,
    },

    #[error("target for criterion {criterion_id} is not a finite number")]
    NonFiniteTarget { criterion_id: i64 },

    #[error("value of candidate {candidate_id} for criterion {criterion_id} is not a finite number")]
    NonFiniteValue {
        candidate_id: i64,
        criterion_id: i64,
    },
}
