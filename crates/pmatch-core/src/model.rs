//! Plain records handed to the engine by whoever owns storage.
//!
//! Identifiers are the `BIGSERIAL` keys used by the database layer. Targets
//! and actual values are identified by their composite keys
//! (`role_id`, `criterion_id`) and (`candidate_id`, `criterion_id`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A job role (position) that candidates are ranked against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A named group of criteria contributing `weight_percent` of the total score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aspect {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Share of the total score, on a 0–100 scale. Read as given; never normalized.
    pub weight_percent: f64,
}

/// A single competency measured as a role target and a candidate value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: i64,
    pub aspect_id: i64,
    /// Short human label, e.g. `"K1"`.
    pub code: String,
    pub name: String,
    /// `true` for Core Factor criteria, `false` for Secondary Factor.
    pub is_core: bool,
    /// Reporting multiplier. Not part of the factor averages.
    #[serde(default = "default_criterion_weight")]
    pub weight: f64,
}

fn default_criterion_weight() -> f64 {
    1.0
}

/// Required value of one criterion for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub role_id: i64,
    pub criterion_id: i64,
    pub target_value: f64,
}

/// A worker who can be ranked for a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    /// National identity number; unique business key.
    pub nik: String,
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A candidate's recorded value for one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualValue {
    pub candidate_id: i64,
    pub criterion_id: i64,
    pub value: f64,
}
