use serde::{Deserialize, Serialize};

/// Which candidates a run should score for a role.
#[derive(Debug, Clone, Default)]
pub struct CalculationRequest {
    pub role_id: i64,
    /// Empty means every candidate holding at least one value against a
    /// criterion the role targets.
    pub candidate_ids: Vec<i64>,
}

impl CalculationRequest {
    #[must_use]
    pub fn for_role(role_id: i64) -> Self {
        Self {
            role_id,
            candidate_ids: Vec::new(),
        }
    }
}

/// Tunables that do not change the scoring formulas.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Allowed deviation of the aspect percentage sum from 100 before the run
    /// is flagged.
    pub weight_sum_tolerance: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            weight_sum_tolerance: 0.01,
        }
    }
}

/// One scored criterion inside an aspect breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionRow {
    pub criterion_id: i64,
    pub code: String,
    pub name: String,
    pub target_value: f64,
    pub actual_value: f64,
    pub gap: f64,
    pub weight_score: f64,
    pub is_core: bool,
}

/// Per-aspect part of a result, rendered by the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectBreakdown {
    pub aspect_id: i64,
    pub aspect_name: String,
    pub weight_percent: f64,
    /// `None` when the aspect has no core criteria for this role.
    pub core_factor: Option<f64>,
    /// `None` when the aspect has no secondary criteria for this role.
    pub secondary_factor: Option<f64>,
    pub score: f64,
    pub criteria: Vec<CriterionRow>,
}

/// Score and rank of one candidate for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub candidate_id: i64,
    pub role_id: i64,
    pub total_score: f64,
    /// 1-based position in the run's ordering; 1 is the best match.
    pub rank: u32,
    pub details: Vec<AspectBreakdown>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// A candidate was left out of the ranked results.
    Exclusion,
    /// Results were produced but their meaning is compromised.
    Warning,
}

/// A non-fatal condition observed during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunIssue {
    /// The candidate lacks a value for a criterion the role targets and was excluded.
    MissingActualValue {
        candidate_id: i64,
        criterion_id: i64,
        criterion_code: String,
    },
    /// A requested or referenced candidate has no candidate record and was skipped.
    UnknownCandidate { candidate_id: i64 },
    /// The aspect has no criteria targeted by the role and contributes nothing.
    AspectWithoutCriteria { aspect_id: i64, aspect_name: String },
    /// The aspect has no core criteria; its score is the secondary factor alone.
    EmptyCorePartition { aspect_id: i64, aspect_name: String },
    /// Aspect percentages do not add up to 100; totals are not on a 0–5 scale.
    AspectWeightSum { total_percent: f64 },
}

impl RunIssue {
    #[must_use]
    pub fn severity(&self) -> IssueSeverity {
        match self {
            RunIssue::MissingActualValue { .. } | RunIssue::UnknownCandidate { .. } => {
                IssueSeverity::Exclusion
            }
            RunIssue::AspectWithoutCriteria { .. }
            | RunIssue::EmptyCorePartition { .. }
            | RunIssue::AspectWeightSum { .. } => IssueSeverity::Warning,
        }
    }
}

impl std::fmt::Display for RunIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunIssue::MissingActualValue {
                candidate_id,
                criterion_code,
                ..
            } => write!(
                f,
                "candidate {candidate_id} excluded: no value for criterion '{criterion_code}'"
            ),
            RunIssue::UnknownCandidate { candidate_id } => {
                write!(f, "candidate {candidate_id} skipped: no candidate record")
            }
            RunIssue::AspectWithoutCriteria { aspect_name, .. } => {
                write!(f, "aspect '{aspect_name}' has no criteria targeted by this role")
            }
            RunIssue::EmptyCorePartition { aspect_name, .. } => {
                write!(f, "aspect '{aspect_name}' has no core criteria")
            }
            RunIssue::AspectWeightSum { total_percent } => {
                write!(f, "aspect percentages sum to {total_percent}, not 100")
            }
        }
    }
}

/// Output of one calculation run for a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRun {
    pub role_id: i64,
    /// Ranked results, best match first.
    pub results: Vec<MatchResult>,
    pub issues: Vec<RunIssue>,
}

impl CalculationRun {
    /// Issues that compromise the meaning of the produced scores.
    pub fn warnings(&self) -> impl Iterator<Item = &RunIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == IssueSeverity::Warning)
    }

    /// Candidate ids left out of the ranking, ascending and deduplicated.
    #[must_use]
    pub fn excluded_candidates(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .issues
            .iter()
            .filter_map(|issue| match issue {
                RunIssue::MissingActualValue { candidate_id, .. }
                | RunIssue::UnknownCandidate { candidate_id } => Some(*candidate_id),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// `true` when the run produced no issues of any kind.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_severity_partitions_kinds() {
        let missing = RunIssue::MissingActualValue {
            candidate_id: 2,
            criterion_id: 11,
            criterion_code: "K2".to_string(),
        };
        let sum = RunIssue::AspectWeightSum {
            total_percent: 90.0,
        };
        assert_eq!(missing.severity(), IssueSeverity::Exclusion);
        assert_eq!(sum.severity(), IssueSeverity::Warning);
    }

    #[test]
    fn issue_serializes_with_kind_tag() {
        let issue = RunIssue::EmptyCorePartition {
            aspect_id: 3,
            aspect_name: "Pengalaman".to_string(),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "empty_core_partition");
        assert_eq!(json["aspect_id"], 3);
    }

    #[test]
    fn excluded_candidates_are_deduplicated() {
        let run = CalculationRun {
            role_id: 1,
            results: vec![],
            issues: vec![
                RunIssue::MissingActualValue {
                    candidate_id: 7,
                    criterion_id: 1,
                    criterion_code: "K1".to_string(),
                },
                RunIssue::MissingActualValue {
                    candidate_id: 7,
                    criterion_id: 2,
                    criterion_code: "K2".to_string(),
                },
                RunIssue::UnknownCandidate { candidate_id: 3 },
                RunIssue::AspectWeightSum {
                    total_percent: 80.0,
                },
            ],
        };
        assert_eq!(run.excluded_candidates(), vec![3, 7]);
        assert_eq!(run.warnings().count(), 1);
        assert!(!run.is_clean());
    }

    #[test]
    fn missing_value_display_names_candidate_and_criterion() {
        let issue = RunIssue::MissingActualValue {
            candidate_id: 2,
            criterion_id: 11,
            criterion_code: "K2".to_string(),
        };
        assert_eq!(
            issue.to_string(),
            "candidate 2 excluded: no value for criterion 'K2'"
        );
    }
}
