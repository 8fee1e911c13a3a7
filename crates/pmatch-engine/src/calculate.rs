//! Calculation run orchestration.

use std::collections::BTreeSet;

use pmatch_core::RoleDataset;

use crate::aspect::aggregate_aspect;
use crate::error::EngineError;
use crate::gap::gap;
use crate::index::RunIndex;
use crate::ranking::{assign_ranks, total_score};
use crate::types::{
    AspectBreakdown, CalculationRequest, CalculationRun, CriterionRow, EngineOptions,
    MatchResult, RunIssue,
};
use crate::weights::weight_for_gap;

/// Score and rank candidates for one role.
///
/// 1. Index targets, criteria and values; reject unusable inputs.
/// 2. Flag configuration issues (empty aspects, empty core partitions,
///    percentages not summing to 100).
/// 3. Select candidates: the requested ids, or everyone holding at least one
///    value against a targeted criterion.
/// 4. Score each candidate. A candidate missing any targeted value is
///    excluded and one issue is reported per missing criterion.
/// 5. Rank the scored candidates.
///
/// # Errors
///
/// Returns [`EngineError`] if the request does not match the dataset's role,
/// the role has no targets, or the records are inconsistent (dangling
/// references, duplicate keys, non-finite numbers).
pub fn calculate(
    dataset: &RoleDataset,
    request: &CalculationRequest,
    options: &EngineOptions,
) -> Result<CalculationRun, EngineError> {
    let role_id = dataset.role.id;
    if request.role_id != role_id {
        return Err(EngineError::RoleMismatch {
            requested: request.role_id,
            loaded: role_id,
        });
    }

    let index = RunIndex::build(dataset)?;

    let mut issues = configuration_issues(&index, options);
    for issue in &issues {
        tracing::warn!(role_id, %issue, "configuration issue");
    }

    let mut results = Vec::new();
    for candidate_id in select_candidates(&index, request, &mut issues) {
        match score_candidate(&index, role_id, candidate_id) {
            Ok(result) => {
                tracing::debug!(
                    role_id,
                    candidate_id,
                    total_score = result.total_score,
                    "candidate scored"
                );
                results.push(result);
            }
            Err(missing) => {
                for issue in &missing {
                    tracing::warn!(role_id, candidate_id, %issue, "candidate excluded");
                }
                issues.extend(missing);
            }
        }
    }

    assign_ranks(&mut results);

    tracing::info!(
        role_id,
        scored = results.len(),
        issues = issues.len(),
        "calculation run complete"
    );

    Ok(CalculationRun {
        role_id,
        results,
        issues,
    })
}

fn configuration_issues(index: &RunIndex<'_>, options: &EngineOptions) -> Vec<RunIssue> {
    let mut issues = Vec::new();

    for (aspect_id, aspect) in &index.aspects {
        match index.requirements.get(aspect_id) {
            None => issues.push(RunIssue::AspectWithoutCriteria {
                aspect_id: *aspect_id,
                aspect_name: aspect.name.clone(),
            }),
            Some(group) if !group.iter().any(|r| r.criterion.is_core) => {
                issues.push(RunIssue::EmptyCorePartition {
                    aspect_id: *aspect_id,
                    aspect_name: aspect.name.clone(),
                });
            }
            Some(_) => {}
        }
    }

    let total_percent: f64 = index.aspects.values().map(|a| a.weight_percent).sum();
    if (total_percent - 100.0).abs() > options.weight_sum_tolerance {
        issues.push(RunIssue::AspectWeightSum { total_percent });
    }

    issues
}

fn select_candidates(
    index: &RunIndex<'_>,
    request: &CalculationRequest,
    issues: &mut Vec<RunIssue>,
) -> Vec<i64> {
    let requested: BTreeSet<i64> = if request.candidate_ids.is_empty() {
        index.candidates_with_values()
    } else {
        request.candidate_ids.iter().copied().collect()
    };

    requested
        .into_iter()
        .filter(|candidate_id| {
            if index.candidates.contains_key(candidate_id) {
                true
            } else {
                tracing::warn!(candidate_id, "skipping candidate without a candidate record");
                issues.push(RunIssue::UnknownCandidate {
                    candidate_id: *candidate_id,
                });
                false
            }
        })
        .collect()
}

/// Score one candidate, or return one issue per targeted criterion the
/// candidate has no value for.
fn score_candidate(
    index: &RunIndex<'_>,
    role_id: i64,
    candidate_id: i64,
) -> Result<MatchResult, Vec<RunIssue>> {
    let mut missing = Vec::new();
    let mut details = Vec::with_capacity(index.requirements.len());

    for (aspect_id, group) in &index.requirements {
        let mut rows = Vec::with_capacity(group.len());
        for requirement in group {
            let criterion = requirement.criterion;
            let Some(actual_value) = index.value(candidate_id, criterion.id) else {
                missing.push(RunIssue::MissingActualValue {
                    candidate_id,
                    criterion_id: criterion.id,
                    criterion_code: criterion.code.clone(),
                });
                continue;
            };

            let criterion_gap = gap(requirement.target_value, actual_value);
            rows.push(CriterionRow {
                criterion_id: criterion.id,
                code: criterion.code.clone(),
                name: criterion.name.clone(),
                target_value: requirement.target_value,
                actual_value,
                gap: criterion_gap,
                weight_score: weight_for_gap(criterion_gap),
                is_core: criterion.is_core,
            });
        }

        if !missing.is_empty() {
            continue;
        }

        // Requirement groups are never empty and every row was found above.
        let Some(factors) = aggregate_aspect(&rows) else {
            continue;
        };
        let aspect = index.aspects[aspect_id];

        details.push(AspectBreakdown {
            aspect_id: *aspect_id,
            aspect_name: aspect.name.clone(),
            weight_percent: aspect.weight_percent,
            core_factor: factors.core_factor,
            secondary_factor: factors.secondary_factor,
            score: factors.score,
            criteria: rows,
        });
    }

    if !missing.is_empty() {
        return Err(missing);
    }

    let total = total_score(details.iter().map(|d| (d.score, d.weight_percent)));

    Ok(MatchResult {
        candidate_id,
        role_id,
        total_score: total,
        rank: 0,
        details,
    })
}

#[cfg(test)]
#[path = "calculate_test.rs"]
mod tests;
