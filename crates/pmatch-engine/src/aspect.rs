//! Core/Secondary factor aggregation for one aspect.

use crate::types::CriterionRow;
use crate::weights::{CORE_FACTOR_SHARE, SECONDARY_FACTOR_SHARE};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectFactors {
    pub core_factor: Option<f64>,
    pub secondary_factor: Option<f64>,
    pub score: f64,
}

/// Average the weight scores of an aspect's rows into its two factors and
/// combine them.
///
/// - Both partitions present: `0.60 * core + 0.40 * secondary`.
/// - No secondary rows: the secondary factor counts as equal to the core
///   factor, so the score is the core factor.
/// - No core rows: the score is the secondary factor. Callers flag this as a
///   configuration issue.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn aggregate_aspect(rows: &[CriterionRow]) -> Option<AspectFactors> {
    let core_factor = mean(rows.iter().filter(|r| r.is_core).map(|r| r.weight_score));
    let secondary_factor = mean(rows.iter().filter(|r| !r.is_core).map(|r| r.weight_score));

    let score = match (core_factor, secondary_factor) {
        (Some(core), Some(secondary)) => {
            CORE_FACTOR_SHARE * core + SECONDARY_FACTOR_SHARE * secondary
        }
        (Some(core), None) => core,
        (None, Some(secondary)) => secondary,
        (None, None) => return None,
    };

    Some(AspectFactors {
        core_factor,
        secondary_factor,
        score,
    })
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0_f64, 0_u32), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / f64::from(count))
}
