use crate::ranking::round_score;

/// Signed competency gap: `actual - target`, rounded to six decimals.
///
/// Zero is an exact match, positive a surplus, negative a shortfall.
#[must_use]
pub fn gap(target: f64, actual: f64) -> f64 {
    round_score(actual - target)
}
