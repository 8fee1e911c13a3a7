//! Fixed Profile Matching constants: the gap-to-weight table and the
//! Core/Secondary split.

use crate::ranking::round_score;

/// Share of an aspect score taken from the Core Factor.
pub const CORE_FACTOR_SHARE: f64 = 0.60;

/// Share of an aspect score taken from the Secondary Factor.
pub const SECONDARY_FACTOR_SHARE: f64 = 0.40;

/// Gap-to-weight table, ordered by gap.
///
/// Asymmetric: a shortfall scores half a step higher than a
/// surplus of the same size. The table has no `+5` row; any gap above `+4`
/// or below `-5` takes the weight of the outermost row on its side.
pub const GAP_WEIGHTS: &[(i32, f64)] = &[
    (-5, 1.0),
    (-4, 1.5),
    (-3, 2.5),
    (-2, 3.5),
    (-1, 4.5),
    (0, 5.0),
    (1, 4.0),
    (2, 3.0),
    (3, 2.0),
    (4, 1.0),
];

const MIN_TABULATED_GAP: i32 = -5;
const MAX_TABULATED_GAP: i32 = 4;

/// Map a gap onto the weight table.
///
/// Fractional gaps are rounded to the nearest whole step (half away from
/// zero) after dropping floating-point noise below six decimals, so a gap
/// of `2.3 - 1.8` steps like `0.5`. Gaps outside the table, infinite ones
/// included, clamp to its edge on the same side.
#[must_use]
pub fn weight_for_gap(gap: f64) -> f64 {
    let step = round_score(gap)
        .round()
        .clamp(f64::from(MIN_TABULATED_GAP), f64::from(MAX_TABULATED_GAP));
    // In range after the clamp above.
    #[allow(clippy::cast_possible_truncation)]
    let step = step as i32;

    GAP_WEIGHTS
        .iter()
        .find(|(g, _)| *g == step)
        .map_or(1.0, |(_, w)| *w)
}
