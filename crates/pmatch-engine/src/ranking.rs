//! Total score and rank assignment across the candidates of one run.

use crate::types::MatchResult;

/// Decimal places kept on total scores.
const SCORE_DECIMALS: i32 = 6;

/// Percentage-weighted sum of `(aspect_score, weight_percent)` pairs, rounded
/// to six decimals.
///
/// Percentages are used as given; if they do not add up to 100 the total is
/// off-scale and the run flags it.
#[must_use]
pub fn total_score<I>(aspects: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let raw: f64 = aspects
        .into_iter()
        .map(|(score, weight_percent)| score * weight_percent / 100.0)
        .sum();
    round_score(raw)
}

/// Round to the fixed number of decimals carried by total scores.
///
/// Totals that differ only by floating-point noise compare equal afterwards,
/// so they fall through to the candidate-id tie-break.
#[must_use]
pub fn round_score(score: f64) -> f64 {
    let scale = 10_f64.powi(SCORE_DECIMALS);
    (score * scale).round() / scale
}

/// Sort results best-first and number them from 1.
///
/// Ordering is total score descending, then candidate id ascending, so ties
/// never depend on input order.
pub fn assign_ranks(results: &mut [MatchResult]) {
    results.sort_by(|a, b| {
        b.total_score
            .total_cmp(&a.total_score)
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });

    for (position, result) in results.iter_mut().enumerate() {
        result.rank = u32::try_from(position + 1).unwrap_or(u32::MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(candidate_id: i64, total_score: f64) -> MatchResult {
        MatchResult {
            candidate_id,
            role_id: 1,
            total_score,
            rank: 0,
            details: vec![],
        }
    }

    #[test]
    fn total_uses_percentages_as_given() {
        let total = total_score([(4.0, 40.0), (3.0, 35.0), (5.0, 25.0)]);
        assert!((total - (1.6 + 1.05 + 1.25)).abs() < 1e-9, "got {total}");
    }

    #[test]
    fn total_is_not_normalized_when_percentages_fall_short() {
        let total = total_score([(5.0, 50.0)]);
        assert!((total - 2.5).abs() < 1e-9, "got {total}");
    }

    #[test]
    fn single_full_weight_aspect_total_equals_aspect_score() {
        let total = total_score([(4.6, 100.0)]);
        assert!((total - 4.6).abs() < 1e-9, "got {total}");
    }

    #[test]
    fn ranks_descending_by_total() {
        let mut results = vec![result(1, 3.1), result(2, 4.2), result(3, 2.0)];
        assign_ranks(&mut results);
        let order: Vec<(i64, u32)> = results.iter().map(|r| (r.candidate_id, r.rank)).collect();
        assert_eq!(order, vec![(2, 1), (1, 2), (3, 3)]);
    }

    #[test]
    fn ties_break_by_candidate_id_regardless_of_input_order() {
        let mut forward = vec![result(5, 3.0), result(2, 3.0), result(9, 3.0)];
        let mut backward = vec![result(9, 3.0), result(2, 3.0), result(5, 3.0)];
        assign_ranks(&mut forward);
        assign_ranks(&mut backward);
        assert_eq!(forward, backward);
        let ids: Vec<i64> = forward.iter().map(|r| r.candidate_id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn floating_noise_does_not_split_ties() {
        let a = total_score([(0.1 + 0.2, 100.0)]);
        let b = total_score([(0.3, 100.0)]);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn ranks_are_monotonic_in_total() {
        let mut results: Vec<MatchResult> = [2.6, 4.6, 1.0, 4.6, 3.9, 0.0]
            .iter()
            .enumerate()
            .map(|(i, s)| result(i64::try_from(i).unwrap(), *s))
            .collect();
        assign_ranks(&mut results);
        for a in &results {
            for b in &results {
                if a.total_score > b.total_score {
                    assert!(a.rank < b.rank, "{a:?} should outrank {b:?}");
                }
            }
        }
    }
}
