//! Greedy irregular binning of the pooled derivative points.
//!
//! The recession points are heavily heteroscedastic: low-flow points
//! scatter far more in log|dQ/dt| than high-flow ones. Binning by
//! variable-width discharge intervals before regression keeps the quiet
//! end from drowning out the signal. The binner is a single greedy scan
//! over the points sorted by descending log Q, maintained as an
//! explicit (bin start, candidate) state machine so each of the three
//! advancement predicates stays independently checkable.

use crate::model::{AnalysisError, Bin, BinnedPoint, DerivativePoint};

/// A candidate bin must hold at least this many points.
pub const MIN_BIN_POINTS: usize = 45;

/// A candidate bin must span at least this fraction of the total
/// log-discharge range.
pub const MIN_SPAN_FRACTION: f64 = 0.01;

/// Bin the pooled derivative points.
///
/// Points are sorted by descending log Q. The boundary list is seeded
/// with the first row; a candidate row r becomes the next boundary only
/// when the bin it would close satisfies all three predicates:
///
/// 1. its log Q span exceeds `MIN_SPAN_FRACTION` of the total range
///    (compared in magnitude — the raw range is negative),
/// 2. it holds at least `MIN_BIN_POINTS` points,
/// 3. the standard error of its two boundary recession rates stays
///    within half their mean (bin homogeneity).
///
/// A failing candidate is skipped, not advanced to; the scan ends at
/// the last-but-one row and the remaining tail forms the final bin.
pub fn bin_points(points: &[DerivativePoint]) -> Result<Vec<Bin>, AnalysisError> {
    if points.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "no derivative points to bin".to_string(),
        ));
    }

    let mut sorted: Vec<DerivativePoint> = points.to_vec();
    sorted.sort_by(|a, b| b.log_q.partial_cmp(&a.log_q).expect("log_q is never NaN"));

    let boundaries = scan_boundaries(&sorted);
    aggregate_bins(&sorted, &boundaries)
}

/// The greedy boundary scan. Returned boundaries are bin start indices,
/// strictly increasing, always beginning with 0.
fn scan_boundaries(sorted: &[DerivativePoint]) -> Vec<usize> {
    let n = sorted.len();
    let mut boundaries = vec![0usize];
    if n < 2 {
        return boundaries;
    }

    // Total range is min(log_q) − max(log_q), a negative number; the
    // span comparison works on magnitudes.
    let min_span = MIN_SPAN_FRACTION * (sorted[n - 1].log_q - sorted[0].log_q).abs();

    let mut start = 0usize;
    for candidate in 1..(n - 1) {
        let count = candidate - start;
        let span = (sorted[start].log_q - sorted[candidate].log_q).abs();

        // Boundary recession-rate magnitudes of the bin being closed.
        let d_start = -sorted[start].dq;
        let d_end = -sorted[candidate - 1].dq;
        let pair_sd = (d_start - d_end).abs() / 2.0_f64.sqrt();
        let pair_se = pair_sd / (count as f64).sqrt();
        let half_mean = 0.5 * (d_start + d_end) / 2.0;

        if span > min_span && count >= MIN_BIN_POINTS && pair_se <= half_mean {
            boundaries.push(candidate);
            start = candidate;
        }
    }

    // A trailing remainder of a single point cannot carry a spread
    // estimate; fold it into the previous bin.
    if boundaries.len() > 1 && n - boundaries[boundaries.len() - 1] < 2 {
        boundaries.pop();
    }

    boundaries
}

/// Build the bins between consecutive boundaries (the last bin runs to
/// the end of the pool) and compute both rounds of spread statistics.
fn aggregate_bins(
    sorted: &[DerivativePoint],
    boundaries: &[usize],
) -> Result<Vec<Bin>, AnalysisError> {
    let n = sorted.len();
    let mut bins = Vec::with_capacity(boundaries.len());

    for (category, window) in boundaries
        .iter()
        .copied()
        .chain(std::iter::once(n))
        .collect::<Vec<_>>()
        .windows(2)
        .enumerate()
    {
        let slice = &sorted[window[0]..window[1]];
        let count = slice.len();

        // Pre-aggregation round: per-row standard error and weight from
        // the category grouping over absolute dQ/dt.
        let abs_logs: Vec<f64> = slice.iter().map(|p| p.dq.abs().ln()).collect();
        let se_pre = sample_sd(&abs_logs) / (count as f64).sqrt();
        if se_pre <= 0.0 {
            return Err(AnalysisError::Domain(format!(
                "bin {category} has zero spread in log|dQ/dt|; weights are undefined"
            )));
        }
        let row_weight = 1.0 / se_pre.sqrt();

        let members: Vec<BinnedPoint> = slice
            .iter()
            .map(|&point| BinnedPoint {
                point,
                category,
                se_log_dq: se_pre,
                weight: row_weight,
            })
            .collect();

        // Aggregation round: the bin recomputes its spread from the
        // member log_dq values and takes the max member weight. Kept as
        // a second computation on purpose; see DESIGN.md.
        let log_dqs: Vec<f64> = slice.iter().map(|p| p.log_dq).collect();
        let se_agg = sample_sd(&log_dqs) / (count as f64).sqrt();
        let weight = members
            .iter()
            .map(|m| m.weight)
            .fold(f64::NEG_INFINITY, f64::max);

        bins.push(Bin {
            category,
            count,
            mean_dq: slice.iter().map(|p| -p.dq).sum::<f64>() / count as f64,
            mean_q: slice.iter().map(|p| p.q).sum::<f64>() / count as f64,
            mean_log_q: slice.iter().map(|p| p.log_q).sum::<f64>() / count as f64,
            mean_log_dq: log_dqs.iter().sum::<f64>() / count as f64,
            se_log_dq: se_agg,
            weight,
            members,
        });
    }

    Ok(bins)
}

/// Sample standard deviation (ddof = 1). Zero for fewer than two values.
fn sample_sd(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (ss / (n as f64 - 1.0)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Points on an exact power-law recession: dq = −c·q, q descending
    /// geometrically. Scatter-free but with nonzero spread per bin.
    fn power_law_points(n: usize, rate: f64) -> Vec<DerivativePoint> {
        (0..n)
            .map(|i| {
                let q = 10.0 * (-rate * i as f64).exp();
                let dq = -0.05 * q;
                DerivativePoint { q, dq, log_q: q.ln(), log_dq: dq.abs().ln() }
            })
            .collect()
    }

    #[test]
    fn test_bins_cover_every_point_exactly_once() {
        let points = power_law_points(200, 0.01);
        let bins = bin_points(&points).unwrap();
        let total: usize = bins.iter().map(|b| b.count).sum();
        assert_eq!(total, 200, "bins must partition the pool");
        for bin in &bins {
            assert_eq!(bin.count, bin.members.len());
            for member in &bin.members {
                assert_eq!(member.category, bin.category);
            }
        }
    }

    #[test]
    fn test_non_final_bins_respect_the_minimum_size() {
        let points = power_law_points(300, 0.01);
        let bins = bin_points(&points).unwrap();
        assert!(bins.len() >= 2, "300 well-spread points should split");
        for bin in &bins[..bins.len() - 1] {
            assert!(
                bin.count >= MIN_BIN_POINTS,
                "bin {} holds only {} points",
                bin.category,
                bin.count
            );
        }
    }

    #[test]
    fn test_boundaries_strictly_increase_in_category_order() {
        let points = power_law_points(250, 0.02);
        let bins = bin_points(&points).unwrap();
        for (i, bin) in bins.iter().enumerate() {
            assert_eq!(bin.category, i, "categories must be assigned in sorted order");
        }
        // Descending log_q across consecutive bins.
        for pair in bins.windows(2) {
            assert!(
                pair[0].mean_log_q > pair[1].mean_log_q,
                "bins must march down the discharge range"
            );
        }
    }

    #[test]
    fn test_narrow_span_prevents_a_split() {
        // All points share nearly the same discharge: the span predicate
        // can never pass, so everything lands in one bin.
        let points: Vec<DerivativePoint> = (0..120)
            .map(|i| {
                let q = 5.0 + 1e-9 * i as f64;
                let dq = -0.1 - 1e-4 * i as f64;
                DerivativePoint { q, dq, log_q: q.ln(), log_dq: dq.abs().ln() }
            })
            .collect();
        let bins = bin_points(&points).unwrap();
        assert_eq!(bins.len(), 1, "near-zero log_q span must not split");
        assert_eq!(bins[0].count, 120);
    }

    #[test]
    fn test_bin_means_match_members() {
        let points = power_law_points(100, 0.03);
        let bins = bin_points(&points).unwrap();
        for bin in &bins {
            let mean_q: f64 =
                bin.members.iter().map(|m| m.point.q).sum::<f64>() / bin.count as f64;
            assert!((bin.mean_q - mean_q).abs() < 1e-12);
            assert!(bin.mean_dq > 0.0, "mean recession magnitude is positive");
        }
    }

    #[test]
    fn test_row_weights_and_bin_weight_agree_per_category() {
        let points = power_law_points(300, 0.01);
        let bins = bin_points(&points).unwrap();
        for bin in &bins {
            for member in &bin.members {
                assert!(member.weight.is_finite() && member.weight > 0.0);
            }
            let max_member = bin
                .members
                .iter()
                .map(|m| m.weight)
                .fold(f64::NEG_INFINITY, f64::max);
            assert!((bin.weight - max_member).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_pool_is_insufficient_data() {
        assert!(matches!(
            bin_points(&[]),
            Err(AnalysisError::InsufficientData(_))
        ));
    }
}
