//! Weighted quadratic fit of the discharge sensitivity function.
//!
//! The bin means trace log|dQ/dt| as a function of log Q; a weighted
//! least-squares quadratic through them gives the coefficients of
//!
//!   log|dQ/dt| = p0 + p1·log Q + p2·log²Q
//!
//! from which the sensitivity function g(Q) = p0 + (p1 − 1)·log Q +
//! p2·log²Q follows. The fit solves the 3×3 normal equations directly.

use nalgebra::{DMatrix, DVector};

use crate::model::{AnalysisError, Bin, SensitivityModel};

/// Fit the sensitivity model over the bin means, weighted by the bin
/// weights.
///
/// Returns `InsufficientData` when fewer than three bins are available
/// or the normal equations are singular (e.g. degenerate bin placement),
/// and `Domain` when a bin carries a non-finite weight.
pub fn fit_sensitivity(bins: &[Bin]) -> Result<SensitivityModel, AnalysisError> {
    let n = bins.len();
    if n < 3 {
        return Err(AnalysisError::InsufficientData(format!(
            "quadratic fit needs at least 3 bins, got {n}"
        )));
    }
    for bin in bins {
        if !bin.weight.is_finite() || bin.weight <= 0.0 {
            return Err(AnalysisError::Domain(format!(
                "bin {} carries unusable weight {}",
                bin.category, bin.weight
            )));
        }
    }

    let x = DMatrix::from_fn(n, 3, |i, j| bins[i].mean_log_q.powi(j as i32));
    let y = DVector::from_fn(n, |i, _| bins[i].mean_log_dq);
    let w = DVector::from_fn(n, |i, _| bins[i].weight);

    // Normal equations: (XᵀWX)·β = XᵀWy.
    let xtw = x.transpose() * DMatrix::from_diagonal(&w);
    let a = &xtw * &x;
    let rhs = &xtw * &y;

    let beta = a.lu().solve(&rhs).ok_or_else(|| {
        AnalysisError::InsufficientData(
            "normal equations are singular; bins do not span a quadratic".to_string(),
        )
    })?;

    let fitted = &x * &beta;
    let r_squared = weighted_r_squared(&y, &fitted, &w);

    Ok(SensitivityModel {
        p0: beta[0],
        p1: beta[1],
        p2: beta[2],
        r_squared,
    })
}

fn weighted_r_squared(y: &DVector<f64>, fitted: &DVector<f64>, w: &DVector<f64>) -> f64 {
    let w_total: f64 = w.iter().sum();
    let y_bar: f64 = y.iter().zip(w.iter()).map(|(yi, wi)| wi * yi).sum::<f64>() / w_total;

    let ss_tot: f64 = y
        .iter()
        .zip(w.iter())
        .map(|(yi, wi)| wi * (yi - y_bar) * (yi - y_bar))
        .sum();
    let ss_res: f64 = y
        .iter()
        .zip(fitted.iter())
        .zip(w.iter())
        .map(|((yi, fi), wi)| wi * (yi - fi) * (yi - fi))
        .sum();

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    }
}
