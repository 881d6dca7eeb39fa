//! Direct storage from the fitted sensitivity function.
//!
//! With g(Q) in hand, the day-to-day discharge decrement ΔQ converts to
//! a storage increment ΔQ / g(Q); cumulative trapezoidal integration of
//! that integrand over the daily record gives the direct storage
//! series. Storage cannot be negative under the model's assumptions, so
//! negative values are clamped to zero after integration.

use crate::model::{AnalysisError, SensitivityModel};

/// Integrate cumulative direct storage over the daily discharge record.
///
/// For i ≥ 1: ΔQ[i] = Q[i−1] − Q[i] and y[i] = ΔQ[i] / g(Q[i]); the
/// running trapezoid of y starts at zero, so both the first and second
/// entries of the result are exactly 0. The signed cumulative series is
/// clamped elementwise at 0 afterwards.
///
/// Returns `Domain` if g(Q) evaluates to zero anywhere (the integrand
/// is undefined) or a daily discharge is non-positive.
pub fn integrate_direct_storage(
    daily_q: &[f64],
    model: &SensitivityModel,
) -> Result<Vec<f64>, AnalysisError> {
    let n = daily_q.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "direct storage needs at least 2 daily samples, got {n}"
        )));
    }

    // Integrand, defined from the second day onward.
    let mut integrand = vec![0.0; n];
    for i in 1..n {
        let denom = model.g(daily_q[i])?;
        if denom == 0.0 {
            return Err(AnalysisError::Domain(format!(
                "g(Q) vanishes at Q = {} (day {i}); storage integrand undefined",
                daily_q[i]
            )));
        }
        integrand[i] = (daily_q[i - 1] - daily_q[i]) / denom;
    }

    // Cumulative trapezoid over the integrand, prefixed with zero.
    let mut signed = vec![0.0; n];
    for i in 2..n {
        signed[i] = signed[i - 1] + 0.5 * (integrand[i - 1] + integrand[i]);
    }

    Ok(signed.into_iter().map(|s| s.max(0.0)).collect())
}
