//! Central-difference derivative estimation over sampled groups.
//!
//! For each interior position of a group's stride subsample, the
//! recession rate is the central difference of smoothed discharge over
//! the neighbouring subsample rows, which sit dt hours to either side.
//! The first and last position of every group have no derivative and
//! are excluded. The result is one flat pool of points; time order is
//! irrelevant from here on, and the binner re-sorts by discharge.

use crate::model::{AnalysisError, DerivativePoint, SampledGroup};
use crate::smoothing::SmoothedDischarge;

/// Estimate derivative points for every sampled group and pool them.
///
/// Per interior position j (with neighbours j − dt and j + dt in base
/// rows): dQ/dt = (Q[j+dt] − Q[j−dt]) / (2·dt), representative
/// Q = mean(Q[j+dt], Q[j−dt]), plus the log transforms of both.
///
/// Returns `Domain` if a representative discharge is non-positive or a
/// derivative is exactly zero (its logarithm is undefined), and
/// `Precondition` if a group references rows where the smoothed record
/// is undefined.
pub fn estimate_derivatives(
    groups: &[SampledGroup],
    smoothed: &SmoothedDischarge,
) -> Result<Vec<DerivativePoint>, AnalysisError> {
    let mut pool = Vec::new();

    for group in groups {
        for window in group.rows.windows(3) {
            let (lag_row, lead_row) = (window[0], window[2]);
            let lag = defined(smoothed, group.id, lag_row)?;
            let lead = defined(smoothed, group.id, lead_row)?;

            let dq = (lead - lag) / (2.0 * group.dt as f64);
            let q = (lead + lag) / 2.0;

            if q <= 0.0 {
                return Err(AnalysisError::Domain(format!(
                    "group {}: non-positive representative discharge {} at row {}",
                    group.id, q, window[1]
                )));
            }
            if dq == 0.0 {
                return Err(AnalysisError::Domain(format!(
                    "group {}: zero derivative at row {} has no logarithm",
                    group.id, window[1]
                )));
            }

            pool.push(DerivativePoint {
                q,
                dq,
                log_q: q.ln(),
                log_dq: dq.abs().ln(),
            });
        }
    }

    Ok(pool)
}

fn defined(
    smoothed: &SmoothedDischarge,
    group_id: usize,
    row: usize,
) -> Result<f64, AnalysisError> {
    smoothed.get(row).ok_or_else(|| {
        AnalysisError::Precondition(format!(
            "group {group_id} references row {row} where the smoothed record is undefined"
        ))
    })
}
