//! Adaptive differentiation-timestep selection.
//!
//! At native hourly resolution the consecutive-difference derivative of
//! a gently falling limb is often smaller than the sensor noise floor.
//! Each group therefore gets the coarsest of four candidate strides
//! (1–4 h) at which its smallest step-to-step drop still clears a
//! global noise threshold. The cascade is rejection-forward: a group
//! whose drops sit below the threshold at stride k is retried at
//! stride k + 1, never accepted early, and a group still too quiet at
//! stride 4 is dropped outright.

use crate::logging::{self, Stage};
use crate::model::{AnalysisError, RecessionGroup, SampledGroup};
use crate::smoothing::SmoothedDischarge;

/// Coarsest stride tried before a group is dropped, in hours.
pub const MAX_STRIDE_HOURS: usize = 4;

/// The noise threshold is this fraction of the mean smoothed discharge
/// over the full record.
pub const NOISE_THRESHOLD_FACTOR: f64 = 0.001;

/// Per-group outcome of one stride evaluation.
enum StrideOutcome {
    Accepted(SampledGroup),
    Rejected(RecessionGroup),
}

/// Assign each group its differentiation timestep.
///
/// Strides are evaluated in strictly ascending order; a group accepted
/// at stride k leaves the candidate set and is never re-evaluated.
/// Groups rejected at every stride are dropped (and logged). The
/// accepted groups come back merged in time order, each carrying its
/// stride-subsampled rows and `dt`.
pub fn assign_timesteps(
    groups: Vec<RecessionGroup>,
    smoothed: &SmoothedDischarge,
) -> Result<Vec<SampledGroup>, AnalysisError> {
    let mean_q = smoothed.mean_defined().ok_or_else(|| {
        AnalysisError::InsufficientData(
            "smoothed record has no defined values; cannot derive noise threshold".to_string(),
        )
    })?;
    let threshold = NOISE_THRESHOLD_FACTOR * mean_q;

    let total = groups.len();
    let mut pending = groups;
    let mut accepted: Vec<SampledGroup> = Vec::new();

    for dt in 1..=MAX_STRIDE_HOURS {
        let mut still_pending = Vec::new();
        for group in pending {
            match evaluate_stride(group, dt, smoothed, threshold) {
                StrideOutcome::Accepted(sampled) => accepted.push(sampled),
                StrideOutcome::Rejected(group) => still_pending.push(group),
            }
        }
        pending = still_pending;
        if pending.is_empty() {
            break;
        }
    }

    for group in &pending {
        logging::debug(
            Stage::Recession,
            None,
            &format!(
                "group {} ({} rows) too quiet at every stride ≤ {}, dropped",
                group.id,
                group.rows.len(),
                MAX_STRIDE_HOURS
            ),
        );
    }
    logging::log_group_summary(Stage::Recession, total, accepted.len(), pending.len());

    accepted.sort_by_key(|g| g.rows.first().copied().unwrap_or(usize::MAX));
    Ok(accepted)
}

/// Evaluate one group at one stride.
///
/// The candidate subsample is every dt-th row of the group, re-derived
/// from the group's full row list each time so a retry at a coarser
/// stride sees the whole group rather than the previous stride's
/// subsample. The group is accepted when the smallest backward drop of
/// smoothed discharge over the subsample reaches the threshold.
fn evaluate_stride(
    group: RecessionGroup,
    dt: usize,
    smoothed: &SmoothedDischarge,
    threshold: f64,
) -> StrideOutcome {
    let rows: Vec<usize> = group.rows.iter().copied().step_by(dt).collect();
    if rows.len() < 2 {
        return StrideOutcome::Rejected(group);
    }

    let min_drop = rows
        .windows(2)
        .filter_map(|pair| {
            let prev = smoothed.get(pair[0])?;
            let cur = smoothed.get(pair[1])?;
            Some(prev - cur)
        })
        .fold(f64::INFINITY, f64::min);

    if min_drop >= threshold {
        StrideOutcome::Accepted(SampledGroup { id: group.id, rows, dt })
    } else {
        StrideOutcome::Rejected(group)
    }
}
