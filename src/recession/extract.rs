//! Recession-limb extraction from the smoothed hourly record.
//!
//! A row belongs to a recession when two things hold at once: the
//! catchment has seen essentially no rain over the preceding day, and
//! the smoothed discharge is strictly falling. The scan is a pure
//! forward pass returning explicit row indices — no accumulator state
//! survives it — and the selected rows are then grouped into maximal
//! consecutive runs.

use crate::model::{AnalysisError, HourlySample, RecessionGroup};
use crate::smoothing::SmoothedDischarge;

/// Lookback of the antecedent-rainfall window, in hours. The window at
/// row i is [i − 24, i] inclusive: 25 samples.
pub const ANTECEDENT_WINDOW_HOURS: usize = 24;

/// Mean hourly rainfall over the antecedent window must stay strictly
/// below this (mm) for a row to qualify as rain-free.
pub const ANTECEDENT_RAIN_CEILING_MM: f64 = 0.002;

/// Minimum length of a retained recession group, in hourly rows.
pub const MIN_GROUP_HOURS: usize = 24;

/// Scan the hourly record from `start_row` through `n − 2` and return
/// the recession groups found.
///
/// Preconditions, checked explicitly: `start_row` must leave the
/// smoothing window defined at `start_row − 1` and the antecedent
/// window fully inside the record. With the 72-hour smoothing window
/// that means `start_row ≥ 73`.
pub fn extract_groups(
    hourly: &[HourlySample],
    smoothed: &SmoothedDischarge,
    start_row: usize,
) -> Result<Vec<RecessionGroup>, AnalysisError> {
    if start_row < ANTECEDENT_WINDOW_HOURS + 1 {
        return Err(AnalysisError::Precondition(format!(
            "start_row {} leaves the antecedent rainfall window undefined (need ≥ {})",
            start_row,
            ANTECEDENT_WINDOW_HOURS + 1
        )));
    }
    if start_row < smoothed.window + 1 {
        return Err(AnalysisError::Precondition(format!(
            "start_row {} precedes the first defined smoothed row pair (need ≥ {})",
            start_row,
            smoothed.window + 1
        )));
    }
    if hourly.len() != smoothed.len() {
        return Err(AnalysisError::Precondition(format!(
            "hourly record ({}) and smoothed record ({}) differ in length",
            hourly.len(),
            smoothed.len()
        )));
    }

    let selected = select_rows(hourly, smoothed, start_row);
    Ok(group_consecutive(&selected))
}

/// The selection pass: returns every row satisfying both predicates.
/// Always advances by one row; never backtracks.
fn select_rows(
    hourly: &[HourlySample],
    smoothed: &SmoothedDischarge,
    start_row: usize,
) -> Vec<usize> {
    let n = hourly.len();
    if n < 2 {
        return Vec::new();
    }

    let mut selected = Vec::new();
    for i in start_row..=(n - 2) {
        if !rain_free(hourly, i) {
            continue;
        }
        let (Some(cur), Some(prev)) = (smoothed.get(i), smoothed.get(i - 1)) else {
            continue;
        };
        if cur < prev {
            selected.push(i);
        }
    }
    selected
}

/// Mean rainfall over [i − 24, i] inclusive, strictly below the ceiling.
fn rain_free(hourly: &[HourlySample], i: usize) -> bool {
    let window = &hourly[i - ANTECEDENT_WINDOW_HOURS..=i];
    let mean = window.iter().map(|s| s.precip_mm).sum::<f64>() / window.len() as f64;
    mean < ANTECEDENT_RAIN_CEILING_MM
}

/// Group selected rows into maximal runs of consecutive indices and
/// discard runs shorter than `MIN_GROUP_HOURS`.
fn group_consecutive(selected: &[usize]) -> Vec<RecessionGroup> {
    let mut groups = Vec::new();
    let mut run: Vec<usize> = Vec::new();

    for &row in selected {
        match run.last() {
            Some(&last) if row == last + 1 => run.push(row),
            Some(_) => {
                if run.len() >= MIN_GROUP_HOURS {
                    groups.push(std::mem::take(&mut run));
                } else {
                    run.clear();
                }
                run.push(row);
            }
            None => run.push(row),
        }
    }
    if run.len() >= MIN_GROUP_HOURS {
        groups.push(run);
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(id, rows)| RecessionGroup { id, rows })
        .collect()
}
