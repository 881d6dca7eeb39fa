//! Causal moving-average smoothing of the hourly discharge record.
//!
//! Raw hourly discharge carries sensor noise that would dominate the
//! consecutive-difference test in the recession scan. A trailing simple
//! moving average removes it without looking into the future. The
//! smoothed series is the one every downstream stage works on; the raw
//! discharge column is kept only for display by the excluded reporting
//! layer.

use crate::model::HourlySample;

/// Width of the trailing moving average, in hours (three days).
pub const SMOOTHING_WINDOW_HOURS: usize = 72;

/// Smoothed hourly discharge. Values before `window` are undefined and
/// never backfilled; the recession scan must start after them.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedDischarge {
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

impl SmoothedDischarge {
    /// Smoothed value at a row, or `None` where the window is not yet
    /// fully defined.
    pub fn get(&self, row: usize) -> Option<f64> {
        self.values.get(row).copied().flatten()
    }

    /// Mean over the defined portion of the record. `None` when the
    /// record is shorter than the window.
    pub fn mean_defined(&self) -> Option<f64> {
        let defined: Vec<f64> = self.values.iter().filter_map(|v| *v).collect();
        if defined.is_empty() {
            None
        } else {
            Some(defined.iter().sum::<f64>() / defined.len() as f64)
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Trailing simple moving average over hourly discharge depth.
///
/// The value at row i is the mean of rows [i − window, i), so the first
/// defined row is `window` itself.
pub fn trailing_mean(hourly: &[HourlySample], window: usize) -> SmoothedDischarge {
    let n = hourly.len();
    let mut values = vec![None; n];

    if window == 0 || n <= window {
        return SmoothedDischarge { window, values };
    }

    // Rolling sum of the previous `window` samples.
    let mut sum: f64 = hourly[..window].iter().map(|s| s.discharge_mm).sum();
    for i in window..n {
        values[i] = Some(sum / window as f64);
        sum += hourly[i].discharge_mm - hourly[i - window].discharge_mm;
    }

    SmoothedDischarge { window, values }
}
