//! Core data types for the watershed storage estimation pipeline.
//!
//! This module defines the shared domain model imported by all other
//! modules. It contains no algorithms and no I/O — only types, plus the
//! error enum every stage reports through.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// A single raw observation: one (timestamp, value) pair from a sensor
/// record. Timestamps need not be regular; the resampler buckets them.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Reading { timestamp, value }
    }
}

/// The three parallel input series the pipeline consumes.
///
/// Units: precipitation in mm per observation, discharge in m³/s,
/// air temperature in °C. Each series may have its own irregular
/// timestamps.
#[derive(Debug, Clone, Default)]
pub struct RawSeries {
    pub precipitation: Vec<Reading>,
    pub discharge: Vec<Reading>,
    pub temperature: Vec<Reading>,
}

// ---------------------------------------------------------------------------
// Resampled series
// ---------------------------------------------------------------------------

/// One regular hourly sample after resampling and unit conversion.
///
/// `row` is the sample's index in the hourly record; the recession scan
/// and the antecedent-rainfall window address samples by this index.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySample {
    pub timestamp: DateTime<Utc>,
    pub row: usize,
    /// Discharge as depth over the catchment, mm per hour.
    pub discharge_mm: f64,
    /// Precipitation depth accumulated in this hour, mm.
    pub precip_mm: f64,
    /// Mean air temperature over this hour, °C.
    pub temp_c: f64,
}

/// One regular daily sample. Temperature extrema are within-day extrema
/// of the hourly record, kept here because the Hargreaves estimator
/// needs them.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySample {
    pub date: NaiveDate,
    /// Discharge as depth over the catchment, mm per day.
    pub discharge_mm: f64,
    /// Precipitation total for the day, mm.
    pub precip_mm: f64,
    pub temp_mean_c: f64,
    pub temp_max_c: f64,
    pub temp_min_c: f64,
}

// ---------------------------------------------------------------------------
// Recession artifacts
// ---------------------------------------------------------------------------

/// A maximal run of consecutive hourly rows that satisfied the recession
/// selection predicate. Rows are contiguous (spacing of one hour) and
/// the run is at least `recession::extract::MIN_GROUP_HOURS` long.
#[derive(Debug, Clone, PartialEq)]
pub struct RecessionGroup {
    pub id: usize,
    pub rows: Vec<usize>,
}

/// A recession group after timestep assignment.
///
/// `rows` is the stride-`dt` subsample of the original group's rows;
/// `dt` is the accepted differentiation timestep in hours. Groups the
/// selector could not accept at any stride never become this type.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledGroup {
    pub id: usize,
    pub rows: Vec<usize>,
    pub dt: usize,
}

/// One discharge/recession-rate point, taken at an interior position of
/// a sampled group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivativePoint {
    /// Representative discharge: mean of the lag and lead samples, mm/h.
    pub q: f64,
    /// Central-difference dQ/dt, mm/h per hour. Negative on a recession.
    pub dq: f64,
    pub log_q: f64,
    pub log_dq: f64,
}

// ---------------------------------------------------------------------------
// Binning artifacts
// ---------------------------------------------------------------------------

/// A derivative point annotated with its bin membership and the
/// pre-aggregation fields computed per category.
///
/// `se_log_dq` and `weight` here are the per-row values computed from
/// the category grouping over absolute dQ/dt; the `Bin` summary carries
/// its own recomputation of both. The duplication mirrors the source
/// formulation and is kept deliberately (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinnedPoint {
    pub point: DerivativePoint,
    pub category: usize,
    pub se_log_dq: f64,
    pub weight: f64,
}

/// One irregular bin over the pooled derivative points.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub category: usize,
    pub members: Vec<BinnedPoint>,
    pub count: usize,
    /// Mean recession-rate magnitude, mean(−dq).
    pub mean_dq: f64,
    pub mean_q: f64,
    pub mean_log_q: f64,
    pub mean_log_dq: f64,
    /// Standard error of log_dq within the bin (aggregation-time value).
    pub se_log_dq: f64,
    /// Regression weight: max of the member per-row weights.
    pub weight: f64,
}

// ---------------------------------------------------------------------------
// Terminal artifacts
// ---------------------------------------------------------------------------

/// Fitted sensitivity function relating discharge to its recession rate:
///
///   log|dQ/dt| = p0 + p1·ln Q + p2·ln²Q
///   g(Q)       = p0 + (p1 − 1)·ln Q + p2·ln²Q
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensitivityModel {
    pub p0: f64,
    pub p1: f64,
    pub p2: f64,
    pub r_squared: f64,
}

impl SensitivityModel {
    /// Evaluate the sensitivity function g(Q). Requires Q > 0.
    pub fn g(&self, q: f64) -> Result<f64, AnalysisError> {
        if q <= 0.0 {
            return Err(AnalysisError::Domain(format!(
                "g(Q) requires positive discharge, got {q}"
            )));
        }
        let lq = q.ln();
        Ok(self.p0 + (self.p1 - 1.0) * lq + self.p2 * lq * lq)
    }
}

/// One row of the daily storage table — the pipeline's output artifact.
/// `indirect_storage` and `total_storage` are clamped non-negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageRecord {
    pub date: NaiveDate,
    /// Mean daily discharge depth, mm/day.
    pub mean_daily_q: f64,
    /// Cumulative precipitation since the first day, mm.
    pub cum_precip: f64,
    /// Cumulative discharge since the first day, baseline-zeroed, mm.
    pub cum_discharge: f64,
    /// Direct (recession-derived) storage, mm.
    pub direct_storage: f64,
    /// Potential evapotranspiration for the day, mm. Zeroed on days
    /// where the unclamped indirect storage was non-positive.
    pub evapotranspiration: f64,
    /// Water-balance residual storage, mm, clamped ≥ 0.
    pub indirect_storage: f64,
    /// Total dynamic storage, mm, clamped ≥ 0.
    pub total_storage: f64,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can arise in the storage estimation pipeline.
///
/// Stage-local failures are never silently recovered: a malformed group,
/// an empty bin set, or a singular regression propagates to the caller,
/// since any recovery policy would bias the sensitivity function.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// A resampling interval had no underlying observations.
    DataGap(String),
    /// A scan or computation was started before its lookback windows
    /// were fully defined, or inputs violated a stated precondition.
    Precondition(String),
    /// Log or square root of a non-positive quantity.
    Domain(String),
    /// Fewer samples, points, or bins than an operation requires.
    InsufficientData(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::DataGap(msg) => write!(f, "Data gap: {}", msg),
            AnalysisError::Precondition(msg) => write!(f, "Precondition violated: {}", msg),
            AnalysisError::Domain(msg) => write!(f, "Domain error: {}", msg),
            AnalysisError::InsufficientData(msg) => write!(f, "Insufficient data: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}
