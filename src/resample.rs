//! Regularization of raw sensor records into hourly and daily series.
//!
//! Raw gauge and rain-gauge records arrive at irregular timestamps. The
//! rest of the pipeline addresses samples by row index with fixed
//! spacing, so everything funnels through this module first. Discharge
//! is converted from a volume rate (m³/s) to a depth rate over the
//! catchment (mm per interval) here, and nowhere else.
//!
//! Gap policy is deliberately strict: an hour with no discharge
//! observation is a `DataGap` error, not a fill. Whether to drop or
//! forward-fill a gappy record is an upstream decision the caller must
//! make explicitly before handing data to the pipeline.

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{AnalysisError, DailySample, HourlySample, RawSeries, Reading};

pub const SECONDS_PER_HOUR: f64 = 3600.0;
pub const SECONDS_PER_DAY: f64 = 86_400.0;

// ---------------------------------------------------------------------------
// Unit conversion
// ---------------------------------------------------------------------------

/// Convert a volume rate (m³/s) to a depth over the catchment for one
/// resampling interval: depth_mm = Q · seconds / area · 1000.
pub fn discharge_depth_mm(q_m3s: f64, seconds_in_interval: f64, catchment_area_m2: f64) -> f64 {
    q_m3s * seconds_in_interval / catchment_area_m2 * 1000.0
}

// ---------------------------------------------------------------------------
// Hourly resampling
// ---------------------------------------------------------------------------

/// Aggregate raw readings into a regular hourly series.
///
/// The hourly span is taken from the discharge record (first to last
/// observation, truncated to whole hours). Per hour: discharge is the
/// mean of its observations converted to mm/h, precipitation is the sum
/// of its observations (no observation means zero rainfall), and
/// temperature is the mean of its observations.
///
/// Returns `DataGap` if any hour in the span has no discharge or no
/// temperature observation.
pub fn resample_hourly(
    raw: &RawSeries,
    catchment_area_m2: f64,
) -> Result<Vec<HourlySample>, AnalysisError> {
    let first = raw.discharge.first().ok_or_else(|| {
        AnalysisError::InsufficientData("discharge record is empty".to_string())
    })?;
    let last = raw.discharge.last().expect("non-empty after first() check");

    let origin = floor_to_hour(first.timestamp);
    let end = floor_to_hour(last.timestamp);
    let n_hours = ((end - origin).num_hours() as usize) + 1;

    let q_buckets = bucket_hourly(&raw.discharge, origin, n_hours);
    let p_buckets = bucket_hourly(&raw.precipitation, origin, n_hours);
    let t_buckets = bucket_hourly(&raw.temperature, origin, n_hours);

    let mut samples = Vec::with_capacity(n_hours);
    for row in 0..n_hours {
        let timestamp = origin + chrono::Duration::hours(row as i64);

        let q_mean = mean(&q_buckets[row]).ok_or_else(|| {
            AnalysisError::DataGap(format!("hour {} has no discharge observations", timestamp))
        })?;
        let temp_c = mean(&t_buckets[row]).ok_or_else(|| {
            AnalysisError::DataGap(format!("hour {} has no temperature observations", timestamp))
        })?;
        let precip_mm: f64 = p_buckets[row].iter().sum();

        samples.push(HourlySample {
            timestamp,
            row,
            discharge_mm: discharge_depth_mm(q_mean, SECONDS_PER_HOUR, catchment_area_m2),
            precip_mm,
            temp_c,
        });
    }

    Ok(samples)
}

// ---------------------------------------------------------------------------
// Daily resampling
// ---------------------------------------------------------------------------

/// Aggregate the regular hourly series into daily samples.
///
/// Precipitation and discharge depth are summed over the day's hours,
/// so daily precipitation conserves the hourly total exactly.
/// Temperature carries the within-day mean and extrema for the
/// evapotranspiration estimator.
pub fn resample_daily(hourly: &[HourlySample]) -> Result<Vec<DailySample>, AnalysisError> {
    if hourly.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "hourly record is empty".to_string(),
        ));
    }

    let mut days: Vec<DailySample> = Vec::new();
    let mut current: Option<(NaiveDate, Vec<&HourlySample>)> = None;

    for sample in hourly {
        let date = sample.timestamp.date_naive();
        match current.as_mut() {
            Some((d, members)) if *d == date => members.push(sample),
            _ => {
                if let Some((d, members)) = current.take() {
                    days.push(aggregate_day(d, &members));
                }
                current = Some((date, vec![sample]));
            }
        }
    }
    if let Some((d, members)) = current.take() {
        days.push(aggregate_day(d, &members));
    }

    Ok(days)
}

fn aggregate_day(date: NaiveDate, members: &[&HourlySample]) -> DailySample {
    let n = members.len() as f64;
    let discharge_mm = members.iter().map(|s| s.discharge_mm).sum();
    let precip_mm = members.iter().map(|s| s.precip_mm).sum();
    let temp_mean_c = members.iter().map(|s| s.temp_c).sum::<f64>() / n;
    let temp_max_c = members.iter().map(|s| s.temp_c).fold(f64::NEG_INFINITY, f64::max);
    let temp_min_c = members.iter().map(|s| s.temp_c).fold(f64::INFINITY, f64::min);

    DailySample {
        date,
        discharge_mm,
        precip_mm,
        temp_mean_c,
        temp_max_c,
        temp_min_c,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp().div_euclid(3600) * 3600;
    DateTime::from_timestamp(secs, 0).expect("hour-aligned timestamp is representable")
}

fn bucket_hourly(readings: &[Reading], origin: DateTime<Utc>, n_hours: usize) -> Vec<Vec<f64>> {
    let mut buckets = vec![Vec::new(); n_hours];
    for reading in readings {
        let offset = (floor_to_hour(reading.timestamp) - origin).num_hours();
        if offset >= 0 && (offset as usize) < n_hours {
            buckets[offset as usize].push(reading.value);
        }
    }
    buckets
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    fn raw_with_hourly_discharge(hours: u32) -> RawSeries {
        let start = ts(0, 0);
        let mut raw = RawSeries::default();
        for h in 0..hours {
            let stamp = start + chrono::Duration::hours(h as i64);
            raw.discharge.push(Reading::new(stamp, 1.0));
            raw.temperature.push(Reading::new(stamp, 10.0));
        }
        raw
    }

    #[test]
    fn test_depth_conversion_one_cubic_metre_per_second() {
        // 1 m³/s over 1 km² for one hour: 3600 m³ / 1e6 m² = 3.6 mm.
        let depth = discharge_depth_mm(1.0, SECONDS_PER_HOUR, 1.0e6);
        assert!((depth - 3.6).abs() < 1e-12, "expected 3.6 mm, got {depth}");
    }

    #[test]
    fn test_hourly_mean_of_irregular_discharge_observations() {
        let mut raw = raw_with_hourly_discharge(2);
        // Two extra readings inside hour 0: mean of (1.0, 2.0, 3.0) = 2.0 m³/s.
        raw.discharge.push(Reading::new(ts(0, 15), 2.0));
        raw.discharge.push(Reading::new(ts(0, 45), 3.0));

        let hourly = resample_hourly(&raw, 1.0e6).expect("gapless record should resample");
        assert_eq!(hourly.len(), 2);
        assert!((hourly[0].discharge_mm - 2.0 * 3.6).abs() < 1e-12);
        assert!((hourly[1].discharge_mm - 3.6).abs() < 1e-12);
    }

    #[test]
    fn test_missing_discharge_hour_is_a_data_gap() {
        let mut raw = RawSeries::default();
        raw.discharge.push(Reading::new(ts(0, 0), 1.0));
        raw.discharge.push(Reading::new(ts(2, 0), 1.0)); // hour 1 missing
        raw.temperature.push(Reading::new(ts(0, 0), 10.0));
        raw.temperature.push(Reading::new(ts(1, 0), 10.0));
        raw.temperature.push(Reading::new(ts(2, 0), 10.0));

        let result = resample_hourly(&raw, 1.0e6);
        match result {
            Err(AnalysisError::DataGap(msg)) => {
                assert!(msg.contains("discharge"), "gap message should name the series: {msg}")
            }
            other => panic!("expected DataGap, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_precipitation_defaults_to_zero() {
        let raw = raw_with_hourly_discharge(3);
        let hourly = resample_hourly(&raw, 1.0e6).expect("should resample");
        assert!(hourly.iter().all(|s| s.precip_mm == 0.0));
    }

    #[test]
    fn test_daily_precipitation_conservation() {
        // 48 hours, varying sub-hourly rain: daily sums must equal the
        // sum of all raw observations per date.
        let mut raw = raw_with_hourly_discharge(48);
        let mut day0_total = 0.0;
        let mut day1_total = 0.0;
        for h in 0..48u32 {
            let amount = 0.1 * (h as f64 + 1.0);
            let stamp = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
                + chrono::Duration::hours(h as i64)
                + chrono::Duration::minutes(17);
            raw.precipitation.push(Reading::new(stamp, amount));
            if h < 24 {
                day0_total += amount;
            } else {
                day1_total += amount;
            }
        }

        let hourly = resample_hourly(&raw, 1.0e6).expect("should resample");
        let daily = resample_daily(&hourly).expect("should aggregate");
        assert_eq!(daily.len(), 2);
        assert!(
            (daily[0].precip_mm - day0_total).abs() < 1e-9,
            "day 0: expected {day0_total}, got {}",
            daily[0].precip_mm
        );
        assert!((daily[1].precip_mm - day1_total).abs() < 1e-9);
    }

    #[test]
    fn test_daily_temperature_extrema_come_from_hourly_values() {
        let mut raw = raw_with_hourly_discharge(24);
        raw.temperature.clear();
        for h in 0..24u32 {
            // Diurnal cycle around 12 °C with a 6 °C amplitude.
            let t = 12.0 + 6.0 * (std::f64::consts::TAU * h as f64 / 24.0).sin();
            raw.temperature.push(Reading::new(ts(h, 0), t));
        }

        let hourly = resample_hourly(&raw, 1.0e6).expect("should resample");
        let daily = resample_daily(&hourly).expect("should aggregate");
        assert_eq!(daily.len(), 1);
        assert!(daily[0].temp_max_c > daily[0].temp_min_c);
        assert!(daily[0].temp_mean_c > daily[0].temp_min_c);
        assert!(daily[0].temp_mean_c < daily[0].temp_max_c);
    }

    #[test]
    fn test_empty_discharge_record_is_insufficient_data() {
        let raw = RawSeries::default();
        assert!(matches!(
            resample_hourly(&raw, 1.0e6),
            Err(AnalysisError::InsufficientData(_))
        ));
    }
}
