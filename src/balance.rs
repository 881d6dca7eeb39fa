//! Daily water balance: indirect and total storage.
//!
//! Once direct storage is known, the remaining storage is whatever the
//! water balance cannot otherwise account for: cumulative precipitation
//! minus cumulative discharge, evapotranspiration, and the direct
//! component. One asymmetry from the model definition is preserved
//! exactly: on days where the unclamped indirect storage is
//! non-positive, the day's evapotranspiration is zeroed and indirect
//! storage recomputed, while total storage uses the zeroed value
//! directly — the two can diverge on those days (see DESIGN.md).

use crate::model::{AnalysisError, DailySample, StorageRecord};

/// Combine the daily series into the output storage table.
///
/// cum_q is the running discharge sum baseline-zeroed at the first day;
/// cum_p is the plain running precipitation sum. Per day:
///
///   i_s   = cum_p − cum_q − E_p − S_d   (E_p zeroed and i_s
///                                        recomputed when i_s ≤ 0)
///   total = cum_p − cum_q − E_p
///
/// both clamped at zero in the emitted record.
pub fn compute_water_balance(
    daily: &[DailySample],
    direct_storage: &[f64],
    evapotranspiration: &[f64],
) -> Result<Vec<StorageRecord>, AnalysisError> {
    let n = daily.len();
    if n == 0 {
        return Err(AnalysisError::InsufficientData(
            "no daily samples for the water balance".to_string(),
        ));
    }
    if direct_storage.len() != n || evapotranspiration.len() != n {
        return Err(AnalysisError::Precondition(format!(
            "series lengths differ: {} daily, {} direct storage, {} evapotranspiration",
            n,
            direct_storage.len(),
            evapotranspiration.len()
        )));
    }

    let q_baseline = daily[0].discharge_mm;
    let mut cum_q = 0.0;
    let mut cum_p = 0.0;
    let mut records = Vec::with_capacity(n);

    for (i, day) in daily.iter().enumerate() {
        cum_q += day.discharge_mm;
        cum_p += day.precip_mm;
        let cum_q_zeroed = cum_q - q_baseline;

        let d_s = direct_storage[i];
        let mut e_p = evapotranspiration[i];

        let mut i_s = cum_p - cum_q_zeroed - e_p - d_s;
        if i_s <= 0.0 {
            e_p = 0.0;
            i_s = cum_p - cum_q_zeroed - d_s;
        }
        let total = cum_p - cum_q_zeroed - e_p;

        records.push(StorageRecord {
            date: day.date,
            mean_daily_q: day.discharge_mm,
            cum_precip: cum_p,
            cum_discharge: cum_q_zeroed,
            direct_storage: d_s,
            evapotranspiration: e_p,
            indirect_storage: i_s.max(0.0),
            total_storage: total.max(0.0),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn daily_from(q: &[f64], p: &[f64]) -> Vec<DailySample> {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        q.iter()
            .zip(p.iter())
            .enumerate()
            .map(|(i, (&discharge_mm, &precip_mm))| DailySample {
                date: start + chrono::Duration::days(i as i64),
                discharge_mm,
                precip_mm,
                temp_mean_c: 12.0,
                temp_max_c: 18.0,
                temp_min_c: 6.0,
            })
            .collect()
    }

    #[test]
    fn test_cumulative_discharge_is_baseline_zeroed() {
        let daily = daily_from(&[2.0, 3.0, 1.0], &[0.0, 0.0, 0.0]);
        let records =
            compute_water_balance(&daily, &[0.0; 3], &[0.0; 3]).unwrap();
        assert_eq!(records[0].cum_discharge, 0.0, "first day must read zero");
        assert!((records[1].cum_discharge - 3.0).abs() < 1e-12);
        assert!((records[2].cum_discharge - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_storages_are_never_negative() {
        // Heavy discharge with no rain pushes the raw balance negative.
        let daily = daily_from(&[1.0, 5.0, 8.0, 9.0], &[0.0, 0.1, 0.0, 0.0]);
        let records = compute_water_balance(
            &daily,
            &[0.0, 0.5, 1.0, 1.0],
            &[0.3, 0.3, 0.3, 0.3],
        )
        .unwrap();
        for r in &records {
            assert!(r.indirect_storage >= 0.0, "{r:?}");
            assert!(r.total_storage >= 0.0, "{r:?}");
        }
    }

    #[test]
    fn test_et_is_zeroed_when_unclamped_indirect_storage_is_nonpositive() {
        // Day 1: cum_p = 0.5, cum_q = 1.0 → i_s < 0 regardless of E_p.
        let daily = daily_from(&[2.0, 3.0], &[0.0, 0.5]);
        let records =
            compute_water_balance(&daily, &[0.0, 0.0], &[0.4, 0.4]).unwrap();
        assert_eq!(
            records[1].evapotranspiration, 0.0,
            "E_p must be exactly zero on a deficit day"
        );
        assert_eq!(records[1].indirect_storage, 0.0);
    }

    #[test]
    fn test_et_survives_on_surplus_days() {
        // Plenty of rain: i_s stays positive, E_p is kept as estimated.
        let daily = daily_from(&[1.0, 1.0], &[5.0, 5.0]);
        let records =
            compute_water_balance(&daily, &[0.0, 0.5], &[0.4, 0.4]).unwrap();
        assert!((records[0].evapotranspiration - 0.4).abs() < 1e-12);
        assert!((records[0].indirect_storage - (5.0 - 0.0 - 0.4 - 0.0)).abs() < 1e-12);
        assert!((records[1].indirect_storage - (10.0 - 1.0 - 0.4 - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_total_and_indirect_can_diverge_on_zeroed_days() {
        // Deficit forces E_p to zero; total then equals cum_p − cum_q
        // while indirect also subtracts direct storage.
        let daily = daily_from(&[1.0, 2.0], &[0.0, 1.0]);
        let records =
            compute_water_balance(&daily, &[0.0, 2.0], &[0.2, 0.2]).unwrap();
        let r = &records[1];
        // cum_p = 1.0, cum_q = 2.0: unclamped i_s = 1 − 2 − 0.2 − 2 < 0,
        // so E_p → 0, i_s → 1 − 2 − 2 = −3 → clamp 0; total = 1 − 2 → clamp 0.
        assert_eq!(r.evapotranspiration, 0.0);
        assert_eq!(r.indirect_storage, 0.0);
        assert_eq!(r.total_storage, 0.0);
    }

    #[test]
    fn test_mismatched_lengths_are_a_precondition_error() {
        let daily = daily_from(&[1.0, 2.0], &[0.0, 0.0]);
        assert!(matches!(
            compute_water_balance(&daily, &[0.0], &[0.0, 0.0]),
            Err(AnalysisError::Precondition(_))
        ));
    }
}
