//! Daily potential evapotranspiration via the Hargreaves equation.
//!
//! Hargreaves needs only daily temperature statistics and the
//! theoretical top-of-atmosphere (extraterrestrial) radiation, which
//! makes it usable on records without radiation or humidity sensors.
//! The radiation term follows the FAO-56 formulation (Allen et al.,
//! 1998) and is exposed as a pure function of day-of-year and latitude.

use chrono::Datelike;

use crate::model::{AnalysisError, DailySample};

/// Solar constant, MJ m⁻² min⁻¹ (FAO-56).
pub const SOLAR_CONSTANT: f64 = 0.0820;

/// Extraterrestrial radiation R_a in MJ m⁻² day⁻¹ for a day of year
/// (1–366) and a latitude in decimal degrees (negative south).
///
/// FAO-56 equations 21–25. The sunset-hour-angle argument is clamped to
/// [−1, 1] so polar-latitude day/night extremes saturate instead of
/// producing NaN.
pub fn extraterrestrial_radiation(day_of_year: u32, latitude_deg: f64) -> f64 {
    let j = day_of_year as f64;
    let phi = latitude_deg.to_radians();

    // Inverse relative earth–sun distance and solar declination.
    let dr = 1.0 + 0.033 * (2.0 * std::f64::consts::PI / 365.0 * j).cos();
    let delta = 0.409 * (2.0 * std::f64::consts::PI / 365.0 * j - 1.39).sin();

    // Sunset hour angle.
    let ws = (-phi.tan() * delta.tan()).clamp(-1.0, 1.0).acos();

    24.0 * 60.0 / std::f64::consts::PI
        * SOLAR_CONSTANT
        * dr
        * (ws * phi.sin() * delta.sin() + phi.cos() * delta.cos() * ws.sin())
}

/// Hargreaves potential evapotranspiration for one day, mm/day:
///
///   E_p = 0.0023 · (T_mean + 17.8) · √(T_max − T_min) · 0.408 · R_a
///
/// The 0.408 factor converts R_a from MJ m⁻² day⁻¹ to mm/day of
/// evaporated water.
pub fn hargreaves(day: &DailySample, latitude_deg: f64) -> Result<f64, AnalysisError> {
    let spread = day.temp_max_c - day.temp_min_c;
    if spread < 0.0 {
        return Err(AnalysisError::Domain(format!(
            "day {}: temperature maximum {} below minimum {}",
            day.date, day.temp_max_c, day.temp_min_c
        )));
    }

    let r_a = extraterrestrial_radiation(day.date.ordinal(), latitude_deg);
    Ok(0.0023 * (day.temp_mean_c + 17.8) * spread.sqrt() * 0.408 * r_a)
}

/// Potential evapotranspiration for the full daily record.
pub fn hargreaves_daily(
    daily: &[DailySample],
    latitude_deg: f64,
) -> Result<Vec<f64>, AnalysisError> {
    daily.iter().map(|day| hargreaves(day, latitude_deg)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_radiation_matches_fao56_reference_value() {
        // FAO-56 example 8: 20°S on 3 September (day 246), R_a = 32.2.
        let r_a = extraterrestrial_radiation(246, -20.0);
        let relative_error = (r_a - 32.2).abs() / 32.2;
        assert!(
            relative_error < 0.01,
            "R_a = {r_a}, expected 32.2 within 1%"
        );
    }

    #[test]
    fn test_radiation_seasonal_asymmetry_by_hemisphere() {
        // Mid-northern summer beats mid-northern winter, and the
        // southern hemisphere mirrors it.
        let north_summer = extraterrestrial_radiation(172, 50.0);
        let north_winter = extraterrestrial_radiation(355, 50.0);
        assert!(north_summer > 2.0 * north_winter);

        let south_summer = extraterrestrial_radiation(355, -50.0);
        let south_winter = extraterrestrial_radiation(172, -50.0);
        assert!(south_summer > 2.0 * south_winter);
    }

    #[test]
    fn test_polar_night_saturates_to_zero_radiation() {
        // 80°N around the winter solstice: the clamp keeps the sunset
        // angle at zero instead of NaN.
        let r_a = extraterrestrial_radiation(355, 80.0);
        assert!(r_a.is_finite());
        assert!(r_a.abs() < 0.5, "polar night radiation ≈ 0, got {r_a}");
    }

    fn day(tmean: f64, tmax: f64, tmin: f64) -> DailySample {
        DailySample {
            date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            discharge_mm: 1.0,
            precip_mm: 0.0,
            temp_mean_c: tmean,
            temp_max_c: tmax,
            temp_min_c: tmin,
        }
    }

    #[test]
    fn test_hargreaves_zero_spread_means_zero_et() {
        let ep = hargreaves(&day(15.0, 15.0, 15.0), 50.0).unwrap();
        assert_eq!(ep, 0.0, "no diurnal spread, no ET estimate");
    }

    #[test]
    fn test_hargreaves_grows_with_temperature() {
        let cool = hargreaves(&day(10.0, 15.0, 5.0), 50.0).unwrap();
        let warm = hargreaves(&day(25.0, 30.0, 20.0), 50.0).unwrap();
        assert!(warm > cool, "warmer day must evaporate more: {warm} vs {cool}");
        assert!(cool > 0.0);
    }

    #[test]
    fn test_inverted_extrema_is_a_domain_error() {
        let result = hargreaves(&day(10.0, 5.0, 15.0), 50.0);
        assert!(matches!(result, Err(AnalysisError::Domain(_))));
    }
}
