//! End-to-end pipeline orchestration.
//!
//! Stages run strictly forward: resample → smooth → extract recessions
//! → assign timesteps → estimate derivatives → bin → fit → integrate
//! storage → evapotranspiration → water balance. Each stage consumes
//! the complete, immutable output of its predecessor; nothing here
//! re-enters an earlier stage.

use crate::balance;
use crate::config::SiteConfig;
use crate::evapotranspiration;
use crate::logging::{self, Stage};
use crate::model::{AnalysisError, Bin, RawSeries, SensitivityModel, StorageRecord};
use crate::recession::{derivative, extract, timestep};
use crate::resample;
use crate::sensitivity::{binning, regression};
use crate::smoothing::{self, SMOOTHING_WINDOW_HOURS};
use crate::storage;

/// Everything the pipeline produces: the fitted sensitivity model, the
/// bins behind it, and the daily storage table.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub model: SensitivityModel,
    pub bins: Vec<Bin>,
    pub records: Vec<StorageRecord>,
}

/// Run the full storage estimation over a raw record.
pub fn run(raw: &RawSeries, config: &SiteConfig) -> Result<AnalysisOutput, AnalysisError> {
    let site = Some(config.site.name.as_str());

    let hourly = resample::resample_hourly(raw, config.site.catchment_area_m2)?;
    let daily = resample::resample_daily(&hourly)?;
    logging::info(
        Stage::Resample,
        site,
        &format!("{} hourly samples, {} daily samples", hourly.len(), daily.len()),
    );

    let smoothed = smoothing::trailing_mean(&hourly, SMOOTHING_WINDOW_HOURS);

    let groups = extract::extract_groups(&hourly, &smoothed, config.analysis.start_row)?;
    logging::info(
        Stage::Recession,
        site,
        &format!("{} recession groups extracted", groups.len()),
    );
    if groups.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "no recession groups found in the record".to_string(),
        ));
    }

    let sampled = timestep::assign_timesteps(groups, &smoothed)?;
    if sampled.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "every recession group was rejected at all timesteps".to_string(),
        ));
    }

    let points = derivative::estimate_derivatives(&sampled, &smoothed)?;
    logging::info(
        Stage::Recession,
        site,
        &format!("{} derivative points pooled from {} groups", points.len(), sampled.len()),
    );

    let bins = binning::bin_points(&points)?;
    let model = regression::fit_sensitivity(&bins)?;
    logging::info(
        Stage::Sensitivity,
        site,
        &format!(
            "fit over {} bins: p0={:.4} p1={:.4} p2={:.4} R²={:.4}",
            bins.len(),
            model.p0,
            model.p1,
            model.p2,
            model.r_squared
        ),
    );

    let daily_q: Vec<f64> = daily.iter().map(|d| d.discharge_mm).collect();
    let direct = storage::integrate_direct_storage(&daily_q, &model)?;
    let et = evapotranspiration::hargreaves_daily(&daily, config.site.latitude_deg)?;
    let records = balance::compute_water_balance(&daily, &direct, &et)?;
    logging::info(
        Stage::Storage,
        site,
        &format!("{} daily storage records computed", records.len()),
    );

    Ok(AnalysisOutput { model, bins, records })
}
