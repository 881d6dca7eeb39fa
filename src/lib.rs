//! Watershed dynamic storage estimation from hourly precipitation,
//! discharge, and temperature records.
//!
//! The core of the crate is the recession-limb pipeline: rain-free
//! declining-discharge segments are isolated from the smoothed hourly
//! record, differentiated at an adaptively chosen timestep, pooled and
//! binned in (log Q, log |dQ/dt|) space, and fit with a weighted
//! quadratic to give the catchment's sensitivity function g(Q).
//! Integrating ΔQ / g(Q) over the daily record yields direct storage;
//! a daily water balance against precipitation and Hargreaves
//! evapotranspiration yields the indirect and total components.
//!
//! The crate is pure batch computation: no network, no persistence.
//! Raw-record ingestion and result export belong to the surrounding
//! application layer.

pub mod balance;
pub mod config;
pub mod evapotranspiration;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod recession;
pub mod resample;
pub mod sensitivity;
pub mod smoothing;
pub mod storage;

pub use config::{load_config, SiteConfig};
pub use model::{
    AnalysisError, Bin, DailySample, DerivativePoint, HourlySample, RawSeries, Reading,
    RecessionGroup, SampledGroup, SensitivityModel, StorageRecord,
};
pub use pipeline::{run, AnalysisOutput};
