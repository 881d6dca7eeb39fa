//! Sensitivity-function estimation: irregular binning of the pooled
//! recession points, then a weighted quadratic fit of log|dQ/dt|
//! against log Q.
//!
//! Sub-stages, in pipeline order:
//! - `binning` — greedy variable-width binning that stabilizes the fit
//!   against heteroscedastic scatter.
//! - `regression` — weighted least squares over the bin means,
//!   producing the `SensitivityModel`.

pub mod binning;
pub mod regression;
