//! Recession-limb processing: extraction of rain-free declining
//! segments, per-segment differentiation timestep selection, and
//! derivative estimation.
//!
//! Sub-stages, in pipeline order:
//! - `extract` — scans the smoothed hourly record for recession rows
//!   and groups them.
//! - `timestep` — assigns each group the coarsest safe differentiation
//!   stride, dropping groups that stay too quiet at every stride.
//! - `derivative` — central-difference dQ/dt and log transforms per
//!   accepted group.

pub mod derivative;
pub mod extract;
pub mod timestep;
