//! # fractal-smoothing — Weighted-mean Level algorithms.
//!
//! Every algorithm consumes a member's zero-filled Level series and yields
//! one uncertainty-carrying value per meeting:
//! - **RollingMean**: mean and sample standard deviation of the trailing
//!   window.
//! - **WeightedRollingMean**: the previous window's mean blended with the
//!   current raw Level.
//! - **WeightedRollingMeanWithHysteresis**: a single recursively updated
//!   value, reset to zero once a member has been absent for the attendance
//!   requirement.
//!
//! The first `W` meetings are always the progressive mean ramp-up.
//! [`SmoothedLevelSeries`] applies a smoother to every member of an
//! attendance table; [`uncertainty`] compares members' peer assessments.

pub mod hysteresis;
pub mod params;
pub mod rolling;
pub mod series;
pub mod uncertainty;

pub use hysteresis::WeightedRollingMeanWithHysteresis;
pub use params::{SeedUncertainty, SmoothingAlgorithm, SmoothingParameters};
pub use rolling::{RollingMean, WeightedRollingMean};
pub use series::{Pivot, SmoothedLevel, SmoothedLevelSeries};
pub use uncertainty::MeasurementUncertaintyEstimator;
