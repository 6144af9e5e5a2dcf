//! # fractal-supply — Token emission schedule.
//!
//! Weekly emission decays exponentially with a fixed half-life until the
//! decay rate falls to the long-run inflation rate, after which supply
//! grows at constant inflation. Every value is a closed-form function of
//! the meeting time, so any meeting can be evaluated independently.
//!
//! - [`TokenSupplySchedule`] implements [`fractal_core::traits::SupplySchedule`].
//! - [`TokenSupplyPoint`] carries every derived scalar for one meeting.

pub mod params;
pub mod schedule;

pub use params::{SupplyParameters, SupplyReportingMode};
pub use schedule::{TokenSupplyPoint, TokenSupplySchedule};
