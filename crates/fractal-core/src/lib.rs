//! # fractal-core
//! Foundation types and traits for Fractal Governance reward computation.
//!
//! - **Data model**: [`types::AttendanceRecord`] and the validated, immutable
//!   [`types::AttendanceTable`] every derived table is computed from.
//! - **Respect curves**: the integer Fibonacci curve for raw Levels and the
//!   Binet-formula curve for smoothed Levels ([`respect`]).
//! - **Uncertainty arithmetic**: [`uncertain::Uncertain`] carries a nominal
//!   value and first-order error terms through every smoothing and Respect
//!   computation.
//! - **Seams**: [`traits::SupplySchedule`] and [`traits::LevelSmoother`] are
//!   implemented by `fractal-supply` and `fractal-smoothing`.

pub mod constants;
pub mod dataset;
pub mod error;
pub mod respect;
pub mod statistics;
pub mod timeline;
pub mod traits;
pub mod types;
pub mod uncertain;

pub use error::{DataIntegrityError, DomainError, FractalError};
pub use uncertain::Uncertain;
