//! Integration test suite for the Fractal Governance engine.
//!
//! Tests here run whole attendance tables through several crates at once:
//! smoothing, allocation, the pro-rata constants and the merged Addendum-1
//! table.

pub mod helpers;
