//! # fractal-addendum — Respect allocation and the Addendum-1 reward table.
//!
//! - [`allocator`]: smoothed Level -> weighted-mean Respect -> per-meeting
//!   fractions -> token awards for the individual and team pools.
//! - [`reconciler`]: the frozen constants that convert Respect earned before
//!   the cutover meeting into tokens.
//! - [`rewriter`]: the unified reward table (pro-rata before the cutover,
//!   token awards from it on) and its downstream aggregation.
//! - [`pipeline`]: the whole batch computation from one attendance table.
//!
//! A meeting whose team members all carry zero weighted-mean Respect (e.g.
//! a long-absent or unsigned member still on a team roster) fails with
//! [`DataIntegrityError::ZeroTeamRespect`] naming the meeting and the team
//! members, rather than producing undefined team fractions. Only the empty
//! individual pool is a [`DataIntegrityError::ZeroRespectTotal`].
//!
//! [`DataIntegrityError::ZeroTeamRespect`]: fractal_core::DataIntegrityError::ZeroTeamRespect
//! [`DataIntegrityError::ZeroRespectTotal`]: fractal_core::DataIntegrityError::ZeroRespectTotal

pub mod allocator;
pub mod params;
pub mod pipeline;
pub mod reconciler;
pub mod rewriter;

pub use allocator::{MeetingAllocation, RespectAllocation, RespectAllocator, RespectAward};
pub use params::{Addendum1Parameters, AllocationParameters, PipelineConfig};
pub use pipeline::{run, DatasetReport, PipelineOutput};
pub use reconciler::Addendum1Constants;
pub use rewriter::{Addendum1Dataset, Addendum1Record, RespectSource, TokenDistribution};
