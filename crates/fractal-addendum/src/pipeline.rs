//! The batch computation from one attendance table to every derived table.
//!
//! ```text
//! table -> SmoothedLevelSeries -> RespectAllocator (TokenSupplySchedule)
//!       -> Dataset (raw) -> Addendum1Constants -> Addendum1Dataset
//! ```

use serde::Serialize;
use tracing::info;

use fractal_core::dataset::{
    AttendanceCountSummary, Dataset, MemberSummary, NewAndReturning, TeamLeaderBoardEntry,
    TeamRespect,
};
use fractal_core::statistics::Statistics;
use fractal_core::types::AttendanceTable;
use fractal_core::FractalError;
use fractal_smoothing::uncertainty::MeasurementLeaderBoardEntry;
use fractal_smoothing::{MeasurementUncertaintyEstimator, Pivot, SmoothedLevel, SmoothedLevelSeries};
use fractal_supply::{TokenSupplyPoint, TokenSupplySchedule};

use crate::allocator::{RespectAllocation, RespectAllocator};
use crate::params::PipelineConfig;
use crate::reconciler::Addendum1Constants;
use crate::rewriter::{Addendum1Dataset, Addendum1Record, TokenDistribution};

/// Serializable aggregation of a [`Dataset`].
#[derive(Serialize, Clone, Debug)]
pub struct DatasetReport {
    pub total_member_respect: f64,
    pub total_team_respect: f64,
    pub total_respect: f64,
    pub total_unique_members: usize,
    pub total_meetings: usize,
    pub last_meeting_date: String,
    pub member_leader_board: Vec<MemberSummary>,
    pub team_leader_board: Vec<TeamLeaderBoardEntry>,
    pub level_by_attendance_count: Vec<AttendanceCountSummary>,
    pub new_and_returning_by_meeting: Vec<NewAndReturning>,
    pub team_respect_by_meeting: Vec<TeamRespect>,
    pub attendance_stats: Option<Statistics>,
    pub attendance_consistency_stats: Option<Statistics>,
    pub team_representation_stats: Option<Statistics>,
}

impl From<&Dataset> for DatasetReport {
    fn from(dataset: &Dataset) -> Self {
        Self {
            total_member_respect: dataset.total_member_respect(),
            total_team_respect: dataset.total_team_respect(),
            total_respect: dataset.total_respect(),
            total_unique_members: dataset.total_unique_members(),
            total_meetings: dataset.total_meetings(),
            last_meeting_date: dataset.last_meeting_date().to_string(),
            member_leader_board: dataset.member_leader_board().to_vec(),
            team_leader_board: dataset.team_leader_board().to_vec(),
            level_by_attendance_count: dataset.level_by_attendance_count().to_vec(),
            new_and_returning_by_meeting: dataset.new_and_returning_by_meeting().to_vec(),
            team_respect_by_meeting: dataset.team_respect_by_meeting().to_vec(),
            attendance_stats: dataset.attendance_stats(),
            attendance_consistency_stats: dataset.attendance_consistency_stats(),
            team_representation_stats: dataset.team_representation_stats(),
        }
    }
}

/// Every table derived from one attendance table.
#[derive(Serialize, Clone, Debug)]
pub struct PipelineOutput {
    pub token_supply: Vec<TokenSupplyPoint>,
    pub smoothed_levels: Vec<SmoothedLevel>,
    pub weighted_mean_level_pivot: Pivot,
    pub weighted_mean_respect_pivot: Pivot,
    pub allocation: RespectAllocation,
    pub addendum_1_constants: Addendum1Constants,
    pub addendum_1_records: Vec<Addendum1Record>,
    pub token_distribution: Vec<TokenDistribution>,
    pub raw_dataset: DatasetReport,
    pub addendum_1_dataset: DatasetReport,
    pub measurement_uncertainty: Vec<MeasurementLeaderBoardEntry>,
    pub measurement_uncertainty_with_self: Vec<MeasurementLeaderBoardEntry>,
}

pub fn run(table: &AttendanceTable, config: &PipelineConfig) -> Result<PipelineOutput, FractalError> {
    config.validate()?;
    let raw = Dataset::from_table(table)?;

    let schedule = TokenSupplySchedule::new(config.supply.clone())?;
    let token_supply = schedule.table(table.max_meeting_id())?;

    let smoothed = SmoothedLevelSeries::from_params(table, &config.smoothing)?;
    let allocator = RespectAllocator::new(config.allocation.clone());
    let allocation = allocator.allocate(table, &smoothed, &schedule)?;

    let constants = Addendum1Constants::compute(&raw, &schedule, &config.addendum)?;
    let addendum = Addendum1Dataset::build(
        table,
        &allocation,
        &constants,
        config.addendum.cutover_meeting_id,
    )?;

    let estimator = MeasurementUncertaintyEstimator::from_table(table);

    info!(
        members = smoothed.len(),
        meetings = table.max_meeting_id(),
        algorithm = %config.smoothing.algorithm,
        "pipeline complete"
    );

    Ok(PipelineOutput {
        token_supply,
        smoothed_levels: smoothed.rows().collect(),
        weighted_mean_level_pivot: smoothed.level_pivot(),
        weighted_mean_respect_pivot: smoothed.respect_pivot(&config.allocation.curve()),
        allocation,
        addendum_1_constants: constants,
        addendum_1_records: addendum.records().to_vec(),
        token_distribution: addendum.token_distribution().to_vec(),
        raw_dataset: DatasetReport::from(&raw),
        addendum_1_dataset: DatasetReport::from(addendum.dataset()),
        measurement_uncertainty: estimator.leader_board(&raw, false),
        measurement_uncertainty_with_self: estimator.leader_board(&raw, true),
    })
}
