//! Conversion of Respect earned before the Addendum-1 cutover into tokens.
//!
//! Everything minted up to the meeting before the cutover is shared pro rata
//! over the discrete Respect earned in those meetings, individual and team
//! alike.

use serde::Serialize;
use tracing::info;

use fractal_core::dataset::Dataset;
use fractal_core::traits::SupplySchedule;
use fractal_core::{DataIntegrityError, FractalError};

use crate::params::Addendum1Parameters;

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Addendum1Constants {
    pub total_respect_individual: f64,
    pub total_respect_team: f64,
    pub total_respect: f64,
    pub token_supply: f64,
    pub token_supply_individual: f64,
    pub token_supply_team: f64,
    /// Tokens per unit of Respect earned before the cutover.
    pub pro_rata_respect: f64,
}

impl Addendum1Constants {
    pub fn compute(
        dataset: &Dataset,
        schedule: &dyn SupplySchedule,
        params: &Addendum1Parameters,
    ) -> Result<Self, FractalError> {
        let cutover = params.cutover_meeting_id;

        let total_respect_individual = match params.total_respect_individual_override {
            Some(total) => total,
            None => dataset
                .new_and_returning_by_meeting()
                .iter()
                .filter(|row| row.meeting_id < cutover)
                .map(|row| row.accumulated_respect)
                .sum(),
        };
        let total_respect_team = match params.total_respect_team_override {
            Some(total) => total,
            None => dataset
                .team_respect_by_meeting()
                .iter()
                .filter(|row| row.meeting_id < cutover)
                .map(|row| row.accumulated_respect)
                .sum(),
        };

        let total_respect = total_respect_individual + total_respect_team;
        if total_respect == 0.0 {
            return Err(DataIntegrityError::ZeroRespectBeforeCutover(cutover).into());
        }

        let token_supply = schedule.token_supply(f64::from(cutover - 1))?;
        let constants = Self {
            total_respect_individual,
            total_respect_team,
            total_respect,
            token_supply,
            token_supply_individual: total_respect_individual / total_respect * token_supply,
            token_supply_team: total_respect_team / total_respect * token_supply,
            pro_rata_respect: token_supply / total_respect,
        };
        info!(
            cutover,
            total_respect,
            token_supply,
            pro_rata_respect = constants.pro_rata_respect,
            "addendum 1 constants"
        );
        Ok(constants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractal_core::types::{AttendanceRecord, AttendanceTable, MeetingId, TeamId};
    use fractal_supply::TokenSupplySchedule;

    fn record(member: &str, meeting_id: MeetingId, level: Option<u32>, team: Option<&str>) -> AttendanceRecord {
        AttendanceRecord {
            member_id: member.into(),
            meeting_id,
            level,
            group: level.map(|_| 1),
            team_id: team.map(TeamId::from),
            signature_on_file: true,
        }
    }

    fn dataset() -> Dataset {
        let table = AttendanceTable::new(vec![
            record("alice", 1, Some(6), Some("blue")),
            record("bob", 1, Some(1), None),
            record("alice", 22, Some(3), Some("blue")),
            record("alice", 23, Some(6), Some("blue")),
            record("bob", 24, Some(2), None),
        ])
        .unwrap();
        Dataset::from_table(&table).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * b.abs().max(1.0)
    }

    #[test]
    fn totals_before_cutover() {
        let constants = Addendum1Constants::compute(
            &dataset(),
            &TokenSupplySchedule::default(),
            &Addendum1Parameters::default(),
        )
        .unwrap();
        // fib(8) + fib(3) + fib(5), then alice's team rows before meeting 23
        assert_eq!(constants.total_respect_individual, 21.0 + 2.0 + 5.0);
        assert_eq!(constants.total_respect_team, 21.0 + 5.0);
        assert!(close(constants.token_supply, 19067701.085571293));
        assert!(close(
            constants.token_supply_individual + constants.token_supply_team,
            constants.token_supply
        ));
    }

    #[test]
    fn overrides_reproduce_published_values() {
        let schedule = TokenSupplySchedule::default();
        let published = Addendum1Parameters {
            total_respect_individual_override: Some(7022.0),
            total_respect_team_override: Some(2928.0),
            ..Default::default()
        };
        let constants = Addendum1Constants::compute(&dataset(), &schedule, &published).unwrap();
        assert_eq!(constants.total_respect, 9950.0);
        assert!(close(constants.pro_rata_respect, 1916.3518678966124));
        assert!(close(constants.token_supply_individual, 13456622.816370012));
        assert!(close(constants.token_supply_team, 5611078.269201282));

        let corrected = Addendum1Parameters {
            total_respect_individual_override: Some(7035.0),
            ..published
        };
        let constants = Addendum1Constants::compute(&dataset(), &schedule, &corrected).unwrap();
        assert!(close(constants.pro_rata_respect, 1913.851358583889));
        assert!(close(constants.token_supply_individual, 13463944.307637664));
        assert!(close(constants.token_supply_team, 5603756.777933629));
    }

    #[test]
    fn zero_total_is_an_error() {
        let params = Addendum1Parameters {
            total_respect_individual_override: Some(0.0),
            total_respect_team_override: Some(0.0),
            ..Default::default()
        };
        let err = Addendum1Constants::compute(&dataset(), &TokenSupplySchedule::default(), &params)
            .unwrap_err();
        assert_eq!(err, FractalError::DataIntegrity(DataIntegrityError::ZeroRespectBeforeCutover(23)));
    }
}
