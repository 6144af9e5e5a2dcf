//! The Addendum-1 reward table.
//!
//! Meetings before the cutover keep their discrete Respect, rescaled by the
//! pro-rata factor into tokens. From the cutover on, Respect is replaced by
//! the individual token award of the weighted-mean allocation. The two
//! halves are outer-joined on `(meeting, member)`.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use fractal_core::dataset::{Dataset, RewardRecord};
use fractal_core::types::{AttendanceTable, MeetingId, MemberId, TeamId};
use fractal_core::FractalError;

use crate::allocator::RespectAllocation;
use crate::reconciler::Addendum1Constants;

/// Where the `respect` of an [`Addendum1Record`] comes from.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RespectSource {
    ProRata,
    TokenAward,
}

/// One `(meeting, member)` row of the merged table.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Addendum1Record {
    pub meeting_id: MeetingId,
    pub member_id: MemberId,
    pub team_id: Option<TeamId>,
    /// Summed over rounds; `None` for rows without a Level.
    pub level: Option<u32>,
    pub group: Option<u32>,
    /// Discrete Respect of the raw rows.
    pub raw_respect: Option<f64>,
    /// Zero from the cutover on.
    pub respect_pro_rata: Option<f64>,
    pub tokens_individual: Option<f64>,
    pub tokens_team: Option<f64>,
    pub respect: Option<f64>,
    pub source: RespectSource,
}

/// Tokens minted for each pool at one meeting from the cutover on.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct TokenDistribution {
    pub meeting_id: MeetingId,
    pub tokens_individual: f64,
    pub tokens_team: f64,
}

#[derive(Default)]
struct RawRow {
    level: Option<u32>,
    group: Option<u32>,
    team_id: Option<TeamId>,
    raw_respect: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct Addendum1Dataset {
    records: Vec<Addendum1Record>,
    token_distribution: Vec<TokenDistribution>,
    dataset: Dataset,
}

impl Addendum1Dataset {
    pub fn build(
        table: &AttendanceTable,
        allocation: &RespectAllocation,
        constants: &Addendum1Constants,
        cutover_meeting_id: MeetingId,
    ) -> Result<Self, FractalError> {
        let raw = raw_rows(table)?;

        let mut tokens: BTreeMap<(MeetingId, MemberId), (f64, Option<f64>)> = BTreeMap::new();
        for award in allocation
            .awards()
            .iter()
            .filter(|a| a.meeting_id >= cutover_meeting_id)
        {
            tokens.insert(
                (award.meeting_id, award.member_id.clone()),
                (
                    award.tokens_individual.nominal(),
                    award.tokens_team.as_ref().map(|t| t.nominal()),
                ),
            );
        }

        let mut keys: Vec<(MeetingId, MemberId)> = raw.keys().chain(tokens.keys()).cloned().collect();
        keys.sort();
        keys.dedup();

        let records: Vec<Addendum1Record> = keys
            .into_iter()
            .map(|key| {
                let row = raw.get(&key);
                let (tokens_individual, tokens_team) = match tokens.get(&key) {
                    Some((individual, team)) => (Some(*individual), *team),
                    None => (None, None),
                };
                let (meeting_id, member_id) = key;
                let level = row.and_then(|r| r.level);
                let group = row.and_then(|r| r.group);
                let raw_respect = row.and_then(|r| r.raw_respect);
                let respect_pro_rata = if meeting_id >= cutover_meeting_id {
                    Some(0.0)
                } else {
                    raw_respect.map(|r| r * constants.pro_rata_respect)
                };
                let (respect, source) = match tokens_individual {
                    Some(tokens) if level.is_some() || group.is_none() => {
                        (Some(tokens), RespectSource::TokenAward)
                    }
                    _ => (respect_pro_rata, RespectSource::ProRata),
                };
                Addendum1Record {
                    meeting_id,
                    member_id,
                    team_id: row.and_then(|r| r.team_id.clone()),
                    level,
                    group,
                    raw_respect,
                    respect_pro_rata,
                    tokens_individual,
                    tokens_team,
                    respect,
                    source,
                }
            })
            .collect();

        let mut distribution: BTreeMap<MeetingId, TokenDistribution> = BTreeMap::new();
        for ((meeting_id, _), (individual, team)) in &tokens {
            let entry = distribution.entry(*meeting_id).or_insert(TokenDistribution {
                meeting_id: *meeting_id,
                tokens_individual: 0.0,
                tokens_team: 0.0,
            });
            entry.tokens_individual += individual;
            entry.tokens_team += team.unwrap_or(0.0);
        }

        let dataset = Dataset::from_rewards(records.iter().map(Addendum1Record::to_reward).collect())?;
        debug!(
            rows = records.len(),
            pro_rata_rows = records.iter().filter(|r| r.source == RespectSource::ProRata).count(),
            "addendum 1 dataset"
        );

        Ok(Self {
            records,
            token_distribution: distribution.into_values().collect(),
            dataset,
        })
    }

    /// Ordered by meeting, then member.
    pub fn records(&self) -> &[Addendum1Record] {
        &self.records
    }

    pub fn record(&self, meeting_id: MeetingId, member_id: &MemberId) -> Option<&Addendum1Record> {
        self.records
            .iter()
            .find(|r| r.meeting_id == meeting_id && &r.member_id == member_id)
    }

    pub fn token_distribution(&self) -> &[TokenDistribution] {
        &self.token_distribution
    }

    /// Aggregations over the merged table.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

impl Addendum1Record {
    fn to_reward(&self) -> RewardRecord {
        RewardRecord {
            meeting_id: self.meeting_id,
            member_id: self.member_id.clone(),
            team_id: self.team_id.clone(),
            level: self.level,
            group: self.group,
            respect: self.respect,
        }
    }
}

fn raw_rows(table: &AttendanceTable) -> Result<BTreeMap<(MeetingId, MemberId), RawRow>, FractalError> {
    let raw_dataset = Dataset::from_table(table)?;
    let mut rows: BTreeMap<(MeetingId, MemberId), RawRow> = BTreeMap::new();
    for record in raw_dataset.records() {
        let row = rows
            .entry((record.meeting_id, record.member_id.clone()))
            .or_default();
        if let Some(level) = record.level {
            row.level = Some(row.level.unwrap_or(0) + level);
        }
        if let Some(respect) = record.respect {
            row.raw_respect = Some(row.raw_respect.unwrap_or(0.0) + respect);
        }
        if row.group.is_none() {
            row.group = record.group;
        }
        if row.team_id.is_none() {
            row.team_id = record.team_id.clone();
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::RespectAllocator;
    use crate::params::Addendum1Parameters;
    use fractal_core::traits::SupplySchedule;
    use fractal_core::types::AttendanceRecord;
    use fractal_core::DomainError;
    use fractal_smoothing::{SmoothedLevelSeries, SmoothingParameters};

    struct FlatSchedule;

    impl SupplySchedule for FlatSchedule {
        fn token_integral(&self, _time: f64) -> Result<f64, DomainError> {
            Ok(100.0)
        }

        fn token_supply(&self, time: f64) -> Result<f64, DomainError> {
            Ok(100.0 * time)
        }
    }

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

    const CUTOVER: MeetingId = 4;

    fn build(table: &AttendanceTable) -> Addendum1Dataset {
        let params = SmoothingParameters { window_size: 2, ..Default::default() };
        let smoothed = SmoothedLevelSeries::from_params(table, &params).unwrap();
        let allocation = RespectAllocator::default()
            .allocate(table, &smoothed, &FlatSchedule)
            .unwrap();
        let addendum = Addendum1Parameters {
            cutover_meeting_id: CUTOVER,
            ..Default::default()
        };
        let raw = Dataset::from_table(table).unwrap();
        let constants = Addendum1Constants::compute(&raw, &FlatSchedule, &addendum).unwrap();
        Addendum1Dataset::build(table, &allocation, &constants, CUTOVER).unwrap()
    }

    fn table() -> AttendanceTable {
        AttendanceTable::new(vec![
            record("alice", 1, Some(3), None),
            record("bob", 1, Some(2), None),
            record("alice", 2, Some(4), None),
            record("alice", 4, Some(5), None),
            record("bob", 5, Some(2), None),
            // team roster row without a Level
            record("bob", 4, None, Some("green")),
        ])
        .unwrap()
    }

    #[test]
    fn pre_cutover_rows_are_pro_rata() {
        let merged = build(&table());
        // Supply before meeting 4 is 300, raw total is 5 + 3 + 8 = 16.
        let alice = merged.record(2, &"alice".into()).unwrap();
        assert_eq!(alice.source, RespectSource::ProRata);
        assert!((alice.respect.unwrap() - 8.0 * 300.0 / 16.0).abs() < 1e-9);
        assert!(alice.tokens_individual.is_none());
    }

    #[test]
    fn post_cutover_rows_are_token_awards() {
        let merged = build(&table());
        let alice = merged.record(4, &"alice".into()).unwrap();
        assert_eq!(alice.source, RespectSource::TokenAward);
        assert_eq!(alice.respect, alice.tokens_individual);
        assert_eq!(alice.respect_pro_rata, Some(0.0));

        // Roster row without a Level or group still takes the token award.
        let bob = merged.record(4, &"bob".into()).unwrap();
        assert_eq!(bob.level, None);
        assert_eq!(bob.team_id, Some(TeamId::from("green")));
        assert_eq!(bob.source, RespectSource::TokenAward);
        assert!(bob.tokens_team.is_some());
    }

    #[test]
    fn award_only_rows_are_joined() {
        let merged = build(&table());
        // alice did not attend meeting 5 but still holds a weighted mean.
        let alice = merged.record(5, &"alice".into()).unwrap();
        assert_eq!(alice.level, None);
        assert_eq!(alice.raw_respect, None);
        assert_eq!(alice.source, RespectSource::TokenAward);
        // No rows before the cutover come from the allocation alone.
        assert!(merged.record(3, &"alice".into()).is_none());
    }

    #[test]
    fn token_distribution_matches_emission() {
        let merged = build(&table());
        let distribution = merged.token_distribution();
        assert_eq!(
            distribution.iter().map(|d| d.meeting_id).collect::<Vec<_>>(),
            vec![4, 5]
        );
        for d in distribution {
            assert!((d.tokens_individual + d.tokens_team - 100.0).abs() < 1e-9);
        }
        assert_eq!(distribution[1].tokens_team, 0.0);
    }

    #[test]
    fn merged_dataset_totals() {
        let merged = build(&table());
        let expected: f64 = merged.records().iter().filter_map(|r| r.respect).sum();
        assert!((merged.dataset().total_member_respect() - expected).abs() < 1e-9);
        assert_eq!(merged.dataset().total_unique_members(), 2);
    }
}
