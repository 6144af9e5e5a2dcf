//! Aggregations over a reward table: totals, leaderboards, new vs returning
//! members, attendance and team statistics.
//!
//! A [`Dataset`] is built either from the raw attendance table (Respect is
//! the discrete Fibonacci value of each Level) or from any other reward
//! table such as the merged Addendum-1 table. All derived tables are
//! computed once at construction.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{DataIntegrityError, DomainError, FractalError};
use crate::respect::discrete_respect;
use crate::statistics::{
    combined_mean, combined_standard_deviation, mean, sample_std_dev, GroupSummary, Statistics,
};
use crate::timeline::meeting_id_to_date;
use crate::types::{AttendanceTable, MeetingId, MemberId, TeamId};

/// One row of a reward table.
///
/// `respect` is `None` for rows that earn nothing in this table's basis,
/// e.g. a team-roster row without a Level.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RewardRecord {
    pub meeting_id: MeetingId,
    pub member_id: MemberId,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub group: Option<u32>,
    #[serde(default)]
    pub respect: Option<f64>,
}

impl RewardRecord {
    pub fn attended(&self) -> bool {
        self.level.is_some()
    }

    fn respect_or_zero(&self) -> f64 {
        self.respect.unwrap_or(0.0)
    }
}

/// Per-member aggregate over every row of the member.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MemberSummary {
    pub member_id: MemberId,
    pub attendance_count: usize,
    pub accumulated_level: u64,
    pub accumulated_respect: f64,
    /// Mean Level over attended rows; `NaN` without any.
    pub mean: f64,
    /// Sample standard deviation of Level; `NaN` below two attended rows.
    pub standard_deviation: f64,
}

/// Combined Level statistics of all members sharing an attendance count.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct AttendanceCountSummary {
    pub attendance_count: usize,
    pub mean: f64,
    pub standard_deviation: f64,
}

/// Respect and attendance of one meeting split into new and returning
/// members. A member is new at a meeting when they have no attended row at
/// any earlier meeting.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct NewAndReturning {
    pub meeting_id: MeetingId,
    pub meeting_date: NaiveDate,
    pub accumulated_respect: f64,
    pub accumulated_respect_new_member: f64,
    pub accumulated_respect_returning_member: f64,
    pub new_member_count: usize,
    pub returning_member_count: usize,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TeamRespect {
    pub team_id: TeamId,
    pub meeting_id: MeetingId,
    pub accumulated_respect: f64,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TeamLeaderBoardEntry {
    pub team_id: TeamId,
    pub accumulated_respect: f64,
}

/// Aggregated view of a reward table.
#[derive(Clone, Debug)]
pub struct Dataset {
    records: Vec<RewardRecord>,
    min_meeting_id: MeetingId,
    max_meeting_id: MeetingId,
    last_meeting_date: NaiveDate,
    member_summaries: BTreeMap<MemberId, MemberSummary>,
    member_leader_board: Vec<MemberSummary>,
    level_by_attendance_count: Vec<AttendanceCountSummary>,
    new_and_returning_by_meeting: Vec<NewAndReturning>,
    team_respect_by_meeting: Vec<TeamRespect>,
    team_representation_by_meeting: BTreeMap<MeetingId, f64>,
    team_leader_board: Vec<TeamLeaderBoardEntry>,
}

impl Dataset {
    /// Reward table of the raw attendance data: Respect is
    /// `discrete_respect(level)` on attended rows.
    pub fn from_table(table: &AttendanceTable) -> Result<Self, FractalError> {
        let records = table
            .records()
            .iter()
            .map(|r| {
                let respect = r
                    .level
                    .map(|level| discrete_respect(i64::from(level)).map(|v| v as f64))
                    .transpose()?;
                Ok(RewardRecord {
                    meeting_id: r.meeting_id,
                    member_id: r.member_id.clone(),
                    team_id: r.team_id.clone(),
                    level: r.level,
                    group: r.group,
                    respect,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        Self::from_rewards(records)
    }

    /// Aggregate an arbitrary reward table.
    pub fn from_rewards(records: Vec<RewardRecord>) -> Result<Self, FractalError> {
        let min_meeting_id = records
            .iter()
            .map(|r| r.meeting_id)
            .min()
            .ok_or(DataIntegrityError::EmptyTable)?;
        let max_meeting_id = records.iter().map(|r| r.meeting_id).max().unwrap_or(min_meeting_id);
        if min_meeting_id == 0 {
            return Err(DomainError::MeetingIdBelowOne(0).into());
        }
        let last_meeting_date = meeting_id_to_date(i64::from(max_meeting_id))?;

        let member_summaries = member_summaries(&records);
        let mut member_leader_board: Vec<MemberSummary> = member_summaries.values().cloned().collect();
        member_leader_board.sort_by(|a, b| {
            b.accumulated_level
                .cmp(&a.accumulated_level)
                .then(b.attendance_count.cmp(&a.attendance_count))
                .then(a.member_id.cmp(&b.member_id))
        });

        let level_by_attendance_count = level_by_attendance_count(&member_summaries);
        let new_and_returning_by_meeting = new_and_returning_by_meeting(&records)?;
        let team_respect_by_meeting = team_respect_by_meeting(&records);
        let team_representation_by_meeting = team_representation_by_meeting(&records);

        let mut team_totals: BTreeMap<&TeamId, f64> = BTreeMap::new();
        for row in &team_respect_by_meeting {
            *team_totals.entry(&row.team_id).or_default() += row.accumulated_respect;
        }
        let mut team_leader_board: Vec<TeamLeaderBoardEntry> = team_totals
            .into_iter()
            .map(|(team_id, accumulated_respect)| TeamLeaderBoardEntry {
                team_id: team_id.clone(),
                accumulated_respect,
            })
            .collect();
        team_leader_board.sort_by_key(|e| Reverse(OrderedFloat(e.accumulated_respect)));

        Ok(Self {
            records,
            min_meeting_id,
            max_meeting_id,
            last_meeting_date,
            member_summaries,
            member_leader_board,
            level_by_attendance_count,
            new_and_returning_by_meeting,
            team_respect_by_meeting,
            team_representation_by_meeting,
            team_leader_board,
        })
    }

    pub fn records(&self) -> &[RewardRecord] {
        &self.records
    }

    /// Respect earned by individual members over every row.
    pub fn total_member_respect(&self) -> f64 {
        self.records.iter().map(RewardRecord::respect_or_zero).sum()
    }

    /// Respect earned by rows that carry a team.
    pub fn total_team_respect(&self) -> f64 {
        self.team_respect_by_meeting.iter().map(|r| r.accumulated_respect).sum()
    }

    pub fn total_respect(&self) -> f64 {
        self.total_member_respect() + self.total_team_respect()
    }

    pub fn total_unique_members(&self) -> usize {
        self.member_leader_board.len()
    }

    /// Number of distinct meetings with at least one row.
    pub fn total_meetings(&self) -> usize {
        self.records.iter().map(|r| r.meeting_id).collect::<BTreeSet<_>>().len()
    }

    pub fn last_meeting_date(&self) -> NaiveDate {
        self.last_meeting_date
    }

    pub fn member_summary(&self, member_id: &MemberId) -> Option<&MemberSummary> {
        self.member_summaries.get(member_id)
    }

    /// Members by accumulated Level desc, attendance count desc, id asc.
    pub fn member_leader_board(&self) -> &[MemberSummary] {
        &self.member_leader_board
    }

    pub fn level_by_attendance_count(&self) -> &[AttendanceCountSummary] {
        &self.level_by_attendance_count
    }

    pub fn new_and_returning_by_meeting(&self) -> &[NewAndReturning] {
        &self.new_and_returning_by_meeting
    }

    pub fn team_respect_by_meeting(&self) -> &[TeamRespect] {
        &self.team_respect_by_meeting
    }

    /// Fraction of attended rows that carry a team, per meeting.
    pub fn team_representation_by_meeting(&self) -> &BTreeMap<MeetingId, f64> {
        &self.team_representation_by_meeting
    }

    /// Teams by accumulated Respect desc.
    pub fn team_leader_board(&self) -> &[TeamLeaderBoardEntry] {
        &self.team_leader_board
    }

    /// Attendees per meeting.
    pub fn attendance_stats(&self) -> Option<Statistics> {
        let mut per_meeting: BTreeMap<MeetingId, usize> = BTreeMap::new();
        for r in self.records.iter().filter(|r| r.attended()) {
            *per_meeting.entry(r.meeting_id).or_default() += 1;
        }
        let sizes: Vec<f64> = per_meeting.values().map(|n| *n as f64).collect();
        Statistics::from_samples(&sizes)
    }

    /// Meetings attended per member.
    pub fn attendance_consistency_stats(&self) -> Option<Statistics> {
        let counts: Vec<f64> = self
            .member_leader_board
            .iter()
            .map(|m| m.attendance_count as f64)
            .collect();
        Statistics::from_samples(&counts)
    }

    pub fn team_representation_stats(&self) -> Option<Statistics> {
        let fractions: Vec<f64> = self.team_representation_by_meeting.values().copied().collect();
        Statistics::from_samples(&fractions)
    }

    /// Rows of a meeting whose member has no row at an earlier meeting.
    pub fn new_members_at(&self, meeting_id: MeetingId) -> Result<Vec<&RewardRecord>, DomainError> {
        Ok(self.split_members_at(meeting_id)?.0)
    }

    /// Rows of a meeting whose member has a row at an earlier meeting.
    pub fn returning_members_at(
        &self,
        meeting_id: MeetingId,
    ) -> Result<Vec<&RewardRecord>, DomainError> {
        Ok(self.split_members_at(meeting_id)?.1)
    }

    fn split_members_at(
        &self,
        meeting_id: MeetingId,
    ) -> Result<(Vec<&RewardRecord>, Vec<&RewardRecord>), DomainError> {
        if !(self.min_meeting_id..=self.max_meeting_id).contains(&meeting_id) {
            return Err(DomainError::MeetingOutOfRange {
                meeting_id,
                min: self.min_meeting_id,
                max: self.max_meeting_id,
            });
        }
        let previous: BTreeSet<&MemberId> = self
            .records
            .iter()
            .filter(|r| r.meeting_id < meeting_id)
            .map(|r| &r.member_id)
            .collect();
        Ok(self
            .records
            .iter()
            .filter(|r| r.meeting_id == meeting_id)
            .partition(|r| !previous.contains(&r.member_id)))
    }
}

fn member_summaries(records: &[RewardRecord]) -> BTreeMap<MemberId, MemberSummary> {
    let mut levels: BTreeMap<&MemberId, (Vec<f64>, f64)> = BTreeMap::new();
    for r in records {
        let (member_levels, respect) = levels.entry(&r.member_id).or_default();
        if let Some(level) = r.level {
            member_levels.push(f64::from(level));
        }
        *respect += r.respect_or_zero();
    }
    levels
        .into_iter()
        .map(|(member_id, (member_levels, accumulated_respect))| {
            let summary = MemberSummary {
                member_id: member_id.clone(),
                attendance_count: member_levels.len(),
                accumulated_level: member_levels.iter().map(|l| *l as u64).sum(),
                accumulated_respect,
                mean: mean(&member_levels).unwrap_or(f64::NAN),
                standard_deviation: sample_std_dev(&member_levels).unwrap_or(f64::NAN),
            };
            (member_id.clone(), summary)
        })
        .collect()
}

fn level_by_attendance_count(
    summaries: &BTreeMap<MemberId, MemberSummary>,
) -> Vec<AttendanceCountSummary> {
    let mut groups: BTreeMap<usize, Vec<GroupSummary>> = BTreeMap::new();
    for s in summaries.values() {
        groups.entry(s.attendance_count).or_default().push(GroupSummary {
            count: s.attendance_count,
            mean: s.mean,
            standard_deviation: s.standard_deviation,
        });
    }
    groups
        .into_iter()
        .filter_map(|(attendance_count, group)| {
            Some(AttendanceCountSummary {
                attendance_count,
                mean: combined_mean(&group)?,
                standard_deviation: combined_standard_deviation(&group).unwrap_or(f64::NAN),
            })
        })
        .collect()
}

fn new_and_returning_by_meeting(
    records: &[RewardRecord],
) -> Result<Vec<NewAndReturning>, DomainError> {
    let mut by_meeting: BTreeMap<MeetingId, Vec<&RewardRecord>> = BTreeMap::new();
    for r in records.iter().filter(|r| r.attended()) {
        by_meeting.entry(r.meeting_id).or_default().push(r);
    }
    let mut seen: BTreeSet<&MemberId> = BTreeSet::new();
    let mut rows = Vec::with_capacity(by_meeting.len());
    for (meeting_id, attendees) in by_meeting {
        let mut row = NewAndReturning {
            meeting_id,
            meeting_date: meeting_id_to_date(i64::from(meeting_id))?,
            accumulated_respect: 0.0,
            accumulated_respect_new_member: 0.0,
            accumulated_respect_returning_member: 0.0,
            new_member_count: 0,
            returning_member_count: 0,
        };
        for r in &attendees {
            let respect = r.respect_or_zero();
            row.accumulated_respect += respect;
            if seen.contains(&r.member_id) {
                row.accumulated_respect_returning_member += respect;
                row.returning_member_count += 1;
            } else {
                row.accumulated_respect_new_member += respect;
                row.new_member_count += 1;
            }
        }
        seen.extend(attendees.iter().map(|r| &r.member_id));
        rows.push(row);
    }
    Ok(rows)
}

fn team_respect_by_meeting(records: &[RewardRecord]) -> Vec<TeamRespect> {
    let mut sums: BTreeMap<(&TeamId, MeetingId), f64> = BTreeMap::new();
    for r in records {
        if let Some(team_id) = &r.team_id {
            *sums.entry((team_id, r.meeting_id)).or_default() += r.respect_or_zero();
        }
    }
    sums.into_iter()
        .map(|((team_id, meeting_id), accumulated_respect)| TeamRespect {
            team_id: team_id.clone(),
            meeting_id,
            accumulated_respect,
        })
        .collect()
}

fn team_representation_by_meeting(records: &[RewardRecord]) -> BTreeMap<MeetingId, f64> {
    let mut counts: BTreeMap<MeetingId, (usize, usize)> = BTreeMap::new();
    for r in records.iter().filter(|r| r.attended()) {
        let (with_team, total) = counts.entry(r.meeting_id).or_default();
        *total += 1;
        if r.team_id.is_some() {
            *with_team += 1;
        }
    }
    counts
        .into_iter()
        .map(|(meeting_id, (with_team, total))| (meeting_id, with_team as f64 / total as f64))
        .collect()
}
