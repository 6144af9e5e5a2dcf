//! Per-meeting token allocation from weighted-mean Respect.
//!
//! Every member with a Level series receives a weighted-mean Respect at
//! every meeting. Each meeting's token emission is split over two pools:
//! every member (individual pool) and members on a team (team pool, where a
//! member's Respect counts a second time).
//!
//! ```text
//! total            = sum_individual + sum_team
//! tokens_individual = token_integral * respect / total
//! tokens_team       = token_integral * respect / total      (team rows only)
//! ```
//!
//! All quantities carry their uncertainty. A meeting with a team roster but
//! zero team Respect is an error, as is a meeting with zero individual
//! Respect.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use fractal_core::respect::discrete_respect;
use fractal_core::traits::SupplySchedule;
use fractal_core::types::{AttendanceTable, MeetingId, MemberId, TeamId};
use fractal_core::{DataIntegrityError, DomainError, FractalError, Uncertain};
use fractal_smoothing::SmoothedLevelSeries;

use crate::params::AllocationParameters;

/// Allocation of one member at one meeting.
#[derive(Serialize, Clone, Debug)]
pub struct RespectAward {
    pub member_id: MemberId,
    pub meeting_id: MeetingId,
    pub weighted_mean_level: Uncertain,
    /// After clamping.
    pub weighted_mean_respect: Uncertain,
    /// Discrete Respect summed over the member's rounds; `None` when absent.
    pub respect: Option<f64>,
    pub signature_on_file: bool,
    pub team_id: Option<TeamId>,
    /// Share of the meeting's individual pool.
    pub individual_fraction: Uncertain,
    /// Share of the meeting's team pool; `None` without a team.
    pub team_fraction: Option<Uncertain>,
    pub tokens_individual: Uncertain,
    pub tokens_team: Option<Uncertain>,
}

/// Pool totals of one meeting.
#[derive(Serialize, Clone, Debug)]
pub struct MeetingAllocation {
    pub meeting_id: MeetingId,
    pub token_integral: f64,
    pub individual_respect: Uncertain,
    pub team_respect: Uncertain,
    /// `individual / (individual + team)`.
    pub individual_split: Uncertain,
    pub team_split: Uncertain,
    pub tokens_individual: Uncertain,
    pub tokens_team: Uncertain,
}

/// Result of [`RespectAllocator::allocate`].
#[derive(Serialize, Clone, Debug, Default)]
pub struct RespectAllocation {
    /// Ordered by member, then meeting.
    awards: Vec<RespectAward>,
    meetings: BTreeMap<MeetingId, MeetingAllocation>,
}

impl RespectAllocation {
    pub fn awards(&self) -> &[RespectAward] {
        &self.awards
    }

    pub fn meetings(&self) -> impl Iterator<Item = &MeetingAllocation> {
        self.meetings.values()
    }

    pub fn meeting(&self, meeting_id: MeetingId) -> Option<&MeetingAllocation> {
        self.meetings.get(&meeting_id)
    }

    pub fn award(&self, member_id: &MemberId, meeting_id: MeetingId) -> Option<&RespectAward> {
        self.awards
            .iter()
            .find(|a| &a.member_id == member_id && a.meeting_id == meeting_id)
    }

    /// Awards of one meeting.
    pub fn awards_at(&self, meeting_id: MeetingId) -> impl Iterator<Item = &RespectAward> {
        self.awards.iter().filter(move |a| a.meeting_id == meeting_id)
    }
}

#[derive(Clone, Debug, Default)]
pub struct RespectAllocator {
    params: AllocationParameters,
}

impl RespectAllocator {
    pub fn new(params: AllocationParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &AllocationParameters {
        &self.params
    }

    /// Weighted-mean Respect of a smoothed Level, with the configured clamps.
    pub fn weighted_mean_respect(
        &self,
        level: &Uncertain,
        meeting_id: MeetingId,
        signature_on_file: bool,
    ) -> Uncertain {
        let p = &self.params;
        if p.clamp_respect_when_level_is_zero && level.nominal() == 0.0 {
            return Uncertain::exact(0.0);
        }
        if p.clamp_respect_when_signature_missing
            && !signature_on_file
            && meeting_id >= p.meeting_id_signature_required
        {
            return Uncertain::exact(0.0);
        }
        p.curve().evaluate(level)
    }

    pub fn allocate(
        &self,
        table: &AttendanceTable,
        smoothed: &SmoothedLevelSeries,
        schedule: &dyn SupplySchedule,
    ) -> Result<RespectAllocation, FractalError> {
        let roster = table.team_roster();
        let raw_respect = raw_respect(table)?;

        let mut awards = Vec::with_capacity(smoothed.len() * smoothed.max_meeting_id() as usize);
        for row in smoothed.rows() {
            let signature_on_file = table
                .signature_on_file(&row.member_id)
                .ok_or_else(|| DataIntegrityError::UnknownMember(row.member_id.to_string()))?;
            let weighted_mean_respect =
                self.weighted_mean_respect(&row.weighted_mean_level, row.meeting_id, signature_on_file);
            let key = (row.member_id.clone(), row.meeting_id);
            awards.push(RespectAward {
                team_id: roster.get(&key).cloned(),
                respect: raw_respect.get(&key).copied(),
                member_id: row.member_id,
                meeting_id: row.meeting_id,
                weighted_mean_level: row.weighted_mean_level,
                weighted_mean_respect,
                signature_on_file,
                individual_fraction: Uncertain::exact(0.0),
                team_fraction: None,
                tokens_individual: Uncertain::exact(0.0),
                tokens_team: None,
            });
        }

        let mut by_meeting: BTreeMap<MeetingId, Vec<usize>> = BTreeMap::new();
        for (index, award) in awards.iter().enumerate() {
            by_meeting.entry(award.meeting_id).or_default().push(index);
        }

        let mut meetings = BTreeMap::new();
        for (meeting_id, indices) in by_meeting {
            let token_integral = schedule.token_integral_for_meeting(meeting_id)?;
            let individual_respect: Uncertain = indices
                .iter()
                .map(|&i| &awards[i].weighted_mean_respect)
                .sum();
            let team_indices: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&i| awards[i].team_id.is_some())
                .collect();
            let team_respect: Uncertain = team_indices
                .iter()
                .map(|&i| &awards[i].weighted_mean_respect)
                .sum();

            if individual_respect.nominal() == 0.0 {
                return Err(DataIntegrityError::ZeroRespectTotal { meeting_id, pool: "individual" }.into());
            }
            if !team_indices.is_empty() && team_respect.nominal() == 0.0 {
                let members: Vec<String> =
                    team_indices.iter().map(|&i| awards[i].member_id.to_string()).collect();
                return Err(DataIntegrityError::ZeroTeamRespect {
                    meeting_id,
                    members: members.join(", "),
                }
                .into());
            }
            let total = &individual_respect + &team_respect;

            for &i in &indices {
                let award = &mut awards[i];
                let respect = award.weighted_mean_respect.clone();
                award.individual_fraction = &respect / &individual_respect;
                award.tokens_individual = &respect * token_integral / &total;
                if award.team_id.is_some() {
                    award.team_fraction = Some(&respect / &team_respect);
                    award.tokens_team = Some(&respect * token_integral / &total);
                }
            }

            let allocation = MeetingAllocation {
                meeting_id,
                token_integral,
                individual_split: &individual_respect / &total,
                team_split: &team_respect / &total,
                tokens_individual: &individual_respect * token_integral / &total,
                tokens_team: &team_respect * token_integral / &total,
                individual_respect,
                team_respect,
            };
            meetings.insert(meeting_id, allocation);
        }
        debug!(awards = awards.len(), meetings = meetings.len(), "respect allocated");

        Ok(RespectAllocation { awards, meetings })
    }
}

/// Discrete Respect per `(member, meeting)`, summed over rounds.
fn raw_respect(table: &AttendanceTable) -> Result<BTreeMap<(MemberId, MeetingId), f64>, DomainError> {
    let mut respect = BTreeMap::new();
    for record in table.attended_records() {
        if let Some(level) = record.level {
            let value = discrete_respect(i64::from(level))? as f64;
            *respect
                .entry((record.member_id.clone(), record.meeting_id))
                .or_insert(0.0) += value;
        }
    }
    Ok(respect)
}
