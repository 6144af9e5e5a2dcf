//! Smoothed Level table for a whole attendance table.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use fractal_core::respect::ContinuousRespect;
use fractal_core::traits::LevelSmoother;
use fractal_core::types::{AttendanceTable, MeetingId, MemberId};
use fractal_core::{DomainError, Uncertain};

use crate::params::SmoothingParameters;

/// One `(member, meeting)` entry of a [`SmoothedLevelSeries`].
#[derive(Serialize, Clone, Debug)]
pub struct SmoothedLevel {
    pub member_id: MemberId,
    pub meeting_id: MeetingId,
    pub weighted_mean_level: Uncertain,
    /// True for the progressive-mean ramp-up positions.
    pub ramp_up: bool,
}

/// Member x meeting matrix of nominal values, for charting.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Pivot {
    pub meeting_ids: Vec<MeetingId>,
    pub values: BTreeMap<MemberId, Vec<f64>>,
}

/// Smoothed Level of every attending member at every meeting `1..=max`.
///
/// Computed once and never mutated.
#[derive(Clone, Debug)]
pub struct SmoothedLevelSeries {
    window_size: usize,
    max_meeting_id: MeetingId,
    by_member: BTreeMap<MemberId, Vec<Uncertain>>,
}

impl SmoothedLevelSeries {
    /// Smooth each member's Level series independently.
    pub fn compute(table: &AttendanceTable, smoother: &dyn LevelSmoother) -> Self {
        let by_member: BTreeMap<MemberId, Vec<Uncertain>> = table
            .level_series()
            .into_iter()
            .map(|(member_id, series)| {
                let smoothed = smoother.smooth(&series);
                (member_id, smoothed)
            })
            .collect();
        debug!(
            members = by_member.len(),
            window_size = smoother.window_size(),
            "smoothed level series"
        );
        Self {
            window_size: smoother.window_size(),
            max_meeting_id: table.max_meeting_id(),
            by_member,
        }
    }

    pub fn from_params(
        table: &AttendanceTable,
        params: &SmoothingParameters,
    ) -> Result<Self, DomainError> {
        let smoother = params.smoother()?;
        Ok(Self::compute(table, smoother.as_ref()))
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn max_meeting_id(&self) -> MeetingId {
        self.max_meeting_id
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &MemberId> {
        self.by_member.keys()
    }

    pub fn len(&self) -> usize {
        self.by_member.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_member.is_empty()
    }

    /// Smoothed values of a member, index `i` holding meeting `i + 1`.
    pub fn member(&self, member_id: &MemberId) -> Option<&[Uncertain]> {
        self.by_member.get(member_id).map(Vec::as_slice)
    }

    pub fn get(&self, member_id: &MemberId, meeting_id: MeetingId) -> Option<&Uncertain> {
        let index = (meeting_id as usize).checked_sub(1)?;
        self.by_member.get(member_id)?.get(index)
    }

    /// Every entry ordered by member, then meeting.
    pub fn rows(&self) -> impl Iterator<Item = SmoothedLevel> + '_ {
        self.by_member.iter().flat_map(move |(member_id, values)| {
            values.iter().enumerate().map(move |(index, value)| SmoothedLevel {
                member_id: member_id.clone(),
                meeting_id: index as MeetingId + 1,
                weighted_mean_level: value.clone(),
                ramp_up: index < self.window_size,
            })
        })
    }

    /// Nominal smoothed Level per member and meeting.
    pub fn level_pivot(&self) -> Pivot {
        self.pivot(|value| value.nominal())
    }

    /// Nominal weighted-mean Respect per member and meeting, unclamped.
    pub fn respect_pivot(&self, curve: &ContinuousRespect) -> Pivot {
        self.pivot(|value| curve.evaluate(value).nominal())
    }

    fn pivot(&self, f: impl Fn(&Uncertain) -> f64) -> Pivot {
        Pivot {
            meeting_ids: (1..=self.max_meeting_id).collect(),
            values: self
                .by_member
                .iter()
                .map(|(member_id, values)| (member_id.clone(), values.iter().map(&f).collect()))
                .collect(),
        }
    }
}
