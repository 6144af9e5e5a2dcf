//! Attendance data model: records, the validated table, and per-member
//! Level series.
//!
//! The [`AttendanceTable`] is the single source of truth for every derived
//! table. It is built once from normalised records and never mutated.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DataIntegrityError, DomainError, FractalError};

/// Ordinal of a weekly consensus meeting, 1-based.
pub type MeetingId = u32;

/// Identifier of a participant.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MemberId(pub String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of a team.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One row of the normalised attendance table.
///
/// `level` and `group` are `None` when the member did not take part in a
/// consensus round (for example a team-roster row). Multiple rows for the
/// same `(meeting_id, member_id)` are separate rounds; their Levels are
/// summed before smoothing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AttendanceRecord {
    pub member_id: MemberId,
    pub meeting_id: MeetingId,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub group: Option<u32>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub signature_on_file: bool,
}

impl AttendanceRecord {
    /// Whether this row carries a peer-assessed Level.
    pub fn attended(&self) -> bool {
        self.level.is_some()
    }
}

/// Raw Levels of one member, one entry per meeting from 1 to the table's
/// last meeting. Absent meetings hold 0.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelSeries {
    pub member_id: MemberId,
    levels: Vec<f64>,
}

impl LevelSeries {
    /// Build a series from zero-filled levels.
    pub fn from_levels(member_id: MemberId, levels: Vec<f64>) -> Self {
        Self { member_id, levels }
    }

    /// Levels indexed by `meeting_id - 1`.
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Raw (round-summed) Level at a meeting, 0 when absent or out of range.
    pub fn level(&self, meeting_id: MeetingId) -> f64 {
        if meeting_id == 0 {
            return 0.0;
        }
        self.levels
            .get(meeting_id as usize - 1)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Validated, immutable attendance table.
#[derive(Clone, Debug)]
pub struct AttendanceTable {
    records: Vec<AttendanceRecord>,
    max_meeting_id: MeetingId,
    signatures: BTreeMap<MemberId, bool>,
}

impl AttendanceTable {
    /// Validate and wrap the records.
    ///
    /// Fails on an empty table, a `meeting_id` of 0, or a member whose rows
    /// disagree on `signature_on_file`.
    pub fn new(records: Vec<AttendanceRecord>) -> Result<Self, FractalError> {
        if records.is_empty() {
            return Err(DataIntegrityError::EmptyTable.into());
        }

        let mut signatures: BTreeMap<MemberId, bool> = BTreeMap::new();
        let mut max_meeting_id = 0;
        for record in &records {
            if record.meeting_id == 0 {
                return Err(DomainError::MeetingIdBelowOne(0).into());
            }
            max_meeting_id = max_meeting_id.max(record.meeting_id);
            match signatures.get(&record.member_id) {
                Some(&signed) if signed != record.signature_on_file => {
                    return Err(DataIntegrityError::InconsistentSignatureStatus(
                        record.member_id.to_string(),
                    )
                    .into());
                }
                Some(_) => {}
                None => {
                    signatures.insert(record.member_id.clone(), record.signature_on_file);
                }
            }
        }

        debug!(
            rows = records.len(),
            members = signatures.len(),
            max_meeting_id,
            "attendance table validated"
        );
        Ok(Self {
            records,
            max_meeting_id,
            signatures,
        })
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    /// Rows that carry a Level.
    pub fn attended_records(&self) -> impl Iterator<Item = &AttendanceRecord> {
        self.records.iter().filter(|r| r.attended())
    }

    /// Largest meeting id present. Every per-meeting table spans `1..=max`.
    pub fn max_meeting_id(&self) -> MeetingId {
        self.max_meeting_id
    }

    /// Signature status of a member, `None` for an unknown member.
    pub fn signature_on_file(&self, member_id: &MemberId) -> Option<bool> {
        self.signatures.get(member_id).copied()
    }

    /// Team membership for every `(member, meeting)` row with a team.
    pub fn team_roster(&self) -> BTreeMap<(MemberId, MeetingId), TeamId> {
        let mut roster = BTreeMap::new();
        for record in &self.records {
            if let Some(team_id) = &record.team_id {
                roster
                    .entry((record.member_id.clone(), record.meeting_id))
                    .or_insert_with(|| team_id.clone());
            }
        }
        roster
    }

    /// Zero-filled, round-summed Level series for every attending member.
    pub fn level_series(&self) -> BTreeMap<MemberId, LevelSeries> {
        let len = self.max_meeting_id as usize;
        let mut levels: BTreeMap<MemberId, Vec<f64>> = BTreeMap::new();
        for record in self.attended_records() {
            let series = levels
                .entry(record.member_id.clone())
                .or_insert_with(|| vec![0.0; len]);
            series[record.meeting_id as usize - 1] += f64::from(record.level.unwrap_or(0));
        }
        levels
            .into_iter()
            .map(|(member_id, levels)| {
                let series = LevelSeries::from_levels(member_id.clone(), levels);
                (member_id, series)
            })
            .collect()
    }
}
