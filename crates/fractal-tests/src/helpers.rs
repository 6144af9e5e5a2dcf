//! Shared fixtures for the integration tests.

use fractal_core::constants::GOLDEN_RELATIVE_TOLERANCE;
use fractal_core::types::{AttendanceRecord, AttendanceTable, MeetingId, TeamId};

/// An attended row in consensus group 1.
pub fn attended(member: &str, meeting_id: MeetingId, level: u32) -> AttendanceRecord {
    AttendanceRecord {
        member_id: member.into(),
        meeting_id,
        level: Some(level),
        group: Some(1),
        team_id: None,
        signature_on_file: true,
    }
}

/// A team-roster row without a Level.
pub fn roster(member: &str, meeting_id: MeetingId, team: &str) -> AttendanceRecord {
    AttendanceRecord {
        member_id: member.into(),
        meeting_id,
        level: None,
        group: None,
        team_id: Some(TeamId::from(team)),
        signature_on_file: true,
    }
}

/// Every member attends every meeting `1..=meetings` at the same Level.
pub fn constant_table(members: &[&str], meetings: MeetingId, level: u32) -> AttendanceTable {
    let records = (1..=meetings)
        .flat_map(|meeting_id| members.iter().map(move |m| attended(m, meeting_id, level)))
        .collect();
    AttendanceTable::new(records).unwrap()
}

/// Table from a member-major Level matrix: `levels[m][k]` is member `m{m}` at
/// meeting `k + 1`, `None` for an absence. Members sharing a meeting share a
/// consensus group.
pub fn matrix_table(levels: &[Vec<Option<u32>>]) -> AttendanceTable {
    let mut records = Vec::new();
    for (m, row) in levels.iter().enumerate() {
        for (k, level) in row.iter().enumerate() {
            if let Some(level) = level {
                records.push(attended(&format!("m{m}"), k as MeetingId + 1, *level));
            }
        }
    }
    AttendanceTable::new(records).unwrap()
}

/// Like [`matrix_table`], with `teams[m][k]` naming the team `t{n}` of member
/// `m{m}` at meeting `k + 1`. An attended member carries the team on its
/// Level row, an absent one gets a roster row.
pub fn teamed_matrix_table(levels: &[Vec<Option<u32>>], teams: &[Vec<Option<u32>>]) -> AttendanceTable {
    let mut records = Vec::new();
    for (m, (level_row, team_row)) in levels.iter().zip(teams).enumerate() {
        let member = format!("m{m}");
        for (k, (level, team)) in level_row.iter().zip(team_row).enumerate() {
            let meeting_id = k as MeetingId + 1;
            let team = team.map(|t| format!("t{t}"));
            match (level, team) {
                (Some(level), team) => records.push(AttendanceRecord {
                    team_id: team.map(TeamId),
                    ..attended(&member, meeting_id, *level)
                }),
                (None, Some(team)) => records.push(roster(&member, meeting_id, &team)),
                (None, None) => {}
            }
        }
    }
    AttendanceTable::new(records).unwrap()
}

/// Six weeks of a small fractal with one team and one member who never
/// signed the contributor agreement.
pub fn team_table() -> AttendanceTable {
    let mut records = Vec::new();
    for meeting_id in 1..=6 {
        records.push(attended("alice", meeting_id, 5));
        records.push(attended("bob", meeting_id, 3));
        records.push(AttendanceRecord {
            signature_on_file: false,
            ..attended("carol", meeting_id, 4)
        });
        records.push(roster("alice", meeting_id, "builders"));
        records.push(roster("bob", meeting_id, "builders"));
    }
    AttendanceTable::new(records).unwrap()
}

/// Relative comparison at the golden-value tolerance.
pub fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() <= GOLDEN_RELATIVE_TOLERANCE * expected.abs().max(1.0)
}
