//! Error types for Fractal Governance computations.
//!
//! Two failure classes exist. A [`DomainError`] is an invalid argument to a
//! pure function and is raised before any work is done. A
//! [`DataIntegrityError`] is raised when a derived computation reaches an
//! undefined value (a zero Respect denominator, an inconsistent input table).
//! Deliberate reproductions of the historical reference spreadsheet are
//! configuration choices, not errors, and never appear here.
use thiserror::Error;

use crate::types::MeetingId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("level={0} must be >= 1")] LevelBelowOne(i64),
    #[error("fibonacci({0}) overflows i64")] FibonacciOverflow(i64),
    #[error("meeting_id={0} must be >= 1")] MeetingIdBelowOne(i64),
    #[error("meeting_id={0} is past the last representable date")] MeetingIdOutOfRange(i64),
    #[error("time={0} must be >= 1")] TimeBeforeFirstMeeting(f64),
    #[error("window_size={0} must be >= 2")] WindowSizeTooSmall(usize),
    #[error("meeting attendance requirement must be >= 1")] ZeroAttendanceRequirement,
    #[error("parameter {name}={value} is out of range")] InvalidParameter { name: &'static str, value: f64 },
    #[error("{0} is not a meeting date")] NotAMeetingDate(String),
    #[error("meeting_id={meeting_id} must be in range [{min}, {max}]")] MeetingOutOfRange { meeting_id: MeetingId, min: MeetingId, max: MeetingId },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataIntegrityError {
    #[error("attendance table is empty")] EmptyTable,
    #[error("zero total {pool} Respect in meeting {meeting_id}")] ZeroRespectTotal { meeting_id: MeetingId, pool: &'static str },
    #[error("zero total Respect before cutover meeting {0}")] ZeroRespectBeforeCutover(MeetingId),
    #[error("inconsistent signature status for member {0}")] InconsistentSignatureStatus(String),
    #[error("zero total team Respect in meeting {meeting_id} (team members: {members})")] ZeroTeamRespect { meeting_id: MeetingId, members: String },
    #[error("unknown member: {0}")] UnknownMember(String),
    #[error("unsupported configuration: {0}")] UnsupportedConfiguration(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FractalError {
    #[error(transparent)] Domain(#[from] DomainError),
    #[error(transparent)] DataIntegrity(#[from] DataIntegrityError),
}
