//! Meeting id <-> calendar date mapping.
//!
//! Meetings are weekly starting on [`first_meeting_date`]. One calendar week
//! was skipped (see [`SKIPPED_WEEK_OFFSET`]); every meeting from then on is a
//! week later than a dense schedule would place it.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::constants::{first_meeting_date, SKIPPED_WEEK_OFFSET};
use crate::error::DomainError;
use crate::types::MeetingId;

/// Calendar date of a meeting.
///
/// # Examples
///
/// ```
/// use fractal_core::timeline::meeting_id_to_date;
/// assert_eq!(meeting_id_to_date(1).unwrap().to_string(), "2022-02-26");
/// assert_eq!(meeting_id_to_date(7).unwrap().to_string(), "2022-04-09");
/// assert_eq!(meeting_id_to_date(8).unwrap().to_string(), "2022-04-23");
/// assert!(meeting_id_to_date(0).is_err());
/// assert!(meeting_id_to_date(i64::MAX).is_err());
/// ```
pub fn meeting_id_to_date(meeting_id: i64) -> Result<NaiveDate, DomainError> {
    if meeting_id < 1 {
        return Err(DomainError::MeetingIdBelowOne(meeting_id));
    }
    let mut week_offset = meeting_id - 1;
    if week_offset >= SKIPPED_WEEK_OFFSET {
        week_offset += 1;
    }
    Duration::try_weeks(week_offset)
        .and_then(|offset| first_meeting_date().checked_add_signed(offset))
        .ok_or(DomainError::MeetingIdOutOfRange(meeting_id))
}

/// Meeting held on `date`.
///
/// Fails for dates before the first meeting, dates that are not on the
/// weekly cadence, and the skipped week.
pub fn date_to_meeting_id(date: NaiveDate) -> Result<MeetingId, DomainError> {
    let days = (date - first_meeting_date()).num_days();
    if days < 0 || days % 7 != 0 {
        return Err(DomainError::NotAMeetingDate(date.to_string()));
    }
    let mut week_offset = days / 7;
    if week_offset == SKIPPED_WEEK_OFFSET {
        return Err(DomainError::NotAMeetingDate(date.to_string()));
    }
    if week_offset > SKIPPED_WEEK_OFFSET {
        week_offset -= 1;
    }
    MeetingId::try_from(week_offset + 1).map_err(|_| DomainError::NotAMeetingDate(date.to_string()))
}

/// Ordered `meeting_id -> date` map for meetings `1..=max_meeting_id`.
pub fn meeting_timeline(
    max_meeting_id: MeetingId,
) -> Result<BTreeMap<MeetingId, NaiveDate>, DomainError> {
    (1..=max_meeting_id)
        .map(|id| Ok((id, meeting_id_to_date(i64::from(id))?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_meeting() {
        assert_eq!(meeting_id_to_date(1).unwrap(), date(2022, 2, 26));
    }

    #[test]
    fn skipped_week_shifts_later_meetings() {
        assert_eq!(meeting_id_to_date(7).unwrap(), date(2022, 4, 9));
        assert_eq!(meeting_id_to_date(8).unwrap(), date(2022, 4, 23));
        assert!(date_to_meeting_id(date(2022, 4, 16)).is_err());
        assert_eq!(meeting_id_to_date(23).unwrap(), date(2022, 8, 6));
    }

    #[test]
    fn meeting_id_below_one_is_domain_error() {
        assert_eq!(meeting_id_to_date(0), Err(DomainError::MeetingIdBelowOne(0)));
        assert_eq!(meeting_id_to_date(-3), Err(DomainError::MeetingIdBelowOne(-3)));
    }

    #[test]
    fn unrepresentable_dates_are_domain_errors() {
        assert_eq!(
            meeting_id_to_date(i64::MAX),
            Err(DomainError::MeetingIdOutOfRange(i64::MAX))
        );
        let largest = i64::from(MeetingId::MAX);
        assert_eq!(
            meeting_id_to_date(largest),
            Err(DomainError::MeetingIdOutOfRange(largest))
        );
        // Roughly 5000 years of weekly meetings still fit.
        assert!(meeting_id_to_date(260_000).is_ok());
    }

    #[test]
    fn date_round_trip_over_first_year() {
        for id in 1..=52u32 {
            let d = meeting_id_to_date(i64::from(id)).unwrap();
            assert_eq!(date_to_meeting_id(d).unwrap(), id);
        }
    }

    #[test]
    fn off_cadence_dates_rejected() {
        assert!(date_to_meeting_id(date(2022, 2, 27)).is_err());
        assert!(date_to_meeting_id(date(2022, 2, 19)).is_err());
    }

    #[test]
    fn timeline_is_dense_and_ordered() {
        let timeline = meeting_timeline(10).unwrap();
        assert_eq!(timeline.len(), 10);
        let dates: Vec<_> = timeline.values().collect();
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }
}
