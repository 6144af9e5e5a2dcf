//! Fixed historical constants and documented parameter defaults.

use chrono::NaiveDate;

/// Date of the first Genesis fractal weekly consensus meeting.
///
/// # Examples
///
/// ```
/// use fractal_core::constants::first_meeting_date;
/// assert_eq!(first_meeting_date().to_string(), "2022-02-26");
/// ```
pub fn first_meeting_date() -> NaiveDate {
    // 2022-02-26 is a valid calendar date.
    NaiveDate::from_ymd_opt(2022, 2, 26).unwrap_or_default()
}

/// Zero-based week offset at which the calendar skips one week.
///
/// No meeting was held on 2022-04-16, so meeting 8 (offset 7) and every
/// later meeting happen one week later than a dense weekly schedule implies.
pub const SKIPPED_WEEK_OFFSET: i64 = 7;

/// Meeting at which the Addendum 1 allocation rule takes effect.
pub const MEETING_ID_WHEN_ADDENDUM_1_GOES_INTO_EFFECT: u32 = 23;

/// First meeting at which a signed contributor agreement is required for
/// weighted-mean Respect.
pub const MEETING_ID_WHEN_SIGNATURE_REQUIRED: u32 = 23;

/// Tokens minted per week at the start of the schedule.
pub const DEFAULT_TOKEN_INFLATION_RATE: f64 = 1_000_000.0;
/// Half-life of the emission rate, in weeks.
pub const DEFAULT_HALF_LIFE: f64 = 52.0;
/// Multiplicative inflation per half-life once the schedule turns constant.
pub const DEFAULT_CONSTANT_INFLATION_RATE: f64 = 1.05;

pub const DEFAULT_WINDOW_SIZE: usize = 6;
pub const DEFAULT_MEETING_ATTENDANCE_REQUIREMENT: usize = 12;

/// Shift applied to a raw Level before the discrete Fibonacci curve.
pub const DISCRETE_RESPECT_LEVEL_OFFSET: i64 = 2;
/// Default bias of the continuous Fibonacci curve as a pure function.
pub const DEFAULT_CONTINUOUS_RESPECT_BIAS: f64 = 2.0;

/// Relative tolerance for floating-point golden-value comparisons.
pub const GOLDEN_RELATIVE_TOLERANCE: f64 = 1e-6;
