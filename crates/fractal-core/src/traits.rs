//! Trait interfaces between crates.
//!
//! - [`SupplySchedule`]: cumulative token supply and per-meeting emission
//!   (fractal-supply implements)
//! - [`LevelSmoother`]: weighted-mean Level algorithms (fractal-smoothing
//!   implements)

use crate::error::DomainError;
use crate::statistics::progressive_mean;
use crate::types::{LevelSeries, MeetingId};
use crate::uncertain::Uncertain;

/// Closed-form token emission model.
///
/// Time is measured in meetings and starts at 1. Implementations are pure:
/// the same argument always yields the same value.
pub trait SupplySchedule: Send + Sync {
    /// Tokens minted over `[time, time + 1)`.
    fn token_integral(&self, time: f64) -> Result<f64, DomainError>;

    /// Reported cumulative token supply at the end of period `time`.
    fn token_supply(&self, time: f64) -> Result<f64, DomainError>;

    /// Tokens minted during a meeting.
    fn token_integral_for_meeting(&self, meeting_id: MeetingId) -> Result<f64, DomainError> {
        self.token_integral(f64::from(meeting_id))
    }

    /// Sum of the per-meeting token integrals for meetings `1..=meeting_id`.
    ///
    /// Zero for `meeting_id == 0`.
    fn cumulative_token_integral(&self, meeting_id: MeetingId) -> Result<f64, DomainError> {
        (1..=meeting_id).try_fold(0.0, |acc, id| Ok(acc + self.token_integral_for_meeting(id)?))
    }
}

/// A weighted-mean Level algorithm over a zero-filled Level series.
pub trait LevelSmoother: Send + Sync {
    /// Window size `W`; always at least 2.
    fn window_size(&self) -> usize;

    /// Algorithm output for 1-based positions `W + 1 ..= levels.len()`.
    ///
    /// Empty when the series is no longer than the window.
    fn smooth_after_window(&self, levels: &[f64]) -> Vec<Uncertain>;

    /// One smoothed value per position of `levels`.
    ///
    /// Positions `1..=W` hold the progressive mean (running sum divided by
    /// `W`, exact); the algorithm fills the rest.
    fn smooth_levels(&self, levels: &[f64]) -> Vec<Uncertain> {
        let mut smoothed: Vec<Uncertain> = progressive_mean(levels, self.window_size())
            .into_iter()
            .map(Uncertain::exact)
            .collect();
        smoothed.extend(self.smooth_after_window(levels));
        smoothed
    }

    /// Smooth a member's series. Index `i` holds meeting `i + 1`.
    fn smooth(&self, series: &LevelSeries) -> Vec<Uncertain> {
        self.smooth_levels(series.levels())
    }
}
