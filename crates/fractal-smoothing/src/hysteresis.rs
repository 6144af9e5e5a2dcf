//! The recursive "5xn6" weighted mean.
//!
//! Only one value per member is carried from meeting to meeting:
//!
//! ```text
//! v(W)     = mean(level(1..=W))
//! v(k)     = ((W - 1) * v(k - 1) + level(k)) / W      for k > W
//! ```
//!
//! A member with no Level over the trailing attendance requirement is
//! treated as new: their value resets to exactly zero and the recursion
//! continues from there. Values depend on their predecessor, so a series is
//! always folded in meeting order.

use tracing::trace;

use fractal_core::statistics::{mean, sample_std_dev};
use fractal_core::traits::LevelSmoother;
use fractal_core::{DomainError, Uncertain};

use crate::params::SeedUncertainty;
use crate::rolling::check_window_size;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeightedRollingMeanWithHysteresis {
    window_size: usize,
    meeting_attendance_requirement: usize,
    seed_uncertainty: SeedUncertainty,
}

impl WeightedRollingMeanWithHysteresis {
    pub fn new(
        window_size: usize,
        meeting_attendance_requirement: usize,
        seed_uncertainty: SeedUncertainty,
    ) -> Result<Self, DomainError> {
        check_window_size(window_size)?;
        if meeting_attendance_requirement == 0 {
            return Err(DomainError::ZeroAttendanceRequirement);
        }
        Ok(Self {
            window_size,
            meeting_attendance_requirement,
            seed_uncertainty,
        })
    }

    pub fn meeting_attendance_requirement(&self) -> usize {
        self.meeting_attendance_requirement
    }

    fn seed(&self, levels: &[f64]) -> Uncertain {
        let window = &levels[..self.window_size];
        let seed_mean = mean(window).unwrap_or(0.0);
        let std_dev = match self.seed_uncertainty {
            SeedUncertainty::ReferenceMean => seed_mean,
            SeedUncertainty::SampleStdDev => sample_std_dev(window).unwrap_or(0.0),
        };
        Uncertain::new(seed_mean, std_dev)
    }

    /// Whether the levels over the trailing attendance requirement ending at
    /// 1-based `position` sum to zero.
    ///
    /// The window is clipped at the first meeting once it reaches back to
    /// position 0.
    fn absent_for_requirement(&self, levels: &[f64], position: usize) -> bool {
        let Some(first) = (position + 1).checked_sub(self.meeting_attendance_requirement) else {
            return false;
        };
        let first = first.max(1);
        !(levels[first - 1..position].iter().sum::<f64>() > 0.0)
    }
}

impl LevelSmoother for WeightedRollingMeanWithHysteresis {
    fn window_size(&self) -> usize {
        self.window_size
    }

    fn smooth_after_window(&self, levels: &[f64]) -> Vec<Uncertain> {
        if levels.len() <= self.window_size {
            return Vec::new();
        }
        let w = self.window_size as f64;
        let mut previous = self.seed(levels);
        let mut smoothed = Vec::with_capacity(levels.len() - self.window_size);
        for position in (self.window_size + 1)..=levels.len() {
            let value = if self.absent_for_requirement(levels, position) {
                trace!(position, "weighted mean reset after absence");
                Uncertain::exact(0.0)
            } else {
                (&previous * (w - 1.0) + levels[position - 1]) / w
            };
            smoothed.push(value.clone());
            previous = value;
        }
        smoothed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn smoother(w: usize, requirement: usize) -> WeightedRollingMeanWithHysteresis {
        WeightedRollingMeanWithHysteresis::new(w, requirement, SeedUncertainty::ReferenceMean)
            .unwrap()
    }

    #[test]
    fn invalid_parameters() {
        assert_eq!(
            WeightedRollingMeanWithHysteresis::new(1, 12, SeedUncertainty::ReferenceMean),
            Err(DomainError::WindowSizeTooSmall(1))
        );
        assert_eq!(
            WeightedRollingMeanWithHysteresis::new(6, 0, SeedUncertainty::ReferenceMean),
            Err(DomainError::ZeroAttendanceRequirement)
        );
    }

    #[test]
    fn recursion_from_seed() {
        let s = smoother(3, 12);
        let out = s.smooth_after_window(&[3.0, 6.0, 6.0, 8.0, 2.0]);
        // seed 5, then (2 * 5 + 8) / 3 = 6, then (2 * 6 + 2) / 3
        assert_eq!(out.len(), 2);
        assert!((out[0].nominal() - 6.0).abs() < 1e-12);
        assert!((out[1].nominal() - 14.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn reference_seed_uses_mean_as_deviation() {
        let s = smoother(3, 12);
        let out = s.smooth_after_window(&[3.0, 6.0, 6.0, 8.0, 2.0]);
        // seed std 5, scaled by 2/3 per step, fully correlated
        assert!((out[0].std_dev() - 5.0 * 2.0 / 3.0).abs() < 1e-12);
        assert!((out[1].std_dev() - 5.0 * 4.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn sample_seed_uses_window_deviation() {
        let s = WeightedRollingMeanWithHysteresis::new(3, 12, SeedUncertainty::SampleStdDev).unwrap();
        let out = s.smooth_after_window(&[3.0, 6.0, 6.0, 8.0]);
        // sample std of [3, 6, 6] is sqrt(3)
        assert!((out[0].std_dev() - 3f64.sqrt() * 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn constant_level_converges_exactly() {
        let levels = [4.0; 8];
        let reference = smoother(3, 12).smooth_levels(&levels);
        assert!(reference[2..].iter().all(|v| v.nominal() == 4.0));

        let corrected = WeightedRollingMeanWithHysteresis::new(3, 12, SeedUncertainty::SampleStdDev)
            .unwrap()
            .smooth_levels(&levels);
        assert!(corrected.iter().all(Uncertain::is_exact));
        assert!(corrected[2..].iter().all(|v| v.nominal() == 4.0));
    }

    #[test]
    fn resets_after_required_absences() {
        // Present for 6 meetings, then absent for 4 with a requirement of 4.
        let mut levels = vec![5.0; 6];
        levels.extend([0.0; 4]);
        levels.push(6.0);
        let out = smoother(3, 4).smooth_levels(&levels);
        assert!(out[8].nominal() > 0.0);
        assert_eq!(out[9].nominal(), 0.0);
        assert!(out[9].is_exact());
        // Recursion continues from zero.
        assert!((out[10].nominal() - 2.0).abs() < 1e-12);
        assert!(out[10].is_exact());
    }

    #[test]
    fn early_window_is_clipped_at_first_meeting() {
        // Requirement 5 reaches position 0 at position 4, checking positions 1..=4.
        let out = smoother(3, 5).smooth_after_window(&[0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.nominal() == 0.0 && v.is_exact()));

        // Requirement 6 does not reach back far enough at position 4.
        let not_yet = smoother(3, 6).absent_for_requirement(&[0.0; 5], 4);
        assert!(!not_yet);
    }

    proptest! {
        #[test]
        fn one_value_per_meeting(levels in proptest::collection::vec(0u32..10, 0..40), w in 2usize..8) {
            let levels: Vec<f64> = levels.into_iter().map(f64::from).collect();
            let out = smoother(w, 12).smooth_levels(&levels);
            prop_assert_eq!(out.len(), levels.len());
            prop_assert!(out.iter().all(|v| v.nominal() >= 0.0));
        }
    }
}
