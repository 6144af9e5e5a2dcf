//! Window-based smoothers without persistent state.

use fractal_core::statistics::{mean, sample_std_dev};
use fractal_core::traits::LevelSmoother;
use fractal_core::{DomainError, Uncertain};

pub(crate) fn check_window_size(window_size: usize) -> Result<(), DomainError> {
    if window_size < 2 {
        return Err(DomainError::WindowSizeTooSmall(window_size));
    }
    Ok(())
}

/// Mean and sample standard deviation of the `window_size` levels ending at
/// 1-based `position`. Each window is an independent measurement.
fn window_mean(levels: &[f64], position: usize, window_size: usize) -> Uncertain {
    let window = &levels[position - window_size..position];
    Uncertain::new(
        mean(window).unwrap_or(0.0),
        sample_std_dev(window).unwrap_or(0.0),
    )
}

/// Trailing-window mean.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RollingMean {
    window_size: usize,
}

impl RollingMean {
    pub fn new(window_size: usize) -> Result<Self, DomainError> {
        check_window_size(window_size)?;
        Ok(Self { window_size })
    }
}

impl LevelSmoother for RollingMean {
    fn window_size(&self) -> usize {
        self.window_size
    }

    fn smooth_after_window(&self, levels: &[f64]) -> Vec<Uncertain> {
        ((self.window_size + 1)..=levels.len())
            .map(|position| window_mean(levels, position, self.window_size))
            .collect()
    }
}

/// `((W - 1) * mean(previous window) + level) / W`.
///
/// Lagged like the hysteresis variant, but every value is recomputed from
/// raw levels instead of the previous output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeightedRollingMean {
    window_size: usize,
}

impl WeightedRollingMean {
    pub fn new(window_size: usize) -> Result<Self, DomainError> {
        check_window_size(window_size)?;
        Ok(Self { window_size })
    }
}

impl LevelSmoother for WeightedRollingMean {
    fn window_size(&self) -> usize {
        self.window_size
    }

    fn smooth_after_window(&self, levels: &[f64]) -> Vec<Uncertain> {
        let w = self.window_size as f64;
        ((self.window_size + 1)..=levels.len())
            .map(|position| {
                let previous = window_mean(levels, position - 1, self.window_size);
                (previous * (w - 1.0) + levels[position - 1]) / w
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nominal(values: &[Uncertain]) -> Vec<f64> {
        values.iter().map(Uncertain::nominal).collect()
    }

    #[test]
    fn window_size_below_two_rejected() {
        assert_eq!(RollingMean::new(1), Err(DomainError::WindowSizeTooSmall(1)));
        assert_eq!(WeightedRollingMean::new(0), Err(DomainError::WindowSizeTooSmall(0)));
    }

    #[test]
    fn rolling_mean_outputs_after_window() {
        let smoother = RollingMean::new(3).unwrap();
        let levels = [1.0, 2.0, 3.0, 4.0, 8.0];
        let out = smoother.smooth_after_window(&levels);
        assert_eq!(nominal(&out), vec![3.0, 5.0]);
        // sample std of [2, 3, 4]
        assert!((out[0].std_dev() - 1.0).abs() < 1e-12);
        assert!(smoother.smooth_after_window(&levels[..3]).is_empty());
    }

    #[test]
    fn rolling_mean_full_series_has_ramp_up() {
        let smoother = RollingMean::new(3).unwrap();
        let out = smoother.smooth_levels(&[3.0, 3.0, 3.0, 6.0]);
        assert_eq!(nominal(&out), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn weighted_rolling_mean_blends_previous_window() {
        let smoother = WeightedRollingMean::new(3).unwrap();
        let levels = [1.0, 2.0, 3.0, 6.0, 0.0];
        let out = smoother.smooth_after_window(&levels);
        // position 4: (2 * mean(1,2,3) + 6) / 3, position 5: (2 * mean(2,3,6) + 0) / 3
        assert!((out[0].nominal() - 10.0 / 3.0).abs() < 1e-12);
        assert!((out[1].nominal() - 22.0 / 9.0).abs() < 1e-12);
        assert!((out[0].std_dev() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn constant_levels_are_exact() {
        let levels = [4.0; 8];
        for out in [
            RollingMean::new(3).unwrap().smooth_after_window(&levels),
            WeightedRollingMean::new(3).unwrap().smooth_after_window(&levels),
        ] {
            assert_eq!(out.len(), 5);
            assert!(out.iter().all(|v| v.nominal() == 4.0 && v.is_exact()));
        }
    }
}
