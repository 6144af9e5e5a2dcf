//! Smoothing configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use fractal_core::constants::{DEFAULT_MEETING_ATTENDANCE_REQUIREMENT, DEFAULT_WINDOW_SIZE};
use fractal_core::traits::LevelSmoother;
use fractal_core::{DataIntegrityError, DomainError};

use crate::hysteresis::WeightedRollingMeanWithHysteresis;
use crate::rolling::{RollingMean, WeightedRollingMean};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SmoothingAlgorithm {
    RollingMean,
    WeightedRollingMean,
    #[default]
    WeightedRollingMeanWithHysteresis,
}

impl SmoothingAlgorithm {
    pub const ALL: [SmoothingAlgorithm; 3] = [
        SmoothingAlgorithm::RollingMean,
        SmoothingAlgorithm::WeightedRollingMean,
        SmoothingAlgorithm::WeightedRollingMeanWithHysteresis,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SmoothingAlgorithm::RollingMean => "RollingMean",
            SmoothingAlgorithm::WeightedRollingMean => "WeightedRollingMean",
            SmoothingAlgorithm::WeightedRollingMeanWithHysteresis => {
                "WeightedRollingMeanWithHysteresis"
            }
        }
    }
}

impl fmt::Display for SmoothingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SmoothingAlgorithm {
    type Err = DataIntegrityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                DataIntegrityError::UnsupportedConfiguration(format!("smoothing algorithm {s}"))
            })
    }
}

/// Uncertainty assigned to the hysteresis seed value.
///
/// `ReferenceMean` reproduces the reference spreadsheet, which uses the
/// seed window's mean as its own standard deviation. `SampleStdDev` uses
/// the sample standard deviation of the seed window.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeedUncertainty {
    #[default]
    ReferenceMean,
    SampleStdDev,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SmoothingParameters {
    pub window_size: usize,
    /// Consecutive absences after which the hysteresis value resets to zero.
    pub meeting_attendance_requirement_for_members: usize,
    pub algorithm: SmoothingAlgorithm,
    pub seed_uncertainty: SeedUncertainty,
}

impl Default for SmoothingParameters {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            meeting_attendance_requirement_for_members: DEFAULT_MEETING_ATTENDANCE_REQUIREMENT,
            algorithm: SmoothingAlgorithm::default(),
            seed_uncertainty: SeedUncertainty::default(),
        }
    }
}

impl SmoothingParameters {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.window_size < 2 {
            return Err(DomainError::WindowSizeTooSmall(self.window_size));
        }
        if self.meeting_attendance_requirement_for_members == 0 {
            return Err(DomainError::ZeroAttendanceRequirement);
        }
        Ok(())
    }

    /// The configured algorithm.
    pub fn smoother(&self) -> Result<Box<dyn LevelSmoother>, DomainError> {
        self.validate()?;
        let smoother: Box<dyn LevelSmoother> = match self.algorithm {
            SmoothingAlgorithm::RollingMean => Box::new(RollingMean::new(self.window_size)?),
            SmoothingAlgorithm::WeightedRollingMean => {
                Box::new(WeightedRollingMean::new(self.window_size)?)
            }
            SmoothingAlgorithm::WeightedRollingMeanWithHysteresis => {
                Box::new(WeightedRollingMeanWithHysteresis::new(
                    self.window_size,
                    self.meeting_attendance_requirement_for_members,
                    self.seed_uncertainty,
                )?)
            }
        };
        Ok(smoother)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = SmoothingParameters::default();
        assert_eq!(p.window_size, 6);
        assert_eq!(p.meeting_attendance_requirement_for_members, 12);
        assert_eq!(p.algorithm, SmoothingAlgorithm::WeightedRollingMeanWithHysteresis);
        assert_eq!(p.seed_uncertainty, SeedUncertainty::ReferenceMean);
        assert_eq!(p.smoother().unwrap().window_size(), 6);
    }

    #[test]
    fn validation() {
        let small = SmoothingParameters { window_size: 1, ..Default::default() };
        assert_eq!(small.validate(), Err(DomainError::WindowSizeTooSmall(1)));
        assert!(small.smoother().is_err());
        let zero = SmoothingParameters {
            meeting_attendance_requirement_for_members: 0,
            ..Default::default()
        };
        assert_eq!(zero.validate(), Err(DomainError::ZeroAttendanceRequirement));
    }

    #[test]
    fn algorithm_names_round_trip() {
        for algorithm in SmoothingAlgorithm::ALL {
            assert_eq!(algorithm.to_string().parse::<SmoothingAlgorithm>().unwrap(), algorithm);
        }
        assert_eq!(
            "rollingmean".parse::<SmoothingAlgorithm>().unwrap(),
            SmoothingAlgorithm::RollingMean
        );
    }

    #[test]
    fn unknown_algorithm_is_unsupported_configuration() {
        assert!(matches!(
            "Median".parse::<SmoothingAlgorithm>(),
            Err(DataIntegrityError::UnsupportedConfiguration(_))
        ));
    }
}
