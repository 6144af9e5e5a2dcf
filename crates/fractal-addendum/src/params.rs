//! Allocation, Addendum-1 and whole-pipeline configuration.

use serde::{Deserialize, Serialize};

use fractal_core::constants::{
    MEETING_ID_WHEN_ADDENDUM_1_GOES_INTO_EFFECT, MEETING_ID_WHEN_SIGNATURE_REQUIRED,
};
use fractal_core::respect::ContinuousRespect;
use fractal_core::types::MeetingId;
use fractal_core::DomainError;
use fractal_smoothing::SmoothingParameters;
use fractal_supply::SupplyParameters;

/// How smoothed Levels turn into weighted-mean Respect.
///
/// The defaults reproduce the reference spreadsheet: leading-order Binet
/// term with no bias, and both clamps enabled.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AllocationParameters {
    pub respect_fibonacci_bias: f64,
    pub respect_fibonacci_include_second_term: bool,
    /// Force Respect to 0 when the smoothed Level is exactly 0.
    pub clamp_respect_when_level_is_zero: bool,
    /// Force Respect to 0 for members without a signature on file from
    /// `meeting_id_signature_required` on.
    pub clamp_respect_when_signature_missing: bool,
    pub meeting_id_signature_required: MeetingId,
}

impl Default for AllocationParameters {
    fn default() -> Self {
        Self {
            respect_fibonacci_bias: 0.0,
            respect_fibonacci_include_second_term: false,
            clamp_respect_when_level_is_zero: true,
            clamp_respect_when_signature_missing: true,
            meeting_id_signature_required: MEETING_ID_WHEN_SIGNATURE_REQUIRED,
        }
    }
}

impl AllocationParameters {
    pub fn curve(&self) -> ContinuousRespect {
        ContinuousRespect::new(
            self.respect_fibonacci_bias,
            self.respect_fibonacci_include_second_term,
        )
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.respect_fibonacci_bias.is_finite() {
            return Err(DomainError::InvalidParameter {
                name: "respect_fibonacci_bias",
                value: self.respect_fibonacci_bias,
            });
        }
        Ok(())
    }
}

/// Cutover meeting and optional injected totals.
///
/// The overrides exist to reproduce a reference calculation whose totals
/// differ from the data; they are applied verbatim.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Addendum1Parameters {
    pub cutover_meeting_id: MeetingId,
    pub total_respect_individual_override: Option<f64>,
    pub total_respect_team_override: Option<f64>,
}

impl Default for Addendum1Parameters {
    fn default() -> Self {
        Self {
            cutover_meeting_id: MEETING_ID_WHEN_ADDENDUM_1_GOES_INTO_EFFECT,
            total_respect_individual_override: None,
            total_respect_team_override: None,
        }
    }
}

impl Addendum1Parameters {
    pub fn validate(&self) -> Result<(), DomainError> {
        // The supply before the cutover is evaluated at cutover - 1 >= 1.
        if self.cutover_meeting_id < 2 {
            return Err(DomainError::InvalidParameter {
                name: "cutover_meeting_id",
                value: f64::from(self.cutover_meeting_id),
            });
        }
        for (name, value) in [
            ("total_respect_individual_override", self.total_respect_individual_override),
            ("total_respect_team_override", self.total_respect_team_override),
        ] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(DomainError::InvalidParameter { name, value });
                }
            }
        }
        Ok(())
    }
}

/// Everything the batch pipeline needs besides the attendance table.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub supply: SupplyParameters,
    pub smoothing: SmoothingParameters,
    pub allocation: AllocationParameters,
    pub addendum: Addendum1Parameters,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        self.supply.validate()?;
        self.smoothing.validate()?;
        self.allocation.validate()?;
        self.addendum.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_configuration() {
        let config = PipelineConfig::default();
        assert_eq!(config.allocation.respect_fibonacci_bias, 0.0);
        assert!(!config.allocation.respect_fibonacci_include_second_term);
        assert_eq!(config.allocation.meeting_id_signature_required, 23);
        assert_eq!(config.addendum.cutover_meeting_id, 23);
        assert_eq!(config.addendum.total_respect_individual_override, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn cutover_must_leave_a_supply_meeting() {
        let config = PipelineConfig {
            addendum: Addendum1Parameters {
                cutover_meeting_id: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DomainError::InvalidParameter { name: "cutover_meeting_id", .. })
        ));
    }

    #[test]
    fn negative_override_rejected() {
        let params = Addendum1Parameters {
            total_respect_team_override: Some(-1.0),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn nested_sections_deserialize_with_defaults() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{"smoothing": {"window_size": 3}, "addendum": {"total_respect_individual_override": 7022.0}}"#,
        )
        .unwrap();
        assert_eq!(config.smoothing.window_size, 3);
        assert_eq!(config.smoothing.meeting_attendance_requirement_for_members, 12);
        assert_eq!(config.addendum.total_respect_individual_override, Some(7022.0));
        assert_eq!(config.supply, SupplyParameters::default());
    }

    #[test]
    fn curve_uses_bias_and_second_term() {
        let allocation = AllocationParameters::default();
        let curve = allocation.curve();
        assert_eq!(curve.bias, 0.0);
        assert!(!curve.include_second_term);
    }
}
