//! Token supply schedule parameters.

use serde::{Deserialize, Serialize};

use fractal_core::constants::{
    DEFAULT_CONSTANT_INFLATION_RATE, DEFAULT_HALF_LIFE, DEFAULT_TOKEN_INFLATION_RATE,
};
use fractal_core::DomainError;

/// Which cumulative supply the schedule reports inside the transition band.
///
/// The published reference table keeps reporting the decay-regime supply for
/// the one meeting between `floor(T* H)` and `ceil(T* H)`. `Corrected`
/// reports the constant-inflation supply there instead.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SupplyReportingMode {
    #[default]
    AsPublished,
    Corrected,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SupplyParameters {
    /// Tokens minted in the first week, `R0`.
    pub token_inflation_rate: f64,
    /// Half-life of the emission decay in weeks, `H`.
    pub half_life: f64,
    /// Long-run multiplicative inflation per half-life, `C`.
    pub constant_inflation_rate: f64,
    pub reporting_mode: SupplyReportingMode,
}

impl Default for SupplyParameters {
    fn default() -> Self {
        Self {
            token_inflation_rate: DEFAULT_TOKEN_INFLATION_RATE,
            half_life: DEFAULT_HALF_LIFE,
            constant_inflation_rate: DEFAULT_CONSTANT_INFLATION_RATE,
            reporting_mode: SupplyReportingMode::default(),
        }
    }
}

impl SupplyParameters {
    /// Reject parameters for which the schedule is undefined.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.token_inflation_rate.is_finite() || self.token_inflation_rate < 0.0 {
            return Err(DomainError::InvalidParameter {
                name: "token_inflation_rate",
                value: self.token_inflation_rate,
            });
        }
        if !self.half_life.is_finite() || self.half_life <= 0.0 {
            return Err(DomainError::InvalidParameter {
                name: "half_life",
                value: self.half_life,
            });
        }
        // log2(C) must be positive for the crossover time to exist.
        if !self.constant_inflation_rate.is_finite() || self.constant_inflation_rate <= 1.0 {
            return Err(DomainError::InvalidParameter {
                name: "constant_inflation_rate",
                value: self.constant_inflation_rate,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = SupplyParameters::default();
        assert_eq!(p.token_inflation_rate, 1_000_000.0);
        assert_eq!(p.half_life, 52.0);
        assert_eq!(p.constant_inflation_rate, 1.05);
        assert_eq!(p.reporting_mode, SupplyReportingMode::AsPublished);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_parameters() {
        let bad = [
            SupplyParameters { half_life: 0.0, ..Default::default() },
            SupplyParameters { half_life: f64::NAN, ..Default::default() },
            SupplyParameters { constant_inflation_rate: 1.0, ..Default::default() },
            SupplyParameters { token_inflation_rate: -1.0, ..Default::default() },
        ];
        for p in bad {
            assert!(matches!(p.validate(), Err(DomainError::InvalidParameter { .. })), "{p:?}");
        }
    }

    #[test]
    fn partial_json_uses_defaults() {
        let p: SupplyParameters =
            serde_json::from_str(r#"{"half_life": 26.0, "reporting_mode": "Corrected"}"#).unwrap();
        assert_eq!(p.half_life, 26.0);
        assert_eq!(p.token_inflation_rate, 1_000_000.0);
        assert_eq!(p.reporting_mode, SupplyReportingMode::Corrected);
    }
}
