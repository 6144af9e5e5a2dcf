//! Token supply schedule implementing the [`SupplySchedule`] trait.
//!
//! Emission rate at time `t` (in meetings) is `R0 * 2^(-(t - 1) / H)`. Its
//! antiderivative is
//!
//! ```text
//! integral_start(t) = -(H / ln 2) * 2^(-(t - 1) / H)
//! integral_end(t)   = integral_start(t + 1)
//! ```
//!
//! The decay regime ends at the crossover `T* = -log2(log2 C / (1 + log2 C))`
//! half-lives. From `ceil(T* H)` on, supply grows as
//! `S(T*) * C^((t / H) - T*)`. The single meeting between `floor(T* H)` and
//! `ceil(T* H)` is the transition band, whose token integral bridges both
//! regimes.

use serde::Serialize;
use tracing::{debug, trace};

use fractal_core::traits::SupplySchedule;
use fractal_core::types::MeetingId;
use fractal_core::DomainError;

use crate::params::{SupplyParameters, SupplyReportingMode};

/// Which branch of the schedule produced a point.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupplyRegime {
    Decay,
    Transition,
    ConstantInflation,
}

/// Every derived scalar of the schedule at one meeting.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TokenSupplyPoint {
    pub time: f64,
    pub regime: SupplyRegime,
    pub integral_start: f64,
    pub integral_end: f64,
    /// `integral_end - integral_start`, in units of `R0`.
    pub integral: f64,
    /// Tokens minted during the meeting.
    pub token_integral: f64,
    /// Cumulative supply under the decay formula.
    pub token_supply_before_transition: f64,
    /// Cumulative supply under the constant-inflation formula.
    pub token_supply_after_transition: f64,
    /// Reported cumulative supply.
    pub token_supply: f64,
}

/// The production token supply schedule.
#[derive(Clone, Debug)]
pub struct TokenSupplySchedule {
    params: SupplyParameters,
    /// `T*`, in half-lives.
    transition_to_constant_inflation: f64,
    time_before_transition: f64,
    time_after_transition: f64,
    token_supply_at_transition: f64,
    integral_start_week_1: f64,
}

impl Default for TokenSupplySchedule {
    fn default() -> Self {
        Self::from_valid(SupplyParameters::default())
    }
}

impl TokenSupplySchedule {
    pub fn new(params: SupplyParameters) -> Result<Self, DomainError> {
        params.validate()?;
        Ok(Self::from_valid(params))
    }

    fn from_valid(params: SupplyParameters) -> Self {
        let h = params.half_life;
        let log2_c = params.constant_inflation_rate.log2();
        let transition = -(log2_c / (1.0 + log2_c)).log2();
        let time_at_transition = transition * h;
        let token_supply_at_transition = (params.token_inflation_rate * h
            / std::f64::consts::LN_2)
            * (1.0 - 2f64.powf(-transition));
        let integral_start_week_1 = raw_integral_start(h, 1.0);

        debug!(
            transition_to_constant_inflation = transition,
            time_at_transition,
            token_supply_at_transition,
            "token supply schedule"
        );

        Self {
            params,
            transition_to_constant_inflation: transition,
            time_before_transition: time_at_transition.floor(),
            time_after_transition: time_at_transition.ceil(),
            token_supply_at_transition,
            integral_start_week_1,
        }
    }

    pub fn params(&self) -> &SupplyParameters {
        &self.params
    }

    /// Crossover to constant inflation, in half-lives.
    pub fn transition_to_constant_inflation(&self) -> f64 {
        self.transition_to_constant_inflation
    }

    /// Crossover to constant inflation, in meetings.
    pub fn time_at_transition(&self) -> f64 {
        self.transition_to_constant_inflation * self.params.half_life
    }

    /// Cumulative decay-regime supply at the crossover.
    pub fn token_supply_at_transition(&self) -> f64 {
        self.token_supply_at_transition
    }

    pub fn integral_start(&self, time: f64) -> Result<f64, DomainError> {
        check_time(time)?;
        Ok(raw_integral_start(self.params.half_life, time))
    }

    pub fn integral_end(&self, time: f64) -> Result<f64, DomainError> {
        check_time(time)?;
        Ok(raw_integral_start(self.params.half_life, time + 1.0))
    }

    /// Evaluate the schedule at `time >= 1`.
    pub fn point(&self, time: f64) -> Result<TokenSupplyPoint, DomainError> {
        let r0 = self.params.token_inflation_rate;
        let h = self.params.half_life;
        let c = self.params.constant_inflation_rate;

        let integral_start = self.integral_start(time)?;
        let integral_end = self.integral_end(time)?;
        let integral = integral_end - integral_start;

        let t0_delta = (time - 1.0) / h - self.transition_to_constant_inflation;
        let t1_delta = time / h - self.transition_to_constant_inflation;
        trace!(time, t0_delta, t1_delta, "supply period offsets");

        let before = (integral_end - self.integral_start_week_1) * r0;
        let after = self.token_supply_at_transition * c.powf(t1_delta);

        let (regime, token_integral, token_supply) = if time < self.time_before_transition {
            (SupplyRegime::Decay, integral * r0, before)
        } else if time < self.time_after_transition {
            let token_integral = after - (integral_start - self.integral_start_week_1) * r0;
            let token_supply = match self.params.reporting_mode {
                SupplyReportingMode::AsPublished => before,
                SupplyReportingMode::Corrected => after,
            };
            (SupplyRegime::Transition, token_integral, token_supply)
        } else {
            let token_integral =
                self.token_supply_at_transition * (c.powf(t1_delta) - c.powf(t0_delta));
            (SupplyRegime::ConstantInflation, token_integral, after)
        };

        Ok(TokenSupplyPoint {
            time,
            regime,
            integral_start,
            integral_end,
            integral,
            token_integral,
            token_supply_before_transition: before,
            token_supply_after_transition: after,
            token_supply,
        })
    }

    /// One point per meeting `1..=max_meeting_id`.
    pub fn table(&self, max_meeting_id: MeetingId) -> Result<Vec<TokenSupplyPoint>, DomainError> {
        (1..=max_meeting_id).map(|id| self.point(f64::from(id))).collect()
    }
}

impl SupplySchedule for TokenSupplySchedule {
    fn token_integral(&self, time: f64) -> Result<f64, DomainError> {
        Ok(self.point(time)?.token_integral)
    }

    fn token_supply(&self, time: f64) -> Result<f64, DomainError> {
        Ok(self.point(time)?.token_supply)
    }
}

fn check_time(time: f64) -> Result<(), DomainError> {
    // Also rejects NaN.
    if time >= 1.0 {
        Ok(())
    } else {
        Err(DomainError::TimeBeforeFirstMeeting(time))
    }
}

fn raw_integral_start(half_life: f64, time: f64) -> f64 {
    -(half_life / std::f64::consts::LN_2) * 2f64.powf(-(time - 1.0) / half_life)
}
