//! Respect curves: Level -> Respect.
//!
//! Raw meeting Levels are integers and map through the integer Fibonacci
//! sequence. Smoothed Levels are real-valued and carry uncertainty, so they
//! map through Binet's closed form evaluated in [`Uncertain`] arithmetic.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONTINUOUS_RESPECT_BIAS, DISCRETE_RESPECT_LEVEL_OFFSET};
use crate::error::DomainError;
use crate::uncertain::Uncertain;

/// The golden ratio `(1 + sqrt(5)) / 2`.
pub const PHI: f64 = 1.618_033_988_749_895;

const SQRT_5: f64 = 2.236_067_977_499_79;

/// The nth Fibonacci number with `fib(1) = fib(2) = 1`.
///
/// Negative arguments follow `fib(-n) = (-1)^(n+1) * fib(n)`.
///
/// # Examples
///
/// ```
/// use fractal_core::respect::fibonacci;
/// assert_eq!(fibonacci(10).unwrap(), 55);
/// assert_eq!(fibonacci(-4).unwrap(), -3);
/// ```
pub fn fibonacci(n: i64) -> Result<i64, DomainError> {
    let magnitude = n.unsigned_abs();
    if magnitude == 0 {
        return Ok(0);
    }
    // (a, b) = (fib(k - 1), fib(k))
    let mut a: i64 = 0;
    let mut b: i64 = 1;
    for _ in 1..magnitude {
        let next = a.checked_add(b).ok_or(DomainError::FibonacciOverflow(n))?;
        a = b;
        b = next;
    }
    if n < 0 && magnitude % 2 == 0 {
        return Ok(-b);
    }
    Ok(b)
}

/// Units of Respect for a raw meeting Level: `fib(level + 2)`.
///
/// # Examples
///
/// ```
/// use fractal_core::respect::discrete_respect;
/// assert_eq!(discrete_respect(4).unwrap(), 8);
/// assert!(discrete_respect(0).is_err());
/// ```
pub fn discrete_respect(level: i64) -> Result<i64, DomainError> {
    if level < 1 {
        return Err(DomainError::LevelBelowOne(level));
    }
    fibonacci(level + DISCRETE_RESPECT_LEVEL_OFFSET)
}

/// Continuous Fibonacci curve `fib(level + bias)` via Binet's formula.
///
/// ```text
/// fib(n) ~= phi^n / sqrt(5) - cos(n * pi) * phi^(-n) / sqrt(5)
/// ```
///
/// The second term is optional; without it the curve is the leading-order
/// approximation. There is no domain restriction.
pub fn continuous_respect(level: &Uncertain, bias: f64, include_second_term: bool) -> Uncertain {
    let n = level + bias;
    let first = n.exp_base(PHI) / SQRT_5;
    if !include_second_term {
        return first;
    }
    let second = (&n * PI).cos() * (-&n).exp_base(PHI) / SQRT_5;
    first - second
}

/// Parameters of the continuous Respect curve.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct ContinuousRespect {
    pub bias: f64,
    pub include_second_term: bool,
}

impl Default for ContinuousRespect {
    fn default() -> Self {
        Self {
            bias: DEFAULT_CONTINUOUS_RESPECT_BIAS,
            include_second_term: true,
        }
    }
}

impl ContinuousRespect {
    pub fn new(bias: f64, include_second_term: bool) -> Self {
        Self {
            bias,
            include_second_term,
        }
    }

    pub fn evaluate(&self, level: &Uncertain) -> Uncertain {
        continuous_respect(level, self.bias, self.include_second_term)
    }

    /// Nominal value only.
    pub fn evaluate_f64(&self, level: f64) -> f64 {
        self.evaluate(&Uncertain::exact(level)).nominal()
    }
}
