//! Values with a nominal value and first-order (linear) error propagation.
//!
//! Each independent measurement created with a non-zero standard deviation
//! gets its own variable id. A derived value keeps, per variable, the
//! partial derivative multiplied by that variable's standard deviation, so
//!
//! ```text
//! std_dev(f) = sqrt( sum_i (df/dx_i * sigma_i)^2 )
//! ```
//!
//! Correlations are exact to first order: `x - x` has zero uncertainty, and
//! `x * x` has twice the relative uncertainty of `x`.

use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::atomic::{AtomicU64, Ordering};

use num_traits::Zero;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

static NEXT_VARIABLE_ID: AtomicU64 = AtomicU64::new(1);

/// A real number with a standard deviation.
#[derive(Clone, Debug, Default)]
pub struct Uncertain {
    nominal: f64,
    // variable id -> d(self)/d(variable) * std_dev(variable)
    terms: BTreeMap<u64, f64>,
}

impl Uncertain {
    /// A new independent measurement.
    ///
    /// A zero `std_dev` yields an exact value that is correlated with nothing.
    pub fn new(nominal: f64, std_dev: f64) -> Self {
        if std_dev == 0.0 {
            return Self::exact(nominal);
        }
        let id = NEXT_VARIABLE_ID.fetch_add(1, Ordering::Relaxed);
        let mut terms = BTreeMap::new();
        terms.insert(id, std_dev);
        Self { nominal, terms }
    }

    /// A value without uncertainty.
    pub fn exact(nominal: f64) -> Self {
        Self {
            nominal,
            terms: BTreeMap::new(),
        }
    }

    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    pub fn std_dev(&self) -> f64 {
        self.terms.values().map(|c| c * c).sum::<f64>().sqrt()
    }

    /// True when no variable contributes to this value.
    pub fn is_exact(&self) -> bool {
        self.terms.values().all(|c| *c == 0.0)
    }

    /// `f(self)` given `f(nominal)` and `f'(nominal)`.
    fn map(&self, value: f64, derivative: f64) -> Self {
        let mut terms = BTreeMap::new();
        for (id, c) in &self.terms {
            let scaled = derivative * c;
            if scaled != 0.0 {
                terms.insert(*id, scaled);
            }
        }
        Self {
            nominal: value,
            terms,
        }
    }

    /// `f(a, b)` given the value and both partial derivatives.
    fn combine(value: f64, a: &Self, da: f64, b: &Self, db: f64) -> Self {
        let mut terms: BTreeMap<u64, f64> = BTreeMap::new();
        for (id, c) in &a.terms {
            *terms.entry(*id).or_insert(0.0) += da * c;
        }
        for (id, c) in &b.terms {
            *terms.entry(*id).or_insert(0.0) += db * c;
        }
        terms.retain(|_, c| *c != 0.0);
        Self {
            nominal: value,
            terms,
        }
    }

    pub fn cos(&self) -> Self {
        self.map(self.nominal.cos(), -self.nominal.sin())
    }

    pub fn sin(&self) -> Self {
        self.map(self.nominal.sin(), self.nominal.cos())
    }

    pub fn sqrt(&self) -> Self {
        let value = self.nominal.sqrt();
        self.map(value, 0.5 / value)
    }

    pub fn exp(&self) -> Self {
        let value = self.nominal.exp();
        self.map(value, value)
    }

    pub fn ln(&self) -> Self {
        self.map(self.nominal.ln(), 1.0 / self.nominal)
    }

    /// `self^exponent` for a constant exponent.
    pub fn powf(&self, exponent: f64) -> Self {
        let value = self.nominal.powf(exponent);
        let derivative = if exponent == 0.0 {
            0.0
        } else {
            exponent * self.nominal.powf(exponent - 1.0)
        };
        self.map(value, derivative)
    }

    /// `base^self` for a constant base.
    pub fn exp_base(&self, base: f64) -> Self {
        let value = base.powf(self.nominal);
        self.map(value, value * base.ln())
    }

    /// `self^exponent` where both sides carry uncertainty.
    pub fn pow(&self, exponent: &Self) -> Self {
        let value = self.nominal.powf(exponent.nominal);
        let d_base = if exponent.nominal == 0.0 {
            0.0
        } else {
            exponent.nominal * self.nominal.powf(exponent.nominal - 1.0)
        };
        let d_exponent = if exponent.is_exact() {
            0.0
        } else {
            value * self.nominal.ln()
        };
        Self::combine(value, self, d_base, exponent, d_exponent)
    }

    /// Arithmetic mean. `None` for an empty slice.
    pub fn mean(values: &[Self]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let total: Self = values.iter().sum();
        Some(total / values.len() as f64)
    }
}

fn add_values(a: &Uncertain, b: &Uncertain) -> Uncertain {
    Uncertain::combine(a.nominal + b.nominal, a, 1.0, b, 1.0)
}

fn sub_values(a: &Uncertain, b: &Uncertain) -> Uncertain {
    Uncertain::combine(a.nominal - b.nominal, a, 1.0, b, -1.0)
}

fn mul_values(a: &Uncertain, b: &Uncertain) -> Uncertain {
    Uncertain::combine(a.nominal * b.nominal, a, b.nominal, b, a.nominal)
}

fn div_values(a: &Uncertain, b: &Uncertain) -> Uncertain {
    Uncertain::combine(
        a.nominal / b.nominal,
        a,
        1.0 / b.nominal,
        b,
        -a.nominal / (b.nominal * b.nominal),
    )
}

fn add_scalar(a: &Uncertain, s: f64) -> Uncertain {
    a.map(a.nominal + s, 1.0)
}

fn scalar_add(s: f64, a: &Uncertain) -> Uncertain {
    a.map(s + a.nominal, 1.0)
}

fn sub_scalar(a: &Uncertain, s: f64) -> Uncertain {
    a.map(a.nominal - s, 1.0)
}

fn scalar_sub(s: f64, a: &Uncertain) -> Uncertain {
    a.map(s - a.nominal, -1.0)
}

fn mul_scalar(a: &Uncertain, s: f64) -> Uncertain {
    a.map(a.nominal * s, s)
}

fn scalar_mul(s: f64, a: &Uncertain) -> Uncertain {
    a.map(s * a.nominal, s)
}

fn div_scalar(a: &Uncertain, s: f64) -> Uncertain {
    a.map(a.nominal / s, 1.0 / s)
}

fn scalar_div(s: f64, a: &Uncertain) -> Uncertain {
    a.map(s / a.nominal, -s / (a.nominal * a.nominal))
}

macro_rules! forward_binop {
    ($trait:ident, $method:ident, $values:ident, $scalar_rhs:ident, $scalar_lhs:ident) => {
        impl $trait<&Uncertain> for &Uncertain {
            type Output = Uncertain;
            fn $method(self, rhs: &Uncertain) -> Uncertain {
                $values(self, rhs)
            }
        }

        impl $trait<Uncertain> for Uncertain {
            type Output = Uncertain;
            fn $method(self, rhs: Uncertain) -> Uncertain {
                $values(&self, &rhs)
            }
        }

        impl $trait<&Uncertain> for Uncertain {
            type Output = Uncertain;
            fn $method(self, rhs: &Uncertain) -> Uncertain {
                $values(&self, rhs)
            }
        }

        impl $trait<Uncertain> for &Uncertain {
            type Output = Uncertain;
            fn $method(self, rhs: Uncertain) -> Uncertain {
                $values(self, &rhs)
            }
        }

        impl $trait<f64> for Uncertain {
            type Output = Uncertain;
            fn $method(self, rhs: f64) -> Uncertain {
                $scalar_rhs(&self, rhs)
            }
        }

        impl $trait<f64> for &Uncertain {
            type Output = Uncertain;
            fn $method(self, rhs: f64) -> Uncertain {
                $scalar_rhs(self, rhs)
            }
        }

        impl $trait<Uncertain> for f64 {
            type Output = Uncertain;
            fn $method(self, rhs: Uncertain) -> Uncertain {
                $scalar_lhs(self, &rhs)
            }
        }

        impl $trait<&Uncertain> for f64 {
            type Output = Uncertain;
            fn $method(self, rhs: &Uncertain) -> Uncertain {
                $scalar_lhs(self, rhs)
            }
        }
    };
}

forward_binop!(Add, add, add_values, add_scalar, scalar_add);
forward_binop!(Sub, sub, sub_values, sub_scalar, scalar_sub);
forward_binop!(Mul, mul, mul_values, mul_scalar, scalar_mul);
forward_binop!(Div, div, div_values, div_scalar, scalar_div);

impl Neg for Uncertain {
    type Output = Uncertain;
    fn neg(self) -> Uncertain {
        self.map(-self.nominal, -1.0)
    }
}

impl Neg for &Uncertain {
    type Output = Uncertain;
    fn neg(self) -> Uncertain {
        self.map(-self.nominal, -1.0)
    }
}

impl Sum for Uncertain {
    fn sum<I: Iterator<Item = Uncertain>>(iter: I) -> Self {
        iter.fold(Uncertain::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Uncertain> for Uncertain {
    fn sum<I: Iterator<Item = &'a Uncertain>>(iter: I) -> Self {
        iter.fold(Uncertain::zero(), |acc, x| acc + x)
    }
}

impl Zero for Uncertain {
    fn zero() -> Self {
        Self::exact(0.0)
    }

    fn is_zero(&self) -> bool {
        self.nominal == 0.0 && self.is_exact()
    }
}

impl From<f64> for Uncertain {
    fn from(value: f64) -> Self {
        Self::exact(value)
    }
}

impl fmt::Display for Uncertain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.p$}+/-{:.p$}", self.nominal, self.std_dev(), p = p),
            None => write!(f, "{}+/-{}", self.nominal, self.std_dev()),
        }
    }
}

impl Serialize for Uncertain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Uncertain", 2)?;
        state.serialize_field("nominal", &self.nominal)?;
        state.serialize_field("std_dev", &self.std_dev())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * (1.0 + a.abs().max(b.abs()))
    }

    #[test]
    fn exact_values_have_zero_std_dev() {
        let x = Uncertain::new(3.0, 0.0);
        assert_eq!(x.std_dev(), 0.0);
        assert!(x.is_exact());
        assert!(Uncertain::exact(0.0).is_zero());
    }

    #[test]
    fn independent_sum_adds_in_quadrature() {
        let a = Uncertain::new(1.0, 3.0);
        let b = Uncertain::new(2.0, 4.0);
        let c = &a + &b;
        assert_eq!(c.nominal(), 3.0);
        assert!(close(c.std_dev(), 5.0));
    }

    #[test]
    fn self_difference_is_exact() {
        let a = Uncertain::new(5.0, 2.0);
        let d = &a - &a;
        assert_eq!(d.nominal(), 0.0);
        assert_eq!(d.std_dev(), 0.0);
    }

    #[test]
    fn self_product_is_fully_correlated() {
        let a = Uncertain::new(3.0, 0.1);
        let sq = &a * &a;
        assert!(close(sq.nominal(), 9.0));
        // d(x^2)/dx = 2x = 6
        assert!(close(sq.std_dev(), 0.6));
    }

    #[test]
    fn scalar_operations_scale_std_dev() {
        let a = Uncertain::new(10.0, 2.0);
        assert!(close((&a * 3.0).std_dev(), 6.0));
        assert!(close((3.0 * &a).std_dev(), 6.0));
        assert!(close((&a / 4.0).std_dev(), 0.5));
        assert!(close((&a + 7.0).std_dev(), 2.0));
        assert!(close((7.0 - &a).nominal(), -3.0));
        assert!(close((-&a).std_dev(), 2.0));
    }

    #[test]
    fn division_propagates_both_sides() {
        let a = Uncertain::new(6.0, 0.3);
        let b = Uncertain::new(3.0, 0.0);
        let q = &a / &b;
        assert!(close(q.nominal(), 2.0));
        assert!(close(q.std_dev(), 0.1));
        let r = 12.0 / &b.clone();
        assert!(close(r.nominal(), 4.0));
        assert_eq!(r.std_dev(), 0.0);
    }

    #[test]
    fn cos_derivative() {
        let x = Uncertain::new(std::f64::consts::FRAC_PI_2, 0.01);
        let c = x.cos();
        assert!(c.nominal().abs() < 1e-15);
        assert!(close(c.std_dev(), 0.01));
    }

    #[test]
    fn exp_base_derivative() {
        let x = Uncertain::new(2.0, 0.1);
        let y = x.exp_base(2.0);
        assert!(close(y.nominal(), 4.0));
        assert!(close(y.std_dev(), 4.0 * std::f64::consts::LN_2 * 0.1));
    }

    #[test]
    fn powf_derivative() {
        let x = Uncertain::new(4.0, 0.2);
        let y = x.powf(0.5);
        assert!(close(y.nominal(), 2.0));
        assert!(close(y.std_dev(), 0.25 * 0.2));
        assert!(close(x.sqrt().std_dev(), y.std_dev()));
    }

    #[test]
    fn pow_with_uncertain_exponent() {
        let base = Uncertain::new(2.0, 0.0);
        let exponent = Uncertain::new(3.0, 0.1);
        let y = base.pow(&exponent);
        assert!(close(y.nominal(), 8.0));
        assert!(close(y.std_dev(), 8.0 * std::f64::consts::LN_2 * 0.1));
    }

    #[test]
    fn mean_of_independent_values() {
        let values = vec![Uncertain::new(1.0, 1.0), Uncertain::new(3.0, 1.0)];
        let m = Uncertain::mean(&values).unwrap();
        assert!(close(m.nominal(), 2.0));
        assert!(close(m.std_dev(), (0.5f64).sqrt()));
        assert!(Uncertain::mean(&[]).is_none());
    }

    #[test]
    fn display_respects_precision() {
        let x = Uncertain::new(1.23456, 0.5);
        assert_eq!(format!("{x:.2}"), "1.23+/-0.50");
    }

    #[test]
    fn serializes_nominal_and_std_dev() {
        let x = Uncertain::new(2.0, 0.5);
        let json = serde_json::to_string(&x).unwrap();
        assert_eq!(json, r#"{"nominal":2.0,"std_dev":0.5}"#);
    }

    proptest! {
        #[test]
        fn recursive_average_shrinks_uncertainty(
            seed in 0.1f64..10.0,
            sigma in 0.01f64..5.0,
            steps in 1usize..50,
        ) {
            let window = 6.0;
            let mut value = Uncertain::new(seed, sigma);
            for _ in 0..steps {
                value = ((window - 1.0) * &value + 3.0) / window;
            }
            let expected = sigma * ((window - 1.0) / window).powi(steps as i32);
            prop_assert!((value.std_dev() - expected).abs() <= 1e-9 * sigma);
        }

        #[test]
        fn addition_is_commutative(a in -1e6f64..1e6, b in -1e6f64..1e6, sa in 0.0f64..10.0) {
            let x = Uncertain::new(a, sa);
            let y = Uncertain::exact(b);
            let l = &x + &y;
            let r = &y + &x;
            prop_assert_eq!(l.nominal(), r.nominal());
            prop_assert_eq!(l.std_dev(), r.std_dev());
        }
    }
}
