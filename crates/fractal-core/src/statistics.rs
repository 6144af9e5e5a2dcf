//! Descriptive statistics over plain `f64` samples.
//!
//! Sample standard deviations use `n - 1` degrees of freedom and are `NaN`
//! for fewer than two samples, so a single-meeting member still gets a row
//! in summary tables.

use serde::Serialize;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sum_of_squares(values: &[f64], center: f64) -> f64 {
    values.iter().map(|v| (v - center).powi(2)).sum()
}

/// Sample standard deviation (`ddof = 1`), `None` for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    Some((sum_of_squares(values, m) / (values.len() - 1) as f64).sqrt())
}

/// Population standard deviation (`ddof = 0`), `None` for an empty slice.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some((sum_of_squares(values, m) / values.len() as f64).sqrt())
}

/// Mean and sample standard deviation of a measurement.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Statistics {
    pub mean: f64,
    pub standard_deviation: f64,
}

impl Statistics {
    /// `None` for no samples; `standard_deviation` is `NaN` for one sample.
    pub fn from_samples(values: &[f64]) -> Option<Self> {
        Some(Self {
            mean: mean(values)?,
            standard_deviation: sample_std_dev(values).unwrap_or(f64::NAN),
        })
    }
}

/// Summary of one group of samples: how many, their mean and their sample
/// standard deviation.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct GroupSummary {
    pub count: usize,
    pub mean: f64,
    pub standard_deviation: f64,
}

/// Count-weighted "mean of means".
pub fn combined_mean(groups: &[GroupSummary]) -> Option<f64> {
    let total: usize = groups.iter().map(|g| g.count).sum();
    if total == 0 {
        return None;
    }
    let weighted: f64 = groups.iter().map(|g| g.count as f64 * g.mean).sum();
    Some(weighted / total as f64)
}

/// Combined standard deviation of several groups.
///
/// ```text
/// ess  = sum((n_i - 1) * s_i^2)              NaN s_i skipped
/// tgss = sum(n_i * (m_i - mean(m))^2)        mean(m) is unweighted
/// sqrt((ess + tgss) / (sum(n_i) - 1))
/// ```
///
/// `None` when the pooled sample has fewer than two observations.
pub fn combined_standard_deviation(groups: &[GroupSummary]) -> Option<f64> {
    let total: usize = groups.iter().map(|g| g.count).sum();
    if total < 2 {
        return None;
    }
    let means: Vec<f64> = groups.iter().map(|g| g.mean).collect();
    let mean_of_means = mean(&means)?;
    let ess: f64 = groups
        .iter()
        .map(|g| (g.count as f64 - 1.0) * g.standard_deviation.powi(2))
        .filter(|term| !term.is_nan())
        .sum();
    let tgss: f64 = groups
        .iter()
        .map(|g| g.count as f64 * (g.mean - mean_of_means).powi(2))
        .sum();
    Some(((ess + tgss) / (total - 1) as f64).sqrt())
}

/// Ramp-up values for the first `window_size` positions: the running sum
/// divided by the full window size.
///
/// # Examples
///
/// ```
/// use fractal_core::statistics::progressive_mean;
/// assert_eq!(progressive_mean(&[3.0, 3.0, 3.0, 9.0], 3), vec![1.0, 2.0, 3.0]);
/// ```
pub fn progressive_mean(levels: &[f64], window_size: usize) -> Vec<f64> {
    let divisor = window_size as f64;
    levels
        .iter()
        .take(window_size)
        .scan(0.0, |running, level| {
            *running += level;
            Some(*running / divisor)
        })
        .collect()
}
