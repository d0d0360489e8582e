//! Small descriptive-statistics helpers.
//!
//! Callers pass only the values that are present. Empty inputs produce
//! `None` instead of NaN.

use crate::models::SalaryStats;

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median (average of the two middle values for even lengths).
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// `numerator / denominator`, undefined when either side is missing,
/// the denominator is zero, or the result is not finite.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d).filter(|r| r.is_finite()),
        _ => None,
    }
}

/// Percentage of `part` in `total`, rounded to 2 decimals (half to even).
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}

/// Round to 2 decimals, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Median, mean, quartiles and count of a sample.
pub fn describe(values: &[f64]) -> Option<SalaryStats> {
    Some(SalaryStats {
        median: median(values)?,
        mean: mean(values)?,
        q1: quantile(values, 0.25)?,
        q3: quantile(values, 0.75)?,
        count: values.len(),
    })
}
