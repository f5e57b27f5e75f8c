//! Descriptive statistics helpers
//!
//! All functions are total over slices of finite numbers: empty input yields zeros and a
//! zero standard deviation yields zero z-scores rather than NaN or infinity.

use statrs::distribution::{ContinuousCDF, Normal};
use std::cmp::Ordering;

use super::types::StatisticalResult;

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance, 0 for fewer than two values
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Copy of `values` in ascending order
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

/// Percentile of an already sorted slice using linear interpolation between order
/// statistics (`rank = p / 100 * (n - 1)`)
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let fraction = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        }
    }
}

/// Percentile of an unsorted slice
pub fn percentile(values: &[f64], p: f64) -> f64 {
    percentile_sorted(&sorted(values), p)
}

/// Median of an unsorted slice
pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// First quartile, third quartile and interquartile range
pub fn calculate_iqr(values: &[f64]) -> (f64, f64, f64) {
    let s = sorted(values);
    let q1 = percentile_sorted(&s, 25.0);
    let q3 = percentile_sorted(&s, 75.0);
    (q1, q3, q3 - q1)
}

/// Check whether `value` falls outside the IQR fences of `values`
pub fn is_outlier_iqr(value: f64, values: &[f64], multiplier: f64) -> bool {
    if values.len() < 4 {
        return false;
    }
    let (q1, q3, iqr) = calculate_iqr(values);
    value < q1 - multiplier * iqr || value > q3 + multiplier * iqr
}

/// Number of standard deviations `value` lies from `mean`; 0 when `std_dev` is 0
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev <= f64::EPSILON || !std_dev.is_finite() {
        return 0.0;
    }
    (value - mean) / std_dev
}

/// Check whether `value` is more than `threshold` standard deviations from `mean`
pub fn is_outlier_zscore(value: f64, mean: f64, std_dev: f64, threshold: f64) -> bool {
    z_score(value, mean, std_dev).abs() > threshold
}

/// Relative change from `old` to `new` in percent, 0 when `old` is 0
pub fn percentage_change(old: f64, new: f64) -> f64 {
    if old.abs() <= f64::EPSILON {
        return 0.0;
    }
    ((new - old) / old.abs()) * 100.0
}

/// Standard normal cumulative distribution function
pub fn normal_cdf(x: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(x),
        Err(_) => 0.5,
    }
}

/// Two-sided p-value for a standard normal test statistic
pub fn two_sided_p_value(z: f64) -> f64 {
    if !z.is_finite() {
        return if z.is_nan() { 1.0 } else { 0.0 };
    }
    (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0)
}

/// Full descriptive summary with IQR-fenced outliers
pub fn calculate_statistics(values: &[f64], iqr_multiplier: f64) -> StatisticalResult {
    if values.is_empty() {
        return StatisticalResult::default();
    }

    let s = sorted(values);
    let q1 = percentile_sorted(&s, 25.0);
    let q3 = percentile_sorted(&s, 75.0);
    let iqr = q3 - q1;
    let lower_fence = q1 - iqr_multiplier * iqr;
    let upper_fence = q3 + iqr_multiplier * iqr;

    let outliers = values
        .iter()
        .copied()
        .filter(|&v| v < lower_fence || v > upper_fence)
        .collect();

    StatisticalResult {
        count: values.len(),
        mean: mean(values),
        median: percentile_sorted(&s, 50.0),
        standard_deviation: std_dev(values),
        min: s[0],
        max: s[s.len() - 1],
        percentile_25: q1,
        percentile_75: q3,
        percentile_90: percentile_sorted(&s, 90.0),
        percentile_95: percentile_sorted(&s, 95.0),
        outliers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let stats = calculate_statistics(&[], 1.5);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.median, 0.0);
        assert_eq!(stats.standard_deviation, 0.0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 0.0);
        assert!(stats.outliers.is_empty());
        assert_eq!(stats.count, 0);
    }

    #[test]
    fn test_single_value() {
        let stats = calculate_statistics(&[42.0], 1.5);
        assert_eq!(stats.mean, 42.0);
        assert_eq!(stats.median, 42.0);
        assert_eq!(stats.min, 42.0);
        assert_eq!(stats.max, 42.0);
        assert_eq!(stats.standard_deviation, 0.0);
        assert_eq!(stats.percentile_95, 42.0);
        assert!(stats.outliers.is_empty());
    }

    #[test]
    fn test_percentiles_interpolate() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let stats = calculate_statistics(&values, 1.5);
        assert!(approx(stats.percentile_25, 3.25));
        assert!(approx(stats.percentile_75, 7.75));
        assert!(approx(stats.median, 5.5));
        assert!(approx(stats.percentile_90, 9.1));
        assert!(approx(stats.mean, 5.5));
    }

    #[test]
    fn test_iqr_outliers() {
        let values = [10.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 100.0];
        let stats = calculate_statistics(&values, 1.5);
        assert_eq!(stats.outliers, vec![100.0]);
        assert!(is_outlier_iqr(100.0, &values, 1.5));
        assert!(!is_outlier_iqr(14.0, &values, 1.5));
    }

    #[test]
    fn test_population_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(std_dev(&values), 2.0));
        assert_eq!(std_dev(&[3.0]), 0.0);
    }

    #[test]
    fn test_z_score_zero_deviation() {
        assert_eq!(z_score(10.0, 5.0, 0.0), 0.0);
        assert!(approx(z_score(7.0, 5.0, 1.0), 2.0));
        assert!(is_outlier_zscore(9.0, 5.0, 1.0, 3.0));
        assert!(!is_outlier_zscore(9.0, 5.0, 0.0, 3.0));
    }

    #[test]
    fn test_percentage_change() {
        assert!(approx(percentage_change(50.0, 75.0), 50.0));
        assert!(approx(percentage_change(50.0, 25.0), -50.0));
        assert_eq!(percentage_change(0.0, 10.0), 0.0);
    }

    #[test]
    fn test_normal_p_values() {
        assert!((two_sided_p_value(1.96) - 0.05).abs() < 1e-3);
        assert!(approx(two_sided_p_value(0.0), 1.0));
        assert_eq!(two_sided_p_value(f64::INFINITY), 0.0);
    }

    proptest! {
        #[test]
        fn statistics_are_ordered(values in proptest::collection::vec(-1.0e6f64..1.0e6, 1..200)) {
            let stats = calculate_statistics(&values, 1.5);
            prop_assert!(stats.min <= stats.percentile_25 + 1e-9);
            prop_assert!(stats.percentile_25 <= stats.median + 1e-9);
            prop_assert!(stats.median <= stats.percentile_75 + 1e-9);
            prop_assert!(stats.percentile_75 <= stats.percentile_90 + 1e-9);
            prop_assert!(stats.percentile_90 <= stats.percentile_95 + 1e-9);
            prop_assert!(stats.percentile_95 <= stats.max + 1e-9);
            prop_assert!(stats.standard_deviation >= 0.0);
            prop_assert!(stats.mean.is_finite());
        }
    }
}
