//! Regression and trend engine
//!
//! Ordinary least-squares regression over index-as-x, Pearson correlation between two
//! series and the Mann-Kendall monotonic trend test. Insufficient or degenerate input
//! produces a zeroed, non-significant result.

use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::trace;

use super::stats::{mean, two_sided_p_value};
use super::types::{
    CorrelationResult, CorrelationStrength, MannKendallResult, MonotonicTrend,
    RegressionResult, Relationship, Significance,
};
use crate::config::CorrelationThresholds;

/// Significance level used when none is configured
pub const DEFAULT_SIGNIFICANCE_ALPHA: f64 = 0.05;

/// Minimum points for a regression or correlation
pub const MIN_REGRESSION_POINTS: usize = 3;

/// Minimum points for the Mann-Kendall test
pub const MIN_MANN_KENDALL_POINTS: usize = 4;

/// Centered sum of squares no larger than rounding error at the series' magnitude
fn is_degenerate(sum_of_squares: f64, values: &[f64]) -> bool {
    let magnitude = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let tolerance = 4.0 * f64::EPSILON * magnitude;
    sum_of_squares <= values.len() as f64 * tolerance * tolerance
}

/// Two-sided p-value of a Pearson correlation via the t distribution with n - 2 dof
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < MIN_REGRESSION_POINTS || !r.is_finite() {
        return 1.0;
    }
    let one_minus_r2 = 1.0 - r * r;
    if one_minus_r2 <= f64::EPSILON {
        return 0.0;
    }

    let dof = (n - 2) as f64;
    let t = r * (dof / one_minus_r2).sqrt();
    match StudentsT::new(0.0, 1.0, dof) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Pearson r of two equal-length series, `None` when either has no variance
fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let mean_a = mean(a);
    let mean_b = mean(b);

    let mut sab = 0.0;
    let mut saa = 0.0;
    let mut sbb = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        sab += dx * dy;
        saa += dx * dx;
        sbb += dy * dy;
    }

    if is_degenerate(saa, a) || is_degenerate(sbb, b) {
        return None;
    }

    Some((sab / (saa * sbb).sqrt()).clamp(-1.0, 1.0))
}

/// Linear regression at the default significance level
pub fn calculate_linear_regression(values: &[f64]) -> RegressionResult {
    calculate_linear_regression_with_alpha(values, DEFAULT_SIGNIFICANCE_ALPHA)
}

/// Ordinary least-squares fit of `values` against their 0-based index
///
/// Fewer than three points yield an all-zero result with `p_value = 1`. A constant series
/// yields slope, correlation and r² of zero with the intercept at the mean.
pub fn calculate_linear_regression_with_alpha(values: &[f64], alpha: f64) -> RegressionResult {
    let n = values.len();
    if n < MIN_REGRESSION_POINTS {
        return RegressionResult::insufficient(n);
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        let dy = y - y_mean;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if is_degenerate(syy, values) {
        trace!(points = n, "zero variance series, returning flat regression");
        return RegressionResult {
            slope: 0.0,
            intercept: y_mean,
            r_squared: 0.0,
            correlation: 0.0,
            p_value: 1.0,
            is_significant: false,
            data_points: n,
        };
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let correlation = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let p_value = correlation_p_value(correlation, n);

    RegressionResult {
        slope,
        intercept,
        r_squared: correlation * correlation,
        correlation,
        p_value,
        is_significant: p_value < alpha,
        data_points: n,
    }
}

fn zero_correlation(
    label_a: &str,
    label_b: &str,
    sample_size: usize,
) -> CorrelationResult {
    CorrelationResult {
        metric_a: label_a.to_string(),
        metric_b: label_b.to_string(),
        correlation_coefficient: 0.0,
        relationship: Relationship::None,
        strength: CorrelationStrength::Weak,
        significance: Significance::NotSignificant,
        p_value: 1.0,
        sample_size,
    }
}

/// Classify |r| into a strength bucket
pub fn correlation_strength(r: f64, thresholds: &CorrelationThresholds) -> CorrelationStrength {
    let magnitude = r.abs();
    if magnitude < thresholds.weak_upper {
        CorrelationStrength::Weak
    } else if magnitude <= thresholds.strong_lower {
        CorrelationStrength::Moderate
    } else {
        CorrelationStrength::Strong
    }
}

/// Classify the sign of r, treating values near zero as no relationship
pub fn correlation_relationship(r: f64, thresholds: &CorrelationThresholds) -> Relationship {
    if r.abs() < thresholds.none_threshold {
        Relationship::None
    } else if r > 0.0 {
        Relationship::Positive
    } else {
        Relationship::Negative
    }
}

/// Pearson correlation between two series
///
/// Series of different lengths, fewer than three points or zero variance give a zero
/// coefficient with no relationship.
pub fn calculate_correlation(
    series_a: &[f64],
    series_b: &[f64],
    label_a: &str,
    label_b: &str,
    thresholds: &CorrelationThresholds,
) -> CorrelationResult {
    if series_a.len() != series_b.len() {
        trace!(
            len_a = series_a.len(),
            len_b = series_b.len(),
            "mismatched series lengths, correlation skipped"
        );
        return zero_correlation(label_a, label_b, 0);
    }

    let n = series_a.len();
    if n < MIN_REGRESSION_POINTS {
        return zero_correlation(label_a, label_b, n);
    }

    let Some(r) = pearson(series_a, series_b) else {
        return zero_correlation(label_a, label_b, n);
    };

    let p_value = correlation_p_value(r, n);
    CorrelationResult {
        metric_a: label_a.to_string(),
        metric_b: label_b.to_string(),
        correlation_coefficient: r,
        relationship: correlation_relationship(r, thresholds),
        strength: correlation_strength(r, thresholds),
        significance: if p_value < thresholds.significance_alpha {
            Significance::Significant
        } else {
            Significance::NotSignificant
        },
        p_value,
        sample_size: n,
    }
}

/// Σ t(t-1)(2t+5) over groups of tied values
fn tie_correction(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut correction = 0.0;
    let mut run = 1usize;
    for i in 1..=sorted.len() {
        if i < sorted.len() && sorted[i] == sorted[i - 1] {
            run += 1;
        } else {
            if run > 1 {
                let t = run as f64;
                correction += t * (t - 1.0) * (2.0 * t + 5.0);
            }
            run = 1;
        }
    }
    correction
}

/// Mann-Kendall test at the default significance level
pub fn mann_kendall_trend_test(values: &[f64]) -> MannKendallResult {
    mann_kendall_trend_test_with_alpha(values, DEFAULT_SIGNIFICANCE_ALPHA)
}

/// Non-parametric test for a monotonic trend
///
/// Uses the normal approximation of S with tie-corrected variance and a continuity
/// correction. A trend is reported only when the two-sided p-value is below `alpha`.
/// At `alpha = 0.05` a perfectly monotonic series needs 5 points: with 4 the smallest
/// attainable p-value is about 0.089.
pub fn mann_kendall_trend_test_with_alpha(values: &[f64], alpha: f64) -> MannKendallResult {
    let n = values.len();
    if n < MIN_MANN_KENDALL_POINTS {
        return MannKendallResult::insufficient(n);
    }

    let mut s: i64 = 0;
    for i in 0..n - 1 {
        for j in i + 1..n {
            let diff = values[j] - values[i];
            if diff > 0.0 {
                s += 1;
            } else if diff < 0.0 {
                s -= 1;
            }
        }
    }

    let nf = n as f64;
    let pairs = nf * (nf - 1.0) / 2.0;
    let tau = s as f64 / pairs;
    let variance = (nf * (nf - 1.0) * (2.0 * nf + 5.0) - tie_correction(values)) / 18.0;

    if variance <= 0.0 {
        return MannKendallResult {
            s_statistic: s,
            tau,
            ..MannKendallResult::insufficient(n)
        };
    }

    let sd = variance.sqrt();
    let z_score = match s.signum() {
        1 => (s as f64 - 1.0) / sd,
        -1 => (s as f64 + 1.0) / sd,
        _ => 0.0,
    };
    let p_value = two_sided_p_value(z_score);
    let is_significant = p_value < alpha;

    let trend = if !is_significant {
        MonotonicTrend::NoTrend
    } else if s > 0 {
        MonotonicTrend::Increasing
    } else {
        MonotonicTrend::Decreasing
    };

    MannKendallResult {
        s_statistic: s,
        tau,
        variance,
        z_score,
        p_value,
        trend,
        is_significant,
        data_points: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> CorrelationThresholds {
        CorrelationThresholds::default()
    }

    #[test]
    fn test_regression_insufficient_points() {
        for values in [vec![], vec![1.0], vec![1.0, 2.0]] {
            let result = calculate_linear_regression(&values);
            assert_eq!(result.slope, 0.0);
            assert_eq!(result.intercept, 0.0);
            assert_eq!(result.r_squared, 0.0);
            assert_eq!(result.correlation, 0.0);
            assert_eq!(result.p_value, 1.0);
            assert!(!result.is_significant);
        }
    }

    #[test]
    fn test_regression_increasing_series() {
        let result = calculate_linear_regression(&[10.0, 15.0, 20.0, 25.0, 30.0, 35.0]);
        assert!((result.slope - 5.0).abs() < 0.1);
        assert!((result.intercept - 10.0).abs() < 1e-9);
        assert!((result.r_squared - 1.0).abs() < 1e-9);
        assert!(result.correlation > 0.99);
        assert!(result.is_significant);
        assert!((result.predict(6.0) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_regression_decreasing_series() {
        let result = calculate_linear_regression(&[100.0, 90.0, 80.0, 70.0, 60.0, 50.0]);
        assert!((result.slope + 10.0).abs() < 0.1);
        assert!(result.correlation < 0.0);
        assert!((result.r_squared - 1.0).abs() < 1e-9);
        assert!(result.is_significant);
    }

    #[test]
    fn test_regression_constant_series() {
        let result = calculate_linear_regression(&[50.0, 50.0, 50.0, 50.0, 50.0]);
        assert_eq!(result.slope, 0.0);
        assert_eq!(result.r_squared, 0.0);
        assert_eq!(result.correlation, 0.0);
        assert_eq!(result.intercept, 50.0);
        assert!(!result.is_significant);
        assert!(result.slope.is_finite() && result.intercept.is_finite());
    }

    #[test]
    fn test_regression_large_offset() {
        let values: Vec<f64> = (0..6).map(|i| 1e9 + i as f64).collect();
        let result = calculate_linear_regression(&values);
        assert!((result.slope - 1.0).abs() < 1e-9);
        assert!((result.r_squared - 1.0).abs() < 1e-9);
        assert!((result.intercept - 1e9).abs() < 1e-3);

        let flat = calculate_linear_regression(&[1e9; 6]);
        assert_eq!(flat.slope, 0.0);
        assert_eq!(flat.r_squared, 0.0);
    }

    #[test]
    fn test_regression_noisy_series_not_significant() {
        let result = calculate_linear_regression(&[5.0, 9.0, 4.0, 8.0, 5.0, 9.0, 4.0, 8.0]);
        assert!(result.r_squared < 0.2);
        assert!(!result.is_significant);
    }

    #[test]
    fn test_correlation_mismatched_lengths() {
        let result = calculate_correlation(&[1.0, 2.0, 3.0], &[1.0, 2.0], "fps", "cpu", &thresholds());
        assert_eq!(result.correlation_coefficient, 0.0);
        assert_eq!(result.relationship, Relationship::None);
        assert_eq!(result.significance, Significance::NotSignificant);
        assert_eq!(result.metric_a, "fps");
    }

    #[test]
    fn test_correlation_strong_positive_and_negative() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [2.1, 3.9, 6.2, 8.1, 9.8, 12.2];
        let result = calculate_correlation(&a, &b, "memory", "cpu", &thresholds());
        assert!(result.correlation_coefficient > 0.99);
        assert_eq!(result.relationship, Relationship::Positive);
        assert_eq!(result.strength, CorrelationStrength::Strong);
        assert_eq!(result.significance, Significance::Significant);

        let inverse: Vec<f64> = b.iter().map(|v| -v).collect();
        let result = calculate_correlation(&a, &inverse, "memory", "fps", &thresholds());
        assert_eq!(result.relationship, Relationship::Negative);
        assert_eq!(result.strength, CorrelationStrength::Strong);
    }

    #[test]
    fn test_correlation_large_offset() {
        let a: Vec<f64> = (0..5).map(|i| 1e9 + i as f64).collect();
        let b = [10.0, 20.0, 30.0, 40.0, 50.0];
        let result = calculate_correlation(&a, &b, "load", "cpu", &thresholds());
        assert!((result.correlation_coefficient - 1.0).abs() < 1e-9);
        assert_eq!(result.relationship, Relationship::Positive);
    }

    #[test]
    fn test_correlation_zero_variance() {
        let result = calculate_correlation(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0], "a", "b", &thresholds());
        assert_eq!(result.correlation_coefficient, 0.0);
        assert_eq!(result.relationship, Relationship::None);
        assert_eq!(result.sample_size, 3);
    }

    #[test]
    fn test_correlation_buckets_use_thresholds() {
        let t = thresholds();
        assert_eq!(correlation_strength(0.2, &t), CorrelationStrength::Weak);
        assert_eq!(correlation_strength(-0.5, &t), CorrelationStrength::Moderate);
        assert_eq!(correlation_strength(0.7, &t), CorrelationStrength::Moderate);
        assert_eq!(correlation_strength(0.71, &t), CorrelationStrength::Strong);
        assert_eq!(correlation_relationship(0.05, &t), Relationship::None);
        assert_eq!(correlation_relationship(-0.4, &t), Relationship::Negative);

        let custom = CorrelationThresholds {
            weak_upper: 0.5,
            ..CorrelationThresholds::default()
        };
        assert_eq!(correlation_strength(0.4, &custom), CorrelationStrength::Weak);
    }

    #[test]
    fn test_mann_kendall_increasing() {
        let result = mann_kendall_trend_test(&[1.0, 3.0, 5.0, 7.0, 9.0, 11.0, 13.0, 15.0]);
        assert!(result.tau > 0.5);
        assert_eq!(result.trend, MonotonicTrend::Increasing);
        assert!(result.is_significant);
        assert_eq!(result.s_statistic, 28);
    }

    #[test]
    fn test_mann_kendall_decreasing() {
        let result = mann_kendall_trend_test(&[15.0, 13.0, 11.0, 9.0, 7.0, 5.0, 3.0, 1.0]);
        assert!(result.tau < -0.5);
        assert_eq!(result.trend, MonotonicTrend::Decreasing);
        assert!(result.is_significant);
    }

    #[test]
    fn test_mann_kendall_robust_to_outlier() {
        let result = mann_kendall_trend_test(&[1.0, 2.0, 3.0, 100.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(result.s_statistic, 20);
        assert_eq!(result.trend, MonotonicTrend::Increasing);
    }

    #[test]
    fn test_mann_kendall_insufficient_and_ties() {
        let result = mann_kendall_trend_test(&[1.0, 2.0, 3.0]);
        assert_eq!(result.tau, 0.0);
        assert_eq!(result.trend, MonotonicTrend::NoTrend);
        assert!(!result.is_significant);

        let result = mann_kendall_trend_test(&[5.0, 5.0, 5.0, 5.0, 5.0]);
        assert_eq!(result.trend, MonotonicTrend::NoTrend);
        assert_eq!(result.s_statistic, 0);
        assert!(result.p_value.is_finite());
    }

    #[test]
    fn test_mann_kendall_needs_five_points_at_default_alpha() {
        let four = mann_kendall_trend_test(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(four.tau, 1.0);
        assert_eq!(four.s_statistic, 6);
        assert!((four.p_value - 0.0894).abs() < 1e-3);
        assert_eq!(four.trend, MonotonicTrend::NoTrend);

        let five = mann_kendall_trend_test(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(five.p_value < 0.05);
        assert_eq!(five.trend, MonotonicTrend::Increasing);
    }

    #[test]
    fn test_tie_correction() {
        // one group of three ties: 3 * 2 * 11 = 66
        assert_eq!(tie_correction(&[1.0, 2.0, 2.0, 2.0, 3.0]), 66.0);
        assert_eq!(tie_correction(&[1.0, 2.0, 3.0]), 0.0);
    }
}
