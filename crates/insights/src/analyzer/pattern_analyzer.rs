//! Pattern Analyzer
//!
//! Finds recurring hourly, daily and weekly cycles in a metric series. Samples are grouped
//! into cycle buckets (five-minute slots, hours of day, days of week) and a cycle is only
//! reported when the bucket means explain a meaningful share of the variance, neighbouring
//! buckets move together, and, when buckets hold repeated samples, a one-way ANOVA F-test
//! rejects the flat hypothesis.

use chrono::{Datelike, Duration, Timelike};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use tracing::{debug, trace};

use super::stats::mean;
use super::types::{MetricSample, MetricType, SeasonalPattern, SeasonalPatternType};
use crate::config::SeasonalConfig;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Bucket layout of one cycle length
#[derive(Debug, Clone, Copy)]
struct CycleLayout {
    pattern_type: SeasonalPatternType,
    buckets: usize,
    min_samples: usize,
    min_span: Duration,
}

impl CycleLayout {
    fn for_type(pattern_type: SeasonalPatternType) -> Self {
        match pattern_type {
            SeasonalPatternType::Hourly => Self {
                pattern_type,
                buckets: 12,
                min_samples: 12,
                min_span: Duration::minutes(55),
            },
            SeasonalPatternType::Daily => Self {
                pattern_type,
                buckets: 24,
                min_samples: 24,
                min_span: Duration::hours(23),
            },
            SeasonalPatternType::Weekly => Self {
                pattern_type,
                buckets: 7,
                min_samples: 14,
                min_span: Duration::days(6),
            },
        }
    }

    fn bucket_of(&self, sample: &MetricSample) -> usize {
        match self.pattern_type {
            SeasonalPatternType::Hourly => (sample.timestamp.minute() / 5) as usize,
            SeasonalPatternType::Daily => sample.timestamp.hour() as usize,
            SeasonalPatternType::Weekly => sample.timestamp.weekday().num_days_from_monday() as usize,
        }
    }

    fn label(&self, bucket: usize) -> String {
        match self.pattern_type {
            SeasonalPatternType::Hourly => format!(":{:02}", bucket * 5),
            SeasonalPatternType::Daily => format!("{:02}:00", bucket),
            SeasonalPatternType::Weekly => WEEKDAYS[bucket % 7].to_string(),
        }
    }
}

/// Cyclic lag-1 autocorrelation of the bucket means
///
/// Smooth cycles score close to 1, alternating values score -1.
fn cyclic_autocorrelation(means: &[f64]) -> Option<f64> {
    let k = means.len();
    if k < 3 {
        return None;
    }
    let m = mean(means);
    let denominator: f64 = means.iter().map(|v| (v - m).powi(2)).sum();
    if denominator <= f64::EPSILON {
        return None;
    }
    let numerator: f64 = (0..k)
        .map(|i| (means[i] - m) * (means[(i + 1) % k] - m))
        .sum();
    Some(numerator / denominator)
}

/// Upper-tail p-value of the between-bucket F statistic, `None` without replicates
fn anova_p_value(ss_between: f64, ss_within: f64, buckets: usize, samples: usize) -> Option<f64> {
    if samples <= buckets || buckets < 2 {
        return None;
    }
    if ss_within <= f64::EPSILON {
        return Some(0.0);
    }
    let df1 = (buckets - 1) as f64;
    let df2 = (samples - buckets) as f64;
    let f = (ss_between / df1) / (ss_within / df2);
    let dist = FisherSnedecor::new(df1, df2).ok()?;
    Some((1.0 - dist.cdf(f)).clamp(0.0, 1.0))
}

fn detect_cycle(
    series: &[MetricSample],
    metric_type: MetricType,
    layout: CycleLayout,
    config: &SeasonalConfig,
) -> Option<SeasonalPattern> {
    if series.len() < layout.min_samples {
        return None;
    }
    let first = series.iter().map(|s| s.timestamp).min()?;
    let last = series.iter().map(|s| s.timestamp).max()?;
    if last - first < layout.min_span {
        return None;
    }

    let mut sums = vec![0.0; layout.buckets];
    let mut counts = vec![0usize; layout.buckets];
    for sample in series {
        let bucket = layout.bucket_of(sample);
        sums[bucket] += sample.value;
        counts[bucket] += 1;
    }
    if counts.iter().any(|&c| c == 0) {
        trace!(
            metric = %metric_type,
            cycle = layout.pattern_type.as_str(),
            "Cycle buckets not fully covered"
        );
        return None;
    }
    let bucket_means: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(sum, &count)| sum / count as f64)
        .collect();

    let values: Vec<f64> = series.iter().map(|s| s.value).collect();
    let overall = mean(&values);
    let ss_total: f64 = values.iter().map(|v| (v - overall).powi(2)).sum();
    if ss_total <= f64::EPSILON {
        return None;
    }
    let ss_between: f64 = bucket_means
        .iter()
        .zip(&counts)
        .map(|(m, &count)| count as f64 * (m - overall).powi(2))
        .sum();
    let ss_within = (ss_total - ss_between).max(0.0);
    let explained = (ss_between / ss_total).clamp(0.0, 1.0);

    let autocorrelation = cyclic_autocorrelation(&bucket_means)?;
    let p_value = anova_p_value(ss_between, ss_within, layout.buckets, series.len());

    let significant = match p_value {
        Some(p) => p < config.significance_alpha && autocorrelation >= config.min_replicated_autocorrelation,
        None => autocorrelation >= config.min_cycle_autocorrelation,
    };

    debug!(
        metric = %metric_type,
        cycle = layout.pattern_type.as_str(),
        explained,
        autocorrelation,
        p_value = p_value.unwrap_or(f64::NAN),
        significant,
        "Seasonal cycle evaluated"
    );

    if explained < config.min_explained_variance || !significant {
        return None;
    }

    let high = bucket_means.iter().copied().fold(f64::MIN, f64::max);
    let low = bucket_means.iter().copied().fold(f64::MAX, f64::min);
    let amplitude = high - low;
    let band = config.peak_band * amplitude;

    let peak_times = bucket_means
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m >= high - band)
        .map(|(bucket, _)| layout.label(bucket))
        .collect();
    let low_times = bucket_means
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m <= low + band)
        .map(|(bucket, _)| layout.label(bucket))
        .collect();

    let mut confidence = 0.5 * explained + 0.5 * autocorrelation.max(0.0);
    if let Some(p) = p_value {
        confidence *= 1.0 - p;
    }

    Some(SeasonalPattern {
        metric_type,
        pattern_type: layout.pattern_type,
        peak_times,
        low_times,
        amplitude,
        confidence: confidence.clamp(0.0, 1.0),
        bucket_averages: bucket_means,
    })
}

/// Detect every hourly, daily and weekly cycle present in `series`
///
/// Returns an empty list for flat, noisy, alternating or too-short series.
pub fn identify_seasonal_patterns(
    series: &[MetricSample],
    metric_type: MetricType,
    config: &SeasonalConfig,
) -> Vec<SeasonalPattern> {
    [
        SeasonalPatternType::Hourly,
        SeasonalPatternType::Daily,
        SeasonalPatternType::Weekly,
    ]
    .into_iter()
    .filter_map(|pattern_type| {
        detect_cycle(series, metric_type, CycleLayout::for_type(pattern_type), config)
    })
    .collect()
}

/// Seasonal detector bound to a configuration
#[derive(Debug, Clone, Default)]
pub struct SeasonalDetector {
    config: SeasonalConfig,
}

impl SeasonalDetector {
    pub fn new(config: SeasonalConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(SeasonalConfig::default())
    }

    /// Detect cycles in one series
    pub fn detect(&self, series: &[MetricSample], metric_type: MetricType) -> Vec<SeasonalPattern> {
        identify_seasonal_patterns(series, metric_type, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::f64::consts::PI;

    fn hourly_series(hours: usize, value: impl Fn(usize) -> f64) -> Vec<MetricSample> {
        // 2024-05-06 is a Monday
        let start = Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap();
        (0..hours)
            .map(|h| MetricSample::new(start + Duration::hours(h as i64), value(h)))
            .collect()
    }

    #[test]
    fn test_daily_sine_cycle() {
        let data = hourly_series(48, |h| 50.0 + 10.0 * (2.0 * PI * (h % 24) as f64 / 24.0).sin());
        let patterns = identify_seasonal_patterns(&data, MetricType::CpuUsage, &SeasonalConfig::default());

        assert_eq!(patterns.len(), 1);
        let daily = &patterns[0];
        assert_eq!(daily.pattern_type, SeasonalPatternType::Daily);
        assert!(daily.peak_times.contains(&"06:00".to_string()));
        assert!(daily.low_times.contains(&"18:00".to_string()));
        assert!(!daily.peak_times.contains(&"18:00".to_string()));
        assert!((daily.amplitude - 20.0).abs() < 1e-9);
        assert!(daily.confidence > 0.9);
        assert_eq!(daily.bucket_averages.len(), 24);
    }

    #[test]
    fn test_single_day_without_replicates() {
        let data = hourly_series(24, |h| 50.0 + 10.0 * (2.0 * PI * h as f64 / 24.0).sin());
        let patterns = SeasonalDetector::with_defaults().detect(&data, MetricType::Fps);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern_type, SeasonalPatternType::Daily);
    }

    #[test]
    fn test_flat_series_has_no_pattern() {
        let data = hourly_series(72, |_| 30.0);
        assert!(SeasonalDetector::with_defaults()
            .detect(&data, MetricType::Fps)
            .is_empty());
    }

    #[test]
    fn test_alternating_series_has_no_pattern() {
        let detector = SeasonalDetector::with_defaults();
        let one_day = hourly_series(24, |h| if h % 2 == 0 { 30.0 } else { 40.0 });
        assert!(detector.detect(&one_day, MetricType::Fps).is_empty());

        let two_days = hourly_series(48, |h| if h % 2 == 0 { 30.0 } else { 40.0 });
        assert!(detector.detect(&two_days, MetricType::Fps).is_empty());
    }

    #[test]
    fn test_too_few_samples() {
        let data = hourly_series(23, |h| 50.0 + 10.0 * (2.0 * PI * h as f64 / 24.0).sin());
        assert!(SeasonalDetector::with_defaults()
            .detect(&data, MetricType::Fps)
            .is_empty());
        assert!(SeasonalDetector::with_defaults()
            .detect(&[], MetricType::Fps)
            .is_empty());
    }

    #[test]
    fn test_weekly_workday_cycle() {
        let start = Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap();
        let data: Vec<MetricSample> = (0..14)
            .map(|d| {
                let value = if d % 7 < 5 { 60.0 } else { 40.0 };
                MetricSample::new(start + Duration::days(d), value)
            })
            .collect();

        let patterns = identify_seasonal_patterns(&data, MetricType::CpuUsage, &SeasonalConfig::default());
        assert_eq!(patterns.len(), 1);
        let weekly = &patterns[0];
        assert_eq!(weekly.pattern_type, SeasonalPatternType::Weekly);
        assert_eq!(weekly.peak_times.len(), 5);
        assert!(weekly.peak_times.contains(&"Monday".to_string()));
        assert_eq!(weekly.low_times, vec!["Saturday".to_string(), "Sunday".to_string()]);
        assert!((weekly.amplitude - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_hourly_cycle_labels() {
        let start = Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap();
        let data: Vec<MetricSample> = (0..24)
            .map(|i| {
                let slot = (i % 12) as f64;
                let value = 100.0 + 20.0 * (2.0 * PI * slot / 12.0).cos();
                MetricSample::new(start + Duration::minutes(5 * i as i64), value)
            })
            .collect();

        let patterns = identify_seasonal_patterns(&data, MetricType::MemoryUsage, &SeasonalConfig::default());
        let hourly = patterns
            .iter()
            .find(|p| p.pattern_type == SeasonalPatternType::Hourly)
            .expect("hourly pattern");
        assert!(hourly.peak_times.contains(&":00".to_string()));
        assert!(hourly.low_times.contains(&":30".to_string()));
    }

    #[test]
    fn test_autocorrelation_signs() {
        let smooth: Vec<f64> = (0..12).map(|i| (2.0 * PI * i as f64 / 12.0).sin()).collect();
        assert!(cyclic_autocorrelation(&smooth).unwrap() > 0.8);
        let zigzag: Vec<f64> = (0..12).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert!((cyclic_autocorrelation(&zigzag).unwrap() + 1.0).abs() < 1e-9);
        assert!(cyclic_autocorrelation(&[1.0; 12]).is_none());
    }
}
