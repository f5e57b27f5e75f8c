//! Anomaly Analyzer
//!
//! Detects statistical outliers in metric series using the z-score method, with the IQR
//! fences logged alongside for diagnosis. Severity grows monotonically with |z|.

use std::collections::BTreeMap;
use tracing::{debug, trace};

use super::stats::{calculate_iqr, is_outlier_zscore, mean, std_dev, z_score};
use super::types::{AnomalyRecord, MetricSample, MetricType, Severity};
use crate::config::{AnomalyConfig, SeverityBands};

/// Map |z| to a severity using the configured bands
pub fn classify_severity(z: f64, bands: &SeverityBands) -> Severity {
    let magnitude = z.abs();
    if magnitude >= bands.critical {
        Severity::Critical
    } else if magnitude >= bands.high {
        Severity::High
    } else if magnitude >= bands.medium {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Flag every sample whose |z| exceeds `z_threshold`
///
/// Series shorter than `min_samples` or with zero standard deviation yield no anomalies.
pub fn detect_anomalies(
    series: &[MetricSample],
    metric_type: MetricType,
    z_threshold: f64,
    min_samples: usize,
    bands: &SeverityBands,
) -> Vec<AnomalyRecord> {
    if series.len() < min_samples.max(1) {
        debug!(
            metric = %metric_type,
            samples = series.len(),
            minimum = min_samples,
            "Insufficient data for anomaly detection"
        );
        return Vec::new();
    }

    let values: Vec<f64> = series.iter().map(|s| s.value).collect();
    let m = mean(&values);
    let sd = std_dev(&values);
    if sd <= f64::EPSILON {
        return Vec::new();
    }

    let anomalies: Vec<AnomalyRecord> = series
        .iter()
        .enumerate()
        .filter_map(|(index, sample)| {
            if !is_outlier_zscore(sample.value, m, sd, z_threshold) {
                return None;
            }
            let z = z_score(sample.value, m, sd);
            let severity = classify_severity(z, bands);
            trace!(
                metric = %metric_type,
                index,
                value = sample.value,
                z_score = z,
                ?severity,
                "Anomaly detected"
            );
            Some(AnomalyRecord {
                metric_type,
                index,
                value: sample.value,
                expected_value: m,
                z_score: z,
                severity,
                timestamp: sample.timestamp,
            })
        })
        .collect();

    anomalies
}

/// Anomaly detector bound to a configuration
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
    iqr_multiplier: f64,
}

impl AnomalyDetector {
    /// Create a detector
    pub fn new(config: AnomalyConfig, iqr_multiplier: f64) -> Self {
        Self {
            config,
            iqr_multiplier,
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(AnomalyConfig::default(), 1.5)
    }

    /// Detector configuration
    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Detect anomalies at the configured threshold
    pub fn detect(&self, series: &[MetricSample], metric_type: MetricType) -> Vec<AnomalyRecord> {
        self.detect_with_threshold(series, metric_type, self.config.z_threshold)
    }

    /// Detect anomalies at an explicit threshold
    pub fn detect_with_threshold(
        &self,
        series: &[MetricSample],
        metric_type: MetricType,
        z_threshold: f64,
    ) -> Vec<AnomalyRecord> {
        let anomalies = detect_anomalies(
            series,
            metric_type,
            z_threshold,
            self.config.min_samples,
            &self.config.severity_bands,
        );

        if series.len() >= 4 {
            let values: Vec<f64> = series.iter().map(|s| s.value).collect();
            let (q1, q3, iqr) = calculate_iqr(&values);
            let lower = q1 - self.iqr_multiplier * iqr;
            let upper = q3 + self.iqr_multiplier * iqr;
            let fenced = values.iter().filter(|&&v| v < lower || v > upper).count();
            if fenced > 0 {
                debug!(
                    metric = %metric_type,
                    fenced,
                    zscore_flagged = anomalies.len(),
                    lower_fence = lower,
                    upper_fence = upper,
                    "IQR outliers present"
                );
            }
        }

        anomalies
    }

    /// Worst severity per metric among a set of anomalies
    pub fn worst_by_metric(anomalies: &[AnomalyRecord]) -> BTreeMap<MetricType, Severity> {
        let mut worst = BTreeMap::new();
        for anomaly in anomalies {
            worst
                .entry(anomaly.metric_type)
                .and_modify(|s: &mut Severity| *s = (*s).max(anomaly.severity))
                .or_insert(anomaly.severity);
        }
        worst
    }
}
