//! Prometheus metrics for insight generation
//!
//! Counters and histograms describing what each report run produced. Labelled families use
//! `Vec<(String, String)>` label sets.

use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;
use std::sync::atomic::AtomicU64;

use crate::analyzer::types::{InsightType, MetricType, Severity};
use crate::recommendation::types::RecommendationSource;

type Labels = Vec<(String, String)>;

/// Label names used across the insight metrics
pub struct LabelNames;

impl LabelNames {
    pub const METRIC: &'static str = "metric";
    pub const SEVERITY: &'static str = "severity";
    pub const INSIGHT_TYPE: &'static str = "insight_type";
    pub const PIPELINE: &'static str = "pipeline";
}

/// Pipeline label for proactive recommendations
pub const PROACTIVE_PIPELINE: &str = "proactive";

fn label(name: &str, value: &str) -> Labels {
    vec![(name.to_string(), value.to_string())]
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "low",
        Severity::Medium => "medium",
        Severity::High => "high",
        Severity::Critical => "critical",
    }
}

fn insight_type_label(kind: InsightType) -> &'static str {
    match kind {
        InsightType::Trend => "trend",
        InsightType::Anomaly => "anomaly",
        InsightType::Seasonal => "seasonal",
        InsightType::Correlation => "correlation",
        InsightType::Threshold => "threshold",
    }
}

/// Metrics recorded by the report generator
pub struct InsightMetrics {
    /// Reports generated successfully
    pub reports_generated_total: Counter<u64, AtomicU64>,

    /// Datasets rejected by validation
    pub validation_failures_total: Counter<u64, AtomicU64>,

    /// Series analyzed, labeled by metric
    pub series_analyzed_total: Family<Labels, Counter<u64, AtomicU64>>,

    /// Anomalies detected, labeled by severity
    pub anomalies_detected_total: Family<Labels, Counter<u64, AtomicU64>>,

    /// Insights generated, labeled by insight type
    pub insights_generated_total: Family<Labels, Counter<u64, AtomicU64>>,

    /// Recommendations returned, labeled by pipeline
    pub recommendations_generated_total: Family<Labels, Counter<u64, AtomicU64>>,

    /// Candidates discarded for scoring below the minimum priority
    pub recommendations_discarded_total: Counter<u64, AtomicU64>,

    /// Early warnings raised
    pub early_warnings_total: Counter<u64, AtomicU64>,

    /// Duration of a full report run in seconds
    pub report_duration_seconds: Histogram,
}

impl InsightMetrics {
    /// Create the metrics and register them with `registry`
    pub fn new(registry: &mut Registry) -> Self {
        let metrics = Self {
            reports_generated_total: Counter::default(),
            validation_failures_total: Counter::default(),
            series_analyzed_total: Family::default(),
            anomalies_detected_total: Family::default(),
            insights_generated_total: Family::default(),
            recommendations_generated_total: Family::default(),
            recommendations_discarded_total: Counter::default(),
            early_warnings_total: Counter::default(),
            report_duration_seconds: Self::duration_histogram(),
        };

        registry.register(
            "insights_reports_generated",
            "Total number of performance reports generated",
            metrics.reports_generated_total.clone(),
        );

        registry.register(
            "insights_validation_failures",
            "Total number of datasets rejected by validation",
            metrics.validation_failures_total.clone(),
        );

        registry.register(
            "insights_series_analyzed",
            "Total number of metric series analyzed by metric",
            metrics.series_analyzed_total.clone(),
        );

        registry.register(
            "insights_anomalies_detected",
            "Total number of anomalies detected by severity",
            metrics.anomalies_detected_total.clone(),
        );

        registry.register(
            "insights_insights_generated",
            "Total number of insights generated by type",
            metrics.insights_generated_total.clone(),
        );

        registry.register(
            "insights_recommendations_generated",
            "Total number of recommendations returned by pipeline",
            metrics.recommendations_generated_total.clone(),
        );

        registry.register(
            "insights_recommendations_discarded",
            "Total number of recommendation candidates below the minimum priority",
            metrics.recommendations_discarded_total.clone(),
        );

        registry.register(
            "insights_early_warnings",
            "Total number of early warnings raised",
            metrics.early_warnings_total.clone(),
        );

        registry.register(
            "insights_report_duration_seconds",
            "Duration of a full report run",
            metrics.report_duration_seconds.clone(),
        );

        metrics
    }

    #[inline]
    pub fn record_report(&self, duration_secs: f64) {
        self.reports_generated_total.inc();
        self.report_duration_seconds.observe(duration_secs);
    }

    #[inline]
    pub fn record_validation_failure(&self) {
        self.validation_failures_total.inc();
    }

    #[inline]
    pub fn record_series_analyzed(&self, metric: MetricType) {
        self.series_analyzed_total
            .get_or_create(&label(LabelNames::METRIC, metric.as_str()))
            .inc();
    }

    #[inline]
    pub fn record_anomaly(&self, severity: Severity) {
        self.anomalies_detected_total
            .get_or_create(&label(LabelNames::SEVERITY, severity_label(severity)))
            .inc();
    }

    #[inline]
    pub fn record_insight(&self, kind: InsightType) {
        self.insights_generated_total
            .get_or_create(&label(LabelNames::INSIGHT_TYPE, insight_type_label(kind)))
            .inc();
    }

    #[inline]
    pub fn record_recommendation(&self, source: RecommendationSource) {
        self.recommendations_generated_total
            .get_or_create(&label(LabelNames::PIPELINE, source.as_str()))
            .inc();
    }

    #[inline]
    pub fn record_proactive(&self, count: u64) {
        self.recommendations_generated_total
            .get_or_create(&label(LabelNames::PIPELINE, PROACTIVE_PIPELINE))
            .inc_by(count);
    }

    #[inline]
    pub fn record_discarded(&self, count: u64) {
        self.recommendations_discarded_total.inc_by(count);
    }

    #[inline]
    pub fn record_early_warnings(&self, count: u64) {
        self.early_warnings_total.inc_by(count);
    }

    /// Duration buckets from 100µs to roughly 6.5s
    fn duration_histogram() -> Histogram {
        Histogram::new(exponential_buckets(0.0001, 2.0, 16))
    }
}

/// Snapshot of metrics for testing and debugging
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub reports_generated: u64,
    pub validation_failures: u64,
    pub rule_recommendations: u64,
    pub proactive_recommendations: u64,
    pub discarded: u64,
    pub early_warnings: u64,
}

impl MetricsSnapshot {
    /// Capture the current counter values
    pub fn capture(metrics: &InsightMetrics) -> Self {
        Self {
            reports_generated: metrics.reports_generated_total.get(),
            validation_failures: metrics.validation_failures_total.get(),
            rule_recommendations: metrics
                .recommendations_generated_total
                .get_or_create(&label(LabelNames::PIPELINE, RecommendationSource::Rule.as_str()))
                .get(),
            proactive_recommendations: metrics
                .recommendations_generated_total
                .get_or_create(&label(LabelNames::PIPELINE, PROACTIVE_PIPELINE))
                .get(),
            discarded: metrics.recommendations_discarded_total.get(),
            early_warnings: metrics.early_warnings_total.get(),
        }
    }
}
