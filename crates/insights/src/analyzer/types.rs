//! Type definitions for the analyzer framework
//!
//! This module contains the data structures shared by the statistical primitives and the
//! insight layer: metric samples, statistical results, anomalies, trends, seasonal
//! patterns, forecasts and insights. All of them are plain serde structures.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{InsightError, Result};

/// Kind of performance metric collected from the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Frames per second
    Fps,
    /// Memory usage in MB
    MemoryUsage,
    /// CPU usage in percent
    CpuUsage,
    /// Screen load time in milliseconds
    LoadTime,
}

impl MetricType {
    /// All metric types in a stable order
    pub const ALL: [MetricType; 4] = [
        MetricType::Fps,
        MetricType::MemoryUsage,
        MetricType::CpuUsage,
        MetricType::LoadTime,
    ];

    /// Whether larger values mean better performance
    pub fn higher_is_better(&self) -> bool {
        matches!(self, MetricType::Fps)
    }

    /// Wire name of the metric
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Fps => "fps",
            MetricType::MemoryUsage => "memory_usage",
            MetricType::CpuUsage => "cpu_usage",
            MetricType::LoadTime => "load_time",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            MetricType::Fps => "FPS",
            MetricType::MemoryUsage => "memory usage",
            MetricType::CpuUsage => "CPU usage",
            MetricType::LoadTime => "load time",
        }
    }

    /// Unit of measurement
    pub fn unit(&self) -> &'static str {
        match self {
            MetricType::Fps => "fps",
            MetricType::MemoryUsage => "MB",
            MetricType::CpuUsage => "%",
            MetricType::LoadTime => "ms",
        }
    }

    /// Insight category the metric belongs to
    pub fn category(&self) -> InsightCategory {
        match self {
            MetricType::Fps => InsightCategory::Rendering,
            MetricType::MemoryUsage => InsightCategory::Memory,
            MetricType::CpuUsage => InsightCategory::Cpu,
            MetricType::LoadTime => InsightCategory::Loading,
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl MetricSample {
    /// Create a sample from an already parsed timestamp
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Parse an ISO-8601 timestamp; timestamps without an offset are taken as UTC
    pub fn parse(timestamp: &str, value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(InsightError::InvalidSample {
                metric: "unknown".to_string(),
                index: 0,
                reason: format!("value {} is not finite", value),
            });
        }

        let parsed = match DateTime::parse_from_rfc3339(timestamp) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(rfc_err) => NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .map_err(|_| InsightError::InvalidTimestamp {
                    value: timestamp.to_string(),
                    reason: rfc_err.to_string(),
                })?,
        };

        Ok(Self::new(parsed, value))
    }

    /// Extract the values of a series
    pub fn values(samples: &[MetricSample]) -> Vec<f64> {
        samples.iter().map(|s| s.value).collect()
    }
}

/// Metric series grouped by type, each in ascending time order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricDataset {
    pub series: BTreeMap<MetricType, Vec<MetricSample>>,
}

impl MetricDataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a series, replacing any previous series of the same type
    pub fn with_series(mut self, metric: MetricType, samples: Vec<MetricSample>) -> Self {
        self.series.insert(metric, samples);
        self
    }

    /// Insert a series
    pub fn insert(&mut self, metric: MetricType, samples: Vec<MetricSample>) {
        self.series.insert(metric, samples);
    }

    /// Series for a metric, empty if absent
    pub fn get(&self, metric: MetricType) -> &[MetricSample] {
        self.series.get(&metric).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of samples across all series
    pub fn total_samples(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    /// Reject non-finite values and out-of-order timestamps
    pub fn validate(&self) -> Result<()> {
        for (metric, samples) in &self.series {
            for (index, sample) in samples.iter().enumerate() {
                if !sample.value.is_finite() {
                    return Err(InsightError::InvalidSample {
                        metric: metric.to_string(),
                        index,
                        reason: format!("value {} is not finite", sample.value),
                    });
                }
                if index > 0 && sample.timestamp < samples[index - 1].timestamp {
                    return Err(InsightError::UnorderedSeries {
                        metric: metric.to_string(),
                        index,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Severity levels for anomalies, insights and warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Check if this severity requires immediate action
    pub fn is_urgent(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }

    /// Numeric weight used by priority scoring
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Low => 1.0,
            Severity::Medium => 2.0,
            Severity::High => 3.0,
            Severity::Critical => 4.0,
        }
    }
}

/// Confidence level for analysis results
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Confidence(f64);

impl Confidence {
    /// Create a new confidence value (0.0-1.0); NaN becomes 0
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Get the confidence value
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Check if confidence is low (< 0.5)
    pub fn is_low(&self) -> bool {
        self.0 < 0.5
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self(0.0)
    }
}

/// Descriptive statistics of a sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticalResult {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub standard_deviation: f64,
    pub min: f64,
    pub max: f64,
    pub percentile_25: f64,
    pub percentile_75: f64,
    pub percentile_90: f64,
    pub percentile_95: f64,
    pub outliers: Vec<f64>,
}

/// Ordinary least-squares fit over index-as-x
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub correlation: f64,
    pub p_value: f64,
    pub is_significant: bool,
    pub data_points: usize,
}

impl RegressionResult {
    /// Result returned when there is not enough data to fit
    pub fn insufficient(data_points: usize) -> Self {
        Self {
            slope: 0.0,
            intercept: 0.0,
            r_squared: 0.0,
            correlation: 0.0,
            p_value: 1.0,
            is_significant: false,
            data_points,
        }
    }

    /// Value predicted at index `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Outcome of the Mann-Kendall test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonotonicTrend {
    Increasing,
    Decreasing,
    NoTrend,
}

/// Mann-Kendall non-parametric trend test result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MannKendallResult {
    pub s_statistic: i64,
    pub tau: f64,
    pub variance: f64,
    pub z_score: f64,
    pub p_value: f64,
    pub trend: MonotonicTrend,
    pub is_significant: bool,
    pub data_points: usize,
}

impl MannKendallResult {
    /// Result returned when there is not enough data to test
    pub fn insufficient(data_points: usize) -> Self {
        Self {
            s_statistic: 0,
            tau: 0.0,
            variance: 0.0,
            z_score: 0.0,
            p_value: 1.0,
            trend: MonotonicTrend::NoTrend,
            is_significant: false,
            data_points,
        }
    }
}

/// Sign of a correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Positive,
    Negative,
    None,
}

/// Magnitude bucket of a correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Weak,
    Moderate,
    Strong,
}

/// Statistical significance of a correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Significant,
    NotSignificant,
}

/// Pearson correlation between two labelled series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub metric_a: String,
    pub metric_b: String,
    pub correlation_coefficient: f64,
    pub relationship: Relationship,
    pub strength: CorrelationStrength,
    pub significance: Significance,
    pub p_value: f64,
    pub sample_size: usize,
}

/// A sample flagged as anomalous
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub metric_type: MetricType,
    pub index: usize,
    pub value: f64,
    pub expected_value: f64,
    pub z_score: f64,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

/// Direction of a linear trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Significance bucket derived from trend confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendSignificance {
    Low,
    Medium,
    High,
}

/// Trend of one metric over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub metric_type: MetricType,
    pub direction: TrendDirection,
    pub slope: f64,
    pub confidence: f64,
    pub significance: TrendSignificance,
    pub data_points: usize,
    pub time_period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<f64>,
}

/// Cycle length of a seasonal pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalPatternType {
    Hourly,
    Daily,
    Weekly,
}

impl SeasonalPatternType {
    /// Readable name of the cycle
    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonalPatternType::Hourly => "hourly",
            SeasonalPatternType::Daily => "daily",
            SeasonalPatternType::Weekly => "weekly",
        }
    }
}

/// A recurring cycle found in a metric series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPattern {
    pub metric_type: MetricType,
    pub pattern_type: SeasonalPatternType,
    pub peak_times: Vec<String>,
    pub low_times: Vec<String>,
    pub amplitude: f64,
    pub confidence: f64,
    pub bucket_averages: Vec<f64>,
}

/// One projected step of a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub step: usize,
    pub value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// First forecast step that crosses a health threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBreach {
    pub step: usize,
    pub threshold: f64,
    pub predicted_value: f64,
}

/// Linear projection of a metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceForecast {
    pub metric_type: MetricType,
    pub current_value: f64,
    pub horizon: usize,
    pub points: Vec<ForecastPoint>,
    pub direction: TrendDirection,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_breach: Option<ThresholdBreach>,
}

/// Warning raised before a metric crosses its health threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyWarningAlert {
    pub id: String,
    pub metric_type: MetricType,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub current_value: f64,
    pub projected_value: f64,
    pub threshold: f64,
    pub steps_to_breach: usize,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Source analysis of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    Trend,
    Anomaly,
    Seasonal,
    Correlation,
    Threshold,
}

/// Area of the app an insight concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Rendering,
    Memory,
    Cpu,
    Loading,
    General,
}

impl InsightCategory {
    /// Wire name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightCategory::Rendering => "rendering",
            InsightCategory::Memory => "memory",
            InsightCategory::Cpu => "cpu",
            InsightCategory::Loading => "loading",
            InsightCategory::General => "general",
        }
    }
}

/// Expected benefit of acting on an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    /// Numeric weight used by priority scoring
    pub fn weight(&self) -> f64 {
        match self {
            Impact::Low => 1.0,
            Impact::Medium => 2.0,
            Impact::High => 3.0,
        }
    }
}

/// Estimated cost of acting on an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    /// Inverted weight: lower effort scores higher
    pub fn weight(&self) -> f64 {
        match self {
            Effort::Low => 3.0,
            Effort::Medium => 2.0,
            Effort::High => 1.0,
        }
    }
}

/// A categorized, severity-tagged observation derived from the analyses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceInsight {
    pub id: String,
    pub insight_type: InsightType,
    pub category: InsightCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<MetricType>,
    pub severity: Severity,
    pub confidence: Confidence,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    pub effort: Effort,
    pub data_context: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
