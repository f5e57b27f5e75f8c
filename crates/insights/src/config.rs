//! Configuration for the analysis and recommendation engine
//!
//! Every tunable constant of the statistical core lives here: IQR fences, significance
//! levels, correlation strength cutoffs, z-score severity bands, trend epsilon, seasonal
//! detection bars, forecast thresholds and recommendation scoring limits. Configurations
//! are plain serde structures; missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analyzer::types::MetricType;
use crate::error::{InsightError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    pub statistics: StatisticsConfig,
    pub regression: RegressionConfig,
    pub correlation: CorrelationThresholds,
    pub anomaly: AnomalyConfig,
    pub trend: TrendConfig,
    pub seasonal: SeasonalConfig,
    pub forecast: ForecastConfig,
    pub recommendation: RecommendationConfig,
}

/// Descriptive statistics settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// IQR multiplier for outlier fences
    pub iqr_multiplier: f64,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self { iqr_multiplier: 1.5 }
    }
}

/// Regression and Mann-Kendall settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    /// Significance level for the regression t-test
    pub significance_alpha: f64,

    /// Significance level for the Mann-Kendall test
    pub mann_kendall_alpha: f64,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            significance_alpha: 0.05,
            mann_kendall_alpha: 0.05,
        }
    }
}

/// Cutoffs used to classify a correlation coefficient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationThresholds {
    /// |r| below this is reported as no relationship
    pub none_threshold: f64,

    /// |r| below this is weak
    pub weak_upper: f64,

    /// |r| above this is strong
    pub strong_lower: f64,

    /// Significance level for the correlation t-test
    pub significance_alpha: f64,
}

impl Default for CorrelationThresholds {
    fn default() -> Self {
        Self {
            none_threshold: 0.1,
            weak_upper: 0.3,
            strong_lower: 0.7,
            significance_alpha: 0.05,
        }
    }
}

/// |z| cutoffs for anomaly severity; anything flagged below `medium` is low
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityBands {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            medium: 2.5,
            high: 3.0,
            critical: 4.0,
        }
    }
}

/// Anomaly detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Flag samples with |z| above this
    pub z_threshold: f64,

    /// Below this many samples nothing is flagged
    pub min_samples: usize,

    pub severity_bands: SeverityBands,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            z_threshold: 2.0,
            min_samples: 3,
            severity_bands: SeverityBands::default(),
        }
    }
}

/// Trend classification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Slopes with a smaller magnitude are always stable
    pub stable_slope_epsilon: f64,

    /// Confidence at or above which significance is high
    pub high_significance: f64,

    /// Confidence at or above which significance is medium
    pub medium_significance: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            stable_slope_epsilon: 0.1,
            high_significance: 0.8,
            medium_significance: 0.5,
        }
    }
}

/// Seasonal pattern detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalConfig {
    /// Minimum share of total variance explained by the bucket means
    pub min_explained_variance: f64,

    /// Minimum cyclic lag-1 autocorrelation of the bucket means when every bucket holds a
    /// single sample and no F-test is possible
    pub min_cycle_autocorrelation: f64,

    /// Minimum cyclic lag-1 autocorrelation when buckets hold repeated samples
    pub min_replicated_autocorrelation: f64,

    /// Significance level for the between-bucket F-test
    pub significance_alpha: f64,

    /// Buckets within this fraction of the range from the top (bottom) are peaks (lows)
    pub peak_band: f64,
}

impl Default for SeasonalConfig {
    fn default() -> Self {
        Self {
            min_explained_variance: 0.3,
            min_cycle_autocorrelation: 0.5,
            min_replicated_autocorrelation: 0.0,
            significance_alpha: 0.05,
            peak_band: 0.25,
        }
    }
}

/// Health limits per metric type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricThresholds {
    /// Minimum acceptable frames per second
    pub fps_min: f64,

    /// Maximum acceptable memory usage (MB)
    pub memory_max_mb: f64,

    /// Maximum acceptable CPU usage (%)
    pub cpu_max_pct: f64,

    /// Maximum acceptable load time (ms)
    pub load_time_max_ms: f64,
}

impl Default for MetricThresholds {
    fn default() -> Self {
        Self {
            fps_min: 30.0,
            memory_max_mb: 500.0,
            cpu_max_pct: 80.0,
            load_time_max_ms: 3000.0,
        }
    }
}

impl MetricThresholds {
    /// Health limit for a metric
    pub fn limit(&self, metric: MetricType) -> f64 {
        match metric {
            MetricType::Fps => self.fps_min,
            MetricType::MemoryUsage => self.memory_max_mb,
            MetricType::CpuUsage => self.cpu_max_pct,
            MetricType::LoadTime => self.load_time_max_ms,
        }
    }

    /// Whether `value` is on the wrong side of the metric's limit
    pub fn is_breached(&self, metric: MetricType, value: f64) -> bool {
        let limit = self.limit(metric);
        if metric.higher_is_better() {
            value < limit
        } else {
            value > limit
        }
    }
}

/// Forecast and early-warning settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of future steps to project
    pub horizon: usize,

    /// Minimum samples before a forecast is attempted
    pub min_points: usize,

    /// Multiplier of the residual standard error for prediction bands
    pub prediction_z: f64,

    /// Breaches further out than this many steps do not raise early warnings
    pub warning_horizon: usize,

    pub thresholds: MetricThresholds,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 12,
            min_points: 5,
            prediction_z: 1.96,
            warning_horizon: 12,
            thresholds: MetricThresholds::default(),
        }
    }
}

/// Recommendation scoring settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Recommendations scoring below this are discarded
    pub min_priority_score: f64,

    /// Maximum standard recommendations returned
    pub max_recommendations: usize,

    /// Maximum proactive recommendations returned
    pub max_proactive: usize,

    /// Average FPS below this boosts rendering rules
    pub critical_fps: f64,

    /// Average memory above this boosts memory rules (MB)
    pub high_memory_mb: f64,

    /// Average CPU above this boosts CPU rules (%)
    pub high_cpu_pct: f64,

    /// Device count at or above which recommendations get a reach boost
    pub broad_device_count: usize,

    /// Routes with a performance score below this are analyzed
    pub route_score_threshold: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            min_priority_score: 1.5,
            max_recommendations: 10,
            max_proactive: 8,
            critical_fps: 30.0,
            high_memory_mb: 400.0,
            high_cpu_pct: 70.0,
            broad_device_count: 10,
            route_score_threshold: 70.0,
        }
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(InsightError::Configuration(format!(
            "{} must be in (0, 1), got {}",
            name, value
        )))
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InsightError::Configuration(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

impl InsightsConfig {
    /// Parse a configuration from JSON; absent fields use defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check internal consistency of every section
    pub fn validate(&self) -> Result<()> {
        check_positive("statistics.iqr_multiplier", self.statistics.iqr_multiplier)?;
        check_probability("regression.significance_alpha", self.regression.significance_alpha)?;
        check_probability("regression.mann_kendall_alpha", self.regression.mann_kendall_alpha)?;

        let c = &self.correlation;
        check_probability("correlation.significance_alpha", c.significance_alpha)?;
        if !(0.0 <= c.none_threshold
            && c.none_threshold <= c.weak_upper
            && c.weak_upper <= c.strong_lower
            && c.strong_lower <= 1.0)
        {
            return Err(InsightError::Configuration(format!(
                "correlation cutoffs must satisfy 0 <= none ({}) <= weak ({}) <= strong ({}) <= 1",
                c.none_threshold, c.weak_upper, c.strong_lower
            )));
        }

        check_positive("anomaly.z_threshold", self.anomaly.z_threshold)?;
        let bands = &self.anomaly.severity_bands;
        if !(bands.medium <= bands.high && bands.high <= bands.critical) {
            return Err(InsightError::Configuration(format!(
                "severity bands must be ascending: medium {} high {} critical {}",
                bands.medium, bands.high, bands.critical
            )));
        }

        check_positive("trend.stable_slope_epsilon", self.trend.stable_slope_epsilon)?;
        if self.trend.medium_significance > self.trend.high_significance {
            return Err(InsightError::Configuration(
                "trend.medium_significance must not exceed trend.high_significance".to_string(),
            ));
        }

        check_probability("seasonal.significance_alpha", self.seasonal.significance_alpha)?;
        check_probability("seasonal.peak_band", self.seasonal.peak_band)?;

        check_positive("forecast.prediction_z", self.forecast.prediction_z)?;
        if self.forecast.horizon == 0 {
            return Err(InsightError::Configuration(
                "forecast.horizon must be at least 1".to_string(),
            ));
        }

        let r = &self.recommendation;
        if r.max_recommendations == 0 || r.max_proactive == 0 {
            return Err(InsightError::Configuration(
                "recommendation limits must be at least 1".to_string(),
            ));
        }
        if !r.min_priority_score.is_finite() || r.min_priority_score < 0.0 {
            return Err(InsightError::Configuration(format!(
                "recommendation.min_priority_score must be non-negative, got {}",
                r.min_priority_score
            )));
        }

        Ok(())
    }
}

/// Builder for [`InsightsConfig`]
#[derive(Debug, Default)]
pub struct InsightsConfigBuilder {
    config: InsightsConfig,
}

impl InsightsConfigBuilder {
    /// Start from the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the IQR outlier multiplier
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.config.statistics.iqr_multiplier = multiplier;
        self
    }

    /// Set the z-score anomaly threshold
    pub fn z_threshold(mut self, threshold: f64) -> Self {
        self.config.anomaly.z_threshold = threshold;
        self
    }

    /// Set the anomaly severity bands
    pub fn severity_bands(mut self, bands: SeverityBands) -> Self {
        self.config.anomaly.severity_bands = bands;
        self
    }

    /// Set the correlation cutoffs
    pub fn correlation_thresholds(mut self, thresholds: CorrelationThresholds) -> Self {
        self.config.correlation = thresholds;
        self
    }

    /// Set the slope magnitude below which a trend is stable
    pub fn stable_slope_epsilon(mut self, epsilon: f64) -> Self {
        self.config.trend.stable_slope_epsilon = epsilon;
        self
    }

    /// Set the metric health thresholds
    pub fn metric_thresholds(mut self, thresholds: MetricThresholds) -> Self {
        self.config.forecast.thresholds = thresholds;
        self
    }

    /// Set the forecast horizon
    pub fn forecast_horizon(mut self, horizon: usize) -> Self {
        self.config.forecast.horizon = horizon;
        self
    }

    /// Set the minimum priority score for recommendations
    pub fn min_priority_score(mut self, score: f64) -> Self {
        self.config.recommendation.min_priority_score = score;
        self
    }

    /// Set the maximum number of standard recommendations
    pub fn max_recommendations(mut self, max: usize) -> Self {
        self.config.recommendation.max_recommendations = max;
        self
    }

    /// Set the maximum number of proactive recommendations
    pub fn max_proactive(mut self, max: usize) -> Self {
        self.config.recommendation.max_proactive = max;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<InsightsConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = InsightsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.anomaly.z_threshold, 2.0);
        assert_eq!(config.recommendation.max_recommendations, 10);
        assert_eq!(config.recommendation.max_proactive, 8);
        assert_eq!(config.correlation.weak_upper, 0.3);
        assert_eq!(config.correlation.strong_lower, 0.7);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            InsightsConfig::from_json_str(r#"{"anomaly": {"z_threshold": 3.0}}"#).unwrap();
        assert_eq!(config.anomaly.z_threshold, 3.0);
        assert_eq!(config.anomaly.min_samples, 3);
        assert_eq!(config.statistics.iqr_multiplier, 1.5);
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let err = InsightsConfig::from_json_str(r#"{"anomaly": {"z_threshold": -1.0}}"#)
            .unwrap_err();
        assert!(matches!(err, InsightError::Configuration(_)));

        let err = InsightsConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, InsightError::Serialization(_)));
    }

    #[test]
    fn test_builder_validates() {
        let config = InsightsConfigBuilder::new()
            .z_threshold(2.5)
            .max_recommendations(5)
            .build()
            .unwrap();
        assert_eq!(config.anomaly.z_threshold, 2.5);
        assert_eq!(config.recommendation.max_recommendations, 5);

        let result = InsightsConfigBuilder::new()
            .severity_bands(SeverityBands {
                medium: 3.0,
                high: 2.0,
                critical: 4.0,
            })
            .build();
        assert!(result.is_err());

        let result = InsightsConfigBuilder::new()
            .correlation_thresholds(CorrelationThresholds {
                none_threshold: 0.5,
                weak_upper: 0.3,
                strong_lower: 0.7,
                significance_alpha: 0.05,
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_metric_threshold_breach_direction() {
        let thresholds = MetricThresholds::default();
        assert!(thresholds.is_breached(MetricType::Fps, 25.0));
        assert!(!thresholds.is_breached(MetricType::Fps, 45.0));
        assert!(thresholds.is_breached(MetricType::MemoryUsage, 650.0));
        assert!(!thresholds.is_breached(MetricType::CpuUsage, 40.0));
        assert_eq!(thresholds.limit(MetricType::LoadTime), 3000.0);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = InsightsConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = InsightsConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
