//! Trend Analyzer
//!
//! Classifies the direction of a metric series from its regression line. The analyzer is
//! direction-agnostic: whether "up" is good or bad for a metric is decided by the insight
//! generator.

use tracing::{debug, trace};

use super::regression::{calculate_linear_regression, MIN_REGRESSION_POINTS};
use super::types::{MetricSample, MetricType, TrendAnalysis, TrendDirection, TrendSignificance};
use crate::config::TrendConfig;

/// Map a regression confidence (r²) to a significance bucket
pub fn classify_significance(confidence: f64, config: &TrendConfig) -> TrendSignificance {
    if confidence >= config.high_significance {
        TrendSignificance::High
    } else if confidence >= config.medium_significance {
        TrendSignificance::Medium
    } else {
        TrendSignificance::Low
    }
}

/// Analyze the trend of one metric series over a labelled period
pub fn analyze_trend(
    series: &[MetricSample],
    metric_type: MetricType,
    time_period: &str,
    config: &TrendConfig,
) -> TrendAnalysis {
    let n = series.len();
    if n < MIN_REGRESSION_POINTS {
        debug!(
            metric = %metric_type,
            samples = n,
            "Insufficient data for trend analysis"
        );
        return TrendAnalysis {
            metric_type,
            direction: TrendDirection::Stable,
            slope: 0.0,
            confidence: 0.0,
            significance: TrendSignificance::Low,
            data_points: n,
            time_period: time_period.to_string(),
            forecast: None,
        };
    }

    let values = MetricSample::values(series);
    let regression = calculate_linear_regression(&values);
    let confidence = regression.r_squared.clamp(0.0, 1.0);

    let direction = if regression.slope.abs() < config.stable_slope_epsilon {
        TrendDirection::Stable
    } else if regression.slope > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    let forecast = match direction {
        TrendDirection::Stable => None,
        _ => Some(regression.predict(n as f64)),
    };

    trace!(
        metric = %metric_type,
        slope = regression.slope,
        r_squared = regression.r_squared,
        ?direction,
        "Trend classified"
    );

    TrendAnalysis {
        metric_type,
        direction,
        slope: regression.slope,
        confidence,
        significance: classify_significance(confidence, config),
        data_points: n,
        time_period: time_period.to_string(),
        forecast,
    }
}

/// Trend analyzer bound to a configuration
#[derive(Debug, Clone, Default)]
pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(TrendConfig::default())
    }

    /// Analyze one series
    pub fn analyze(
        &self,
        series: &[MetricSample],
        metric_type: MetricType,
        time_period: &str,
    ) -> TrendAnalysis {
        analyze_trend(series, metric_type, time_period, &self.config)
    }
}
