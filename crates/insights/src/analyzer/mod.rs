//! Analyzer framework
//!
//! Statistical primitives (descriptive statistics, regression, Mann-Kendall, correlation)
//! and the analyzers built on them: anomaly detection, seasonal pattern detection, trend
//! analysis, forecasting and insight generation.

pub mod anomaly_analyzer;
pub mod forecast;
pub mod insight_generator;
pub mod pattern_analyzer;
pub mod regression;
pub mod stats;
pub mod traits;
pub mod trend_analyzer;
pub mod types;

pub use anomaly_analyzer::{classify_severity, detect_anomalies, AnomalyDetector};
pub use forecast::{detect_early_warnings, forecast_metric, forecast_metric_with_alpha};
pub use insight_generator::{is_adverse, InsightGenerator, InsightInputs};
pub use pattern_analyzer::{identify_seasonal_patterns, SeasonalDetector};
pub use regression::{
    calculate_correlation, calculate_linear_regression, calculate_linear_regression_with_alpha,
    mann_kendall_trend_test, mann_kendall_trend_test_with_alpha,
};
pub use stats::calculate_statistics;
pub use traits::{Clock, FixedClock, IdGenerator, SequentialIdGenerator, SystemClock, UuidGenerator};
pub use trend_analyzer::{analyze_trend, TrendAnalyzer};
pub use types::*;
