//! Performance insights for app telemetry
//!
//! This crate turns time-ordered performance samples (frame rate, memory, CPU, load time)
//! into statistics, trends, anomalies, recurring patterns and forecasts, derives
//! severity-tagged insights from them, and ranks actionable recommendations.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod metrics;
pub mod recommendation;
pub mod report;
pub mod telemetry;

pub use analyzer::{
    analyze_trend, calculate_correlation, calculate_linear_regression, calculate_statistics,
    detect_anomalies, detect_early_warnings, forecast_metric, forecast_metric_with_alpha,
    identify_seasonal_patterns, mann_kendall_trend_test, AnomalyDetector, Clock, FixedClock,
    IdGenerator, InsightGenerator, InsightInputs, SeasonalDetector, SequentialIdGenerator,
    SystemClock, TrendAnalyzer, UuidGenerator,
};

pub use analyzer::types::{
    AnomalyRecord, Confidence, CorrelationResult, CorrelationStrength, Effort,
    EarlyWarningAlert, Impact, InsightCategory, InsightType, MannKendallResult, MetricDataset,
    MetricSample, MetricType, MonotonicTrend, PerformanceForecast, PerformanceInsight,
    RegressionResult, Relationship, SeasonalPattern, SeasonalPatternType, Severity,
    Significance, StatisticalResult, TrendAnalysis, TrendDirection, TrendSignificance,
};

pub use config::{
    AnomalyConfig, CorrelationThresholds, ForecastConfig, InsightsConfig, InsightsConfigBuilder,
    MetricThresholds, RecommendationConfig, RegressionConfig, SeasonalConfig, SeverityBands,
    StatisticsConfig, TrendConfig,
};

pub use error::{InsightError, Result};

pub use metrics::{InsightMetrics, MetricsSnapshot};

pub use recommendation::{
    CpuReading, OptimizationOpportunity, PerformanceRecommendation, PerformanceSummary,
    PreventionPriority, ProactiveRecommendation, ProactiveTrigger, RecommendationCategory,
    RecommendationEngine, RecommendationRule, RecommendationSource, RecommendationStatus,
    RiskLevel, RoutePerformanceAnalysis, RouteSessionSummary, DEFAULT_RULES,
};

pub use report::{PerformanceReport, ReportGenerator};

pub use telemetry::{init_tracing, TelemetryConfig};
