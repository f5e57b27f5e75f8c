//! Report generation
//!
//! Runs every analysis over a metric dataset and feeds the results through insight
//! generation and both recommendation pipelines. The per-metric stage is independent across
//! metrics, so [`ReportGenerator::generate_concurrent`] runs it on blocking tasks and joins
//! the results in metric order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::analyzer::anomaly_analyzer::detect_anomalies;
use crate::analyzer::forecast::{detect_early_warnings, forecast_metric_with_alpha};
use crate::analyzer::insight_generator::{InsightGenerator, InsightInputs};
use crate::analyzer::pattern_analyzer::identify_seasonal_patterns;
use crate::analyzer::regression::{calculate_correlation, mann_kendall_trend_test_with_alpha};
use crate::analyzer::stats::calculate_statistics;
use crate::analyzer::traits::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::analyzer::trend_analyzer::analyze_trend;
use crate::analyzer::types::{
    AnomalyRecord, CorrelationResult, EarlyWarningAlert, MannKendallResult, MetricDataset,
    MetricSample, MetricType, PerformanceForecast, PerformanceInsight, SeasonalPattern,
    StatisticalResult, TrendAnalysis,
};
use crate::config::InsightsConfig;
use crate::error::{InsightError, Result};
use crate::metrics::InsightMetrics;
use crate::recommendation::engine::RecommendationEngine;
use crate::recommendation::types::{
    OptimizationOpportunity, PerformanceRecommendation, PerformanceSummary,
    ProactiveRecommendation, RoutePerformanceAnalysis,
};

/// Everything one report run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub generated_at: DateTime<Utc>,
    pub statistics: BTreeMap<MetricType, StatisticalResult>,
    pub trends: Vec<TrendAnalysis>,
    pub monotonic_trends: BTreeMap<MetricType, MannKendallResult>,
    pub anomalies: Vec<AnomalyRecord>,
    pub seasonal_patterns: Vec<SeasonalPattern>,
    pub correlations: Vec<CorrelationResult>,
    pub forecasts: Vec<PerformanceForecast>,
    pub early_warnings: Vec<EarlyWarningAlert>,
    pub insights: Vec<PerformanceInsight>,
    pub recommendations: Vec<PerformanceRecommendation>,
    pub proactive_recommendations: Vec<ProactiveRecommendation>,
}

/// Results of the per-metric stage
#[derive(Debug, Clone)]
struct MetricAnalysis {
    metric: MetricType,
    statistics: StatisticalResult,
    trend: TrendAnalysis,
    monotonic: MannKendallResult,
    anomalies: Vec<AnomalyRecord>,
    patterns: Vec<SeasonalPattern>,
    forecast: Option<PerformanceForecast>,
}

/// Human readable span covered by a series
fn period_label(series: &[MetricSample]) -> String {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return "no data".to_string();
    };
    let span = last.timestamp - first.timestamp;
    if span.num_days() >= 2 {
        format!("{} days", span.num_days())
    } else if span.num_hours() >= 1 {
        format!("{} hours", span.num_hours())
    } else {
        format!("{} minutes", span.num_minutes())
    }
}

fn analyze_metric(metric: MetricType, series: &[MetricSample], config: &InsightsConfig) -> MetricAnalysis {
    let values = MetricSample::values(series);
    MetricAnalysis {
        metric,
        statistics: calculate_statistics(&values, config.statistics.iqr_multiplier),
        trend: analyze_trend(series, metric, &period_label(series), &config.trend),
        monotonic: mann_kendall_trend_test_with_alpha(&values, config.regression.mann_kendall_alpha),
        anomalies: detect_anomalies(
            series,
            metric,
            config.anomaly.z_threshold,
            config.anomaly.min_samples,
            &config.anomaly.severity_bands,
        ),
        patterns: identify_seasonal_patterns(series, metric, &config.seasonal),
        forecast: forecast_metric_with_alpha(
            series,
            metric,
            &config.forecast,
            config.regression.significance_alpha,
        ),
    }
}

/// Correlations between every pair of equally long metric series
fn pairwise_correlations(dataset: &MetricDataset, config: &InsightsConfig) -> Vec<CorrelationResult> {
    let series: Vec<(MetricType, Vec<f64>)> = dataset
        .series
        .iter()
        .filter(|(_, samples)| !samples.is_empty())
        .map(|(metric, samples)| (*metric, MetricSample::values(samples)))
        .collect();

    let mut correlations = Vec::new();
    for (i, (metric_a, a)) in series.iter().enumerate() {
        for (metric_b, b) in &series[i + 1..] {
            if a.len() != b.len() {
                continue;
            }
            correlations.push(calculate_correlation(
                a,
                b,
                metric_a.as_str(),
                metric_b.as_str(),
                &config.correlation,
            ));
        }
    }
    correlations
}

/// Orchestrates analysis, insight generation and recommendations
pub struct ReportGenerator {
    config: Arc<InsightsConfig>,
    insights: InsightGenerator,
    engine: RecommendationEngine,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<InsightMetrics>>,
}

impl ReportGenerator {
    /// Create a generator after validating `config`
    pub fn new(config: InsightsConfig, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, ids, clock))
    }

    /// Default configuration with random ids and the system clock
    pub fn with_defaults() -> Self {
        Self::build(
            InsightsConfig::default(),
            Arc::new(UuidGenerator),
            Arc::new(SystemClock),
        )
    }

    fn build(config: InsightsConfig, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        let insights = InsightGenerator::new(config.forecast.thresholds.clone(), ids.clone(), clock.clone());
        let engine = RecommendationEngine::with_default_rules(
            config.recommendation.clone(),
            ids.clone(),
            clock.clone(),
        );
        Self {
            config: Arc::new(config),
            insights,
            engine,
            ids,
            clock,
            metrics: None,
        }
    }

    /// Record run statistics into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<InsightMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    fn validate(&self, dataset: &MetricDataset) -> Result<()> {
        dataset.validate().map_err(|e| {
            warn!(error = %e, "Dataset validation failed");
            if let Some(metrics) = &self.metrics {
                metrics.record_validation_failure();
            }
            e
        })
    }

    /// Generate a report on the calling thread
    pub fn generate(
        &self,
        dataset: &MetricDataset,
        context: &PerformanceSummary,
        routes: Option<&[RoutePerformanceAnalysis]>,
        opportunities: Option<&[OptimizationOpportunity]>,
    ) -> Result<PerformanceReport> {
        let start = Instant::now();
        self.validate(dataset)?;

        let analyses: Vec<MetricAnalysis> = dataset
            .series
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(metric, samples)| analyze_metric(*metric, samples, &self.config))
            .collect();

        Ok(self.assemble(analyses, dataset, context, routes, opportunities, start))
    }

    /// Generate a report with one blocking task per metric series
    ///
    /// # Errors
    ///
    /// Validation errors as in [`generate`](Self::generate), and
    /// [`InsightError::TaskFailed`] when a task panics or is cancelled.
    pub async fn generate_concurrent(
        &self,
        dataset: &MetricDataset,
        context: &PerformanceSummary,
        routes: Option<&[RoutePerformanceAnalysis]>,
        opportunities: Option<&[OptimizationOpportunity]>,
    ) -> Result<PerformanceReport> {
        let start = Instant::now();
        self.validate(dataset)?;

        let handles: Vec<_> = dataset
            .series
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(metric, samples)| {
                let metric = *metric;
                let samples = samples.clone();
                let config = Arc::clone(&self.config);
                tokio::task::spawn_blocking(move || analyze_metric(metric, &samples, &config))
            })
            .collect();

        debug!(tasks = handles.len(), "Spawned metric analysis tasks");

        let mut analyses = Vec::with_capacity(handles.len());
        for handle in handles {
            let analysis = handle
                .await
                .map_err(|e| InsightError::TaskFailed(e.to_string()))?;
            analyses.push(analysis);
        }

        Ok(self.assemble(analyses, dataset, context, routes, opportunities, start))
    }

    fn assemble(
        &self,
        analyses: Vec<MetricAnalysis>,
        dataset: &MetricDataset,
        context: &PerformanceSummary,
        routes: Option<&[RoutePerformanceAnalysis]>,
        opportunities: Option<&[OptimizationOpportunity]>,
        start: Instant,
    ) -> PerformanceReport {
        let mut statistics = BTreeMap::new();
        let mut monotonic_trends = BTreeMap::new();
        let mut trends = Vec::new();
        let mut anomalies = Vec::new();
        let mut seasonal_patterns = Vec::new();
        let mut forecasts = Vec::new();

        for analysis in analyses {
            if let Some(metrics) = &self.metrics {
                metrics.record_series_analyzed(analysis.metric);
            }
            statistics.insert(analysis.metric, analysis.statistics);
            monotonic_trends.insert(analysis.metric, analysis.monotonic);
            trends.push(analysis.trend);
            anomalies.extend(analysis.anomalies);
            seasonal_patterns.extend(analysis.patterns);
            forecasts.extend(analysis.forecast);
        }

        let correlations = pairwise_correlations(dataset, &self.config);
        let early_warnings = detect_early_warnings(
            &forecasts,
            &self.config.forecast,
            self.clock.as_ref(),
            self.ids.as_ref(),
        );

        let insights = self.insights.generate(InsightInputs {
            trends: &trends,
            anomalies: &anomalies,
            patterns: &seasonal_patterns,
            correlations: &correlations,
            statistics: Some(&statistics),
        });

        let batch = self
            .engine
            .generate_batch(&insights, context, opportunities, routes);
        let proactive_recommendations = self.engine.generate_proactive_recommendations(
            &forecasts,
            &seasonal_patterns,
            &early_warnings,
        );

        if let Some(metrics) = &self.metrics {
            anomalies.iter().for_each(|a| metrics.record_anomaly(a.severity));
            insights.iter().for_each(|i| metrics.record_insight(i.insight_type));
            batch
                .recommendations
                .iter()
                .for_each(|r| metrics.record_recommendation(r.source));
            metrics.record_discarded(batch.discarded as u64);
            metrics.record_proactive(proactive_recommendations.len() as u64);
            metrics.record_early_warnings(early_warnings.len() as u64);
            metrics.record_report(start.elapsed().as_secs_f64());
        }

        info!(
            metrics = statistics.len(),
            samples = dataset.total_samples(),
            anomalies = anomalies.len(),
            insights = insights.len(),
            recommendations = batch.recommendations.len(),
            proactive = proactive_recommendations.len(),
            warnings = early_warnings.len(),
            elapsed = ?start.elapsed(),
            "Performance report generated"
        );

        PerformanceReport {
            generated_at: self.clock.now(),
            statistics,
            trends,
            monotonic_trends,
            anomalies,
            seasonal_patterns,
            correlations,
            forecasts,
            early_warnings,
            insights,
            recommendations: batch.recommendations,
            proactive_recommendations,
        }
    }
}
