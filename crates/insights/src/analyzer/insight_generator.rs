//! Insight generation
//!
//! Converts raw analysis results into categorized, severity-tagged insights. This is where
//! metric "goodness" is interpreted: falling FPS is adverse, rising memory, CPU or load
//! time is adverse.

use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

use super::forecast::capitalize;
use super::stats::two_sided_p_value;
use super::traits::{Clock, IdGenerator};
use super::types::{
    AnomalyRecord, Confidence, CorrelationResult, CorrelationStrength, Effort, Impact,
    InsightCategory, InsightType, MetricType, PerformanceInsight, Relationship,
    SeasonalPattern, Severity, Significance, StatisticalResult, TrendAnalysis,
    TrendDirection, TrendSignificance,
};
use crate::config::MetricThresholds;

/// Analysis results an insight run draws from
#[derive(Debug, Clone, Copy, Default)]
pub struct InsightInputs<'a> {
    pub trends: &'a [TrendAnalysis],
    pub anomalies: &'a [AnomalyRecord],
    pub patterns: &'a [SeasonalPattern],
    pub correlations: &'a [CorrelationResult],
    pub statistics: Option<&'a BTreeMap<MetricType, StatisticalResult>>,
}

/// Whether a trend direction is bad news for the metric
pub fn is_adverse(metric: MetricType, direction: TrendDirection) -> bool {
    match direction {
        TrendDirection::Stable => false,
        TrendDirection::Up => !metric.higher_is_better(),
        TrendDirection::Down => metric.higher_is_better(),
    }
}

fn impact_for(severity: Severity) -> Impact {
    match severity {
        Severity::Critical | Severity::High => Impact::High,
        Severity::Medium => Impact::Medium,
        Severity::Low => Impact::Low,
    }
}

/// Builds insights with injected ids and timestamps
pub struct InsightGenerator {
    thresholds: MetricThresholds,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl InsightGenerator {
    pub fn new(thresholds: MetricThresholds, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            thresholds,
            ids,
            clock,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        insight_type: InsightType,
        category: InsightCategory,
        metric_type: Option<MetricType>,
        severity: Severity,
        confidence: f64,
        title: String,
        description: String,
        impact: Impact,
        effort: Effort,
        data_context: serde_json::Value,
    ) -> PerformanceInsight {
        PerformanceInsight {
            id: self.ids.next_id(),
            insight_type,
            category,
            metric_type,
            severity,
            confidence: Confidence::new(confidence),
            title,
            description,
            impact,
            effort,
            data_context,
            created_at: self.clock.now(),
        }
    }

    /// Insight for an adverse, non-trivial trend
    pub fn from_trend(&self, trend: &TrendAnalysis) -> Option<PerformanceInsight> {
        let metric = trend.metric_type;
        if !is_adverse(metric, trend.direction) || trend.significance == TrendSignificance::Low {
            return None;
        }

        let forecast_breaches = trend
            .forecast
            .map(|f| self.thresholds.is_breached(metric, f))
            .unwrap_or(false);
        let severity = match (trend.significance, forecast_breaches) {
            (_, true) if trend.significance == TrendSignificance::High => Severity::Critical,
            (TrendSignificance::High, false) | (_, true) => Severity::High,
            _ => Severity::Medium,
        };

        let verb = match trend.direction {
            TrendDirection::Down => "declining",
            _ => "increasing",
        };

        Some(self.build(
            InsightType::Trend,
            metric.category(),
            Some(metric),
            severity,
            trend.confidence,
            format!("{} {}", capitalize(metric.label()), verb),
            format!(
                "{} has been {} by {:.2} {} per sample over {} ({} data points)",
                capitalize(metric.label()),
                verb,
                trend.slope.abs(),
                metric.unit(),
                trend.time_period,
                trend.data_points,
            ),
            impact_for(severity),
            Effort::Medium,
            json!({
                "direction": trend.direction,
                "slope": trend.slope,
                "time_period": trend.time_period,
                "forecast": trend.forecast,
                "forecast_breaches_threshold": forecast_breaches,
                "data_points": trend.data_points,
            }),
        ))
    }

    /// One insight per metric summarizing its anomalies
    pub fn from_anomalies(&self, anomalies: &[AnomalyRecord]) -> Vec<PerformanceInsight> {
        let mut by_metric: BTreeMap<MetricType, Vec<&AnomalyRecord>> = BTreeMap::new();
        for anomaly in anomalies {
            by_metric.entry(anomaly.metric_type).or_default().push(anomaly);
        }

        by_metric
            .into_iter()
            .map(|(metric, records)| {
                let worst = records
                    .iter()
                    .map(|r| r.severity)
                    .max()
                    .unwrap_or(Severity::Low);
                let max_z = records.iter().map(|r| r.z_score.abs()).fold(0.0, f64::max);
                let spikes = records.iter().filter(|r| r.z_score > 0.0).count();
                let drops = records.len() - spikes;
                let expected = records.first().map(|r| r.expected_value).unwrap_or(0.0);

                self.build(
                    InsightType::Anomaly,
                    metric.category(),
                    Some(metric),
                    worst,
                    1.0 - two_sided_p_value(max_z),
                    format!("{} {} anomalies detected", records.len(), metric.label()),
                    format!(
                        "{} samples deviate from the {} mean of {:.1} {} (max |z| = {:.2})",
                        records.len(),
                        metric.label(),
                        expected,
                        metric.unit(),
                        max_z,
                    ),
                    impact_for(worst),
                    Effort::Medium,
                    json!({
                        "count": records.len(),
                        "spikes": spikes,
                        "drops": drops,
                        "max_z_score": max_z,
                        "expected_value": expected,
                        "values": records.iter().map(|r| r.value).collect::<Vec<_>>(),
                    }),
                )
            })
            .collect()
    }

    /// Insight describing a recurring cycle
    pub fn from_seasonal(&self, pattern: &SeasonalPattern) -> PerformanceInsight {
        let metric = pattern.metric_type;
        let worst_bucket = if metric.higher_is_better() {
            pattern.bucket_averages.iter().copied().fold(f64::MAX, f64::min)
        } else {
            pattern.bucket_averages.iter().copied().fold(f64::MIN, f64::max)
        };
        let breaches = self.thresholds.is_breached(metric, worst_bucket);
        let severity = if breaches {
            Severity::Medium
        } else {
            Severity::Low
        };
        let bad_times = if metric.higher_is_better() {
            &pattern.low_times
        } else {
            &pattern.peak_times
        };

        self.build(
            InsightType::Seasonal,
            metric.category(),
            Some(metric),
            severity,
            pattern.confidence,
            format!(
                "{} {} pattern detected",
                capitalize(pattern.pattern_type.as_str()),
                metric.label()
            ),
            format!(
                "{} varies by {:.1} {} over a {} cycle; worst at {}",
                capitalize(metric.label()),
                pattern.amplitude,
                metric.unit(),
                pattern.pattern_type.as_str(),
                bad_times.join(", "),
            ),
            if breaches { Impact::Medium } else { Impact::Low },
            Effort::Medium,
            json!({
                "pattern_type": pattern.pattern_type,
                "peak_times": pattern.peak_times,
                "low_times": pattern.low_times,
                "amplitude": pattern.amplitude,
                "worst_bucket_average": worst_bucket,
                "breaches_threshold": breaches,
            }),
        )
    }

    /// Insight for a strong, significant correlation between two metrics
    pub fn from_correlation(&self, correlation: &CorrelationResult) -> Option<PerformanceInsight> {
        if correlation.strength != CorrelationStrength::Strong
            || correlation.significance != Significance::Significant
            || correlation.relationship == Relationship::None
        {
            return None;
        }
        let (kind, movement) = match correlation.relationship {
            Relationship::Negative => ("negative", "move in opposite directions"),
            _ => ("positive", "move together"),
        };

        Some(self.build(
            InsightType::Correlation,
            InsightCategory::General,
            None,
            Severity::Medium,
            correlation.correlation_coefficient.abs(),
            format!(
                "Strong {} correlation between {} and {}",
                kind, correlation.metric_a, correlation.metric_b
            ),
            format!(
                "{} and {} {} (r = {:.2}, p = {:.4}, n = {})",
                correlation.metric_a,
                correlation.metric_b,
                movement,
                correlation.correlation_coefficient,
                correlation.p_value,
                correlation.sample_size,
            ),
            Impact::Medium,
            Effort::High,
            json!({
                "metric_a": correlation.metric_a,
                "metric_b": correlation.metric_b,
                "coefficient": correlation.correlation_coefficient,
                "p_value": correlation.p_value,
                "sample_size": correlation.sample_size,
            }),
        ))
    }

    /// Insight for a metric whose mean is on the wrong side of its limit
    pub fn from_threshold(
        &self,
        metric: MetricType,
        stats: &StatisticalResult,
    ) -> Option<PerformanceInsight> {
        if stats.count == 0 || !self.thresholds.is_breached(metric, stats.mean) {
            return None;
        }
        let limit = self.thresholds.limit(metric);
        let exceedance = if limit.abs() > f64::EPSILON {
            (stats.mean - limit).abs() / limit.abs()
        } else {
            1.0
        };
        let severity = if exceedance >= 0.5 {
            Severity::Critical
        } else if exceedance >= 0.25 {
            Severity::High
        } else if exceedance >= 0.1 {
            Severity::Medium
        } else {
            Severity::Low
        };
        // Most samples breach, not just the mean
        let bulk = if metric.higher_is_better() {
            self.thresholds.is_breached(metric, stats.percentile_75)
        } else {
            self.thresholds.is_breached(metric, stats.percentile_25)
        };

        Some(self.build(
            InsightType::Threshold,
            metric.category(),
            Some(metric),
            severity,
            if bulk { 0.9 } else { 0.6 },
            format!("{} outside healthy range", capitalize(metric.label())),
            format!(
                "Average {} is {:.1} {} against a limit of {:.0} {}",
                metric.label(),
                stats.mean,
                metric.unit(),
                limit,
                metric.unit(),
            ),
            Impact::High,
            Effort::Medium,
            json!({
                "mean": stats.mean,
                "limit": limit,
                "exceedance": exceedance,
                "p95": stats.percentile_95,
            }),
        ))
    }

    /// Generate every insight the inputs support
    pub fn generate(&self, inputs: InsightInputs<'_>) -> Vec<PerformanceInsight> {
        let mut insights = Vec::new();

        if let Some(statistics) = inputs.statistics {
            insights.extend(
                statistics
                    .iter()
                    .filter_map(|(metric, stats)| self.from_threshold(*metric, stats)),
            );
        }
        insights.extend(inputs.trends.iter().filter_map(|t| self.from_trend(t)));
        insights.extend(self.from_anomalies(inputs.anomalies));
        insights.extend(inputs.patterns.iter().map(|p| self.from_seasonal(p)));
        insights.extend(inputs.correlations.iter().filter_map(|c| self.from_correlation(c)));

        for insight in &insights {
            trace!(
                id = %insight.id,
                kind = ?insight.insight_type,
                severity = ?insight.severity,
                "Insight generated"
            );
        }
        debug!(count = insights.len(), "Insights generated");
        insights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::traits::{FixedClock, SequentialIdGenerator};
    use crate::analyzer::types::SeasonalPatternType;
    use chrono::{TimeZone, Utc};

    fn generator() -> InsightGenerator {
        InsightGenerator::new(
            MetricThresholds::default(),
            Arc::new(SequentialIdGenerator::new("insight")),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap())),
        )
    }

    fn trend(metric: MetricType, direction: TrendDirection, forecast: Option<f64>) -> TrendAnalysis {
        TrendAnalysis {
            metric_type: metric,
            direction,
            slope: if direction == TrendDirection::Down { -2.0 } else { 2.0 },
            confidence: 0.9,
            significance: TrendSignificance::High,
            data_points: 20,
            time_period: "24h".to_string(),
            forecast,
        }
    }

    #[test]
    fn test_only_adverse_trends_produce_insights() {
        let gen = generator();
        assert!(gen.from_trend(&trend(MetricType::Fps, TrendDirection::Up, Some(60.0))).is_none());
        assert!(gen.from_trend(&trend(MetricType::MemoryUsage, TrendDirection::Down, Some(100.0))).is_none());

        let fps = gen.from_trend(&trend(MetricType::Fps, TrendDirection::Down, Some(45.0))).unwrap();
        assert_eq!(fps.insight_type, InsightType::Trend);
        assert_eq!(fps.category, InsightCategory::Rendering);
        assert_eq!(fps.severity, Severity::High);
        assert_eq!(fps.title, "FPS declining");
        assert_eq!(fps.id, "insight-1");
    }

    #[test]
    fn test_trend_breaching_forecast_is_critical() {
        let gen = generator();
        let insight = gen
            .from_trend(&trend(MetricType::MemoryUsage, TrendDirection::Up, Some(620.0)))
            .unwrap();
        assert_eq!(insight.severity, Severity::Critical);
        assert_eq!(insight.impact, Impact::High);
        assert_eq!(insight.data_context["forecast_breaches_threshold"], true);
    }

    #[test]
    fn test_anomalies_grouped_per_metric() {
        let gen = generator();
        let at = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let record = |metric, z, severity| AnomalyRecord {
            metric_type: metric,
            index: 0,
            value: 100.0,
            expected_value: 40.0,
            z_score: z,
            severity,
            timestamp: at,
        };
        let anomalies = vec![
            record(MetricType::MemoryUsage, 2.2, Severity::Low),
            record(MetricType::MemoryUsage, 4.5, Severity::Critical),
            record(MetricType::Fps, -2.6, Severity::Medium),
        ];

        let insights = gen.from_anomalies(&anomalies);
        assert_eq!(insights.len(), 2);
        let fps = &insights[0];
        assert_eq!(fps.metric_type, Some(MetricType::Fps));
        assert_eq!(fps.data_context["drops"], 1);
        let memory = &insights[1];
        assert_eq!(memory.severity, Severity::Critical);
        assert_eq!(memory.data_context["spikes"], 2);
        assert!(memory.confidence.value() >= 0.8);
    }

    #[test]
    fn test_threshold_violation() {
        let gen = generator();
        let stats = StatisticalResult {
            count: 10,
            mean: 20.0,
            percentile_25: 18.0,
            percentile_75: 22.0,
            ..Default::default()
        };
        let insight = gen.from_threshold(MetricType::Fps, &stats).unwrap();
        assert_eq!(insight.severity, Severity::High);
        assert!(insight.confidence.value() >= 0.8);

        let healthy = StatisticalResult {
            count: 10,
            mean: 55.0,
            ..Default::default()
        };
        assert!(gen.from_threshold(MetricType::Fps, &healthy).is_none());
    }

    #[test]
    fn test_weak_correlation_is_ignored() {
        let gen = generator();
        let mut correlation = CorrelationResult {
            metric_a: "memory_usage".to_string(),
            metric_b: "cpu_usage".to_string(),
            correlation_coefficient: 0.95,
            relationship: Relationship::Positive,
            strength: CorrelationStrength::Strong,
            significance: Significance::Significant,
            p_value: 0.001,
            sample_size: 30,
        };
        let insight = gen.from_correlation(&correlation).unwrap();
        assert_eq!(insight.category, InsightCategory::General);
        assert!(insight.metric_type.is_none());

        correlation.strength = CorrelationStrength::Moderate;
        assert!(gen.from_correlation(&correlation).is_none());
    }

    #[test]
    fn test_correlation_wording_follows_sign() {
        let gen = generator();
        let mut correlation = CorrelationResult {
            metric_a: "memory_usage".to_string(),
            metric_b: "fps".to_string(),
            correlation_coefficient: 0.9,
            relationship: Relationship::Positive,
            strength: CorrelationStrength::Strong,
            significance: Significance::Significant,
            p_value: 0.001,
            sample_size: 30,
        };
        let positive = gen.from_correlation(&correlation).unwrap();
        assert!(positive.description.starts_with("memory_usage and fps move together"));

        correlation.correlation_coefficient = -0.9;
        correlation.relationship = Relationship::Negative;
        let negative = gen.from_correlation(&correlation).unwrap();
        assert!(negative.title.starts_with("Strong negative correlation"));
        assert!(negative.description.starts_with("memory_usage and fps move in opposite directions"));
        assert!(!negative.description.contains("move together"));
    }

    #[test]
    fn test_seasonal_fps_dip_below_threshold() {
        let gen = generator();
        let pattern = SeasonalPattern {
            metric_type: MetricType::Fps,
            pattern_type: SeasonalPatternType::Daily,
            peak_times: vec!["12:00".to_string()],
            low_times: vec!["02:00".to_string()],
            amplitude: 35.0,
            confidence: 0.8,
            bucket_averages: vec![25.0, 60.0],
        };
        let insight = gen.from_seasonal(&pattern);
        assert_eq!(insight.severity, Severity::Medium);
        assert_eq!(insight.title, "Daily FPS pattern detected");
        assert!(insight.description.contains("02:00"));
    }

    #[test]
    fn test_generate_collects_everything() {
        let gen = generator();
        let trends = vec![trend(MetricType::CpuUsage, TrendDirection::Up, Some(70.0))];
        let insights = gen.generate(InsightInputs {
            trends: &trends,
            ..Default::default()
        });
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].category, InsightCategory::Cpu);
    }
}
