//! Proactive pipeline
//!
//! Turns forward-looking signals (forecasts, recurring cycles, early warnings) into
//! prevention-oriented recommendations before users feel the problem.

use crate::analyzer::insight_generator::is_adverse;
use crate::analyzer::stats::{mean, percentage_change};
use crate::analyzer::types::{
    EarlyWarningAlert, MetricType, PerformanceForecast, SeasonalPattern, Severity, TrendDirection,
};

use super::rules::metric_title;
use super::types::{PreventionPriority, ProactiveTrigger, RecommendationCategory};

/// A proactive recommendation before ids and timestamps are assigned
#[derive(Debug, Clone, PartialEq)]
pub struct ProactiveCandidate {
    pub title: String,
    pub description: String,
    pub category: RecommendationCategory,
    pub trigger: ProactiveTrigger,
    pub metric_type: MetricType,
    pub prevention_priority: PreventionPriority,
    pub priority_score: f64,
    pub confidence: f64,
    pub steps_to_impact: Option<usize>,
    pub actionable_steps: Vec<String>,
}

fn priority_for(severity: Severity) -> PreventionPriority {
    match severity {
        Severity::Critical => PreventionPriority::Critical,
        Severity::High => PreventionPriority::High,
        Severity::Medium => PreventionPriority::Medium,
        Severity::Low => PreventionPriority::Low,
    }
}

/// Candidates raised by early-warning alerts
pub fn warning_candidates(warnings: &[EarlyWarningAlert]) -> Vec<ProactiveCandidate> {
    warnings
        .iter()
        .map(|warning| {
            let metric = warning.metric_type;
            let urgency = 1.0 + 1.0 / warning.steps_to_breach.max(1) as f64;
            ProactiveCandidate {
                title: format!("Prevent {} threshold breach", metric.label()),
                description: warning.message.clone(),
                category: metric.category(),
                trigger: ProactiveTrigger::EarlyWarning,
                metric_type: metric,
                prevention_priority: priority_for(warning.severity),
                priority_score: warning.severity.weight() * warning.confidence.clamp(0.0, 1.0) * urgency,
                confidence: warning.confidence,
                steps_to_impact: Some(warning.steps_to_breach),
                actionable_steps: vec![
                    format!("Review changes that affect {}", metric.label()),
                    format!(
                        "Add an alert at {:.0} {} before the limit is reached",
                        warning.threshold,
                        metric.unit()
                    ),
                ],
            }
        })
        .collect()
}

/// Candidates for forecasts heading the wrong way
pub fn forecast_candidates(forecasts: &[PerformanceForecast]) -> Vec<ProactiveCandidate> {
    forecasts
        .iter()
        .filter(|f| is_adverse(f.metric_type, f.direction))
        .map(|forecast| {
            let metric = forecast.metric_type;
            let prevention_priority = match (&forecast.threshold_breach, forecast.confidence) {
                (Some(_), _) => PreventionPriority::High,
                (None, c) if c >= 0.5 => PreventionPriority::Medium,
                _ => PreventionPriority::Low,
            };
            let verb = match forecast.direction {
                TrendDirection::Down => "decline",
                _ => "growth",
            };
            let projected = forecast
                .points
                .last()
                .map(|p| p.value)
                .unwrap_or(forecast.current_value);
            let relative_change = percentage_change(forecast.current_value, projected).abs() / 100.0;

            ProactiveCandidate {
                title: format!("Plan for {} {}", metric.label(), verb),
                description: format!(
                    "{} is projected to move from {:.1} to {:.1} {} over the next {} steps",
                    metric_title(metric),
                    forecast.current_value,
                    projected,
                    metric.unit(),
                    forecast.horizon,
                ),
                category: metric.category(),
                trigger: ProactiveTrigger::Forecast,
                metric_type: metric,
                prevention_priority,
                priority_score: forecast.confidence * (1.0 + relative_change) * 2.0,
                confidence: forecast.confidence,
                steps_to_impact: forecast.threshold_breach.as_ref().map(|b| b.step),
                actionable_steps: vec![
                    "Schedule a profiling session before the next release".to_string(),
                    format!("Track {} per release to confirm the trend", metric.label()),
                ],
            }
        })
        .collect()
}

/// Candidates for recurring cycles with a meaningful swing
pub fn seasonal_candidates(patterns: &[SeasonalPattern]) -> Vec<ProactiveCandidate> {
    patterns
        .iter()
        .filter(|p| p.amplitude > 0.0)
        .map(|pattern| {
            let metric = pattern.metric_type;
            let baseline = mean(&pattern.bucket_averages).abs();
            let relative = if baseline > f64::EPSILON {
                pattern.amplitude / baseline
            } else {
                0.0
            };
            let prevention_priority = if relative >= 0.2 {
                PreventionPriority::Medium
            } else {
                PreventionPriority::Low
            };
            let worst = if metric.higher_is_better() {
                &pattern.low_times
            } else {
                &pattern.peak_times
            };

            ProactiveCandidate {
                title: format!(
                    "Schedule around {} {} peaks",
                    pattern.pattern_type.as_str(),
                    metric.label()
                ),
                description: format!(
                    "{} swings by {:.1} {} with the worst periods at {}",
                    metric_title(metric),
                    pattern.amplitude,
                    metric.unit(),
                    worst.join(", ")
                ),
                category: metric.category(),
                trigger: ProactiveTrigger::Seasonal,
                metric_type: metric,
                prevention_priority,
                priority_score: pattern.confidence * (1.0 + relative.min(1.0)),
                confidence: pattern.confidence,
                steps_to_impact: None,
                actionable_steps: vec![
                    "Avoid deploying during the worst periods".to_string(),
                    "Pre-warm caches ahead of the recurring peak".to_string(),
                ],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::types::{ForecastPoint, SeasonalPatternType, ThresholdBreach};
    use chrono::{TimeZone, Utc};

    fn forecast(metric: MetricType, direction: TrendDirection, breach: bool) -> PerformanceForecast {
        PerformanceForecast {
            metric_type: metric,
            current_value: 300.0,
            horizon: 2,
            points: vec![
                ForecastPoint { step: 1, value: 320.0, lower_bound: 310.0, upper_bound: 330.0 },
                ForecastPoint { step: 2, value: 340.0, lower_bound: 325.0, upper_bound: 355.0 },
            ],
            direction,
            confidence: 0.9,
            threshold_breach: breach.then(|| ThresholdBreach {
                step: 2,
                threshold: 330.0,
                predicted_value: 340.0,
            }),
        }
    }

    #[test]
    fn test_forecast_candidates_only_for_adverse_direction() {
        let candidates = forecast_candidates(&[
            forecast(MetricType::MemoryUsage, TrendDirection::Up, true),
            forecast(MetricType::Fps, TrendDirection::Up, false),
            forecast(MetricType::CpuUsage, TrendDirection::Stable, false),
        ]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].prevention_priority, PreventionPriority::High);
        assert_eq!(candidates[0].steps_to_impact, Some(2));
        assert_eq!(candidates[0].title, "Plan for memory usage growth");
    }

    #[test]
    fn test_warning_priority_follows_severity() {
        let warning = EarlyWarningAlert {
            id: "w-1".to_string(),
            metric_type: MetricType::Fps,
            severity: Severity::Critical,
            title: "FPS projected to cross its threshold".to_string(),
            message: "FPS is falling".to_string(),
            current_value: 33.0,
            projected_value: 29.0,
            threshold: 30.0,
            steps_to_breach: 1,
            confidence: 1.0,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        let candidates = warning_candidates(&[warning]);
        assert_eq!(candidates[0].prevention_priority, PreventionPriority::Critical);
        assert!((candidates[0].priority_score - 8.0).abs() < 1e-9);
        assert_eq!(candidates[0].category, RecommendationCategory::Rendering);
    }

    #[test]
    fn test_seasonal_priority_from_relative_swing() {
        let pattern = SeasonalPattern {
            metric_type: MetricType::CpuUsage,
            pattern_type: SeasonalPatternType::Daily,
            peak_times: vec!["14:00".to_string()],
            low_times: vec!["03:00".to_string()],
            amplitude: 30.0,
            confidence: 0.8,
            bucket_averages: vec![30.0, 60.0],
        };
        let candidates = seasonal_candidates(&[pattern]);
        assert_eq!(candidates[0].prevention_priority, PreventionPriority::Medium);
        assert!(candidates[0].description.contains("14:00"));
    }
}
