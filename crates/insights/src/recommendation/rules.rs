//! Recommendation rule table
//!
//! Each rule pairs a predicate over an insight with a builder for the recommendation
//! content. Rules are evaluated in table order and every matching rule contributes a
//! candidate.

use crate::analyzer::forecast::capitalize;
use crate::analyzer::types::{Effort, Impact, InsightType, MetricType, PerformanceInsight, Severity};

use super::types::{RecommendationCategory, RecommendationDraft};

/// One data-driven recommendation rule
#[derive(Clone, Copy)]
pub struct RecommendationRule {
    pub id: &'static str,
    pub condition: fn(&PerformanceInsight) -> bool,
    pub recommendation: fn(&PerformanceInsight) -> RecommendationDraft,
    pub priority_weight: f64,
    pub categories: &'static [RecommendationCategory],
}

impl std::fmt::Debug for RecommendationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationRule")
            .field("id", &self.id)
            .field("priority_weight", &self.priority_weight)
            .field("categories", &self.categories)
            .finish()
    }
}

impl RecommendationRule {
    /// Check whether the rule applies to an insight
    pub fn matches(&self, insight: &PerformanceInsight) -> bool {
        (self.condition)(insight)
    }

    /// Build the recommendation content for a matching insight
    pub fn build(&self, insight: &PerformanceInsight) -> RecommendationDraft {
        (self.recommendation)(insight)
    }

    /// Whether the rule targets a category
    pub fn targets(&self, category: RecommendationCategory) -> bool {
        self.categories.contains(&category)
    }
}

fn is(insight: &PerformanceInsight, kind: InsightType, metric: MetricType) -> bool {
    insight.insight_type == kind && insight.metric_type == Some(metric)
}

fn is_fps_trend(i: &PerformanceInsight) -> bool {
    is(i, InsightType::Trend, MetricType::Fps)
}

fn is_low_fps(i: &PerformanceInsight) -> bool {
    is(i, InsightType::Threshold, MetricType::Fps)
}

fn is_memory_trend(i: &PerformanceInsight) -> bool {
    is(i, InsightType::Trend, MetricType::MemoryUsage)
}

fn is_memory_spike(i: &PerformanceInsight) -> bool {
    is(i, InsightType::Anomaly, MetricType::MemoryUsage)
        && i.data_context["spikes"].as_u64().unwrap_or(0) > 0
}

fn is_cpu_pressure(i: &PerformanceInsight) -> bool {
    is(i, InsightType::Threshold, MetricType::CpuUsage) || is(i, InsightType::Trend, MetricType::CpuUsage)
}

fn is_slow_loading(i: &PerformanceInsight) -> bool {
    is(i, InsightType::Threshold, MetricType::LoadTime) || is(i, InsightType::Trend, MetricType::LoadTime)
}

fn is_fps_anomaly(i: &PerformanceInsight) -> bool {
    is(i, InsightType::Anomaly, MetricType::Fps)
}

fn is_harmful_cycle(i: &PerformanceInsight) -> bool {
    i.insight_type == InsightType::Seasonal && i.severity >= Severity::Medium
}

fn is_correlation(i: &PerformanceInsight) -> bool {
    i.insight_type == InsightType::Correlation
}

fn is_severe(i: &PerformanceInsight) -> bool {
    i.severity.is_urgent()
}

fn steps(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn fps_degradation(insight: &PerformanceInsight) -> RecommendationDraft {
    RecommendationDraft {
        title: "Address declining frame rate".to_string(),
        description: format!(
            "{}. Profile recent rendering changes before the decline becomes user visible.",
            insight.description
        ),
        category: RecommendationCategory::Rendering,
        impact: Impact::High,
        effort: Effort::Medium,
        actionable_steps: steps(&[
            "Compare frame timings between the current and previous release",
            "Profile the slowest screens for excessive re-renders",
            "Move heavy work off the UI thread",
        ]),
    }
}

fn low_fps(insight: &PerformanceInsight) -> RecommendationDraft {
    RecommendationDraft {
        title: "Optimize rendering pipeline".to_string(),
        description: format!(
            "{}. Sustained low frame rates make the app feel sluggish.",
            insight.description
        ),
        category: RecommendationCategory::Rendering,
        impact: Impact::High,
        effort: Effort::Medium,
        actionable_steps: steps(&[
            "Virtualize long lists",
            "Memoize expensive components",
            "Reduce overdraw and nested layouts",
        ]),
    }
}

fn memory_growth(insight: &PerformanceInsight) -> RecommendationDraft {
    RecommendationDraft {
        title: "Investigate memory leak".to_string(),
        description: format!(
            "{}. Steady growth usually points to retained references.",
            insight.description
        ),
        category: RecommendationCategory::Memory,
        impact: Impact::High,
        effort: Effort::High,
        actionable_steps: steps(&[
            "Capture heap snapshots at the start and end of a session",
            "Check listeners and timers are released on unmount",
            "Bound in-memory caches",
        ]),
    }
}

fn memory_spike(insight: &PerformanceInsight) -> RecommendationDraft {
    RecommendationDraft {
        title: "Reduce memory spikes".to_string(),
        description: format!(
            "{}. Short-lived allocation bursts risk out-of-memory terminations.",
            insight.description
        ),
        category: RecommendationCategory::Memory,
        impact: Impact::Medium,
        effort: Effort::Medium,
        actionable_steps: steps(&[
            "Downsample large images before decoding",
            "Stream large payloads instead of buffering them",
        ]),
    }
}

fn high_cpu(insight: &PerformanceInsight) -> RecommendationDraft {
    RecommendationDraft {
        title: "Reduce CPU load".to_string(),
        description: format!(
            "{}. High CPU drains battery and causes thermal throttling.",
            insight.description
        ),
        category: RecommendationCategory::Cpu,
        impact: Impact::High,
        effort: Effort::Medium,
        actionable_steps: steps(&[
            "Debounce high-frequency event handlers",
            "Batch background work",
            "Cache results of repeated computations",
        ]),
    }
}

fn slow_loading(insight: &PerformanceInsight) -> RecommendationDraft {
    RecommendationDraft {
        title: "Speed up screen load time".to_string(),
        description: format!("{}. Slow loads increase abandonment.", insight.description),
        category: RecommendationCategory::Loading,
        impact: Impact::High,
        effort: Effort::Medium,
        actionable_steps: steps(&[
            "Lazy-load non-critical modules",
            "Prefetch data for likely next screens",
            "Show skeleton content while loading",
        ]),
    }
}

fn fps_anomaly(insight: &PerformanceInsight) -> RecommendationDraft {
    RecommendationDraft {
        title: "Eliminate frame drops".to_string(),
        description: format!(
            "{}. Isolated drops usually come from blocking work on the UI thread.",
            insight.description
        ),
        category: RecommendationCategory::Rendering,
        impact: Impact::Medium,
        effort: Effort::Medium,
        actionable_steps: steps(&[
            "Correlate drop timestamps with navigation and network events",
            "Defer non-urgent work with idle callbacks",
        ]),
    }
}

fn seasonal_peak(insight: &PerformanceInsight) -> RecommendationDraft {
    let metric = insight
        .metric_type
        .map(|m| m.label())
        .unwrap_or("performance");
    RecommendationDraft {
        title: format!("Prepare for recurring {} peaks", metric),
        description: format!(
            "{}. Schedule heavy background work away from the worst periods.",
            insight.description
        ),
        category: insight.category,
        impact: Impact::Medium,
        effort: Effort::Low,
        actionable_steps: steps(&[
            "Move background sync out of peak periods",
            "Pre-warm caches before the recurring peak",
        ]),
    }
}

fn linked_metrics(insight: &PerformanceInsight) -> RecommendationDraft {
    RecommendationDraft {
        title: format!("Investigate linked metrics: {}", insight.title),
        description: format!(
            "{}. Fixing the driving metric may improve both.",
            insight.description
        ),
        category: RecommendationCategory::General,
        impact: Impact::Medium,
        effort: Effort::High,
        actionable_steps: steps(&[
            "Check which metric changes first in affected sessions",
            "Target the leading metric with a focused fix",
        ]),
    }
}

fn resolve_insight(insight: &PerformanceInsight) -> RecommendationDraft {
    RecommendationDraft {
        title: format!("Resolve: {}", insight.title),
        description: insight.description.clone(),
        category: insight.category,
        impact: insight.impact,
        effort: insight.effort,
        actionable_steps: steps(&[
            "Reproduce the issue on an affected device",
            "Verify the fix against the same metric after release",
        ]),
    }
}

/// Built-in rule table, evaluated in order
pub static DEFAULT_RULES: [RecommendationRule; 10] = [
    RecommendationRule {
        id: "fps_degradation_trend",
        condition: is_fps_trend,
        recommendation: fps_degradation,
        priority_weight: 1.2,
        categories: &[RecommendationCategory::Rendering],
    },
    RecommendationRule {
        id: "low_fps_threshold",
        condition: is_low_fps,
        recommendation: low_fps,
        priority_weight: 1.3,
        categories: &[RecommendationCategory::Rendering],
    },
    RecommendationRule {
        id: "memory_growth_trend",
        condition: is_memory_trend,
        recommendation: memory_growth,
        priority_weight: 1.2,
        categories: &[RecommendationCategory::Memory],
    },
    RecommendationRule {
        id: "memory_spike_anomaly",
        condition: is_memory_spike,
        recommendation: memory_spike,
        priority_weight: 1.0,
        categories: &[RecommendationCategory::Memory],
    },
    RecommendationRule {
        id: "high_cpu_usage",
        condition: is_cpu_pressure,
        recommendation: high_cpu,
        priority_weight: 1.1,
        categories: &[RecommendationCategory::Cpu],
    },
    RecommendationRule {
        id: "load_time_regression",
        condition: is_slow_loading,
        recommendation: slow_loading,
        priority_weight: 1.1,
        categories: &[RecommendationCategory::Loading],
    },
    RecommendationRule {
        id: "fps_anomaly",
        condition: is_fps_anomaly,
        recommendation: fps_anomaly,
        priority_weight: 1.0,
        categories: &[RecommendationCategory::Rendering],
    },
    RecommendationRule {
        id: "seasonal_peak",
        condition: is_harmful_cycle,
        recommendation: seasonal_peak,
        priority_weight: 0.9,
        categories: &[
            RecommendationCategory::Rendering,
            RecommendationCategory::Memory,
            RecommendationCategory::Cpu,
            RecommendationCategory::Loading,
        ],
    },
    RecommendationRule {
        id: "strong_correlation",
        condition: is_correlation,
        recommendation: linked_metrics,
        priority_weight: 0.8,
        categories: &[RecommendationCategory::General],
    },
    RecommendationRule {
        id: "high_severity_fallback",
        condition: is_severe,
        recommendation: resolve_insight,
        priority_weight: 1.0,
        categories: &[],
    },
];

/// Short readable name of a metric for titles
pub(crate) fn metric_title(metric: MetricType) -> String {
    capitalize(metric.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::types::{Confidence, InsightCategory};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn insight(kind: InsightType, metric: Option<MetricType>, severity: Severity) -> PerformanceInsight {
        PerformanceInsight {
            id: "i-1".to_string(),
            insight_type: kind,
            category: metric.map(|m| m.category()).unwrap_or(InsightCategory::General),
            metric_type: metric,
            severity,
            confidence: Confidence::new(0.9),
            title: "FPS declining".to_string(),
            description: "FPS has been declining".to_string(),
            impact: Impact::High,
            effort: Effort::Medium,
            data_context: json!({ "spikes": 2 }),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn matching(insight: &PerformanceInsight) -> Vec<&'static str> {
        DEFAULT_RULES
            .iter()
            .filter(|r| r.matches(insight))
            .map(|r| r.id)
            .collect()
    }

    #[test]
    fn test_rule_ids_are_unique() {
        let mut ids: Vec<_> = DEFAULT_RULES.iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), DEFAULT_RULES.len());
    }

    #[test]
    fn test_fps_trend_rules() {
        let fps = insight(InsightType::Trend, Some(MetricType::Fps), Severity::Medium);
        assert_eq!(matching(&fps), vec!["fps_degradation_trend"]);

        let severe = insight(InsightType::Trend, Some(MetricType::Fps), Severity::Critical);
        assert_eq!(
            matching(&severe),
            vec!["fps_degradation_trend", "high_severity_fallback"]
        );
    }

    #[test]
    fn test_memory_spike_requires_spikes() {
        let mut memory = insight(InsightType::Anomaly, Some(MetricType::MemoryUsage), Severity::Low);
        assert_eq!(matching(&memory), vec!["memory_spike_anomaly"]);
        memory.data_context = json!({ "spikes": 0, "drops": 3 });
        assert!(matching(&memory).is_empty());
    }

    #[test]
    fn test_fallback_keeps_insight_impact_and_effort() {
        let mut generic = insight(InsightType::Anomaly, None, Severity::High);
        generic.impact = Impact::Low;
        generic.effort = Effort::High;
        let rule = DEFAULT_RULES
            .iter()
            .find(|r| r.id == "high_severity_fallback")
            .unwrap();
        let draft = rule.build(&generic);
        assert_eq!(draft.impact, Impact::Low);
        assert_eq!(draft.effort, Effort::High);
        assert_eq!(draft.title, "Resolve: FPS declining");
    }

    #[test]
    fn test_seasonal_rule_titles_name_the_metric() {
        let seasonal = insight(InsightType::Seasonal, Some(MetricType::CpuUsage), Severity::Medium);
        let rule = DEFAULT_RULES.iter().find(|r| r.id == "seasonal_peak").unwrap();
        assert!(rule.matches(&seasonal));
        assert_eq!(rule.build(&seasonal).title, "Prepare for recurring CPU usage peaks");
        assert!(rule.targets(RecommendationCategory::Cpu));
        assert_eq!(metric_title(MetricType::LoadTime), "Load time");
    }
}
