//! Priority scoring
//!
//! Rule matches score `(impact·0.4 + effort·0.3 + severity·0.3) · confidence · weight ·
//! context`, with effort inverted so cheaper work ranks higher. Impact and effort are the
//! midpoint of the insight's own tags and the rule's estimate for its fix. Routes and
//! opportunities use their own formulas.

use crate::analyzer::types::{Effort, PerformanceInsight, Severity};
use crate::config::RecommendationConfig;

use super::rules::RecommendationRule;
use super::types::{
    OptimizationOpportunity, PerformanceSummary, RecommendationCategory, RecommendationDraft,
    RoutePerformanceAnalysis,
};

const IMPACT_WEIGHT: f64 = 0.4;
const EFFORT_WEIGHT: f64 = 0.3;
const SEVERITY_WEIGHT: f64 = 0.3;

/// Weighted blend of impact, inverted effort and severity
fn weighted(impact: f64, effort: f64, severity: Severity) -> f64 {
    impact * IMPACT_WEIGHT + effort * EFFORT_WEIGHT + severity.weight() * SEVERITY_WEIGHT
}

/// Base priority of a rule's draft built for an insight
pub fn blended_priority(insight: &PerformanceInsight, draft: &RecommendationDraft) -> f64 {
    let impact = (insight.impact.weight() + draft.impact.weight()) / 2.0;
    let effort = (insight.effort.weight() + draft.effort.weight()) / 2.0;
    weighted(impact, effort, insight.severity)
}

/// Boost for rules targeting an area the global summary shows is already struggling
pub fn context_multiplier(
    rule: &RecommendationRule,
    category: RecommendationCategory,
    context: &PerformanceSummary,
    config: &RecommendationConfig,
) -> f64 {
    let targets = |c: RecommendationCategory| rule.targets(c) || category == c;
    let mut multiplier = 1.0;

    if targets(RecommendationCategory::Rendering) && context.avg_fps > 0.0 && context.avg_fps < config.critical_fps {
        multiplier *= 1.5;
    }
    if targets(RecommendationCategory::Memory) && context.avg_memory > config.high_memory_mb {
        multiplier *= 1.3;
    }
    if targets(RecommendationCategory::Cpu) && context.avg_cpu > config.high_cpu_pct {
        multiplier *= 1.2;
    }
    if context.device_count >= config.broad_device_count as u64 {
        multiplier *= 1.1;
    }
    multiplier
}

/// Final score of one rule applied to one insight
pub fn score_rule_match(
    rule: &RecommendationRule,
    insight: &PerformanceInsight,
    draft: &RecommendationDraft,
    context: &PerformanceSummary,
    config: &RecommendationConfig,
) -> f64 {
    blended_priority(insight, draft)
        * insight.confidence.value()
        * rule.priority_weight
        * context_multiplier(rule, draft.category, context, config)
}

/// Breadth of a route's audience: 1.0 for a single session up to 1.75
pub fn route_reach(route: &RoutePerformanceAnalysis) -> f64 {
    let sessions = route.sessions.len().min(100) as f64 / 100.0;
    let devices = route.device_count().min(10) as f64 / 10.0;
    1.0 + sessions * 0.5 + devices * 0.25
}

/// Base score of a route before per-issue weighting
pub fn route_base_score(route: &RoutePerformanceAnalysis) -> f64 {
    let severity = ((100.0 - route.performance_score.clamp(0.0, 100.0)) / 20.0).max(0.0);
    severity * route.risk_level.multiplier() * route_reach(route)
}

fn effort_factor(effort: Effort) -> f64 {
    match effort {
        Effort::Low => 1.5,
        Effort::Medium => 1.0,
        Effort::High => 0.6,
    }
}

/// Score of an optimization opportunity
pub fn opportunity_score(opportunity: &OptimizationOpportunity) -> f64 {
    let reach = 1.0
        + (opportunity.affected_sessions.min(1000) as f64 / 1000.0) * 0.5
        + opportunity.affected_routes.len().min(5) as f64 * 0.05;
    (opportunity.potential_improvement_pct.max(0.0) / 10.0)
        * effort_factor(opportunity.effort)
        * opportunity.confidence.clamp(0.0, 1.0)
        * reach
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::types::{Confidence, Impact, InsightCategory, InsightType, MetricType};
    use crate::recommendation::rules::DEFAULT_RULES;
    use chrono::{TimeZone, Utc};
    use crate::recommendation::types::{CpuReading, RiskLevel, RouteSessionSummary};

    fn rule(id: &str) -> &'static RecommendationRule {
        DEFAULT_RULES.iter().find(|r| r.id == id).unwrap()
    }

    #[test]
    fn test_effort_is_inverted() {
        let cheap = weighted(Impact::High.weight(), Effort::Low.weight(), Severity::High);
        let costly = weighted(Impact::Low.weight(), Effort::High.weight(), Severity::High);
        assert!(cheap > costly);
        assert!((cheap - 3.0).abs() < 1e-9);
        assert!((costly - 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_insight_tags_shift_rule_scores() {
        let config = RecommendationConfig::default();
        let cpu = rule("high_cpu_usage");
        let tagged = |impact: Impact, effort: Effort| PerformanceInsight {
            id: "cpu".to_string(),
            insight_type: InsightType::Threshold,
            category: InsightCategory::Cpu,
            metric_type: Some(MetricType::CpuUsage),
            severity: Severity::Medium,
            confidence: Confidence::new(0.9),
            title: "High CPU".to_string(),
            description: "CPU above 80%".to_string(),
            impact,
            effort,
            data_context: serde_json::Value::Null,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        };
        let score = |insight: &PerformanceInsight| {
            let draft = cpu.build(insight);
            score_rule_match(cpu, insight, &draft, &PerformanceSummary::default(), &config)
        };

        let quick_win = score(&tagged(Impact::High, Effort::Low));
        let long_haul = score(&tagged(Impact::Low, Effort::High));
        // Rule draft is High impact, Medium effort
        assert!((quick_win - (3.0 * 0.4 + 2.5 * 0.3 + 2.0 * 0.3) * 0.9 * 1.1).abs() < 1e-9);
        assert!((long_haul - (2.0 * 0.4 + 1.5 * 0.3 + 2.0 * 0.3) * 0.9 * 1.1).abs() < 1e-9);
        assert!(quick_win > long_haul);
    }

    #[test]
    fn test_context_boosts_rendering_when_fps_is_critical() {
        let config = RecommendationConfig::default();
        let context = PerformanceSummary {
            avg_fps: 24.0,
            ..Default::default()
        };
        let rendering = rule("low_fps_threshold");
        let memory = rule("memory_growth_trend");
        assert!((context_multiplier(rendering, RecommendationCategory::Rendering, &context, &config) - 1.5).abs() < 1e-9);
        assert!((context_multiplier(memory, RecommendationCategory::Memory, &context, &config) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_context_multipliers_stack() {
        let config = RecommendationConfig::default();
        let context = PerformanceSummary {
            avg_fps: 55.0,
            avg_memory: 450.0,
            avg_cpu: 85.0,
            device_count: 12,
            ..Default::default()
        };
        let memory = rule("memory_growth_trend");
        let m = context_multiplier(memory, RecommendationCategory::Memory, &context, &config);
        assert!((m - 1.3 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_route_base_score() {
        let route = RoutePerformanceAnalysis {
            route_name: "Feed".to_string(),
            route_path: "/feed".to_string(),
            sessions: vec![RouteSessionSummary {
                session_id: "s1".to_string(),
                device_model: "Pixel 8".to_string(),
                avg_fps: 22.0,
                avg_memory: 300.0,
            }],
            avg_fps: 22.0,
            avg_memory: 300.0,
            avg_cpu: CpuReading::measured(50.0),
            performance_score: 40.0,
            risk_level: RiskLevel::High,
        };
        // (100 - 40) / 20 = 3, times 1.25 risk, times reach 1.0 + 0.005 + 0.025
        assert!((route_base_score(&route) - 3.0 * 1.25 * 1.03).abs() < 1e-9);
    }

    #[test]
    fn test_opportunity_score() {
        let opportunity = OptimizationOpportunity {
            id: "op-1".to_string(),
            title: "Compress images".to_string(),
            description: "Serve WebP".to_string(),
            category: RecommendationCategory::Loading,
            potential_improvement_pct: 30.0,
            affected_routes: vec!["/feed".to_string()],
            affected_sessions: 0,
            effort: Effort::Low,
            confidence: 0.8,
        };
        assert!((opportunity_score(&opportunity) - 3.0 * 1.5 * 0.8 * 1.05).abs() < 1e-9);
    }
}
