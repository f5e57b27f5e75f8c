//! Route and opportunity pipelines
//!
//! Routes at risk produce targeted recommendations for the specific problem the route
//! shows (low FPS, high memory, high CPU). Optimization opportunities are converted as-is
//! and scored by their expected improvement.

use tracing::trace;

use crate::analyzer::types::{Effort, Impact, MetricType};
use crate::config::RecommendationConfig;

use super::engine::Candidate;
use super::rules::metric_title;
use super::scoring::{opportunity_score, route_base_score};
use super::types::{
    OptimizationOpportunity, RecommendationCategory, RecommendationDraft, RecommendationSource,
    RiskLevel, RoutePerformanceAnalysis,
};

const FPS_ISSUE_WEIGHT: f64 = 1.0;
const MEMORY_ISSUE_WEIGHT: f64 = 0.9;
const CPU_ISSUE_WEIGHT: f64 = 0.85;
const GENERAL_ISSUE_WEIGHT: f64 = 0.6;
const INFERRED_CPU_DISCOUNT: f64 = 0.8;

/// Whether a route deserves recommendations at all
pub fn is_route_at_risk(route: &RoutePerformanceAnalysis, config: &RecommendationConfig) -> bool {
    route.risk_level >= RiskLevel::Medium || route.performance_score < config.route_score_threshold
}

fn route_candidate(
    route: &RoutePerformanceAnalysis,
    draft: RecommendationDraft,
    score: f64,
) -> Candidate {
    Candidate {
        draft,
        priority_score: score,
        insight_id: None,
        rule_id: None,
        route: Some(route.route_path.clone()),
        source: RecommendationSource::Route,
    }
}

/// Candidates for every at-risk route
pub fn route_candidates(
    routes: &[RoutePerformanceAnalysis],
    config: &RecommendationConfig,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for route in routes.iter().filter(|r| is_route_at_risk(r, config)) {
        let base = route_base_score(route);
        let sessions = route.sessions.len();
        let devices = route.device_count();
        let mut specific = false;

        if route.avg_fps > 0.0 && route.avg_fps < config.critical_fps {
            specific = true;
            candidates.push(route_candidate(
                route,
                RecommendationDraft {
                    title: format!("Optimize rendering on {}", route.route_name),
                    description: format!(
                        "{} averages {:.1} fps across {} sessions on {} devices",
                        route.route_path, route.avg_fps, sessions, devices
                    ),
                    category: RecommendationCategory::Rendering,
                    impact: Impact::High,
                    effort: Effort::Medium,
                    actionable_steps: vec![
                        format!("Profile {} on the slowest device model", route.route_path),
                        "Reduce work done during the first render".to_string(),
                    ],
                },
                base * FPS_ISSUE_WEIGHT,
            ));
        }

        if route.avg_memory > config.high_memory_mb {
            specific = true;
            candidates.push(route_candidate(
                route,
                RecommendationDraft {
                    title: format!("Reduce memory usage on {}", route.route_name),
                    description: format!(
                        "{} averages {:.0} MB of {}",
                        route.route_path,
                        route.avg_memory,
                        MetricType::MemoryUsage.label()
                    ),
                    category: RecommendationCategory::Memory,
                    impact: Impact::High,
                    effort: Effort::Medium,
                    actionable_steps: vec![
                        format!("Take a heap snapshot while {} is open", route.route_path),
                        "Release large buffers when leaving the screen".to_string(),
                    ],
                },
                base * MEMORY_ISSUE_WEIGHT,
            ));
        }

        if route.avg_cpu.value > config.high_cpu_pct {
            specific = true;
            let discount = if route.avg_cpu.is_inferred() {
                INFERRED_CPU_DISCOUNT
            } else {
                1.0
            };
            let provenance = if route.avg_cpu.is_inferred() {
                "estimated"
            } else {
                "measured"
            };
            candidates.push(route_candidate(
                route,
                RecommendationDraft {
                    title: format!("Reduce CPU usage on {}", route.route_name),
                    description: format!(
                        "{} {} is {:.0}% on {}",
                        metric_title(MetricType::CpuUsage),
                        provenance,
                        route.avg_cpu.value,
                        route.route_path
                    ),
                    category: RecommendationCategory::Cpu,
                    impact: Impact::Medium,
                    effort: Effort::Medium,
                    actionable_steps: vec![
                        "Throttle timers and animations while idle".to_string(),
                        "Move parsing work to a background thread".to_string(),
                    ],
                },
                base * CPU_ISSUE_WEIGHT * discount,
            ));
        }

        if !specific {
            candidates.push(route_candidate(
                route,
                RecommendationDraft {
                    title: format!("Review performance of {}", route.route_name),
                    description: format!(
                        "{} scores {:.0}/100 with {:?} risk",
                        route.route_path, route.performance_score, route.risk_level
                    ),
                    category: RecommendationCategory::General,
                    impact: Impact::Medium,
                    effort: Effort::Medium,
                    actionable_steps: vec![format!(
                        "Audit recent changes affecting {}",
                        route.route_path
                    )],
                },
                base * GENERAL_ISSUE_WEIGHT,
            ));
        }

        trace!(
            route = %route.route_path,
            base_score = base,
            risk = ?route.risk_level,
            "Route analyzed"
        );
    }

    candidates
}

fn impact_from_improvement(pct: f64) -> Impact {
    if pct >= 30.0 {
        Impact::High
    } else if pct >= 15.0 {
        Impact::Medium
    } else {
        Impact::Low
    }
}

/// Candidates for externally identified optimization opportunities
pub fn opportunity_candidates(opportunities: &[OptimizationOpportunity]) -> Vec<Candidate> {
    opportunities
        .iter()
        .map(|opportunity| Candidate {
            draft: RecommendationDraft {
                title: opportunity.title.clone(),
                description: format!(
                    "{} (up to {:.0}% improvement)",
                    opportunity.description, opportunity.potential_improvement_pct
                ),
                category: opportunity.category,
                impact: impact_from_improvement(opportunity.potential_improvement_pct),
                effort: opportunity.effort,
                actionable_steps: opportunity
                    .affected_routes
                    .iter()
                    .map(|route| format!("Apply to {}", route))
                    .collect(),
            },
            priority_score: opportunity_score(opportunity),
            insight_id: None,
            rule_id: None,
            route: opportunity.affected_routes.first().cloned(),
            source: RecommendationSource::Opportunity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::types::{CpuReading, RouteSessionSummary};

    fn route(score: f64, risk: RiskLevel, fps: f64, memory: f64, cpu: CpuReading) -> RoutePerformanceAnalysis {
        RoutePerformanceAnalysis {
            route_name: "Checkout".to_string(),
            route_path: "/checkout".to_string(),
            sessions: (0..20)
                .map(|i| RouteSessionSummary {
                    session_id: format!("s{}", i),
                    device_model: format!("device-{}", i % 5),
                    avg_fps: fps,
                    avg_memory: memory,
                })
                .collect(),
            avg_fps: fps,
            avg_memory: memory,
            avg_cpu: cpu,
            performance_score: score,
            risk_level: risk,
        }
    }

    #[test]
    fn test_healthy_route_is_skipped() {
        let config = RecommendationConfig::default();
        let healthy = route(90.0, RiskLevel::Low, 58.0, 200.0, CpuReading::measured(30.0));
        assert!(!is_route_at_risk(&healthy, &config));
        assert!(route_candidates(&[healthy], &config).is_empty());
    }

    #[test]
    fn test_struggling_route_gets_targeted_recommendations() {
        let config = RecommendationConfig::default();
        let slow = route(35.0, RiskLevel::Critical, 21.0, 480.0, CpuReading::measured(85.0));
        let candidates = route_candidates(&[slow], &config);

        let categories: Vec<_> = candidates.iter().map(|c| c.draft.category).collect();
        assert_eq!(
            categories,
            vec![
                RecommendationCategory::Rendering,
                RecommendationCategory::Memory,
                RecommendationCategory::Cpu
            ]
        );
        assert!(candidates.iter().all(|c| c.route.as_deref() == Some("/checkout")));
        assert!(candidates[0].priority_score > candidates[1].priority_score);
    }

    #[test]
    fn test_inferred_cpu_is_discounted() {
        let config = RecommendationConfig::default();
        let measured = route_candidates(
            &[route(50.0, RiskLevel::High, 45.0, 200.0, CpuReading::measured(90.0))],
            &config,
        );
        let inferred = route_candidates(
            &[route(50.0, RiskLevel::High, 45.0, 200.0, CpuReading::inferred(90.0))],
            &config,
        );
        assert_eq!(measured.len(), 1);
        assert!((inferred[0].priority_score - measured[0].priority_score * 0.8).abs() < 1e-9);
        assert!(inferred[0].draft.description.contains("estimated"));
    }

    #[test]
    fn test_at_risk_route_without_specific_issue() {
        let config = RecommendationConfig::default();
        let candidates = route_candidates(
            &[route(60.0, RiskLevel::Medium, 50.0, 250.0, CpuReading::measured(40.0))],
            &config,
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].draft.category, RecommendationCategory::General);
    }

    #[test]
    fn test_opportunity_conversion() {
        let opportunity = OptimizationOpportunity {
            id: "op-7".to_string(),
            title: "Enable image caching".to_string(),
            description: "Cache decoded thumbnails".to_string(),
            category: RecommendationCategory::Loading,
            potential_improvement_pct: 40.0,
            affected_routes: vec!["/gallery".to_string()],
            affected_sessions: 500,
            effort: Effort::Low,
            confidence: 0.9,
        };
        let candidates = opportunity_candidates(&[opportunity]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].draft.impact, Impact::High);
        assert_eq!(candidates[0].source, RecommendationSource::Opportunity);
        assert_eq!(candidates[0].route.as_deref(), Some("/gallery"));
    }
}
