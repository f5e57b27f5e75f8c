//! Recommendation engine
//!
//! Runs the rule table over insights, merges route and opportunity candidates, then
//! filters, deduplicates, ranks and truncates. The engine holds no mutable state: the
//! rule table and configuration are fixed at construction and every call is a function of
//! its inputs plus the injected id generator and clock.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::analyzer::traits::{Clock, IdGenerator};
use crate::analyzer::types::{
    EarlyWarningAlert, PerformanceForecast, PerformanceInsight, SeasonalPattern,
};
use crate::config::RecommendationConfig;

use super::proactive::{
    forecast_candidates, seasonal_candidates, warning_candidates, ProactiveCandidate,
};
use super::route::{opportunity_candidates, route_candidates};
use super::rules::{RecommendationRule, DEFAULT_RULES};
use super::scoring::score_rule_match;
use super::types::{
    OptimizationOpportunity, PerformanceRecommendation, PerformanceSummary,
    ProactiveRecommendation, RecommendationCategory, RecommendationDraft, RecommendationSource,
    RecommendationStatus, RoutePerformanceAnalysis,
};

/// A scored recommendation before ids and timestamps are assigned
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub draft: RecommendationDraft,
    pub priority_score: f64,
    pub insight_id: Option<String>,
    pub rule_id: Option<String>,
    pub route: Option<String>,
    pub source: RecommendationSource,
}

/// Outcome of one standard recommendation run
#[derive(Debug, Clone, Default)]
pub struct RecommendationBatch {
    pub recommendations: Vec<PerformanceRecommendation>,
    /// Candidates considered across all pipelines
    pub candidates: usize,
    /// Candidates dropped for scoring below the minimum
    pub discarded: usize,
}

fn by_score_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Rule-driven recommendation engine
pub struct RecommendationEngine {
    config: RecommendationConfig,
    rules: Vec<RecommendationRule>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl RecommendationEngine {
    /// Create an engine over an explicit rule table
    pub fn new(
        config: RecommendationConfig,
        rules: Vec<RecommendationRule>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            rules,
            ids,
            clock,
        }
    }

    /// Create an engine over the built-in rule table
    pub fn with_default_rules(
        config: RecommendationConfig,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(config, DEFAULT_RULES.to_vec(), ids, clock)
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    pub fn rules(&self) -> &[RecommendationRule] {
        &self.rules
    }

    /// Candidates from matching every rule against every insight
    fn rule_candidates(
        &self,
        insights: &[PerformanceInsight],
        context: &PerformanceSummary,
    ) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for insight in insights {
            for rule in self.rules.iter().filter(|r| r.matches(insight)) {
                let draft = rule.build(insight);
                let score = score_rule_match(rule, insight, &draft, context, &self.config);
                trace!(
                    insight = %insight.id,
                    rule = rule.id,
                    score,
                    "Rule matched"
                );
                candidates.push(Candidate {
                    draft,
                    priority_score: score,
                    insight_id: Some(insight.id.clone()),
                    rule_id: Some(rule.id.to_string()),
                    route: None,
                    source: RecommendationSource::Rule,
                });
            }
        }
        candidates
    }

    /// Full standard run with counters
    pub fn generate_batch(
        &self,
        insights: &[PerformanceInsight],
        context: &PerformanceSummary,
        opportunities: Option<&[OptimizationOpportunity]>,
        routes: Option<&[RoutePerformanceAnalysis]>,
    ) -> RecommendationBatch {
        let mut candidates = self.rule_candidates(insights, context);
        if let Some(routes) = routes {
            candidates.extend(route_candidates(routes, &self.config));
        }
        if let Some(opportunities) = opportunities {
            candidates.extend(opportunity_candidates(opportunities));
        }
        let total = candidates.len();

        candidates.retain(|c| c.priority_score.is_finite() && c.priority_score >= self.config.min_priority_score);
        let discarded = total - candidates.len();

        let mut seen: HashSet<(RecommendationCategory, String)> = HashSet::new();
        candidates.retain(|c| seen.insert((c.draft.category, c.draft.title.clone())));

        // Stable sort keeps pipeline order among equal scores
        candidates.sort_by(|a, b| by_score_desc(a.priority_score, b.priority_score));
        candidates.truncate(self.config.max_recommendations);

        let created_at = self.clock.now();
        let recommendations: Vec<PerformanceRecommendation> = candidates
            .into_iter()
            .map(|c| PerformanceRecommendation {
                id: self.ids.next_id(),
                insight_id: c.insight_id,
                rule_id: c.rule_id,
                route: c.route,
                title: c.draft.title,
                description: c.draft.description,
                category: c.draft.category,
                impact: c.draft.impact,
                effort: c.draft.effort,
                priority_score: c.priority_score,
                actionable_steps: c.draft.actionable_steps,
                status: RecommendationStatus::Pending,
                source: c.source,
                created_at,
            })
            .collect();

        debug!(
            insights = insights.len(),
            candidates = total,
            discarded,
            returned = recommendations.len(),
            "Recommendations generated"
        );

        RecommendationBatch {
            recommendations,
            candidates: total,
            discarded,
        }
    }

    /// Ranked standard recommendations, at most `max_recommendations`
    pub fn generate_recommendations(
        &self,
        insights: &[PerformanceInsight],
        context: &PerformanceSummary,
        opportunities: Option<&[OptimizationOpportunity]>,
        routes: Option<&[RoutePerformanceAnalysis]>,
    ) -> Vec<PerformanceRecommendation> {
        self.generate_batch(insights, context, opportunities, routes)
            .recommendations
    }

    /// Ranked proactive recommendations, at most `max_proactive`
    ///
    /// Ordered by prevention priority first, then by score.
    pub fn generate_proactive_recommendations(
        &self,
        forecasts: &[PerformanceForecast],
        patterns: &[SeasonalPattern],
        warnings: &[EarlyWarningAlert],
    ) -> Vec<ProactiveRecommendation> {
        let mut candidates: Vec<ProactiveCandidate> = warning_candidates(warnings);
        candidates.extend(forecast_candidates(forecasts));
        candidates.extend(seasonal_candidates(patterns));

        let mut seen: HashSet<(RecommendationCategory, String)> = HashSet::new();
        candidates.retain(|c| seen.insert((c.category, c.title.clone())));

        candidates.sort_by(|a, b| {
            b.prevention_priority
                .cmp(&a.prevention_priority)
                .then_with(|| by_score_desc(a.priority_score, b.priority_score))
        });
        candidates.truncate(self.config.max_proactive);

        let created_at = self.clock.now();
        let proactive: Vec<ProactiveRecommendation> = candidates
            .into_iter()
            .map(|c| ProactiveRecommendation {
                id: self.ids.next_id(),
                title: c.title,
                description: c.description,
                category: c.category,
                trigger: c.trigger,
                metric_type: c.metric_type,
                prevention_priority: c.prevention_priority,
                priority_score: c.priority_score,
                confidence: c.confidence,
                steps_to_impact: c.steps_to_impact,
                actionable_steps: c.actionable_steps,
                created_at,
            })
            .collect();

        debug!(
            forecasts = forecasts.len(),
            patterns = patterns.len(),
            warnings = warnings.len(),
            returned = proactive.len(),
            "Proactive recommendations generated"
        );
        proactive
    }
}
