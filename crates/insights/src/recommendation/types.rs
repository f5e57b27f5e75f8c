//! Recommendation types
//!
//! Inputs (global summary, route aggregates, optimization opportunities) and outputs
//! (ranked standard and proactive recommendations) of the recommendation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::analyzer::types::{Effort, Impact, MetricType};

pub use crate::analyzer::types::InsightCategory as RecommendationCategory;

/// Lifecycle of a recommendation once handed to a consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    Pending,
    InProgress,
    Completed,
    Dismissed,
}

impl RecommendationStatus {
    /// Check whether moving to `next` is allowed
    pub fn can_transition_to(&self, next: RecommendationStatus) -> bool {
        use RecommendationStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Pending, InProgress | Completed | Dismissed) | (InProgress, Completed | Dismissed)
        )
    }

    /// Completed and dismissed recommendations accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecommendationStatus::Completed | RecommendationStatus::Dismissed)
    }
}

/// Pipeline that produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    Rule,
    Route,
    Opportunity,
}

impl RecommendationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationSource::Rule => "rule",
            RecommendationSource::Route => "route",
            RecommendationSource::Opportunity => "opportunity",
        }
    }
}

/// Content a rule builds before scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationDraft {
    pub title: String,
    pub description: String,
    pub category: RecommendationCategory,
    pub impact: Impact,
    pub effort: Effort,
    pub actionable_steps: Vec<String>,
}

/// A ranked, actionable recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecommendation {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    pub title: String,
    pub description: String,
    pub category: RecommendationCategory,
    pub impact: Impact,
    pub effort: Effort,
    pub priority_score: f64,
    pub actionable_steps: Vec<String>,
    pub status: RecommendationStatus,
    pub source: RecommendationSource,
    pub created_at: DateTime<Utc>,
}

/// Global averages used as scoring context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSummary {
    pub avg_fps: f64,
    pub avg_memory: f64,
    pub avg_cpu: f64,
    pub avg_load_time: f64,
    pub total_sessions: u64,
    pub device_count: u64,
}

/// Whether a value was measured directly or approximated from other metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricSource {
    Measured,
    Inferred,
}

/// CPU usage together with its provenance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuReading {
    pub value: f64,
    pub source: MetricSource,
}

impl CpuReading {
    pub fn measured(value: f64) -> Self {
        Self {
            value,
            source: MetricSource::Measured,
        }
    }

    pub fn inferred(value: f64) -> Self {
        Self {
            value,
            source: MetricSource::Inferred,
        }
    }

    pub fn is_inferred(&self) -> bool {
        self.source == MetricSource::Inferred
    }
}

/// Risk classification of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Score multiplier applied by the route pipeline
    pub fn multiplier(&self) -> f64 {
        match self {
            RiskLevel::Low => 0.75,
            RiskLevel::Medium => 1.0,
            RiskLevel::High => 1.25,
            RiskLevel::Critical => 1.5,
        }
    }
}

/// Per-session aggregate for one route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSessionSummary {
    pub session_id: String,
    pub device_model: String,
    pub avg_fps: f64,
    pub avg_memory: f64,
}

/// Aggregated performance of one app route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePerformanceAnalysis {
    pub route_name: String,
    pub route_path: String,
    pub sessions: Vec<RouteSessionSummary>,
    pub avg_fps: f64,
    pub avg_memory: f64,
    pub avg_cpu: CpuReading,
    /// 0 (worst) to 100 (best)
    pub performance_score: f64,
    pub risk_level: RiskLevel,
}

impl RoutePerformanceAnalysis {
    /// Number of distinct device models seen on the route
    pub fn device_count(&self) -> usize {
        self.sessions
            .iter()
            .map(|s| s.device_model.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// An improvement identified outside the rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOpportunity {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: RecommendationCategory,
    pub potential_improvement_pct: f64,
    pub affected_routes: Vec<String>,
    pub affected_sessions: u64,
    pub effort: Effort,
    pub confidence: f64,
}

/// Urgency of a proactive recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreventionPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// Signal that triggered a proactive recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProactiveTrigger {
    Forecast,
    Seasonal,
    EarlyWarning,
}

/// A recommendation aimed at preventing a projected problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProactiveRecommendation {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: RecommendationCategory,
    pub trigger: ProactiveTrigger,
    pub metric_type: MetricType,
    pub prevention_priority: PreventionPriority,
    pub priority_score: f64,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps_to_impact: Option<usize>,
    pub actionable_steps: Vec<String>,
    pub created_at: DateTime<Utc>,
}
