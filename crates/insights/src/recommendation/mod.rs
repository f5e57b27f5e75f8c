//! Recommendation engine
//!
//! Converts insights, route aggregates and optimization opportunities into a ranked list of
//! actionable recommendations, and forward-looking signals into proactive ones.

pub mod engine;
pub mod proactive;
pub mod route;
pub mod rules;
pub mod scoring;
pub mod types;

pub use engine::{Candidate, RecommendationBatch, RecommendationEngine};
pub use proactive::ProactiveCandidate;
pub use route::is_route_at_risk;
pub use rules::{RecommendationRule, DEFAULT_RULES};
pub use scoring::{blended_priority, context_multiplier, opportunity_score, route_base_score};
pub use types::*;
