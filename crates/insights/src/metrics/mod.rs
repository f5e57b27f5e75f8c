//! Prometheus metrics for the report generator

pub mod prometheus;

pub use prometheus::{InsightMetrics, LabelNames, MetricsSnapshot};
