//! Linear forecasts and early warnings
//!
//! Projects a metric forward along its regression line with prediction bands and raises an
//! early-warning alert when a currently healthy metric is projected to cross its health
//! threshold within the warning horizon.

use tracing::{debug, trace};

use super::regression::{calculate_linear_regression_with_alpha, DEFAULT_SIGNIFICANCE_ALPHA};
use super::traits::{Clock, IdGenerator};
use super::types::{
    Confidence, EarlyWarningAlert, ForecastPoint, MetricSample, MetricType, PerformanceForecast, Severity,
    ThresholdBreach, TrendDirection,
};
use crate::config::ForecastConfig;

/// Forecast at the default significance level
pub fn forecast_metric(
    series: &[MetricSample],
    metric_type: MetricType,
    config: &ForecastConfig,
) -> Option<PerformanceForecast> {
    forecast_metric_with_alpha(series, metric_type, config, DEFAULT_SIGNIFICANCE_ALPHA)
}

/// Project `series` forward `config.horizon` steps
///
/// Returns `None` below `config.min_points` samples. The direction is stable unless the
/// regression slope is significant at `alpha`.
pub fn forecast_metric_with_alpha(
    series: &[MetricSample],
    metric_type: MetricType,
    config: &ForecastConfig,
    alpha: f64,
) -> Option<PerformanceForecast> {
    let n = series.len();
    if n < config.min_points.max(3) {
        debug!(
            metric = %metric_type,
            samples = n,
            minimum = config.min_points,
            "Insufficient data for forecast"
        );
        return None;
    }

    let values = MetricSample::values(series);
    let regression = calculate_linear_regression_with_alpha(&values, alpha);
    let current_value = values[n - 1];

    let x_mean = (n - 1) as f64 / 2.0;
    let sxx: f64 = (0..n).map(|i| (i as f64 - x_mean).powi(2)).sum();
    let ss_residual: f64 = values
        .iter()
        .enumerate()
        .map(|(i, y)| (y - regression.predict(i as f64)).powi(2))
        .sum();
    let standard_error = (ss_residual / (n - 2) as f64).sqrt();

    let points: Vec<ForecastPoint> = (1..=config.horizon)
        .map(|step| {
            let x = (n - 1 + step) as f64;
            let value = regression.predict(x);
            let leverage = 1.0 + 1.0 / n as f64 + (x - x_mean).powi(2) / sxx;
            let half_width = config.prediction_z * standard_error * leverage.sqrt();
            ForecastPoint {
                step,
                value,
                lower_bound: value - half_width,
                upper_bound: value + half_width,
            }
        })
        .collect();

    let direction = if !regression.is_significant || regression.slope == 0.0 {
        TrendDirection::Stable
    } else if regression.slope > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    let thresholds = &config.thresholds;
    let threshold_breach = if thresholds.is_breached(metric_type, current_value) {
        None
    } else {
        points
            .iter()
            .find(|p| thresholds.is_breached(metric_type, p.value))
            .map(|p| ThresholdBreach {
                step: p.step,
                threshold: thresholds.limit(metric_type),
                predicted_value: p.value,
            })
    };

    trace!(
        metric = %metric_type,
        slope = regression.slope,
        breach_step = threshold_breach.as_ref().map(|b| b.step),
        "Forecast computed"
    );

    Some(PerformanceForecast {
        metric_type,
        current_value,
        horizon: config.horizon,
        points,
        direction,
        confidence: regression.r_squared.clamp(0.0, 1.0),
        threshold_breach,
    })
}

/// Severity of a projected breach: the closer the breach, the more severe
fn breach_severity(steps: usize, horizon: usize, confidence: f64) -> Severity {
    let quarter = (horizon / 4).max(1);
    let half = (horizon / 2).max(1);
    let severity = if steps <= quarter {
        Severity::Critical
    } else if steps <= half {
        Severity::High
    } else {
        Severity::Medium
    };

    if Confidence::new(confidence).is_low() {
        match severity {
            Severity::Critical => Severity::High,
            Severity::High => Severity::Medium,
            _ => Severity::Low,
        }
    } else {
        severity
    }
}

/// Turn projected breaches within the warning horizon into alerts
pub fn detect_early_warnings(
    forecasts: &[PerformanceForecast],
    config: &ForecastConfig,
    clock: &dyn Clock,
    ids: &dyn IdGenerator,
) -> Vec<EarlyWarningAlert> {
    forecasts
        .iter()
        .filter_map(|forecast| {
            let breach = forecast.threshold_breach.as_ref()?;
            if breach.step > config.warning_horizon {
                return None;
            }
            let metric = forecast.metric_type;
            let severity = breach_severity(breach.step, config.warning_horizon, forecast.confidence);
            let bound = if metric.higher_is_better() { "below" } else { "above" };

            debug!(
                metric = %metric,
                steps = breach.step,
                ?severity,
                "Early warning raised"
            );

            Some(EarlyWarningAlert {
                id: ids.next_id(),
                metric_type: metric,
                severity,
                title: format!("{} projected to cross its threshold", capitalize(metric.label())),
                message: format!(
                    "{} is {:.1} {} now and is projected to reach {:.1} {} in {} steps, {} the {:.0} {} threshold",
                    capitalize(metric.label()),
                    forecast.current_value,
                    metric.unit(),
                    breach.predicted_value,
                    metric.unit(),
                    breach.step,
                    bound,
                    breach.threshold,
                    metric.unit(),
                ),
                current_value: forecast.current_value,
                projected_value: breach.predicted_value,
                threshold: breach.threshold,
                steps_to_breach: breach.step,
                confidence: forecast.confidence,
                created_at: clock.now(),
            })
        })
        .collect()
}

pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
