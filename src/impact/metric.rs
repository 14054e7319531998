use std::fmt;

use serde::{Deserialize, Serialize};

/// Value used when a measurement is missing or not a number
pub const NEUTRAL_VALUE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Performance,
    Security,
    Operational,
    Cost,
    Compliance,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 5] = [
        MetricCategory::Performance,
        MetricCategory::Security,
        MetricCategory::Operational,
        MetricCategory::Cost,
        MetricCategory::Compliance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::Performance => "performance",
            MetricCategory::Security => "security",
            MetricCategory::Operational => "operational",
            MetricCategory::Cost => "cost",
            MetricCategory::Compliance => "compliance",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized impact measurement. `value` is in [0, 1], higher is worse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactMetric {
    pub name: &'static str,
    pub value: f64,
    pub category: MetricCategory,
    pub description: &'static str,
}

impl ImpactMetric {
    /// Build a metric, clamping `value` into [0, 1]. Non-finite values become neutral.
    pub fn new(
        name: &'static str,
        value: f64,
        category: MetricCategory,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            value: clamp_unit(value),
            category,
            description,
        }
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        NEUTRAL_VALUE
    }
}

/// Raw performance telemetry for a rule type
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSnapshot {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub latency_ms: f64,
    pub throughput_drop_percent: f64,
}

/// Raw security telemetry for a rule type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySnapshot {
    /// Share of true attacks detected (higher is better)
    pub detection_accuracy_percent: f64,
    pub false_positive_rate_percent: f64,
    /// Share of the protected surface covered (higher is better)
    pub coverage_percent: f64,
    /// CVSS-like exposure, 0-10
    pub vulnerability_score: f64,
}

impl Default for SecuritySnapshot {
    fn default() -> Self {
        Self {
            detection_accuracy_percent: 100.0,
            false_positive_rate_percent: 0.0,
            coverage_percent: 100.0,
            vulnerability_score: 0.0,
        }
    }
}

/// Raw operational telemetry for a rule type
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationalSnapshot {
    pub maintenance_hours_per_month: f64,
    pub alerts_per_day: f64,
    pub updates_per_month: f64,
    pub incidents_per_month: f64,
}

/// Output of a `MetricsCollector`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectedMetrics {
    pub performance: PerformanceSnapshot,
    pub security: SecuritySnapshot,
    pub operational: OperationalSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(-0.3, 0.0)]
    #[case(0.42, 0.42)]
    #[case(1.7, 1.0)]
    #[case(f64::NAN, NEUTRAL_VALUE)]
    #[case(f64::INFINITY, NEUTRAL_VALUE)]
    fn test_metric_value_is_clamped(#[case] raw: f64, #[case] expected: f64) {
        let metric = ImpactMetric::new("cpu_impact", raw, MetricCategory::Performance, "");
        assert_eq!(metric.value, expected);
    }
}
