use serde::{Deserialize, Serialize};

use super::metric::MetricCategory;
use crate::error::RulewardError;

/// Relative weight of each category in the aggregate score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub performance: f64,
    pub security: f64,
    pub operational: f64,
    pub cost: f64,
    pub compliance: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            performance: 0.25,
            security: 0.35,
            operational: 0.20,
            cost: 0.15,
            compliance: 0.05,
        }
    }
}

impl CategoryWeights {
    pub fn weight(&self, category: MetricCategory) -> f64 {
        match category {
            MetricCategory::Performance => self.performance,
            MetricCategory::Security => self.security,
            MetricCategory::Operational => self.operational,
            MetricCategory::Cost => self.cost,
            MetricCategory::Compliance => self.compliance,
        }
    }

    pub fn total(&self) -> f64 {
        MetricCategory::ALL.iter().map(|c| self.weight(*c)).sum()
    }
}

/// Raw values that map to the worst score (1.0) for unbounded measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationLimits {
    pub latency_ms: f64,
    pub vulnerability_score: f64,
    pub maintenance_hours_per_month: f64,
    pub alerts_per_day: f64,
    pub updates_per_month: f64,
    pub incidents_per_month: f64,
}

impl Default for NormalizationLimits {
    fn default() -> Self {
        Self {
            latency_ms: 100.0,
            vulnerability_score: 10.0,
            maintenance_hours_per_month: 40.0,
            alerts_per_day: 1000.0,
            updates_per_month: 30.0,
            incidents_per_month: 10.0,
        }
    }
}

impl NormalizationLimits {
    fn all(&self) -> [(&'static str, f64); 6] {
        [
            ("latency_ms", self.latency_ms),
            ("vulnerability_score", self.vulnerability_score),
            ("maintenance_hours_per_month", self.maintenance_hours_per_month),
            ("alerts_per_day", self.alerts_per_day),
            ("updates_per_month", self.updates_per_month),
            ("incidents_per_month", self.incidents_per_month),
        ]
    }
}

/// Tunables of the impact analyzer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub weights: CategoryWeights,
    /// Aggregate scores strictly below this are acceptable
    pub acceptability_threshold: f64,
    /// A category whose mean exceeds this is called out as problematic
    pub problematic_category_threshold: f64,
    pub limits: NormalizationLimits,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            weights: CategoryWeights::default(),
            acceptability_threshold: 0.6,
            problematic_category_threshold: 0.7,
            limits: NormalizationLimits::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), RulewardError> {
        for category in MetricCategory::ALL {
            let weight = self.weights.weight(category);
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(format!(
                    "weight for {category} must be a non-negative number, got {weight}"
                )));
            }
        }
        if self.weights.total() <= 0.0 {
            return Err(invalid("category weights must not all be zero".to_string()));
        }
        for (name, threshold) in [
            ("acceptability_threshold", self.acceptability_threshold),
            (
                "problematic_category_threshold",
                self.problematic_category_threshold,
            ),
        ] {
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(invalid(format!("{name} must be in (0, 1], got {threshold}")));
            }
        }
        for (name, limit) in self.limits.all() {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(invalid(format!(
                    "normalization limit {name} must be positive, got {limit}"
                )));
            }
        }
        Ok(())
    }

    /// The acceptability boundary is exclusive: a score equal to the threshold is not acceptable.
    pub fn is_acceptable(&self, aggregate_score: f64) -> bool {
        aggregate_score < self.acceptability_threshold
    }
}

fn invalid(reason: String) -> RulewardError {
    RulewardError::InvalidConfig { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalyzerConfig::default();
        config.validate().unwrap();
        assert!((config.weights.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let config = AnalyzerConfig::default();
        assert!(!config.is_acceptable(0.6));
        assert!(!config.is_acceptable(0.61));
        assert!(config.is_acceptable(0.599_999));
        assert!(config.is_acceptable(0.0));
    }

    #[test]
    fn test_rejects_negative_weight() {
        let mut config = AnalyzerConfig::default();
        config.weights.cost = -0.1;
        assert!(matches!(
            config.validate(),
            Err(RulewardError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_weights() {
        let config = AnalyzerConfig {
            weights: CategoryWeights {
                performance: 0.0,
                security: 0.0,
                operational: 0.0,
                cost: 0.0,
                compliance: 0.0,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let config = AnalyzerConfig {
            acceptability_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalyzerConfig {
            acceptability_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_limit() {
        let mut config = AnalyzerConfig::default();
        config.limits.alerts_per_day = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: AnalyzerConfig =
            toml::from_str("acceptability_threshold = 0.5\n[weights]\nsecurity = 0.5\n").unwrap();
        assert_eq!(config.acceptability_threshold, 0.5);
        assert_eq!(config.weights.security, 0.5);
        assert_eq!(config.weights.performance, 0.25);
        assert_eq!(config.limits, NormalizationLimits::default());
    }
}
