use serde::Serialize;

use super::{
    compliance,
    complexity::rule_complexity,
    config::AnalyzerConfig,
    metric::{CollectedMetrics, ImpactMetric, MetricCategory, NEUTRAL_VALUE, clamp_unit},
    recommend::{RecommendationGenerator, RuleContext},
};
use crate::{
    conflict::Conflict,
    error::RulewardError,
    rule::{ParsedRule, RuleType},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category: MetricCategory,
    pub score: f64,
}

/// Outcome of one impact analysis. Transient; never persisted by the core.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactAnalysisResult {
    pub rule_id: String,
    pub rule_type: RuleType,
    pub metrics: Vec<ImpactMetric>,
    pub category_scores: Vec<CategoryScore>,
    pub aggregate_score: f64,
    pub is_acceptable: bool,
    /// Metrics could not be collected and neutral defaults were used
    pub degraded: bool,
    pub recommendation: String,
}

impl ImpactAnalysisResult {
    pub fn category_score(&self, category: MetricCategory) -> Option<f64> {
        self.category_scores
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.score)
    }

    pub fn metric(&self, name: &str) -> Option<&ImpactMetric> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

/// Turns collected telemetry into normalized, weighted impact scores
///
/// Stateless apart from its configuration: the same rule and metrics always
/// produce the same result.
#[derive(Debug, Clone)]
pub struct ImpactAnalyzer {
    config: AnalyzerConfig,
    recommender: RecommendationGenerator,
}

impl ImpactAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self, RulewardError> {
        config.validate()?;
        Ok(Self {
            config,
            recommender: RecommendationGenerator::new(config.problematic_category_threshold),
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn analyze(&self, rule: &ParsedRule, metrics: &CollectedMetrics) -> ImpactAnalysisResult {
        self.analyze_with_conflicts(rule, metrics, &[])
    }

    /// Analyze a rule, folding its known conflicts into the recommendation
    pub fn analyze_with_conflicts(
        &self,
        rule: &ParsedRule,
        metrics: &CollectedMetrics,
        conflicts: &[Conflict],
    ) -> ImpactAnalysisResult {
        let metrics = self.normalize(rule, metrics);
        self.conclude(rule, metrics, conflicts, None)
    }

    /// Fallback when metrics could not be collected: every metric is neutral
    /// and the recommendation says so.
    pub fn analyze_unavailable(
        &self,
        rule: &ParsedRule,
        reason: &str,
        conflicts: &[Conflict],
    ) -> ImpactAnalysisResult {
        let metrics = self
            .normalize(rule, &CollectedMetrics::default())
            .into_iter()
            .map(|metric| ImpactMetric {
                value: NEUTRAL_VALUE,
                ..metric
            })
            .collect();
        self.conclude(rule, metrics, conflicts, Some(reason))
    }

    /// Normalize raw telemetry into the ordered metric list, higher is worse.
    pub fn normalize(&self, rule: &ParsedRule, raw: &CollectedMetrics) -> Vec<ImpactMetric> {
        use MetricCategory::*;

        let limits = &self.config.limits;
        let perf = &raw.performance;
        let sec = &raw.security;
        let ops = &raw.operational;

        let cpu = clamp_unit(perf.cpu_percent / 100.0);
        let memory = clamp_unit(perf.memory_percent / 100.0);
        let latency = clamp_unit(perf.latency_ms / limits.latency_ms);
        let throughput = clamp_unit(perf.throughput_drop_percent / 100.0);
        let complexity = rule_complexity(&rule.content);

        let detection_gap = clamp_unit(1.0 - sec.detection_accuracy_percent / 100.0);
        let false_positives = clamp_unit(sec.false_positive_rate_percent / 100.0);
        let coverage_gap = clamp_unit(1.0 - sec.coverage_percent / 100.0);
        let exposure = clamp_unit(sec.vulnerability_score / limits.vulnerability_score);

        let maintenance = clamp_unit(ops.maintenance_hours_per_month / limits.maintenance_hours_per_month);
        let alert_fatigue = clamp_unit(ops.alerts_per_day / limits.alerts_per_day);
        let churn = clamp_unit(ops.updates_per_month / limits.updates_per_month);
        let incidents = clamp_unit(ops.incidents_per_month / limits.incidents_per_month);

        let security_mean = mean(&[detection_gap, false_positives, coverage_gap, exposure]);
        let rule_type = rule.rule_type();

        vec![
            ImpactMetric::new("cpu_impact", cpu, Performance, "CPU load added by the rule"),
            ImpactMetric::new("memory_impact", memory, Performance, "Memory held by the rule"),
            ImpactMetric::new("latency_impact", latency, Performance, "Per-packet or per-request latency added"),
            ImpactMetric::new("throughput_impact", throughput, Performance, "Throughput lost while the rule is active"),
            ImpactMetric::new("rule_complexity", complexity, Performance, "Structural complexity of the rule text"),
            ImpactMetric::new("detection_gap", detection_gap, Security, "Share of attacks the rule misses"),
            ImpactMetric::new("false_positive_rate", false_positives, Security, "Share of matches that are false positives"),
            ImpactMetric::new("coverage_gap", coverage_gap, Security, "Share of the protected surface left uncovered"),
            ImpactMetric::new("vulnerability_exposure", exposure, Security, "Residual vulnerability exposure"),
            ImpactMetric::new("maintenance_burden", maintenance, Operational, "Monthly maintenance effort"),
            ImpactMetric::new("alert_fatigue", alert_fatigue, Operational, "Daily alert volume"),
            ImpactMetric::new("change_churn", churn, Operational, "Frequency of rule updates"),
            ImpactMetric::new("incident_rate", incidents, Operational, "Incidents attributed to the rule"),
            ImpactMetric::new("resource_cost", mean(&[cpu, memory]), Cost, "Compute cost of running the rule"),
            ImpactMetric::new("operational_cost", mean(&[maintenance, alert_fatigue]), Cost, "Staff cost of operating the rule"),
            ImpactMetric::new("training_cost", mean(&[complexity, churn]), Cost, "Cost of keeping operators trained on the rule"),
            ImpactMetric::new(
                "regulatory_risk",
                security_mean * compliance::strictest_weight(rule_type),
                Compliance,
                "Security weakness weighted by the strictest applicable framework",
            ),
            ImpactMetric::new(
                "audit_gap",
                mean(&[detection_gap, coverage_gap]) * compliance::mean_weight(rule_type),
                Compliance,
                "Detection and coverage gaps an auditor would flag",
            ),
        ]
    }

    /// Per-category means and their weighted aggregate
    pub fn aggregate(&self, metrics: &[ImpactMetric]) -> (Vec<CategoryScore>, f64) {
        let weights = &self.config.weights;
        let mut scores = Vec::with_capacity(MetricCategory::ALL.len());
        let mut weighted = 0.0;
        let mut total_weight = 0.0;

        for category in MetricCategory::ALL {
            let values: Vec<f64> = metrics
                .iter()
                .filter(|m| m.category == category)
                .map(|m| m.value)
                .collect();
            if values.is_empty() {
                continue;
            }
            let score = mean(&values);
            let weight = weights.weight(category);
            weighted += weight * score;
            total_weight += weight;
            scores.push(CategoryScore { category, score });
        }

        let aggregate = if total_weight > 0.0 {
            clamp_unit(weighted / total_weight)
        } else {
            NEUTRAL_VALUE
        };
        (scores, aggregate)
    }

    fn conclude(
        &self,
        rule: &ParsedRule,
        metrics: Vec<ImpactMetric>,
        conflicts: &[Conflict],
        unavailable: Option<&str>,
    ) -> ImpactAnalysisResult {
        let (category_scores, aggregate_score) = self.aggregate(&metrics);
        let is_acceptable = self.config.is_acceptable(aggregate_score);

        let context = RuleContext {
            rule_id: &rule.id,
            rule_type: rule.rule_type(),
            aggregate_score,
            conflicts,
        };
        let mut recommendation = self.recommender.generate(&metrics, is_acceptable, &context);
        if let Some(reason) = unavailable {
            recommendation.push_str(&format!(
                "\nNote: metrics were unavailable ({reason}); neutral defaults of {NEUTRAL_VALUE} were used, so confidence in this assessment is reduced."
            ));
        }

        log::debug!(
            "Impact of rule {}: aggregate {:.3}, acceptable={}",
            rule.id,
            aggregate_score,
            is_acceptable
        );

        ImpactAnalysisResult {
            rule_id: rule.id.clone(),
            rule_type: rule.rule_type(),
            metrics,
            category_scores,
            aggregate_score,
            is_acceptable,
            degraded: unavailable.is_some(),
            recommendation,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
