//! Human-readable guidance from impact metrics and conflicts.
//!
//! Output is a pure function of the inputs: no randomness, no timestamps,
//! fixed ordering and fixed float formatting.

use std::collections::BTreeSet;

use super::metric::{ImpactMetric, MetricCategory};
use crate::{conflict::Conflict, rule::RuleType};

/// Per-metric trigger threshold and the guidance emitted above it
struct MetricAdvice {
    name: &'static str,
    threshold: f64,
    advice: &'static str,
}

const METRIC_ADVICE: &[MetricAdvice] = &[
    MetricAdvice {
        name: "cpu_impact",
        threshold: 0.7,
        advice: "CPU load is high: move cheap matches (protocol, port) ahead of expensive ones or narrow the rule scope.",
    },
    MetricAdvice {
        name: "memory_impact",
        threshold: 0.7,
        advice: "Memory use is high: reduce state tracking or large match sets held by the rule.",
    },
    MetricAdvice {
        name: "latency_impact",
        threshold: 0.6,
        advice: "Added latency is significant: evaluate the rule later in the chain or restrict it to the traffic that needs it.",
    },
    MetricAdvice {
        name: "throughput_impact",
        threshold: 0.6,
        advice: "Throughput loss is significant: consider hardware offload or sampling for this rule.",
    },
    MetricAdvice {
        name: "rule_complexity",
        threshold: 0.5,
        advice: "The rule is structurally complex: split it into simpler rules or simplify alternations and wildcards.",
    },
    MetricAdvice {
        name: "detection_gap",
        threshold: 0.5,
        advice: "Detection accuracy is low: refine the match conditions against known attack samples.",
    },
    MetricAdvice {
        name: "false_positive_rate",
        threshold: 0.5,
        advice: "False positives are frequent: add context conditions or thresholds to reduce noise.",
    },
    MetricAdvice {
        name: "coverage_gap",
        threshold: 0.6,
        advice: "Coverage is incomplete: extend the rule or add companion rules for the uncovered surface.",
    },
    MetricAdvice {
        name: "vulnerability_exposure",
        threshold: 0.6,
        advice: "Residual vulnerability exposure is high: prioritise compensating controls.",
    },
    MetricAdvice {
        name: "maintenance_burden",
        threshold: 0.7,
        advice: "Maintenance effort is high: document the rule and automate its updates.",
    },
    MetricAdvice {
        name: "alert_fatigue",
        threshold: 0.6,
        advice: "Alert volume is high: aggregate or rate-limit alerts to avoid operator fatigue.",
    },
    MetricAdvice {
        name: "change_churn",
        threshold: 0.7,
        advice: "The rule changes often: stabilise it or manage it through a reviewed change process.",
    },
    MetricAdvice {
        name: "incident_rate",
        threshold: 0.5,
        advice: "The rule is linked to incidents: review recent incidents before redeploying it.",
    },
    MetricAdvice {
        name: "resource_cost",
        threshold: 0.7,
        advice: "Resource cost is high: review whether the protection justifies the compute spent.",
    },
    MetricAdvice {
        name: "operational_cost",
        threshold: 0.7,
        advice: "Operational cost is high: consider consolidating this rule with related ones.",
    },
    MetricAdvice {
        name: "training_cost",
        threshold: 0.7,
        advice: "Training cost is high: simplify the rule so operators can reason about it.",
    },
    MetricAdvice {
        name: "regulatory_risk",
        threshold: 0.6,
        advice: "Regulatory risk is elevated: check the rule against the applicable compliance frameworks.",
    },
    MetricAdvice {
        name: "audit_gap",
        threshold: 0.6,
        advice: "An audit would flag gaps: record the rule's intent and evidence of its effectiveness.",
    },
];

/// Context about the rule being assessed
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub rule_id: &'a str,
    pub rule_type: RuleType,
    pub aggregate_score: f64,
    pub conflicts: &'a [Conflict],
}

#[derive(Debug, Clone, Copy)]
pub struct RecommendationGenerator {
    problematic_category_threshold: f64,
}

impl RecommendationGenerator {
    pub fn new(problematic_category_threshold: f64) -> Self {
        Self {
            problematic_category_threshold,
        }
    }

    /// Trigger threshold of a metric, if it has dedicated guidance
    pub fn threshold_for(name: &str) -> Option<f64> {
        METRIC_ADVICE
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.threshold)
    }

    pub fn generate(
        &self,
        metrics: &[ImpactMetric],
        is_acceptable: bool,
        context: &RuleContext<'_>,
    ) -> String {
        let mut lines = Vec::new();

        if is_acceptable {
            lines.push(format!(
                "Rule {} ({}) is within acceptable impact limits (score {:.2}).",
                context.rule_id, context.rule_type, context.aggregate_score
            ));
        } else {
            lines.push(format!(
                "Rule {} ({}) exceeds the acceptable impact threshold (score {:.2}); review before deployment.",
                context.rule_id, context.rule_type, context.aggregate_score
            ));
        }

        for category in MetricCategory::ALL {
            let values: Vec<f64> = metrics
                .iter()
                .filter(|m| m.category == category)
                .map(|m| m.value)
                .collect();
            if values.is_empty() {
                continue;
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            if mean > self.problematic_category_threshold {
                lines.push(format!(
                    "{} impact is problematic (mean {:.2}).",
                    capitalize(category.as_str()),
                    mean
                ));
            }
        }

        for metric in metrics {
            if let Some(advice) = METRIC_ADVICE.iter().find(|a| a.name == metric.name)
                && metric.value > advice.threshold
            {
                lines.push(format!("- {}", advice.advice));
            }
        }

        let mut seen = BTreeSet::new();
        for conflict in context.conflicts {
            if seen.insert(conflict.recommendation.as_str()) {
                lines.push(format!("- {}", conflict.recommendation));
            }
        }

        if !is_acceptable {
            lines.push(rule_type_hint(context.rule_type).to_string());
        }

        lines.join("\n")
    }
}

fn rule_type_hint(rule_type: RuleType) -> &'static str {
    match rule_type {
        RuleType::Firewall => {
            "Firewall hint: narrow source/destination ranges and place high-volume accepts early in the chain."
        }
        RuleType::Ids => {
            "IDS hint: anchor content matches with flow and protocol keywords to cut inspection cost and noise."
        }
        RuleType::AccessControl => {
            "Access-control hint: review granted permissions against least privilege."
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::{ConflictType, Severity};

    fn metric(name: &'static str, value: f64, category: MetricCategory) -> ImpactMetric {
        ImpactMetric::new(name, value, category, "")
    }

    fn context<'a>(conflicts: &'a [Conflict]) -> RuleContext<'a> {
        RuleContext {
            rule_id: "r-1",
            rule_type: RuleType::Ids,
            aggregate_score: 0.42,
            conflicts,
        }
    }

    #[test]
    fn test_thresholds_are_within_documented_band() {
        for advice in METRIC_ADVICE {
            assert!((0.5..=0.7).contains(&advice.threshold), "{}", advice.name);
        }
        assert_eq!(RecommendationGenerator::threshold_for("cpu_impact"), Some(0.7));
        assert_eq!(RecommendationGenerator::threshold_for("unknown"), None);
    }

    #[test]
    fn test_acceptable_rule_without_issues() {
        let generator = RecommendationGenerator::new(0.7);
        let metrics = vec![
            metric("cpu_impact", 0.1, MetricCategory::Performance),
            metric("detection_gap", 0.2, MetricCategory::Security),
        ];

        let text = generator.generate(&metrics, true, &context(&[]));

        assert_eq!(
            text,
            "Rule r-1 (ids) is within acceptable impact limits (score 0.42)."
        );
    }

    #[test]
    fn test_metric_above_threshold_emits_advice() {
        let generator = RecommendationGenerator::new(0.7);
        let metrics = vec![
            metric("false_positive_rate", 0.55, MetricCategory::Security),
            metric("cpu_impact", 0.65, MetricCategory::Performance),
        ];

        let text = generator.generate(&metrics, true, &context(&[]));

        assert!(text.contains("False positives are frequent"));
        // 0.65 is below cpu_impact's 0.7 threshold
        assert!(!text.contains("CPU load is high"));
    }

    #[test]
    fn test_problematic_category_and_hint() {
        let generator = RecommendationGenerator::new(0.7);
        let metrics = vec![
            metric("cpu_impact", 0.9, MetricCategory::Performance),
            metric("memory_impact", 0.8, MetricCategory::Performance),
            metric("detection_gap", 0.7, MetricCategory::Security),
        ];

        let text = generator.generate(&metrics, false, &context(&[]));
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].contains("exceeds the acceptable impact threshold"));
        assert_eq!(lines[1], "Performance impact is problematic (mean 0.85).");
        // Security mean is exactly 0.7, not above it
        assert!(!text.contains("Security impact is problematic"));
        assert!(text.contains("CPU load is high"));
        assert_eq!(*lines.last().unwrap(), rule_type_hint(RuleType::Ids));
    }

    #[test]
    fn test_conflict_recommendations_are_deduplicated() {
        let generator = RecommendationGenerator::new(0.7);
        let conflicts = vec![
            Conflict::new("r-1", "r-2", ConflictType::DuplicateSid, Severity::Critical, String::new()),
            Conflict::new("r-1", "r-3", ConflictType::DuplicateSid, Severity::Critical, String::new()),
            Conflict::new("r-1", "r-4", ConflictType::Overlap, Severity::Low, String::new()),
        ];

        let text = generator.generate(&[], true, &context(&conflicts));

        assert_eq!(text.matches("Resolve duplicate SID").count(), 1);
        assert!(text.contains("Review overlapping detections"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let generator = RecommendationGenerator::new(0.7);
        let metrics = vec![
            metric("alert_fatigue", 0.9, MetricCategory::Operational),
            metric("audit_gap", 0.65, MetricCategory::Compliance),
        ];
        let first = generator.generate(&metrics, false, &context(&[]));
        let second = generator.generate(&metrics, false, &context(&[]));
        assert_eq!(first, second);
    }
}
