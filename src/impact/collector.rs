use std::collections::HashMap;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::{
    analyzer::{ImpactAnalysisResult, ImpactAnalyzer},
    metric::CollectedMetrics,
};
use crate::{conflict::Conflict, error::RulewardError, rule::{ParsedRule, RuleType}};

/// Source of performance, security and operational telemetry for a rule type
///
/// All I/O of impact analysis lives behind this trait.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MetricsCollector: Send + Sync + 'static {
    async fn collect(&self, rule_type: RuleType) -> Result<CollectedMetrics, RulewardError>;
}

/// Collector serving fixed snapshots, typically loaded from configuration
#[derive(Debug, Default, Clone)]
pub struct StaticMetricsCollector {
    snapshots: HashMap<RuleType, CollectedMetrics>,
}

impl StaticMetricsCollector {
    pub fn new(snapshots: HashMap<RuleType, CollectedMetrics>) -> Self {
        Self { snapshots }
    }

    pub fn insert(&mut self, rule_type: RuleType, metrics: CollectedMetrics) {
        self.snapshots.insert(rule_type, metrics);
    }
}

#[async_trait]
impl MetricsCollector for StaticMetricsCollector {
    async fn collect(&self, rule_type: RuleType) -> Result<CollectedMetrics, RulewardError> {
        self.snapshots
            .get(&rule_type)
            .copied()
            .ok_or_else(|| RulewardError::MetricsUnavailable {
                rule_type,
                reason: "no metrics snapshot configured".to_string(),
            })
    }
}

/// Collect metrics for `rule` and analyze it
///
/// A collector failure never propagates: the analysis falls back to neutral
/// metrics and says so in its recommendation.
pub async fn analyze_collected<C>(
    analyzer: &ImpactAnalyzer,
    collector: &C,
    rule: &ParsedRule,
    conflicts: &[Conflict],
) -> ImpactAnalysisResult
where
    C: MetricsCollector + ?Sized,
{
    match collector.collect(rule.rule_type()).await {
        Ok(metrics) => analyzer.analyze_with_conflicts(rule, &metrics, conflicts),
        Err(err) => {
            log::warn!("Using neutral metrics for rule {}: {err}", rule.id);
            analyzer.analyze_unavailable(rule, &err.to_string(), conflicts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impact::config::AnalyzerConfig;
    use crate::impact::metric::{NEUTRAL_VALUE, PerformanceSnapshot};
    use crate::rule::{EvalOrder, parse_rule};

    fn ids_rule() -> ParsedRule {
        let content = r#"alert tcp any any -> $HOME_NET 22 (content:"SSH-"; sid:1001;)"#;
        ParsedRule {
            id: "ids-1".to_string(),
            order: EvalOrder::default(),
            enabled: true,
            content: content.to_string(),
            structured: parse_rule(RuleType::Ids, content).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_static_collector_serves_snapshot() {
        let mut collector = StaticMetricsCollector::default();
        let metrics = CollectedMetrics {
            performance: PerformanceSnapshot {
                cpu_percent: 12.0,
                ..Default::default()
            },
            ..Default::default()
        };
        collector.insert(RuleType::Ids, metrics);

        assert_eq!(collector.collect(RuleType::Ids).await.unwrap(), metrics);
        assert!(matches!(
            collector.collect(RuleType::Firewall).await,
            Err(RulewardError::MetricsUnavailable {
                rule_type: RuleType::Firewall,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_analyze_collected_uses_collector_output() {
        let mut collector = MockMetricsCollector::new();
        collector
            .expect_collect()
            .withf(|rule_type| *rule_type == RuleType::Ids)
            .times(1)
            .returning(|_| Ok(CollectedMetrics::default()));
        let analyzer = ImpactAnalyzer::new(AnalyzerConfig::default()).unwrap();

        let result = analyze_collected(&analyzer, &collector, &ids_rule(), &[]).await;

        assert!(!result.degraded);
        assert_eq!(result.rule_id, "ids-1");
        assert_eq!(result.metric("cpu_impact").unwrap().value, 0.0);
    }

    #[tokio::test]
    async fn test_analyze_collected_degrades_on_failure() {
        let mut collector = MockMetricsCollector::new();
        collector.expect_collect().times(1).returning(|rule_type| {
            Err(RulewardError::MetricsUnavailable {
                rule_type,
                reason: "telemetry backend down".to_string(),
            })
        });
        let analyzer = ImpactAnalyzer::new(AnalyzerConfig::default()).unwrap();

        let result = analyze_collected(&analyzer, &collector, &ids_rule(), &[]).await;

        assert!(result.degraded);
        assert!(result.metrics.iter().all(|m| m.value == NEUTRAL_VALUE));
        assert!(result.recommendation.contains("telemetry backend down"));
    }
}
