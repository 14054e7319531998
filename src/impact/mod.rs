pub mod analyzer;
pub mod cache;
pub mod collector;
pub mod compliance;
pub mod complexity;
pub mod config;
pub mod metric;
pub mod recommend;

// Re-export main types and functions
pub use analyzer::{CategoryScore, ImpactAnalysisResult, ImpactAnalyzer};
pub use cache::{CachingCollector, MetricsCache};
pub use collector::{MetricsCollector, StaticMetricsCollector, analyze_collected};
pub use complexity::rule_complexity;
pub use config::{AnalyzerConfig, CategoryWeights, NormalizationLimits};
pub use metric::{
    CollectedMetrics, ImpactMetric, MetricCategory, OperationalSnapshot, PerformanceSnapshot,
    SecuritySnapshot,
};
pub use recommend::{RecommendationGenerator, RuleContext};
