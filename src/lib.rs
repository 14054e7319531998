//! Conflict detection and impact analysis for security rule sets.
//!
//! Rules (iptables firewall rules, Suricata/Snort-style IDS signatures and
//! free-form access-control policies) are parsed into structured form,
//! compared pairwise for redundancy, shadowing, contradiction and
//! generalization, and scored across performance, security, operational,
//! cost and compliance impact.

pub mod audit;
pub mod cli;
pub mod conflict;
pub mod error;
pub mod impact;
pub mod rule;

pub use audit::{AuditReport, attach_impacts, audit_ruleset, check_candidate};
pub use conflict::{Conflict, ConflictDetector, ConflictType, Severity};
pub use error::{ParseError, RulewardError};
pub use impact::{AnalyzerConfig, ImpactAnalysisResult, ImpactAnalyzer, MetricsCollector};
pub use rule::{EvalOrder, ParsedRule, RuleType, SecurityRule, StructuredRule};
