//! Batch entry points combining parsing, conflict detection and impact analysis.
//!
//! Records are expected in insertion order: their index in the slice is the
//! tie-break between rules of equal priority.

use std::fmt;

use serde::Serialize;

use crate::{
    conflict::{Conflict, ConflictDetector, Severity},
    error::RulewardError,
    impact::{ImpactAnalysisResult, ImpactAnalyzer, MetricsCollector, analyze_collected},
    rule::{ParsedRule, RuleFailure, SecurityRule, parse_batch, parse_record},
};

#[derive(Debug, Default, Clone, Serialize)]
pub struct AuditReport {
    pub parsed: Vec<ParsedRule>,
    pub failures: Vec<RuleFailure>,
    pub conflicts: Vec<Conflict>,
    pub impacts: Vec<ImpactAnalysisResult>,
}

impl AuditReport {
    pub fn highest_severity(&self) -> Option<Severity> {
        self.conflicts.iter().map(|c| c.severity).max()
    }

    /// Conflicts that involve `rule_id` on either side
    pub fn conflicts_for(&self, rule_id: &str) -> Vec<Conflict> {
        self.conflicts
            .iter()
            .filter(|c| c.rule1_id == rule_id || c.rule2_id == rule_id)
            .cloned()
            .collect()
    }

    /// A critical conflict or an unacceptable impact was found
    pub fn has_blocking_findings(&self) -> bool {
        self.highest_severity() == Some(Severity::Critical)
            || self.impacts.iter().any(|i| !i.is_acceptable)
    }

    pub fn exit_code(&self) -> i32 {
        if self.has_blocking_findings() { 1 } else { 0 }
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} rules parsed, {} excluded, {} conflicts",
            self.parsed.len(),
            self.failures.len(),
            self.conflicts.len()
        )?;
        for failure in &self.failures {
            writeln!(
                f,
                "excluded {} ({}): {}",
                failure.rule_id, failure.rule_type, failure.error
            )?;
        }
        for conflict in &self.conflicts {
            writeln!(f, "{conflict}")?;
            writeln!(f, "  -> {}", conflict.recommendation)?;
        }
        for impact in &self.impacts {
            writeln!(
                f,
                "impact {} ({}): score {:.2}, {}{}",
                impact.rule_id,
                impact.rule_type,
                impact.aggregate_score,
                if impact.is_acceptable { "acceptable" } else { "unacceptable" },
                if impact.degraded { ", degraded" } else { "" }
            )?;
            for line in impact.recommendation.lines() {
                writeln!(f, "  {line}")?;
            }
        }
        Ok(())
    }
}

/// Parse every rule and check each one against the rules evaluated before it
pub fn audit_ruleset(rules: &[SecurityRule]) -> AuditReport {
    let batch = parse_batch(rules);
    let conflicts = ConflictDetector::detect_all(&batch.parsed);

    log::info!(
        "Audited {} rules: {} parsed, {} excluded, {} conflicts",
        rules.len(),
        batch.parsed.len(),
        batch.failures.len(),
        conflicts.len()
    );

    AuditReport {
        parsed: batch.parsed,
        failures: batch.failures,
        conflicts,
        impacts: Vec::new(),
    }
}

/// Check a single candidate rule against an existing rule set
///
/// A candidate already present in `existing` keeps its position there;
/// otherwise it is treated as the newest rule. Unparsable existing rules are
/// reported as failures; an unparsable candidate fails the call.
pub fn check_candidate(
    candidate: &SecurityRule,
    existing: &[SecurityRule],
) -> Result<AuditReport, RulewardError> {
    let sequence = existing
        .iter()
        .position(|r| r.id == candidate.id)
        .unwrap_or(existing.len());
    let parsed_candidate =
        parse_record(candidate, sequence as u64).map_err(|source| RulewardError::Parse {
            rule_id: candidate.id.clone(),
            source,
        })?;

    let mut batch = parse_batch(existing);
    batch.parsed.retain(|r| r.id != candidate.id);
    batch.failures.retain(|f| f.rule_id != candidate.id);
    let conflicts = ConflictDetector::detect(&parsed_candidate, &batch.parsed);

    log::info!(
        "Candidate {} checked against {} rules: {} conflicts",
        candidate.id,
        batch.parsed.len(),
        conflicts.len()
    );

    Ok(AuditReport {
        parsed: vec![parsed_candidate],
        failures: batch.failures,
        conflicts,
        impacts: Vec::new(),
    })
}

/// Run impact analysis for every parsed rule of the report
pub async fn attach_impacts<C>(report: &mut AuditReport, analyzer: &ImpactAnalyzer, collector: &C)
where
    C: MetricsCollector + ?Sized,
{
    let mut impacts = Vec::with_capacity(report.parsed.len());
    for rule in &report.parsed {
        let conflicts = report.conflicts_for(&rule.id);
        impacts.push(analyze_collected(analyzer, collector, rule, &conflicts).await);
    }
    report.impacts = impacts;
}
