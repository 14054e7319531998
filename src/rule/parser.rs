use serde::Serialize;

use super::{
    access::parse_access_control_rule,
    firewall::parse_firewall_rule,
    ids::parse_ids_rule,
    model::{EvalOrder, ParsedRule, RuleType, SecurityRule, StructuredRule},
};
use crate::error::{ParseError, RulewardError};

/// Parse raw rule content according to its family's grammar
///
/// Pure: the same input always yields the same `StructuredRule`.
pub fn parse_rule(rule_type: RuleType, content: &str) -> Result<StructuredRule, ParseError> {
    match rule_type {
        RuleType::Firewall => parse_firewall_rule(content).map(StructuredRule::Firewall),
        RuleType::Ids => parse_ids_rule(content).map(StructuredRule::Ids),
        RuleType::AccessControl => {
            parse_access_control_rule(content).map(StructuredRule::AccessControl)
        }
    }
}

/// Parse with a rule type given by name, as received from an outer surface
pub fn parse_rule_named(type_name: &str, content: &str) -> Result<StructuredRule, RulewardError> {
    let rule_type: RuleType = type_name.parse()?;
    parse_rule(rule_type, content).map_err(|source| RulewardError::Parse {
        rule_id: "inline".to_string(),
        source,
    })
}

/// Parse a stored rule record. `sequence` is the caller-supplied tie-break
/// for rules sharing a priority.
pub fn parse_record(rule: &SecurityRule, sequence: u64) -> Result<ParsedRule, ParseError> {
    let structured = parse_rule(rule.rule_type, &rule.content)?;
    Ok(ParsedRule {
        id: rule.id.clone(),
        order: EvalOrder::new(rule.priority, sequence),
        enabled: rule.enabled,
        content: rule.content.clone(),
        structured,
    })
}

/// A rule that was excluded from analysis because it did not parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFailure {
    pub rule_id: String,
    pub rule_type: RuleType,
    pub error: ParseError,
}

/// Result of parsing a batch: failures are collected, never fatal
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedBatch {
    pub parsed: Vec<ParsedRule>,
    pub failures: Vec<RuleFailure>,
}

/// Parse every record, using its position in `rules` as the sequence
/// tie-break.
pub fn parse_batch(rules: &[SecurityRule]) -> ParsedBatch {
    let mut batch = ParsedBatch::default();
    for (index, rule) in rules.iter().enumerate() {
        match parse_record(rule, index as u64) {
            Ok(parsed) => batch.parsed.push(parsed),
            Err(error) => {
                log::warn!("Excluding rule {} ({}): {}", rule.id, rule.rule_type, error);
                batch.failures.push(RuleFailure {
                    rule_id: rule.id.clone(),
                    rule_type: rule.rule_type,
                    error,
                });
            }
        }
    }
    log::debug!(
        "Parsed {} of {} rules ({} excluded)",
        batch.parsed.len(),
        rules.len(),
        batch.failures.len()
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RuleType::Firewall, "iptables -A INPUT -p tcp --dport 443 -j ACCEPT")]
    #[case(RuleType::Ids, "alert http any any -> any any (content:\"/admin\"; sid:42;)")]
    #[case(RuleType::AccessControl, "role:auditor read:/reports/*")]
    fn test_parse_is_referentially_transparent(#[case] rule_type: RuleType, #[case] content: &str) {
        let first = parse_rule(rule_type, content).unwrap();
        let second = parse_rule(rule_type, content).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.rule_type(), rule_type);
    }

    #[test]
    fn test_empty_access_control_is_too_short() {
        assert!(matches!(
            parse_rule(RuleType::AccessControl, ""),
            Err(ParseError::TooShort { len: 0, .. })
        ));
    }

    #[test]
    fn test_parse_rule_named_rejects_unknown_type() {
        assert!(matches!(
            parse_rule_named("netflow", "whatever content"),
            Err(RulewardError::UnsupportedRuleType { .. })
        ));
        assert!(matches!(
            parse_rule_named("ids", "not a rule"),
            Err(RulewardError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_batch_isolates_failures() {
        let rules = vec![
            SecurityRule::new("fw-1", RuleType::Firewall, "iptables -A INPUT -j DROP"),
            SecurityRule::new("fw-2", RuleType::Firewall, "iptables -A INPUT -j BOGUS"),
            SecurityRule::new("ac-1", RuleType::AccessControl, "short"),
            SecurityRule::new("ids-1", RuleType::Ids, "alert ip any any -> any any (sid:5;)")
                .with_priority(3),
        ];

        let batch = parse_batch(&rules);

        let parsed: Vec<&str> = batch.parsed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(parsed, vec!["fw-1", "ids-1"]);
        assert_eq!(batch.parsed[1].order, EvalOrder::new(3, 3));

        assert_eq!(batch.failures.len(), 2);
        assert!(matches!(
            batch.failures[0].error,
            ParseError::InvalidAction { .. }
        ));
        assert!(matches!(batch.failures[1].error, ParseError::TooShort { .. }));
    }
}
