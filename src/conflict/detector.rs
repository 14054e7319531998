use super::{firewall, ids, model::Conflict};
use crate::rule::{ParsedRule, StructuredRule};

/// Pairwise conflict detection, dispatched on the candidate's rule family
///
/// Only existing rules of the same family, enabled, and with a different id
/// are compared. Evaluation order comes from each rule's `EvalOrder`, never
/// from its position in `existing`.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Compare `candidate` against every rule in `existing`. O(n) in `existing`.
    pub fn detect(candidate: &ParsedRule, existing: &[ParsedRule]) -> Vec<Conflict> {
        let conflicts = match &candidate.structured {
            StructuredRule::Firewall(rule) => firewall::detect(candidate, rule, existing),
            StructuredRule::Ids(rule) => ids::detect(candidate, rule, existing),
            StructuredRule::AccessControl(_) => {
                // No grammar, nothing to compare structurally
                log::debug!(
                    "Skipping conflict detection for access-control rule {}",
                    candidate.id
                );
                Vec::new()
            }
        };

        if !conflicts.is_empty() {
            log::debug!(
                "Rule {} conflicts with {} existing rule(s)",
                candidate.id,
                conflicts.len()
            );
        }
        conflicts
    }

    /// Check every rule against the rules that evaluate before it. O(n²).
    ///
    /// Each unordered pair is compared exactly once; the later-evaluated rule
    /// plays the candidate.
    pub fn detect_all(rules: &[ParsedRule]) -> Vec<Conflict> {
        let mut ordered: Vec<ParsedRule> = rules.iter().filter(|r| r.enabled).cloned().collect();
        ordered.sort_by_key(|r| r.order);

        let mut conflicts = Vec::new();
        for (index, candidate) in ordered.iter().enumerate() {
            conflicts.extend(Self::detect(candidate, &ordered[..index]));
        }
        conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::{ConflictType, Severity};
    use crate::rule::{EvalOrder, RuleType, parse_rule};

    fn parsed(id: &str, rule_type: RuleType, priority: i64, sequence: u64, content: &str) -> ParsedRule {
        ParsedRule {
            id: id.to_string(),
            order: EvalOrder::new(priority, sequence),
            enabled: true,
            content: content.to_string(),
            structured: parse_rule(rule_type, content).unwrap(),
        }
    }

    #[test]
    fn test_access_control_never_conflicts() {
        let a = parsed("a", RuleType::AccessControl, 0, 0, "allow group:ops read:/etc/app");
        let b = parsed("b", RuleType::AccessControl, 0, 1, "allow group:ops read:/etc/app");
        assert!(ConflictDetector::detect(&b, &[a]).is_empty());
    }

    #[test]
    fn test_families_are_not_mixed() {
        let fw = parsed("fw", RuleType::Firewall, 0, 0, "iptables -A INPUT -j DROP");
        let ids = parsed("ids", RuleType::Ids, 0, 1, "alert ip any any -> any any (sid:1;)");
        assert!(ConflictDetector::detect(&ids, &[fw.clone()]).is_empty());
        assert!(ConflictDetector::detect(&fw, &[ids]).is_empty());
    }

    #[test]
    fn test_detect_all_uses_eval_order_not_list_position() {
        // Listed narrow-first, but the broad DROP has the better priority
        let rules = vec![
            parsed(
                "accept-host",
                RuleType::Firewall,
                10,
                0,
                "iptables -A INPUT -s 10.0.1.5 -p tcp --dport 80 -j ACCEPT",
            ),
            parsed(
                "drop-10",
                RuleType::Firewall,
                1,
                1,
                "iptables -A INPUT -s 10.0.0.0/8 -p tcp --dport 80 -j DROP",
            ),
        ];

        let conflicts = ConflictDetector::detect_all(&rules);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Shadowing);
        assert_eq!(conflicts[0].rule1_id, "accept-host");
        assert_eq!(conflicts[0].rule2_id, "drop-10");
    }

    #[test]
    fn test_detect_all_reports_each_pair_once() {
        let rules = vec![
            parsed("r1", RuleType::Ids, 0, 0, "alert tcp any any -> any any (content:\"a\"; sid:1;)"),
            parsed("r2", RuleType::Ids, 0, 1, "alert tcp any any -> any any (content:\"b\"; sid:1;)"),
            parsed("r3", RuleType::Ids, 0, 2, "alert tcp any any -> any any (content:\"c\"; sid:1;)"),
        ];

        let conflicts = ConflictDetector::detect_all(&rules);

        assert_eq!(conflicts.len(), 3);
        assert!(
            conflicts
                .iter()
                .all(|c| c.conflict_type == ConflictType::DuplicateSid && c.severity == Severity::Critical)
        );
    }
}
