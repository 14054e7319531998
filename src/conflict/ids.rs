use super::model::{Conflict, ConflictType, Severity};
use crate::rule::{ParsedRule, Relation, StructuredRule, ids::IdsRule};

pub(super) fn detect(candidate: &ParsedRule, rule: &IdsRule, existing: &[ParsedRule]) -> Vec<Conflict> {
    existing
        .iter()
        .filter(|other| other.enabled && other.id != candidate.id)
        .filter_map(|other| match &other.structured {
            StructuredRule::Ids(other_rule) => classify(&candidate.id, rule, &other.id, other_rule),
            _ => None,
        })
        .collect()
}

fn classify(id: &str, rule: &IdsRule, other_id: &str, other_rule: &IdsRule) -> Option<Conflict> {
    // Duplicate SIDs are reported whatever the content
    if rule.same_signature_id(other_rule) {
        return Some(Conflict::new(
            id,
            other_id,
            ConflictType::DuplicateSid,
            Severity::Critical,
            format!(
                "Rules {id} and {other_id} both use sid:{} (gid {})",
                rule.sid, rule.gid
            ),
        ));
    }

    if !rule.shares_header(other_rule) {
        return None;
    }

    let ours = rule.detection_options();
    let theirs = other_rule.detection_options();
    let header = format!("{} {} -> {}", rule.protocol, rule.src_addr, rule.dst_addr);

    let conflict = match Relation::of_constraints(&ours, &theirs) {
        Relation::Equal if rule.action == other_rule.action => Conflict::new(
            id,
            other_id,
            ConflictType::Redundant,
            Severity::Medium,
            format!(
                "Signatures sid:{} and sid:{} detect identical traffic ({header}) with action {}",
                rule.sid, other_rule.sid, rule.action
            ),
        ),
        Relation::Equal => Conflict::new(
            id,
            other_id,
            ConflictType::Contradiction,
            Severity::High,
            format!(
                "Signatures sid:{} ({}) and sid:{} ({}) detect identical traffic ({header}) with different actions",
                rule.sid, rule.action, other_rule.sid, other_rule.action
            ),
        ),
        relation @ (Relation::Subset | Relation::Superset) => {
            let (broad, narrow) = if relation == Relation::Subset {
                (other_rule.sid, rule.sid)
            } else {
                (rule.sid, other_rule.sid)
            };
            Conflict::new(
                id,
                other_id,
                ConflictType::Generalization,
                Severity::Medium,
                format!(
                    "Signature sid:{broad} matches everything sid:{narrow} matches on {header}"
                ),
            )
        }
        _ if ours.intersection(&theirs).next().is_some() => Conflict::new(
            id,
            other_id,
            ConflictType::Overlap,
            Severity::Low,
            format!(
                "Signatures sid:{} and sid:{} share detection options on {header}",
                rule.sid, other_rule.sid
            ),
        ),
        _ => {
            log::debug!("Signatures {id} and {other_id} do not overlap");
            return None;
        }
    };
    Some(conflict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{EvalOrder, RuleType, parse_rule};
    use rstest::rstest;

    fn ids(id: &str, content: &str) -> ParsedRule {
        ParsedRule {
            id: id.to_string(),
            order: EvalOrder::default(),
            enabled: true,
            content: content.to_string(),
            structured: parse_rule(RuleType::Ids, content).unwrap(),
        }
    }

    fn run(candidate: &ParsedRule, existing: &[ParsedRule]) -> Vec<Conflict> {
        match &candidate.structured {
            StructuredRule::Ids(rule) => detect(candidate, rule, existing),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_distinct_sids_without_overlap_do_not_conflict() {
        let a = ids(
            "a",
            r#"alert tcp any any -> $HOME_NET 80 (msg:"wp login"; content:"/wp-login.php"; sid:1001;)"#,
        );
        let b = ids(
            "b",
            r#"alert tcp any any -> $HOME_NET 80 (msg:"phpmyadmin"; content:"/phpmyadmin"; sid:1002;)"#,
        );
        assert!(run(&b, &[a]).is_empty());
    }

    #[rstest]
    #[case(r#"alert tcp any any -> any 80 (content:"x"; sid:1001;)"#)]
    #[case(r#"drop udp 10.0.0.0/8 any -> any 53 (dns.query; content:"evil"; sid:1001;)"#)]
    #[case(r#"pass icmp any any -> any any (sid:1001;)"#)]
    #[case(r#"alert tcp any any -> any 80 (gid:1; content:"x"; sid:1001;)"#)]
    fn test_duplicate_sid_is_always_critical(#[case] other: &str) {
        let existing = ids("existing", other);
        let candidate = ids(
            "candidate",
            r#"alert tcp any any -> $HOME_NET 22 (content:"SSH-"; sid:1001;)"#,
        );

        let conflicts = run(&candidate, &[existing]);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::DuplicateSid);
        assert_eq!(conflicts[0].severity, Severity::Critical);
        assert!(conflicts[0].recommendation.contains("duplicate SID"));
    }

    #[test]
    fn test_same_sid_under_other_generator_is_not_duplicate() {
        let existing = ids("preproc", r#"alert tcp any any -> any 80 (gid:116; content:"x"; sid:1001;)"#);
        let candidate = ids(
            "candidate",
            r#"alert tcp any any -> $HOME_NET 22 (content:"SSH-"; sid:1001;)"#,
        );

        assert!(run(&candidate, &[existing]).is_empty());
    }

    #[rstest]
    #[case("alert", "alert", ConflictType::Redundant, Severity::Medium)]
    #[case("alert", "drop", ConflictType::Contradiction, Severity::High)]
    #[case("pass", "drop", ConflictType::Contradiction, Severity::High)]
    fn test_identical_detection(
        #[case] existing_action: &str,
        #[case] candidate_action: &str,
        #[case] expected_type: ConflictType,
        #[case] expected_severity: Severity,
    ) {
        let existing = ids(
            "existing",
            &format!(r#"{existing_action} tcp any any -> any 443 (msg:"one"; tls.sni; content:"bad.example"; sid:2001;)"#),
        );
        let candidate = ids(
            "candidate",
            &format!(r#"{candidate_action} tcp any any -> any 443 (msg:"two"; tls.sni; content:"bad.example"; sid:2002; rev:3;)"#),
        );

        let conflicts = run(&candidate, &[existing]);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, expected_type);
        assert_eq!(conflicts[0].severity, expected_severity);
    }

    #[test]
    fn test_fewer_options_generalize() {
        let broad = ids("broad", r#"alert http any any -> any any (content:"/admin"; sid:3001;)"#);
        let narrow = ids(
            "narrow",
            r#"alert http any any -> any any (content:"/admin"; http.method; content:"POST"; sid:3002;)"#,
        );

        let conflicts = run(&narrow, &[broad]);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Generalization);
        assert!(conflicts[0].description.starts_with("Signature sid:3001"));
    }

    #[test]
    fn test_partial_overlap() {
        let a = ids("a", r#"alert http any any -> any any (content:"/admin"; content:"GET"; sid:1;)"#);
        let b = ids("b", r#"alert http any any -> any any (content:"/admin"; content:"POST"; sid:2;)"#);

        let conflicts = run(&b, &[a]);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Overlap);
        assert_eq!(conflicts[0].severity, Severity::Low);
    }

    #[test]
    fn test_different_header_does_not_conflict() {
        let a = ids("a", r#"alert tcp any any -> $HOME_NET any (content:"x"; sid:1;)"#);
        let b = ids("b", r#"alert tcp any any -> $DMZ_NET any (content:"x"; sid:2;)"#);
        assert!(run(&b, &[a]).is_empty());
    }
}
