use super::model::{Conflict, ConflictType, Severity};
use crate::rule::{ParsedRule, Relation, StructuredRule, firewall::FirewallRule};

pub(super) fn detect(
    candidate: &ParsedRule,
    rule: &FirewallRule,
    existing: &[ParsedRule],
) -> Vec<Conflict> {
    existing
        .iter()
        .filter(|other| other.enabled && other.id != candidate.id)
        .filter_map(|other| match &other.structured {
            StructuredRule::Firewall(other_rule) => classify(candidate, rule, other, other_rule),
            _ => None,
        })
        .collect()
}

/// Classify one pair. `candidate`/`rule` is the rule under test, `other`/`other_rule`
/// an existing rule of the same chain.
fn classify(
    candidate: &ParsedRule,
    rule: &FirewallRule,
    other: &ParsedRule,
    other_rule: &FirewallRule,
) -> Option<Conflict> {
    if !rule.shares_chain(other_rule) {
        return None;
    }

    let relation = rule.predicate.relation(&other_rule.predicate);
    let candidate_first = candidate.order.evaluates_before(&other.order);
    let same_action = rule.action == other_rule.action;
    let (id, other_id) = (candidate.id.as_str(), other.id.as_str());

    let conflict = match relation {
        Relation::Equal if same_action => Conflict::new(
            id,
            other_id,
            ConflictType::Redundant,
            Severity::Low,
            format!(
                "Rules {id} and {other_id} match identical traffic ({}) with the same action {}",
                rule.predicate, rule.action
            ),
        ),
        Relation::Equal => {
            let severity = if rule.action.is_accept_drop_pair(&other_rule.action) {
                Severity::Critical
            } else {
                Severity::High
            };
            Conflict::new(
                id,
                other_id,
                ConflictType::Contradiction,
                severity,
                format!(
                    "Rules {id} ({}) and {other_id} ({}) match identical traffic ({}) with conflicting actions",
                    rule.action, other_rule.action, rule.predicate
                ),
            )
        }
        // A broad LOG rule earlier in the chain does not stop evaluation
        Relation::Subset if !candidate_first && other_rule.action.is_terminal() => {
            shadowing(other, other_rule, candidate, rule)
        }
        Relation::Superset if candidate_first && rule.action.is_terminal() => {
            shadowing(candidate, rule, other, other_rule)
        }
        Relation::Subset => generalization(candidate, rule, other, other_rule),
        Relation::Superset => generalization(other, other_rule, candidate, rule),
        Relation::Overlap | Relation::Disjoint => {
            log::debug!("No conflict between {id} and {other_id} ({relation:?})");
            return None;
        }
    };

    // Always report from the candidate's point of view
    Some(Conflict {
        rule1_id: id.to_string(),
        rule2_id: other_id.to_string(),
        ..conflict
    })
}

/// `broad` evaluates first and captures everything `narrow` would match.
fn shadowing(
    broad: &ParsedRule,
    broad_rule: &FirewallRule,
    narrow: &ParsedRule,
    narrow_rule: &FirewallRule,
) -> Conflict {
    let description = format!(
        "Rule {} ({}) is unreachable: earlier rule {} ({}) already matches all of its traffic with {}",
        narrow.id, narrow_rule.predicate, broad.id, broad_rule.predicate, broad_rule.action
    );
    let conflict = Conflict::new(
        &narrow.id,
        &broad.id,
        ConflictType::Shadowing,
        Severity::High,
        description,
    );
    if broad_rule.action == narrow_rule.action {
        conflict.with_recommendation(format!(
            "Remove rule {}: rule {} already applies {} to all of its traffic.",
            narrow.id, broad.id, broad_rule.action
        ))
    } else {
        conflict.with_recommendation(format!(
            "Reorder to avoid shadowing: move rule {} before rule {} or remove it.",
            narrow.id, broad.id
        ))
    }
}

/// `broad` matches everything `narrow` does without making it unreachable.
fn generalization(
    narrow: &ParsedRule,
    narrow_rule: &FirewallRule,
    broad: &ParsedRule,
    broad_rule: &FirewallRule,
) -> Conflict {
    let description = format!(
        "Rule {} ({}) generalizes rule {} ({})",
        broad.id, broad_rule.predicate, narrow.id, narrow_rule.predicate
    );
    let conflict = Conflict::new(
        &broad.id,
        &narrow.id,
        ConflictType::Generalization,
        Severity::Medium,
        description,
    );
    if broad_rule.action == narrow_rule.action {
        conflict.with_recommendation(format!(
            "Rule {} is covered by the broader rule {} with the same action {}; consider removing it.",
            narrow.id, broad.id, broad_rule.action
        ))
    } else {
        conflict
    }
}
