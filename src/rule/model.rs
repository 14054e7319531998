use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{access::AccessControlRule, firewall::FirewallRule, ids::IdsRule};
use crate::error::RulewardError;

/// Rule family. Each family carries its own grammar and conflict semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Firewall,
    Ids,
    AccessControl,
}

impl RuleType {
    pub const ALL: [RuleType; 3] = [RuleType::Firewall, RuleType::Ids, RuleType::AccessControl];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Firewall => "firewall",
            RuleType::Ids => "ids",
            RuleType::AccessControl => "access_control",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = RulewardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firewall" => Ok(RuleType::Firewall),
            "ids" => Ok(RuleType::Ids),
            "access_control" | "access-control" | "accesscontrol" => Ok(RuleType::AccessControl),
            _ => Err(RulewardError::UnsupportedRuleType {
                name: s.to_string(),
            }),
        }
    }
}

/// Rule record as stored upstream. The core only borrows it for one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityRule {
    pub id: String,
    pub rule_type: RuleType,
    pub content: String,
    pub priority: i64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl SecurityRule {
    pub fn new(id: impl Into<String>, rule_type: RuleType, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rule_type,
            content: content.into(),
            priority: 0,
            enabled: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Position of a rule in the evaluation chain.
///
/// Supplied by the caller; the core never infers it from list position.
/// Lower `priority` evaluates first, `sequence` breaks ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct EvalOrder {
    pub priority: i64,
    pub sequence: u64,
}

impl EvalOrder {
    pub fn new(priority: i64, sequence: u64) -> Self {
        Self { priority, sequence }
    }

    pub fn evaluates_before(&self, other: &EvalOrder) -> bool {
        self < other
    }
}

/// Family-specific parsed form of a rule. Only exists for rules that parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructuredRule {
    Firewall(FirewallRule),
    Ids(IdsRule),
    AccessControl(AccessControlRule),
}

impl StructuredRule {
    pub fn rule_type(&self) -> RuleType {
        match self {
            StructuredRule::Firewall(_) => RuleType::Firewall,
            StructuredRule::Ids(_) => RuleType::Ids,
            StructuredRule::AccessControl(_) => RuleType::AccessControl,
        }
    }
}

/// A successfully parsed rule together with the identity and ordering
/// information conflict detection needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedRule {
    pub id: String,
    pub order: EvalOrder,
    pub enabled: bool,
    pub content: String,
    pub structured: StructuredRule,
}

impl ParsedRule {
    pub fn rule_type(&self) -> RuleType {
        self.structured.rule_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("firewall", RuleType::Firewall)]
    #[case("IDS", RuleType::Ids)]
    #[case(" access_control ", RuleType::AccessControl)]
    #[case("access-control", RuleType::AccessControl)]
    fn test_rule_type_from_str(#[case] input: &str, #[case] expected: RuleType) {
        assert_eq!(input.parse::<RuleType>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_rule_type_is_rejected() {
        let err = "waf".parse::<RuleType>().unwrap_err();
        assert!(matches!(err, RulewardError::UnsupportedRuleType { name } if name == "waf"));
    }

    #[test]
    fn test_eval_order_priority_before_sequence() {
        let high = EvalOrder::new(1, 9);
        let low = EvalOrder::new(2, 0);
        assert!(high.evaluates_before(&low));
        assert!(EvalOrder::new(1, 0).evaluates_before(&EvalOrder::new(1, 1)));
        assert!(!EvalOrder::new(1, 1).evaluates_before(&EvalOrder::new(1, 1)));
    }
}
