use crate::rule::RuleType;

/// A regulatory framework that applies to a rule family, with how strictly it
/// weighs security weaknesses of that family (0-1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framework {
    pub name: &'static str,
    pub weight: f64,
}

const FIREWALL: &[Framework] = &[
    Framework { name: "PCI-DSS", weight: 0.9 },
    Framework { name: "ISO 27001", weight: 0.7 },
    Framework { name: "NIST 800-53", weight: 0.8 },
];

const IDS: &[Framework] = &[
    Framework { name: "PCI-DSS", weight: 0.8 },
    Framework { name: "NIST 800-53", weight: 0.9 },
    Framework { name: "HIPAA", weight: 0.6 },
];

const ACCESS_CONTROL: &[Framework] = &[
    Framework { name: "GDPR", weight: 0.9 },
    Framework { name: "SOX", weight: 0.8 },
    Framework { name: "HIPAA", weight: 0.8 },
    Framework { name: "ISO 27001", weight: 0.7 },
];

pub fn frameworks(rule_type: RuleType) -> &'static [Framework] {
    match rule_type {
        RuleType::Firewall => FIREWALL,
        RuleType::Ids => IDS,
        RuleType::AccessControl => ACCESS_CONTROL,
    }
}

/// Weight of the strictest applicable framework
pub fn strictest_weight(rule_type: RuleType) -> f64 {
    frameworks(rule_type)
        .iter()
        .map(|f| f.weight)
        .fold(0.0, f64::max)
}

pub fn mean_weight(rule_type: RuleType) -> f64 {
    let table = frameworks(rule_type);
    if table.is_empty() {
        return 0.0;
    }
    table.iter().map(|f| f.weight).sum::<f64>() / table.len() as f64
}
