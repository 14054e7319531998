use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    Redundant,
    Shadowing,
    Contradiction,
    Generalization,
    /// Partially intersecting IDS detections
    Overlap,
    DuplicateSid,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::Redundant => "redundant",
            ConflictType::Shadowing => "shadowing",
            ConflictType::Contradiction => "contradiction",
            ConflictType::Generalization => "generalization",
            ConflictType::Overlap => "overlap",
            ConflictType::DuplicateSid => "duplicate_sid",
        }
    }

    /// Generic guidance attached to every conflict of this type
    pub fn recommendation(&self) -> &'static str {
        match self {
            ConflictType::Redundant => "Merge redundant rules: keep one and remove the duplicate.",
            ConflictType::Shadowing => {
                "Reorder to avoid shadowing: move the narrower rule before the broader one, or remove it."
            }
            ConflictType::Contradiction => {
                "Resolve the contradiction: decide which action applies and remove the other rule."
            }
            ConflictType::Generalization => {
                "Review the generalization: confirm the broader rule is meant to catch what the narrower one leaves."
            }
            ConflictType::Overlap => {
                "Review overlapping detections: narrow one signature or merge them to avoid duplicate alerts."
            }
            ConflictType::DuplicateSid => {
                "Resolve duplicate SID: assign a unique sid to one of the signatures."
            }
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// A logical conflict between a candidate rule (`rule1_id`) and an existing
/// rule (`rule2_id`). Transient; persisting it is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub rule1_id: String,
    pub rule2_id: String,
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
    pub resolved: bool,
}

impl Conflict {
    pub fn new(
        rule1_id: &str,
        rule2_id: &str,
        conflict_type: ConflictType,
        severity: Severity,
        description: String,
    ) -> Self {
        Self {
            rule1_id: rule1_id.to_string(),
            rule2_id: rule2_id.to_string(),
            conflict_type,
            severity,
            description,
            recommendation: conflict_type.recommendation().to_string(),
            resolved: false,
        }
    }

    /// Replace the generic recommendation with a more specific one
    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} between {} and {}: {}",
            self.severity, self.conflict_type, self.rule1_id, self.rule2_id, self.description
        )
    }
}
