use thiserror::Error;

use std::path::PathBuf;

use serde::Serialize;

use crate::rule::RuleType;

/// Failure to turn raw rule text into a structured rule.
///
/// Local to a single rule: batch operations collect these per rule and keep going.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    #[error("invalid action '{action}' (expected one of {expected})")]
    InvalidAction { action: String, expected: String },

    #[error("missing or invalid sid: {reason}")]
    MissingOrInvalidSid { reason: String },

    #[error("rule content too short ({len} < {min} characters)")]
    TooShort { len: usize, min: usize },

    #[error("malformed rule: {reason}")]
    Malformed { reason: String },
}

impl ParseError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ParseError::Malformed {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RulewardError {
    #[error("failed to parse rule {rule_id}: {source}")]
    Parse {
        rule_id: String,
        #[source]
        source: ParseError,
    },

    #[error("unsupported rule type '{name}'")]
    UnsupportedRuleType { name: String },

    #[error("metrics unavailable for {rule_type} rules: {reason}")]
    MetricsUnavailable { rule_type: RuleType, reason: String },

    #[error("invalid analyzer configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("rule {id} not found in rule set")]
    UnknownRule { id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}
