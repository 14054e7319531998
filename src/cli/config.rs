use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::RulewardError,
    impact::{AnalyzerConfig, CollectedMetrics, StaticMetricsCollector, cache::DEFAULT_TTL},
    rule::{RuleType, SecurityRule},
};

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Static metric snapshots keyed by rule type name
    #[serde(default)]
    pub metrics: BTreeMap<String, CollectedMetrics>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Lifetime of collected metrics in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL.as_secs()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl ConfigFile {
    /// Load configuration file
    pub fn load(path: &Path) -> Result<Self, RulewardError> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| RulewardError::ConfigParse {
            path: PathBuf::from(path),
            source,
        })
    }

    /// Build a collector serving the configured metric snapshots
    pub fn collector(&self) -> Result<StaticMetricsCollector, RulewardError> {
        let mut collector = StaticMetricsCollector::default();
        for (name, metrics) in &self.metrics {
            collector.insert(name.parse()?, *metrics);
        }
        Ok(collector)
    }
}

/// Rule set file: one `[[rule]]` table per rule
#[derive(Debug, Deserialize, Default)]
pub struct RuleSetFile {
    #[serde(default)]
    pub rule: Vec<RuleRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RuleRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    pub content: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// RFC 3339 timestamp, given as a string
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_enabled() -> bool {
    true
}

impl RuleRecord {
    fn into_rule(self) -> Result<SecurityRule, RulewardError> {
        let rule_type: RuleType = self.rule_type.parse()?;
        Ok(SecurityRule::new(self.id, rule_type, self.content)
            .with_priority(self.priority)
            .with_enabled(self.enabled)
            .with_created_at(self.created_at.unwrap_or_default()))
    }
}

impl RuleSetFile {
    pub fn load(path: &Path) -> Result<Self, RulewardError> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| RulewardError::ConfigParse {
            path: PathBuf::from(path),
            source,
        })
    }

    /// Convert records to rules in insertion order
    ///
    /// Rules are ordered by `created_at` (missing timestamps first), then by
    /// position in the file. Duplicate ids are rejected.
    pub fn into_rules(self) -> Result<Vec<SecurityRule>, RulewardError> {
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(self.rule.len());
        for record in self.rule {
            if !seen.insert(record.id.clone()) {
                return Err(RulewardError::InvalidConfig {
                    reason: format!("duplicate rule id '{}'", record.id),
                });
            }
            rules.push(record.into_rule()?);
        }
        rules.sort_by_key(|rule| rule.created_at);
        Ok(rules)
    }
}
