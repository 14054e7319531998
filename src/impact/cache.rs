use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
    time::{Duration, Instant},
};

use async_trait::async_trait;

use super::{collector::MetricsCollector, metric::CollectedMetrics};
use crate::{error::RulewardError, rule::RuleType};

pub const DEFAULT_TTL: Duration = Duration::from_secs(180);

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub metrics: CollectedMetrics,
    pub expires_at: Instant,
}

/// Time-bounded table of collected metrics per rule type
#[derive(Debug)]
pub struct MetricsCache {
    ttl: Duration,
    entries: HashMap<RuleType, Entry>,
}

impl Default for MetricsCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl MetricsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached metrics for `rule_type` if they have not expired at `now`.
    pub fn get(&self, rule_type: RuleType, now: Instant) -> Option<CollectedMetrics> {
        self.entries
            .get(&rule_type)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.metrics)
    }

    /// Store metrics collected at `now`; they expire `ttl` later.
    pub fn insert(&mut self, rule_type: RuleType, metrics: CollectedMetrics, now: Instant) {
        self.entries.insert(
            rule_type,
            Entry {
                metrics,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Drop expired entries and return how many were removed
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decorator adding TTL caching to any `MetricsCollector`
///
/// Reads share a read lock; failures from the inner collector are not cached.
pub struct CachingCollector<C> {
    inner: C,
    cache: RwLock<MetricsCache>,
}

impl<C: MetricsCollector> CachingCollector<C> {
    pub fn new(inner: C, ttl: Duration) -> Self {
        Self {
            inner,
            cache: RwLock::new(MetricsCache::new(ttl)),
        }
    }
}

#[async_trait]
impl<C: MetricsCollector> MetricsCollector for CachingCollector<C> {
    async fn collect(&self, rule_type: RuleType) -> Result<CollectedMetrics, RulewardError> {
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(rule_type, Instant::now());
        if let Some(metrics) = cached {
            log::debug!("Metrics cache hit for {rule_type}");
            return Ok(metrics);
        }

        let metrics = self.inner.collect(rule_type).await?;

        let now = Instant::now();
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let purged = cache.purge_expired(now);
        if purged > 0 {
            log::debug!("Purged {purged} expired metrics cache entries");
        }
        cache.insert(rule_type, metrics, now);
        log::debug!(
            "Cached {rule_type} metrics for {}s ({} entries)",
            cache.ttl().as_secs(),
            cache.len()
        );
        Ok(metrics)
    }
}
