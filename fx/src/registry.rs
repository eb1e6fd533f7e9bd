//! Named source registry.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::SourceCache;
use crate::error::{FxError, FxResult};
use crate::graph::RateGraph;
use crate::source::RateSource;

/// Interval between scheduled refreshes, shared by every source.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);

struct SourceEntry {
    cache: Arc<SourceCache>,
    refresh_task: JoinHandle<()>,
}

/// Owns one cache/graph pair per registered source.
///
/// Populated at startup; never shrinks at runtime. Each source is an
/// independent unit of concurrency.
pub struct Registry {
    sources: DashMap<String, SourceEntry>,
    refresh_interval: Duration,
}

impl Registry {
    /// Create a registry with the default refresh interval.
    pub fn new() -> Self {
        Self::with_refresh_interval(DEFAULT_REFRESH_INTERVAL)
    }

    /// Create a registry with a custom refresh interval.
    pub fn with_refresh_interval(refresh_interval: Duration) -> Self {
        Self {
            sources: DashMap::new(),
            refresh_interval,
        }
    }

    /// Register a source under its adapter name and start its
    /// background refresh task.
    pub fn register(&self, source: Arc<dyn RateSource>) -> FxResult<()> {
        let name = source.name().to_string();
        let cache = Arc::new(SourceCache::new(name.clone(), source));

        match self.sources.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(FxError::DuplicateSource(name));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let refresh_task = cache.clone().spawn_refresh_task(self.refresh_interval);
                slot.insert(SourceEntry {
                    cache,
                    refresh_task,
                });
            }
        }

        info!(source = %name, "Registered source");
        Ok(())
    }

    /// Whether a source is registered under this name.
    pub fn has(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Drive the named source to Ready and return its graph.
    ///
    /// Blocks only while the source is genuinely Pending or already
    /// Refreshing.
    pub async fn ensure_fresh(&self, name: &str) -> FxResult<Arc<RateGraph>> {
        let cache = self
            .cache(name)
            .ok_or_else(|| FxError::UnknownSource(name.to_string()))?;
        cache.ensure_fresh().await
    }

    /// The named source's cache, for status and freshness inspection.
    pub fn cache(&self, name: &str) -> Option<Arc<SourceCache>> {
        self.sources.get(name).map(|entry| Arc::clone(&entry.cache))
    }

    /// Registered source names, sorted.
    pub fn sources(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Abort every background refresh task.
    pub fn shutdown(&self) {
        for entry in self.sources.iter() {
            entry.refresh_task.abort();
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStatus;
    use crate::source::MockRateSource;
    use fxrate_common::{time, Currency, RateQuad, SidePrices};
    use rust_decimal_macros::dec;

    fn mock_source(name: &str) -> Arc<MockRateSource> {
        let mock = Arc::new(MockRateSource::new(name));
        mock.set_quads(vec![RateQuad::new(
            Currency::cny(),
            Currency::usd(),
            time::now(),
        )
        .with_sell(SidePrices {
            cash: None,
            remit: Some(dec!(7.05)),
        })]);
        mock
    }

    #[tokio::test]
    async fn test_register_starts_pending() {
        let registry = Registry::with_refresh_interval(Duration::from_secs(3600));
        registry.register(mock_source("hsbc.cn")).unwrap();

        let cache = registry.cache("hsbc.cn").unwrap();
        // The background task may have begun its startup refresh, but
        // nothing can have completed yet without awaiting.
        assert_ne!(cache.status(), CacheStatus::Ready);
        assert!(cache.graph().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_source_rejected() {
        let registry = Registry::with_refresh_interval(Duration::from_secs(3600));
        registry.register(mock_source("hsbc.cn")).unwrap();

        let result = registry.register(mock_source("hsbc.cn"));
        assert!(matches!(result, Err(FxError::DuplicateSource(_))));
    }

    #[tokio::test]
    async fn test_unknown_source() {
        let registry = Registry::new();
        let result = registry.ensure_fresh("nonexistent").await;
        assert!(matches!(result, Err(FxError::UnknownSource(_))));
    }

    #[tokio::test]
    async fn test_ensure_fresh_returns_populated_graph() {
        let registry = Registry::with_refresh_interval(Duration::from_secs(3600));
        registry.register(mock_source("hsbc.cn")).unwrap();

        let graph = registry.ensure_fresh("hsbc.cn").await.unwrap();
        assert_eq!(graph.len(), 1);
    }

    #[tokio::test]
    async fn test_sources_listing_sorted() {
        let registry = Registry::with_refresh_interval(Duration::from_secs(3600));
        registry.register(mock_source("hsbc.hk")).unwrap();
        registry.register(mock_source("hsbc.cn")).unwrap();

        assert_eq!(registry.sources(), vec!["hsbc.cn", "hsbc.hk"]);
        assert!(registry.has("hsbc.cn"));
        assert!(!registry.has("boc.cn"));
    }
}
