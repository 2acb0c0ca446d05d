//! Cached search orchestration with retry and credential rotation.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{cache_key, ResponseCache};
use crate::error::{CollectError, ProviderError, Result};
use crate::keypool::{ApiKeyPool, KeyPoolStats};
use crate::sources;
use crate::traits::searcher::{ProviderHit, SearchProvider};
use crate::types::config::CollectorConfig;
use crate::types::report::SearchHit;

/// Issues search queries through a provider, filtering results down to
/// official sources sorted by priority.
///
/// Transient provider failures are retried with exponential backoff; a
/// definitive rejection rotates to the next credential in the pool and
/// retries immediately. An exhausted pool surfaces as
/// [`CollectError::AllCredentialsExhausted`].
pub struct Searcher {
    provider: Arc<dyn SearchProvider>,
    pool: Mutex<ApiKeyPool>,
    cache: ResponseCache<Vec<SearchHit>>,
    retries: usize,
    results_per_query: usize,
}

impl Searcher {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        pool: ApiKeyPool,
        config: &CollectorConfig,
    ) -> Self {
        Self {
            provider,
            pool: Mutex::new(pool),
            cache: ResponseCache::new(config.search_cache_capacity, config.search_cache_ttl),
            retries: config.search_retries.max(1),
            results_per_query: config.results_per_query,
        }
    }

    /// Run one query, returning official hits sorted by source priority.
    ///
    /// `own_domain` marks the institution's verified domain as official.
    pub async fn search(&self, query: &str, own_domain: Option<&str>) -> Result<Vec<SearchHit>> {
        let key = cache_key(&[
            "search",
            query,
            own_domain.unwrap_or(""),
            &self.results_per_query.to_string(),
        ]);
        if let Some(hits) = self.cache.get(&key) {
            debug!(query = %query, hits = hits.len(), "search cache hit");
            return Ok(hits);
        }

        let mut attempt = 0;
        loop {
            let api_key = {
                let pool = self.lock_pool();
                pool.current()
                    .cloned()
                    .ok_or(CollectError::AllCredentialsExhausted)?
            };

            match self
                .provider
                .search(query, self.results_per_query, api_key.expose())
                .await
            {
                Ok(raw) => {
                    self.lock_pool().mark_success();
                    let hits = filter_and_rank(raw, own_domain);
                    debug!(query = %query, hits = hits.len(), "search completed");
                    self.cache.insert(key, hits.clone());
                    return Ok(hits);
                }
                Err(ProviderError::Rejected) => {
                    // Rotation, not retry: the credential is dead.
                    self.lock_pool().mark_failed();
                }
                Err(e @ (ProviderError::Transient { .. } | ProviderError::MalformedResponse(_))) => {
                    attempt += 1;
                    if attempt >= self.retries {
                        warn!(query = %query, error = %e, "search retries exhausted");
                        return Err(e.into());
                    }
                    let backoff = Duration::from_millis(200 * (1 << attempt));
                    debug!(query = %query, attempt, backoff_ms = backoff.as_millis() as u64, "retrying search");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// Like [`search`](Self::search), but a non-credential failure
    /// degrades to an empty result instead of an error. Credential
    /// exhaustion still propagates so the run can stop searching.
    pub async fn search_or_empty(
        &self,
        query: &str,
        own_domain: Option<&str>,
    ) -> Result<Vec<SearchHit>> {
        match self.search(query, own_domain).await {
            Ok(hits) => Ok(hits),
            Err(CollectError::AllCredentialsExhausted) => {
                Err(CollectError::AllCredentialsExhausted)
            }
            Err(e) => {
                warn!(query = %query, error = %e, "search failed, continuing without results");
                Ok(Vec::new())
            }
        }
    }

    /// Credential pool usage counters.
    pub fn key_pool_stats(&self) -> KeyPoolStats {
        self.lock_pool().stats()
    }

    fn lock_pool(&self) -> std::sync::MutexGuard<'_, ApiKeyPool> {
        match self.pool.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Drop blocked and unofficial hits, classify the rest, sort by priority.
fn filter_and_rank(raw: Vec<ProviderHit>, own_domain: Option<&str>) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = raw
        .into_iter()
        .filter(|hit| sources::is_official(&hit.url, own_domain))
        .map(|hit| {
            let priority = sources::source_priority(&hit.url, own_domain);
            SearchHit::new(hit.title, hit.url.clone())
                .with_snippet(hit.snippet)
                .with_priority(priority)
                .with_source_type(sources::source_type(&hit.url))
        })
        .collect();
    hits.sort_by_key(|hit| hit.priority);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceType;
    use crate::testing::MockSearchProvider;

    fn fast_config() -> CollectorConfig {
        CollectorConfig::default()
    }

    fn searcher_with(provider: MockSearchProvider, keys: &[&str]) -> Searcher {
        Searcher::new(
            Arc::new(provider),
            ApiKeyPool::new(keys.iter().copied()),
            &fast_config(),
        )
    }

    fn official_hits() -> Vec<ProviderHit> {
        vec![
            ProviderHit::new("Aggregator", "https://collegedunia.com/x").with_snippet("blocked"),
            ProviderHit::new("College", "https://www.iitb.ac.in/placements").with_snippet("own"),
            ProviderHit::new("NIRF", "https://www.nirfindia.org/2025/x").with_snippet("rank"),
            ProviderHit::new("Random blog", "https://someblog.example.com/x"),
        ]
    }

    #[tokio::test]
    async fn test_search_filters_and_sorts() {
        let provider = MockSearchProvider::new().with_results("q", official_hits());
        let searcher = searcher_with(provider, &["k1"]);

        let hits = searcher.search("q", None).await.unwrap();
        assert_eq!(hits.len(), 2);
        // NIRF (priority 1) sorts before the academic domain (priority 2).
        assert_eq!(hits[0].source_type, SourceType::Nirf);
        assert_eq!(hits[1].url, "https://www.iitb.ac.in/placements");
    }

    #[tokio::test]
    async fn test_search_cache_avoids_second_provider_call() {
        let provider = MockSearchProvider::new().with_results("q", official_hits());
        let calls = provider.call_log();
        let searcher = searcher_with(provider, &["k1"]);

        let first = searcher.search("q", None).await.unwrap();
        let second = searcher.search("q", None).await.unwrap();

        assert_eq!(first.len(), second.len());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejection_rotates_credentials() {
        let provider = MockSearchProvider::new()
            .with_results("q", official_hits())
            .with_rejections(1);
        let calls = provider.call_log();
        let searcher = searcher_with(provider, &["bad-key", "good-key"]);

        let hits = searcher.search("q", None).await.unwrap();
        assert!(!hits.is_empty());

        let log = calls.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].api_key, "bad-key");
        assert_eq!(log[1].api_key, "good-key");
    }

    #[tokio::test]
    async fn test_pool_exhaustion_is_distinguishable() {
        let provider = MockSearchProvider::new().with_rejections(2);
        let searcher = searcher_with(provider, &["k1", "k2"]);

        let err = searcher.search("q", None).await.unwrap_err();
        assert!(matches!(err, CollectError::AllCredentialsExhausted));

        let stats = searcher.key_pool_stats();
        assert_eq!(stats.failed_keys, 2);
        assert_eq!(stats.active_keys, 0);
    }

    #[tokio::test]
    async fn test_transient_failures_retry_then_succeed() {
        let provider = MockSearchProvider::new()
            .with_results("q", official_hits())
            .with_transient_failures(2);
        let searcher = searcher_with(provider, &["k1"]);

        let hits = searcher.search("q", None).await.unwrap();
        assert!(!hits.is_empty());
        // The credential survived the transient failures.
        assert_eq!(searcher.key_pool_stats().failed_keys, 0);
    }

    #[tokio::test]
    async fn test_transient_exhaustion_degrades_to_empty() {
        let provider = MockSearchProvider::new().with_transient_failures(10);
        let searcher = searcher_with(provider, &["k1"]);

        let hits = searcher.search_or_empty("q", None).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_own_domain_counts_as_official() {
        let provider = MockSearchProvider::new().with_results(
            "q",
            vec![ProviderHit::new("College", "https://custom-college.org/nirf")],
        );
        let searcher = searcher_with(provider, &["k1"]);

        let without = searcher.search("q", None).await.unwrap();
        assert!(without.is_empty());

        // Different own_domain means a different cache key.
        let with = searcher.search("q", Some("custom-college.org")).await.unwrap();
        assert_eq!(with.len(), 1);
        assert_eq!(with[0].priority, 2);
    }
}
