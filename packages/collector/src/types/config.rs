//! Configuration for the collection pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a collection run.
///
/// Defaults are tuned for Indian institutional websites: deep enough to
/// reach campus-specific ranking pages, bounded enough to finish within
/// a caller-level time budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Maximum crawl depth (0 = only the starting page).
    ///
    /// 4 reaches nested pages like homepage -> campus -> rankings -> PDFs.
    pub max_depth: usize,

    /// Maximum number of URLs to discover during crawling.
    pub max_urls: usize,

    /// Safety bound on pages actually visited, independent of discoveries.
    pub max_visited_pages: usize,

    /// The ranking year treated as current; year filtering and score
    /// bonuses pin to this.
    pub target_year: i32,

    /// Numeric attachment ID above which a CMS document path is treated
    /// as recently uploaded.
    pub attachment_id_threshold: u64,

    /// Minimum official source count required before extraction is
    /// worthwhile.
    pub min_sources: usize,

    /// Timeout for search API calls.
    pub search_timeout: Duration,

    /// Timeout for HTML page fetches.
    pub page_timeout: Duration,

    /// Timeout for document (PDF/spreadsheet) downloads.
    pub document_timeout: Duration,

    /// Retry attempts for a transient search failure.
    pub search_retries: usize,

    /// Retry attempts for a failed page fetch.
    pub fetch_retries: usize,

    /// Results requested per search query.
    pub results_per_query: usize,

    /// Concurrent workers for page crawling.
    pub crawl_concurrency: usize,

    /// Concurrent workers for per-KPI searches.
    pub search_concurrency: usize,

    /// Politeness rate for crawl requests, per second.
    pub requests_per_second: u32,

    /// Search cache policy: shorter TTL, larger capacity.
    pub search_cache_capacity: usize,
    pub search_cache_ttl: Duration,

    /// Page cache policy: longer TTL, smaller capacity.
    pub page_cache_capacity: usize,
    pub page_cache_ttl: Duration,

    /// Per-page character cap before truncation.
    pub page_content_max_chars: usize,

    /// Extracted PDF text character cap before truncation.
    pub pdf_text_max_chars: usize,

    /// Maximum HTML tables extracted per page.
    pub max_tables_per_page: usize,

    /// Hard cap on the assembled corpus, in characters.
    pub max_corpus_chars: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_urls: 1000,
            max_visited_pages: 2000,
            target_year: 2025,
            attachment_id_threshold: 6000,
            min_sources: 3,
            search_timeout: Duration::from_secs(30),
            page_timeout: Duration::from_secs(15),
            document_timeout: Duration::from_secs(30),
            search_retries: 3,
            fetch_retries: 2,
            results_per_query: 10,
            crawl_concurrency: 3,
            search_concurrency: 8,
            requests_per_second: 12,
            search_cache_capacity: 500,
            search_cache_ttl: Duration::from_secs(60 * 60),
            page_cache_capacity: 200,
            page_cache_ttl: Duration::from_secs(6 * 60 * 60),
            page_content_max_chars: 15_000,
            pdf_text_max_chars: 20_000,
            max_tables_per_page: 5,
            max_corpus_chars: 100_000,
        }
    }
}

impl CollectorConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum crawl depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set maximum discovered URLs.
    pub fn with_max_urls(mut self, max: usize) -> Self {
        self.max_urls = max;
        self
    }

    /// Set the target ranking year.
    pub fn with_target_year(mut self, year: i32) -> Self {
        self.target_year = year;
        self
    }

    /// Set the minimum-source threshold.
    pub fn with_min_sources(mut self, min: usize) -> Self {
        self.min_sources = min;
        self
    }

    /// Set the corpus size limit in characters.
    pub fn with_max_corpus_chars(mut self, max: usize) -> Self {
        self.max_corpus_chars = max;
        self
    }

    /// Set the attachment ID recency threshold.
    pub fn with_attachment_id_threshold(mut self, threshold: u64) -> Self {
        self.attachment_id_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::default();
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.target_year, 2025);
        assert_eq!(config.min_sources, 3);
        assert!(config.search_cache_capacity > config.page_cache_capacity);
        assert!(config.page_cache_ttl > config.search_cache_ttl);
    }

    #[test]
    fn test_builders() {
        let config = CollectorConfig::new()
            .with_max_depth(2)
            .with_target_year(2026)
            .with_min_sources(5);
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.target_year, 2026);
        assert_eq!(config.min_sources, 5);
    }
}
