//! Test doubles for the crate's trait seams.
//!
//! Each mock records its calls behind an `Arc<Mutex<_>>` so tests can
//! assert on what was requested, not just what came back. Failure
//! behavior is scripted up front with builder methods and consumed one
//! call at a time.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{FetchResult, ProviderError, ProviderResult, Result};
use crate::traits::extractor::KpiExtractor;
use crate::traits::fetcher::{FetchedResponse, PageFetcher};
use crate::traits::searcher::{ProviderHit, SearchProvider};
use crate::types::report::{KpiResult, KpiSpec};

/// One recorded call to [`MockSearchProvider::search`].
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub query: String,
    pub num_results: usize,
    pub api_key: String,
}

/// Scripted [`SearchProvider`].
///
/// Queued failures are returned first, one per call; after the queue
/// drains, a call returns the results registered for its query, or an
/// empty list for an unregistered query.
#[derive(Default)]
pub struct MockSearchProvider {
    results: HashMap<String, Vec<ProviderHit>>,
    failures: Mutex<VecDeque<ProviderError>>,
    calls: Arc<Mutex<Vec<RecordedSearch>>>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register results for an exact query string.
    pub fn with_results(mut self, query: impl Into<String>, hits: Vec<ProviderHit>) -> Self {
        self.results.insert(query.into(), hits);
        self
    }

    /// Queue `count` credential rejections ahead of any success.
    pub fn with_rejections(self, count: usize) -> Self {
        {
            let mut failures = self.failures.lock().unwrap();
            for _ in 0..count {
                failures.push_back(ProviderError::Rejected);
            }
        }
        self
    }

    /// Queue `count` transient failures ahead of any success.
    pub fn with_transient_failures(self, count: usize) -> Self {
        {
            let mut failures = self.failures.lock().unwrap();
            for _ in 0..count {
                failures.push_back(ProviderError::Transient {
                    reason: "scripted transient failure".to_string(),
                });
            }
        }
        self
    }

    /// Handle to the call log; grab it before moving the mock into the
    /// code under test.
    pub fn call_log(&self) -> Arc<Mutex<Vec<RecordedSearch>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(
        &self,
        query: &str,
        num_results: usize,
        api_key: &str,
    ) -> ProviderResult<Vec<ProviderHit>> {
        self.calls.lock().unwrap().push(RecordedSearch {
            query: query.to_string(),
            num_results,
            api_key: api_key.to_string(),
        });

        if let Some(failure) = self.failures.lock().unwrap().pop_front() {
            return Err(failure);
        }

        Ok(self.results.get(query).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// One recorded call to [`MockPageFetcher::get`].
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    pub url: String,
    pub timeout: Duration,
}

/// Canned-response [`PageFetcher`]. Unregistered URLs come back as 404,
/// never as transport errors.
#[derive(Default)]
pub struct MockPageFetcher {
    pages: HashMap<String, FetchedResponse>,
    calls: Arc<Mutex<Vec<RecordedFetch>>>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a 200 HTML page.
    pub fn with_html(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.with_page(
            url,
            200,
            "text/html; charset=utf-8",
            html.into().into_bytes(),
        )
    }

    /// Register an arbitrary response.
    pub fn with_page(
        mut self,
        url: impl Into<String>,
        status: u16,
        content_type: impl Into<String>,
        body: Vec<u8>,
    ) -> Self {
        self.pages.insert(
            url.into(),
            FetchedResponse {
                status,
                content_type: Some(content_type.into()),
                body,
            },
        );
        self
    }

    pub fn call_log(&self) -> Arc<Mutex<Vec<RecordedFetch>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> FetchResult<FetchedResponse> {
        self.calls.lock().unwrap().push(RecordedFetch {
            url: url.to_string(),
            timeout,
        });

        Ok(self.pages.get(url).cloned().unwrap_or(FetchedResponse {
            status: 404,
            content_type: None,
            body: Vec::new(),
        }))
    }
}

/// One recorded call to [`MockKpiExtractor::extract`].
#[derive(Debug, Clone)]
pub struct RecordedExtraction {
    pub corpus: String,
    pub kpi_names: Vec<String>,
}

/// Canned-result [`KpiExtractor`].
#[derive(Default)]
pub struct MockKpiExtractor {
    results: Vec<KpiResult>,
    calls: Arc<Mutex<Vec<RecordedExtraction>>>,
}

impl MockKpiExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(mut self, results: Vec<KpiResult>) -> Self {
        self.results = results;
        self
    }

    pub fn call_log(&self) -> Arc<Mutex<Vec<RecordedExtraction>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl KpiExtractor for MockKpiExtractor {
    async fn extract(&self, corpus: &str, specs: &[KpiSpec]) -> Result<Vec<KpiResult>> {
        self.calls.lock().unwrap().push(RecordedExtraction {
            corpus: corpus.to_string(),
            kpi_names: specs.iter().map(|s| s.name.clone()).collect(),
        });
        Ok(self.results.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::report::Confidence;

    #[tokio::test]
    async fn test_search_provider_consumes_failures_then_succeeds() {
        let provider = MockSearchProvider::new()
            .with_results("q", vec![ProviderHit::new("t", "https://x.ac.in/p")])
            .with_rejections(1);

        assert!(matches!(
            provider.search("q", 10, "k").await,
            Err(ProviderError::Rejected)
        ));
        let hits = provider.search("q", 10, "k").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(provider.call_log().lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_page_fetcher_unknown_url_is_404() {
        let fetcher = MockPageFetcher::new();
        let response = fetcher
            .get("https://nowhere.example", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_extractor_records_corpus_and_specs() {
        let extractor = MockKpiExtractor::new().with_results(vec![KpiResult {
            kpi_name: "Placement Rate".to_string(),
            value: Some("95%".to_string()),
            evidence_quote: None,
            source_url: None,
            confidence: Confidence::High,
        }]);
        let calls = extractor.call_log();

        let specs = vec![KpiSpec::new("Placement Rate")];
        let results = extractor.extract("corpus text", &specs).await.unwrap();

        assert_eq!(results[0].value.as_deref(), Some("95%"));
        let log = calls.lock().unwrap();
        assert_eq!(log[0].corpus, "corpus text");
        assert_eq!(log[0].kpi_names, vec!["Placement Rate"]);
    }
}
