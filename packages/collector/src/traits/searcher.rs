//! Search provider trait and the Serper implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};

/// A raw search result as returned by the provider, before source
/// filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl ProviderHit {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: String::new(),
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }
}

/// A web search API.
///
/// Implementations must distinguish a definitive credential rejection
/// (`ProviderError::Rejected`) from everything else: rejection triggers
/// key rotation, transient failures trigger backoff retry.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one search query with the given credential.
    async fn search(
        &self,
        query: &str,
        num_results: usize,
        api_key: &str,
    ) -> ProviderResult<Vec<ProviderHit>>;

    /// Provider name for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Serper.dev search provider, scoped to Indian results.
pub struct SerperProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl Default for SerperProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SerperProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            endpoint: "https://google.serper.dev/search".to_string(),
        }
    }

    /// Override the endpoint, mainly for tests against a local server.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Debug, Deserialize)]
struct SerperOrganic {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl SearchProvider for SerperProvider {
    async fn search(
        &self,
        query: &str,
        num_results: usize,
        api_key: &str,
    ) -> ProviderResult<Vec<ProviderHit>> {
        debug!(query = %query, num = num_results, "search request");

        let payload = json!({
            "q": query,
            "num": num_results,
            "gl": "in",
            "hl": "en",
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                warn!(query = %query, error = %e, "search request failed");
                ProviderError::Transient {
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            // Definitive rejection of the credential, not a retry case.
            return Err(ProviderError::Rejected);
        }
        if !status.is_success() {
            return Err(ProviderError::Transient {
                reason: format!("HTTP {}", status),
            });
        }

        let body: SerperResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(Box::new(e)))?;

        Ok(body
            .organic
            .into_iter()
            .filter(|r| !r.link.is_empty())
            .map(|r| ProviderHit {
                title: r.title,
                url: r.link,
                snippet: r.snippet,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "serper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_hit_builder() {
        let hit = ProviderHit::new("IIT Bombay", "https://www.iitb.ac.in")
            .with_snippet("Official website");
        assert_eq!(hit.url, "https://www.iitb.ac.in");
        assert_eq!(hit.snippet, "Official website");
    }

    #[test]
    fn test_serper_response_parsing() {
        let raw = r#"{
            "organic": [
                {"title": "NIRF 2025", "link": "https://nirfindia.org/2025", "snippet": "Rankings"},
                {"title": "no link"}
            ],
            "knowledgeGraph": {"title": "ignored"}
        }"#;
        let parsed: SerperResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.organic.len(), 2);
        assert_eq!(parsed.organic[0].link, "https://nirfindia.org/2025");
        assert!(parsed.organic[1].link.is_empty());
    }

    #[test]
    fn test_serper_response_missing_organic() {
        let parsed: SerperResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.organic.is_empty());
    }
}
