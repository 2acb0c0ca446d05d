//! Page fetcher trait and the reqwest implementation.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};

/// A fetched HTTP response, body left undecoded so PDF and spreadsheet
/// bytes survive intact.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the response is HTML by content type.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false)
    }

    /// True when the response looks like a PDF.
    pub fn is_pdf(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("application/pdf"))
            .unwrap_or(false)
            || self.body.starts_with(b"%PDF")
    }

    /// Body decoded as text, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Fetches individual pages and documents over HTTP.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one URL with a bounded timeout.
    ///
    /// Non-success statuses are returned in the response, not as errors;
    /// callers decide whether a 404 is fatal for their phase.
    async fn get(&self, url: &str, timeout: Duration) -> FetchResult<FetchedResponse>;
}

/// Plain reqwest-backed fetcher with a browser-like user agent.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::limited(5))
                .build()
                .expect("Failed to create HTTP client"),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> FetchResult<FetchedResponse> {
        debug!(url = %url, "fetch starting");

        let parsed: reqwest::Url = url.parse().map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "fetch failed");
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Http(Box::new(e))
                }
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .bytes()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Http(Box::new(e))
                }
            })?
            .to_vec();

        Ok(FetchedResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_html() {
        let response = FetchedResponse {
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: b"<html></html>".to_vec(),
        };
        assert!(response.is_html());
        assert!(!response.is_pdf());
        assert!(response.is_success());
    }

    #[test]
    fn test_is_pdf_by_magic_bytes() {
        let response = FetchedResponse {
            status: 200,
            content_type: Some("application/octet-stream".to_string()),
            body: b"%PDF-1.7 ...".to_vec(),
        };
        assert!(response.is_pdf());
    }

    #[tokio::test]
    async fn test_unparseable_url_is_typed() {
        let fetcher = HttpFetcher::new();
        let err = fetcher
            .get("not a url", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[test]
    fn test_non_success_status() {
        let response = FetchedResponse {
            status: 404,
            content_type: None,
            body: Vec::new(),
        };
        assert!(!response.is_success());
    }
}
