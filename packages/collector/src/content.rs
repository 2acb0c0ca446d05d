//! Cached page and document content retrieval.
//!
//! Fetches a URL, extracts the visible text (plus a bounded number of
//! HTML tables, which often carry the actual numbers), and truncates
//! oversized content with an explicit marker, so content is never
//! silently dropped.

use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{cache_key, ResponseCache};
use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::PageFetcher;
use crate::types::config::CollectorConfig;

/// Marker appended whenever content is cut at a length limit.
pub const TRUNCATION_MARKER: &str = "\n[Content truncated]";

/// Fetches and extracts text content, with caching and bounded retries.
pub struct ContentFetcher {
    fetcher: Arc<dyn PageFetcher>,
    cache: ResponseCache<String>,
    page_timeout: Duration,
    document_timeout: Duration,
    retries: usize,
    page_max_chars: usize,
    pdf_max_chars: usize,
    max_tables: usize,
}

impl ContentFetcher {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &CollectorConfig) -> Self {
        Self {
            fetcher,
            cache: ResponseCache::new(config.page_cache_capacity, config.page_cache_ttl),
            page_timeout: config.page_timeout,
            document_timeout: config.document_timeout,
            retries: config.fetch_retries.max(1),
            page_max_chars: config.page_content_max_chars,
            pdf_max_chars: config.pdf_text_max_chars,
            max_tables: config.max_tables_per_page,
        }
    }

    /// Fetch a URL and return its extracted text.
    ///
    /// One failed fetch never aborts a batch; callers log the typed error
    /// and move on.
    pub async fn fetch_text(&self, url: &str) -> FetchResult<String> {
        let key = cache_key(&["content", url]);
        if let Some(text) = self.cache.get(&key) {
            debug!(url = %url, "content cache hit");
            return Ok(text);
        }

        let is_document = url.to_lowercase().ends_with(".pdf");
        let timeout = if is_document {
            self.document_timeout
        } else {
            self.page_timeout
        };

        let mut last_error: Option<FetchError> = None;
        for attempt in 0..self.retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(250 * attempt as u64)).await;
            }
            match self.fetcher.get(url, timeout).await {
                Ok(response) if response.is_success() => {
                    let text = if response.is_pdf() {
                        self.extract_pdf_text(url, &response.body)?
                    } else {
                        self.extract_page_text(&response.text())
                    };
                    self.cache.insert(key, text.clone());
                    return Ok(text);
                }
                Ok(response) => {
                    last_error = Some(FetchError::Status {
                        status: response.status,
                        url: url.to_string(),
                    });
                }
                Err(e) => {
                    debug!(url = %url, attempt, error = %e, "content fetch attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::Timeout {
            url: url.to_string(),
        }))
    }

    /// Visible text of an HTML page with chrome stripped, followed by a
    /// bounded number of tables rendered as rows.
    fn extract_page_text(&self, html: &str) -> String {
        let mut text = extract_visible_text(html);
        let tables = extract_tables(html, self.max_tables);
        if !tables.is_empty() {
            text.push_str("\n\n");
            text.push_str(&tables);
        }
        truncate_with_marker(text, self.page_max_chars)
    }

    fn extract_pdf_text(&self, url: &str, body: &[u8]) -> FetchResult<String> {
        match pdf_extract::extract_text_from_mem(body) {
            Ok(text) => {
                let cleaned = collapse_whitespace(&text);
                Ok(truncate_with_marker(cleaned, self.pdf_max_chars))
            }
            Err(e) => {
                warn!(url = %url, error = %e, "PDF text extraction failed");
                Err(FetchError::UnreadableDocument {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Truncate to `max_chars` on a char boundary, appending the marker.
pub fn truncate_with_marker(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Extract visible text, skipping script/style/nav/header/footer/aside.
fn extract_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let skip = Selector::parse("script, style, nav, footer, header, aside").unwrap();

    let skipped: std::collections::HashSet<_> = document
        .select(&skip)
        .flat_map(|el| el.descendants().map(|node| node.id()))
        .collect();

    let mut parts: Vec<&str> = Vec::new();
    for node in document.root_element().descendants() {
        if skipped.contains(&node.id()) {
            continue;
        }
        if let Some(text) = node.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
    }

    collapse_whitespace(&parts.join(" "))
}

/// Render up to `max_tables` HTML tables as pipe-separated rows.
fn extract_tables(html: &str, max_tables: usize) -> String {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td, th").unwrap();

    let mut rendered = Vec::new();
    for (index, table) in document.select(&table_selector).take(max_tables).enumerate() {
        let mut rows = Vec::new();
        for row in table.select(&row_selector) {
            let cells: Vec<String> = row
                .select(&cell_selector)
                .map(|cell| collapse_whitespace(&cell.text().collect::<String>()))
                .filter(|cell| !cell.is_empty())
                .collect();
            if !cells.is_empty() {
                rows.push(cells.join(" | "));
            }
        }
        if !rows.is_empty() {
            rendered.push(format!("[Table {}]\n{}", index + 1, rows.join("\n")));
        }
    }

    rendered.join("\n\n")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPageFetcher;

    fn content_fetcher(fetcher: MockPageFetcher) -> ContentFetcher {
        ContentFetcher::new(Arc::new(fetcher), &CollectorConfig::default())
    }

    #[test]
    fn test_visible_text_strips_chrome() {
        let html = r#"
            <html><head><script>var x = 1;</script><style>.a{}</style></head>
            <body>
              <nav>Menu items</nav>
              <main>Placement rate 95%</main>
              <footer>Copyright</footer>
            </body></html>
        "#;
        let text = extract_visible_text(html);
        assert!(text.contains("Placement rate 95%"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("Menu items"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_table_extraction_bounded() {
        let html = r#"
            <table><tr><th>Year</th><th>Placed</th></tr><tr><td>2025</td><td>95%</td></tr></table>
            <table><tr><td>Second</td></tr></table>
            <table><tr><td>Third</td></tr></table>
        "#;
        let tables = extract_tables(html, 2);
        assert!(tables.contains("Year | Placed"));
        assert!(tables.contains("2025 | 95%"));
        assert!(tables.contains("Second"));
        assert!(!tables.contains("Third"));
    }

    #[test]
    fn test_truncation_appends_marker() {
        let long = "x".repeat(50);
        let out = truncate_with_marker(long, 10);
        assert!(out.starts_with("xxxxxxxxxx"));
        assert!(out.ends_with(TRUNCATION_MARKER));

        let short = truncate_with_marker("short".to_string(), 10);
        assert!(!short.contains(TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn test_fetch_text_extracts_and_caches() {
        let fetcher = MockPageFetcher::new().with_html(
            "https://x.edu/placements",
            "<body><p>Median package 12 LPA</p></body>",
        );
        let calls = fetcher.call_log();
        let content = content_fetcher(fetcher);

        let first = content.fetch_text("https://x.edu/placements").await.unwrap();
        assert!(first.contains("Median package 12 LPA"));

        let _second = content.fetch_text("https://x.edu/placements").await.unwrap();
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_text_status_error_is_typed() {
        let fetcher =
            MockPageFetcher::new().with_page("https://x.edu/missing", 404, "text/html", Vec::new());
        let content = content_fetcher(fetcher);

        let err = content.fetch_text("https://x.edu/missing").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_unreadable_pdf_is_typed() {
        let fetcher = MockPageFetcher::new().with_page(
            "https://x.edu/broken.pdf",
            200,
            "application/pdf",
            b"%PDF-not really a pdf".to_vec(),
        );
        let content = content_fetcher(fetcher);

        let err = content.fetch_text("https://x.edu/broken.pdf").await.unwrap_err();
        assert!(matches!(err, FetchError::UnreadableDocument { .. }));
    }
}
