//! Website document discovery.
//!
//! Three discovery passes over an institution's website: a bounded BFS
//! crawl, a sitemap probe, and document-link harvesting inside
//! already-discovered high-score pages. Ranking pages can be nested
//! (homepage -> campus page -> rankings page -> PDFs), so the crawl goes
//! deeper than a generic site crawl would.

use governor::{Quota, RateLimiter};
use regex::Regex;
use std::collections::{HashSet, VecDeque};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::classify::IGNORED_PATTERNS;
use crate::error::{CollectError, Result};
use crate::traits::fetcher::PageFetcher;
use crate::types::config::CollectorConfig;
use crate::types::document::{CandidateDocument, DiscoverySource, DocType, RankCategory};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Extensions treated as leaf documents, never enqueued for crawling.
const DOC_EXTENSIONS: &[&str] = &[".pdf", ".xlsx", ".xls", ".doc", ".docx"];

/// High-confidence URL substrings.
const DIRECT_INDICATORS: &[&str] = &[
    "nirf",
    "ranking",
    "national rank",
    "india rank",
    "engineering.pdf",
    "overall.pdf",
    "management.pdf",
    "pharmacy.pdf",
    "innovation.pdf",
];

/// Keyword substrings matched against the normalized URL.
const RELEVANCE_KEYWORDS: &[&str] = &[
    "nirf 2025",
    "nirf",
    "ranking",
    "rankings",
    "national ranking",
    "india rankings",
    "nirf data",
    "nirf submission",
    "nirf report",
    "nirf metrics",
    "nirf score",
    "overall ranking",
    "engineering ranking",
    "management ranking",
    "nirf rank",
    "ranked",
    "rank india",
    "india rank",
    "nirf india",
    "mhrd ranking",
    "ministry ranking",
    "national institutional ranking",
    "institutional ranking framework",
];

/// Regex patterns matched against the normalized URL.
const RELEVANCE_PATTERNS: &[&str] = &[
    r"nirf",
    r"rankings?",
    r"national.*rank",
    r"india.*rank",
    r"rank.*india",
    r"data.*template",
    r"metrics.*report",
    r"institutional.*ranking",
    r"mhrd.*rank",
];

const SITEMAP_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap/sitemap.xml",
    "/wp-sitemap.xml",
];

/// Ranking portal category pages probed for the institution's name.
const PORTAL_CATEGORY_PAGES: &[(&str, RankCategory)] = &[
    ("OverallRanking.html", RankCategory::Overall),
    ("EngineeringRanking.html", RankCategory::Engineering),
    ("ManagementRanking.html", RankCategory::Management),
    ("PharmacyRanking.html", RankCategory::Pharmacy),
];

/// Discovers candidate document URLs on an institution's website.
pub struct DocumentScanner {
    fetcher: Arc<dyn PageFetcher>,
    limiter: Arc<DefaultRateLimiter>,
    max_depth: usize,
    max_urls: usize,
    max_visited: usize,
    page_timeout: Duration,
    target_year: i32,
    attachment_id_threshold: u64,
    relevance_patterns: Vec<Regex>,
    attachment_pattern: Regex,
    href_pattern: Regex,
    src_pattern: Regex,
}

impl DocumentScanner {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &CollectorConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second.max(1))
                .expect("requests_per_second must be > 0"),
        );
        Self {
            fetcher,
            limiter: Arc::new(RateLimiter::direct(quota)),
            max_depth: config.max_depth,
            max_urls: config.max_urls,
            max_visited: config.max_visited_pages,
            page_timeout: config.page_timeout,
            target_year: config.target_year,
            attachment_id_threshold: config.attachment_id_threshold,
            relevance_patterns: RELEVANCE_PATTERNS
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect(),
            attachment_pattern: Regex::new(r"/(?:attachments|document)/(\d+)(?:/|$)").unwrap(),
            href_pattern: Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).unwrap(),
            src_pattern: Regex::new(r#"(?i)src\s*=\s*["']([^"']+)["']"#).unwrap(),
        }
    }

    /// BFS crawl from `root`, collecting relevant URLs.
    ///
    /// A link found on a page at depth `d` counts as depth `d + 1`; it is
    /// only recorded when that stays within the depth budget, so lowering
    /// `max_depth` never leaks deeper documents into the result.
    pub async fn scan(&self, root: &str) -> Result<HashSet<String>> {
        let base_url = Url::parse(root).map_err(|_| CollectError::InvalidUrl {
            url: root.to_string(),
        })?;
        let base_domain = registrable_host(&base_url);

        info!(
            root = %root,
            max_depth = self.max_depth,
            max_urls = self.max_urls,
            "site scan starting"
        );

        let mut discovered: HashSet<String> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((root.to_string(), 0));

        while let Some((url, depth)) = queue.pop_front() {
            if discovered.len() >= self.max_urls || visited.len() >= self.max_visited {
                break;
            }
            if visited.contains(&url) {
                continue;
            }
            visited.insert(url.clone());

            self.limiter.until_ready().await;

            let response = match self.fetcher.get(&url, self.page_timeout).await {
                Ok(response) => response,
                Err(e) => {
                    debug!(url = %url, error = %e, "crawl fetch failed");
                    continue;
                }
            };
            if !response.is_success() {
                continue;
            }

            if !response.is_html() {
                // Leaf document reached directly.
                if self.is_relevant(&url) {
                    discovered.insert(url);
                }
                continue;
            }

            if depth >= self.max_depth {
                continue;
            }

            let html = response.text();
            for link in self.extract_urls(&html, &url, &base_domain) {
                if !self.is_relevant(&link) {
                    continue;
                }
                discovered.insert(link.clone());
                if !has_doc_extension(&link) && !visited.contains(&link) {
                    queue.push_back((link, depth + 1));
                }
            }
        }

        info!(
            root = %root,
            discovered = discovered.len(),
            visited = visited.len(),
            "site scan completed"
        );
        Ok(discovered)
    }

    /// Probe the common sitemap locations, returning the first non-empty
    /// URL set. Parse failures fall back to a regex scan, never an error.
    pub async fn fetch_sitemap_urls(&self, root: &str) -> HashSet<String> {
        let base = match Url::parse(root) {
            Ok(url) => match url.host_str() {
                Some(host) => format!("{}://{}", url.scheme(), host),
                None => return HashSet::new(),
            },
            Err(_) => return HashSet::new(),
        };

        for path in SITEMAP_PATHS {
            let sitemap_url = format!("{}{}", base, path);
            self.limiter.until_ready().await;

            let response = match self.fetcher.get(&sitemap_url, self.page_timeout).await {
                Ok(response) if response.is_success() => response,
                Ok(_) | Err(_) => continue,
            };

            let urls = parse_sitemap(&response.text());
            if !urls.is_empty() {
                debug!(sitemap = %sitemap_url, urls = urls.len(), "sitemap parsed");
                return urls;
            }
        }

        HashSet::new()
    }

    /// Keep only relevant URLs from a raw set (e.g., a sitemap).
    pub fn filter_relevant(&self, urls: HashSet<String>) -> HashSet<String> {
        urls.into_iter().filter(|u| self.is_relevant(u)).collect()
    }

    /// Fetch high-score HTML pages and harvest document links from them.
    ///
    /// Returns `(url, inferred_year)` pairs; the year comes from the
    /// referring page, for documents whose own URL carries none.
    pub async fn discover_documents_in_pages(
        &self,
        pages: &[CandidateDocument],
        root: &str,
    ) -> Vec<(String, Option<i32>)> {
        let base_domain = match Url::parse(root) {
            Ok(url) => registrable_host(&url),
            Err(_) => return Vec::new(),
        };

        let doc_patterns: Vec<Regex> = [
            r#"(?i)href=["']([^"']*/[^"']*\.pdf)["']"#,
            r#"(?i)href=["']([^"']*/attachments/[^"']*\.pdf)["']"#,
            r#"(?i)href=["']([^"']*/document/[^"']*\.pdf)["']"#,
            r#"(?i)href=["']([^"']*/uploads/[^"']*\.pdf)["']"#,
            r#"(?i)href=["']([^"']*/wp-content/[^"']*\.pdf)["']"#,
            r#"(?i)href=["']([^"']*\.xlsx?)["']"#,
            r#"(?i)href=["']([^"']*/nirf[^"']*\.pdf)["']"#,
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect();

        let mut results: Vec<(String, Option<i32>)> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for page in pages {
            self.limiter.until_ready().await;

            let response = match self.fetcher.get(&page.url, self.page_timeout).await {
                Ok(response) if response.is_success() => response,
                Ok(_) => continue,
                Err(e) => {
                    debug!(url = %page.url, error = %e, "page fetch failed");
                    continue;
                }
            };
            let html = response.text();

            let page_base = match Url::parse(&page.url) {
                Ok(url) => url,
                Err(_) => continue,
            };

            for pattern in &doc_patterns {
                for cap in pattern.captures_iter(&html) {
                    let Some(matched) = cap.get(1) else { continue };
                    let Ok(abs_url) = page_base.join(matched.as_str()) else {
                        continue;
                    };
                    if registrable_host(&abs_url) != base_domain {
                        continue;
                    }
                    let abs = abs_url.to_string();
                    if seen.contains(&abs) {
                        continue;
                    }
                    if self.looks_like_ranking_document(&abs) {
                        seen.insert(abs.clone());
                        debug!(url = %abs, parent_year = ?page.year, "document link found");
                        results.push((abs, page.year));
                    }
                }
            }
        }

        info!(documents = results.len(), "document harvesting completed");
        results
    }

    /// Probe the national ranking portal's category pages and record the
    /// ones that mention the institution.
    pub async fn probe_ranking_portal(&self, institution: &str) -> Vec<CandidateDocument> {
        let needle = institution.to_lowercase();
        let mut documents = Vec::new();

        for (page, category) in PORTAL_CATEGORY_PAGES {
            let url = format!(
                "https://www.nirfindia.org/{}/{}",
                self.target_year, page
            );
            self.limiter.until_ready().await;

            let response = match self.fetcher.get(&url, self.page_timeout).await {
                Ok(response) if response.is_success() => response,
                Ok(_) => continue,
                Err(e) => {
                    debug!(url = %url, error = %e, "portal probe failed");
                    continue;
                }
            };

            if response.text().to_lowercase().contains(&needle) {
                info!(url = %url, category = category.label(), "institution found on ranking portal");
                documents.push(
                    CandidateDocument::new(
                        &url,
                        format!("NIRF {} {} Rankings", self.target_year, category.label()),
                        DocType::Html,
                    )
                    .with_year(self.target_year)
                    .with_category(*category)
                    .with_score(10.0)
                    .with_source(DiscoverySource::OfficialPortal),
                );
            }
        }

        documents
    }

    /// The domain-relevance predicate.
    ///
    /// The ignore list rejects first; after that a URL is relevant when it
    /// carries a direct indicator, a pattern or keyword match on its
    /// normalized form, or a document path with a recent attachment ID.
    pub fn is_relevant(&self, url: &str) -> bool {
        let url_lower = url.to_lowercase();
        let normalized = url_lower
            .replace("%20", " ")
            .replace('-', " ")
            .replace('_', " ");

        if IGNORED_PATTERNS.iter().any(|p| url_lower.contains(p)) {
            return false;
        }

        if DIRECT_INDICATORS.iter().any(|i| url_lower.contains(i)) {
            return true;
        }

        if has_doc_extension(&url_lower) && self.has_recent_attachment_id(&url_lower) {
            return true;
        }

        if self.relevance_patterns.iter().any(|p| p.is_match(&normalized)) {
            return true;
        }

        RELEVANCE_KEYWORDS.iter().any(|k| normalized.contains(k))
    }

    /// CMS attachment IDs above the threshold are treated as recently
    /// uploaded. A proxy for recency, not ground truth.
    fn has_recent_attachment_id(&self, url_lower: &str) -> bool {
        self.attachment_pattern
            .captures(url_lower)
            .and_then(|cap| cap.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .map(|id| id > self.attachment_id_threshold)
            .unwrap_or(false)
    }

    fn looks_like_ranking_document(&self, url: &str) -> bool {
        let url_lower = url.to_lowercase();
        const DOC_KEYWORDS: &[&str] = &[
            "nirf",
            "ranking",
            "data",
            "engineering",
            "overall",
            "management",
            "pharmacy",
        ];
        DOC_KEYWORDS.iter().any(|k| url_lower.contains(k))
            || self.has_recent_attachment_id(&url_lower)
    }

    /// Extract same-domain absolute URLs from href/src attributes,
    /// fragments stripped.
    fn extract_urls(&self, html: &str, current_url: &str, base_domain: &str) -> HashSet<String> {
        let mut urls = HashSet::new();
        let Ok(base) = Url::parse(current_url) else {
            return urls;
        };

        for pattern in [&self.href_pattern, &self.src_pattern] {
            for cap in pattern.captures_iter(html) {
                let Some(matched) = cap.get(1) else { continue };
                let target = matched.as_str();
                if target.starts_with('#')
                    || target.starts_with("javascript:")
                    || target.starts_with("mailto:")
                    || target.starts_with("tel:")
                    || target.starts_with("data:")
                {
                    continue;
                }
                let Ok(resolved) = base.join(target) else {
                    continue;
                };
                if registrable_host(&resolved) != base_domain {
                    continue;
                }
                let mut clean = format!(
                    "{}://{}{}",
                    resolved.scheme(),
                    resolved.host_str().unwrap_or(""),
                    resolved.path()
                );
                if let Some(query) = resolved.query() {
                    clean.push('?');
                    clean.push_str(query);
                }
                urls.insert(clean);
            }
        }

        urls
    }
}

/// Host with a leading `www.` stripped.
fn registrable_host(url: &Url) -> String {
    url.host_str()
        .unwrap_or("")
        .trim_start_matches("www.")
        .to_string()
}

fn has_doc_extension(url: &str) -> bool {
    let url_lower = url.to_lowercase();
    DOC_EXTENSIONS.iter().any(|ext| url_lower.ends_with(ext))
}

/// Parse sitemap XML into a URL set, falling back to a regex scan when
/// the XML is malformed.
fn parse_sitemap(xml: &str) -> HashSet<String> {
    use quick_xml::events::Event;

    let mut urls = HashSet::new();
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut in_loc = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"loc" => in_loc = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"loc" => in_loc = false,
            Ok(Event::Text(t)) if in_loc => {
                if let Ok(text) = t.unescape() {
                    let url = text.trim().to_string();
                    if !url.is_empty() {
                        urls.insert(url);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(error = %e, "sitemap XML malformed, using regex fallback");
                return parse_sitemap_fallback(xml);
            }
            _ => {}
        }
    }

    if urls.is_empty() {
        return parse_sitemap_fallback(xml);
    }
    urls
}

fn parse_sitemap_fallback(xml: &str) -> HashSet<String> {
    let loc_pattern = Regex::new(r"<loc>\s*(https?://[^<]+?)\s*</loc>").unwrap();
    loc_pattern
        .captures_iter(xml)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
