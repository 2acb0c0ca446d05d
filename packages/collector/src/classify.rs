//! Document classification, scoring, deduplication, and year filtering.
//!
//! Turns raw discovered URLs into typed [`CandidateDocument`] records.
//! All functions here are pure over their inputs; nothing touches the
//! network.

use regex::Regex;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::types::document::{CandidateDocument, DiscoverySource, DocType, RankCategory};

/// URL substrings that disqualify a page outright.
pub const IGNORED_PATTERNS: &[&str] = &[
    "login",
    "signup",
    "register",
    "cart",
    "checkout",
    "gallery",
    "photo",
    "video",
    "event",
    "notice",
    "admission",
    "application",
    "brochure",
    "prospectus",
    "news",
    "blog",
    "article",
    "announcement",
];

/// Classifies URLs into scored candidate documents.
pub struct DocumentClassifier {
    target_year: i32,
    year_pattern: Regex,
}

impl DocumentClassifier {
    pub fn new(target_year: i32) -> Self {
        Self {
            target_year,
            year_pattern: Regex::new(r"(202[0-7])").unwrap(),
        }
    }

    pub fn target_year(&self) -> i32 {
        self.target_year
    }

    /// Classify a batch of URLs, skipping ignored ones.
    ///
    /// `base_url` decides crawl vs. external attribution.
    pub fn classify_urls(&self, urls: &[String], base_url: &str) -> Vec<CandidateDocument> {
        urls.iter()
            .filter_map(|url| self.classify_url(url, base_url))
            .collect()
    }

    /// Classify one URL, or `None` if it matches the ignore list.
    pub fn classify_url(&self, url: &str, base_url: &str) -> Option<CandidateDocument> {
        let url_lower = url.to_lowercase();
        if IGNORED_PATTERNS.iter().any(|p| url_lower.contains(p)) {
            return None;
        }

        let doc_type = self.doc_type(url);
        let year = self.extract_year(url);
        let category = self.category(url);
        let score = self.priority_score(url, year, category);
        let title = self.generate_title(url, year, category);

        let source = if !base_url.is_empty() && url.contains(base_url) {
            DiscoverySource::Crawl
        } else {
            DiscoverySource::External
        };

        Some(
            CandidateDocument::new(url, title, doc_type)
                .with_score(score)
                .with_source(source)
                .apply_year(year)
                .apply_category(category),
        )
    }

    /// Document type by file extension.
    pub fn doc_type(&self, url: &str) -> DocType {
        let url_lower = url.to_lowercase();
        if url_lower.ends_with(".pdf") {
            DocType::Pdf
        } else if url_lower.ends_with(".xls") || url_lower.ends_with(".xlsx") {
            DocType::Excel
        } else if url_lower.ends_with(".doc") || url_lower.ends_with(".docx") {
            DocType::Word
        } else if url_lower.ends_with(".html")
            || url_lower.ends_with(".htm")
            || url_lower.ends_with(".php")
            || url_lower.ends_with(".aspx")
        {
            DocType::Html
        } else {
            DocType::Webpage
        }
    }

    /// First 4-digit year in 2020–2027 anywhere in the URL.
    pub fn extract_year(&self, url: &str) -> Option<i32> {
        self.year_pattern
            .captures(url)
            .and_then(|cap| cap.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Category by first keyword match.
    pub fn category(&self, url: &str) -> Option<RankCategory> {
        let url_lower = url.to_lowercase();
        if url_lower.contains("engineering") {
            Some(RankCategory::Engineering)
        } else if url_lower.contains("management") {
            Some(RankCategory::Management)
        } else if url_lower.contains("pharmacy") {
            Some(RankCategory::Pharmacy)
        } else if url_lower.contains("overall") {
            Some(RankCategory::Overall)
        } else {
            None
        }
    }

    /// Weighted priority score.
    ///
    /// The target year gets the largest bonus, decaying for older years.
    /// Structured formats outscore PDFs, which outscore plain pages.
    pub fn priority_score(
        &self,
        url: &str,
        year: Option<i32>,
        category: Option<RankCategory>,
    ) -> f64 {
        let mut score = 5.0;

        if let Some(year) = year {
            score += if year == self.target_year {
                10.0
            } else if year == self.target_year - 1 {
                2.0
            } else if year == self.target_year - 2 {
                1.0
            } else {
                0.5
            };
        }

        if matches!(
            category,
            Some(RankCategory::Overall) | Some(RankCategory::Engineering)
        ) {
            score += 2.0;
        }

        let url_lower = url.to_lowercase();
        if url_lower.ends_with(".pdf") {
            score += 3.0;
        } else if url_lower.ends_with(".xls") || url_lower.ends_with(".xlsx") {
            // Spreadsheets often carry the raw submission data.
            score += 4.0;
        }

        if url_lower.contains("data") && url_lower.contains("template") {
            score += 3.0;
        }
        if url_lower.contains("metrics") || url_lower.contains("report") {
            score += 2.0;
        }

        score
    }

    fn generate_title(&self, url: &str, year: Option<i32>, category: Option<RankCategory>) -> String {
        let mut parts = Vec::new();

        match year {
            Some(year) => parts.push(format!("NIRF {}", year)),
            None => parts.push("NIRF".to_string()),
        }

        if let Some(category) = category {
            parts.push(category.label().to_string());
        }

        let url_lower = url.to_lowercase();
        if url_lower.contains("data") && url_lower.contains("template") {
            parts.push("Data Template".to_string());
        } else if url_lower.contains("metrics") {
            parts.push("Metrics Report".to_string());
        } else if url_lower.ends_with(".pdf") {
            parts.push("PDF".to_string());
        } else if url_lower.ends_with(".xls") || url_lower.ends_with(".xlsx") {
            parts.push("Data Sheet".to_string());
        }

        parts.join(" ")
    }

    /// Back-fill missing years from referring-page context.
    ///
    /// A document inheriting the target year gets the target-year boost
    /// it would have received had the year appeared in its own URL.
    pub fn apply_page_context(
        &self,
        docs: &mut [CandidateDocument],
        context: &HashMap<String, Option<i32>>,
    ) {
        for doc in docs.iter_mut() {
            if doc.year.is_none() {
                if let Some(Some(year)) = context.get(&doc.url) {
                    doc.year = Some(*year);
                    if *year == self.target_year {
                        doc.priority_score += 10.0;
                    }
                }
            }
        }
    }

    /// One record per URL; the higher-scored duplicate wins regardless
    /// of insertion order.
    pub fn dedup(&self, docs: Vec<CandidateDocument>) -> Vec<CandidateDocument> {
        let mut unique: HashMap<String, CandidateDocument> = HashMap::new();
        for doc in docs {
            match unique.get(&doc.url) {
                Some(existing) if existing.priority_score >= doc.priority_score => {}
                _ => {
                    unique.insert(doc.url.clone(), doc);
                }
            }
        }
        let mut docs: Vec<_> = unique.into_values().collect();
        Self::sort_by_priority(&mut docs);
        docs
    }

    /// Keep only target-year documents when any exist; otherwise keep
    /// only the single most recent year present. Freshness trumps volume.
    pub fn filter_latest_year(&self, docs: Vec<CandidateDocument>) -> Vec<CandidateDocument> {
        let has_target = docs.iter().any(|d| d.year == Some(self.target_year));
        if has_target {
            let filtered: Vec<_> = docs
                .into_iter()
                .filter(|d| d.year == Some(self.target_year))
                .collect();
            info!(
                year = self.target_year,
                count = filtered.len(),
                "using target-year ranking documents only"
            );
            return filtered;
        }

        let latest = docs.iter().filter_map(|d| d.year).max();
        match latest {
            Some(latest) => {
                let filtered: Vec<_> = docs.into_iter().filter(|d| d.year == Some(latest)).collect();
                warn!(
                    target = self.target_year,
                    fallback = latest,
                    count = filtered.len(),
                    "no target-year documents, falling back to latest year"
                );
                filtered
            }
            None => {
                warn!("no year-specific ranking documents found");
                docs
            }
        }
    }

    /// Sort by (year, score) descending.
    pub fn sort_by_priority(docs: &mut [CandidateDocument]) {
        docs.sort_by(|a, b| {
            (b.year.unwrap_or(0), b.priority_score)
                .partial_cmp(&(a.year.unwrap_or(0), a.priority_score))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

// Small Option-taking builder helpers, local to classification.
trait ApplyOptional {
    fn apply_year(self, year: Option<i32>) -> Self;
    fn apply_category(self, category: Option<RankCategory>) -> Self;
}

impl ApplyOptional for CandidateDocument {
    fn apply_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    fn apply_category(mut self, category: Option<RankCategory>) -> Self {
        self.category = category;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> DocumentClassifier {
        DocumentClassifier::new(2025)
    }

    #[test]
    fn test_doc_type_by_extension() {
        let c = classifier();
        assert_eq!(c.doc_type("https://x.edu/a.PDF"), DocType::Pdf);
        assert_eq!(c.doc_type("https://x.edu/a.xlsx"), DocType::Excel);
        assert_eq!(c.doc_type("https://x.edu/a.docx"), DocType::Word);
        assert_eq!(c.doc_type("https://x.edu/a.aspx"), DocType::Html);
        assert_eq!(c.doc_type("https://x.edu/rankings"), DocType::Webpage);
    }

    #[test]
    fn test_extract_year_first_match_in_range() {
        let c = classifier();
        assert_eq!(c.extract_year("https://x.edu/nirf-2025.pdf"), Some(2025));
        assert_eq!(c.extract_year("https://x.edu/2023/nirf-2025"), Some(2023));
        assert_eq!(c.extract_year("https://x.edu/nirf-2019.pdf"), None);
        assert_eq!(c.extract_year("https://x.edu/nirf.pdf"), None);
    }

    #[test]
    fn test_category_first_match() {
        let c = classifier();
        assert_eq!(
            c.category("https://x.edu/engineering-overall"),
            Some(RankCategory::Engineering)
        );
        assert_eq!(
            c.category("https://x.edu/overall-ranking"),
            Some(RankCategory::Overall)
        );
        assert_eq!(c.category("https://x.edu/nirf"), None);
    }

    #[test]
    fn test_score_weights() {
        let c = classifier();
        // base 5 + target year 10 + engineering 2 + pdf 3
        let score = c.priority_score(
            "https://x.edu/nirf-engineering-2025.pdf",
            Some(2025),
            Some(RankCategory::Engineering),
        );
        assert_eq!(score, 20.0);

        // Excel outranks PDF for the same signals.
        let pdf = c.priority_score("https://x.edu/d-2025.pdf", Some(2025), None);
        let excel = c.priority_score("https://x.edu/d-2025.xlsx", Some(2025), None);
        assert!(excel > pdf);

        // Year decay: 2024 and 2023 outrank 2022.
        let y2024 = c.priority_score("https://x.edu/d-2024", Some(2024), None);
        let y2023 = c.priority_score("https://x.edu/d-2023", Some(2023), None);
        let y2022 = c.priority_score("https://x.edu/d-2022", Some(2022), None);
        assert!(y2024 > y2023 && y2023 > y2022);
    }

    #[test]
    fn test_keyword_bonuses() {
        let c = classifier();
        let template = c.priority_score("https://x.edu/nirf-data-template", None, None);
        let plain = c.priority_score("https://x.edu/nirf-page", None, None);
        assert_eq!(template - plain, 3.0);

        let metrics = c.priority_score("https://x.edu/nirf-metrics", None, None);
        assert_eq!(metrics - plain, 2.0);
    }

    #[test]
    fn test_ignored_urls_skipped() {
        let c = classifier();
        assert!(c.classify_url("https://x.edu/login/nirf", "x.edu").is_none());
        assert!(c
            .classify_url("https://x.edu/gallery/nirf-2025", "x.edu")
            .is_none());
        assert!(c.classify_url("https://x.edu/nirf-2025", "x.edu").is_some());
    }

    #[test]
    fn test_dedup_keeps_max_score() {
        let c = classifier();
        let docs = vec![
            CandidateDocument::new("https://x.edu/nirf/2025.pdf", "a", DocType::Pdf)
                .with_score(12.0)
                .with_source(DiscoverySource::Crawl),
            CandidateDocument::new("https://x.edu/nirf/2025.pdf", "b", DocType::Pdf)
                .with_score(15.0)
                .with_source(DiscoverySource::Sitemap),
            CandidateDocument::new("https://x.edu/other.pdf", "c", DocType::Pdf).with_score(6.0),
        ];

        let deduped = c.dedup(docs);
        assert_eq!(deduped.len(), 2);
        let winner = deduped
            .iter()
            .find(|d| d.url == "https://x.edu/nirf/2025.pdf")
            .unwrap();
        assert_eq!(winner.priority_score, 15.0);
        assert_eq!(winner.source, DiscoverySource::Sitemap);
    }

    #[test]
    fn test_dedup_insertion_order_irrelevant() {
        let c = classifier();
        let docs = vec![
            CandidateDocument::new("https://x.edu/a.pdf", "hi", DocType::Pdf).with_score(15.0),
            CandidateDocument::new("https://x.edu/a.pdf", "lo", DocType::Pdf).with_score(12.0),
        ];
        let deduped = c.dedup(docs);
        assert_eq!(deduped[0].priority_score, 15.0);
    }

    #[test]
    fn test_year_filter_prefers_target_year() {
        let c = classifier();
        let docs = vec![
            CandidateDocument::new("https://x.edu/a", "a", DocType::Pdf).with_year(2025),
            CandidateDocument::new("https://x.edu/b", "b", DocType::Pdf).with_year(2024),
            CandidateDocument::new("https://x.edu/c", "c", DocType::Pdf).with_year(2023),
        ];
        let filtered = c.filter_latest_year(docs);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].year, Some(2025));
    }

    #[test]
    fn test_year_filter_falls_back_to_latest() {
        let c = classifier();
        let docs = vec![
            CandidateDocument::new("https://x.edu/b", "b", DocType::Pdf).with_year(2024),
            CandidateDocument::new("https://x.edu/c", "c", DocType::Pdf).with_year(2023),
            CandidateDocument::new("https://x.edu/d", "d", DocType::Pdf),
        ];
        let filtered = c.filter_latest_year(docs);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].year, Some(2024));
    }

    #[test]
    fn test_year_filter_keeps_all_when_no_years() {
        let c = classifier();
        let docs = vec![
            CandidateDocument::new("https://x.edu/a", "a", DocType::Pdf),
            CandidateDocument::new("https://x.edu/b", "b", DocType::Pdf),
        ];
        assert_eq!(c.filter_latest_year(docs).len(), 2);
    }

    #[test]
    fn test_page_context_backfill_boosts_target_year() {
        let c = classifier();
        let mut docs = vec![
            CandidateDocument::new("https://x.edu/att/9001.pdf", "a", DocType::Pdf).with_score(8.0),
        ];
        let mut context = HashMap::new();
        context.insert("https://x.edu/att/9001.pdf".to_string(), Some(2025));

        c.apply_page_context(&mut docs, &context);
        assert_eq!(docs[0].year, Some(2025));
        assert_eq!(docs[0].priority_score, 18.0);
    }

    #[test]
    fn test_page_context_no_boost_for_older_year() {
        let c = classifier();
        let mut docs = vec![
            CandidateDocument::new("https://x.edu/att/5001.pdf", "a", DocType::Pdf).with_score(8.0),
        ];
        let mut context = HashMap::new();
        context.insert("https://x.edu/att/5001.pdf".to_string(), Some(2023));

        c.apply_page_context(&mut docs, &context);
        assert_eq!(docs[0].year, Some(2023));
        assert_eq!(docs[0].priority_score, 8.0);
    }

    #[test]
    fn test_sort_by_priority_year_then_score() {
        let mut docs = vec![
            CandidateDocument::new("https://x.edu/a", "a", DocType::Pdf)
                .with_year(2024)
                .with_score(20.0),
            CandidateDocument::new("https://x.edu/b", "b", DocType::Pdf)
                .with_year(2025)
                .with_score(10.0),
            CandidateDocument::new("https://x.edu/c", "c", DocType::Pdf)
                .with_year(2025)
                .with_score(12.0),
        ];
        DocumentClassifier::sort_by_priority(&mut docs);
        assert_eq!(docs[0].url, "https://x.edu/c");
        assert_eq!(docs[1].url, "https://x.edu/b");
        assert_eq!(docs[2].url, "https://x.edu/a");
    }

    #[test]
    fn test_generated_titles() {
        let c = classifier();
        let doc = c
            .classify_url("https://x.edu/nirf-2025-engineering.pdf", "x.edu")
            .unwrap();
        assert_eq!(doc.title, "NIRF 2025 Engineering PDF");
    }
}
