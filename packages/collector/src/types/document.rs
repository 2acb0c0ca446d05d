//! Candidate document records produced by classification.

use serde::{Deserialize, Serialize};

/// File format of a discovered document, inferred from its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Pdf,
    Excel,
    Word,
    Html,
    Webpage,
}

impl DocType {
    /// True for leaf documents that should never be enqueued for crawling.
    pub fn is_document(&self) -> bool {
        matches!(self, DocType::Pdf | DocType::Excel | DocType::Word)
    }
}

/// Ranking category a document pertains to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankCategory {
    Overall,
    Engineering,
    Management,
    Pharmacy,
}

impl RankCategory {
    pub fn label(&self) -> &'static str {
        match self {
            RankCategory::Overall => "Overall",
            RankCategory::Engineering => "Engineering",
            RankCategory::Management => "Management",
            RankCategory::Pharmacy => "Pharmacy",
        }
    }
}

/// Where a candidate document was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    Crawl,
    Sitemap,
    OfficialPortal,
    External,
}

/// A discovered document with classification metadata.
///
/// Exactly one record exists per distinct URL in any result set; when
/// two records would share a URL, the higher-scored one wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDocument {
    pub url: String,
    pub title: String,
    pub doc_type: DocType,
    /// First 4-digit year found in the URL, or back-filled from the
    /// referring page.
    pub year: Option<i32>,
    pub category: Option<RankCategory>,
    pub priority_score: f64,
    pub source: DiscoverySource,
}

impl CandidateDocument {
    pub fn new(url: impl Into<String>, title: impl Into<String>, doc_type: DocType) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            doc_type,
            year: None,
            category: None,
            priority_score: 0.0,
            source: DiscoverySource::Crawl,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_category(mut self, category: RankCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.priority_score = score;
        self
    }

    pub fn with_source(mut self, source: DiscoverySource) -> Self {
        self.source = source;
        self
    }
}
