//! Search hits, KPI specifications, and the collection result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::keypool::KeyPoolStats;
use crate::sources::{SourcePriority, SourceType};
use crate::types::document::CandidateDocument;

/// A filtered, classified search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// Numeric sort priority, lower is better.
    pub priority: u32,
    pub source_priority: SourcePriority,
    pub source_type: SourceType,
    /// Page content, lazily populated for the top hits only.
    pub fetched_content: Option<String>,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let priority = crate::sources::source_priority(&url, None);
        Self {
            title: title.into(),
            url,
            snippet: String::new(),
            priority,
            source_priority: SourcePriority::from_rank(priority),
            source_type: SourceType::OtherOfficial,
            fetched_content: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self.source_priority = SourcePriority::from_rank(priority);
        self
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.fetched_content = Some(content.into());
        self
    }
}

/// Specification of a single KPI to collect evidence for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiSpec {
    pub name: String,
    /// Unit hint for the extractor (e.g., "percentage", "INR lakhs").
    pub unit: Option<String>,
    /// Keywords used to build targeted search queries.
    #[serde(default)]
    pub search_keywords: Vec<String>,
    /// Free-form extraction instruction passed through to the extractor.
    pub instruction: Option<String>,
}

impl KpiSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: None,
            search_keywords: Vec::new(),
            instruction: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.search_keywords = keywords.into_iter().map(|k| k.into()).collect();
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }
}

/// Extractor confidence in a KPI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// A single extracted KPI value with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiResult {
    pub kpi_name: String,
    pub value: Option<String>,
    pub evidence_quote: Option<String>,
    pub source_url: Option<String>,
    pub confidence: Confidence,
}

/// Evidence gathered for one KPI by targeted search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KpiEvidence {
    pub kpi_name: String,
    pub hits: Vec<SearchHit>,
}

/// Terminal status of a collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    /// All phases ran to completion.
    Complete,
    /// Cancelled mid-run; data collected before cancellation is valid.
    Cancelled,
    /// Fewer than the configured minimum of official sources were found;
    /// extraction was not attempted.
    InsufficientSources,
    /// Every search credential was rejected mid-run; searches stopped
    /// but already-collected data is preserved.
    SearchesExhausted,
}

/// Everything a collection run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionResult {
    pub institution: String,
    pub status: CollectionStatus,

    /// When the run started.
    pub collected_at: DateTime<Utc>,

    /// Hits from the institution's own website searches, content fetched
    /// for the top few.
    pub official_website_docs: Vec<SearchHit>,

    /// Mandatory regulatory disclosure hits.
    pub disclosure_docs: Vec<SearchHit>,

    /// Classified, deduplicated, year-filtered ranking documents.
    pub ranking_docs: Vec<CandidateDocument>,

    /// Accreditation body hits.
    pub accreditation_docs: Vec<SearchHit>,

    /// Per-KPI targeted search evidence.
    pub kpi_evidence: Vec<KpiEvidence>,

    /// The bounded, ordered corpus handed to the extractor.
    pub combined_corpus: String,

    /// Count of hits per source-type label.
    pub source_priority_breakdown: BTreeMap<String, usize>,

    /// Credential pool usage, when a pool was in play.
    pub key_pool_stats: Option<KeyPoolStats>,
}

impl CollectionResult {
    /// An empty result shell for a run that has produced nothing yet.
    pub fn empty(institution: impl Into<String>, status: CollectionStatus) -> Self {
        Self {
            institution: institution.into(),
            status,
            collected_at: Utc::now(),
            official_website_docs: Vec::new(),
            disclosure_docs: Vec::new(),
            ranking_docs: Vec::new(),
            accreditation_docs: Vec::new(),
            kpi_evidence: Vec::new(),
            combined_corpus: String::new(),
            source_priority_breakdown: BTreeMap::new(),
            key_pool_stats: None,
        }
    }

    /// Total official sources found across all sections.
    pub fn total_sources(&self) -> usize {
        self.official_website_docs.len()
            + self.disclosure_docs.len()
            + self.ranking_docs.len()
            + self.accreditation_docs.len()
    }
}
