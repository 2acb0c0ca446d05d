//! KPI Source Collection Library
//!
//! Discovers, classifies, and prioritizes the official documents needed
//! to audit an Indian higher-education institution's published KPIs:
//! national ranking (NIRF) submissions, mandatory disclosures, the
//! institution's own website, and accreditation body records. The output
//! is a bounded, authority-ordered text corpus plus structured document
//! metadata, ready for a downstream extractor.
//!
//! # Design
//!
//! - Official sources only: aggregator, news, and social domains are
//!   filtered out before anything else sees them
//! - Degraded results over failed runs: one bad page, credential, or
//!   search never aborts a collection
//! - Every phase is bounded: crawl depth, URL counts, per-item and
//!   whole-corpus character limits
//! - Cancellation returns everything collected so far, never an error
//!
//! # Usage
//!
//! ```rust,ignore
//! use collector::{Collector, CollectorConfig, KpiSpec, ProgressSink};
//! use collector::traits::{HttpFetcher, SerperProvider};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let collector = Collector::new(
//!     Arc::new(SerperProvider::new()),
//!     Arc::new(HttpFetcher::new()),
//!     vec![std::env::var("SERPER_API_KEY")?],
//!     CollectorConfig::default(),
//! );
//!
//! let specs = vec![KpiSpec::new("Placement Rate").with_keywords(["placement percentage"])];
//! let (progress, _events) = ProgressSink::channel();
//! let result = collector
//!     .collect(
//!         "Indian Institute of Technology Bombay",
//!         Some("https://www.iitb.ac.in"),
//!         &specs,
//!         &progress,
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//! println!("{}", result.combined_corpus);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Trait seams (SearchProvider, PageFetcher, KpiExtractor)
//! - [`types`] - Configuration, documents, and result types
//! - [`pipeline`] - Phased orchestration, corpus assembly, progress events
//! - [`sources`] - Source trust classification
//! - [`classify`] - Document classification and prioritization
//! - [`scanner`] - Website crawling and document discovery
//! - [`search`] - Search orchestration with caching and key rotation
//! - [`content`] - Page and PDF text extraction
//! - [`testing`] - Mock implementations for testing

pub mod cache;
pub mod classify;
pub mod content;
pub mod error;
pub mod keypool;
pub mod pipeline;
pub mod scanner;
pub mod search;
pub mod sources;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{CollectError, FetchError, ProviderError, Result};
pub use keypool::{ApiKeyPool, KeyPoolStats, SecretString};
pub use sources::{SourceAssessment, SourcePriority, SourceTier, SourceType};
pub use traits::{
    extractor::KpiExtractor,
    fetcher::{FetchedResponse, HttpFetcher, PageFetcher},
    searcher::{ProviderHit, SearchProvider, SerperProvider},
};
pub use types::{
    config::CollectorConfig,
    document::{CandidateDocument, DiscoverySource, DocType, RankCategory},
    report::{
        CollectionResult, CollectionStatus, Confidence, KpiEvidence, KpiResult, KpiSpec,
        SearchHit,
    },
};

// Re-export pipeline components
pub use pipeline::{Collector, CorpusSection, ProgressEvent, ProgressSink, SectionKind};

// Re-export the discovery and search layers
pub use classify::DocumentClassifier;
pub use content::ContentFetcher;
pub use scanner::DocumentScanner;
pub use search::Searcher;
