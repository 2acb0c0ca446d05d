//! Public data types for the collection pipeline.

pub mod config;
pub mod document;
pub mod report;

pub use config::CollectorConfig;
pub use document::{CandidateDocument, DiscoverySource, DocType, RankCategory};
pub use report::{
    CollectionResult, CollectionStatus, Confidence, KpiEvidence, KpiResult, KpiSpec, SearchHit,
};
