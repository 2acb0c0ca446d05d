//! Trait seams for external collaborators.
//!
//! The pipeline depends on these traits, never on concrete network
//! clients, so tests can inject mocks and deployments can swap
//! providers.

pub mod extractor;
pub mod fetcher;
pub mod searcher;

pub use extractor::KpiExtractor;
pub use fetcher::{FetchedResponse, HttpFetcher, PageFetcher};
pub use searcher::{ProviderHit, SearchProvider, SerperProvider};
