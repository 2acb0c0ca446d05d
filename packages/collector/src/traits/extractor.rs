//! Extractor seam.
//!
//! The LLM call itself lives outside this crate; the pipeline only needs
//! an opaque capability that turns a corpus plus KPI specifications into
//! structured values with provenance.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::report::{KpiResult, KpiSpec};

/// Turns an assembled corpus into structured KPI values.
///
/// The extractor is expected to prefer earlier-appearing, higher-authority
/// sections of the corpus when sources conflict, which is why corpus
/// ordering is stable.
#[async_trait]
pub trait KpiExtractor: Send + Sync {
    async fn extract(&self, corpus: &str, specs: &[KpiSpec]) -> Result<Vec<KpiResult>>;
}
