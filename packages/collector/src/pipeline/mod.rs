//! The collection pipeline: phased orchestration, corpus assembly, and
//! progress reporting.

pub mod assemble;
pub mod collect;
pub mod progress;

pub use assemble::{assemble, CorpusSection, SectionKind};
pub use collect::Collector;
pub use progress::{ProgressEvent, ProgressSink};
