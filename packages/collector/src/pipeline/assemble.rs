//! Corpus assembly.
//!
//! Sections are concatenated in a fixed authority order: the downstream
//! extractor prefers earlier-appearing data when sources conflict, so
//! this ordering is correctness-relevant and must stay stable.

use crate::content::{truncate_with_marker, TRUNCATION_MARKER};

/// Corpus section kinds, declared in authority order (most authoritative
/// first). The derived `Ord` is the assembly order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SectionKind {
    /// Mandatory regulatory disclosure filings.
    Disclosure,
    /// The institution's own site content.
    OfficialSite,
    /// Per-KPI targeted search results.
    KpiTargeted,
    /// Ranking body documents.
    RankingDocs,
    /// Accreditation body documents.
    Accreditation,
}

impl SectionKind {
    pub fn header(&self) -> &'static str {
        match self {
            SectionKind::Disclosure => "MANDATORY DISCLOSURE",
            SectionKind::OfficialSite => "OFFICIAL WEBSITE",
            SectionKind::KpiTargeted => "KPI-SPECIFIC SEARCH",
            SectionKind::RankingDocs => "NIRF RANKING DOCUMENTS",
            SectionKind::Accreditation => "ACCREDITATION",
        }
    }
}

/// One labeled corpus section with its per-item length limit.
#[derive(Debug, Clone)]
pub struct CorpusSection {
    pub kind: SectionKind,
    pub items: Vec<String>,
    pub per_item_limit: usize,
}

impl CorpusSection {
    pub fn new(kind: SectionKind, per_item_limit: usize) -> Self {
        Self {
            kind,
            items: Vec::new(),
            per_item_limit,
        }
    }

    pub fn push(&mut self, item: impl Into<String>) {
        self.items.push(item.into());
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Concatenate sections in authority order under a hard size limit.
///
/// Each item is truncated to its section's per-item limit; the whole
/// corpus is then hard-truncated to `size_limit` characters with a
/// trailing marker if exceeded.
pub fn assemble(mut sections: Vec<CorpusSection>, size_limit: usize) -> String {
    sections.sort_by_key(|s| s.kind);

    let mut parts: Vec<String> = Vec::new();
    for section in sections {
        if section.is_empty() {
            continue;
        }
        let mut body = format!("[{}]", section.kind.header());
        for item in section.items {
            body.push('\n');
            body.push_str(&truncate_with_marker(item, section.per_item_limit));
        }
        parts.push(body);
    }

    let corpus = parts.join("\n\n");
    if corpus.chars().count() <= size_limit {
        return corpus;
    }
    let mut truncated: String = corpus.chars().take(size_limit).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_ordered_by_authority() {
        let mut accreditation = CorpusSection::new(SectionKind::Accreditation, 100);
        accreditation.push("naac grade A++");
        let mut disclosure = CorpusSection::new(SectionKind::Disclosure, 100);
        disclosure.push("faculty count 450");
        let mut ranking = CorpusSection::new(SectionKind::RankingDocs, 100);
        ranking.push("nirf rank 12");

        // Deliberately out of order.
        let corpus = assemble(vec![accreditation, ranking, disclosure], 10_000);

        let disclosure_at = corpus.find("MANDATORY DISCLOSURE").unwrap();
        let ranking_at = corpus.find("NIRF RANKING DOCUMENTS").unwrap();
        let accreditation_at = corpus.find("ACCREDITATION").unwrap();
        assert!(disclosure_at < ranking_at);
        assert!(ranking_at < accreditation_at);
    }

    #[test]
    fn test_empty_sections_omitted() {
        let empty = CorpusSection::new(SectionKind::Disclosure, 100);
        let mut site = CorpusSection::new(SectionKind::OfficialSite, 100);
        site.push("content");

        let corpus = assemble(vec![empty, site], 10_000);
        assert!(!corpus.contains("MANDATORY DISCLOSURE"));
        assert!(corpus.contains("OFFICIAL WEBSITE"));
    }

    #[test]
    fn test_per_item_truncation() {
        let mut section = CorpusSection::new(SectionKind::OfficialSite, 10);
        section.push("x".repeat(50));

        let corpus = assemble(vec![section], 10_000);
        assert!(corpus.contains(TRUNCATION_MARKER));
        assert!(!corpus.contains(&"x".repeat(11)));
    }

    #[test]
    fn test_global_hard_cap_with_marker() {
        let mut section = CorpusSection::new(SectionKind::OfficialSite, 1000);
        for _ in 0..10 {
            section.push("y".repeat(100));
        }

        let corpus = assemble(vec![section], 200);
        assert!(corpus.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            corpus.chars().count(),
            200 + TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn test_under_limit_untouched() {
        let mut section = CorpusSection::new(SectionKind::Disclosure, 1000);
        section.push("short");
        let corpus = assemble(vec![section], 10_000);
        assert!(!corpus.contains(TRUNCATION_MARKER));
        assert!(corpus.contains("short"));
    }
}
