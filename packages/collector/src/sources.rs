//! Source trust classification.
//!
//! Maps a URL to a trust tier and a numeric sort priority. Aggregator,
//! news, and social domains are rejected outright; everything else must
//! match a known official pattern to be considered usable evidence.

use serde::{Deserialize, Serialize};

/// Domains that are never acceptable as evidence, regardless of what
/// else appears in the URL.
pub const BLOCKED_SOURCES: &[&str] = &[
    "shiksha.com",
    "collegedunia.com",
    "collegedekho.com",
    "careers360.com",
    "getmyuni.com",
    "jagranjosh.com",
    "examresults.net",
    "indiatoday.in",
    "hindustantimes.com",
    "timesofindia.indiatimes.com",
    "ndtv.com",
    "news18.com",
    "thehindu.com",
    "quora.com",
    "reddit.com",
    "youtube.com",
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "linkedin.com",
];

const RANKING_BODY_PATTERNS: &[&str] = &["nirfindia.org", "nirf.org"];

const ACCREDITATION_PATTERNS: &[&str] = &[
    "naac.gov.in",
    "assessmentonline.naac.gov.in",
    "aicte-india.org",
    "facilities.aicte-india.org",
    "ugc.ac.in",
    "ugc.gov.in",
];

const ACADEMIC_SUFFIXES: &[&str] = &[".ac.in", ".edu.in", ".edu"];

const GOVERNMENT_SUFFIXES: &[&str] = &[".gov.in", ".nic.in", ".gov"];

/// Coarse trust tier for a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    /// National ranking body portal
    RankingBody,
    /// The institution's own domain, or an academic domain
    Institution,
    /// Accreditation body (NAAC, AICTE, UGC)
    Accreditation,
    /// Other government domain
    Government,
    /// Official by pattern but in no named tier
    OtherOfficial,
    /// Blocked or unrecognized
    Untrusted,
}

/// Label for the kind of official source a hit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    Nirf,
    Naac,
    Aicte,
    Ugc,
    OfficialWebsite,
    Government,
    OtherOfficial,
}

impl SourceType {
    /// Human-readable label, used in corpus section headers and breakdowns.
    pub fn label(&self) -> &'static str {
        match self {
            SourceType::Nirf => "NIRF",
            SourceType::Naac => "NAAC",
            SourceType::Aicte => "AICTE",
            SourceType::Ugc => "UGC",
            SourceType::OfficialWebsite => "Official College Website",
            SourceType::Government => "Government",
            SourceType::OtherOfficial => "Other Official",
        }
    }
}

/// Coarse priority bucket derived from the numeric priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePriority {
    High,
    Medium,
    Low,
    Unknown,
}

impl SourcePriority {
    pub fn from_rank(rank: u32) -> Self {
        match rank {
            1..=2 => SourcePriority::High,
            3..=4 => SourcePriority::Medium,
            5..=100 => SourcePriority::Low,
            _ => SourcePriority::Unknown,
        }
    }
}

/// Full assessment of a URL's trustworthiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceAssessment {
    pub tier: SourceTier,
    pub is_official: bool,
    /// Sort priority, lower is better. 100 for official-but-untier'd.
    pub priority: u32,
}

/// Check whether a URL is from an official, trusted source.
///
/// The blocklist always takes precedence: an aggregator page embedding a
/// government-looking substring is still rejected.
pub fn is_official(url: &str, own_domain: Option<&str>) -> bool {
    if url.is_empty() {
        return false;
    }
    let url_lower = url.to_lowercase();

    if BLOCKED_SOURCES.iter().any(|b| url_lower.contains(b)) {
        return false;
    }

    if RANKING_BODY_PATTERNS
        .iter()
        .chain(ACCREDITATION_PATTERNS)
        .any(|p| url_lower.contains(p))
    {
        return true;
    }

    if let Some(domain) = own_domain {
        if !domain.is_empty() && url_lower.contains(&domain.to_lowercase()) {
            return true;
        }
    }

    ACADEMIC_SUFFIXES
        .iter()
        .chain(GOVERNMENT_SUFFIXES)
        .any(|s| url_lower.contains(s))
}

/// Numeric sort priority for an official URL. Lower is better.
///
/// Ranking body (1) < own/academic domain (2) < accreditation body (3)
/// < other government (4) < everything else (100).
pub fn source_priority(url: &str, own_domain: Option<&str>) -> u32 {
    if url.is_empty() {
        return 999;
    }
    let url_lower = url.to_lowercase();

    if RANKING_BODY_PATTERNS.iter().any(|p| url_lower.contains(p)) {
        return 1;
    }
    if let Some(domain) = own_domain {
        if !domain.is_empty() && url_lower.contains(&domain.to_lowercase()) {
            return 2;
        }
    }
    if ACADEMIC_SUFFIXES.iter().any(|s| url_lower.contains(s)) {
        return 2;
    }
    if ACCREDITATION_PATTERNS.iter().any(|p| url_lower.contains(p)) {
        return 3;
    }
    if GOVERNMENT_SUFFIXES.iter().any(|s| url_lower.contains(s)) {
        return 4;
    }
    100
}

/// Identify which kind of official source a URL belongs to.
pub fn source_type(url: &str) -> SourceType {
    let url_lower = url.to_lowercase();

    if url_lower.contains("nirf") {
        SourceType::Nirf
    } else if url_lower.contains("naac") {
        SourceType::Naac
    } else if url_lower.contains("aicte") {
        SourceType::Aicte
    } else if url_lower.contains("ugc.") {
        SourceType::Ugc
    } else if ACADEMIC_SUFFIXES.iter().any(|s| url_lower.contains(s)) {
        SourceType::OfficialWebsite
    } else if GOVERNMENT_SUFFIXES.iter().any(|s| url_lower.contains(s)) {
        SourceType::Government
    } else {
        SourceType::OtherOfficial
    }
}

/// Classify a URL into a full assessment.
pub fn classify(url: &str, own_domain: Option<&str>) -> SourceAssessment {
    let official = is_official(url, own_domain);
    if !official {
        return SourceAssessment {
            tier: SourceTier::Untrusted,
            is_official: false,
            priority: 999,
        };
    }

    let priority = source_priority(url, own_domain);
    let tier = match priority {
        1 => SourceTier::RankingBody,
        2 => SourceTier::Institution,
        3 => SourceTier::Accreditation,
        4 => SourceTier::Government,
        _ => SourceTier::OtherOfficial,
    };

    SourceAssessment {
        tier,
        is_official: true,
        priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocklist_wins_over_allow_patterns() {
        // Aggregator URL embedding a government-looking substring.
        let url = "https://collegedunia.com/college/iit-bombay.ac.in-profile";
        assert!(!is_official(url, None));
        assert_eq!(classify(url, None).tier, SourceTier::Untrusted);
    }

    #[test]
    fn test_blocklist_wins_over_own_domain() {
        let url = "https://shiksha.com/mirror/rvce.edu.in/placements";
        assert!(!is_official(url, Some("rvce.edu.in")));
    }

    #[test]
    fn test_ranking_body_is_priority_one() {
        let url = "https://www.nirfindia.org/2025/EngineeringRanking.html";
        let assessment = classify(url, None);
        assert!(assessment.is_official);
        assert_eq!(assessment.priority, 1);
        assert_eq!(assessment.tier, SourceTier::RankingBody);
    }

    #[test]
    fn test_own_domain_is_priority_two() {
        let assessment = classify("https://custom-college.org/nirf", Some("custom-college.org"));
        assert!(assessment.is_official);
        assert_eq!(assessment.priority, 2);
        assert_eq!(assessment.tier, SourceTier::Institution);
    }

    #[test]
    fn test_academic_suffix_is_official() {
        assert!(is_official("https://www.iitb.ac.in/placements", None));
        assert_eq!(source_priority("https://www.iitb.ac.in/", None), 2);
    }

    #[test]
    fn test_accreditation_priority() {
        assert_eq!(source_priority("http://naac.gov.in/report", None), 3);
        assert_eq!(
            source_priority("https://facilities.aicte-india.org/x", None),
            3
        );
    }

    #[test]
    fn test_other_government_priority() {
        assert_eq!(source_priority("https://data.gov.in/colleges", None), 4);
    }

    #[test]
    fn test_empty_url_untrusted() {
        assert!(!is_official("", None));
        assert_eq!(source_priority("", None), 999);
    }

    #[test]
    fn test_source_type_labels() {
        assert_eq!(source_type("https://nirfindia.org/x"), SourceType::Nirf);
        assert_eq!(source_type("https://naac.gov.in/x"), SourceType::Naac);
        assert_eq!(
            source_type("https://www.iitb.ac.in/x"),
            SourceType::OfficialWebsite
        );
        assert_eq!(
            source_type("https://data.gov.in/x"),
            SourceType::Government
        );
    }

    #[test]
    fn test_priority_buckets() {
        assert_eq!(SourcePriority::from_rank(1), SourcePriority::High);
        assert_eq!(SourcePriority::from_rank(2), SourcePriority::High);
        assert_eq!(SourcePriority::from_rank(3), SourcePriority::Medium);
        assert_eq!(SourcePriority::from_rank(100), SourcePriority::Low);
        assert_eq!(SourcePriority::from_rank(999), SourcePriority::Unknown);
    }
}
