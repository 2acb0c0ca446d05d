//! Phased collection orchestration.
//!
//! Phases: website discovery, classification, official searches, per-KPI
//! searches, content fetch, corpus assembly. The cancellation token is
//! checked at every phase boundary; everything collected before
//! cancellation is valid and returned, never discarded.

use futures::future::join_all;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::classify::DocumentClassifier;
use crate::content::ContentFetcher;
use crate::error::{CollectError, Result};
use crate::keypool::ApiKeyPool;
use crate::pipeline::assemble::{assemble, CorpusSection, SectionKind};
use crate::pipeline::progress::ProgressSink;
use crate::scanner::DocumentScanner;
use crate::search::Searcher;
use crate::traits::fetcher::PageFetcher;
use crate::traits::searcher::SearchProvider;
use crate::types::config::CollectorConfig;
use crate::types::document::{CandidateDocument, DiscoverySource, DocType};
use crate::types::report::{
    CollectionResult, CollectionStatus, KpiEvidence, KpiSpec, SearchHit,
};

/// Per-item character limits for each corpus section.
const DISCLOSURE_ITEM_LIMIT: usize = 2_000;
const SITE_ITEM_LIMIT: usize = 8_000;
const KPI_ITEM_LIMIT: usize = 5_000;
const RANKING_ITEM_LIMIT: usize = 500;
const ACCREDITATION_ITEM_LIMIT: usize = 2_000;

/// Number of official-site pages whose content is fetched.
const SITE_PAGES_TO_FETCH: usize = 5;
/// Number of pages fetched per KPI.
const KPI_PAGES_TO_FETCH: usize = 2;
/// High-score HTML pages mined for document links.
const PAGES_TO_MINE: usize = 25;
/// Minimum score for a page to be considered high-score.
const HIGH_SCORE_THRESHOLD: f64 = 5.0;

/// The collection pipeline.
pub struct Collector {
    config: CollectorConfig,
    scanner: DocumentScanner,
    classifier: DocumentClassifier,
    searcher: Arc<Searcher>,
    content: Arc<ContentFetcher>,
}

impl Collector {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        api_keys: Vec<String>,
        config: CollectorConfig,
    ) -> Self {
        let searcher = Arc::new(Searcher::new(
            provider,
            ApiKeyPool::new(api_keys),
            &config,
        ));
        let content = Arc::new(ContentFetcher::new(fetcher.clone(), &config));
        let scanner = DocumentScanner::new(fetcher, &config);
        let classifier = DocumentClassifier::new(config.target_year);
        Self {
            config,
            scanner,
            classifier,
            searcher,
            content,
        }
    }

    /// Run a full collection for one institution.
    ///
    /// `known_website` scopes crawling and marks the institution's own
    /// domain official. KPI specs drive the targeted search phase.
    pub async fn collect(
        &self,
        institution: &str,
        known_website: Option<&str>,
        kpi_specs: &[KpiSpec],
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<CollectionResult> {
        if cancel.is_cancelled() {
            // Nothing collected yet, so there is no partial data to keep.
            progress.cancelled();
            return Err(CollectError::Cancelled);
        }

        info!(institution = %institution, website = ?known_website, "collection starting");
        progress.update("Starting collection", 2);

        let abbreviation = abbreviation_for(institution);
        let own_domain = known_website.and_then(domain_of);
        let mut result = CollectionResult::empty(institution, CollectionStatus::Complete);

        // Phase 1: website discovery and portal probe, concurrently.
        progress.update("Scanning institution website", 5);
        let (crawl_urls, sitemap_urls, portal_docs) = match known_website {
            Some(site) => {
                let (crawl, sitemap, portal) = tokio::join!(
                    self.scanner.scan(site),
                    self.scanner.fetch_sitemap_urls(site),
                    self.scanner.probe_ranking_portal(institution),
                );
                let crawl = crawl.unwrap_or_else(|e| {
                    warn!(error = %e, "site scan failed, continuing with searches only");
                    HashSet::new()
                });
                (crawl, self.scanner.filter_relevant(sitemap), portal)
            }
            None => {
                let portal = self.scanner.probe_ranking_portal(institution).await;
                (HashSet::new(), HashSet::new(), portal)
            }
        };
        progress.update("Website scan complete", 25);

        if cancel.is_cancelled() {
            return self.finish_cancelled(result, progress);
        }

        // Phase 2: classification, document mining, year policy.
        progress.update("Classifying discovered documents", 30);
        result.ranking_docs = self
            .classify_discoveries(
                known_website.unwrap_or(""),
                crawl_urls,
                sitemap_urls,
                portal_docs,
            )
            .await;
        progress.update("Ranking documents prioritized", 40);

        if cancel.is_cancelled() {
            return self.finish_cancelled(result, progress);
        }

        // Phase 3: official website, disclosure, and accreditation
        // searches. Credential exhaustion stops searching but keeps data.
        progress.update("Searching official sources", 45);
        let searches = self
            .run_official_searches(institution, abbreviation.as_deref(), own_domain.as_deref())
            .await;
        let exhausted = match searches {
            Ok((official, disclosure, accreditation)) => {
                result.official_website_docs = official;
                result.disclosure_docs = disclosure;
                result.accreditation_docs = accreditation;
                false
            }
            Err(CollectError::AllCredentialsExhausted) => true,
            Err(e) => return Err(e),
        };
        if exhausted {
            return self.finish_exhausted(result, progress);
        }
        progress.update("Official sources gathered", 65);

        // Correctness guard: too little evidence means extraction would
        // mostly hallucinate. Stop here with an explicit status.
        if result.total_sources() < self.config.min_sources {
            warn!(
                found = result.total_sources(),
                required = self.config.min_sources,
                "insufficient official sources"
            );
            result.status = CollectionStatus::InsufficientSources;
            result.key_pool_stats = Some(self.searcher.key_pool_stats());
            progress.fail("Insufficient official sources");
            return Ok(result);
        }

        if cancel.is_cancelled() {
            return self.finish_cancelled(result, progress);
        }

        // Phase 4: fetch content for the top official-site pages.
        progress.update("Fetching official website content", 70);
        self.fetch_site_content(&mut result.official_website_docs)
            .await;

        if cancel.is_cancelled() {
            return self.finish_cancelled(result, progress);
        }

        // Phase 5: per-KPI targeted searches.
        progress.update("Searching for KPI-specific data", 75);
        let (evidence, kpi_exhausted) = self
            .run_kpi_searches(institution, abbreviation.as_deref(), own_domain.as_deref(), kpi_specs)
            .await;
        result.kpi_evidence = evidence;
        if kpi_exhausted {
            return self.finish_exhausted(result, progress);
        }
        progress.update("KPI searches complete", 90);

        if cancel.is_cancelled() {
            return self.finish_cancelled(result, progress);
        }

        // Phase 6: assembly.
        progress.update("Assembling corpus", 95);
        result.combined_corpus = self.assemble_corpus(&result);
        result.source_priority_breakdown = breakdown(&result);
        result.key_pool_stats = Some(self.searcher.key_pool_stats());

        info!(
            institution = %institution,
            sources = result.total_sources(),
            corpus_chars = result.combined_corpus.chars().count(),
            "collection complete"
        );
        progress.complete(format!(
            "Collection complete: {} sources",
            result.total_sources()
        ));
        Ok(result)
    }

    async fn classify_discoveries(
        &self,
        base_url: &str,
        crawl_urls: HashSet<String>,
        sitemap_urls: HashSet<String>,
        portal_docs: Vec<CandidateDocument>,
    ) -> Vec<CandidateDocument> {
        let mut all_urls: HashSet<String> = crawl_urls;
        all_urls.extend(sitemap_urls.iter().cloned());

        let url_list: Vec<String> = all_urls.iter().cloned().collect();
        let preliminary = self.classifier.classify_urls(&url_list, base_url);

        // Mine high-score HTML pages for document links not in any sitemap.
        let mut html_pages: Vec<CandidateDocument> = preliminary
            .into_iter()
            .filter(|d| {
                matches!(d.doc_type, DocType::Html | DocType::Webpage)
                    && d.priority_score >= HIGH_SCORE_THRESHOLD
            })
            .collect();
        DocumentClassifier::sort_by_priority(&mut html_pages);
        html_pages.truncate(PAGES_TO_MINE);

        let mut context: HashMap<String, Option<i32>> = HashMap::new();
        if !html_pages.is_empty() && !base_url.is_empty() {
            for (url, year) in self
                .scanner
                .discover_documents_in_pages(&html_pages, base_url)
                .await
            {
                all_urls.insert(url.clone());
                context.insert(url, year);
            }
        }

        let url_list: Vec<String> = all_urls.into_iter().collect();
        let mut docs = self.classifier.classify_urls(&url_list, base_url);
        for doc in docs.iter_mut() {
            if sitemap_urls.contains(&doc.url) {
                doc.source = DiscoverySource::Sitemap;
            }
        }
        self.classifier.apply_page_context(&mut docs, &context);
        docs.extend(portal_docs);

        let docs = self.classifier.dedup(docs);
        self.classifier.filter_latest_year(docs)
    }

    /// Returns (official website, disclosure, accreditation) hits.
    async fn run_official_searches(
        &self,
        institution: &str,
        abbreviation: Option<&str>,
        own_domain: Option<&str>,
    ) -> Result<(Vec<SearchHit>, Vec<SearchHit>, Vec<SearchHit>)> {
        let year = self.config.target_year;

        let mut official_queries = vec![
            format!("\"{}\" official website", institution),
            format!("site:.ac.in OR site:.edu.in \"{}\"", institution),
            format!("\"{}\" placements {} statistics", institution, year),
        ];
        if let Some(abbr) = abbreviation {
            official_queries.push(format!("site:.ac.in OR site:.edu.in \"{}\" official", abbr));
            official_queries.push(format!("\"{}\" placements {} highest package", abbr, year));
        }

        let disclosure_queries = vec![
            format!("\"{}\" mandatory disclosure", institution),
            format!("\"{}\" mandatory disclosure {} site:.ac.in", institution, year),
            format!("\"{}\" AICTE mandatory disclosure", institution),
        ];

        let mut accreditation_queries = vec![
            format!("site:naac.gov.in \"{}\"", institution),
            format!("\"{}\" NAAC accreditation grade", institution),
            format!("\"{}\" NAAC SSR report", institution),
        ];
        if let Some(abbr) = abbreviation {
            accreditation_queries.push(format!("\"{}\" NAAC grade", abbr));
        }

        let official = self
            .search_group(&official_queries, own_domain)
            .await?;
        let disclosure = self.search_group(&disclosure_queries, own_domain).await?;
        let accreditation = self
            .search_group(&accreditation_queries, own_domain)
            .await?;
        Ok((official, disclosure, accreditation))
    }

    /// Run a group of queries, deduplicating hits by URL.
    async fn search_group(
        &self,
        queries: &[String],
        own_domain: Option<&str>,
    ) -> Result<Vec<SearchHit>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut hits = Vec::new();
        for query in queries {
            for hit in self.searcher.search_or_empty(query, own_domain).await? {
                if seen.insert(hit.url.clone()) {
                    hits.push(hit);
                }
            }
        }
        hits.sort_by_key(|h| h.priority);
        Ok(hits)
    }

    /// Fetch page content for the top non-document hits, in place.
    async fn fetch_site_content(&self, hits: &mut [SearchHit]) {
        let semaphore = Arc::new(Semaphore::new(self.config.crawl_concurrency.max(1)));
        let targets: Vec<(usize, String)> = hits
            .iter()
            .enumerate()
            .filter(|(_, hit)| !hit.url.to_lowercase().ends_with(".pdf"))
            .take(SITE_PAGES_TO_FETCH)
            .map(|(index, hit)| (index, hit.url.clone()))
            .collect();

        let fetches = targets.into_iter().map(|(index, url)| {
            let semaphore = semaphore.clone();
            let content = self.content.clone();
            async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return (index, None);
                };
                match content.fetch_text(&url).await {
                    Ok(text) => (index, Some(text)),
                    Err(e) => {
                        warn!(url = %url, error = %e, "page content fetch failed");
                        (index, None)
                    }
                }
            }
        });

        for (index, text) in join_all(fetches).await {
            if let Some(text) = text {
                hits[index].fetched_content = Some(text);
            }
        }
    }

    /// Per-KPI targeted searches under bounded concurrency.
    ///
    /// Returns the evidence plus whether the credential pool was
    /// exhausted partway through.
    async fn run_kpi_searches(
        &self,
        institution: &str,
        abbreviation: Option<&str>,
        own_domain: Option<&str>,
        specs: &[KpiSpec],
    ) -> (Vec<KpiEvidence>, bool) {
        let semaphore = Arc::new(Semaphore::new(self.config.search_concurrency.max(1)));

        let tasks = specs.iter().map(|spec| {
            let semaphore = semaphore.clone();
            async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return Ok(KpiEvidence {
                        kpi_name: spec.name.clone(),
                        hits: Vec::new(),
                    });
                };
                self.collect_kpi_evidence(institution, abbreviation, own_domain, spec)
                    .await
            }
        });

        let mut evidence = Vec::new();
        let mut exhausted = false;
        for outcome in join_all(tasks).await {
            match outcome {
                Ok(kpi) => evidence.push(kpi),
                Err(CollectError::AllCredentialsExhausted) => exhausted = true,
                Err(e) => warn!(error = %e, "KPI search failed"),
            }
        }
        (evidence, exhausted)
    }

    async fn collect_kpi_evidence(
        &self,
        institution: &str,
        abbreviation: Option<&str>,
        own_domain: Option<&str>,
        spec: &KpiSpec,
    ) -> Result<KpiEvidence> {
        let mut queries = Vec::new();
        for keyword in spec.search_keywords.iter().take(3) {
            queries.push(format!("\"{}\" {}", institution, keyword));
            if let Some(abbr) = abbreviation {
                queries.push(format!("\"{}\" {}", abbr, keyword));
            }
        }
        let primary = spec
            .search_keywords
            .first()
            .cloned()
            .unwrap_or_else(|| spec.name.clone());
        queries.push(format!(
            "site:.ac.in OR site:.edu.in \"{}\" {}",
            institution, primary
        ));
        queries.push(format!("site:nirfindia.org \"{}\" {}", institution, primary));
        queries.truncate(5);

        let mut hits = self.search_group(&queries, own_domain).await?;

        // Pull page content for the strongest couple of hits.
        let targets: Vec<usize> = hits
            .iter()
            .enumerate()
            .filter(|(_, hit)| !hit.url.to_lowercase().ends_with(".pdf"))
            .take(KPI_PAGES_TO_FETCH)
            .map(|(index, _)| index)
            .collect();
        for index in targets {
            match self.content.fetch_text(&hits[index].url).await {
                Ok(text) => hits[index].fetched_content = Some(text),
                Err(e) => {
                    warn!(url = %hits[index].url, error = %e, "KPI page fetch failed");
                }
            }
        }

        Ok(KpiEvidence {
            kpi_name: spec.name.clone(),
            hits,
        })
    }

    fn assemble_corpus(&self, result: &CollectionResult) -> String {
        let mut disclosure = CorpusSection::new(SectionKind::Disclosure, DISCLOSURE_ITEM_LIMIT);
        for hit in &result.disclosure_docs {
            disclosure.push(format_hit(hit));
        }

        let mut site = CorpusSection::new(SectionKind::OfficialSite, SITE_ITEM_LIMIT);
        for hit in &result.official_website_docs {
            site.push(format_hit(hit));
            if let Some(content) = &hit.fetched_content {
                site.push(format!("Page content for {}:\n{}", hit.url, content));
            }
        }

        let mut kpi = CorpusSection::new(SectionKind::KpiTargeted, KPI_ITEM_LIMIT);
        for evidence in &result.kpi_evidence {
            if evidence.hits.is_empty() {
                continue;
            }
            let mut item = format!("KPI: {}", evidence.kpi_name);
            for hit in evidence.hits.iter().take(3) {
                item.push_str(&format!("\nSource: {}\nSnippet: {}", hit.url, hit.snippet));
            }
            for hit in evidence.hits.iter().filter(|h| h.fetched_content.is_some()) {
                if let Some(content) = &hit.fetched_content {
                    item.push_str(&format!("\nFetched ({}):\n{}", hit.url, content));
                }
            }
            kpi.push(item);
        }

        let mut ranking = CorpusSection::new(SectionKind::RankingDocs, RANKING_ITEM_LIMIT);
        for doc in &result.ranking_docs {
            ranking.push(format!(
                "{}\nURL: {}\nYear: {}\nScore: {:.1}",
                doc.title,
                doc.url,
                doc.year.map_or("unknown".to_string(), |y| y.to_string()),
                doc.priority_score
            ));
        }

        let mut accreditation =
            CorpusSection::new(SectionKind::Accreditation, ACCREDITATION_ITEM_LIMIT);
        for hit in &result.accreditation_docs {
            accreditation.push(format_hit(hit));
        }

        assemble(
            vec![disclosure, site, kpi, ranking, accreditation],
            self.config.max_corpus_chars,
        )
    }

    fn finish_cancelled(
        &self,
        mut result: CollectionResult,
        progress: &ProgressSink,
    ) -> Result<CollectionResult> {
        info!(
            institution = %result.institution,
            sources = result.total_sources(),
            "collection cancelled, returning partial data"
        );
        result.status = CollectionStatus::Cancelled;
        result.combined_corpus = self.assemble_corpus(&result);
        result.source_priority_breakdown = breakdown(&result);
        result.key_pool_stats = Some(self.searcher.key_pool_stats());
        progress.cancelled();
        Ok(result)
    }

    fn finish_exhausted(
        &self,
        mut result: CollectionResult,
        progress: &ProgressSink,
    ) -> Result<CollectionResult> {
        warn!(
            institution = %result.institution,
            sources = result.total_sources(),
            "all search credentials exhausted, stopping searches"
        );
        result.status = CollectionStatus::SearchesExhausted;
        result.combined_corpus = self.assemble_corpus(&result);
        result.source_priority_breakdown = breakdown(&result);
        result.key_pool_stats = Some(self.searcher.key_pool_stats());
        progress.fail("All search credentials exhausted");
        Ok(result)
    }
}

fn format_hit(hit: &SearchHit) -> String {
    format!(
        "Title: {}\nURL: {}\nSnippet: {}",
        hit.title, hit.url, hit.snippet
    )
}

/// Count hits per source-type label across all sections.
fn breakdown(result: &CollectionResult) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let all_hits = result
        .official_website_docs
        .iter()
        .chain(&result.disclosure_docs)
        .chain(&result.accreditation_docs)
        .chain(result.kpi_evidence.iter().flat_map(|e| &e.hits));
    for hit in all_hits {
        *counts.entry(hit.source_type.label().to_string()).or_insert(0) += 1;
    }
    if !result.ranking_docs.is_empty() {
        *counts.entry("NIRF".to_string()).or_insert(0) += result.ranking_docs.len();
    }
    counts
}

/// Host of a URL with a leading `www.` stripped, for own-domain matching.
fn domain_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
}

/// Common abbreviation for well-known institution names, used to widen
/// search queries. Pattern-based for the national institute families,
/// alias table for the rest.
fn abbreviation_for(institution: &str) -> Option<String> {
    let name_lower = institution.to_lowercase();

    let location_after = |marker: &str, prefix: &str| -> Option<String> {
        let parts: Vec<&str> = institution.split_whitespace().collect();
        parts
            .iter()
            .position(|p| p.to_lowercase() == marker)
            .and_then(|i| parts.get(i + 1))
            .map(|location| format!("{} {}", prefix, location))
    };

    if name_lower.contains("indian institute of information technology") {
        return location_after("technology", "IIIT");
    }
    if name_lower.contains("indian institute of technology") {
        return location_after("technology", "IIT");
    }
    if name_lower.contains("national institute of technology") {
        return location_after("technology", "NIT");
    }
    if name_lower.contains("indian institute of management") {
        return location_after("management", "IIM");
    }
    if name_lower.contains("birla institute of technology") {
        return Some(if name_lower.contains("science") {
            "BITS Pilani".to_string()
        } else {
            "BIT Mesra".to_string()
        });
    }

    const ALIASES: &[(&str, &str)] = &[
        ("vellore institute of technology", "VIT"),
        ("srm institute", "SRM"),
        ("srm university", "SRM"),
        ("amity university", "Amity"),
        ("lovely professional university", "LPU"),
        ("delhi technological university", "DTU"),
        ("punjab engineering college", "PEC Chandigarh"),
        ("thapar", "Thapar University"),
        ("anna university", "Anna University"),
        ("jadavpur university", "Jadavpur University"),
    ];
    ALIASES
        .iter()
        .find(|(pattern, _)| name_lower.contains(pattern))
        .map(|(_, abbr)| abbr.to_string())
}
