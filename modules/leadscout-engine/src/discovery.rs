//! Discovery orchestrator.
//!
//! One run walks `build_queries → search → filter_candidates →
//! fetch_and_classify → dedup_and_suppress → diversity_check → persist →
//! summarize`. Fetch+classify is the only parallel stage, bounded and
//! timeout-guarded; everything else is sequential text processing. A single
//! candidate failing never aborts the run — it is counted and skipped.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use leadscout_common::{
    canonicalize_name, Account, Classification, Disposition, DiscoverySettings, Industry,
    KeywordConfig, TriggerMap,
};
use leadscout_store::{AccountStore, SettingsStore};

use crate::classifier::{is_generic_domain, is_news_outlet_domain, ClassifierInput, EntityClassifier};
use crate::geography::{region_for, GeoResolver};
use crate::providers::{readable_text, PageFetcher, SearchHit, SearchProvider};
use crate::queries;
use crate::run_log::{EventKind, RunLog};
use crate::signals::{high_intent, SignalDetector};

const MAX_ERROR_SAMPLES: usize = 10;

/// Search queries run with this much parallelism; fetches use the runner's
/// configured concurrency.
const SEARCH_CONCURRENCY: usize = 5;

/// Minimum kept candidates before the industry share cap starts binding;
/// below this, shares are too noisy to act on.
const CAP_MIN_SAMPLE: u32 = 5;

// ---------------------------------------------------------------------------
// Invocation modes
// ---------------------------------------------------------------------------

/// Operator-specified discovery parameters for a manual run.
#[derive(Debug, Clone, Default)]
pub struct ManualSpec {
    pub industries: Vec<Industry>,
    pub triggers: Vec<String>,
    pub geos: Vec<String>,
    pub result_count: Option<usize>,
}

#[derive(Debug, Clone)]
pub enum DiscoveryMode {
    /// Thematic rotation by run date.
    Auto,
    Manual(ManualSpec),
}

impl DiscoveryMode {
    fn label(&self) -> &'static str {
        match self {
            DiscoveryMode::Auto => "auto",
            DiscoveryMode::Manual(_) => "manual",
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Stats from a discovery run. Serialized into the run log and the audit
/// trail.
#[derive(Debug, Default, Serialize)]
pub struct DiscoveryStats {
    pub mode: String,
    pub queries_issued: u32,
    pub search_results: u32,
    pub skipped_before_fetch: u32,
    pub fetched: u32,
    pub fetch_failures: u32,
    /// Classification and gate rejections, tallied by reason.
    pub rejected: HashMap<String, u32>,
    pub kept_new: u32,
    pub kept_updated: u32,
    pub suppressed_repeat: u32,
    pub diversity_capped: u32,
    pub fill_queries_issued: u32,
    pub kept_by_industry: HashMap<String, u32>,
    /// Capped sample of candidate-level errors for operator visibility.
    pub errors: Vec<String>,
}

impl DiscoveryStats {
    fn reject(&mut self, reason: &str) {
        *self.rejected.entry(reason.to_string()).or_insert(0) += 1;
    }

    fn record_error(&mut self, error: String) {
        if self.errors.len() < MAX_ERROR_SAMPLES {
            self.errors.push(error);
        }
    }

    fn kept_total(&self) -> u32 {
        self.kept_new + self.kept_updated
    }

    fn kept_for(&self, industry: Option<Industry>) -> u32 {
        let key = industry_key(industry);
        self.kept_by_industry.get(&key).copied().unwrap_or(0)
    }

    fn note_kept(&mut self, industry: Option<Industry>) {
        *self.kept_by_industry.entry(industry_key(industry)).or_insert(0) += 1;
    }
}

fn industry_key(industry: Option<Industry>) -> String {
    industry.map(|i| i.as_str().to_string()).unwrap_or_else(|| "unclassified".to_string())
}

impl std::fmt::Display for DiscoveryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Discovery Run Complete ({}) ===", self.mode)?;
        writeln!(f, "Queries issued:      {}", self.queries_issued)?;
        writeln!(f, "Search results:      {}", self.search_results)?;
        writeln!(f, "Skipped pre-fetch:   {}", self.skipped_before_fetch)?;
        writeln!(f, "Pages fetched:       {}", self.fetched)?;
        writeln!(f, "Fetch failures:      {}", self.fetch_failures)?;
        writeln!(f, "Accounts created:    {}", self.kept_new)?;
        writeln!(f, "Accounts updated:    {}", self.kept_updated)?;
        writeln!(f, "Repeat-suppressed:   {}", self.suppressed_repeat)?;
        writeln!(f, "Diversity-capped:    {}", self.diversity_capped)?;
        if !self.rejected.is_empty() {
            writeln!(f, "\nRejections:")?;
            let mut reasons: Vec<_> = self.rejected.iter().collect();
            reasons.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            for (reason, count) in reasons {
                writeln!(f, "  {reason}: {count}")?;
            }
        }
        if !self.kept_by_industry.is_empty() {
            writeln!(f, "\nKept by industry:")?;
            let mut kept: Vec<_> = self.kept_by_industry.iter().collect();
            kept.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            for (industry, count) in kept {
                writeln!(f, "  {industry}: {count}")?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pipeline types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Candidate {
    url: String,
    domain: String,
    title: String,
}

enum CandidateOutcome {
    Kept {
        account: Box<Account>,
        /// Search-hit title, kept as an extra dedup key.
        title: String,
    },
    Rejected {
        url: String,
        reason: String,
    },
    FetchFailed {
        url: String,
        error: String,
    },
}

// ---------------------------------------------------------------------------
// Pure stage helpers
// ---------------------------------------------------------------------------

/// Normalized host for dedup: lowercased, `www.` stripped.
pub fn normalize_domain(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Article/resource pages are dropped before the fetch: a post about a
/// company is not the company. A careers/about path redeems the URL.
pub fn is_article_path(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let path = parsed.path().to_lowercase();
    let article = ["/blog", "/news", "/article", "/resources", "/press", "/top-", "/best-", "/insights"]
        .iter()
        .any(|p| path.contains(p));
    let redeeming = path.contains("/careers") || path.contains("/about");
    article && !redeeming
}

/// Pre-fetch filter over raw search hits. Dedups by normalized domain across
/// all queries and drops domains we already know or never want, so the
/// expensive crawl stage stays bounded.
fn prefilter(
    hits: Vec<SearchHit>,
    known_domains: &HashSet<String>,
    keywords: &KeywordConfig,
    seen_domains: &mut HashSet<String>,
    stats: &mut DiscoveryStats,
    run_log: &mut RunLog,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    for hit in hits {
        let Some(domain) = normalize_domain(&hit.url) else {
            stats.skipped_before_fetch += 1;
            continue;
        };
        let reason = if !seen_domains.insert(domain.clone()) {
            Some("duplicate_domain")
        } else if known_domains.contains(&domain) {
            Some("already_known")
        } else if is_generic_domain(&domain) {
            Some("generic_domain")
        } else if is_news_outlet_domain(&domain) {
            Some("news_outlet")
        } else if keywords
            .blacklist_domains
            .iter()
            .any(|d| !d.is_empty() && domain.contains(d.to_lowercase().as_str()))
        {
            Some("blacklisted")
        } else if is_article_path(&hit.url) {
            Some("article_path")
        } else {
            None
        };

        if let Some(reason) = reason {
            stats.skipped_before_fetch += 1;
            run_log.log(EventKind::CandidateSkipped {
                url: hit.url.clone(),
                reason: reason.to_string(),
            });
            continue;
        }

        out.push(Candidate {
            url: hit.url,
            domain,
            title: hit.title,
        });
    }
    out
}

/// Repeat-suppression rule: an account created inside the window is only
/// worth touching again when the candidate carries a new strong signal.
/// Repeat discovery of a quiet account is noise; a newly-active one is not.
pub fn should_suppress_repeat(
    existing_created_at: DateTime<Utc>,
    candidate_triggers: &TriggerMap,
    now: DateTime<Utc>,
    window_days: i64,
    high_hiring_threshold: u32,
) -> bool {
    let age = now - existing_created_at;
    age.num_days() < window_days && !candidate_triggers.has_strong_signal(high_hiring_threshold)
}

/// Classify + extract a fetched page into an account, or a rejection reason.
/// Pure with respect to its inputs; all pattern state comes in through the
/// component references.
#[allow(clippy::too_many_arguments)]
fn evaluate_candidate(
    candidate: &Candidate,
    body: &str,
    classifier: &EntityClassifier,
    geo: &GeoResolver,
    detector: &SignalDetector,
    keywords: &KeywordConfig,
    settings: &DiscoverySettings,
    allow_out_of_market: bool,
    provenance: &str,
) -> Result<Account, String> {
    let name = classifier.display_name(body, &candidate.title);

    let classification = classifier.classify(
        &ClassifierInput {
            name: &name,
            domain: Some(&candidate.domain),
            text: body,
        },
        keywords,
    );
    if let Classification::Excluded(reason) = classification {
        return Err(format!("excluded_{}", reason.as_str()));
    }

    // Geography gate: a confirmed in-country headquarters is mandatory.
    let hq = geo.resolve(body);
    if !hq.confirmed_in_country() {
        return Err("geography_unresolved".to_string());
    }
    let region = region_for(hq.state.as_deref());
    if region == leadscout_common::RegionBucket::Other && !allow_out_of_market {
        return Err("out_of_market".to_string());
    }

    // Signals run over the readability-cleaned body to avoid nav noise.
    let clean = readable_text(body, &candidate.url);
    let triggers = detector.detect(&clean);
    let (hi, hi_reasons) = high_intent(&triggers, settings.high_hiring_threshold);

    let (employee_count, employee_range) = classifier
        .extract_employee_count(&clean)
        .map(|(count, range)| (Some(count), range))
        .unwrap_or((None, None));
    let industry = classifier.infer_industry(&name, Some(&candidate.domain), &clean);

    let now = Utc::now();
    Ok(Account {
        id: Uuid::new_v4(),
        canonical_name: canonicalize_name(&name),
        name,
        domain: Some(candidate.domain.clone()),
        website: Some(candidate.url.clone()),
        hq_city: hq.city,
        hq_state: hq.state,
        hq_country: hq.country,
        region,
        industry,
        employee_count,
        employee_range,
        triggers,
        classification: Classification::Employer,
        high_intent: hi,
        high_intent_reasons: hi_reasons,
        disposition: Disposition::Active,
        fit_score: 0.0,
        source: provenance.to_string(),
        created_at: now,
        updated_at: now,
    })
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

pub struct DiscoveryRunner {
    accounts: AccountStore,
    settings_store: SettingsStore,
    searcher: Option<Box<dyn SearchProvider>>,
    fetcher: Box<dyn PageFetcher>,
    fetch_timeout: Duration,
    concurrency: usize,
    allow_out_of_market: bool,
    seed: Option<u64>,
}

impl DiscoveryRunner {
    pub fn new(
        accounts: AccountStore,
        settings_store: SettingsStore,
        searcher: Option<Box<dyn SearchProvider>>,
        fetcher: Box<dyn PageFetcher>,
        fetch_timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            accounts,
            settings_store,
            searcher,
            fetcher,
            fetch_timeout,
            concurrency: concurrency.max(1),
            allow_out_of_market: false,
            seed: None,
        }
    }

    /// Bypass the in-market region gate for this run.
    pub fn allow_out_of_market(mut self, allow: bool) -> Self {
        self.allow_out_of_market = allow;
        self
    }

    /// Fix the query-sampling seed for a reproducible run.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Execute one discovery run. With no search provider configured the
    /// run degrades to enrichment of existing accounts instead of failing.
    pub async fn run(&self, mode: DiscoveryMode) -> Result<DiscoveryStats> {
        let keywords = self.settings_store.keyword_config().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load keyword config, using defaults");
            KeywordConfig::default()
        });
        let settings = self.settings_store.discovery_settings().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load discovery settings, using defaults");
            DiscoverySettings::default()
        });

        let run_id = format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%S"), &Uuid::new_v4().to_string()[..8]);
        let mut run_log = RunLog::new(run_id, mode.label().to_string());

        let mut stats = match &self.searcher {
            Some(searcher) => {
                self.full_run(searcher.as_ref(), &mode, &keywords, &settings, &mut run_log)
                    .await?
            }
            None => {
                info!("No search provider configured; enrichment-only run");
                run_log.log(EventKind::Degraded {
                    reason: "no search credential; enrichment-only".to_string(),
                });
                self.enrichment_run(&keywords, &settings, &mut run_log).await?
            }
        };
        stats.mode = mode.label().to_string();

        if let Err(e) = run_log.save(&stats) {
            warn!(error = %e, "Failed to save discovery run log");
        }
        if let Err(e) = self
            .settings_store
            .audit("discovery_run", serde_json::to_value(&stats)?)
            .await
        {
            warn!(error = %e, "Failed to write discovery audit row");
        }

        info!("{stats}");
        Ok(stats)
    }

    async fn full_run(
        &self,
        searcher: &dyn SearchProvider,
        mode: &DiscoveryMode,
        keywords: &KeywordConfig,
        settings: &DiscoverySettings,
        run_log: &mut RunLog,
    ) -> Result<DiscoveryStats> {
        let mut stats = DiscoveryStats::default();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let today = Utc::now().date_naive();
        let (plan, results_per_query) = match mode {
            DiscoveryMode::Auto => (
                queries::build_auto(&mut rng, today, keywords, settings),
                settings.results_per_query,
            ),
            DiscoveryMode::Manual(spec) => (
                queries::build_manual(
                    &mut rng,
                    &spec.industries,
                    &spec.triggers,
                    &spec.geos,
                    keywords,
                    settings,
                ),
                spec.result_count.unwrap_or(settings.results_per_query),
            ),
        };
        let provenance = format!("discovery:{}", mode.label());

        let known_domains = self.accounts.known_domains().await?;
        let mut seen_domains: HashSet<String> = HashSet::new();

        // Main sweep.
        let hits = self
            .search_stage(searcher, &plan.queries, results_per_query, &mut stats, run_log)
            .await;
        let candidates = prefilter(hits, &known_domains, keywords, &mut seen_domains, &mut stats, run_log);
        self.process_candidates(candidates, keywords, settings, &provenance, &mut stats, run_log)
            .await?;

        // Diversity floor: bounded fill rounds for targeted industries that
        // came up short.
        let kept_total = stats.kept_total();
        if kept_total > 0 {
            let mut fill_plans: Vec<(Industry, Vec<String>)> = Vec::new();
            for industry in &plan.target_industries {
                let share = stats.kept_for(Some(*industry)) as f32 / kept_total as f32;
                if share < settings.industry_floor_share {
                    let qs = queries::fill_queries(&mut rng, *industry, settings.max_fill_queries);
                    if !qs.is_empty() {
                        fill_plans.push((*industry, qs));
                    }
                }
            }
            for (industry, fill) in fill_plans {
                run_log.log(EventKind::FillRound {
                    industry: industry.as_str().to_string(),
                    queries: fill.len() as u32,
                });
                stats.fill_queries_issued += fill.len() as u32;
                let hits = self
                    .search_stage(searcher, &fill, results_per_query, &mut stats, run_log)
                    .await;
                let candidates =
                    prefilter(hits, &known_domains, keywords, &mut seen_domains, &mut stats, run_log);
                self.process_candidates(candidates, keywords, settings, &provenance, &mut stats, run_log)
                    .await?;
            }
        }

        Ok(stats)
    }

    /// Issue queries with bounded parallelism; per-query failures are
    /// logged, counted, and skipped.
    async fn search_stage(
        &self,
        searcher: &dyn SearchProvider,
        query_list: &[String],
        results_per_query: usize,
        stats: &mut DiscoveryStats,
        run_log: &mut RunLog,
    ) -> Vec<SearchHit> {
        let results: Vec<(String, Result<Vec<SearchHit>>)> =
            stream::iter(query_list.iter().cloned().map(|query| async move {
                let result = searcher.search(&query, results_per_query).await;
                (query, result)
            }))
            .buffer_unordered(SEARCH_CONCURRENCY)
            .collect()
            .await;

        let mut hits = Vec::new();
        for (query, result) in results {
            stats.queries_issued += 1;
            match result {
                Ok(batch) => {
                    stats.search_results += batch.len() as u32;
                    run_log.log(EventKind::SearchQuery {
                        query,
                        result_count: batch.len() as u32,
                    });
                    hits.extend(batch);
                }
                Err(e) => {
                    warn!(query = query.as_str(), error = %e, "Search query failed");
                    stats.record_error(format!("search '{query}': {e}"));
                }
            }
        }
        hits
    }

    /// Fetch and classify candidates with bounded concurrency, then merge
    /// the batch results sequentially into the store.
    async fn process_candidates(
        &self,
        candidates: Vec<Candidate>,
        keywords: &KeywordConfig,
        settings: &DiscoverySettings,
        provenance: &str,
        stats: &mut DiscoveryStats,
        run_log: &mut RunLog,
    ) -> Result<()> {
        let budget_left = settings.candidate_cap.saturating_sub(stats.fetched as usize);
        let candidates: Vec<Candidate> = candidates.into_iter().take(budget_left).collect();
        if candidates.is_empty() {
            return Ok(());
        }

        let classifier = EntityClassifier::new();
        let geo = GeoResolver::new();
        let detector = SignalDetector::new(keywords, settings.default_open_roles);

        let classifier_ref = &classifier;
        let geo_ref = &geo;
        let detector_ref = &detector;
        let fetcher = self.fetcher.as_ref();
        let timeout = self.fetch_timeout;
        let allow_out_of_market = self.allow_out_of_market;

        let outcomes: Vec<CandidateOutcome> =
            stream::iter(candidates.into_iter().map(|candidate| async move {
                let body = match fetcher.fetch(&candidate.url, timeout).await {
                    Ok(b) if !b.trim().is_empty() => b,
                    Ok(_) => {
                        return CandidateOutcome::FetchFailed {
                            url: candidate.url,
                            error: "empty body".to_string(),
                        }
                    }
                    Err(e) => {
                        return CandidateOutcome::FetchFailed {
                            url: candidate.url,
                            error: e.to_string(),
                        }
                    }
                };

                match evaluate_candidate(
                    &candidate,
                    &body,
                    classifier_ref,
                    geo_ref,
                    detector_ref,
                    keywords,
                    settings,
                    allow_out_of_market,
                    provenance,
                ) {
                    Ok(account) => CandidateOutcome::Kept {
                        account: Box::new(account),
                        title: candidate.title,
                    },
                    Err(reason) => CandidateOutcome::Rejected {
                        url: candidate.url,
                        reason,
                    },
                }
            }))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        // Sequential merge: dedup, repeat suppression, diversity cap,
        // persistence.
        let now = Utc::now();
        for outcome in outcomes {
            match outcome {
                CandidateOutcome::FetchFailed { url, error } => {
                    warn!(url = url.as_str(), error = error.as_str(), "Candidate fetch failed");
                    stats.fetch_failures += 1;
                    stats.record_error(format!("fetch {url}: {error}"));
                    run_log.log(EventKind::FetchFailed { url, error });
                }
                CandidateOutcome::Rejected { url, reason } => {
                    stats.fetched += 1;
                    stats.reject(&reason);
                    run_log.log(EventKind::CandidateRejected { url, reason });
                }
                CandidateOutcome::Kept { account, title } => {
                    stats.fetched += 1;
                    self.merge_candidate(*account, &title, settings, now, stats, run_log)
                        .await?;
                }
            }
        }

        Ok(())
    }

    async fn merge_candidate(
        &self,
        account: Account,
        search_title: &str,
        settings: &DiscoverySettings,
        now: DateTime<Utc>,
        stats: &mut DiscoveryStats,
        run_log: &mut RunLog,
    ) -> Result<()> {
        let mut dedup_names = vec![account.canonical_name.clone()];
        let title_key = canonicalize_name(search_title);
        if !title_key.is_empty() && title_key != account.canonical_name {
            dedup_names.push(title_key);
        }
        let existing = self
            .accounts
            .find_by_dedup_keys(&dedup_names, account.domain.as_deref())
            .await?;

        match existing {
            Some(mut existing) => {
                if should_suppress_repeat(
                    existing.created_at,
                    &account.triggers,
                    now,
                    settings.repeat_window_days,
                    settings.high_hiring_threshold,
                ) {
                    stats.suppressed_repeat += 1;
                    run_log.log(EventKind::RepeatSuppressed {
                        name: existing.name.clone(),
                        account_age_days: (now - existing.created_at).num_days(),
                    });
                    return Ok(());
                }

                existing.triggers.merge_from(account.triggers);
                existing.domain = existing.domain.or(account.domain);
                existing.website = existing.website.or(account.website);
                existing.hq_city = account.hq_city.or(existing.hq_city);
                existing.hq_state = account.hq_state.or(existing.hq_state);
                existing.hq_country = account.hq_country.or(existing.hq_country);
                existing.region = account.region;
                existing.industry = account.industry.or(existing.industry);
                existing.employee_count = account.employee_count.or(existing.employee_count);
                existing.employee_range = account.employee_range.or(existing.employee_range);
                let (hi, hi_reasons) =
                    high_intent(&existing.triggers, settings.high_hiring_threshold);
                existing.high_intent = hi;
                existing.high_intent_reasons = hi_reasons;

                self.accounts.update_discovery(&existing).await?;
                stats.kept_updated += 1;
                stats.note_kept(existing.industry);
                run_log.log(EventKind::AccountUpdated {
                    account_id: existing.id.to_string(),
                    name: existing.name.clone(),
                });
            }
            None => {
                // Hard share cap on the one configured industry: once the
                // run has a meaningful sample, stop inserting more of it.
                if account.industry == Some(settings.capped_industry)
                    && stats.kept_total() >= CAP_MIN_SAMPLE
                {
                    let share = (stats.kept_for(account.industry) + 1) as f32
                        / (stats.kept_total() + 1) as f32;
                    if share > settings.industry_cap_share {
                        stats.diversity_capped += 1;
                        run_log.log(EventKind::DiversityCapped {
                            name: account.name.clone(),
                            industry: industry_key(account.industry),
                        });
                        return Ok(());
                    }
                }

                self.accounts.insert(&account).await?;
                stats.kept_new += 1;
                stats.note_kept(account.industry);
                run_log.log(EventKind::AccountCreated {
                    account_id: account.id.to_string(),
                    name: account.name.clone(),
                    industry: account.industry.map(|i| i.as_str().to_string()),
                    region: account.region.as_str().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Degraded mode: refresh triggers and geography on accounts we already
    /// hold, oldest first, instead of discovering new ones.
    async fn enrichment_run(
        &self,
        keywords: &KeywordConfig,
        settings: &DiscoverySettings,
        run_log: &mut RunLog,
    ) -> Result<DiscoveryStats> {
        let mut stats = DiscoveryStats::default();
        let targets = self
            .accounts
            .enrichment_targets(settings.candidate_cap as i64)
            .await?;
        info!(targets = targets.len(), "Enrichment-only discovery");

        let classifier = EntityClassifier::new();
        let geo = GeoResolver::new();
        let detector = SignalDetector::new(keywords, settings.default_open_roles);

        let fetcher = self.fetcher.as_ref();
        let timeout = self.fetch_timeout;

        let refreshed: Vec<(Account, Result<String, String>)> =
            stream::iter(targets.into_iter().map(|account| async move {
                let url = account.website.clone().unwrap_or_default();
                let body = fetcher
                    .fetch(&url, timeout)
                    .await
                    .map_err(|e| e.to_string());
                (account, body)
            }))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (mut account, body) in refreshed {
            let body = match body {
                Ok(b) if !b.trim().is_empty() => b,
                Ok(_) => {
                    stats.fetch_failures += 1;
                    continue;
                }
                Err(e) => {
                    stats.fetch_failures += 1;
                    stats.record_error(format!("enrich {}: {e}", account.name));
                    continue;
                }
            };
            stats.fetched += 1;

            let url = account.website.clone().unwrap_or_default();
            let clean = readable_text(&body, &url);
            let fresh = detector.detect(&clean);
            account.triggers.merge_from(fresh);

            let hq = geo.resolve(&body);
            if hq.confirmed_in_country() {
                account.region = region_for(hq.state.as_deref());
                account.hq_city = hq.city.or(account.hq_city);
                account.hq_state = hq.state.or(account.hq_state);
                account.hq_country = hq.country.or(account.hq_country);
            }
            if account.employee_count.is_none() {
                if let Some((count, range)) = classifier.extract_employee_count(&clean) {
                    account.employee_count = Some(count);
                    account.employee_range = range;
                }
            }
            let (hi, hi_reasons) = high_intent(&account.triggers, settings.high_hiring_threshold);
            account.high_intent = hi;
            account.high_intent_reasons = hi_reasons;

            self.accounts.update_discovery(&account).await?;
            stats.kept_updated += 1;
            stats.note_kept(account.industry);
            run_log.log(EventKind::EnrichmentRefreshed {
                account_id: account.id.to_string(),
                name: account.name.clone(),
            });
        }

        Ok(stats)
    }
}

// ===========================================================================
// Unit tests (pure stages)
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use leadscout_common::HiringSignal;

    #[test]
    fn normalize_domain_strips_www_and_lowercases() {
        assert_eq!(
            normalize_domain("https://WWW.BuckeyePrecision.com/about"),
            Some("buckeyeprecision.com".to_string())
        );
        assert_eq!(normalize_domain("not a url"), None);
    }

    #[test]
    fn article_paths_dropped_unless_redeemed() {
        assert!(is_article_path("https://example.com/blog/top-10-companies"));
        assert!(is_article_path("https://example.com/news/2026/expansion"));
        assert!(!is_article_path("https://example.com/about/news-and-blog"));
        assert!(!is_article_path("https://example.com/careers"));
        assert!(!is_article_path("https://example.com/"));
    }

    #[test]
    fn repeat_suppression_needs_strong_signal_inside_window() {
        let now = Utc::now();
        let ten_days_old = now - ChronoDuration::days(10);
        let fifty_days_old = now - ChronoDuration::days(50);

        let quiet = TriggerMap::default();
        let surging = TriggerMap {
            hiring: Some(HiringSignal { open_roles: 12, evidence: "12 open roles".into() }),
            ..Default::default()
        };
        let modest = TriggerMap {
            hiring: Some(HiringSignal { open_roles: 3, evidence: "hiring".into() }),
            ..Default::default()
        };

        // 10-day-old account, nothing new this run: suppressed.
        assert!(should_suppress_repeat(ten_days_old, &quiet, now, 30, 10));
        // Modest hiring is not a strong signal.
        assert!(should_suppress_repeat(ten_days_old, &modest, now, 30, 10));
        // A strong signal re-surfaces a young account.
        assert!(!should_suppress_repeat(ten_days_old, &surging, now, 30, 10));
        // Outside the window the rule does not apply at all.
        assert!(!should_suppress_repeat(fifty_days_old, &quiet, now, 30, 10));
    }

    fn employer_page(extra: &str) -> String {
        let filler = "We machine precision components for demanding customers. ".repeat(12);
        format!(
            r#"<html><head><title>Buckeye Precision Machining Inc | Home</title>
            <script type="application/ld+json">{{"@type":"Organization",
            "name":"Buckeye Precision Machining Inc",
            "address":{{"addressLocality":"Columbus","addressRegion":"OH","addressCountry":"US"}}}}</script>
            </head><body>{filler}
            About Us: family-owned since 1985. Contact Us: 4200 Commerce Rd, Columbus, OH.
            Careers: {extra}</body></html>"#
        )
    }

    fn pipeline_parts() -> (EntityClassifier, GeoResolver, SignalDetector, KeywordConfig, DiscoverySettings) {
        let keywords = KeywordConfig::default();
        let settings = DiscoverySettings::default();
        let detector = SignalDetector::new(&keywords, settings.default_open_roles);
        (EntityClassifier::new(), GeoResolver::new(), detector, keywords, settings)
    }

    #[test]
    fn evaluate_keeps_an_in_market_employer() {
        let (classifier, geo, detector, keywords, settings) = pipeline_parts();
        let candidate = Candidate {
            url: "https://buckeyeprecision.com/".to_string(),
            domain: "buckeyeprecision.com".to_string(),
            title: "Buckeye Precision".to_string(),
        };
        let body = employer_page("we have 12 open positions across two shifts.");

        let account = evaluate_candidate(
            &candidate, &body, &classifier, &geo, &detector, &keywords, &settings, false,
            "discovery:auto",
        )
        .expect("kept");

        assert_eq!(account.name, "Buckeye Precision Machining Inc");
        assert_eq!(account.canonical_name, "buckeye precision machining");
        assert_eq!(account.hq_state.as_deref(), Some("OH"));
        assert_eq!(account.region, leadscout_common::RegionBucket::Primary);
        assert_eq!(account.classification, Classification::Employer);
        assert_eq!(account.triggers.hiring.as_ref().unwrap().open_roles, 12);
        assert!(account.high_intent);
        assert_eq!(account.disposition, Disposition::Active);
    }

    #[test]
    fn evaluate_rejects_unresolvable_geography() {
        let (classifier, geo, detector, keywords, settings) = pipeline_parts();
        let candidate = Candidate {
            url: "https://nowhere.example.com/".to_string(),
            domain: "nowhere.example.com".to_string(),
            title: "Nowhere Co".to_string(),
        };
        let filler = "We are a mysterious global brand with no address anywhere. ".repeat(12);
        let body = format!(
            "<html><title>Nowhere Co Inc</title><body>{filler} About us. Contact us.</body></html>"
        );

        let err = evaluate_candidate(
            &candidate, &body, &classifier, &geo, &detector, &keywords, &settings, false,
            "discovery:auto",
        )
        .unwrap_err();
        assert_eq!(err, "geography_unresolved");
    }

    #[test]
    fn evaluate_gates_out_of_market_without_override() {
        let (classifier, geo, detector, keywords, settings) = pipeline_parts();
        let candidate = Candidate {
            url: "https://lonestarmfg.com/".to_string(),
            domain: "lonestarmfg.com".to_string(),
            title: "Lone Star Mfg".to_string(),
        };
        let filler = "Precision fabrication for the energy sector. ".repeat(14);
        let body = format!(
            r#"<html><title>Lone Star Manufacturing LLC</title><body>{filler}
            About Us. Contact Us: 12 Ranch Road, Austin, TX 78701. Careers.</body></html>"#
        );

        let gated = evaluate_candidate(
            &candidate, &body, &classifier, &geo, &detector, &keywords, &settings, false,
            "discovery:auto",
        );
        assert_eq!(gated.unwrap_err(), "out_of_market");

        let allowed = evaluate_candidate(
            &candidate, &body, &classifier, &geo, &detector, &keywords, &settings, true,
            "discovery:auto",
        );
        let account = allowed.expect("kept with override");
        assert_eq!(account.region, leadscout_common::RegionBucket::Other);
        assert_eq!(account.hq_state.as_deref(), Some("TX"));
    }

    #[test]
    fn evaluate_rejects_listicle_with_plausible_title() {
        let (classifier, geo, detector, keywords, settings) = pipeline_parts();
        let candidate = Candidate {
            url: "https://regionlists.com/rankings".to_string(),
            domain: "regionlists.com".to_string(),
            title: "Top 25 Employers in the Region".to_string(),
        };
        let filler = "Our annual ranked list of employers worth watching this year. ".repeat(12);
        let body = format!(
            r#"<html><title>Top 25 Employers in the Region</title><body>{filler}
            Featuring Buckeye Precision Machining of Columbus, OH. About us. Contact us.</body></html>"#
        );

        let err = evaluate_candidate(
            &candidate, &body, &classifier, &geo, &detector, &keywords, &settings, false,
            "discovery:auto",
        )
        .unwrap_err();
        assert_eq!(err, "excluded_generic");
    }
}
