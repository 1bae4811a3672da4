use std::env;

use serde::{Deserialize, Serialize};

use crate::types::Industry;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Search provider (optional: absence degrades discovery to
    // enrichment-only mode rather than failing the run)
    pub serper_api_key: Option<String>,

    // Fetch stage
    pub fetch_timeout_secs: u64,
    pub fetch_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            serper_api_key: env::var("SERPER_API_KEY").ok().filter(|k| !k.is_empty()),
            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .expect("FETCH_TIMEOUT_SECS must be a number"),
            fetch_concurrency: env::var("FETCH_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .expect("FETCH_CONCURRENCY must be a number"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

// ---------------------------------------------------------------------------
// Operator-tunable keyword configuration
// ---------------------------------------------------------------------------

/// Keyword lists, exclusion lists, and classifier toggles. Loaded from the
/// `keyword_config` table each run so operators can tune detection without a
/// redeploy; these defaults seed a fresh install.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    /// Insurance carrier / vendor names for the carrier-exclusion filter and
    /// the vendor-change proximity detector.
    pub carrier_names: Vec<String>,
    /// Phrases that signal a vendor/carrier switch when found near a carrier
    /// name.
    pub vendor_change_phrases: Vec<String>,
    /// Freeform trigger vocabulary for query building and news keyword hits.
    pub trigger_keywords: Vec<String>,
    pub blacklist_domains: Vec<String>,
    pub blacklist_names: Vec<String>,
    pub allow_education: bool,
    pub allow_government: bool,
    pub allow_hospital_systems: bool,
    pub allow_research_labs: bool,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            carrier_names: [
                "anthem",
                "aetna",
                "cigna",
                "humana",
                "unitedhealthcare",
                "united healthcare",
                "medical mutual",
                "kaiser permanente",
                "blue cross",
                "blue shield",
                "metlife",
                "guardian life",
                "principal financial",
                "mutual of omaha",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            vendor_change_phrases: [
                "switched from",
                "switching from",
                "moved away from",
                "moving away from",
                "replaced",
                "replacing",
                "left",
                "leaving",
                "dropped",
                "transitioned from",
                "new broker",
                "new carrier",
                "changed carriers",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            trigger_keywords: [
                "open enrollment",
                "employee benefits",
                "benefits renewal",
                "group health plan",
                "expansion",
                "new headquarters",
                "acquisition",
                "merger",
                "rapid growth",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            blacklist_domains: Vec::new(),
            blacklist_names: Vec::new(),
            allow_education: false,
            allow_government: false,
            allow_hospital_systems: false,
            allow_research_labs: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery settings
// ---------------------------------------------------------------------------

/// Sweep-size caps and operational tuning values for a discovery run.
/// Loaded from the `discovery_settings` table; these values are deliberately
/// configuration, not constants — the repeat window and diversity shares are
/// operational tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Maximum distinct search queries issued per run.
    pub max_queries: usize,
    /// Search results requested per query.
    pub results_per_query: usize,
    /// Hard cap on candidates entering the fetch stage.
    pub candidate_cap: usize,
    /// Accounts created within this window are suppressed on repeat
    /// discovery unless they carry a new strong signal.
    pub repeat_window_days: i64,
    /// The one industry subject to the hard share cap.
    pub capped_industry: Industry,
    pub industry_cap_share: f32,
    /// Targeted industries below this share trigger fill queries.
    pub industry_floor_share: f32,
    /// Fill queries issued per under-represented industry.
    pub max_fill_queries: usize,
    /// Hiring magnitude assumed when a hiring phrase matches without a count.
    pub default_open_roles: u32,
    /// Open-role count at/above which hiring counts as a strong signal.
    pub high_hiring_threshold: u32,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            max_queries: 12,
            results_per_query: 8,
            candidate_cap: 60,
            repeat_window_days: 30,
            capped_industry: Industry::HealthcareSocialAssistance,
            industry_cap_share: 0.40,
            industry_floor_share: 0.10,
            max_fill_queries: 2,
            default_open_roles: 3,
            high_hiring_threshold: 10,
        }
    }
}
