use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Geography ---

/// Tiered geographic classification used for scoring floors and selection quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionBucket {
    Primary,
    Secondary,
    Other,
}

impl RegionBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionBucket::Primary => "primary",
            RegionBucket::Secondary => "secondary",
            RegionBucket::Other => "other",
        }
    }

    /// Parse a stored region value. Unknown values fall back to `Other`.
    pub fn parse(s: &str) -> Self {
        match s {
            "primary" => RegionBucket::Primary,
            "secondary" => RegionBucket::Secondary,
            _ => RegionBucket::Other,
        }
    }
}

impl std::fmt::Display for RegionBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// --- Industry ---

/// Closed industry category set. Inference never guesses a default; an
/// unmatched account carries `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    HealthcareSocialAssistance,
    Manufacturing,
    Construction,
    ProfessionalServices,
    FinanceInsurance,
    TransportationWarehousing,
    RetailTrade,
    HospitalityFood,
    EducationServices,
    Technology,
    Nonprofit,
    StaffingRecruiting,
}

impl Industry {
    pub fn as_str(&self) -> &'static str {
        match self {
            Industry::HealthcareSocialAssistance => "healthcare and social assistance",
            Industry::Manufacturing => "manufacturing",
            Industry::Construction => "construction",
            Industry::ProfessionalServices => "professional services",
            Industry::FinanceInsurance => "finance and insurance",
            Industry::TransportationWarehousing => "transportation and warehousing",
            Industry::RetailTrade => "retail trade",
            Industry::HospitalityFood => "hospitality and food services",
            Industry::EducationServices => "education services",
            Industry::Technology => "technology",
            Industry::Nonprofit => "nonprofit",
            Industry::StaffingRecruiting => "staffing and recruiting",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.as_str() == s)
    }

    pub const ALL: [Industry; 12] = [
        Industry::HealthcareSocialAssistance,
        Industry::Manufacturing,
        Industry::Construction,
        Industry::ProfessionalServices,
        Industry::FinanceInsurance,
        Industry::TransportationWarehousing,
        Industry::RetailTrade,
        Industry::HospitalityFood,
        Industry::EducationServices,
        Industry::Technology,
        Industry::Nonprofit,
        Industry::StaffingRecruiting,
    ];
}

impl std::fmt::Display for Industry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// --- Classification ---

/// Why the classifier excluded a candidate page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    Vendor,
    HospitalSystem,
    ResearchLab,
    Ecosystem,
    Education,
    Government,
    Generic,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::Vendor => "vendor",
            ExclusionReason::HospitalSystem => "hospital_system",
            ExclusionReason::ResearchLab => "research_lab",
            ExclusionReason::Ecosystem => "ecosystem",
            ExclusionReason::Education => "education",
            ExclusionReason::Government => "government",
            ExclusionReason::Generic => "generic",
        }
    }
}

/// Outcome of entity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Employer,
    Excluded(ExclusionReason),
}

impl Classification {
    pub fn as_str(&self) -> String {
        match self {
            Classification::Employer => "employer".to_string(),
            Classification::Excluded(r) => format!("excluded_{}", r.as_str()),
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "employer" => Classification::Employer,
            "excluded_vendor" => Classification::Excluded(ExclusionReason::Vendor),
            "excluded_hospital_system" => Classification::Excluded(ExclusionReason::HospitalSystem),
            "excluded_research_lab" => Classification::Excluded(ExclusionReason::ResearchLab),
            "excluded_ecosystem" => Classification::Excluded(ExclusionReason::Ecosystem),
            "excluded_education" => Classification::Excluded(ExclusionReason::Education),
            "excluded_government" => Classification::Excluded(ExclusionReason::Government),
            _ => Classification::Excluded(ExclusionReason::Generic),
        }
    }
}

// --- Disposition ---

/// Account lifecycle state controlling eligibility for scoring/selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Active,
    NeedsReview,
    Suppressed,
    Rejected(String),
}

impl Disposition {
    pub fn as_str(&self) -> String {
        match self {
            Disposition::Active => "active".to_string(),
            Disposition::NeedsReview => "needs_review".to_string(),
            Disposition::Suppressed => "suppressed".to_string(),
            Disposition::Rejected(reason) => format!("rejected_{reason}"),
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "active" => Disposition::Active,
            "needs_review" => Disposition::NeedsReview,
            "suppressed" => Disposition::Suppressed,
            other => match other.strip_prefix("rejected_") {
                Some(reason) => Disposition::Rejected(reason.to_string()),
                // Unknown values are quarantined rather than silently activated.
                None => Disposition::NeedsReview,
            },
        }
    }

    /// Eligible for scoring and selection.
    pub fn scoreable(&self) -> bool {
        matches!(self, Disposition::Active | Disposition::NeedsReview)
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// --- Trigger signals ---

/// Detected hiring-velocity evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiringSignal {
    pub open_roles: u32,
    pub evidence: String,
}

/// Detected funding-round evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingSignal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Recency stated in the source text; `None` means unknown and is
    /// treated as immediate by scoring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_ago: Option<u32>,
}

/// Detected leadership appointment (HR/People leadership or C-suite).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleChangeSignal {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_ago: Option<u32>,
}

/// Detected vendor/carrier change: a configured vendor name and a configured
/// change phrase found within a proximity window of each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorChangeSignal {
    pub vendor: String,
    pub phrase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_ago: Option<u32>,
}

impl VendorChangeSignal {
    /// A change is "recent" when the text states a recency within 90 days,
    /// or states none at all.
    pub fn is_recent(&self) -> bool {
        self.days_ago.map_or(true, |d| d <= 90)
    }
}

/// Press-release language and freeform keyword hits. Informational only,
/// never scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsSignal {
    pub press_release: bool,
    #[serde(default)]
    pub keyword_hits: Vec<String>,
}

/// Structured map of detected signal categories. A category that was not
/// detected is omitted entirely; key presence IS the detection signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hiring: Option<HiringSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding: Option<FundingSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leadership_change: Option<RoleChangeSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csuite_change: Option<RoleChangeSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_change: Option<VendorChangeSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news: Option<NewsSignal>,
}

impl TriggerMap {
    pub fn is_empty(&self) -> bool {
        self.hiring.is_none()
            && self.funding.is_none()
            && self.leadership_change.is_none()
            && self.csuite_change.is_none()
            && self.vendor_change.is_none()
            && self.news.is_none()
    }

    /// A strong signal justifies re-surfacing an account discovered within
    /// the repeat-suppression window: funding, HR/C-suite change, vendor
    /// change, or hiring at/above the high-volume threshold.
    pub fn has_strong_signal(&self, high_hiring_threshold: u32) -> bool {
        self.funding.is_some()
            || self.leadership_change.is_some()
            || self.csuite_change.is_some()
            || self.vendor_change.is_some()
            || self
                .hiring
                .as_ref()
                .is_some_and(|h| h.open_roles >= high_hiring_threshold)
    }

    /// Merge freshly detected signals over the stored map. Newly detected
    /// categories replace their stored counterparts; categories absent from
    /// `newer` keep their stored evidence.
    pub fn merge_from(&mut self, newer: TriggerMap) {
        if newer.hiring.is_some() {
            self.hiring = newer.hiring;
        }
        if newer.funding.is_some() {
            self.funding = newer.funding;
        }
        if newer.leadership_change.is_some() {
            self.leadership_change = newer.leadership_change;
        }
        if newer.csuite_change.is_some() {
            self.csuite_change = newer.csuite_change;
        }
        if newer.vendor_change.is_some() {
            self.vendor_change = newer.vendor_change;
        }
        if newer.news.is_some() {
            self.news = newer.news;
        }
    }
}

// --- Account ---

/// A candidate or confirmed target employer organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    /// Normalized for dedup: legal suffixes stripped, punctuation removed,
    /// case-folded.
    pub canonical_name: String,
    pub domain: Option<String>,
    pub website: Option<String>,
    pub hq_city: Option<String>,
    pub hq_state: Option<String>,
    pub hq_country: Option<String>,
    pub region: RegionBucket,
    pub industry: Option<Industry>,
    pub employee_count: Option<i32>,
    pub employee_range: Option<String>,
    pub triggers: TriggerMap,
    pub classification: Classification,
    pub high_intent: bool,
    pub high_intent_reasons: Vec<String>,
    pub disposition: Disposition,
    pub fit_score: f32,
    /// Discovery provenance label (e.g. "discovery:auto", "discovery:manual").
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Strip legal suffixes and punctuation and case-fold a company name for
/// dedup comparison.
pub fn canonicalize_name(name: &str) -> String {
    const LEGAL_SUFFIXES: &[&str] = &[
        "inc", "incorporated", "llc", "llp", "ltd", "limited", "corp", "corporation", "co",
        "company", "plc", "pllc", "lp", "pc",
    ];

    let lowered: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    let mut words: Vec<&str> = lowered.split_whitespace().collect();
    while let Some(last) = words.last() {
        if LEGAL_SUFFIXES.contains(last) {
            words.pop();
        } else {
            break;
        }
    }
    words.join(" ")
}

// --- Contact ---

/// A person associated with an account. Owned by the external
/// contact-management subsystem; the engine reads presence fields only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub account_id: Uuid,
    pub title: Option<String>,
    pub has_email: bool,
    pub has_phone: bool,
    pub has_profile: bool,
}

/// Aggregate reachability view over an account's contacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactSummary {
    pub with_email: u32,
    pub with_phone: u32,
    pub with_profile: u32,
    pub senior_finance_hr: bool,
}

impl ContactSummary {
    pub fn from_contacts(contacts: &[Contact]) -> Self {
        let mut summary = ContactSummary::default();
        for c in contacts {
            if c.has_email {
                summary.with_email += 1;
            }
            if c.has_phone {
                summary.with_phone += 1;
            }
            if c.has_profile {
                summary.with_profile += 1;
            }
            if c.title.as_deref().is_some_and(is_senior_finance_hr_title) {
                summary.senior_finance_hr = true;
            }
        }
        summary
    }
}

/// Senior Finance/HR titles count toward reachability and are the primary
/// buying audience.
pub fn is_senior_finance_hr_title(title: &str) -> bool {
    const SENIOR_TITLES: &[&str] = &[
        "cfo",
        "chief financial",
        "chro",
        "chief people",
        "chief human resources",
        "vp of finance",
        "vp finance",
        "vp of people",
        "vp people",
        "vp of human resources",
        "vp human resources",
        "head of people",
        "head of hr",
        "director of human resources",
        "director of hr",
        "hr director",
        "director of benefits",
        "benefits director",
        "controller",
    ];
    let t = title.to_lowercase();
    SENIOR_TITLES.iter().any(|s| t.contains(s))
}

// --- Score breakdown ---

/// Fixed-shape per-factor score record. The selection engine's tie-breaks
/// and the UI's explanation rendering both read named fields, never an open
/// map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub industry: f32,
    pub size: f32,
    pub hiring: f32,
    pub csuite: f32,
    pub role_change: f32,
    pub funding: f32,
    pub reachability: f32,
    pub raw: f32,
    pub normalized: f32,
    pub stars: u8,
    /// True when the no-domain/no-website or suppressed/rejected guardrail
    /// zeroed the account.
    pub zeroed: bool,
}

impl ScoreBreakdown {
    pub fn fit(&self) -> f32 {
        self.industry + self.size
    }

    pub fn timing(&self) -> f32 {
        self.hiring + self.csuite + self.role_change + self.funding
    }
}

// --- Lead queue ---

/// Immutable snapshot row produced by one selection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadQueueEntry {
    pub id: Uuid,
    pub run_date: NaiveDate,
    pub account_id: Uuid,
    pub rank: i32,
    pub score: f32,
    pub stars: i16,
    pub breakdown: ScoreBreakdown,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_strips_suffix_and_punctuation() {
        assert_eq!(canonicalize_name("Acme Industries, Inc."), "acme industries");
        assert_eq!(canonicalize_name("Blue Heron Manufacturing LLC"), "blue heron manufacturing");
        assert_eq!(canonicalize_name("Ridgeway & Sons Co."), "ridgeway sons");
    }

    #[test]
    fn canonicalize_strips_stacked_suffixes() {
        assert_eq!(canonicalize_name("Summit Holdings Company, LLC"), "summit holdings");
    }

    #[test]
    fn disposition_round_trips_rejected_reasons() {
        let d = Disposition::Rejected("vendor".to_string());
        assert_eq!(d.as_str(), "rejected_vendor");
        assert_eq!(Disposition::parse("rejected_vendor"), d);
        assert!(!d.scoreable());
        assert!(Disposition::parse("needs_review").scoreable());
    }

    #[test]
    fn trigger_map_omits_absent_categories_in_json() {
        let map = TriggerMap {
            hiring: Some(HiringSignal { open_roles: 4, evidence: "4 open positions".into() }),
            ..Default::default()
        };
        let json = serde_json::to_value(&map).unwrap();
        assert!(json.get("hiring").is_some());
        assert!(json.get("funding").is_none());
        assert!(json.get("news").is_none());
    }

    #[test]
    fn strong_signal_requires_high_volume_hiring() {
        let quiet = TriggerMap {
            hiring: Some(HiringSignal { open_roles: 3, evidence: "hiring".into() }),
            ..Default::default()
        };
        assert!(!quiet.has_strong_signal(10));

        let surging = TriggerMap {
            hiring: Some(HiringSignal { open_roles: 12, evidence: "hiring".into() }),
            ..Default::default()
        };
        assert!(surging.has_strong_signal(10));

        let funded = TriggerMap {
            funding: Some(FundingSignal { stage: Some("Series B".into()), days_ago: None }),
            ..Default::default()
        };
        assert!(funded.has_strong_signal(10));
    }

    #[test]
    fn merge_keeps_stored_categories_missing_from_newer() {
        let mut stored = TriggerMap {
            funding: Some(FundingSignal { stage: Some("Seed".into()), days_ago: Some(200) }),
            ..Default::default()
        };
        let newer = TriggerMap {
            hiring: Some(HiringSignal { open_roles: 8, evidence: "8 open roles".into() }),
            ..Default::default()
        };
        stored.merge_from(newer);
        assert!(stored.funding.is_some());
        assert_eq!(stored.hiring.as_ref().unwrap().open_roles, 8);
    }

    #[test]
    fn contact_summary_counts_presence_and_seniority() {
        let account_id = Uuid::new_v4();
        let contacts = vec![
            Contact {
                id: Uuid::new_v4(),
                account_id,
                title: Some("CFO".into()),
                has_email: true,
                has_phone: false,
                has_profile: true,
            },
            Contact {
                id: Uuid::new_v4(),
                account_id,
                title: Some("Office Manager".into()),
                has_email: false,
                has_phone: true,
                has_profile: true,
            },
        ];
        let s = ContactSummary::from_contacts(&contacts);
        assert_eq!(s.with_email, 1);
        assert_eq!(s.with_phone, 1);
        assert_eq!(s.with_profile, 2);
        assert!(s.senior_finance_hr);
    }
}
