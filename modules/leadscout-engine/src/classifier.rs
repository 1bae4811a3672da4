//! Employer-entity classification, industry inference, and page-level
//! attribute extraction.
//!
//! The classifier is a pure function of (name, domain, text, config). All
//! business pattern data lives in declarative tables — ordered lists of
//! (pattern, outcome) pairs compiled once per run — so the decision logic
//! stays free of embedded literals.

use leadscout_common::{Classification, ExclusionReason, Industry, KeywordConfig};
use regex::Regex;

/// Pages shorter than this cannot be verified as an employer site.
const MIN_PAGE_CHARS: usize = 500;

/// Employer verification requires at least this many page traits.
const MIN_EMPLOYER_TRAITS: usize = 2;

/// Document, social, and aggregator domains that never represent an
/// employer's own site.
const GENERIC_DOMAINS: &[&str] = &[
    "linkedin.com",
    "facebook.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "youtube.com",
    "tiktok.com",
    "pinterest.com",
    "reddit.com",
    "wikipedia.org",
    "medium.com",
    "docs.google.com",
    "drive.google.com",
    "sites.google.com",
    "scribd.com",
    "slideshare.net",
    "indeed.com",
    "glassdoor.com",
    "ziprecruiter.com",
    "monster.com",
    "careerbuilder.com",
    "simplyhired.com",
    "yelp.com",
    "bbb.org",
    "yellowpages.com",
    "manta.com",
    "mapquest.com",
    "crunchbase.com",
    "zoominfo.com",
    "dnb.com",
    "buzzfile.com",
    "bloomberg.com",
];

/// News outlets are dropped before the fetch stage; an article about a
/// company is not the company's site.
const NEWS_OUTLET_DOMAINS: &[&str] = &[
    "cnn.com",
    "nytimes.com",
    "wsj.com",
    "forbes.com",
    "businessinsider.com",
    "bizjournals.com",
    "prnewswire.com",
    "businesswire.com",
    "globenewswire.com",
    "cleveland.com",
    "dispatch.com",
    "crainscleveland.com",
    "daytondailynews.com",
    "toledoblade.com",
    "cincinnati.com",
];

pub fn is_generic_domain(domain: &str) -> bool {
    GENERIC_DOMAINS.iter().any(|d| domain == *d || domain.ends_with(&format!(".{d}")))
}

pub fn is_news_outlet_domain(domain: &str) -> bool {
    NEWS_OUTLET_DOMAINS.iter().any(|d| domain == *d || domain.ends_with(&format!(".{d}")))
}

/// Inputs to one classification decision.
pub struct ClassifierInput<'a> {
    pub name: &'a str,
    pub domain: Option<&'a str>,
    /// Raw page body. Metadata checks need the unstripped markup.
    pub text: &'a str,
}

pub struct EntityClassifier {
    carrier_generic: Regex,
    hospital: Regex,
    research: Regex,
    ecosystem: Regex,
    listicle: Regex,
    org_metadata: Regex,
    site_name_meta: Regex,
    json_name: Regex,
    title_tag: Regex,
    legal_suffix: Regex,
    about_section: Regex,
    contact_section: Regex,
    address_line: Regex,
    careers_section: Regex,
    products_section: Regex,
    employee_count: Regex,
    employee_range: Regex,
    industry_table: Vec<(Regex, Industry)>,
}

impl EntityClassifier {
    pub fn new() -> Self {
        // Ordered: first match wins. Healthcare before the broad service
        // patterns; staffing last among the service industries so agency
        // sites that also say "recruiting for manufacturers" land right.
        let industry_rows: &[(&str, Industry)] = &[
            (
                r"(?i)\b(home care|home health|senior living|assisted living|behavioral health|physical therapy|dental (?:group|practice)|medical practice|hospice|urgent care|social assistance|healthcare|health care)\b",
                Industry::HealthcareSocialAssistance,
            ),
            (
                r"(?i)\b(staffing|recruiting firm|recruitment agency|talent acquisition|employment agency)\b",
                Industry::StaffingRecruiting,
            ),
            (
                r"(?i)\b(manufactur\w*|fabricat\w*|machine shop|machining|injection mold\w*|metal stamping|foundry|industrial equipment|plastics)\b",
                Industry::Manufacturing,
            ),
            (
                r"(?i)\b(construction|general contractor|roofing|hvac|plumbing|electrical contractor|excavating|homebuilder|design.build)\b",
                Industry::Construction,
            ),
            (
                r"(?i)\b(trucking|logistics|freight|warehous\w*|distribution center|3pl|supply chain)\b",
                Industry::TransportationWarehousing,
            ),
            (
                r"(?i)\b(law firm|attorneys at law|accounting firm|cpa firm|consulting firm|engineering firm|architecture firm|marketing agency|advertising agency)\b",
                Industry::ProfessionalServices,
            ),
            (
                r"(?i)\b(bank|credit union|wealth management|financial planning|mortgage lender|lending)\b",
                Industry::FinanceInsurance,
            ),
            (
                r"(?i)\b(software|saas|it services|managed services|cybersecurity|data analytics|app development)\b",
                Industry::Technology,
            ),
            (
                r"(?i)\b(restaurant group|hotel|catering|hospitality group|food service)\b",
                Industry::HospitalityFood,
            ),
            (
                r"(?i)\b(retailer|retail chain|e.?commerce|online store|storefronts)\b",
                Industry::RetailTrade,
            ),
            (
                r"(?i)\b(tutoring|training academy|learning center|child ?care|early childhood education|montessori)\b",
                Industry::EducationServices,
            ),
            (
                r"(?i)\b(nonprofit|non-profit|501\(c\)|foundation|charity)\b",
                Industry::Nonprofit,
            ),
        ];

        let industry_table = industry_rows
            .iter()
            .map(|(p, i)| (Regex::new(p).expect("valid industry regex"), *i))
            .collect();

        Self {
            carrier_generic: Regex::new(
                r"(?i)\b(insurance|health plan|mutual of \w+|benefits broker|brokerage)\b",
            )
            .expect("valid regex"),
            hospital: Regex::new(
                r"(?i)\b(hospital|health system|healthcare system|medical center|regional medical)\b",
            )
            .expect("valid regex"),
            research: Regex::new(
                r"(?i)\b(university|college|research institute|institute of|laborator(?:y|ies)|national lab)\b",
            )
            .expect("valid regex"),
            ecosystem: Regex::new(
                r"(?i)\b(chamber of commerce|trade association|association of|society of|accelerator|incubator|venture capital|capital partners|job board|economic development)\b",
            )
            .expect("valid regex"),
            listicle: Regex::new(
                r"(?i)(\btop\s+\d+\b|best places to work|companies to watch|best companies|fastest.growing companies)",
            )
            .expect("valid regex"),
            org_metadata: Regex::new(r#""@type"\s*:\s*"Organization""#).expect("valid regex"),
            site_name_meta: Regex::new(
                r#"(?i)<meta[^>]+(?:property|name)=["']og:site_name["'][^>]+content=["']([^"']+)["']|<meta[^>]+content=["']([^"']+)["'][^>]+(?:property|name)=["']og:site_name["']"#,
            )
            .expect("valid regex"),
            json_name: Regex::new(r#""name"\s*:\s*"([^"]{2,100})""#).expect("valid regex"),
            title_tag: Regex::new(r"(?is)<title[^>]*>([^<]+)</title>").expect("valid regex"),
            legal_suffix: Regex::new(
                r"(?i)\b(inc|incorporated|llc|llp|ltd|limited|corp|corporation|co|company|plc)\b\.?\s*$",
            )
            .expect("valid regex"),
            about_section: Regex::new(r"(?i)\b(about us|our story|who we are)\b")
                .expect("valid regex"),
            contact_section: Regex::new(r"(?i)\b(contact us|get in touch)\b")
                .expect("valid regex"),
            address_line: Regex::new(
                r"(?i)\b\d+\s+[A-Za-z][\w.'-]*\s+(street|st|avenue|ave|road|rd|boulevard|blvd|drive|dr|lane|ln|parkway|pkwy|suite|ste)\b",
            )
            .expect("valid regex"),
            careers_section: Regex::new(
                r"(?i)\b(careers|join our team|we(?:'|’)?re hiring|now hiring|open positions)\b",
            )
            .expect("valid regex"),
            products_section: Regex::new(
                r"(?i)\b(our products|our services|what we do|products (?:&|and) services|solutions)\b",
            )
            .expect("valid regex"),
            employee_count: Regex::new(r"(?i)\b(\d{1,3}(?:,\d{3})?|\d{1,5})\+?\s+employees\b")
                .expect("valid regex"),
            employee_range: Regex::new(r"(?i)\b(\d{1,5})\s*(?:-|–|to)\s*(\d{1,5})\s+employees\b")
                .expect("valid regex"),
            industry_table,
        }
    }

    /// Decide whether this page represents a legitimate, in-scope employer.
    /// The precedence order is fixed; each filter only runs if everything
    /// above it passed.
    pub fn classify(&self, input: &ClassifierInput, config: &KeywordConfig) -> Classification {
        let name_lower = input.name.to_lowercase();
        let domain = input.domain.unwrap_or("");

        // Blacklist first: operator knowledge beats every heuristic.
        if config
            .blacklist_domains
            .iter()
            .any(|d| !d.is_empty() && domain.contains(d.to_lowercase().as_str()))
            || config
                .blacklist_names
                .iter()
                .any(|n| !n.is_empty() && name_lower.contains(n.to_lowercase().as_str()))
        {
            return Classification::Excluded(ExclusionReason::Vendor);
        }

        // Known insurance carriers are vendors, not prospects.
        if config
            .carrier_names
            .iter()
            .any(|c| name_lower.contains(c.to_lowercase().as_str()))
            || self.carrier_generic.is_match(input.name)
        {
            return Classification::Excluded(ExclusionReason::Vendor);
        }

        if !config.allow_hospital_systems && self.hospital.is_match(input.name) {
            return Classification::Excluded(ExclusionReason::HospitalSystem);
        }

        if !config.allow_research_labs && self.research.is_match(input.name) {
            return Classification::Excluded(ExclusionReason::ResearchLab);
        }

        if self.ecosystem.is_match(input.name) {
            return Classification::Excluded(ExclusionReason::Ecosystem);
        }

        if !config.allow_education && domain.ends_with(".edu") {
            return Classification::Excluded(ExclusionReason::Education);
        }
        if !config.allow_government && domain.ends_with(".gov") {
            return Classification::Excluded(ExclusionReason::Government);
        }

        if !domain.is_empty() && is_generic_domain(domain) {
            return Classification::Excluded(ExclusionReason::Generic);
        }

        // Page-level checks: too short, listicle/template, or failing the
        // employer-entity verification heuristic.
        if input.text.len() < MIN_PAGE_CHARS {
            return Classification::Excluded(ExclusionReason::Generic);
        }

        let head = head_chars(input.text, 2000);
        if self.listicle.is_match(input.name) || self.listicle.is_match(head) {
            return Classification::Excluded(ExclusionReason::Generic);
        }

        if self.employer_traits(input) < MIN_EMPLOYER_TRAITS {
            return Classification::Excluded(ExclusionReason::Generic);
        }

        Classification::Employer
    }

    /// Count verification traits: organization metadata, a legal-suffix
    /// name, and the standard employer site sections.
    fn employer_traits(&self, input: &ClassifierInput) -> usize {
        let mut traits = 0;
        if self.org_metadata.is_match(input.text) || self.site_name_meta.is_match(input.text) {
            traits += 1;
        }
        if self.legal_suffix.is_match(input.name) {
            traits += 1;
        }
        if self.about_section.is_match(input.text) {
            traits += 1;
        }
        if self.contact_section.is_match(input.text) || self.address_line.is_match(input.text) {
            traits += 1;
        }
        if self.careers_section.is_match(input.text) {
            traits += 1;
        }
        if self.products_section.is_match(input.text) {
            traits += 1;
        }
        traits
    }

    /// Infer an industry category from the ordered keyword table. No match
    /// means no industry — never a guessed default.
    pub fn infer_industry(&self, name: &str, domain: Option<&str>, text: &str) -> Option<Industry> {
        let haystack = format!("{} {} {}", name, domain.unwrap_or(""), head_chars(text, 4000));
        self.industry_table
            .iter()
            .find(|(re, _)| re.is_match(&haystack))
            .map(|(_, industry)| *industry)
    }

    /// Extract a display name: organization metadata, then the site-name
    /// meta tag, then a cleaned page title.
    pub fn display_name(&self, text: &str, fallback: &str) -> String {
        if self.org_metadata.is_match(text) {
            if let Some(cap) = self.json_name.captures(text) {
                return clean_site_title(&cap[1]);
            }
        }
        if let Some(cap) = self.site_name_meta.captures(text) {
            if let Some(m) = cap.get(1).or_else(|| cap.get(2)) {
                return clean_site_title(m.as_str());
            }
        }
        if let Some(cap) = self.title_tag.captures(text) {
            return clean_site_title(&cap[1]);
        }
        clean_site_title(fallback)
    }

    /// Pull an employee count from "N employees" / "N-M employees" phrasing.
    /// A range yields its midpoint plus the raw range string.
    pub fn extract_employee_count(&self, text: &str) -> Option<(i32, Option<String>)> {
        if let Some(cap) = self.employee_range.captures(text) {
            let low: i64 = cap[1].parse().ok()?;
            let high: i64 = cap[2].parse().ok()?;
            if low > 0 && high >= low && high < 1_000_000 {
                return Some((((low + high) / 2) as i32, Some(cap[0].trim().to_string())));
            }
        }
        if let Some(cap) = self.employee_count.captures(text) {
            let raw = cap[1].replace(',', "");
            let count: i64 = raw.parse().ok()?;
            if count > 0 && count < 1_000_000 {
                return Some((count as i32, None));
            }
        }
        None
    }
}

impl Default for EntityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// First `n` characters of a string, snapped to a char boundary.
fn head_chars(text: &str, n: usize) -> &str {
    if text.len() <= n {
        return text;
    }
    let mut end = n;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Strip trailing site-chrome from a page title and truncate to a sane
/// display length.
fn clean_site_title(raw: &str) -> String {
    let first_segment = raw
        .split(&['|', '–', '—'][..])
        .next()
        .unwrap_or(raw)
        .trim();

    // " - " only splits when it reads as chrome, not a hyphenated name.
    let first_segment = first_segment.split(" - ").next().unwrap_or(first_segment).trim();

    const CHROME_WORDS: &[&str] = &["home", "welcome", "official site", "official website", "homepage"];
    let mut cleaned = first_segment.to_string();
    if cleaned.is_ascii() {
        for word in CHROME_WORDS {
            let lower = cleaned.to_lowercase();
            if let Some(stripped) = lower.strip_suffix(word) {
                cleaned.truncate(stripped.trim_end().len());
            }
        }
    }
    let cleaned = cleaned.trim().trim_end_matches(['-', ':', ',']).trim();

    let mut out = cleaned.to_string();
    if out.len() > 80 {
        let mut end = 80;
        while end > 0 && !out.is_char_boundary(end) {
            end -= 1;
        }
        out.truncate(end);
        out = out.trim_end().to_string();
    }
    out
}

// ===========================================================================
// Unit tests
// ===========================================================================
