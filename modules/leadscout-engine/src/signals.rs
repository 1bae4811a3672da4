//! Buying-trigger detection over noisy page text.
//!
//! Detection is independent per category and every pattern set that an
//! operator might tune (carrier names, change phrases, trigger vocabulary)
//! comes in through [`KeywordConfig`] rather than living here as literals.
//! A category that did not match is omitted from the map entirely.

use leadscout_common::{
    FundingSignal, HiringSignal, KeywordConfig, NewsSignal, RoleChangeSignal, TriggerMap,
    VendorChangeSignal,
};
use regex::Regex;

/// Vendor name and change phrase must co-occur within this many characters.
const VENDOR_PROXIMITY_WINDOW: usize = 100;

/// Characters scanned around a match for a stated recency phrase.
const RECENCY_WINDOW: usize = 120;

pub struct SignalDetector {
    hiring_count: Regex,
    hiring_phrases: Vec<Regex>,
    funding_stage: Regex,
    funding_phrases: Vec<Regex>,
    csuite_title: Regex,
    hr_finance_title: Regex,
    appointment_verb: Regex,
    press_release: Regex,
    recency: Regex,
    carrier_names: Vec<String>,
    change_phrases: Vec<String>,
    trigger_keywords: Vec<String>,
    default_open_roles: u32,
}

impl SignalDetector {
    pub fn new(keywords: &KeywordConfig, default_open_roles: u32) -> Self {
        let hiring_phrases = [
            r"(?i)we(?:'|’)?re hiring",
            r"(?i)we are hiring",
            r"(?i)now hiring",
            r"(?i)join our (?:growing )?team",
            r"(?i)open (?:positions|roles)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid hiring regex"))
        .collect();

        let funding_phrases = [
            r"(?i)\braised \$\s?\d[\d,.]*\s*(?:k|m|b|million|billion)?\b",
            r"(?i)\bseed (?:round|funding)\b",
            r"(?i)\b(?:funding|venture|investment) round\b",
            r"(?i)\bclosed (?:a|its) .{0,20}(?:round|financing)\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid funding regex"))
        .collect();

        Self {
            hiring_count: Regex::new(r"(?i)\b(\d{1,4})\+?\s+open\s+(?:positions|roles|jobs)\b")
                .expect("valid regex"),
            hiring_phrases,
            funding_stage: Regex::new(r"(?i)\bseries\s+([a-e])\b").expect("valid regex"),
            funding_phrases,
            csuite_title: Regex::new(
                r"(?i)\b(chief\s+[a-z]+(?:\s+[a-z]+)?\s+officer|ceo|cfo|coo|cto|chro|president)\b",
            )
            .expect("valid regex"),
            hr_finance_title: Regex::new(
                r"(?i)\b(vp,?\s+(?:of\s+)?(?:people|human resources|hr|finance|total rewards)|head of (?:people|hr|human resources)|director of (?:people|human resources|hr|benefits|finance)|hr director|benefits director|controller)\b",
            )
            .expect("valid regex"),
            appointment_verb: Regex::new(
                r"(?i)\b(named|names|appointed|appoints|welcomes|welcomed|hires|hired|promotes|promoted|joins(?:\s+\w+)?\s+as|new)\b",
            )
            .expect("valid regex"),
            press_release: Regex::new(
                r"(?i)\b(press release|for immediate release|announces|announced today|newswire)\b",
            )
            .expect("valid regex"),
            recency: Regex::new(r"(?i)\b(\d{1,3})\s+(day|week|month)s?\s+ago\b")
                .expect("valid regex"),
            carrier_names: keywords
                .carrier_names
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            change_phrases: keywords
                .vendor_change_phrases
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            trigger_keywords: keywords
                .trigger_keywords
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            default_open_roles,
        }
    }

    /// Scan text for all trigger categories.
    pub fn detect(&self, text: &str) -> TriggerMap {
        let lower = text.to_lowercase();
        TriggerMap {
            hiring: self.detect_hiring(text),
            funding: self.detect_funding(text),
            leadership_change: self.detect_role_change(text, false),
            csuite_change: self.detect_role_change(text, true),
            vendor_change: self.detect_vendor_change(&lower),
            news: self.detect_news(text, &lower),
        }
    }

    fn detect_hiring(&self, text: &str) -> Option<HiringSignal> {
        if let Some(cap) = self.hiring_count.captures(text) {
            let count: u32 = cap[1].parse().unwrap_or(self.default_open_roles);
            return Some(HiringSignal {
                open_roles: count,
                evidence: cap[0].to_string(),
            });
        }
        for re in &self.hiring_phrases {
            if let Some(m) = re.find(text) {
                return Some(HiringSignal {
                    open_roles: self.default_open_roles,
                    evidence: m.as_str().to_string(),
                });
            }
        }
        None
    }

    fn detect_funding(&self, text: &str) -> Option<FundingSignal> {
        if let Some(cap) = self.funding_stage.captures(text) {
            let m = cap.get(0).expect("whole match");
            return Some(FundingSignal {
                stage: Some(format!("Series {}", cap[1].to_uppercase())),
                days_ago: self.recency_near(text, m.start(), m.end()),
            });
        }
        for re in &self.funding_phrases {
            if let Some(m) = re.find(text) {
                return Some(FundingSignal {
                    stage: None,
                    days_ago: self.recency_near(text, m.start(), m.end()),
                });
            }
        }
        None
    }

    /// Appointment detection: a senior title with an appointment verb nearby.
    /// `csuite` selects between the chief-officer title set and the
    /// non-C-suite HR/Finance leadership set — the two are tracked as
    /// separate trigger categories.
    fn detect_role_change(&self, text: &str, csuite: bool) -> Option<RoleChangeSignal> {
        let title_re = if csuite { &self.csuite_title } else { &self.hr_finance_title };
        for m in title_re.find_iter(text) {
            let window = char_window(text, m.start(), m.end(), 80);
            if self.appointment_verb.is_match(window) {
                return Some(RoleChangeSignal {
                    title: m.as_str().to_string(),
                    days_ago: self.recency_near(text, m.start(), m.end()),
                });
            }
        }
        None
    }

    /// Proximity match: a configured vendor name and a configured change
    /// phrase within the window of each other in the lowercased text.
    fn detect_vendor_change(&self, lower: &str) -> Option<VendorChangeSignal> {
        for vendor in &self.carrier_names {
            let Some(v_idx) = lower.find(vendor.as_str()) else {
                continue;
            };
            for phrase in &self.change_phrases {
                let Some(p_idx) = lower.find(phrase.as_str()) else {
                    continue;
                };
                let distance = v_idx.abs_diff(p_idx);
                if distance <= VENDOR_PROXIMITY_WINDOW {
                    return Some(VendorChangeSignal {
                        vendor: vendor.clone(),
                        phrase: phrase.clone(),
                        days_ago: self.recency_near(lower, v_idx, v_idx + vendor.len()),
                    });
                }
            }
        }
        None
    }

    fn detect_news(&self, text: &str, lower: &str) -> Option<NewsSignal> {
        let press_release = self.press_release.is_match(text);
        let keyword_hits: Vec<String> = self
            .trigger_keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .cloned()
            .collect();

        if !press_release && keyword_hits.is_empty() {
            return None;
        }
        Some(NewsSignal {
            press_release,
            keyword_hits,
        })
    }

    /// Look for a stated "N days/weeks/months ago" near a match. Absence
    /// means unknown recency, which downstream scoring treats as immediate.
    fn recency_near(&self, text: &str, start: usize, end: usize) -> Option<u32> {
        let window = char_window(text, start, end, RECENCY_WINDOW);
        let cap = self.recency.captures(window)?;
        let n: u32 = cap[1].parse().ok()?;
        let days = match cap[2].to_lowercase().as_str() {
            "day" => n,
            "week" => n.saturating_mul(7),
            _ => n.saturating_mul(30),
        };
        Some(days)
    }
}

/// Slice a padded window around a match, snapped to char boundaries so
/// multibyte pages cannot split a code point.
fn char_window(text: &str, start: usize, end: usize, pad: usize) -> &str {
    let mut lo = start.saturating_sub(pad);
    while lo > 0 && !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (end + pad).min(text.len());
    while hi < text.len() && !text.is_char_boundary(hi) {
        hi += 1;
    }
    &text[lo..hi]
}

// ---------------------------------------------------------------------------
// High-intent decision
// ---------------------------------------------------------------------------

/// Funding counts toward high intent only within this window.
const FUNDING_HIGH_INTENT_DAYS: u32 = 90;

/// Pure advisory classification over the trigger map. Feeds UI emphasis,
/// never the ranking arithmetic.
pub fn high_intent(triggers: &TriggerMap, high_hiring_threshold: u32) -> (bool, Vec<String>) {
    let mut reasons = Vec::new();

    if let Some(funding) = &triggers.funding {
        if funding.days_ago.map_or(true, |d| d <= FUNDING_HIGH_INTENT_DAYS) {
            reasons.push("recent_funding".to_string());
        }
    }
    if triggers.leadership_change.is_some() {
        reasons.push("hr_leadership_change".to_string());
    }
    if triggers.csuite_change.is_some() {
        reasons.push("csuite_change".to_string());
    }
    if triggers.vendor_change.as_ref().is_some_and(|v| v.is_recent()) {
        reasons.push("vendor_change".to_string());
    }
    if triggers
        .hiring
        .as_ref()
        .is_some_and(|h| h.open_roles >= high_hiring_threshold)
    {
        reasons.push("hiring_surge".to_string());
    }
    if triggers
        .news
        .as_ref()
        .is_some_and(|n| n.press_release && !n.keyword_hits.is_empty())
    {
        reasons.push("strong_news".to_string());
    }

    (!reasons.is_empty(), reasons)
}

// ===========================================================================
// Unit tests
// ===========================================================================
