//! Headquarters extraction and region bucketing.
//!
//! Pure functions over raw page text. A candidate with no resolvable state
//! is outside the engine's operating knowledge and must be rejected by the
//! caller; there is no benefit-of-the-doubt path.

use leadscout_common::RegionBucket;
use regex::Regex;

/// Extracted headquarters location. Every field is independently nullable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headquarters {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl Headquarters {
    /// A usable in-market headquarters: a resolved state and no evidence of
    /// a foreign country. An explicit non-US country always disqualifies,
    /// even when a state pattern matched.
    pub fn confirmed_in_country(&self) -> bool {
        if self.state.is_none() {
            return false;
        }
        match self.country.as_deref() {
            None => true,
            Some(c) => is_operating_country(c),
        }
    }
}

fn is_operating_country(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "us" | "usa" | "united states" | "united states of america"
    )
}

/// State-name → postal-code table, 50 states plus DC.
const STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// The primary market. Everything here lands in the `primary` bucket.
const PRIMARY_STATES: &[&str] = &["OH"];

/// Neighboring states form the secondary region.
const SECONDARY_STATES: &[&str] = &["MI", "IN", "KY", "PA", "WV"];

pub fn state_code_for_name(name: &str) -> Option<&'static str> {
    let trimmed = name.trim();
    STATES
        .iter()
        .find(|(code, full)| trimmed.eq_ignore_ascii_case(full) || trimmed.eq_ignore_ascii_case(code))
        .map(|(code, _)| *code)
}

pub fn is_valid_state_code(code: &str) -> bool {
    STATES.iter().any(|(c, _)| *c == code)
}

/// Map a resolved state code into its region bucket. No state means the
/// caller should already have rejected the candidate.
pub fn region_for(state: Option<&str>) -> RegionBucket {
    match state {
        Some(code) if PRIMARY_STATES.contains(&code) => RegionBucket::Primary,
        Some(code) if SECONDARY_STATES.contains(&code) => RegionBucket::Secondary,
        _ => RegionBucket::Other,
    }
}

/// Headquarters resolver with its pattern set compiled once per run.
pub struct GeoResolver {
    addr_region: Regex,
    addr_locality: Regex,
    addr_country: Regex,
    city_state: Regex,
    state_names: Vec<(&'static str, Regex)>,
    city_before: Regex,
}

impl GeoResolver {
    pub fn new() -> Self {
        // Longer names first so "West Virginia" wins over "Virginia".
        let mut by_length: Vec<&(&str, &str)> = STATES.iter().collect();
        by_length.sort_by_key(|(_, name)| std::cmp::Reverse(name.len()));

        let state_names = by_length
            .iter()
            .map(|(code, name)| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(name));
                (*code, Regex::new(&pattern).expect("valid state regex"))
            })
            .collect();

        Self {
            addr_region: Regex::new(r#""addressRegion"\s*:\s*"([^"]+)""#).expect("valid regex"),
            addr_locality: Regex::new(r#""addressLocality"\s*:\s*"([^"]+)""#).expect("valid regex"),
            addr_country: Regex::new(r#""addressCountry"\s*:\s*"([^"]+)""#).expect("valid regex"),
            city_state: Regex::new(
                r"\b([A-Z][A-Za-z.'-]+(?: [A-Z][A-Za-z.'-]+){0,3}),\s*([A-Z]{2})\b",
            )
            .expect("valid regex"),
            state_names,
            city_before: Regex::new(r"([A-Z][A-Za-z.'-]+(?: [A-Z][A-Za-z.'-]+){0,3}),?\s*$")
                .expect("valid regex"),
        }
    }

    /// Resolve a headquarters from raw page text. Attempts, in order:
    /// structured address metadata, a `"City, ST"` pattern, a full
    /// state-name match with a preceding-text city heuristic.
    pub fn resolve(&self, text: &str) -> Headquarters {
        let country = self
            .addr_country
            .captures(text)
            .map(|c| c[1].trim().to_string());

        // (a) structured address metadata
        if let Some(region) = self.addr_region.captures(text) {
            if let Some(code) = state_code_for_name(&region[1]) {
                let city = self
                    .addr_locality
                    .captures(text)
                    .map(|c| c[1].trim().to_string());
                return Headquarters {
                    city,
                    state: Some(code.to_string()),
                    country,
                };
            }
        }

        // (b) "City, ST" scan
        for cap in self.city_state.captures_iter(text) {
            let code = &cap[2];
            if is_valid_state_code(code) {
                return Headquarters {
                    city: Some(cap[1].trim().to_string()),
                    state: Some(code.to_string()),
                    country,
                };
            }
        }

        // (c) full state-name match with city heuristic from the preceding text
        for (code, re) in &self.state_names {
            if let Some(m) = re.find(text) {
                let mut window_start = m.start().saturating_sub(40);
                while window_start > 0 && !text.is_char_boundary(window_start) {
                    window_start -= 1;
                }
                let preceding = &text[window_start..m.start()];
                let city = self
                    .city_before
                    .captures(preceding)
                    .map(|c| c[1].trim().to_string())
                    .filter(|c| state_code_for_name(c).is_none());
                return Headquarters {
                    city,
                    state: Some(code.to_string()),
                    country,
                };
            }
        }

        Headquarters {
            city: None,
            state: None,
            country,
        }
    }
}

impl Default for GeoResolver {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Unit tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> GeoResolver {
        GeoResolver::new()
    }

    #[test]
    fn structured_address_wins_over_body_text() {
        let text = r#"
            Some page chrome mentioning Chicago, IL in a footer link.
            {"@type":"Organization","address":{"addressLocality":"Columbus",
            "addressRegion":"OH","addressCountry":"US"}}
        "#;
        let hq = resolver().resolve(text);
        assert_eq!(hq.state.as_deref(), Some("OH"));
        assert_eq!(hq.city.as_deref(), Some("Columbus"));
        assert!(hq.confirmed_in_country());
    }

    #[test]
    fn structured_address_accepts_full_state_name() {
        let text = r#"{"addressLocality":"Dayton","addressRegion":"Ohio"}"#;
        let hq = resolver().resolve(text);
        assert_eq!(hq.state.as_deref(), Some("OH"));
        assert_eq!(hq.city.as_deref(), Some("Dayton"));
    }

    #[test]
    fn city_state_pattern_resolves() {
        let hq = resolver().resolve("Visit our headquarters at 100 Main St, Akron, OH 44308.");
        assert_eq!(hq.state.as_deref(), Some("OH"));
        assert_eq!(hq.city.as_deref(), Some("Akron"));
        assert_eq!(region_for(hq.state.as_deref()), RegionBucket::Primary);
    }

    #[test]
    fn invalid_state_code_is_skipped() {
        let hq = resolver().resolve("Our office: Springfield, ZZ");
        assert_eq!(hq.state, None);
        assert!(!hq.confirmed_in_country());
    }

    #[test]
    fn state_name_scan_picks_up_preceding_city() {
        let hq = resolver().resolve("We proudly serve clients from Cleveland, Ohio and beyond.");
        assert_eq!(hq.state.as_deref(), Some("OH"));
        assert_eq!(hq.city.as_deref(), Some("Cleveland"));
    }

    #[test]
    fn west_virginia_not_mistaken_for_virginia() {
        let hq = resolver().resolve("Headquartered in beautiful Charleston, West Virginia since 1978.");
        assert_eq!(hq.state.as_deref(), Some("WV"));
        assert_eq!(region_for(hq.state.as_deref()), RegionBucket::Secondary);
    }

    #[test]
    fn no_state_resolves_to_unknown() {
        let hq = resolver().resolve("A global consultancy with offices everywhere.");
        assert_eq!(hq.state, None);
        assert_eq!(hq.city, None);
        assert!(!hq.confirmed_in_country());
    }

    #[test]
    fn foreign_country_rejected_despite_state_match() {
        let text = r#"{"addressLocality":"London","addressRegion":"Ohio","addressCountry":"CA"}"#;
        let hq = resolver().resolve(text);
        assert_eq!(hq.state.as_deref(), Some("OH"));
        assert!(!hq.confirmed_in_country());
    }

    #[test]
    fn region_buckets() {
        assert_eq!(region_for(Some("OH")), RegionBucket::Primary);
        assert_eq!(region_for(Some("MI")), RegionBucket::Secondary);
        assert_eq!(region_for(Some("PA")), RegionBucket::Secondary);
        assert_eq!(region_for(Some("TX")), RegionBucket::Other);
        assert_eq!(region_for(None), RegionBucket::Other);
    }
}
