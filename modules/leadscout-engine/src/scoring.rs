//! Fit/timing/reachability scoring and signal-strength star ratings.
//!
//! `score_account` is a pure function of (account, contact summary,
//! weights). The tuned values — industry table, floors, band edges — are
//! fields of [`ScoringWeights`] rather than inline constants; they are
//! operational tuning knobs, not derived quantities.

use leadscout_common::{
    is_senior_finance_hr_title, Account, ContactSummary, FundingSignal, HiringSignal, Industry,
    RoleChangeSignal, ScoreBreakdown, TriggerMap,
};

#[derive(Debug, Clone)]
pub struct ScoringWeights {
    pub industry_scores: Vec<(Industry, f32)>,
    /// Floor for industries outside the table (and unclassified accounts) so
    /// novel industries are not zeroed out.
    pub unknown_industry_floor: f32,
    pub deprioritized: Vec<Industry>,
    pub deprioritized_score: f32,
    /// Employee-count band where size score peaks.
    pub size_peak_low: i32,
    pub size_peak_high: i32,
    /// Open-role count at/above which hiring is a large signal.
    pub high_hiring_threshold: u32,
    /// Fixed normalization denominator for the 0-100 scale.
    pub max_denominator: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            industry_scores: vec![
                (Industry::HealthcareSocialAssistance, 25.0),
                (Industry::Manufacturing, 22.0),
                (Industry::Construction, 20.0),
                (Industry::ProfessionalServices, 18.0),
                (Industry::FinanceInsurance, 18.0),
                (Industry::TransportationWarehousing, 16.0),
                (Industry::Technology, 15.0),
                (Industry::RetailTrade, 12.0),
                (Industry::HospitalityFood, 12.0),
                (Industry::EducationServices, 10.0),
                (Industry::Nonprofit, 8.0),
            ],
            unknown_industry_floor: 5.0,
            deprioritized: vec![Industry::StaffingRecruiting],
            deprioritized_score: 2.0,
            size_peak_low: 50,
            size_peak_high: 250,
            high_hiring_threshold: 10,
            max_denominator: 110.0,
        }
    }
}

/// Score an account against the full model. Suppressed/rejected accounts and
/// accounts with neither a domain nor a website hard-zero: they must never
/// surface as priority leads regardless of their signals.
pub fn score_account(
    account: &Account,
    contacts: &ContactSummary,
    weights: &ScoringWeights,
) -> ScoreBreakdown {
    if !account.disposition.scoreable()
        || (account.domain.is_none() && account.website.is_none())
    {
        return ScoreBreakdown {
            stars: 1,
            zeroed: true,
            ..Default::default()
        };
    }

    let industry = industry_score(account.industry, weights);
    let size = size_score(account.employee_count, weights);
    let hiring = account.triggers.hiring.as_ref().map_or(0.0, hiring_score);
    let csuite = account.triggers.csuite_change.as_ref().map_or(0.0, csuite_score);
    let role_change = account
        .triggers
        .leadership_change
        .as_ref()
        .map_or(0.0, role_change_score);
    let funding = account.triggers.funding.as_ref().map_or(0.0, funding_score);
    let reachability = reachability_score(contacts);

    let raw = industry + size + hiring + csuite + role_change + funding + reachability;
    let normalized = (raw / weights.max_denominator * 100.0).clamp(0.0, 100.0);

    let strengths = classify_strengths(&account.triggers, weights.high_hiring_threshold);
    let stars = star_rating(&strengths, reachability);

    ScoreBreakdown {
        industry,
        size,
        hiring,
        csuite,
        role_change,
        funding,
        reachability,
        raw,
        normalized,
        stars,
        zeroed: false,
    }
}

// ---------------------------------------------------------------------------
// Fit
// ---------------------------------------------------------------------------

fn industry_score(industry: Option<Industry>, weights: &ScoringWeights) -> f32 {
    let Some(industry) = industry else {
        return weights.unknown_industry_floor;
    };
    if weights.deprioritized.contains(&industry) {
        return weights.deprioritized_score;
    }
    weights
        .industry_scores
        .iter()
        .find(|(i, _)| *i == industry)
        .map(|(_, score)| *score)
        .unwrap_or(weights.unknown_industry_floor)
}

/// Banded curve peaking in the target range and decaying outside it.
/// Missing or non-positive counts score zero.
fn size_score(employee_count: Option<i32>, weights: &ScoringWeights) -> f32 {
    let Some(count) = employee_count.filter(|c| *c > 0) else {
        return 0.0;
    };
    let (low, high) = (weights.size_peak_low, weights.size_peak_high);
    if (low..=high).contains(&count) {
        15.0
    } else if (low / 2..low).contains(&count) || (high + 1..=high * 2).contains(&count) {
        10.0
    } else if (10..low / 2).contains(&count) || (high * 2 + 1..=high * 4).contains(&count) {
        6.0
    } else {
        3.0
    }
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

fn hiring_score(signal: &HiringSignal) -> f32 {
    match signal.open_roles {
        n if n >= 10 => 25.0,
        n if n >= 5 => 18.0,
        n if n >= 2 => 10.0,
        _ => 5.0,
    }
}

/// C-suite changes score by role importance with a month-granularity decay.
/// Unknown recency is treated as immediate: an undated announcement is
/// assumed current.
fn csuite_score(signal: &RoleChangeSignal) -> f32 {
    let base = if is_senior_finance_hr_title(&signal.title) {
        15.0
    } else {
        10.0
    };
    let decay = match signal.days_ago {
        None => 1.0,
        Some(d) if d <= 90 => 1.0,
        Some(d) if d <= 180 => 0.5,
        Some(_) => 0.0,
    };
    base * decay
}

/// Non-C-suite HR/Finance role changes decay on a day scale, much steeper
/// than the C-suite curve.
fn role_change_score(signal: &RoleChangeSignal) -> f32 {
    let decay = match signal.days_ago {
        None => 1.0,
        Some(d) if d <= 30 => 1.0,
        Some(d) if d <= 60 => 0.6,
        Some(d) if d <= 90 => 0.3,
        Some(_) => 0.0,
    };
    10.0 * decay
}

fn funding_score(signal: &FundingSignal) -> f32 {
    let decay = match signal.days_ago {
        None => 1.0,
        Some(d) if d <= 90 => 1.0,
        Some(d) if d <= 180 => 0.7,
        Some(d) if d <= 365 => 0.4,
        Some(_) => 0.0,
    };
    10.0 * decay
}

// ---------------------------------------------------------------------------
// Reachability
// ---------------------------------------------------------------------------

fn reachability_score(contacts: &ContactSummary) -> f32 {
    let mut score = 0.0;
    if contacts.with_email >= 1 {
        score += 3.0;
    }
    if contacts.with_phone >= 1 {
        score += 2.0;
    }
    if contacts.with_profile >= 2 {
        score += 2.0;
    }
    if contacts.senior_finance_hr {
        score += 3.0;
    }
    score.min(10.0)
}

// ---------------------------------------------------------------------------
// Signal strength and stars
// ---------------------------------------------------------------------------

/// Qualitative strength tier, classified independently of the point model so
/// a star rating is explainable without reading the arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignalStrength {
    None,
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalStrengths {
    pub role_change: SignalStrength,
    pub hiring: SignalStrength,
    pub funding: SignalStrength,
    pub csuite: SignalStrength,
}

impl SignalStrengths {
    fn iter(&self) -> [SignalStrength; 4] {
        [self.role_change, self.hiring, self.funding, self.csuite]
    }
}

/// Classify each category by its own recency/magnitude thresholds. The
/// bands mirror the scoring decay edges but are kept separate on purpose.
/// Classification is monotonic in recency: a fresher event never classifies
/// lower than a staler one.
pub fn classify_strengths(triggers: &TriggerMap, high_hiring_threshold: u32) -> SignalStrengths {
    let by_days = |days_ago: Option<u32>, large: u32, medium: u32, small: u32| match days_ago {
        None => SignalStrength::Large,
        Some(d) if d <= large => SignalStrength::Large,
        Some(d) if d <= medium => SignalStrength::Medium,
        Some(d) if d <= small => SignalStrength::Small,
        Some(_) => SignalStrength::None,
    };

    let role_change = triggers
        .leadership_change
        .as_ref()
        .map_or(SignalStrength::None, |s| by_days(s.days_ago, 30, 60, 90));

    let hiring = triggers
        .hiring
        .as_ref()
        .map_or(SignalStrength::None, |h| match h.open_roles {
            n if n >= high_hiring_threshold => SignalStrength::Large,
            n if n >= 5 => SignalStrength::Medium,
            _ => SignalStrength::Small,
        });

    let funding = triggers
        .funding
        .as_ref()
        .map_or(SignalStrength::None, |s| by_days(s.days_ago, 90, 180, 365));

    let csuite = triggers
        .csuite_change
        .as_ref()
        .map_or(SignalStrength::None, |s| by_days(s.days_ago, 90, 180, 365));

    SignalStrengths {
        role_change,
        hiring,
        funding,
        csuite,
    }
}

/// 1-3 star tier. Any one large signal, two mediums, or one medium with
/// solid reachability reads as "call today"; a lone medium or a couple of
/// smalls is "worth a look"; everything else is backlog.
pub fn star_rating(strengths: &SignalStrengths, reachability: f32) -> u8 {
    let all = strengths.iter();
    let large = all.iter().filter(|s| **s == SignalStrength::Large).count();
    let medium = all.iter().filter(|s| **s == SignalStrength::Medium).count();
    let small = all.iter().filter(|s| **s == SignalStrength::Small).count();

    if large >= 1 || medium >= 2 || (medium == 1 && reachability >= 6.0) {
        3
    } else if medium == 1 || small >= 2 {
        2
    } else {
        1
    }
}

// ===========================================================================
// Unit tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use leadscout_common::{Classification, Disposition, RegionBucket};
    use uuid::Uuid;

    fn account(triggers: TriggerMap) -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Buckeye Precision Machining".into(),
            canonical_name: "buckeye precision machining".into(),
            domain: Some("buckeyeprecision.com".into()),
            website: Some("https://buckeyeprecision.com".into()),
            hq_city: Some("Columbus".into()),
            hq_state: Some("OH".into()),
            hq_country: Some("US".into()),
            region: RegionBucket::Primary,
            industry: Some(Industry::Manufacturing),
            employee_count: Some(120),
            employee_range: None,
            triggers,
            classification: Classification::Employer,
            high_intent: false,
            high_intent_reasons: vec![],
            disposition: Disposition::Active,
            fit_score: 0.0,
            source: "discovery:auto".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn reachable_cfo() -> ContactSummary {
        ContactSummary {
            with_email: 1,
            with_phone: 0,
            with_profile: 0,
            senior_finance_hr: true,
        }
    }

    #[test]
    fn guardrail_zeroes_suppressed_account() {
        let mut acct = account(TriggerMap {
            hiring: Some(HiringSignal { open_roles: 40, evidence: "40 open roles".into() }),
            funding: Some(FundingSignal { stage: Some("Series C".into()), days_ago: Some(5) }),
            ..Default::default()
        });
        acct.disposition = Disposition::Suppressed;

        let b = score_account(&acct, &reachable_cfo(), &ScoringWeights::default());
        assert!(b.zeroed);
        assert_eq!(b.raw, 0.0);
        assert_eq!(b.normalized, 0.0);
        assert_eq!(b.fit(), 0.0);
        assert_eq!(b.timing(), 0.0);
        assert_eq!(b.reachability, 0.0);
        assert_eq!(b.stars, 1);
    }

    #[test]
    fn guardrail_zeroes_rejected_and_unreachable_accounts() {
        let mut rejected = account(TriggerMap::default());
        rejected.disposition = Disposition::Rejected("vendor".into());
        let b = score_account(&rejected, &reachable_cfo(), &ScoringWeights::default());
        assert!(b.zeroed);
        assert_eq!(b.stars, 1);

        let mut no_web = account(TriggerMap {
            hiring: Some(HiringSignal { open_roles: 15, evidence: "15 open roles".into() }),
            ..Default::default()
        });
        no_web.domain = None;
        no_web.website = None;
        let b = score_account(&no_web, &reachable_cfo(), &ScoringWeights::default());
        assert!(b.zeroed);
        assert_eq!(b.normalized, 0.0);
        assert_eq!(b.stars, 1);
    }

    #[test]
    fn healthcare_hiring_cfo_scenario() {
        let mut acct = account(TriggerMap {
            hiring: Some(HiringSignal { open_roles: 12, evidence: "12 open positions".into() }),
            ..Default::default()
        });
        acct.industry = Some(Industry::HealthcareSocialAssistance);
        acct.employee_count = Some(120);

        let b = score_account(&acct, &reachable_cfo(), &ScoringWeights::default());

        // Top industry score plus the size-band peak.
        assert_eq!(b.industry, 25.0);
        assert_eq!(b.size, 15.0);
        assert!(b.fit() >= 40.0);
        // Top hiring band.
        assert_eq!(b.hiring, 25.0);
        assert!(b.reachability >= 6.0);
        assert_eq!(b.stars, 3);
    }

    #[test]
    fn unknown_industry_gets_floor_not_zero() {
        let mut acct = account(TriggerMap::default());
        acct.industry = None;
        let b = score_account(&acct, &ContactSummary::default(), &ScoringWeights::default());
        assert_eq!(b.industry, 5.0);
    }

    #[test]
    fn deprioritized_industry_scores_near_zero() {
        let mut acct = account(TriggerMap::default());
        acct.industry = Some(Industry::StaffingRecruiting);
        let b = score_account(&acct, &ContactSummary::default(), &ScoringWeights::default());
        assert_eq!(b.industry, 2.0);
    }

    #[test]
    fn size_bands_decay_away_from_peak() {
        let w = ScoringWeights::default();
        assert_eq!(size_score(Some(120), &w), 15.0);
        assert_eq!(size_score(Some(30), &w), 10.0);
        assert_eq!(size_score(Some(400), &w), 10.0);
        assert_eq!(size_score(Some(15), &w), 6.0);
        assert_eq!(size_score(Some(800), &w), 6.0);
        assert_eq!(size_score(Some(3), &w), 3.0);
        assert_eq!(size_score(Some(5000), &w), 3.0);
        assert_eq!(size_score(None, &w), 0.0);
        assert_eq!(size_score(Some(0), &w), 0.0);
        assert_eq!(size_score(Some(-4), &w), 0.0);
    }

    #[test]
    fn csuite_decay_by_month_and_role_importance() {
        let fresh_cfo = RoleChangeSignal { title: "CFO".into(), days_ago: Some(30) };
        assert_eq!(csuite_score(&fresh_cfo), 15.0);

        let aging_cfo = RoleChangeSignal { title: "CFO".into(), days_ago: Some(120) };
        assert_eq!(csuite_score(&aging_cfo), 7.5);

        let stale_cfo = RoleChangeSignal { title: "CFO".into(), days_ago: Some(300) };
        assert_eq!(csuite_score(&stale_cfo), 0.0);

        let undated_ceo = RoleChangeSignal { title: "CEO".into(), days_ago: None };
        assert_eq!(csuite_score(&undated_ceo), 10.0);
    }

    #[test]
    fn role_change_decays_steeper_than_csuite() {
        let at_45 = RoleChangeSignal { title: "VP of People".into(), days_ago: Some(45) };
        let at_75 = RoleChangeSignal { title: "VP of People".into(), days_ago: Some(75) };
        let at_100 = RoleChangeSignal { title: "VP of People".into(), days_ago: Some(100) };
        assert_eq!(role_change_score(&at_45), 6.0);
        assert_eq!(role_change_score(&at_75), 3.0);
        assert_eq!(role_change_score(&at_100), 0.0);
    }

    #[test]
    fn strength_is_monotonic_in_recency() {
        let fresh = TriggerMap {
            leadership_change: Some(RoleChangeSignal { title: "VP of People".into(), days_ago: Some(10) }),
            ..Default::default()
        };
        let stale = TriggerMap {
            leadership_change: Some(RoleChangeSignal { title: "VP of People".into(), days_ago: Some(90) }),
            ..Default::default()
        };
        let s_fresh = classify_strengths(&fresh, 10);
        let s_stale = classify_strengths(&stale, 10);
        assert_eq!(s_fresh.role_change, SignalStrength::Large);
        assert!(s_fresh.role_change >= s_stale.role_change);
    }

    #[test]
    fn star_rules() {
        let none = SignalStrengths {
            role_change: SignalStrength::None,
            hiring: SignalStrength::None,
            funding: SignalStrength::None,
            csuite: SignalStrength::None,
        };
        assert_eq!(star_rating(&none, 10.0), 1);

        let one_large = SignalStrengths { hiring: SignalStrength::Large, ..none };
        assert_eq!(star_rating(&one_large, 0.0), 3);

        let two_medium = SignalStrengths {
            hiring: SignalStrength::Medium,
            funding: SignalStrength::Medium,
            ..none
        };
        assert_eq!(star_rating(&two_medium, 0.0), 3);

        let medium_reachable = SignalStrengths { hiring: SignalStrength::Medium, ..none };
        assert_eq!(star_rating(&medium_reachable, 6.0), 3);
        assert_eq!(star_rating(&medium_reachable, 5.0), 2);

        let two_small = SignalStrengths {
            hiring: SignalStrength::Small,
            funding: SignalStrength::Small,
            ..none
        };
        assert_eq!(star_rating(&two_small, 0.0), 2);

        let one_small = SignalStrengths { hiring: SignalStrength::Small, ..none };
        assert_eq!(star_rating(&one_small, 10.0), 1);
    }

    #[test]
    fn normalization_is_bounded() {
        let acct = account(TriggerMap {
            hiring: Some(HiringSignal { open_roles: 50, evidence: "50 open roles".into() }),
            funding: Some(FundingSignal { stage: None, days_ago: Some(10) }),
            csuite_change: Some(RoleChangeSignal { title: "CFO".into(), days_ago: Some(10) }),
            leadership_change: Some(RoleChangeSignal { title: "VP of People".into(), days_ago: Some(10) }),
            ..Default::default()
        });
        let full = ContactSummary {
            with_email: 2,
            with_phone: 2,
            with_profile: 3,
            senior_finance_hr: true,
        };
        let b = score_account(&acct, &full, &ScoringWeights::default());
        assert!(b.normalized <= 100.0);
        assert!(b.raw <= 110.0);
        assert_eq!(b.reachability, 10.0);
    }
}
