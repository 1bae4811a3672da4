//! End-to-end pure-pipeline scenarios: page text through classification,
//! geography, signal detection, scoring, and selection, with no network or
//! database.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use leadscout_common::{
    canonicalize_name, Account, Classification, Contact, ContactSummary, Disposition, Industry,
    KeywordConfig, RegionBucket, TriggerMap,
};
use leadscout_engine::classifier::{ClassifierInput, EntityClassifier};
use leadscout_engine::geography::{region_for, GeoResolver};
use leadscout_engine::scoring::{score_account, ScoringWeights};
use leadscout_engine::selection::{build_entries, select, ScoredAccount, SelectionQuotas};
use leadscout_engine::signals::{high_intent, SignalDetector};

fn account_from_page(page: &str, url: &str, domain: &str, fallback_title: &str) -> Option<Account> {
    let keywords = KeywordConfig::default();
    let classifier = EntityClassifier::new();
    let geo = GeoResolver::new();
    let detector = SignalDetector::new(&keywords, 3);

    let name = classifier.display_name(page, fallback_title);
    let classification = classifier.classify(
        &ClassifierInput { name: &name, domain: Some(domain), text: page },
        &keywords,
    );
    if classification != Classification::Employer {
        return None;
    }

    let hq = geo.resolve(page);
    if !hq.confirmed_in_country() {
        return None;
    }
    let region = region_for(hq.state.as_deref());

    let triggers = detector.detect(page);
    let (hi, hi_reasons) = high_intent(&triggers, 10);
    let employee_count = classifier.extract_employee_count(page).map(|(c, _)| c);
    let industry = classifier.infer_industry(&name, Some(domain), page);

    let now = Utc::now();
    Some(Account {
        id: Uuid::new_v4(),
        canonical_name: canonicalize_name(&name),
        name,
        domain: Some(domain.to_string()),
        website: Some(url.to_string()),
        hq_city: hq.city,
        hq_state: hq.state,
        hq_country: hq.country,
        region,
        industry,
        employee_count,
        employee_range: None,
        triggers,
        classification,
        high_intent: hi,
        high_intent_reasons: hi_reasons,
        disposition: Disposition::Active,
        fit_score: 0.0,
        source: "discovery:auto".to_string(),
        created_at: now,
        updated_at: now,
    })
}

#[test]
fn healthcare_employer_page_scores_three_stars() {
    let filler = "Compassionate home health aides serving central Ohio families. ".repeat(12);
    let page = format!(
        r#"<html><head><title>Maple Home Care LLC | Columbus OH</title>
        <script type="application/ld+json">{{"@type":"Organization","name":"Maple Home Care LLC",
        "address":{{"addressLocality":"Columbus","addressRegion":"OH","addressCountry":"US"}}}}</script>
        </head><body>{filler}
        About Us: serving families since 2009 with 120 employees statewide.
        Contact Us: 77 Maple Street, Columbus, OH 43215.
        Careers: we currently have 12 open positions for caregivers and nurses.
        </body></html>"#
    );

    let account = account_from_page(&page, "https://maplehomecare.com/", "maplehomecare.com", "Maple Home Care")
        .expect("page should classify as an employer");

    assert_eq!(account.industry, Some(Industry::HealthcareSocialAssistance));
    assert_eq!(account.region, RegionBucket::Primary);
    assert_eq!(account.employee_count, Some(120));
    assert_eq!(account.triggers.hiring.as_ref().unwrap().open_roles, 12);
    assert!(account.high_intent);

    // One CFO contact with an email.
    let contacts = vec![Contact {
        id: Uuid::new_v4(),
        account_id: account.id,
        title: Some("CFO".to_string()),
        has_email: true,
        has_phone: false,
        has_profile: false,
    }];
    let summary = ContactSummary::from_contacts(&contacts);

    let breakdown = score_account(&account, &summary, &ScoringWeights::default());
    assert_eq!(breakdown.industry, 25.0);
    assert_eq!(breakdown.size, 15.0);
    assert!(breakdown.fit() >= 40.0);
    assert_eq!(breakdown.hiring, 25.0);
    assert!(breakdown.reachability >= 6.0);
    assert_eq!(breakdown.stars, 3);
}

#[test]
fn listicle_page_never_becomes_an_account() {
    let filler = "Our annual ranked roundup of employers worth watching. ".repeat(14);
    let page = format!(
        r#"<html><head><title>Top 25 Employers in the Region</title></head>
        <body>{filler} Featuring Buckeye Precision Machining of Columbus, OH.
        About us: we write lists. Contact us anytime.</body></html>"#
    );

    let account = account_from_page(&page, "https://regionlists.com/top-25", "regionlists.com", "Top 25 Employers");
    assert!(account.is_none());
}

fn pool_account(i: usize, region: RegionBucket, stars_seed: u8, normalized_seed: f32) -> ScoredAccount {
    let domain = format!("acct{i:03}.com");
    let account = Account {
        id: Uuid::new_v4(),
        name: domain.clone(),
        canonical_name: domain.clone(),
        domain: Some(domain.clone()),
        website: Some(format!("https://{domain}")),
        hq_city: None,
        hq_state: None,
        hq_country: Some("US".to_string()),
        region,
        industry: Some(Industry::Manufacturing),
        employee_count: Some(100 + i as i32),
        employee_range: None,
        triggers: TriggerMap::default(),
        classification: Classification::Employer,
        high_intent: false,
        high_intent_reasons: vec![],
        disposition: Disposition::Active,
        fit_score: 0.0,
        source: "test".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let breakdown = leadscout_common::ScoreBreakdown {
        normalized: normalized_seed,
        stars: stars_seed,
        ..Default::default()
    };
    ScoredAccount { account, breakdown }
}

#[test]
fn rescoring_an_unchanged_pool_is_idempotent() {
    let pool: Vec<ScoredAccount> = (0..70)
        .map(|i| {
            let region = match i % 10 {
                8 => RegionBucket::Secondary,
                9 => RegionBucket::Other,
                _ => RegionBucket::Primary,
            };
            pool_account(i, region, (i % 3 + 1) as u8, 40.0 + (i % 55) as f32)
        })
        .collect();

    let quotas = SelectionQuotas::default();
    let run_date = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();

    let first = build_entries(&select(pool.clone(), &quotas), run_date);
    let second = build_entries(&select(pool, &quotas), run_date);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.account_id, b.account_id);
        assert_eq!(a.rank, b.rank);
        assert_eq!(a.stars, b.stars);
        assert!((a.score - b.score).abs() < f32::EPSILON);
    }

    // Ranks are 1..N and unique.
    let ranks: Vec<i32> = first.iter().map(|e| e.rank).collect();
    let expected: Vec<i32> = (1..=first.len() as i32).collect();
    assert_eq!(ranks, expected);
}

#[test]
fn queue_respects_regional_quota_invariant() {
    let mut pool = Vec::new();
    for i in 0..55 {
        pool.push(pool_account(i, RegionBucket::Primary, 2, 75.0));
    }
    for i in 55..63 {
        pool.push(pool_account(i, RegionBucket::Secondary, 3, 92.0));
    }
    for i in 63..68 {
        pool.push(pool_account(i, RegionBucket::Other, 3, 93.0));
    }

    let selected = select(pool, &SelectionQuotas::default());
    assert!(selected.len() <= 50);

    let primary = selected.iter().filter(|s| s.account.region == RegionBucket::Primary).count();
    let secondary = selected.iter().filter(|s| s.account.region == RegionBucket::Secondary).count();
    let other = selected.iter().filter(|s| s.account.region == RegionBucket::Other).count();

    assert!(primary <= 45);
    assert!(secondary <= 4);
    assert!(other <= 1);
    assert_eq!(primary + secondary + other, selected.len());
}
