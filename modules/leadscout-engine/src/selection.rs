//! Daily lead queue selection: deterministic ranking plus quota-constrained
//! top-N fill.
//!
//! The sort key is the contract behind "why is this lead above that one" —
//! it must produce an identical order for an identical scored snapshot, so
//! every comparison bottoms out in a total order ending at the domain
//! string.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;
use uuid::Uuid;

use leadscout_common::{Account, LeadQueueEntry, RegionBucket, ScoreBreakdown};

/// An account paired with its computed breakdown for one scoring snapshot.
#[derive(Debug, Clone)]
pub struct ScoredAccount {
    pub account: Account,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone)]
pub struct SelectionQuotas {
    pub total: usize,
    pub primary_cap: usize,
    pub secondary_cap: usize,
    /// Secondary-region accounts must clear this normalized score to take a
    /// quota slot.
    pub secondary_floor: f32,
    pub other_cap: usize,
    pub other_floor: f32,
    /// Target employee-count midpoint for the size tie-break.
    pub size_midpoint: i32,
}

impl Default for SelectionQuotas {
    fn default() -> Self {
        Self {
            total: 50,
            primary_cap: 45,
            secondary_cap: 4,
            secondary_floor: 85.0,
            other_cap: 1,
            other_floor: 90.0,
            size_midpoint: 150,
        }
    }
}

fn size_distance(account: &Account, midpoint: i32) -> i64 {
    account
        .employee_count
        .map_or(i64::MAX, |c| i64::from(c - midpoint).abs())
}

fn compare(a: &ScoredAccount, b: &ScoredAccount, midpoint: i32) -> Ordering {
    b.breakdown
        .stars
        .cmp(&a.breakdown.stars)
        .then_with(|| b.breakdown.normalized.total_cmp(&a.breakdown.normalized))
        .then_with(|| b.breakdown.hiring.total_cmp(&a.breakdown.hiring))
        .then_with(|| b.breakdown.csuite.total_cmp(&a.breakdown.csuite))
        .then_with(|| b.breakdown.reachability.total_cmp(&a.breakdown.reachability))
        .then_with(|| size_distance(&a.account, midpoint).cmp(&size_distance(&b.account, midpoint)))
        .then_with(|| {
            a.account
                .domain
                .as_deref()
                .unwrap_or("")
                .cmp(b.account.domain.as_deref().unwrap_or(""))
        })
}

/// Sort a pool into the canonical priority order.
pub fn sort_pool(pool: &mut [ScoredAccount], quotas: &SelectionQuotas) {
    pool.sort_by(|a, b| compare(a, b, quotas.size_midpoint));
}

/// Quota-constrained fill: the queue is dominated by the primary market,
/// with a handful of slots for truly exceptional outlying accounts, then
/// backfilled from remaining primary and finally the whole pool.
pub fn select(mut pool: Vec<ScoredAccount>, quotas: &SelectionQuotas) -> Vec<ScoredAccount> {
    // Guardrailed accounts never surface, no matter how thin the pool is.
    pool.retain(|s| s.account.disposition.scoreable() && !s.breakdown.zeroed);
    sort_pool(&mut pool, quotas);

    let mut chosen: Vec<ScoredAccount> = Vec::with_capacity(quotas.total);
    let mut taken: HashSet<Uuid> = HashSet::new();

    let mut take = |s: &ScoredAccount, chosen: &mut Vec<ScoredAccount>, taken: &mut HashSet<Uuid>| {
        if chosen.len() < quotas.total && taken.insert(s.account.id) {
            chosen.push(s.clone());
            true
        } else {
            false
        }
    };

    // Primary market up to its cap.
    let mut primary_taken = 0;
    for s in pool.iter().filter(|s| s.account.region == RegionBucket::Primary) {
        if primary_taken >= quotas.primary_cap {
            break;
        }
        if take(s, &mut chosen, &mut taken) {
            primary_taken += 1;
        }
    }

    // Secondary region, high floor, small cap.
    let mut secondary_taken = 0;
    for s in pool.iter().filter(|s| {
        s.account.region == RegionBucket::Secondary && s.breakdown.normalized >= quotas.secondary_floor
    }) {
        if secondary_taken >= quotas.secondary_cap {
            break;
        }
        if take(s, &mut chosen, &mut taken) {
            secondary_taken += 1;
        }
    }

    // Rest of market, higher floor still, single slot.
    let mut other_taken = 0;
    for s in pool.iter().filter(|s| {
        s.account.region == RegionBucket::Other && s.breakdown.normalized >= quotas.other_floor
    }) {
        if other_taken >= quotas.other_cap {
            break;
        }
        if take(s, &mut chosen, &mut taken) {
            other_taken += 1;
        }
    }

    // Backfill: any remaining primary first, then the full sorted pool.
    if chosen.len() < quotas.total {
        for s in pool.iter().filter(|s| s.account.region == RegionBucket::Primary) {
            if chosen.len() >= quotas.total {
                break;
            }
            take(s, &mut chosen, &mut taken);
        }
    }
    if chosen.len() < quotas.total {
        for s in &pool {
            if chosen.len() >= quotas.total {
                break;
            }
            take(s, &mut chosen, &mut taken);
        }
    }

    // Ranks follow the canonical order, not quota-pass order.
    sort_pool(&mut chosen, quotas);
    chosen
}

/// Materialize one immutable ranked batch for the run date.
pub fn build_entries(selected: &[ScoredAccount], run_date: NaiveDate) -> Vec<LeadQueueEntry> {
    selected
        .iter()
        .enumerate()
        .map(|(i, s)| LeadQueueEntry {
            id: Uuid::new_v4(),
            run_date,
            account_id: s.account.id,
            rank: (i + 1) as i32,
            score: s.breakdown.normalized,
            stars: i16::from(s.breakdown.stars),
            breakdown: s.breakdown,
            status: "pending".to_string(),
        })
        .collect()
}

// ===========================================================================
// Unit tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use leadscout_common::{Classification, Disposition, Industry, TriggerMap};

    fn scored(
        domain: &str,
        region: RegionBucket,
        stars: u8,
        normalized: f32,
        employee_count: Option<i32>,
    ) -> ScoredAccount {
        ScoredAccount {
            account: Account {
                id: Uuid::new_v4(),
                name: domain.to_string(),
                canonical_name: domain.to_string(),
                domain: Some(domain.to_string()),
                website: Some(format!("https://{domain}")),
                hq_city: None,
                hq_state: None,
                hq_country: Some("US".into()),
                region,
                industry: Some(Industry::Manufacturing),
                employee_count,
                employee_range: None,
                triggers: TriggerMap::default(),
                classification: Classification::Employer,
                high_intent: false,
                high_intent_reasons: vec![],
                disposition: Disposition::Active,
                fit_score: 0.0,
                source: "test".into(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            breakdown: ScoreBreakdown {
                normalized,
                stars,
                ..Default::default()
            },
        }
    }

    #[test]
    fn selection_is_deterministic_under_input_order() {
        let mut pool: Vec<ScoredAccount> = (0..80)
            .map(|i| {
                scored(
                    &format!("company{i:02}.com"),
                    RegionBucket::Primary,
                    (i % 3 + 1) as u8,
                    50.0 + (i % 40) as f32,
                    Some(40 + i),
                )
            })
            .collect();

        let quotas = SelectionQuotas::default();
        let first = select(pool.clone(), &quotas);

        pool.reverse();
        let second = select(pool, &quotas);

        let ids_a: Vec<Uuid> = first.iter().map(|s| s.account.id).collect();
        let ids_b: Vec<Uuid> = second.iter().map(|s| s.account.id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn quota_invariant_holds_with_a_deep_pool() {
        let mut pool = Vec::new();
        for i in 0..60 {
            pool.push(scored(&format!("primary{i:02}.com"), RegionBucket::Primary, 2, 70.0, Some(150)));
        }
        for i in 0..10 {
            // Half the secondary pool clears the floor.
            let score = if i < 5 { 88.0 } else { 70.0 };
            pool.push(scored(&format!("secondary{i:02}.com"), RegionBucket::Secondary, 3, score, Some(150)));
        }
        for i in 0..5 {
            let score = if i == 0 { 95.0 } else { 80.0 };
            pool.push(scored(&format!("other{i:02}.com"), RegionBucket::Other, 3, score, Some(150)));
        }

        let selected = select(pool, &SelectionQuotas::default());
        assert_eq!(selected.len(), 50);

        let primary = selected.iter().filter(|s| s.account.region == RegionBucket::Primary).count();
        let secondary: Vec<_> = selected
            .iter()
            .filter(|s| s.account.region == RegionBucket::Secondary)
            .collect();
        let other: Vec<_> = selected
            .iter()
            .filter(|s| s.account.region == RegionBucket::Other)
            .collect();

        assert_eq!(primary, 45);
        assert_eq!(secondary.len(), 4);
        assert!(secondary.iter().all(|s| s.breakdown.normalized >= 85.0));
        assert_eq!(other.len(), 1);
        assert!(other.iter().all(|s| s.breakdown.normalized >= 90.0));
    }

    #[test]
    fn small_pool_backfills_from_primary_then_everywhere() {
        let mut pool = Vec::new();
        for i in 0..8 {
            pool.push(scored(&format!("primary{i}.com"), RegionBucket::Primary, 1, 40.0, Some(150)));
        }
        // Below the secondary floor: only reachable through final backfill.
        for i in 0..3 {
            pool.push(scored(&format!("secondary{i}.com"), RegionBucket::Secondary, 1, 50.0, Some(150)));
        }

        let selected = select(pool, &SelectionQuotas::default());
        assert_eq!(selected.len(), 11);
        let primary = selected.iter().filter(|s| s.account.region == RegionBucket::Primary).count();
        assert_eq!(primary, 8);
    }

    #[test]
    fn zeroed_and_unscoreable_accounts_never_selected() {
        let mut ok = scored("good.com", RegionBucket::Primary, 2, 60.0, Some(150));
        ok.breakdown.zeroed = false;

        let mut zeroed = scored("ghost.com", RegionBucket::Primary, 1, 0.0, None);
        zeroed.breakdown.zeroed = true;

        let mut suppressed = scored("quiet.com", RegionBucket::Primary, 2, 80.0, Some(150));
        suppressed.account.disposition = Disposition::Suppressed;

        let selected = select(vec![ok, zeroed, suppressed], &SelectionQuotas::default());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].account.domain.as_deref(), Some("good.com"));
    }

    #[test]
    fn tie_breaks_end_at_domain_for_full_determinism() {
        let a = scored("alpha.com", RegionBucket::Primary, 2, 70.0, Some(150));
        let b = scored("beta.com", RegionBucket::Primary, 2, 70.0, Some(150));
        let mut pool = vec![b.clone(), a.clone()];
        sort_pool(&mut pool, &SelectionQuotas::default());
        assert_eq!(pool[0].account.domain.as_deref(), Some("alpha.com"));
        assert_eq!(pool[1].account.domain.as_deref(), Some("beta.com"));
    }

    #[test]
    fn missing_employee_count_sorts_after_known_counts() {
        let known = scored("known.com", RegionBucket::Primary, 2, 70.0, Some(900));
        let unknown = scored("aaaa.com", RegionBucket::Primary, 2, 70.0, None);
        let mut pool = vec![unknown, known];
        sort_pool(&mut pool, &SelectionQuotas::default());
        assert_eq!(pool[0].account.domain.as_deref(), Some("known.com"));
    }

    #[test]
    fn entries_carry_rank_score_and_breakdown() {
        let pool = vec![
            scored("alpha.com", RegionBucket::Primary, 3, 90.0, Some(150)),
            scored("beta.com", RegionBucket::Primary, 2, 70.0, Some(150)),
        ];
        let selected = select(pool, &SelectionQuotas::default());
        let run_date = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        let entries = build_entries(&selected, run_date);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].stars, 3);
        assert_eq!(entries[1].rank, 2);
        assert!(entries.iter().all(|e| e.status == "pending"));
        assert!(entries.iter().all(|e| e.run_date == run_date));
        assert!((entries[0].score - 90.0).abs() < f32::EPSILON);
    }
}
