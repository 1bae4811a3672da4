//! One scoring invocation: snapshot the pool, score, select, persist.

use chrono::NaiveDate;
use tracing::{info, warn};

use leadscout_common::{ContactSummary, LeadQueueEntry, LeadScoutError};
use leadscout_store::{AccountStore, ContactStore, LeadQueueStore};

use crate::scoring::{score_account, ScoringWeights};
use crate::selection::{build_entries, select, ScoredAccount, SelectionQuotas};

/// Stats from a scoring run.
#[derive(Debug, Default)]
pub struct ScoringStats {
    pub pool_size: u32,
    pub selected: u32,
    pub by_stars: [u32; 3],
    pub dry_run: bool,
}

impl std::fmt::Display for ScoringStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Scoring Run Complete ===")?;
        writeln!(f, "Accounts scored: {}", self.pool_size)?;
        writeln!(f, "Queue selected:  {}", self.selected)?;
        writeln!(f, "  3-star: {}", self.by_stars[2])?;
        writeln!(f, "  2-star: {}", self.by_stars[1])?;
        writeln!(f, "  1-star: {}", self.by_stars[0])?;
        if self.dry_run {
            writeln!(f, "Dry run: nothing persisted")?;
        }
        Ok(())
    }
}

pub struct ScoringRun {
    accounts: AccountStore,
    contacts: ContactStore,
    lead_queue: LeadQueueStore,
    weights: ScoringWeights,
    quotas: SelectionQuotas,
}

impl ScoringRun {
    pub fn new(accounts: AccountStore, contacts: ContactStore, lead_queue: LeadQueueStore) -> Self {
        Self {
            accounts,
            contacts,
            lead_queue,
            weights: ScoringWeights::default(),
            quotas: SelectionQuotas::default(),
        }
    }

    /// Score the full current pool and produce the queue for `run_date`.
    ///
    /// The pool is read once; a discovery commit racing this read leaves the
    /// queue reflecting a slightly stale pool, which is an accepted
    /// staleness window. Dry-run computes and returns the batch without
    /// persisting and without the one-run-per-date check; otherwise the
    /// run-date claim happens at the persistence boundary and a duplicate
    /// date refuses the whole run with no partial write.
    pub async fn run(
        &self,
        run_date: NaiveDate,
        dry_run: bool,
    ) -> Result<(ScoringStats, Vec<LeadQueueEntry>), LeadScoutError> {
        let pool = self
            .accounts
            .scoring_pool()
            .await
            .map_err(LeadScoutError::Anyhow)?;
        let contacts_by_account = self
            .contacts
            .by_account()
            .await
            .map_err(LeadScoutError::Anyhow)?;

        let scored: Vec<ScoredAccount> = pool
            .into_iter()
            .map(|account| {
                let summary = contacts_by_account
                    .get(&account.id)
                    .map(|c| ContactSummary::from_contacts(c))
                    .unwrap_or_default();
                let breakdown = score_account(&account, &summary, &self.weights);
                ScoredAccount { account, breakdown }
            })
            .collect();

        let mut stats = ScoringStats {
            pool_size: scored.len() as u32,
            dry_run,
            ..Default::default()
        };

        let selected = select(scored.clone(), &self.quotas);
        let entries = build_entries(&selected, run_date);

        stats.selected = entries.len() as u32;
        for entry in &entries {
            let idx = (entry.stars.clamp(1, 3) - 1) as usize;
            stats.by_stars[idx] += 1;
        }

        if dry_run {
            info!(run_date = %run_date, selected = entries.len(), "Dry run, skipping persistence");
            return Ok((stats, entries));
        }

        // Claim the date first; a duplicate refuses the run outright.
        self.lead_queue.begin_run(run_date).await?;
        self.lead_queue.insert_entries(&entries).await?;

        // Refresh stored fit scores for the account list UI.
        for s in &scored {
            if let Err(e) = self
                .accounts
                .update_fit_score(s.account.id, s.breakdown.normalized)
                .await
            {
                warn!(account_id = %s.account.id, error = %e, "Failed to update fit score");
            }
        }

        info!(run_date = %run_date, selected = entries.len(), "Lead queue persisted");
        Ok((stats, entries))
    }
}
