use anyhow::Context;
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use leadscout_common::{LeadQueueEntry, LeadScoutError, ScoreBreakdown};

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    run_date: NaiveDate,
    account_id: Uuid,
    rank: i32,
    score: f32,
    stars: i16,
    breakdown: Json<ScoreBreakdown>,
    status: String,
}

impl From<EntryRow> for LeadQueueEntry {
    fn from(r: EntryRow) -> Self {
        LeadQueueEntry {
            id: r.id,
            run_date: r.run_date,
            account_id: r.account_id,
            rank: r.rank,
            score: r.score,
            stars: r.stars,
            breakdown: r.breakdown.0,
            status: r.status,
        }
    }
}

/// Lead queue persistence. One batch per run date, enforced by the
/// lead_queue_runs primary key so concurrent scoring invocations cannot
/// write overlapping queues.
#[derive(Clone)]
pub struct LeadQueueStore {
    pool: PgPool,
}

impl LeadQueueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Claim a run date. Refused with `DuplicateRunDate` when a queue for
    /// this date already exists — the caller must delete it or use dry-run.
    pub async fn begin_run(&self, run_date: NaiveDate) -> Result<(), LeadScoutError> {
        let result = sqlx::query("INSERT INTO lead_queue_runs (run_date) VALUES ($1)")
            .bind(run_date)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
                    return Err(LeadScoutError::DuplicateRunDate(run_date));
                }
                Err(LeadScoutError::Database(e.to_string()))
            }
        }
    }

    /// Write one ranked batch. The caller has already claimed the run date.
    pub async fn insert_entries(&self, entries: &[LeadQueueEntry]) -> Result<(), LeadScoutError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to open lead queue transaction")?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO lead_queue_entries
                    (id, run_date, account_id, rank, score, stars, breakdown, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(entry.id)
            .bind(entry.run_date)
            .bind(entry.account_id)
            .bind(entry.rank)
            .bind(entry.score)
            .bind(entry.stars)
            .bind(Json(&entry.breakdown))
            .bind(&entry.status)
            .execute(&mut *tx)
            .await
            .map_err(|e| LeadScoutError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .context("Failed to commit lead queue batch")?;

        info!(entries = entries.len(), "Lead queue batch persisted");
        Ok(())
    }

    pub async fn entries_for(&self, run_date: NaiveDate) -> anyhow::Result<Vec<LeadQueueEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            "SELECT * FROM lead_queue_entries WHERE run_date = $1 ORDER BY rank ASC",
        )
        .bind(run_date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LeadQueueEntry::from).collect())
    }
}
