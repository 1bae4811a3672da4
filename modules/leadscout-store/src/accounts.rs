use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use leadscout_common::{
    Account, Classification, Disposition, Industry, RegionBucket, TriggerMap,
};

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    name: String,
    canonical_name: String,
    domain: Option<String>,
    website: Option<String>,
    hq_city: Option<String>,
    hq_state: Option<String>,
    hq_country: Option<String>,
    region: String,
    industry: Option<String>,
    employee_count: Option<i32>,
    employee_range: Option<String>,
    triggers: Json<TriggerMap>,
    classification: String,
    high_intent: bool,
    high_intent_reasons: Json<Vec<String>>,
    disposition: String,
    fit_score: f32,
    source: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(r: AccountRow) -> Self {
        Account {
            id: r.id,
            name: r.name,
            canonical_name: r.canonical_name,
            domain: r.domain,
            website: r.website,
            hq_city: r.hq_city,
            hq_state: r.hq_state,
            hq_country: r.hq_country,
            region: RegionBucket::parse(&r.region),
            industry: r.industry.as_deref().and_then(Industry::parse),
            employee_count: r.employee_count,
            employee_range: r.employee_range,
            triggers: r.triggers.0,
            classification: Classification::parse(&r.classification),
            high_intent: r.high_intent,
            high_intent_reasons: r.high_intent_reasons.0,
            disposition: Disposition::parse(&r.disposition),
            fit_score: r.fit_score,
            source: r.source,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Account reads and idempotent upserts. Never issues destructive deletes.
#[derive(Clone)]
pub struct AccountStore {
    pool: PgPool,
}

impl AccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, name, canonical_name, domain, website,
                hq_city, hq_state, hq_country, region, industry,
                employee_count, employee_range, triggers, classification,
                high_intent, high_intent_reasons, disposition, fit_score,
                source, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
            "#,
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.canonical_name)
        .bind(&account.domain)
        .bind(&account.website)
        .bind(&account.hq_city)
        .bind(&account.hq_state)
        .bind(&account.hq_country)
        .bind(account.region.as_str())
        .bind(account.industry.map(|i| i.as_str()))
        .bind(account.employee_count)
        .bind(&account.employee_range)
        .bind(Json(&account.triggers))
        .bind(account.classification.as_str())
        .bind(account.high_intent)
        .bind(Json(&account.high_intent_reasons))
        .bind(account.disposition.as_str())
        .bind(account.fit_score)
        .bind(&account.source)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Merge a re-discovered candidate into an existing row: refreshed
    /// triggers, geography, industry, sizing, and high-intent state.
    /// Identity fields (name, canonical_name, created_at) are left alone.
    pub async fn update_discovery(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE accounts SET
                domain = COALESCE($2, domain),
                website = COALESCE($3, website),
                hq_city = COALESCE($4, hq_city),
                hq_state = COALESCE($5, hq_state),
                hq_country = COALESCE($6, hq_country),
                region = $7,
                industry = COALESCE($8, industry),
                employee_count = COALESCE($9, employee_count),
                employee_range = COALESCE($10, employee_range),
                triggers = $11,
                high_intent = $12,
                high_intent_reasons = $13,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(account.id)
        .bind(&account.domain)
        .bind(&account.website)
        .bind(&account.hq_city)
        .bind(&account.hq_state)
        .bind(&account.hq_country)
        .bind(account.region.as_str())
        .bind(account.industry.map(|i| i.as_str()))
        .bind(account.employee_count)
        .bind(&account.employee_range)
        .bind(Json(&account.triggers))
        .bind(account.high_intent)
        .bind(Json(&account.high_intent_reasons))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Find an existing account colliding with any of the candidate's dedup
    /// keys: canonical name variants (canonicalized page title and company
    /// name) or domain.
    pub async fn find_by_dedup_keys(
        &self,
        canonical_names: &[String],
        domain: Option<&str>,
    ) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT * FROM accounts
            WHERE canonical_name = ANY($1) OR ($2::TEXT IS NOT NULL AND domain = $2)
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(canonical_names)
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Account::from))
    }

    /// All domains already present in the store, regardless of disposition.
    /// Used to skip candidates before the fetch stage.
    pub async fn known_domains(&self) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT domain FROM accounts WHERE domain IS NOT NULL")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(d,)| d).collect())
    }

    /// The full snapshot the scorer operates on: every account in a
    /// scoreable disposition.
    pub async fn scoring_pool(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT * FROM accounts
            WHERE disposition IN ('active', 'needs_review')
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Account::from).collect())
    }

    /// Active accounts with a fetchable website, oldest-refreshed first.
    /// These are the targets when discovery degrades to enrichment-only mode.
    pub async fn enrichment_targets(&self, limit: i64) -> Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT * FROM accounts
            WHERE disposition = 'active' AND website IS NOT NULL
            ORDER BY updated_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Account::from).collect())
    }

    /// Persist the fit score computed by a non-dry-run scoring pass so the
    /// account list UI can sort without recomputing.
    pub async fn update_fit_score(&self, id: Uuid, fit_score: f32) -> Result<()> {
        sqlx::query("UPDATE accounts SET fit_score = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(fit_score)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
