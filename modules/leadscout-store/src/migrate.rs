use sqlx::PgPool;
use tracing::info;

/// Run idempotent schema migrations: tables, then indexes.
///
/// The partial unique indexes on accounts enforce the dedup invariant at the
/// persistence boundary: no two accounts in a scoreable disposition may share
/// a canonical name or domain. The lead_queue_runs primary key is the
/// concurrency guard against duplicate scoring runs for one date.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Running schema migrations...");

    let tables = [
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            canonical_name TEXT NOT NULL,
            domain TEXT,
            website TEXT,
            hq_city TEXT,
            hq_state TEXT,
            hq_country TEXT,
            region TEXT NOT NULL DEFAULT 'other',
            industry TEXT,
            employee_count INTEGER,
            employee_range TEXT,
            triggers JSONB NOT NULL DEFAULT '{}',
            classification TEXT NOT NULL DEFAULT 'employer',
            high_intent BOOLEAN NOT NULL DEFAULT FALSE,
            high_intent_reasons JSONB NOT NULL DEFAULT '[]',
            disposition TEXT NOT NULL DEFAULT 'active',
            fit_score REAL NOT NULL DEFAULT 0,
            source TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id UUID PRIMARY KEY,
            account_id UUID NOT NULL REFERENCES accounts(id),
            title TEXT,
            email TEXT,
            phone TEXT,
            profile_url TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS lead_queue_runs (
            run_date DATE PRIMARY KEY,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS lead_queue_entries (
            id UUID PRIMARY KEY,
            run_date DATE NOT NULL REFERENCES lead_queue_runs(run_date),
            account_id UUID NOT NULL REFERENCES accounts(id),
            rank INTEGER NOT NULL,
            score REAL NOT NULL,
            stars SMALLINT NOT NULL,
            breakdown JSONB NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            UNIQUE (run_date, rank),
            UNIQUE (run_date, account_id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS keyword_config (
            key TEXT PRIMARY KEY,
            value JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS audit_log (
            id UUID PRIMARY KEY,
            occurred_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            actor TEXT NOT NULL DEFAULT 'engine',
            action TEXT NOT NULL,
            detail JSONB NOT NULL DEFAULT '{}'
        )
        "#,
    ];

    for t in &tables {
        sqlx::query(t).execute(pool).await?;
    }

    let indexes = [
        // Dedup invariant over scoreable dispositions only; suppressed and
        // rejected rows may keep their keys without blocking a re-discovery.
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS accounts_canonical_name_scoreable
        ON accounts (canonical_name)
        WHERE disposition IN ('active', 'needs_review')
        "#,
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS accounts_domain_scoreable
        ON accounts (domain)
        WHERE domain IS NOT NULL AND disposition IN ('active', 'needs_review')
        "#,
        "CREATE INDEX IF NOT EXISTS accounts_disposition ON accounts (disposition)",
        "CREATE INDEX IF NOT EXISTS accounts_created_at ON accounts (created_at)",
        "CREATE INDEX IF NOT EXISTS contacts_account_id ON contacts (account_id)",
        "CREATE INDEX IF NOT EXISTS lead_queue_entries_run_date ON lead_queue_entries (run_date)",
    ];

    for idx in &indexes {
        sqlx::query(idx).execute(pool).await?;
    }

    info!("Schema migrations complete");
    Ok(())
}
