use anyhow::Result;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use leadscout_common::{DiscoverySettings, KeywordConfig};

const KEYWORDS_KEY: &str = "keywords";
const DISCOVERY_KEY: &str = "discovery";

/// Operator-editable configuration rows plus the audit log. Each run loads
/// its configuration once and passes it into the detectors explicitly; there
/// is no ambient global state to reconfigure.
#[derive(Clone)]
pub struct SettingsStore {
    pool: PgPool,
}

impl SettingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the keyword configuration, falling back to compiled defaults
    /// when the row is absent or unparseable.
    pub async fn keyword_config(&self) -> Result<KeywordConfig> {
        self.load_or_default(KEYWORDS_KEY).await
    }

    pub async fn discovery_settings(&self) -> Result<DiscoverySettings> {
        self.load_or_default(DISCOVERY_KEY).await
    }

    async fn load_or_default<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT value FROM keyword_config WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((value,)) => match serde_json::from_value(value) {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!(key, error = %e, "Unparseable config row, using defaults");
                    Ok(T::default())
                }
            },
            None => Ok(T::default()),
        }
    }

    /// Append a run record to the audit log.
    pub async fn audit(&self, action: &str, detail: serde_json::Value) -> Result<()> {
        sqlx::query("INSERT INTO audit_log (id, action, detail) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(action)
            .bind(Json(detail))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
