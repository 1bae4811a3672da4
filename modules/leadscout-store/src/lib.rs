pub mod accounts;
pub mod contacts;
pub mod lead_queue;
pub mod migrate;
pub mod settings;

pub use accounts::AccountStore;
pub use contacts::ContactStore;
pub use lead_queue::LeadQueueStore;
pub use migrate::migrate;
pub use settings::SettingsStore;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Open a Postgres pool sized for batch invocations, not a serving tier.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}
