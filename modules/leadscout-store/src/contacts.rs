use std::collections::HashMap;

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use leadscout_common::Contact;

#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: Uuid,
    account_id: Uuid,
    title: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    profile_url: Option<String>,
}

impl From<ContactRow> for Contact {
    fn from(r: ContactRow) -> Self {
        Contact {
            id: r.id,
            account_id: r.account_id,
            title: r.title,
            has_email: r.email.as_deref().is_some_and(|e| !e.is_empty()),
            has_phone: r.phone.as_deref().is_some_and(|p| !p.is_empty()),
            has_profile: r.profile_url.as_deref().is_some_and(|u| !u.is_empty()),
        }
    }
}

/// Read-only view of the externally managed contacts table. The engine only
/// ever needs titles and presence of reach channels.
#[derive(Clone)]
pub struct ContactStore {
    pool: PgPool,
}

impl ContactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Contacts grouped by account, for the full scoring snapshot.
    pub async fn by_account(&self) -> Result<HashMap<Uuid, Vec<Contact>>> {
        let rows = sqlx::query_as::<_, ContactRow>(
            "SELECT id, account_id, title, email, phone, profile_url FROM contacts",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<Contact>> = HashMap::new();
        for row in rows {
            grouped.entry(row.account_id).or_default().push(row.into());
        }
        Ok(grouped)
    }
}
