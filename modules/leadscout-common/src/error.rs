use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeadScoutError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Search provider error: {0}")]
    Search(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lead queue for {0} already exists; delete it first or re-run with --dry-run")]
    DuplicateRunDate(NaiveDate),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
