//! Discovery run log — persisted JSON timeline of every action taken during
//! a run.
//!
//! Each run produces a single `{DATA_DIR}/discovery-runs/{run_id}.json` file
//! containing an ordered list of events with timestamps plus the final
//! stats, for operator debugging of "why did this account (not) appear".

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::discovery::DiscoveryStats;

/// Root data directory, controlled by `DATA_DIR` env var (default: `"data"`).
pub fn data_dir() -> PathBuf {
    PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()))
}

pub struct RunLog {
    pub run_id: String,
    pub mode: String,
    pub started_at: DateTime<Utc>,
    events: Vec<RunEvent>,
    seq: u32,
}

#[derive(Serialize)]
struct RunEvent {
    seq: u32,
    ts: DateTime<Utc>,
    #[serde(flatten)]
    kind: EventKind,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    SearchQuery {
        query: String,
        result_count: u32,
    },
    CandidateSkipped {
        url: String,
        reason: String,
    },
    FetchFailed {
        url: String,
        error: String,
    },
    CandidateRejected {
        url: String,
        reason: String,
    },
    AccountCreated {
        account_id: String,
        name: String,
        industry: Option<String>,
        region: String,
    },
    AccountUpdated {
        account_id: String,
        name: String,
    },
    RepeatSuppressed {
        name: String,
        account_age_days: i64,
    },
    DiversityCapped {
        name: String,
        industry: String,
    },
    FillRound {
        industry: String,
        queries: u32,
    },
    EnrichmentRefreshed {
        account_id: String,
        name: String,
    },
    Degraded {
        reason: String,
    },
}

impl RunLog {
    pub fn new(run_id: String, mode: String) -> Self {
        Self {
            run_id,
            mode,
            started_at: Utc::now(),
            events: Vec::new(),
            seq: 0,
        }
    }

    pub fn log(&mut self, kind: EventKind) {
        self.events.push(RunEvent {
            seq: self.seq,
            ts: Utc::now(),
            kind,
        });
        self.seq += 1;
    }

    /// Serialize the run log to JSON and write to disk.
    /// Returns the file path on success.
    pub fn save(&self, stats: &DiscoveryStats) -> Result<PathBuf> {
        let dir = data_dir().join("discovery-runs");
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.json", self.run_id));

        let output = SerializedRunLog {
            run_id: &self.run_id,
            mode: &self.mode,
            started_at: self.started_at,
            finished_at: Utc::now(),
            stats,
            events: &self.events,
        };

        std::fs::write(&path, serde_json::to_string_pretty(&output)?)?;
        info!(path = %path.display(), events = self.events.len(), "Discovery run log saved");

        Ok(path)
    }
}

#[derive(Serialize)]
struct SerializedRunLog<'a> {
    run_id: &'a str,
    mode: &'a str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    stats: &'a DiscoveryStats,
    events: &'a [RunEvent],
}
