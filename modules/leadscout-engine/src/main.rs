use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use leadscout_common::{Config, Industry};
use leadscout_engine::discovery::{DiscoveryMode, DiscoveryRunner, ManualSpec};
use leadscout_engine::providers::{HttpFetcher, SearchProvider, SerperSearcher};
use leadscout_engine::score_run::ScoringRun;
use leadscout_store::{migrate, AccountStore, ContactStore, LeadQueueStore, SettingsStore};

#[derive(Parser)]
#[command(name = "leadscout", about = "Lead discovery and scoring engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Thematic rotation by run date.
    Auto,
    /// Operator-specified industries/triggers/geographies.
    Manual,
}

#[derive(Subcommand)]
enum Command {
    /// Run one discovery sweep.
    Discover {
        #[arg(long, value_enum, default_value = "auto")]
        mode: ModeArg,
        /// Target industry (repeatable, manual mode).
        #[arg(long)]
        industry: Vec<String>,
        /// Trigger keyword (repeatable, manual mode).
        #[arg(long)]
        trigger: Vec<String>,
        /// Geography term (repeatable, manual mode).
        #[arg(long)]
        geo: Vec<String>,
        /// Search results requested per query.
        #[arg(long)]
        limit: Option<usize>,
        /// Bypass the in-market region gate.
        #[arg(long)]
        allow_out_of_market: bool,
        /// Fixed query-sampling seed for a reproducible run.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Score the account pool and produce the daily lead queue.
    Score {
        /// Run date (default: today, UTC).
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Compute and print without persisting.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("leadscout=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let pool = leadscout_store::connect(&config.database_url).await?;
    migrate(&pool).await?;

    match cli.command {
        Command::Discover {
            mode,
            industry,
            trigger,
            geo,
            limit,
            allow_out_of_market,
            seed,
        } => {
            let searcher: Option<Box<dyn SearchProvider>> = config
                .serper_api_key
                .as_deref()
                .map(|key| Box::new(SerperSearcher::new(key)) as Box<dyn SearchProvider>);

            let runner = DiscoveryRunner::new(
                AccountStore::new(pool.clone()),
                SettingsStore::new(pool.clone()),
                searcher,
                Box::new(HttpFetcher::new()),
                Duration::from_secs(config.fetch_timeout_secs),
                config.fetch_concurrency,
            )
            .allow_out_of_market(allow_out_of_market)
            .with_seed(seed);

            let mode = match mode {
                ModeArg::Auto => DiscoveryMode::Auto,
                ModeArg::Manual => DiscoveryMode::Manual(ManualSpec {
                    industries: parse_industries(&industry)?,
                    triggers: trigger,
                    geos: geo,
                    result_count: limit,
                }),
            };

            let stats = runner.run(mode).await?;
            info!(
                created = stats.kept_new,
                updated = stats.kept_updated,
                "Discovery run finished"
            );
        }
        Command::Score { date, dry_run } => {
            let run_date = date.unwrap_or_else(|| Utc::now().date_naive());
            let run = ScoringRun::new(
                AccountStore::new(pool.clone()),
                ContactStore::new(pool.clone()),
                LeadQueueStore::new(pool.clone()),
            );
            let (stats, entries) = run.run(run_date, dry_run).await?;
            println!("{stats}");
            if dry_run {
                for entry in &entries {
                    println!(
                        "  #{:<3} {:<40} score={:>5.1} stars={}",
                        entry.rank, entry.account_id, entry.score, entry.stars
                    );
                }
            }
        }
    }

    Ok(())
}

fn parse_industries(raw: &[String]) -> Result<Vec<Industry>> {
    raw.iter()
        .map(|s| {
            Industry::parse(s).ok_or_else(|| {
                let valid: Vec<&str> = Industry::ALL.iter().map(|i| i.as_str()).collect();
                anyhow::anyhow!("Unknown industry '{s}'. Valid values: {}", valid.join(", "))
            })
        })
        .collect()
}
