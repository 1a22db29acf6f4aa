//! # rink CLI
//!
//! The `rink` binary drives ingestion, queries the stored records, and starts
//! the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! rink --config ./config/rink.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rink init [--reset]` | Create (or recreate) the record table |
//! | `rink update` | Run one ingestion pass for a season |
//! | `rink query` | Print stored records for a season |
//! | `rink teams` | Show which allow-listed teams the API knows |
//! | `rink roster <team_id>` | Print a team roster |
//! | `rink serve` | Start the HTTP server |
//!
//! Log verbosity is controlled by `RINK_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rink_ledger::config;
use rink_ledger::ingest::{self, UpdateRequest};
use rink_ledger::models::{GameType, Season};
use rink_ledger::query;
use rink_ledger::roster;
use rink_ledger::server;
use rink_ledger::store::RecordStore;
use rink_ledger::teams;

/// rink: ingest NHL player stats for allow-listed teams into SQLite.
#[derive(Parser)]
#[command(
    name = "rink",
    about = "Ingest per-game NHL player stats for allow-listed teams into SQLite",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/rink.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent unless `--reset` is given, which drops every stored record.
    Init {
        /// Drop and recreate the record table.
        #[arg(long)]
        reset: bool,
    },

    /// Fetch teams, schedules and boxscores and store matching player lines.
    ///
    /// Safe to re-run: records already stored are left untouched.
    Update {
        #[command(flatten)]
        season: SeasonArgs,
    },

    /// Print stored records for a season and game type.
    Query {
        #[command(flatten)]
        season: SeasonArgs,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// List the allow-listed teams found in the API's team list.
    Teams,

    /// Print a team's roster for a season.
    Roster {
        /// Upstream team id (e.g. 20 for Calgary).
        team_id: i64,

        /// Season end year (`2021`) or 8-digit code (`20202021`).
        #[arg(long)]
        season: Option<Season>,
    },

    /// Start the HTTP server.
    Serve,
}

#[derive(clap::Args)]
struct SeasonArgs {
    /// Season end year (`2021`) or 8-digit code (`20202021`).
    /// Defaults to the season ending this calendar year.
    #[arg(long)]
    season: Option<Season>,

    /// Single-letter game type (`R` regular season, `P` playoffs).
    #[arg(long, default_value = "R")]
    game_type: GameType,
}

impl SeasonArgs {
    fn request(self) -> UpdateRequest {
        UpdateRequest::new(self.season.unwrap_or_else(Season::current), self.game_type)
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("RINK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init { reset } => {
            let store = RecordStore::open(&cfg.db.path).await?;
            store.init(reset).await?;
            store.close().await;
            if reset {
                println!("Database reset successfully.");
            } else {
                println!("Database initialized successfully.");
            }
        }
        Commands::Update { season } => {
            ingest::run_update(&cfg, &season.request()).await?;
        }
        Commands::Query { season, json } => {
            let request = season.request();
            query::run_query(&cfg, request.season, &request.game_type, json).await?;
        }
        Commands::Teams => {
            teams::run_teams(&cfg).await?;
        }
        Commands::Roster { team_id, season } => {
            roster::run_roster(&cfg, team_id, season.unwrap_or_else(Season::current)).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
