//! Ingestion pipeline orchestration.
//!
//! One update run walks a fixed sequence of stages:
//!
//! ```text
//! Idle → FetchingTeams → FilteringTeams → ExpandingSchedules
//!      → ExtractingBoxscores → Persisting → Done
//! ```
//!
//! Any error moves the run straight to `Failed`. Nothing is written before
//! `Persisting`, so a failure in an earlier stage leaves the store exactly as
//! it was; a failure while persisting keeps the rows already inserted.
//!
//! Boxscores are independent and are fetched with a bounded number of
//! requests in flight. All of them are collected before the first insert.

use anyhow::bail;
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::boxscore::{extract_players, ExtractContext};
use crate::client::{HttpStatsClient, StatsApi};
use crate::config::{Config, NationalityField};
use crate::error::{PipelineError, Result};
use crate::models::{GameType, PlayerGameRecord, Season};
use crate::schedule::{parse_schedule, GameSet};
use crate::store::RecordStore;
use crate::teams::{filter_teams, parse_teams};

/// What to ingest: one season and one game type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub season: Season,
    pub game_type: GameType,
}

impl UpdateRequest {
    pub fn new(season: Season, game_type: GameType) -> Self {
        Self { season, game_type }
    }
}

/// Filtering and scheduling knobs for a run, taken from [`Config`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub teams: Vec<String>,
    pub nationality: String,
    pub nationality_field: NationalityField,
    pub concurrency: usize,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            teams: config.filter.teams.clone(),
            nationality: config.filter.nationality.clone(),
            nationality_field: config.filter.nationality_field,
            concurrency: config.pipeline.concurrency.max(1),
            max_retries: config.pipeline.max_retries,
            retry_backoff: Duration::from_millis(config.pipeline.retry_backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    FetchingTeams,
    FilteringTeams,
    ExpandingSchedules,
    ExtractingBoxscores,
    Persisting,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Counts gathered during a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub teams: usize,
    pub games: usize,
    pub records_found: usize,
    pub records_inserted: u64,
    pub records_existing: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
}

/// Result of one update run. Never an `Err`: failures are reported through
/// `status`, the stage that failed, and the error kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub status: Status,
    /// Last stage entered; for a failed run, the stage that failed.
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<UpdateReport>,
}

impl UpdateOutcome {
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

/// A single update run over a stats API and a record store.
pub struct Pipeline<'a> {
    api: &'a dyn StatsApi,
    store: &'a RecordStore,
    settings: &'a PipelineSettings,
    stage: Stage,
}

impl<'a> Pipeline<'a> {
    pub fn new(api: &'a dyn StatsApi, store: &'a RecordStore, settings: &'a PipelineSettings) -> Self {
        Self {
            api,
            store,
            settings,
            stage: Stage::Idle,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub async fn run(&mut self, request: &UpdateRequest) -> UpdateOutcome {
        info!(season = %request.season, game_type = %request.game_type, "update started");

        match self.execute(request).await {
            Ok(report) => {
                self.enter(Stage::Done);
                info!(
                    teams = report.teams,
                    games = report.games,
                    inserted = report.records_inserted,
                    existing = report.records_existing,
                    "update finished"
                );
                UpdateOutcome {
                    status: Status::Ok,
                    stage: Stage::Done,
                    error: None,
                    report: Some(report),
                }
            }
            Err(err) => {
                let failed_at = self.stage;
                warn!(stage = ?failed_at, kind = err.kind(), error = %err, "update failed");
                self.stage = Stage::Failed;
                UpdateOutcome {
                    status: Status::Error,
                    stage: failed_at,
                    error: Some(ErrorInfo {
                        kind: err.kind().to_string(),
                        message: err.to_string(),
                    }),
                    report: None,
                }
            }
        }
    }

    async fn execute(&mut self, request: &UpdateRequest) -> Result<UpdateReport> {
        let api = self.api;
        let settings = self.settings;
        let mut report = UpdateReport::default();

        self.enter(Stage::FetchingTeams);
        let teams_doc = with_retry(settings, "teams", || api.teams()).await?;

        self.enter(Stage::FilteringTeams);
        let teams = filter_teams(parse_teams(&teams_doc)?, &settings.teams);
        report.teams = teams.len();
        info!(teams = teams.len(), "teams retained");

        self.enter(Stage::ExpandingSchedules);
        let mut games = GameSet::new();
        for team in &teams {
            let doc = with_retry(settings, "schedule", || {
                api.schedule(team.id, request.season, &request.game_type)
            })
            .await?;
            let added = games.extend(parse_schedule(&doc)?);
            info!(team = %team.name, new_games = added, "schedule expanded");
        }
        report.games = games.len();

        self.enter(Stage::ExtractingBoxscores);
        let fetches: Vec<_> = games
            .game_pks()
            .into_iter()
            .map(|game_pk| fetch_game(api, settings, request, game_pk))
            .collect();
        let mut per_game: Vec<(i64, Vec<PlayerGameRecord>)> = futures::stream::iter(fetches)
            .buffer_unordered(settings.concurrency)
            .try_collect()
            .await?;
        per_game.sort_by_key(|(game_pk, _)| *game_pk);
        let records: Vec<PlayerGameRecord> =
            per_game.into_iter().flat_map(|(_, recs)| recs).collect();
        report.records_found = records.len();

        self.enter(Stage::Persisting);
        self.store.init(false).await?;
        for rec in &records {
            if self.store.insert(rec).await? {
                report.records_inserted += 1;
            } else {
                report.records_existing += 1;
            }
        }

        Ok(report)
    }

    fn enter(&mut self, stage: Stage) {
        info!(from = ?self.stage, to = ?stage, "stage");
        self.stage = stage;
    }
}

async fn fetch_game(
    api: &dyn StatsApi,
    settings: &PipelineSettings,
    request: &UpdateRequest,
    game_pk: i64,
) -> Result<(i64, Vec<PlayerGameRecord>)> {
    let doc = with_retry(settings, "boxscore", || api.boxscore(game_pk)).await?;
    let ctx = ExtractContext {
        game_pk,
        season: request.season,
        game_type: &request.game_type,
        nationality: &settings.nationality,
        field: settings.nationality_field,
    };
    Ok((game_pk, extract_players(&doc, &ctx)?))
}

/// Run one update. Never fails; see [`UpdateOutcome`].
pub async fn update(
    api: &dyn StatsApi,
    store: &RecordStore,
    settings: &PipelineSettings,
    request: &UpdateRequest,
) -> UpdateOutcome {
    Pipeline::new(api, store, settings).run(request).await
}

/// Re-issue `op` after transport failures, up to `settings.max_retries`
/// extra attempts with doubling backoff. Other error kinds return at once.
async fn with_retry<T, F, Fut>(settings: &PipelineSettings, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Err(err) if err.is_transient() && attempt < settings.max_retries => {
                let delay = settings.retry_backoff * (1u32 << attempt.min(5));
                warn!(what, attempt = attempt + 1, ?delay, error = %err, "retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// CLI entry point: one update against the configured API and database.
pub async fn run_update(config: &Config, request: &UpdateRequest) -> anyhow::Result<()> {
    let api = HttpStatsClient::new(&config.api)?;
    let store = RecordStore::open(&config.db.path).await?;
    let settings = PipelineSettings::from_config(config);

    let outcome = update(&api, &store, &settings, request).await;
    store.close().await;

    println!("update season={} game_type={}", request.season, request.game_type);
    if let Some(ref report) = outcome.report {
        println!("  teams: {}", report.teams);
        println!("  games: {}", report.games);
        println!("  records found: {}", report.records_found);
        println!("  records inserted: {}", report.records_inserted);
        println!("  records already stored: {}", report.records_existing);
    }

    match outcome.error {
        None => {
            println!("ok");
            Ok(())
        }
        Some(err) => bail!(
            "update failed during {:?} ({}): {}",
            outcome.stage,
            err.kind,
            err.message
        ),
    }
}
