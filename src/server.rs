//! HTTP server exposing `Update` and `Query`.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/nhl/v1/update?season=&gametype=` | Run one ingestion pass |
//! | `GET`  | `/nhl/v1/get?season=&gametype=` | Stored records for a season |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! `season` is either the end year of a season (`2021`) or the full 8-digit
//! code (`20202021`) and defaults to the season ending this calendar year.
//! `gametype` defaults to `R`.
//!
//! Both data endpoints wrap their payload in the same envelope:
//!
//! ```json
//! { "api_version": 1, "method": "get", "result": { "players": [] } }
//! ```
//!
//! An update that fails still answers `200`; the outcome is carried by
//! `result.status` (`"ok"` or `"error"`) together with the failing stage and
//! error kind.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `store_unavailable` (500).

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::client::{HttpStatsClient, StatsApi};
use crate::config::Config;
use crate::error::PipelineError;
use crate::ingest::{self, PipelineSettings, UpdateRequest};
use crate::models::{GameType, Season};
use crate::query::query_records;
use crate::store::RecordStore;

pub const API_VERSION: u32 = 1;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    store: Arc<RecordStore>,
    api: Arc<dyn StatsApi>,
    settings: Arc<PipelineSettings>,
    /// Held for the length of an update run; queries never take it.
    update_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: Arc<RecordStore>, api: Arc<dyn StatsApi>, settings: PipelineSettings) -> Self {
        Self {
            store,
            api,
            settings: Arc::new(settings),
            update_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/nhl/v1/update", get(handle_update))
        .route("/nhl/v1/get", get(handle_get))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server against the configured stats API.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let api = HttpStatsClient::new(&config.api)?;
    run_server_with_api(config, Arc::new(api)).await
}

/// Like [`run_server`], but with a caller-supplied [`StatsApi`].
pub async fn run_server_with_api(config: &Config, api: Arc<dyn StatsApi>) -> anyhow::Result<()> {
    let store = RecordStore::open(&config.db.path).await?;
    store.init(config.server.reset_on_start).await?;

    let state = AppState::new(
        Arc::new(store),
        api,
        PipelineSettings::from_config(config),
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "server listening");
    println!("rink server listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ Request parameters ============

#[derive(Debug, Deserialize)]
struct SeasonParams {
    season: Option<String>,
    gametype: Option<String>,
}

impl SeasonParams {
    fn parse(&self) -> Result<UpdateRequest, AppError> {
        let season = match self.season.as_deref() {
            Some(s) => s.parse::<Season>().map_err(|e| bad_request(e.to_string()))?,
            None => Season::current(),
        };
        let game_type = match self.gametype.as_deref() {
            Some(g) => g.parse::<GameType>().map_err(|e| bad_request(e.to_string()))?,
            None => GameType::default(),
        };
        Ok(UpdateRequest::new(season, game_type))
    }
}

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    api_version: u32,
    method: &'static str,
    result: T,
}

// ============ GET /nhl/v1/update ============

async fn handle_update(
    State(state): State<AppState>,
    Query(params): Query<SeasonParams>,
) -> Result<Json<Envelope<ingest::UpdateOutcome>>, AppError> {
    let request = params.parse()?;

    let _guard = state.update_lock.lock().await;
    let outcome = ingest::update(
        state.api.as_ref(),
        state.store.as_ref(),
        state.settings.as_ref(),
        &request,
    )
    .await;

    Ok(Json(Envelope {
        api_version: API_VERSION,
        method: "update",
        result: outcome,
    }))
}

// ============ GET /nhl/v1/get ============

#[derive(Serialize)]
struct PlayersResult {
    players: Vec<crate::models::PlayerGameRecord>,
}

async fn handle_get(
    State(state): State<AppState>,
    Query(params): Query<SeasonParams>,
) -> Result<Json<Envelope<PlayersResult>>, AppError> {
    let request = params.parse()?;
    let players = query_records(&state.store, request.season, &request.game_type).await?;

    Ok(Json(Envelope {
        api_version: API_VERSION,
        method: "get",
        result: PlayersResult { players },
    }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
