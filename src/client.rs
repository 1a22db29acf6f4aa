//! Remote stats API client.
//!
//! [`Resource`] describes the four upstream resources and builds their URLs.
//! [`StatsApi`] is the seam the pipeline depends on; [`HttpStatsClient`] is
//! its reqwest-backed implementation.
//!
//! # Endpoints
//!
//! | Resource | URL |
//! |----------|-----|
//! | team list | `{base}/teams` |
//! | team schedule | `{base}/schedule?teamId={id}&season={season}&gameType={code}` |
//! | game boxscore | `{base}/game/{gamePk}/boxscore` |
//! | team roster | `{base}/teams/{id}?expand=team.roster&season={season}` |
//!
//! A response counts as usable only if the status is 2xx and the
//! `content-type` header names `application/json`. The client never retries;
//! retry policy belongs to the orchestrator.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{PipelineError, Result};
use crate::models::{GameType, Season};

/// An upstream resource descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Teams,
    TeamSchedule {
        team_id: i64,
        season: Season,
        game_type: GameType,
    },
    GameBoxscore {
        game_pk: i64,
    },
    TeamRoster {
        team_id: i64,
        season: Season,
    },
}

impl Resource {
    pub fn url(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        match self {
            Resource::Teams => format!("{}/teams", base),
            Resource::TeamSchedule {
                team_id,
                season,
                game_type,
            } => format!(
                "{}/schedule?teamId={}&season={}&gameType={}",
                base, team_id, season, game_type
            ),
            Resource::GameBoxscore { game_pk } => format!("{}/game/{}/boxscore", base, game_pk),
            Resource::TeamRoster { team_id, season } => format!(
                "{}/teams/{}?expand=team.roster&season={}",
                base, team_id, season
            ),
        }
    }
}

/// Access to the stats API, one method per resource kind.
///
/// Each call returns the decoded JSON document or fails with
/// [`PipelineError::Network`] / [`PipelineError::UnexpectedContent`].
#[async_trait]
pub trait StatsApi: Send + Sync {
    async fn fetch(&self, resource: &Resource) -> Result<Value>;

    async fn teams(&self) -> Result<Value> {
        self.fetch(&Resource::Teams).await
    }

    async fn schedule(&self, team_id: i64, season: Season, game_type: &GameType) -> Result<Value> {
        self.fetch(&Resource::TeamSchedule {
            team_id,
            season,
            game_type: game_type.clone(),
        })
        .await
    }

    async fn boxscore(&self, game_pk: i64) -> Result<Value> {
        self.fetch(&Resource::GameBoxscore { game_pk }).await
    }

    async fn team_roster(&self, team_id: i64, season: Season) -> Result<Value> {
        self.fetch(&Resource::TeamRoster { team_id, season }).await
    }
}

/// [`StatsApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStatsClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStatsClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("rink-ledger/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipelineError::Configuration(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl StatsApi for HttpStatsClient {
    async fn fetch(&self, resource: &Resource) -> Result<Value> {
        let url = resource.url(&self.base_url);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PipelineError::Network(format!("GET {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::UnexpectedContent(format!(
                "GET {}: status {}",
                url, status
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_json_content_type(&content_type) {
            return Err(PipelineError::UnexpectedContent(format!(
                "GET {}: content-type '{}' is not JSON",
                url, content_type
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Network(format!("GET {}: {}", url, e)))?;

        serde_json::from_slice(&body)
            .map_err(|e| PipelineError::UnexpectedContent(format!("GET {}: invalid JSON: {}", url, e)))
    }
}

fn is_json_content_type(value: &str) -> bool {
    value.to_ascii_lowercase().contains("application/json")
}
