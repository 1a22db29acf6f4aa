//! Shared fixtures: a small NHL-shaped dataset, an in-memory [`StatsApi`],
//! and an axum server that serves the same dataset over HTTP.
//!
//! Dataset:
//!
//! | gamePk | home | away | Swedish skaters |
//! |--------|------|------|-----------------|
//! | 2020020001 | Calgary | Edmonton | Backlund (CGY), Larsson (EDM) |
//! | 2020020002 | Boston | Calgary | Backlund (CGY) |
//! | 2020020003 | Edmonton | Boston | Larsson (EDM) |
//!
//! Calgary's and Edmonton's schedules both list 2020020001.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::{Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rink_ledger::client::{Resource, StatsApi};
use rink_ledger::error::{PipelineError, Result};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub const CALGARY: i64 = 20;
pub const EDMONTON: i64 = 22;
pub const BOSTON: i64 = 6;

pub const BACKLUND: i64 = 8474150;
pub const LARSSON: i64 = 8476457;

pub const GAME_1: i64 = 2020020001;
pub const GAME_2: i64 = 2020020002;
pub const GAME_3: i64 = 2020020003;

/// Served with `content-type: text/html` by the HTTP upstream.
pub const HTML_GAME: i64 = 2020029999;

pub fn team_json(id: i64) -> Value {
    let name = match id {
        CALGARY => "Calgary Flames",
        EDMONTON => "Edmonton Oilers",
        BOSTON => "Boston Bruins",
        _ => "Unknown",
    };
    json!({"id": id, "name": name, "link": format!("/api/v1/teams/{}", id)})
}

pub fn teams_doc() -> Value {
    json!({
        "copyright": "NHL and the NHL Shield are registered trademarks of the National Hockey League.",
        "teams": [team_json(BOSTON), team_json(CALGARY), team_json(EDMONTON)]
    })
}

fn scheduled_game(game_pk: i64, home: i64, away: i64) -> Value {
    json!({
        "gamePk": game_pk,
        "link": format!("/api/v1/game/{}/feed/live", game_pk),
        "gameType": "R",
        "teams": {
            "away": {"score": 0, "team": team_json(away)},
            "home": {"score": 0, "team": team_json(home)}
        }
    })
}

pub fn schedule_doc(team_id: i64) -> Option<Value> {
    let dates = match team_id {
        CALGARY => json!([
            {"date": "2021-01-13", "games": [scheduled_game(GAME_1, CALGARY, EDMONTON)]},
            {"date": "2021-01-15", "games": [scheduled_game(GAME_2, BOSTON, CALGARY)]}
        ]),
        EDMONTON => json!([
            {"date": "2021-01-13", "games": [scheduled_game(GAME_1, CALGARY, EDMONTON)]},
            {"date": "2021-01-16", "games": [scheduled_game(GAME_3, EDMONTON, BOSTON)]}
        ]),
        BOSTON => json!([
            {"date": "2021-01-15", "games": [scheduled_game(GAME_2, BOSTON, CALGARY)]},
            {"date": "2021-01-16", "games": [scheduled_game(GAME_3, EDMONTON, BOSTON)]}
        ]),
        _ => return None,
    };
    Some(json!({"totalGames": 2, "dates": dates}))
}

fn skater(id: i64, name: &str, nationality: &str, toi: &str, goals: i64, assists: i64) -> Value {
    json!({
        "person": {"id": id, "fullName": name, "nationality": nationality, "birthCountry": nationality},
        "jerseyNumber": "11",
        "position": {"code": "C", "abbreviation": "C"},
        "stats": {"skaterStats": {"timeOnIce": toi, "assists": assists, "goals": goals, "shots": 3}}
    })
}

fn goalie(id: i64, name: &str, nationality: &str) -> Value {
    json!({
        "person": {"id": id, "fullName": name, "nationality": nationality},
        "position": {"code": "G", "abbreviation": "G"},
        "stats": {"goalieStats": {"timeOnIce": "60:00", "saves": 28}}
    })
}

fn side(team_id: i64, players: Value) -> Value {
    json!({"team": team_json(team_id), "players": players})
}

pub fn boxscore_doc(game_pk: i64) -> Option<Value> {
    let teams = match game_pk {
        GAME_1 => json!({
            "home": side(CALGARY, json!({
                "ID8474150": skater(BACKLUND, "Mikael Backlund", "SWE", "18:40", 1, 1),
                "ID8475000": skater(8475000, "Canadian Centre", "CAN", "16:02", 0, 2)
            })),
            "away": side(EDMONTON, json!({
                "ID8476457": skater(LARSSON, "Adam Larsson", "SWE", "21:15", 0, 0),
                "ID8477000": goalie(8477000, "Swedish Goalie", "SWE")
            }))
        }),
        GAME_2 => json!({
            "home": side(BOSTON, json!({
                "ID8476000": skater(8476000, "Bruin Skater", "USA", "14:00", 1, 0)
            })),
            "away": side(CALGARY, json!({
                "ID8474150": skater(BACKLUND, "Mikael Backlund", "SWE", "17:05", 0, 1)
            }))
        }),
        GAME_3 => json!({
            "home": side(EDMONTON, json!({
                "ID8476457": skater(LARSSON, "Adam Larsson", "SWE", "22:30", 1, 0)
            })),
            "away": side(BOSTON, json!({
                "ID8478000": skater(8478000, "Finnish Forward", "FIN", "12:12", 0, 0)
            }))
        }),
        _ => return None,
    };
    Some(json!({"copyright": "NHL", "teams": teams}))
}

// ─── In-memory StatsApi ─────────────────────────────────────────────

/// Serves the fixture dataset without a network, recording every request.
#[derive(Default)]
pub struct FakeApi {
    pub calls: Mutex<Vec<Resource>>,
    pub failing_schedules: HashSet<i64>,
    pub missing_boxscores: HashSet<i64>,
    pub teams_override: Option<Value>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_schedule(mut self, team_id: i64) -> Self {
        self.failing_schedules.insert(team_id);
        self
    }

    pub fn drop_boxscore(mut self, game_pk: i64) -> Self {
        self.missing_boxscores.insert(game_pk);
        self
    }

    pub fn with_teams(mut self, doc: Value) -> Self {
        self.teams_override = Some(doc);
        self
    }

    pub fn boxscore_calls(&self) -> HashMap<i64, usize> {
        let mut counts = HashMap::new();
        for call in self.calls.lock().unwrap().iter() {
            if let Resource::GameBoxscore { game_pk } = call {
                *counts.entry(*game_pk).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl StatsApi for FakeApi {
    async fn fetch(&self, resource: &Resource) -> Result<Value> {
        self.calls.lock().unwrap().push(resource.clone());
        let not_found = || PipelineError::UnexpectedContent(format!("{:?}: status 404", resource));
        match resource {
            Resource::Teams => Ok(self.teams_override.clone().unwrap_or_else(teams_doc)),
            Resource::TeamSchedule { team_id, .. } => {
                if self.failing_schedules.contains(team_id) {
                    return Err(PipelineError::Network(format!(
                        "schedule for team {}: connection reset",
                        team_id
                    )));
                }
                schedule_doc(*team_id).ok_or_else(not_found)
            }
            Resource::GameBoxscore { game_pk } => {
                if self.missing_boxscores.contains(game_pk) {
                    return Err(not_found());
                }
                boxscore_doc(*game_pk).ok_or_else(not_found)
            }
            Resource::TeamRoster { .. } => Err(not_found()),
        }
    }
}

// ─── HTTP upstream ──────────────────────────────────────────────────

/// Start an axum server serving the dataset; returns its API base URL.
pub async fn spawn_upstream() -> String {
    let app = Router::new()
        .route("/api/v1/teams", get(|| async { Json(teams_doc()) }))
        .route("/api/v1/schedule", get(upstream_schedule))
        .route("/api/v1/game/{game_pk}/boxscore", get(upstream_boxscore));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}/api/v1", addr)
}

async fn upstream_schedule(Query(params): Query<HashMap<String, String>>) -> Response {
    let team_id: i64 = params
        .get("teamId")
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();
    match schedule_doc(team_id) {
        Some(doc) => Json(doc).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn upstream_boxscore(Path(game_pk): Path<i64>) -> Response {
    if game_pk == HTML_GAME {
        return (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            "<html><body>Down for maintenance</body></html>",
        )
            .into_response();
    }
    match boxscore_doc(game_pk) {
        Some(doc) => Json(doc).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}
