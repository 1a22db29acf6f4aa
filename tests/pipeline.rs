//! Pipeline tests against the in-memory stats API.
//!
//! Each test runs real update passes into a temporary SQLite store and
//! checks what was fetched and what ended up in the table.

mod common;

use common::*;
use rink_ledger::config::Config;
use rink_ledger::ingest::{update, PipelineSettings, Stage, Status, UpdateRequest};
use rink_ledger::models::{GameType, Season};
use rink_ledger::store::RecordStore;
use serde_json::json;
use tempfile::TempDir;

fn settings(teams: &[&str]) -> PipelineSettings {
    let mut s = PipelineSettings::from_config(&Config::for_db("unused.sqlite"));
    s.teams = teams.iter().map(|t| t.to_string()).collect();
    s
}

fn canadian() -> PipelineSettings {
    settings(&["Calgary Flames", "Edmonton Oilers"])
}

fn request(code: i64) -> UpdateRequest {
    UpdateRequest::new(Season::from_code(code).unwrap(), GameType::regular_season())
}

async fn open_store(tmp: &TempDir) -> RecordStore {
    RecordStore::open(&tmp.path().join("rink.sqlite"))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_update_ingests_expected_records() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let api = FakeApi::new();

    let outcome = update(&api, &store, &canadian(), &request(20202021)).await;
    assert_eq!(outcome.status, Status::Ok, "outcome: {:?}", outcome);
    assert_eq!(outcome.stage, Stage::Done);

    let report = outcome.report.unwrap();
    assert_eq!(report.teams, 2);
    assert_eq!(report.games, 3);
    assert_eq!(report.records_found, 4);
    assert_eq!(report.records_inserted, 4);
    assert_eq!(report.records_existing, 0);

    let rows = store
        .query(Season::from_code(20202021).unwrap(), &GameType::regular_season())
        .await
        .unwrap();
    let keys: Vec<(i64, i64, &str)> = rows
        .iter()
        .map(|r| (r.game_pk, r.player_id, r.team_name.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (GAME_1, BACKLUND, "Calgary Flames"),
            (GAME_1, LARSSON, "Edmonton Oilers"),
            (GAME_2, BACKLUND, "Calgary Flames"),
            (GAME_3, LARSSON, "Edmonton Oilers"),
        ]
    );
    assert!(rows.iter().all(|r| r.season == 20202021 && r.game_type == "R"));
}

#[tokio::test]
async fn test_update_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let api = FakeApi::new();
    let season = Season::from_code(20202021).unwrap();

    let first = update(&api, &store, &canadian(), &request(20202021)).await;
    assert!(first.is_ok());
    let after_first = store.query(season, &GameType::regular_season()).await.unwrap();

    let second = update(&api, &store, &canadian(), &request(20202021)).await;
    assert!(second.is_ok(), "second run must not fail: {:?}", second);
    let report = second.report.unwrap();
    assert_eq!(report.records_inserted, 0);
    assert_eq!(report.records_existing, 4);

    let after_second = store.query(season, &GameType::regular_season()).await.unwrap();
    assert_eq!(after_first, after_second);
    assert_eq!(store.count().await.unwrap(), 4);
}

#[tokio::test]
async fn test_shared_game_boxscore_fetched_once() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let api = FakeApi::new();

    let outcome = update(&api, &store, &canadian(), &request(20202021)).await;
    assert!(outcome.is_ok());

    let calls = api.boxscore_calls();
    assert_eq!(calls.get(&GAME_1), Some(&1), "calls: {:?}", calls);
    assert_eq!(calls.get(&GAME_2), Some(&1));
    assert_eq!(calls.get(&GAME_3), Some(&1));
    assert_eq!(calls.len(), 3);
}

#[tokio::test]
async fn test_schedule_failure_fails_fast() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    // A prior successful run for another season.
    let ok = update(&FakeApi::new(), &store, &canadian(), &request(20192020)).await;
    assert!(ok.is_ok());
    assert_eq!(store.count().await.unwrap(), 4);

    let api = FakeApi::new().fail_schedule(EDMONTON);
    let outcome = update(&api, &store, &canadian(), &request(20202021)).await;

    assert_eq!(outcome.status, Status::Error);
    assert_eq!(outcome.stage, Stage::ExpandingSchedules);
    assert_eq!(outcome.error.as_ref().unwrap().kind, "network");
    assert!(outcome.report.is_none());
    assert!(api.boxscore_calls().is_empty());

    assert_eq!(store.count().await.unwrap(), 4);
    let new_rows = store
        .query(Season::from_code(20202021).unwrap(), &GameType::regular_season())
        .await
        .unwrap();
    assert!(new_rows.is_empty());
}

#[tokio::test]
async fn test_boxscore_failure_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let api = FakeApi::new().drop_boxscore(GAME_3);

    let outcome = update(&api, &store, &canadian(), &request(20202021)).await;
    assert_eq!(outcome.status, Status::Error);
    assert_eq!(outcome.stage, Stage::ExtractingBoxscores);
    assert_eq!(outcome.error.unwrap().kind, "unexpected_content");

    store.init(false).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_query_scoped_to_season() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let api = FakeApi::new();

    assert!(update(&api, &store, &canadian(), &request(20202021)).await.is_ok());
    assert!(update(&api, &store, &canadian(), &request(20192020)).await.is_ok());

    let current = store
        .query(Season::from_code(20202021).unwrap(), &GameType::regular_season())
        .await
        .unwrap();
    assert_eq!(current.len(), 4);
    assert!(current.iter().all(|r| r.season == 20202021));

    let playoffs = store
        .query(Season::from_code(20202021).unwrap(), &"P".parse().unwrap())
        .await
        .unwrap();
    assert!(playoffs.is_empty());
}

#[tokio::test]
async fn test_single_team_allow_list() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let api = FakeApi::new();

    let outcome = update(&api, &store, &settings(&["CALGARY FLAMES"]), &request(20202021)).await;
    let report = outcome.report.unwrap();
    assert_eq!(report.teams, 1);
    assert_eq!(report.games, 2);
    // Larsson plays for the away side in game 1 and is still kept.
    assert_eq!(report.records_found, 3);
}

#[tokio::test]
async fn test_no_matching_teams_is_ok_and_empty() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let api = FakeApi::new();

    let outcome = update(&api, &store, &settings(&["Seattle Kraken"]), &request(20202021)).await;
    assert!(outcome.is_ok());
    let report = outcome.report.unwrap();
    assert_eq!(report.teams, 0);
    assert_eq!(report.games, 0);
    assert_eq!(report.records_inserted, 0);
    assert_eq!(api.call_count(), 1);
}

#[tokio::test]
async fn test_other_nationality_target() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let api = FakeApi::new();

    let mut s = canadian();
    s.nationality = "FIN".to_string();
    let outcome = update(&api, &store, &s, &request(20202021)).await;
    let report = outcome.report.unwrap();
    assert_eq!(report.records_inserted, 1);

    let rows = store
        .query(Season::from_code(20202021).unwrap(), &GameType::regular_season())
        .await
        .unwrap();
    assert_eq!(rows[0].full_name, "Finnish Forward");
    assert_eq!(rows[0].team_name, "Boston Bruins");
}

#[tokio::test]
async fn test_malformed_team_list() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let api = FakeApi::new().with_teams(json!({"teams": [{"id": 20, "link": "/api/v1/teams/20"}]}));

    let outcome = update(&api, &store, &canadian(), &request(20202021)).await;
    assert_eq!(outcome.status, Status::Error);
    assert_eq!(outcome.stage, Stage::FilteringTeams);
    assert_eq!(outcome.error.unwrap().kind, "malformed_response");
}

#[tokio::test]
async fn test_serial_and_parallel_runs_agree() {
    let tmp = TempDir::new().unwrap();
    let serial_store = RecordStore::open(&tmp.path().join("serial.sqlite")).await.unwrap();
    let parallel_store = RecordStore::open(&tmp.path().join("parallel.sqlite")).await.unwrap();
    let api = FakeApi::new();

    let mut serial = canadian();
    serial.concurrency = 1;
    let mut parallel = canadian();
    parallel.concurrency = 8;

    assert!(update(&api, &serial_store, &serial, &request(20202021)).await.is_ok());
    assert!(update(&api, &parallel_store, &parallel, &request(20202021)).await.is_ok());

    let season = Season::from_code(20202021).unwrap();
    assert_eq!(
        serial_store.query(season, &GameType::regular_season()).await.unwrap(),
        parallel_store.query(season, &GameType::regular_season()).await.unwrap()
    );
}
