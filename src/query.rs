//! Record retrieval by season and game type.
//!
//! Used by both the `rink query` CLI command and `GET /nhl/v1/get`.

use anyhow::Result;

use crate::config::Config;
use crate::models::{GameType, PlayerGameRecord, Season};
use crate::store::RecordStore;

/// Core query returning structured rows (used by CLI and server).
///
/// An empty result is not an error.
pub async fn query_records(
    store: &RecordStore,
    season: Season,
    game_type: &GameType,
) -> crate::error::Result<Vec<PlayerGameRecord>> {
    store.query(season, game_type).await
}

/// CLI entry point: runs the query and prints a table or JSON.
pub async fn run_query(config: &Config, season: Season, game_type: &GameType, json: bool) -> Result<()> {
    let store = RecordStore::open(&config.db.path).await?;
    store.init(false).await?;
    let records = query_records(&store, season, game_type).await?;
    store.close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("season {} ({}): {} records", season, game_type, records.len());
    if records.is_empty() {
        return Ok(());
    }
    println!(
        "{:<12} {:<10} {:<26} {:<22} {:>6} {:>2} {:>2}",
        "GAME", "PLAYER", "NAME", "TEAM", "TOI", "G", "A"
    );
    for r in &records {
        println!(
            "{:<12} {:<10} {:<26} {:<22} {:>6} {:>2} {:>2}",
            r.game_pk, r.player_id, r.full_name, r.team_name, r.time_on_ice, r.goals, r.assists
        );
    }

    Ok(())
}
