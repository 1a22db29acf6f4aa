use sqlx::SqlitePool;
use tracing::info;

use crate::error::Result;

pub const RECORDS_TABLE: &str = "player_game_stats";

/// Create the record table if needed; with `reset`, drop it first.
pub async fn run_migrations(pool: &SqlitePool, reset: bool) -> Result<()> {
    if reset {
        info!(table = RECORDS_TABLE, "dropping record table");
        sqlx::query("DROP TABLE IF EXISTS player_game_stats")
            .execute(pool)
            .await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS player_game_stats (
            game_pk INTEGER NOT NULL,
            game_type TEXT NOT NULL,
            season INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            full_name TEXT NOT NULL,
            time_on_ice TEXT NOT NULL,
            assists INTEGER NOT NULL,
            goals INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            team_name TEXT NOT NULL,
            team_link TEXT NOT NULL,
            UNIQUE(game_pk, season, game_type, player_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_player_game_stats_season ON player_game_stats(season, game_type)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
