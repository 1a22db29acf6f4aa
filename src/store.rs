//! Durable store for [`PlayerGameRecord`]s.
//!
//! A [`RecordStore`] is opened explicitly from a database path and handed to
//! whoever needs it: the orchestrator borrows it for a run, the HTTP server
//! holds it in an `Arc`. The underlying pool serves concurrent readers and
//! independent inserts; uniqueness of the natural key
//! `(game_pk, season, game_type, player_id)` is enforced by the table itself.

use sqlx::{Row, SqlitePool};
use std::path::Path;

use crate::db;
use crate::error::Result;
use crate::migrate;
use crate::models::{GameType, PlayerGameRecord, Season};

#[derive(Debug, Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// Open (creating if missing) the SQLite database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = db::connect(path).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ensure the record table exists. With `reset`, all rows are dropped.
    pub async fn init(&self, reset: bool) -> Result<()> {
        migrate::run_migrations(&self.pool, reset).await
    }

    /// Insert a record unless its natural key is already stored.
    ///
    /// Returns `true` when a row was written. An existing row is left as-is.
    pub async fn insert(&self, rec: &PlayerGameRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO player_game_stats (game_pk, game_type, season, player_id, full_name, time_on_ice, assists, goals, team_id, team_name, team_link)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(game_pk, season, game_type, player_id) DO NOTHING
            "#,
        )
        .bind(rec.game_pk)
        .bind(&rec.game_type)
        .bind(rec.season)
        .bind(rec.player_id)
        .bind(&rec.full_name)
        .bind(&rec.time_on_ice)
        .bind(rec.assists)
        .bind(rec.goals)
        .bind(rec.team_id)
        .bind(&rec.team_name)
        .bind(&rec.team_link)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All records for a season and game type, in insertion order.
    pub async fn query(&self, season: Season, game_type: &GameType) -> Result<Vec<PlayerGameRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT game_pk, game_type, season, player_id, full_name, time_on_ice, assists, goals, team_id, team_name, team_link
            FROM player_game_stats
            WHERE season = ? AND game_type = ?
            ORDER BY rowid ASC
            "#,
        )
        .bind(season.code())
        .bind(game_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| PlayerGameRecord {
                game_pk: row.get("game_pk"),
                game_type: row.get("game_type"),
                season: row.get("season"),
                player_id: row.get("player_id"),
                full_name: row.get("full_name"),
                time_on_ice: row.get("time_on_ice"),
                assists: row.get("assists"),
                goals: row.get("goals"),
                team_id: row.get("team_id"),
                team_name: row.get("team_name"),
                team_link: row.get("team_link"),
            })
            .collect())
    }

    /// Total number of stored records across all seasons.
    pub async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM player_game_stats")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
