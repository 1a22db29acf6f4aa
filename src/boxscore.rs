//! Boxscore extraction: one game → flattened per-player records.
//!
//! Both sides of the game are visited, home first. A player is kept when the
//! configured nationality field equals the target code and the player has a
//! `skaterStats` block; goalies and scratched players have none and are
//! skipped without error. Each record carries the team of the side the
//! player appeared for.

use serde_json::Value;

use crate::config::NationalityField;
use crate::error::{PipelineError, Result};
use crate::models::{GameType, PlayerGameRecord, Season};

const SIDES: [&str; 2] = ["home", "away"];

/// Per-game parameters for [`extract_players`].
#[derive(Debug, Clone)]
pub struct ExtractContext<'a> {
    pub game_pk: i64,
    pub season: Season,
    pub game_type: &'a GameType,
    pub nationality: &'a str,
    pub field: NationalityField,
}

struct SideTeam<'v> {
    id: i64,
    name: &'v str,
    link: &'v str,
}

pub fn extract_players(doc: &Value, ctx: &ExtractContext<'_>) -> Result<Vec<PlayerGameRecord>> {
    let mut records = Vec::new();

    for side in SIDES {
        let side_doc = doc
            .pointer(&format!("/teams/{}", side))
            .ok_or_else(|| malformed(ctx, format!("missing side '{}'", side)))?;
        let team = side_team(side_doc, ctx, side)?;
        let players = side_doc
            .get("players")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed(ctx, format!("{} side without 'players'", side)))?;

        let mut side_records = Vec::new();
        for (key, player) in players {
            if let Some(rec) = extract_player(player, &team, ctx, key)? {
                side_records.push(rec);
            }
        }
        side_records.sort_by_key(|r| r.player_id);
        records.extend(side_records);
    }

    Ok(records)
}

fn side_team<'v>(side_doc: &'v Value, ctx: &ExtractContext<'_>, side: &str) -> Result<SideTeam<'v>> {
    let team = side_doc
        .get("team")
        .ok_or_else(|| malformed(ctx, format!("{} side without 'team'", side)))?;
    let field = |name: &str| malformed(ctx, format!("{} team without '{}'", side, name));
    Ok(SideTeam {
        id: team.get("id").and_then(Value::as_i64).ok_or_else(|| field("id"))?,
        name: team.get("name").and_then(Value::as_str).ok_or_else(|| field("name"))?,
        link: team.get("link").and_then(Value::as_str).ok_or_else(|| field("link"))?,
    })
}

fn extract_player(
    player: &Value,
    team: &SideTeam<'_>,
    ctx: &ExtractContext<'_>,
    key: &str,
) -> Result<Option<PlayerGameRecord>> {
    let person = player
        .get("person")
        .ok_or_else(|| malformed(ctx, format!("player {} without 'person'", key)))?;

    let code = person.get(ctx.field.key()).and_then(Value::as_str);
    if code != Some(ctx.nationality) {
        return Ok(None);
    }

    let skater = match player.pointer("/stats/skaterStats") {
        Some(s) if s.is_object() => s,
        _ => return Ok(None),
    };

    let field = |name: &str| malformed(ctx, format!("player {} without '{}'", key, name));
    Ok(Some(PlayerGameRecord {
        game_pk: ctx.game_pk,
        game_type: ctx.game_type.as_str().to_string(),
        season: ctx.season.code(),
        player_id: person.get("id").and_then(Value::as_i64).ok_or_else(|| field("id"))?,
        full_name: person
            .get("fullName")
            .and_then(Value::as_str)
            .ok_or_else(|| field("fullName"))?
            .to_string(),
        time_on_ice: skater
            .get("timeOnIce")
            .and_then(Value::as_str)
            .ok_or_else(|| field("timeOnIce"))?
            .to_string(),
        assists: skater
            .get("assists")
            .and_then(Value::as_i64)
            .ok_or_else(|| field("assists"))?,
        goals: skater
            .get("goals")
            .and_then(Value::as_i64)
            .ok_or_else(|| field("goals"))?,
        team_id: team.id,
        team_name: team.name.to_string(),
        team_link: team.link.to_string(),
    }))
}

fn malformed(ctx: &ExtractContext<'_>, what: String) -> PipelineError {
    PipelineError::malformed(format!("boxscore {}: {}", ctx.game_pk, what))
}
