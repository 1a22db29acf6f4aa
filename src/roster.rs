//! Team roster lookup.
//!
//! Not part of the ingestion pipeline; backs the `rink roster` command.

use anyhow::Result;
use serde_json::Value;

use crate::client::{HttpStatsClient, StatsApi};
use crate::config::Config;
use crate::error::PipelineError;
use crate::models::Season;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub player_id: i64,
    pub full_name: String,
    pub jersey_number: Option<String>,
    pub position: Option<String>,
}

/// Decode `teams[0].roster.roster[]` from an expanded team document.
pub fn parse_roster(doc: &Value) -> crate::error::Result<Vec<RosterEntry>> {
    let entries = doc
        .pointer("/teams/0/roster/roster")
        .and_then(Value::as_array)
        .ok_or_else(|| PipelineError::malformed("roster: missing 'teams[0].roster.roster'"))?;

    entries
        .iter()
        .map(|e| {
            let person = e
                .get("person")
                .ok_or_else(|| PipelineError::malformed("roster entry without 'person'"))?;
            Ok(RosterEntry {
                player_id: person
                    .get("id")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| PipelineError::malformed("roster person without 'id'"))?,
                full_name: person
                    .get("fullName")
                    .and_then(Value::as_str)
                    .ok_or_else(|| PipelineError::malformed("roster person without 'fullName'"))?
                    .to_string(),
                jersey_number: e
                    .get("jerseyNumber")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                position: e
                    .pointer("/position/abbreviation")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect()
}

pub async fn run_roster(config: &Config, team_id: i64, season: Season) -> Result<()> {
    let api = HttpStatsClient::new(&config.api)?;
    let doc = api.team_roster(team_id, season).await?;
    let roster = parse_roster(&doc)?;

    println!("team {} season {}: {} players", team_id, season, roster.len());
    for entry in &roster {
        println!(
            "  {:>3} {:<3} {:<10} {}",
            entry.jersey_number.as_deref().unwrap_or("-"),
            entry.position.as_deref().unwrap_or("-"),
            entry.player_id,
            entry.full_name
        );
    }
    Ok(())
}
