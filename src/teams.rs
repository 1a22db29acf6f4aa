//! Team list decoding and allow-list filtering.

use serde_json::Value;

use crate::client::{HttpStatsClient, StatsApi};
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::models::Team;

/// Decode the `{"teams": [...]}` document returned by `GET /teams`.
pub fn parse_teams(doc: &Value) -> Result<Vec<Team>> {
    let teams = doc
        .get("teams")
        .and_then(Value::as_array)
        .ok_or_else(|| PipelineError::malformed("team list: missing 'teams' array"))?;

    teams
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let id = t
                .get("id")
                .and_then(Value::as_i64)
                .ok_or_else(|| PipelineError::malformed(format!("team #{}: missing 'id'", i)))?;
            let name = t
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| PipelineError::malformed(format!("team {}: missing 'name'", id)))?;
            let link = t
                .get("link")
                .and_then(Value::as_str)
                .ok_or_else(|| PipelineError::malformed(format!("team {}: missing 'link'", id)))?;
            Ok(Team {
                id,
                name: name.to_string(),
                link: link.to_string(),
            })
        })
        .collect()
}

/// Keep the teams whose name equals an allow-listed name, ignoring case.
///
/// Output order follows `teams`. Partial names never match.
pub fn filter_teams(teams: Vec<Team>, allow: &[String]) -> Vec<Team> {
    let allow: Vec<String> = allow.iter().map(|n| n.trim().to_lowercase()).collect();
    teams
        .into_iter()
        .filter(|t| allow.contains(&t.name.to_lowercase()))
        .collect()
}

/// CLI entry point: prints the allow-listed teams the API currently lists.
pub async fn run_teams(config: &Config) -> anyhow::Result<()> {
    let api = HttpStatsClient::new(&config.api)?;
    let all = parse_teams(&api.teams().await?)?;
    let total = all.len();
    let kept = filter_teams(all, &config.filter.teams);

    println!("{:<6} {:<26} LINK", "ID", "NAME");
    for team in &kept {
        println!("{:<6} {:<26} {}", team.id, team.name, team.link);
    }
    println!("{} of {} teams match the allow-list", kept.len(), total);

    let missing: Vec<&String> = config
        .filter
        .teams
        .iter()
        .filter(|name| {
            let wanted = name.trim().to_lowercase();
            !kept.iter().any(|t| t.name.to_lowercase() == wanted)
        })
        .collect();
    for name in missing {
        eprintln!("Warning: allow-listed team not found upstream: {}", name);
    }

    Ok(())
}
