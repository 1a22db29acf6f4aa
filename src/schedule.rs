//! Schedule expansion: team schedules → distinct game references.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{PipelineError, Result};
use crate::models::GameReference;

/// Decode a schedule document (`dates[].games[]`) into game references.
///
/// Games without a home team block are skipped.
pub fn parse_schedule(doc: &Value) -> Result<Vec<GameReference>> {
    let dates = doc
        .get("dates")
        .and_then(Value::as_array)
        .ok_or_else(|| PipelineError::malformed("schedule: missing 'dates' array"))?;

    let mut refs = Vec::new();
    for date in dates {
        let games = match date.get("games").and_then(Value::as_array) {
            Some(g) => g,
            None => continue,
        };
        for game in games {
            let game_pk = game
                .get("gamePk")
                .and_then(Value::as_i64)
                .ok_or_else(|| PipelineError::malformed("schedule: game without 'gamePk'"))?;

            let home = match game.pointer("/teams/home/team") {
                Some(h) if h.is_object() => h,
                _ => continue,
            };
            let name = home.get("name").and_then(Value::as_str).ok_or_else(|| {
                PipelineError::malformed(format!("schedule: game {} home team without 'name'", game_pk))
            })?;
            let link = home.get("link").and_then(Value::as_str).ok_or_else(|| {
                PipelineError::malformed(format!("schedule: game {} home team without 'link'", game_pk))
            })?;

            refs.push(GameReference {
                game_pk,
                home_team_name: name.to_string(),
                home_team_link: link.to_string(),
            });
        }
    }
    Ok(refs)
}

/// Game references from every schedule in a run, keyed by `game_pk`.
///
/// The first reference seen for a game is kept; iteration is in ascending
/// `game_pk` order.
#[derive(Debug, Default)]
pub struct GameSet {
    games: BTreeMap<i64, GameReference>,
}

impl GameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the game was not already present.
    pub fn insert(&mut self, game: GameReference) -> bool {
        use std::collections::btree_map::Entry;
        match self.games.entry(game.game_pk) {
            Entry::Vacant(slot) => {
                slot.insert(game);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn extend(&mut self, games: impl IntoIterator<Item = GameReference>) -> usize {
        games
            .into_iter()
            .map(|g| self.insert(g))
            .filter(|added| *added)
            .count()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn game_pks(&self) -> Vec<i64> {
        self.games.keys().copied().collect()
    }

    pub fn get(&self, game_pk: i64) -> Option<&GameReference> {
        self.games.get(&game_pk)
    }
}
