//! Core data models used throughout rink-ledger.
//!
//! [`Team`] and [`GameReference`] are transient values decoded from the stats
//! API during a run. [`PlayerGameRecord`] is the only persisted type.
//! [`Season`] and [`GameType`] are validated request parameters.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A franchise as listed by `GET /teams`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub link: String,
}

/// A game found in a team schedule, with the identity of its home side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameReference {
    pub game_pk: i64,
    pub home_team_name: String,
    pub home_team_link: String,
}

/// One player's line in one game. Unique on
/// `(game_pk, season, game_type, player_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerGameRecord {
    #[serde(rename = "gamePk")]
    pub game_pk: i64,
    #[serde(rename = "gameType")]
    pub game_type: String,
    pub season: i64,
    pub player_id: i64,
    pub full_name: String,
    pub time_on_ice: String,
    pub assists: i64,
    pub goals: i64,
    pub team_id: i64,
    pub team_name: String,
    pub team_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseSeasonError {
    #[error("season must be a 4-digit end year or an 8-digit code, got '{0}'")]
    Format(String),
    #[error("season {0} does not span two consecutive years")]
    NotConsecutive(i64),
}

/// An 8-digit season code: start year followed by end year, e.g. `20202021`.
///
/// A 4-digit value always names the *end* year of the season, so `2021`
/// becomes `20202021`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Season(i64);

impl Season {
    pub fn from_end_year(year: i64) -> Result<Self, ParseSeasonError> {
        if !(1001..=9999).contains(&year) {
            return Err(ParseSeasonError::Format(year.to_string()));
        }
        Ok(Season((year - 1) * 10_000 + year))
    }

    pub fn from_code(code: i64) -> Result<Self, ParseSeasonError> {
        if !(10_000_000..=99_999_999).contains(&code) {
            return Err(ParseSeasonError::Format(code.to_string()));
        }
        let (start, end) = (code / 10_000, code % 10_000);
        if end != start + 1 {
            return Err(ParseSeasonError::NotConsecutive(code));
        }
        Ok(Season(code))
    }

    /// The season ending in the current calendar year.
    pub fn current() -> Self {
        let year = i64::from(chrono::Local::now().year());
        Season((year - 1) * 10_000 + year)
    }

    pub fn code(self) -> i64 {
        self.0
    }

    pub fn start_year(self) -> i64 {
        self.0 / 10_000
    }

    pub fn end_year(self) -> i64 {
        self.0 % 10_000
    }
}

impl FromStr for Season {
    type Err = ParseSeasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseSeasonError::Format(s.to_string()));
        }
        let value: i64 = s
            .parse()
            .map_err(|_| ParseSeasonError::Format(s.to_string()))?;
        match s.len() {
            4 => Season::from_end_year(value),
            8 => Season::from_code(value),
            _ => Err(ParseSeasonError::Format(s.to_string())),
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("game type must be a single letter, got '{0}'")]
pub struct ParseGameTypeError(String);

/// Single-letter game category code (`R` regular season, `P` playoffs, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameType(String);

impl GameType {
    pub fn regular_season() -> Self {
        GameType("R".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GameType {
    fn default() -> Self {
        GameType::regular_season()
    }
}

impl FromStr for GameType {
    type Err = ParseGameTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                Ok(GameType(c.to_ascii_uppercase().to_string()))
            }
            _ => Err(ParseGameTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
