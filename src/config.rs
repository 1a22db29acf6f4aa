use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://statsapi.web.nhl.com/api/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

/// Which `person` field carries a player's country code in a boxscore.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum NationalityField {
    #[default]
    #[serde(rename = "nationality")]
    Nationality,
    #[serde(rename = "birthCountry")]
    BirthCountry,
}

impl NationalityField {
    pub fn key(self) -> &'static str {
        match self {
            NationalityField::Nationality => "nationality",
            NationalityField::BirthCountry => "birthCountry",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    #[serde(default = "default_teams")]
    pub teams: Vec<String>,
    #[serde(default = "default_nationality")]
    pub nationality: String,
    #[serde(default)]
    pub nationality_field: NationalityField,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            teams: default_teams(),
            nationality: default_nationality(),
            nationality_field: NationalityField::default(),
        }
    }
}

fn default_teams() -> Vec<String> {
    [
        "Calgary Flames",
        "Edmonton Oilers",
        "Montreal Canadiens",
        "Ottawa Senators",
        "Toronto Maple Leafs",
        "Winnipeg Jets",
        "Vancouver Canucks",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_nationality() -> String {
    "SWE".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Maximum boxscore requests in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Extra attempts for a fetch that failed at the transport level.
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}
fn default_retry_backoff_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Drop and recreate the record table when the server starts.
    #[serde(default)]
    pub reset_on_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            reset_on_start: false,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

impl Config {
    /// All-default configuration backed by the given database file.
    pub fn for_db(path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig { path: path.into() },
            api: ApiConfig::default(),
            filter: FilterConfig::default(),
            pipeline: PipelineConfig::default(),
            server: ServerConfig::default(),
        }
    }

    pub fn validate(&self) -> std::result::Result<(), PipelineError> {
        let fail = |msg: &str| Err(PipelineError::Configuration(msg.to_string()));

        if self.db.path.as_os_str().is_empty() {
            return fail("db.path must not be empty");
        }
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            return fail("api.base_url must start with http:// or https://");
        }
        if self.api.timeout_secs == 0 {
            return fail("api.timeout_secs must be > 0");
        }
        if self.filter.teams.is_empty() {
            return fail("filter.teams must list at least one team");
        }
        if self.filter.nationality.trim().is_empty() {
            return fail("filter.nationality must not be empty");
        }
        if self.pipeline.concurrency == 0 {
            return fail("pipeline.concurrency must be >= 1");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PipelineError::Configuration(format!(
            "failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config = parse_config(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)
        .map_err(|e| PipelineError::Configuration(format!("failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}
