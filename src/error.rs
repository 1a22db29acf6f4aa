//! Error kinds surfaced by the ingestion pipeline.
//!
//! Every failure inside a run is one of the [`PipelineError`] variants. The
//! orchestrator turns them into a structured [`UpdateOutcome`] instead of
//! propagating them, and the HTTP server reports [`PipelineError::kind`] as a
//! stable machine-readable code.
//!
//! [`UpdateOutcome`]: crate::ingest::UpdateOutcome

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Transport failure or timeout talking to the stats API.
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx status, non-JSON content type, or an unparseable JSON body.
    #[error("unexpected content: {0}")]
    UnexpectedContent(String),

    /// JSON was returned but an expected field is missing or has the wrong type.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The SQLite store could not be reached or rejected a statement.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Missing or invalid startup parameters.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl PipelineError {
    /// Stable snake_case code for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Network(_) => "network",
            PipelineError::UnexpectedContent(_) => "unexpected_content",
            PipelineError::MalformedResponse(_) => "malformed_response",
            PipelineError::StoreUnavailable(_) => "store_unavailable",
            PipelineError::Configuration(_) => "configuration",
        }
    }

    /// Whether re-issuing the same request could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineError::Network(_))
    }

    pub(crate) fn malformed(what: impl Into<String>) -> Self {
        PipelineError::MalformedResponse(what.into())
    }
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        PipelineError::StoreUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Network(err.to_string())
    }
}
