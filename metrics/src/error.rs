use thiserror::Error;

/// Message shown on the dashboard banner while the tracker throttles us.
pub const RATE_LIMIT_MESSAGE: &str = "API rate limit reached. Data will refresh when available.";

/// Failure reported by an [`IssueSource`](crate::source::IssueSource).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("{0:#}")]
    Other(eyre::Report),
}

impl SourceError {
    pub fn other(err: impl Into<eyre::Report>) -> Self {
        SourceError::Other(err.into())
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SourceError::RateLimited(_))
    }
}

impl From<linear_client::Error> for SourceError {
    fn from(err: linear_client::Error) -> Self {
        match err {
            linear_client::Error::RateLimited { message } => SourceError::RateLimited(message),
            other => SourceError::Other(eyre::Report::new(other)),
        }
    }
}

/// The tracker refused further requests for now. The only failure the dashboard surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RateLimitError {
    pub message: String,
    pub workspace: String,
    /// What the tracker said, kept for logs.
    pub detail: String,
}

impl RateLimitError {
    pub fn new(workspace: impl ToString, detail: impl ToString) -> Self {
        Self {
            message: RATE_LIMIT_MESSAGE.to_string(),
            workspace: workspace.to_string(),
            detail: detail.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no team found for workspace {workspace}")]
    NoTeamFound { workspace: String },
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
    #[error("unknown workspace {0}")]
    UnknownWorkspace(String),
    #[error("no API key configured for workspace {0}")]
    MissingCredential(String),
    #[error("fetching workspace {workspace} failed: {report:#}")]
    Source { workspace: String, report: eyre::Report },
}

impl FetchError {
    /// Translate an adapter failure, keeping throttling distinguishable from everything else.
    pub fn from_source(workspace: &str, err: SourceError) -> Self {
        match err {
            SourceError::RateLimited(detail) => FetchError::RateLimit(RateLimitError::new(workspace, detail)),
            SourceError::Other(report) => FetchError::Source {
                workspace: workspace.to_string(),
                report,
            },
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, FetchError::RateLimit(_))
    }

    pub fn as_rate_limit(&self) -> Option<&RateLimitError> {
        match self {
            FetchError::RateLimit(err) => Some(err),
            _ => None,
        }
    }
}
