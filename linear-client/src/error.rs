/// Error code the GraphQL API attaches to throttled requests.
pub const RATE_LIMITED_CODE: &str = "RATELIMITED";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("rate limit exceeded: {message}")]
    RateLimited { message: String },
    #[error("request to the issue tracker failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("issue tracker returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("issue tracker reported errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),
    #[error("failed to decode issue tracker response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("issue tracker response contained no data")]
    EmptyResponse,
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
}

impl Error {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
