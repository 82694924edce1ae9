use thiserror::Error;

/// Main error type for the leaderboard service
#[derive(Error, Debug)]
pub enum LeaderboardError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream fetch failed: {0}")]
    Upstream(#[from] FetchErrorKind),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for LeaderboardError
pub type Result<T> = std::result::Result<T, LeaderboardError>;

/// Why a single upstream fetch produced no data.
///
/// The fetch client keeps this internally for logging; its public methods
/// coerce every variant to an empty result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    #[error("missing upstream credentials (api key or partner code)")]
    MissingCredentials,

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited (retry-after: {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("upstream server error: HTTP {status}")]
    ServerError {
        status: u16,
        retry_after_ms: Option<u64>,
    },

    #[error("upstream rejected request: HTTP {status}")]
    ClientError { status: u16 },

    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl FetchErrorKind {
    /// 429 and 5xx are worth another attempt; everything else fails fast.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::ServerError { .. })
    }

    /// Server-provided delay hint, already converted to milliseconds.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_ms } | Self::ServerError { retry_after_ms, .. } => {
                *retry_after_ms
            }
            _ => None,
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, retry_after_ms: Option<u64>) -> Self {
        match status {
            429 => Self::RateLimited { retry_after_ms },
            500..=599 => Self::ServerError {
                status,
                retry_after_ms,
            },
            _ => Self::ClientError { status },
        }
    }
}

impl From<reqwest::Error> for FetchErrorKind {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchErrorKind::Timeout
        } else {
            FetchErrorKind::Network(err.to_string())
        }
    }
}
