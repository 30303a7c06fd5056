//! Typed error taxonomy for catalog calls.
//!
//! Every failure on the path from the request queue to the upstream catalog
//! is a [`CatalogError`]. Callers branch on [`CatalogError::kind`] and
//! [`CatalogError::is_retryable`] rather than matching variants. Application
//! edges (config, CLI, database setup) use `anyhow` instead.
//!
//! "No acceptable product" is not an error: resolver operations return
//! `Ok(None)` / `Ok(vec![])` for it.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a [`CatalogError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    RateLimited,
    Timeout,
    ServerError,
    NetworkError,
    AuthError,
    NotFound,
    CircuitOpen,
    BadRequest,
    InvalidResponse,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ServerError => "SERVER_ERROR",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::AuthError => "AUTH_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::CircuitOpen => "CIRCUIT_OPEN",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::InvalidResponse => "INVALID_RESPONSE",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a protected catalog call.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("rate limited by catalog service (retry after {retry_after:?})")]
    RateLimited { retry_after: Duration },

    /// Local rate budget exhausted and not freed within the wait limit.
    #[error("local rate budget exhausted (retry after {retry_after:?})")]
    Throttled { retry_after: Duration },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("catalog service error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request ({status}): {body}")]
    BadRequest { status: u16, body: String },

    #[error("circuit breaker open, retry in {remaining:?}")]
    CircuitOpen { remaining: Duration },

    /// A task sat in the request queue past its deadline and was never run.
    #[error("queued task expired after waiting {waited:?} (limit {timeout:?})")]
    QueueTimeout { waited: Duration, timeout: Duration },

    #[error("invalid catalog response: {0}")]
    Decode(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::RateLimited { .. } | CatalogError::Throttled { .. } => ErrorKind::RateLimited,
            CatalogError::Timeout(_) | CatalogError::QueueTimeout { .. } => ErrorKind::Timeout,
            CatalogError::Server { .. } => ErrorKind::ServerError,
            CatalogError::Network(_) => ErrorKind::NetworkError,
            CatalogError::Auth { .. } => ErrorKind::AuthError,
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::BadRequest { .. } => ErrorKind::BadRequest,
            CatalogError::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            CatalogError::Decode(_) => ErrorKind::InvalidResponse,
            CatalogError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the transport may try the same request again.
    ///
    /// A queue timeout shares the `TIMEOUT` kind but is never retried: the
    /// task did not run, and the caller has already waited its budget.
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogError::QueueTimeout { .. } | CatalogError::Throttled { .. } => false,
            _ => matches!(
                self.kind(),
                ErrorKind::RateLimited
                    | ErrorKind::Timeout
                    | ErrorKind::ServerError
                    | ErrorKind::NetworkError
            ),
        }
    }

    /// Server-suggested wait before another attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CatalogError::RateLimited { retry_after } | CatalogError::Throttled { retry_after } => {
                Some(*retry_after)
            }
            CatalogError::CircuitOpen { remaining } => Some(*remaining),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout(Duration::ZERO)
        } else if e.is_decode() {
            CatalogError::Decode(e.to_string())
        } else {
            CatalogError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Decode(e.to_string())
    }
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
