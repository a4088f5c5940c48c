//! Typed errors for the query engine.
//!
//! Per-page failures ([`PageError`]) are absorbed by the scheduler and recorded on the
//! aggregate. Only [`QueryError`] values propagate to the caller as hard failures.

use thiserror::Error;

/// Result alias for engine operations.
pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Hard failures of a query run.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Rejected before any dispatch (empty query, bad page bounds, zero size or workers).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every dispatched page failed. Carries each page's error in completion order.
    #[error("all {} page(s) failed; first error: {}", .errors.len(), first_error(.errors))]
    AllPagesFailed { errors: Vec<PageError> },

    /// Result channel closed before every page reported back.
    #[error("worker pool stopped early: {received} of {expected} page(s) reported")]
    WorkerPanicked { received: usize, expected: usize },

    /// HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl QueryError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        QueryError::InvalidInput(msg.into())
    }
}

fn first_error(errors: &[PageError]) -> String {
    errors
        .first()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "<none>".to_string())
}

/// Failure of a single page fetch.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("page {page_index}: {kind}")]
pub struct PageError {
    pub page_index: usize,
    pub kind: FailureKind,
}

/// Classified reason a page produced no items.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FailureKind {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("http status {code}")]
    Status { code: u16 },
    #[error("malformed response body: {0}")]
    MalformedBody(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Failure reported by a [`Transport`](crate::transport::Transport) implementation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("{0}")]
    Other(String),
}

impl From<TransportError> for FailureKind {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout(msg) => FailureKind::Timeout(msg),
            TransportError::Connect(msg) | TransportError::Other(msg) => FailureKind::Network(msg),
        }
    }
}
