//! quakeq: concurrent paginated search client

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod transport;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use error::{FailureKind, PageError, QueryError, QueryResult, TransportError};
pub use pipeline::{CancellationToken, ChannelProgress, NoProgress, ProgressSink};
pub use query::Query;

use log::debug;
use std::sync::Arc;

use pipeline::{ConcurrentScheduler, PageFetcher};
use query::SessionMeta;
use transport::{HttpTransport, Transport};

/// Result alias used by the CLI-facing parts of the quakeq API (settings, export)
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Per-run inputs for [`run_query`].
pub struct RunParams<'a> {
    pub query: &'a Query,
    /// Total records wanted; split into pages of at most 100.
    pub total_size: usize,
    /// Most pages in flight at once.
    pub max_workers: usize,
    pub cancel: &'a CancellationToken,
    pub progress: &'a dyn ProgressSink,
}

/// Single entry point: fetch `params.total_size` records for `params.query` over HTTP.
///
/// - Builds a blocking HTTP transport with `config.request_timeout`.
/// - Returns [`RunOutcome::Completed`] or, when `params.cancel` fires or `config.deadline`
///   passes, [`RunOutcome::Cancelled`] with the partial aggregate.
/// - Fails with [`QueryError::AllPagesFailed`] only when no page succeeded.
///
/// ```ignore
/// let query = quakeq::Query::new("domain: example.com")?;
/// let cancel = quakeq::CancellationToken::new();
/// let params = quakeq::RunParams {
///     query: &query,
///     total_size: 250,
///     max_workers: 3,
///     cancel: &cancel,
///     progress: &quakeq::NoProgress,
/// };
/// let outcome = quakeq::run_query(&quakeq::EngineConfig::default(), cookies, params)?;
/// ```
pub fn run_query(
    config: &EngineConfig,
    cookies: Cookies,
    params: RunParams<'_>,
) -> QueryResult<RunOutcome> {
    let transport = HttpTransport::new(config.request_timeout)?;
    run_query_with_transport(Arc::new(transport), config, cookies, params)
}

/// Same as [`run_query`] with a caller-supplied [`Transport`].
pub fn run_query_with_transport(
    transport: Arc<dyn Transport>,
    config: &EngineConfig,
    cookies: Cookies,
    params: RunParams<'_>,
) -> QueryResult<RunOutcome> {
    let session = SessionMeta::now(config);
    debug!("session device: {:?}", session.device);
    let fetcher = PageFetcher::new(transport, Arc::new(config.clone()), cookies, session);
    let scheduler = ConcurrentScheduler::new(Arc::new(fetcher));
    scheduler.run(
        params.query,
        params.total_size,
        params.max_workers,
        params.cancel,
        params.progress,
    )
}
