//! Pipeline components: fetcher, worker pool, aggregation, cancellation and progress.

pub mod aggregator;
pub mod cancel;
pub(crate) mod context;
pub mod error_handler;
pub mod fetcher;
pub mod progress;
pub mod scheduler;

pub use aggregator::{ResultAggregator, merge_page};
pub use cancel::CancellationToken;
pub use error_handler::check_for_total_failure;
pub use fetcher::{PageFetcher, parse_page_body};
pub use progress::{ChannelProgress, NoProgress, ProgressSink};
pub use scheduler::ConcurrentScheduler;
