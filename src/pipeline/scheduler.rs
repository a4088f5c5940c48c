//! Bounded worker pool over pages.
//!
//! Dispatcher thread → task queue → `n` fetch workers → result channel → collector (the
//! caller's thread), which merges and reports progress. Results are merged in completion
//! order, not page order.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};

use crate::error::{QueryError, QueryResult};
use crate::query::{PagePlan, Query};
use crate::{AggregateResult, CancelReason, PageResult, RunOutcome};

use super::aggregator::ResultAggregator;
use super::cancel::CancellationToken;
use super::context::{PipelineHandles, StopSignal, create_pipeline_channels};
use super::error_handler::check_for_total_failure;
use super::fetcher::PageFetcher;
use super::progress::ProgressSink;

/// Runs paged queries through a shared [`PageFetcher`].
pub struct ConcurrentScheduler {
    fetcher: Arc<PageFetcher>,
}

impl ConcurrentScheduler {
    pub fn new(fetcher: Arc<PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch `total_size` records for `query` with at most `max_workers` pages in flight.
    ///
    /// - Failed pages are skipped and recorded on the aggregate; if all fail the run fails
    ///   with [`QueryError::AllPagesFailed`].
    /// - When `cancel` fires (or the configured deadline passes) the call returns
    ///   [`RunOutcome::Cancelled`] with whatever was merged, without waiting for in-flight
    ///   fetches and without further progress calls.
    pub fn run(
        &self,
        query: &Query,
        total_size: usize,
        max_workers: usize,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> QueryResult<RunOutcome> {
        let plan = PagePlan::new(total_size)?;
        if max_workers == 0 {
            return Err(QueryError::invalid("max workers must be at least 1"));
        }
        let pages_total = plan.pages_total();
        let num_workers = max_workers.min(pages_total);
        let aggregator = ResultAggregator::new(total_size, pages_total);
        let stop = StopSignal::new(cancel);

        if stop.is_stopped() {
            info!("Query cancelled before dispatch");
            return Ok(cancelled(aggregator.into_result(), CancelReason::Requested));
        }
        info!(
            "Executing paged query: {}, total size: {}, pages: {}, workers: {}",
            query.cleaned(),
            total_size,
            pages_total,
            num_workers
        );

        let handles = self.start_pool(query, plan, num_workers, &stop);
        let started = Instant::now();
        let config = self.fetcher.config();
        let mut received = 0_usize;

        while received < pages_total {
            if let Some(reason) = stop_reason(&stop, started, config.deadline) {
                return Ok(abandon(handles, &aggregator, &stop, reason));
            }
            match handles.result_rx.recv_timeout(config.poll_interval) {
                Ok(page) => {
                    // Results landing after cancellation are dropped unmerged.
                    if let Some(reason) = stop_reason(&stop, started, config.deadline) {
                        return Ok(abandon(handles, &aggregator, &stop, reason));
                    }
                    received += 1;
                    if let Some(snapshot) = aggregator.merge(page) {
                        debug!(
                            "merged page {}/{} ({} items so far)",
                            snapshot.pages_done, snapshot.pages_total, snapshot.running_count
                        );
                        progress.on_progress(snapshot);
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    if let Some(reason) = stop_reason(&stop, started, config.deadline) {
                        return Ok(abandon(handles, &aggregator, &stop, reason));
                    }
                    return Err(QueryError::WorkerPanicked {
                        received,
                        expected: pages_total,
                    });
                }
            }
        }

        shutdown_pipeline_handles(handles);
        let result = check_for_total_failure(aggregator.into_result())?;
        info!("Query completed. Total results: {}", result.items.len());
        if result.is_empty() {
            warn!("No results found for the query");
        }
        Ok(RunOutcome::Completed(result))
    }

    fn start_pool(
        &self,
        query: &Query,
        plan: PagePlan,
        num_workers: usize,
        stop: &StopSignal,
    ) -> PipelineHandles {
        let channels = create_pipeline_channels(num_workers, plan.pages_total());
        let dispatch_handle = spawn_dispatch_thread(
            channels.job_tx,
            plan,
            stop.clone(),
            self.fetcher.config().pacing,
        );
        let worker_handles = spawn_fetch_workers(
            channels.job_rx,
            &channels.result_tx,
            FetchJob {
                fetcher: Arc::clone(&self.fetcher),
                query: Arc::new(query.clone()),
                total_size: plan.total_size(),
                stop: stop.clone(),
            },
            num_workers,
        );
        // Dropping the last sender lets the collector see disconnection if every worker dies.
        drop(channels.result_tx);
        PipelineHandles {
            result_rx: channels.result_rx,
            dispatch_handle,
            worker_handles,
        }
    }
}

/// Per-run state every worker reads.
#[derive(Clone)]
struct FetchJob {
    fetcher: Arc<PageFetcher>,
    query: Arc<Query>,
    total_size: usize,
    stop: StopSignal,
}

/// Queue page indices in order, pausing `pacing` before every page after the first.
/// Stops queueing once the run is stopped. Returns how many pages were queued.
pub(crate) fn spawn_dispatch_thread(
    job_tx: Sender<usize>,
    plan: PagePlan,
    stop: StopSignal,
    pacing: Duration,
) -> JoinHandle<usize> {
    thread::spawn(move || {
        let mut sent = 0_usize;
        for span in plan.spans() {
            if span.index > 0 && !pacing.is_zero() {
                thread::sleep(pacing);
            }
            if stop.is_stopped() {
                debug!("dispatch stopped after {} page(s)", sent);
                break;
            }
            if job_tx.send(span.index).is_err() {
                break;
            }
            sent += 1;
        }
        drop(job_tx);
        sent
    })
}

fn fetch_worker_loop(job_rx: Receiver<usize>, result_tx: Sender<PageResult>, job: FetchJob) {
    while let Ok(index) = job_rx.recv() {
        if job.stop.is_stopped() {
            break;
        }
        let page = job.fetcher.fetch(&job.query, index, job.total_size);
        if result_tx.send(page).is_err() {
            break;
        }
    }
    drop(result_tx);
}

/// Spawn `num_workers` fetch workers. Caller must drop its `result_tx` afterwards so the
/// result channel closes when the workers exit.
fn spawn_fetch_workers(
    job_rx: Receiver<usize>,
    result_tx: &Sender<PageResult>,
    job: FetchJob,
    num_workers: usize,
) -> Vec<JoinHandle<()>> {
    (0..num_workers)
        .map(|_| {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let job = job.clone();
            thread::spawn(move || fetch_worker_loop(job_rx, result_tx, job))
        })
        .collect()
}

fn stop_reason(
    stop: &StopSignal,
    started: Instant,
    deadline: Option<Duration>,
) -> Option<CancelReason> {
    if stop.caller.is_cancelled() {
        return Some(CancelReason::Requested);
    }
    if let Some(limit) = deadline
        && started.elapsed() >= limit
    {
        return Some(CancelReason::DeadlineExceeded);
    }
    None
}

/// Stop the pool without joining it and return what was merged so far.
fn abandon(
    handles: PipelineHandles,
    aggregator: &ResultAggregator,
    stop: &StopSignal,
    reason: CancelReason,
) -> RunOutcome {
    stop.internal.cancel();
    // Dropping the receiver and handles detaches the threads; late sends fail and they exit.
    drop(handles);
    let partial = aggregator.snapshot();
    match reason {
        CancelReason::Requested => info!("Query cancelled by user"),
        CancelReason::DeadlineExceeded => warn!("Query deadline exceeded; returning partial results"),
    }
    cancelled(partial, reason)
}

fn cancelled(partial: AggregateResult, reason: CancelReason) -> RunOutcome {
    RunOutcome::Cancelled { partial, reason }
}

/// Join dispatcher and workers once every page has reported.
fn shutdown_pipeline_handles(handles: PipelineHandles) {
    let PipelineHandles {
        result_rx,
        dispatch_handle,
        worker_handles,
    } = handles;
    drop(result_rx);
    match dispatch_handle.join() {
        Ok(sent) => debug!("dispatcher queued {} page(s)", sent),
        Err(_) => warn!("dispatch thread panicked"),
    }
    for h in worker_handles {
        if h.join().is_err() {
            warn!("fetch worker panicked");
        }
    }
}
