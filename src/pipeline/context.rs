//! Pipeline channels and handles: the task queue into the worker pool and the result
//! channel out of it.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::thread::JoinHandle;

use crate::PageResult;

use super::cancel::CancellationToken;

/// Channels for one run. Dispatcher gets `job_tx`; workers get `job_rx` and `result_tx`;
/// the collector keeps `result_rx`.
pub struct PipelineChannels {
    pub job_tx: Sender<usize>,
    pub job_rx: Receiver<usize>,
    pub result_tx: Sender<PageResult>,
    pub result_rx: Receiver<PageResult>,
}

/// Task queue holds at most one pending page per worker, so dispatch (and its pacing)
/// stays just ahead of the pool. The result channel holds every page so a worker never
/// blocks on send, even after the collector has left.
pub fn create_pipeline_channels(num_workers: usize, pages_total: usize) -> PipelineChannels {
    let (job_tx, job_rx) = bounded::<usize>(num_workers.max(1));
    let (result_tx, result_rx) = bounded::<PageResult>(pages_total.max(1));
    PipelineChannels {
        job_tx,
        job_rx,
        result_tx,
        result_rx,
    }
}

/// Threads of a running pool. Join after the result stream is drained; drop to detach on
/// cancellation.
pub struct PipelineHandles {
    pub result_rx: Receiver<PageResult>,
    pub dispatch_handle: JoinHandle<usize>,
    pub worker_handles: Vec<JoinHandle<()>>,
}

/// Caller's token plus a run-local one (tripped by the deadline). Either stops the run.
#[derive(Clone, Debug)]
pub struct StopSignal {
    pub caller: CancellationToken,
    pub internal: CancellationToken,
}

impl StopSignal {
    pub fn new(caller: &CancellationToken) -> Self {
        Self {
            caller: caller.clone(),
            internal: CancellationToken::new(),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.caller.is_cancelled() || self.internal.is_cancelled()
    }
}
