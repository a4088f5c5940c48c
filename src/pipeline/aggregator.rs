//! Running aggregate of page results.

use std::sync::{Mutex, MutexGuard};

use log::warn;

use crate::{AggregateResult, PageResult, ProgressSnapshot};

/// Fold one page into `current`: append items, merge metadata last-write-wins, record a
/// failure, truncate to the first `total_size` items, and count the page as completed.
pub fn merge_page(current: &mut AggregateResult, incoming: PageResult, total_size: usize) {
    current.pages_completed += 1;
    if let Some(err) = incoming.error {
        warn!("{}", err);
        current.failures.push(err);
        return;
    }
    current.items.extend(incoming.items);
    current.metadata.extend(incoming.metadata);
    current.items.truncate(total_size);
}

/// Thread-safe accumulator. Items, metadata and the completion counter sit behind one lock,
/// so concurrent merges serialize here.
#[derive(Debug)]
pub struct ResultAggregator {
    total_size: usize,
    state: Mutex<AggregateResult>,
}

impl ResultAggregator {
    pub fn new(total_size: usize, pages_total: usize) -> Self {
        Self {
            total_size,
            state: Mutex::new(AggregateResult {
                pages_total,
                ..Default::default()
            }),
        }
    }

    /// Merge `incoming`. Returns the progress right after it, or None for a failed page:
    /// only successful merges are reported to the progress sink.
    pub fn merge(&self, incoming: PageResult) -> Option<ProgressSnapshot> {
        let succeeded = incoming.succeeded();
        let mut state = self.lock();
        merge_page(&mut state, incoming, self.total_size);
        succeeded.then(|| snapshot_of(&state))
    }

    pub fn running_count(&self) -> usize {
        self.lock().items.len()
    }

    pub fn progress(&self) -> ProgressSnapshot {
        snapshot_of(&self.lock())
    }

    /// Copy of the aggregate so far (used for partial results on cancellation).
    pub fn snapshot(&self) -> AggregateResult {
        self.lock().clone()
    }

    pub fn into_result(self) -> AggregateResult {
        self.state.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    // A panic while holding the lock leaves a consistent aggregate: every merge step is a
    // plain append or insert.
    fn lock(&self) -> MutexGuard<'_, AggregateResult> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn snapshot_of(state: &AggregateResult) -> ProgressSnapshot {
    ProgressSnapshot {
        pages_done: state.pages_completed,
        pages_total: state.pages_total,
        running_count: state.items.len(),
        failed_pages: state.failures.len(),
    }
}
