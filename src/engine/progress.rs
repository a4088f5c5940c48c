//! Progress bar over pages, fed by snapshots from the scheduler.

use crossbeam_channel::{Receiver, unbounded};
use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::ProgressSnapshot;
use crate::pipeline::{ChannelProgress, NoProgress, ProgressSink};

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// (consumer thread, sink handed to the scheduler) from [`setup_progress`].
/// Drop the sink, then join the thread.
pub type ProgressSetup = (Option<JoinHandle<()>>, Box<dyn ProgressSink>);

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub animation: Animation,
}

impl ProgressBarConfig {
    /// Create a new progress bar configuration
    pub fn new(total: usize, desc: &'static str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

/// Create a progress bar with the given configuration
pub fn create_progress_bar(config: ProgressBarConfig) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        unit = " pages"
    )))
}

/// Update progress bar if available
/// Uses try_lock so a busy renderer never stalls the consumer.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Force a refresh of the bar (e.g. so it shows 0/N before the first page lands).
pub fn refresh_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.try_lock() {
        let _ = bar.refresh();
    }
}

/// Drain snapshots into `bar` until every sender is dropped. Advances by the number of
/// pages completed since the previous snapshot.
pub fn spawn_bar_consumer(bar: ProgressBar, rx: Receiver<ProgressSnapshot>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut shown = 0_usize;
        while let Ok(snapshot) = rx.recv() {
            if snapshot.pages_done > shown {
                update_progress_bar(&bar, snapshot.pages_done - shown);
                shown = snapshot.pages_done;
            }
        }
        refresh_bar(&bar);
    })
}

/// Build the sink for a run of `pages_total` pages. With `show_bar`, snapshots travel over a
/// channel to a thread rendering a kdam bar; otherwise they are dropped.
pub fn setup_progress(show_bar: bool, pages_total: usize) -> ProgressSetup {
    if !show_bar {
        return (None, Box::new(NoProgress));
    }
    let bar = create_progress_bar(ProgressBarConfig::new(
        pages_total,
        "Querying",
        Animation::Classic,
    ));
    refresh_bar(&bar);
    let (tx, rx) = unbounded::<ProgressSnapshot>();
    let handle = spawn_bar_consumer(bar, rx);
    (Some(handle), Box::new(ChannelProgress::new(tx)))
}
