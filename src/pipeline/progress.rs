//! Progress delivery from the scheduler to whoever is watching.

use crossbeam_channel::Sender;

use crate::ProgressSnapshot;

/// Receives one snapshot per successfully merged page, in merge order. Failed pages are not
/// reported. Called on the scheduler's collector thread; keep it fast or forward to a channel.
pub trait ProgressSink {
    fn on_progress(&self, snapshot: ProgressSnapshot);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressSnapshot),
{
    fn on_progress(&self, snapshot: ProgressSnapshot) {
        self(snapshot)
    }
}

/// Discards every snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _snapshot: ProgressSnapshot) {}
}

/// Forwards snapshots over a channel so the consumer can live on any thread.
/// A disconnected receiver is ignored: progress is advisory.
#[derive(Clone, Debug)]
pub struct ChannelProgress {
    tx: Sender<ProgressSnapshot>,
}

impl ChannelProgress {
    pub fn new(tx: Sender<ProgressSnapshot>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgress {
    fn on_progress(&self, snapshot: ProgressSnapshot) {
        let _ = self.tx.try_send(snapshot);
    }
}
