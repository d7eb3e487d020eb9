use crate::target::FetchTarget;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

/// Shared work queue the download workers pull from.
///
/// Filled once at construction and only ever drained. Two counts are kept:
/// the items still waiting to be claimed, and the items not yet completed
/// (waiting plus claimed-but-in-flight). `join` waits on the second one, so
/// it only returns once every fetch attempt has finished, not merely once
/// the queue is empty.
pub struct WorkQueue {
    items: Mutex<VecDeque<FetchTarget>>,
    total: usize,
    outstanding: AtomicUsize,
    drained: Notify,
}

impl WorkQueue {
    pub fn new(targets: impl IntoIterator<Item = FetchTarget>) -> Arc<Self> {
        let items: VecDeque<_> = targets.into_iter().collect();
        let total = items.len();
        Arc::new(Self {
            items: Mutex::new(items),
            total,
            outstanding: AtomicUsize::new(total),
            drained: Notify::new(),
        })
    }

    /// Number of items originally enqueued.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Items not yet claimed by any worker.
    pub async fn remaining(&self) -> usize {
        self.items.lock().await.len()
    }

    /// Items not yet completed, including those currently being processed.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Takes the next item, or `None` once the queue is empty.
    ///
    /// Never waits for new work: the queue is not refilled during a run.
    pub async fn claim(self: &Arc<Self>) -> Option<Claim> {
        let mut items = self.items.lock().await;
        let target = items.pop_front()?;
        let done = self.total - items.len();
        drop(items);

        Some(Claim {
            queue: Arc::clone(self),
            target,
            done,
        })
    }

    /// Waits until every enqueued item has been claimed and completed.
    pub async fn join(&self) {
        loop {
            let notified = self.drained.notified();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn complete(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drained.notify_waiters();
        }
    }
}

/// An item taken off the queue by one worker.
///
/// Dropping the claim marks the item complete, so each claimed item is
/// completed exactly once whatever way its processing ends.
pub struct Claim {
    queue: Arc<WorkQueue>,
    target: FetchTarget,
    done: usize,
}

impl Claim {
    pub fn target(&self) -> &FetchTarget {
        &self.target
    }

    /// Progress number for this item: total minus what was left after claiming it.
    pub fn done(&self) -> usize {
        self.done
    }

    /// Marks the item complete; same as dropping the claim.
    pub fn complete(self) {}
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.queue.complete();
    }
}
