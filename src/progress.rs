use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{NavError, Result};

/// Cooperative cancellation token shared between the control side and the
/// traversal worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The worker observes this at its next
    /// suspension point (children materialization).
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Progress update emitted while a propagation run walks the tree.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Units of work completed so far.
    pub completed: usize,
    /// Total units for the whole run (100 per input node).
    pub total: usize,
}

/// Progress handle passed down through the traversal.
///
/// Carries the cancellation token and an optional sink for progress ticks.
/// Model implementations check cancellation here while loading children.
#[derive(Debug, Clone)]
pub struct Progress {
    cancel: CancelToken,
    tx: Option<mpsc::UnboundedSender<ProgressUpdate>>,
    total: usize,
    completed: Arc<AtomicUsize>,
}

impl Progress {
    pub fn new(
        total: usize,
        cancel: CancelToken,
        tx: Option<mpsc::UnboundedSender<ProgressUpdate>>,
    ) -> Self {
        Self {
            cancel,
            tx,
            total,
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A progress handle that reports nowhere and can never be cancelled.
    pub fn none() -> Self {
        Self::new(0, CancelToken::new(), None)
    }

    /// Err(`Cancelled`) once the user has cancelled the run.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(NavError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Record `units` of completed work and notify the sink, if any.
    /// A dropped receiver is ignored.
    pub fn tick(&self, units: usize) {
        let completed = self.completed.fetch_add(units, Ordering::Relaxed) + units;
        if let Some(tx) = &self.tx {
            let _ = tx.send(ProgressUpdate {
                completed,
                total: self.total,
            });
        }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }
}
