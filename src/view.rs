use std::collections::HashSet;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{NavError, Result};
use crate::node::NodeId;

/// The checkable tree widget, implemented by the embedding UI.
///
/// The propagator never holds this directly: the value is owned by a
/// single view-owner task (see [`ViewExecutor`]) and all access goes
/// through [`ViewHandle`], so check/gray state is never mutated from the
/// traversal thread.
pub trait CheckableTreeView: Send + 'static {
    /// Currently checked identities, in view order.
    fn checked_elements(&self) -> Vec<NodeId>;
    fn set_checked(&mut self, node: NodeId, checked: bool);
    fn set_grayed(&mut self, node: NodeId, grayed: bool);
}

/// One pending view mutation, produced by the collect phase and applied by
/// the view owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateUpdate {
    Checked(NodeId, bool),
    Grayed(NodeId, bool),
}

/// Snapshot of the view's checked elements, taken once at the start of a
/// propagation run and read-only for its duration.
#[derive(Debug, Clone, Default)]
pub struct CheckedSet {
    order: Vec<NodeId>,
    set: HashSet<NodeId>,
}

impl CheckedSet {
    pub fn new(elements: Vec<NodeId>) -> Self {
        let set = elements.iter().copied().collect();
        Self {
            order: elements,
            set,
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.set.contains(&node)
    }

    /// Checked elements in the order the view reported them.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

enum ViewRequest {
    Snapshot(oneshot::Sender<CheckedSet>),
    Apply(Vec<StateUpdate>, oneshot::Sender<()>),
}

/// Spawns the single-threaded view-owner task.
pub struct ViewExecutor;

impl ViewExecutor {
    /// Take ownership of the view and process requests strictly
    /// sequentially. The view is handed back when the last [`ViewHandle`]
    /// is dropped.
    pub fn spawn<V: CheckableTreeView>(mut view: V) -> (ViewHandle, JoinHandle<V>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let owner = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                match request {
                    ViewRequest::Snapshot(reply) => {
                        let _ = reply.send(CheckedSet::new(view.checked_elements()));
                    }
                    ViewRequest::Apply(batch, reply) => {
                        for update in batch {
                            match update {
                                StateUpdate::Checked(node, value) => view.set_checked(node, value),
                                StateUpdate::Grayed(node, value) => view.set_grayed(node, value),
                            }
                        }
                        let _ = reply.send(());
                    }
                }
            }
            view
        });
        (ViewHandle { tx }, owner)
    }
}

/// Clonable client for the view-owner task.
///
/// The `*_blocking` variants are for the traversal worker (a blocking
/// thread); the async variants are for the control side. Both hand the
/// request over and wait for the owner's ack, so an apply batch is fully
/// visible before the caller proceeds.
#[derive(Debug, Clone)]
pub struct ViewHandle {
    tx: mpsc::UnboundedSender<ViewRequest>,
}

impl ViewHandle {
    pub async fn snapshot(&self) -> Result<CheckedSet> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ViewRequest::Snapshot(reply_tx))
            .map_err(|_| NavError::ViewClosed)?;
        reply_rx.await.map_err(|_| NavError::ViewClosed)
    }

    pub async fn apply(&self, batch: Vec<StateUpdate>) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ViewRequest::Apply(batch, reply_tx))
            .map_err(|_| NavError::ViewClosed)?;
        reply_rx.await.map_err(|_| NavError::ViewClosed)
    }

    /// Snapshot from a blocking thread. Must not be called on a runtime
    /// worker thread.
    pub fn snapshot_blocking(&self) -> Result<CheckedSet> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ViewRequest::Snapshot(reply_tx))
            .map_err(|_| NavError::ViewClosed)?;
        reply_rx.blocking_recv().map_err(|_| NavError::ViewClosed)
    }

    /// Apply a batch from a blocking thread and wait for the ack.
    pub fn apply_blocking(&self, batch: Vec<StateUpdate>) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ViewRequest::Apply(batch, reply_tx))
            .map_err(|_| NavError::ViewClosed)?;
        reply_rx.blocking_recv().map_err(|_| NavError::ViewClosed)
    }
}
