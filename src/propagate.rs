use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::error::{ErrorPresenter, NavError, Result};
use crate::filter::FilterChain;
use crate::node::{NodeId, TargetTypes, TreeModel};
use crate::progress::{CancelToken, Progress, ProgressUpdate};
use crate::view::{CheckedSet, StateUpdate, ViewHandle};

/// Progress units allotted to each input node of a propagation run.
const WORK_PER_NODE: usize = 100;

/// Message shown when a traversal aborts on a data-access failure.
const COLLECT_FAILED: &str = "Can't collect child nodes";

/// Immutable collaborators shared with the traversal worker.
struct Shared {
    view: ViewHandle,
    model: Arc<dyn TreeModel>,
    targets: TargetTypes,
    filters: FilterChain,
}

/// Propagates tri-state check selection over a lazily-loaded navigator tree.
///
/// Sits between a check-toggle event source and the tree model: a toggle on
/// one node checks or unchecks every matching descendant leaf and re-derives
/// the checked/grayed display state of every affected container, honoring
/// the view's filter chain. The tree walk runs on a blocking worker; all
/// view mutations go through the view-owner executor.
///
/// Runs for the same propagator are serialized; the tree is assumed
/// structurally quiescent during one run.
pub struct SelectionPropagator {
    shared: Arc<Shared>,
    presenter: Arc<dyn ErrorPresenter>,
    progress_tx: Option<mpsc::UnboundedSender<ProgressUpdate>>,
    run_lock: Mutex<()>,
}

impl SelectionPropagator {
    /// Capture the collaborators. The target set and filter chain are fixed
    /// for the propagator's lifetime.
    pub fn new(
        view: ViewHandle,
        model: Arc<dyn TreeModel>,
        targets: TargetTypes,
        filters: FilterChain,
        presenter: Arc<dyn ErrorPresenter>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                view,
                model,
                targets,
                filters,
            }),
            presenter,
            progress_tx: None,
            run_lock: Mutex::new(()),
        }
    }

    /// Attach a sink for progress updates emitted during runs.
    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<ProgressUpdate>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Entry point for a user toggling one node's checkbox.
    pub async fn on_check_toggled(&self, node: NodeId, checked: bool) {
        self.propagate(vec![node], checked, true).await;
    }

    /// Push `checked` over the given nodes.
    ///
    /// With `apply_to_descendants` the state is propagated down to every
    /// matching descendant leaf and each node's ancestors are repaired
    /// afterwards; without it only the nodes' own container display state is
    /// re-derived from already-applied leaf states.
    ///
    /// Failures are reported once to the error presenter; cancellation is
    /// absorbed silently. Updates applied before an abort are kept.
    pub async fn propagate(&self, nodes: Vec<NodeId>, checked: bool, apply_to_descendants: bool) {
        self.propagate_with_cancel(nodes, checked, apply_to_descendants, CancelToken::new())
            .await;
    }

    /// Same as [`propagate`](Self::propagate) with a caller-held
    /// cancellation token.
    pub async fn propagate_with_cancel(
        &self,
        nodes: Vec<NodeId>,
        checked: bool,
        apply_to_descendants: bool,
        cancel: CancelToken,
    ) {
        // One run at a time per view: the snapshot and in-flight view
        // mutations are not safe for concurrent propagation.
        let _run = self.run_lock.lock().await;

        let shared = self.shared.clone();
        let progress = Progress::new(
            WORK_PER_NODE * nodes.len(),
            cancel,
            self.progress_tx.clone(),
        );
        let outcome = tokio::task::spawn_blocking(move || {
            run_propagation(&shared, &nodes, checked, apply_to_descendants, &progress)
        })
        .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) if err.is_cancelled() => {}
            Ok(Err(err)) => self.presenter.show_error(COLLECT_FAILED, &err),
            Err(join_err) => self
                .presenter
                .show_error(COLLECT_FAILED, &NavError::Task(join_err.to_string())),
        }
    }

    /// Rebuild ancestor display state from the view's current checked set,
    /// after an external bulk change (e.g. restoring a persisted selection).
    ///
    /// Every database-backed ancestor of a checked element is forced checked
    /// and then recomputed without touching leaves.
    pub async fn update_check_states(&self) {
        let snapshot = match self.shared.view.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.presenter.show_error(COLLECT_FAILED, &err);
                return;
            }
        };

        // Order-preserving unique ancestor set, skipping nodes that are not
        // database-backed.
        let mut seen = HashSet::new();
        let mut ancestors = Vec::new();
        let mut force_checked = Vec::new();
        for element in snapshot.iter() {
            let mut current = self.shared.model.parent(element);
            while let Some(node) = current {
                if self.shared.model.object_tag(node).is_some() && seen.insert(node) {
                    ancestors.push(node);
                    force_checked.push(StateUpdate::Checked(node, true));
                }
                current = self.shared.model.parent(node);
            }
        }

        if let Err(err) = self.shared.view.apply(force_checked).await {
            self.presenter.show_error(COLLECT_FAILED, &err);
            return;
        }
        self.propagate(ancestors, true, false).await;
    }
}

/// Worker body: snapshot the checked set, then process each input node in
/// order, repairing ancestors after each downward pass.
fn run_propagation(
    shared: &Shared,
    nodes: &[NodeId],
    checked: bool,
    apply_to_descendants: bool,
    progress: &Progress,
) -> Result<()> {
    let snapshot = shared.view.snapshot_blocking()?;
    for &node in nodes {
        update_hierarchy(shared, &snapshot, node, checked, apply_to_descendants, progress)?;

        if apply_to_descendants {
            // Repair ancestor display state without re-touching their other
            // descendants. Stops before the first boundary node.
            let mut current = shared.model.parent(node);
            while let Some(ancestor) = current {
                if shared.model.is_boundary(ancestor) {
                    break;
                }
                if shared.model.object_tag(ancestor).is_some() {
                    update_hierarchy(shared, &snapshot, ancestor, checked, false, progress)?;
                }
                current = shared.model.parent(ancestor);
            }
        }
        progress.tick(WORK_PER_NODE);
    }
    Ok(())
}

/// Collect the subtree under `element` and hand one batch of display-state
/// updates to the view owner.
///
/// Downward mode (`apply_to_descendants`) checks every collected leaf and
/// stamps every collected container; recompute mode re-derives the state of
/// `element` alone from the snapshot's leaf checks.
fn update_hierarchy(
    shared: &Shared,
    snapshot: &CheckedSet,
    element: NodeId,
    checked: bool,
    apply_to_descendants: bool,
    progress: &Progress,
) -> Result<()> {
    // A node hidden by the filter chain never receives a state update.
    if !apply_to_descendants
        && !shared
            .filters
            .accepts(shared.model.parent(element), element)
    {
        return Ok(());
    }

    let mut leaves = Vec::new();
    let mut containers = Vec::new();
    collect_children(
        shared,
        snapshot,
        element,
        !apply_to_descendants,
        progress,
        &mut leaves,
        &mut containers,
    )?;

    let mut batch = Vec::new();
    if apply_to_descendants {
        for &leaf in &leaves {
            batch.push(StateUpdate::Checked(leaf, checked));
        }
    }

    let leaf_set: HashSet<NodeId> = leaves.iter().copied().collect();
    let container_set: HashSet<NodeId> = containers.iter().copied().collect();
    let recompute: Vec<NodeId> = if apply_to_descendants {
        containers
    } else {
        vec![element]
    };

    for container in recompute {
        // Children are already materialized by the collect pass, so this
        // fetch is cheap and exempt from cancellation.
        let mut direct = shared.model.children(container, &Progress::none())?;
        direct.retain(|&child| shared.filters.accepts(Some(container), child));

        // Grayed when none of the direct children is a collected leaf.
        let missing = !direct.iter().any(|child| leaf_set.contains(child));
        let new_checked = if apply_to_descendants {
            checked
        } else {
            !missing || direct.iter().any(|child| container_set.contains(child))
        };
        batch.push(StateUpdate::Checked(container, new_checked));
        batch.push(StateUpdate::Grayed(container, missing));
    }

    shared.view.apply_blocking(batch)
}

/// Depth-first descent under `element`, recording matching leaves and the
/// containers above them. Returns whether the subtree matched at all.
///
/// A node matching a target type is terminal: its children are never
/// descended into. Containers are recorded post-order, deepest first, only
/// when some descendant matched. With `only_checked`, recording is limited
/// to nodes checked in the snapshot (matching itself still counts).
fn collect_children(
    shared: &Shared,
    snapshot: &CheckedSet,
    element: NodeId,
    only_checked: bool,
    progress: &Progress,
    leaves: &mut Vec<NodeId>,
    containers: &mut Vec<NodeId>,
) -> Result<bool> {
    // Nodes without a database object contribute nothing.
    let Some(tag) = shared.model.object_tag(element) else {
        return Ok(false);
    };
    if !shared
        .filters
        .accepts(shared.model.parent(element), element)
    {
        return Ok(false);
    }

    let is_checked = snapshot.contains(element);
    if shared.targets.matches(tag) {
        if !only_checked || is_checked {
            leaves.push(element);
        }
        return Ok(true);
    }

    // Lazy materialization may block on the data source; this is the
    // cancellation point.
    progress.check_cancelled()?;
    let children = shared.model.children(element, progress)?;
    if children.is_empty() {
        return Ok(false);
    }

    let mut found = false;
    for child in children {
        if collect_children(shared, snapshot, child, only_checked, progress, leaves, containers)? {
            found = true;
        }
    }
    if found && (!only_checked || is_checked) {
        containers.push(element);
    }
    Ok(found)
}
