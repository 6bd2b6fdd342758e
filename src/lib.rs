//! Tri-state checkbox selection propagation for lazily-loaded navigator
//! trees.
//!
//! A [`SelectionPropagator`] sits between a check-toggle event source and a
//! tree of database-object nodes whose children are materialized on demand.
//! Toggling one node checks or unchecks every matching descendant leaf and
//! re-derives the checked/grayed (indeterminate) display state of every
//! affected container. The tree walk runs on a background worker with
//! progress reporting and cooperative cancellation; view mutations are
//! marshaled onto a single view-owner task.
//!
//! The widget, the node model, the progress sink, and error presentation are
//! collaborator traits ([`CheckableTreeView`], [`TreeModel`],
//! [`ErrorPresenter`]); this crate owns only the synchronization algorithm.

pub mod error;
pub mod filter;
pub mod node;
pub mod progress;
pub mod propagate;
pub mod view;

pub use error::{ErrorPresenter, NavError, Result};
pub use filter::{FilterChain, NodeFilter};
pub use node::{NodeId, ObjectTag, TargetTypes, TreeModel};
pub use progress::{CancelToken, Progress, ProgressUpdate};
pub use propagate::SelectionPropagator;
pub use view::{CheckableTreeView, CheckedSet, StateUpdate, ViewExecutor, ViewHandle};
