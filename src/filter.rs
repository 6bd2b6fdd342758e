use std::sync::Arc;

use crate::node::NodeId;

/// A view filter predicate: decides whether `node` (with the given parent)
/// is visible. Hidden nodes are excluded from collection and never receive
/// display-state updates.
pub trait NodeFilter: Send + Sync {
    fn select(&self, parent: Option<NodeId>, node: NodeId) -> bool;
}

impl<F> NodeFilter for F
where
    F: Fn(Option<NodeId>, NodeId) -> bool + Send + Sync,
{
    fn select(&self, parent: Option<NodeId>, node: NodeId) -> bool {
        self(parent, node)
    }
}

/// Ordered chain of view filters; a node is visible only if every filter
/// accepts it. Captured once per propagator and immutable during a run.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn NodeFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: impl NodeFilter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// All filters must accept the node.
    pub fn accepts(&self, parent: Option<NodeId>, node: NodeId) -> bool {
        self.filters.iter().all(|f| f.select(parent, node))
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("len", &self.filters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chain_accepts_everything() {
        let chain = FilterChain::new();
        assert!(chain.accepts(None, NodeId(1)));
        assert!(chain.accepts(Some(NodeId(0)), NodeId(2)));
    }

    #[test]
    fn single_filter_rejects() {
        let chain = FilterChain::new().with(|_parent, node: NodeId| node != NodeId(3));
        assert!(chain.accepts(None, NodeId(1)));
        assert!(!chain.accepts(None, NodeId(3)));
    }

    #[test]
    fn all_filters_must_accept() {
        let chain = FilterChain::new()
            .with(|_, node: NodeId| node.0 % 2 == 0)
            .with(|_, node: NodeId| node.0 < 10);
        assert!(chain.accepts(None, NodeId(4)));
        assert!(!chain.accepts(None, NodeId(5)));
        assert!(!chain.accepts(None, NodeId(12)));
    }

    #[test]
    fn filter_sees_parent() {
        let chain = FilterChain::new().with(|parent, _node| parent != Some(NodeId(9)));
        assert!(chain.accepts(Some(NodeId(1)), NodeId(2)));
        assert!(!chain.accepts(Some(NodeId(9)), NodeId(2)));
    }
}
