use std::collections::HashSet;

use crate::error::Result;
use crate::progress::Progress;

/// Identity of a node in the navigator tree.
///
/// Identities are assigned by the external tree model; the propagator only
/// compares and hashes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Discriminated type tag of the domain object a tree node wraps.
///
/// Matching a node against the target set is a tag-membership test, so the
/// model decides once what category each wrapped object belongs to
/// ("table", "view", "schema", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectTag(pub &'static str);

/// The set of object tags that qualify a node as a selectable leaf.
///
/// Fixed at propagator construction, immutable thereafter.
#[derive(Debug, Clone)]
pub struct TargetTypes {
    tags: HashSet<ObjectTag>,
}

impl TargetTypes {
    pub fn new(tags: impl IntoIterator<Item = ObjectTag>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
        }
    }

    /// Whether a node carrying this tag is a target leaf.
    pub fn matches(&self, tag: ObjectTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// The lazily-materialized navigator tree, owned entirely by the embedding
/// application. The propagator only reads structure through this trait; it
/// never creates or destroys nodes.
///
/// The tree is assumed quiescent for the duration of one propagation run;
/// concurrent structural mutation is not guarded against.
pub trait TreeModel: Send + Sync {
    /// Weak back-reference to the parent, used only for upward walks and
    /// boundary detection. `None` at the tree root.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Direct children of `node`, materializing them on first access.
    ///
    /// May block on a database round-trip; implementations should check
    /// `progress` for cancellation and tick it while loading. Repeated calls
    /// after materialization are expected to be cheap.
    fn children(&self, node: NodeId, progress: &Progress) -> Result<Vec<NodeId>>;

    /// Tag of the wrapped domain object, or `None` for nodes that are not
    /// database-backed. Untagged nodes contribute nothing to propagation.
    fn object_tag(&self, node: NodeId) -> Option<ObjectTag>;

    /// Whether upward walks must stop at this node (e.g. the owning
    /// data-source root).
    fn is_boundary(&self, node: NodeId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_types_membership() {
        let targets = TargetTypes::new([ObjectTag("table"), ObjectTag("view")]);
        assert!(targets.matches(ObjectTag("table")));
        assert!(targets.matches(ObjectTag("view")));
        assert!(!targets.matches(ObjectTag("schema")));
    }

    #[test]
    fn target_types_empty() {
        let targets = TargetTypes::new([]);
        assert!(targets.is_empty());
        assert!(!targets.matches(ObjectTag("table")));
    }

    #[test]
    fn node_id_ordering_and_hash() {
        let mut set = HashSet::new();
        set.insert(NodeId(1));
        set.insert(NodeId(1));
        set.insert(NodeId(2));
        assert_eq!(set.len(), 2);
        assert!(NodeId(1) < NodeId(2));
    }
}
