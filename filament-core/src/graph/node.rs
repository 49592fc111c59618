//! Graph Nodes
//!
//! This module defines attribute identity and the node record stored in the
//! graph arena.
//!
//! # Identity
//!
//! Every attribute gets a process-unique [`AttrId`] from an atomic counter;
//! ids are never reused. On top of the raw id sit two typed wrappers:
//!
//! - [`SourceId`]: an attribute with no incoming edges, mutated directly.
//! - [`DerivedId`]: an attribute computed by a constraint (lazily, or
//!   eagerly through the graph's queue).
//!
//! Only a `SourceId` can be passed to `Graph::set` and only a `DerivedId`
//! to `Graph::attach`, so "set a computed attribute" and "attach a
//! constraint to a source" are compile errors rather than runtime ones.
//! Both wrappers convert into `AttrId` where a constraint input or a demand
//! target can be either kind.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use crate::graph::constraint::Constraint;
use crate::graph::edge::EdgeId;
use crate::value::Value;

/// Unique identifier for an attribute node.
///
/// Monotonically assigned for the life of the process, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrId(u64);

impl AttrId {
    /// Generate a new unique attribute ID.
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a source attribute: no incoming edges, set directly by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub(crate) AttrId);

/// Handle to a derived attribute: computed by an attached constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivedId(pub(crate) AttrId);

impl From<SourceId> for AttrId {
    fn from(id: SourceId) -> Self {
        id.0
    }
}

impl From<DerivedId> for AttrId {
    fn from(id: DerivedId) -> Self {
        id.0
    }
}

/// Per-node edge list. Nodes rarely have more than a handful of edges.
pub(crate) type EdgeList = SmallVec<[EdgeId; 4]>;

/// Side-effect callback invoked when a derived node's value changes.
pub(crate) type ChangeCallback = Box<dyn FnMut(&Value)>;

/// Kind-specific node state.
///
/// A source carries nothing beyond its stored value; only derived nodes
/// have a constraint slot, an eagerness flag, and a change callback.
pub(crate) enum NodeBody {
    Source,
    Derived {
        /// Eager nodes enqueue themselves when they go dirty and are
        /// recomputed by the queue drain instead of waiting to be pulled.
        eager: bool,
        /// Present while a constraint is attached.
        constraint: Option<Constraint>,
        /// Invoked with the new value whenever recomputation replaces the
        /// stored value with a different one.
        on_change: Option<ChangeCallback>,
    },
}

/// A node in the attribute dataflow graph.
pub(crate) struct Node {
    pub(crate) id: AttrId,
    /// "An ancestor may have changed; value not yet confirmed current."
    pub(crate) dirty: bool,
    /// Last known value; `None` on a derived node before its first demand.
    pub(crate) value: Option<Value>,
    /// Incoming edges in constraint declaration order.
    pub(crate) incoming: EdgeList,
    pub(crate) outgoing: EdgeList,
    /// Diagnostics only; no correctness dependency.
    pub(crate) demand_count: u64,
    pub(crate) recompute_count: u64,
    pub(crate) body: NodeBody,
}

impl Node {
    /// Create a source node. Sources start clean: their stored value is
    /// current by definition.
    pub(crate) fn source(initial: Value) -> Self {
        Self {
            id: AttrId::next(),
            dirty: false,
            value: Some(initial),
            incoming: EdgeList::new(),
            outgoing: EdgeList::new(),
            demand_count: 0,
            recompute_count: 0,
            body: NodeBody::Source,
        }
    }

    /// Create a derived node. Starts dirty so the first demand always
    /// evaluates the constraint.
    pub(crate) fn derived(eager: bool) -> Self {
        Self {
            id: AttrId::next(),
            dirty: true,
            value: None,
            incoming: EdgeList::new(),
            outgoing: EdgeList::new(),
            demand_count: 0,
            recompute_count: 0,
            body: NodeBody::Derived {
                eager,
                constraint: None,
                on_change: None,
            },
        }
    }

    pub(crate) fn is_eager(&self) -> bool {
        matches!(self.body, NodeBody::Derived { eager: true, .. })
    }

    pub(crate) fn has_constraint(&self) -> bool {
        matches!(
            self.body,
            NodeBody::Derived {
                constraint: Some(_),
                ..
            }
        )
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("dirty", &self.dirty)
            .field("value", &self.value)
            .field("incoming", &self.incoming.len())
            .field("outgoing", &self.outgoing.len())
            .field("eager", &self.is_eager())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::value;

    #[test]
    fn attr_ids_are_unique() {
        let a = AttrId::next();
        let b = AttrId::next();
        let c = AttrId::next();

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn source_node_starts_clean_with_value() {
        let node = Node::source(value(1i64));
        assert!(!node.dirty);
        assert!(node.value.is_some());
        assert!(!node.is_eager());
        assert!(!node.has_constraint());
    }

    #[test]
    fn derived_node_starts_dirty_without_value() {
        let node = Node::derived(false);
        assert!(node.dirty);
        assert!(node.value.is_none());
        assert!(!node.has_constraint());
    }

    #[test]
    fn eager_flag_is_kind_specific() {
        assert!(Node::derived(true).is_eager());
        assert!(!Node::derived(false).is_eager());
        assert!(!Node::source(value(0i64)).is_eager());
    }
}
