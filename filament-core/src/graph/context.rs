//! The Graph Context
//!
//! [`Graph`] owns the whole dataflow state: the node arena, the edge arena,
//! and the eager queue. There is no global state; independent graphs can
//! coexist in one process, each draining its own queue.
//!
//! # Propagation model
//!
//! Dirtying is push-based, evaluation is pull-based:
//!
//! 1. A mutation (`set`, `attach`) marks the touched node and every
//!    reachable descendant dirty, marking the traversed source's outgoing
//!    edges where a value actually changed.
//! 2. Eager nodes append themselves to the graph's queue as they go dirty.
//! 3. The mutating call drains the queue before returning, demanding each
//!    queued node for its side effects.
//! 4. `demand` recursively pulls a node's inputs, recomputes only when an
//!    incoming edge is marked (an input actually changed), and suppresses
//!    downstream marking when the recomputed value equals the old one.
//!
//! Step 4 is what keeps a diamond-shaped graph from recomputing its join
//! node when the intermediate values come out unchanged.
//!
//! # Ordering invariants
//!
//! - A node's dirty flag is cleared *before* its inputs are demanded. There
//!   is no third "being recomputed" state.
//! - A node marks its outgoing edges only when its stored value is actually
//!   replaced, and does so before the new value is returned upward.
//! - The dirty walk stops at already-dirty nodes: a dirty node's
//!   descendants are already dirty by induction.
//!
//! # Cycles
//!
//! `attach` rejects a constraint that would make the node an ancestor of
//! itself, so `demand`'s recursion is always bounded by graph depth.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::errors::GraphError;
use crate::graph::constraint::Constraint;
use crate::graph::edge::{Edge, EdgeId};
use crate::graph::node::{AttrId, DerivedId, Node, NodeBody, SourceId};
use crate::value::Value;

/// An incremental attribute dataflow graph.
///
/// # Example
///
/// ```rust,ignore
/// let mut graph = Graph::new();
/// let celsius = graph.add_source(value(20.0f64));
/// let fahrenheit = graph.add_derived();
/// graph.attach(fahrenheit, Constraint::new([celsius], |vals| {
///     let c = vals[0].downcast_ref::<f64>().copied().unwrap_or(0.0);
///     value(c * 9.0 / 5.0 + 32.0)
/// }))?;
///
/// assert_eq!(graph.demand(fahrenheit)?.downcast_ref::<f64>(), Some(&68.0));
/// ```
pub struct Graph {
    nodes: IndexMap<AttrId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    /// Eager nodes waiting to be demanded after the current mutation.
    eager_queue: VecDeque<AttrId>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            eager_queue: VecDeque::new(),
        }
    }

    /// Add a source attribute holding `initial`. Sources start clean.
    pub fn add_source(&mut self, initial: Value) -> SourceId {
        let node = Node::source(initial);
        let id = node.id;
        trace!(attr = %id, "new source attribute");
        self.nodes.insert(id, node);
        SourceId(id)
    }

    /// Add a derived attribute, recomputed only when demanded.
    pub fn add_derived(&mut self) -> DerivedId {
        self.add_derived_node(false)
    }

    /// Add an eager derived attribute, recomputed by the queue drain
    /// whenever anything upstream changes.
    pub fn add_eager(&mut self) -> DerivedId {
        self.add_derived_node(true)
    }

    fn add_derived_node(&mut self, eager: bool) -> DerivedId {
        let node = Node::derived(eager);
        let id = node.id;
        trace!(attr = %id, eager, "new derived attribute");
        self.nodes.insert(id, node);
        DerivedId(id)
    }

    /// Attach a constraint to a derived attribute.
    ///
    /// Creates one marked edge per declared input, dirties the node and its
    /// descendants, and drains the eager queue before returning; an eager
    /// node is therefore fully evaluated by the time this call returns.
    ///
    /// # Errors
    ///
    /// - [`GraphError::AlreadyAttached`] if the node has a constraint.
    /// - [`GraphError::Cycle`] if an input is the node itself or one of its
    ///   descendants. The graph is left unchanged.
    /// - [`GraphError::UnknownAttribute`] if the node or an input does not
    ///   belong to this graph.
    pub fn attach(&mut self, id: DerivedId, constraint: Constraint) -> Result<(), GraphError> {
        let dest: AttrId = id.into();
        {
            let node = self.node(dest)?;
            if !node.incoming.is_empty() || node.has_constraint() {
                return Err(GraphError::AlreadyAttached(dest));
            }
        }
        for &input in constraint.inputs() {
            self.node(input)?;
        }
        if constraint.inputs().contains(&dest) || self.reaches_any(dest, constraint.inputs()) {
            return Err(GraphError::Cycle(dest));
        }

        debug!(attr = %dest, inputs = constraint.inputs().len(), "attaching constraint");
        for &input in constraint.inputs() {
            let eid = EdgeId::next();
            self.edges.insert(eid, Edge::new(input, dest));
            self.nodes
                .get_mut(&input)
                .expect("input node validated above")
                .outgoing
                .push(eid);
            self.nodes
                .get_mut(&dest)
                .expect("node validated above")
                .incoming
                .push(eid);
        }
        if let NodeBody::Derived {
            constraint: slot, ..
        } = &mut self
            .nodes
            .get_mut(&dest)
            .expect("node validated above")
            .body
        {
            *slot = Some(constraint);
        }

        self.mark_dirty_from(dest);
        self.drain_eager();
        Ok(())
    }

    /// Detach the attribute's constraint, removing all of its incoming
    /// edges. The stored value is retained; a fresh constraint may be
    /// attached afterwards.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotAttached`] if no constraint is attached.
    pub fn detach(&mut self, id: DerivedId) -> Result<(), GraphError> {
        let dest: AttrId = id.into();
        if !self.node(dest)?.has_constraint() {
            return Err(GraphError::NotAttached(dest));
        }

        debug!(attr = %dest, "detaching constraint");
        let incoming = std::mem::take(
            &mut self
                .nodes
                .get_mut(&dest)
                .expect("node validated above")
                .incoming,
        );
        for eid in incoming {
            if let Some(edge) = self.edges.swap_remove(&eid) {
                if let Some(source) = self.nodes.get_mut(&edge.source) {
                    source.outgoing.retain(|e| *e != eid);
                }
            }
        }
        if let NodeBody::Derived { constraint, .. } = &mut self
            .nodes
            .get_mut(&dest)
            .expect("node validated above")
            .body
        {
            *constraint = None;
        }
        Ok(())
    }

    /// Replace a source attribute's value.
    ///
    /// Setting a value equal to the current one is a complete no-op: no
    /// dirtying, no recomputation, no queue activity. Otherwise the node's
    /// outgoing edges are marked, the node and all descendants go dirty,
    /// the value is stored, and the eager queue is drained.
    pub fn set(&mut self, id: SourceId, new_value: Value) -> Result<(), GraphError> {
        let aid: AttrId = id.into();
        let outgoing = {
            let node = self.node_mut(aid)?;
            if let Some(current) = &node.value {
                if current.equals(new_value.as_ref()) {
                    trace!(attr = %aid, "set is a no-op, value unchanged");
                    return Ok(());
                }
            }
            node.outgoing.clone()
        };

        trace!(attr = %aid, "source value changed");
        for eid in &outgoing {
            self.edges
                .get_mut(eid)
                .expect("edge arena out of sync")
                .mark();
        }
        self.mark_dirty_from(aid);
        self.nodes
            .get_mut(&aid)
            .expect("node validated above")
            .value = Some(new_value);
        self.drain_eager();
        Ok(())
    }

    /// Return the attribute's current, guaranteed-up-to-date value,
    /// recomputing lazily along the way.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotAttached`] when the value would have to come from a
    /// constraint that is not there; [`GraphError::UnknownAttribute`] for a
    /// foreign id.
    pub fn demand<I: Into<AttrId>>(&mut self, id: I) -> Result<Value, GraphError> {
        self.demand_inner(id.into())
    }

    fn demand_inner(&mut self, id: AttrId) -> Result<Value, GraphError> {
        let incoming = {
            let node = self.node_mut(id)?;
            node.demand_count += 1;
            if !node.dirty {
                // Fast path: value already confirmed current.
                return node.value.clone().ok_or(GraphError::NotAttached(id));
            }
            // Clear before recursing. The single clean/dirty state machine
            // has no "being recomputed" state.
            node.dirty = false;
            node.incoming.clone()
        };

        // Pull inputs in declaration order. A failed pull re-dirties this
        // node so the next demand retries instead of serving a stale value
        // from the fast path.
        let mut inputs: Vec<Value> = Vec::with_capacity(incoming.len());
        for eid in &incoming {
            let src = self.edges[eid].source;
            match self.demand_inner(src) {
                Ok(input) => inputs.push(input),
                Err(err) => {
                    self.nodes
                        .get_mut(&id)
                        .expect("node cannot vanish during demand")
                        .dirty = true;
                    return Err(err);
                }
            }
        }

        // Consume incoming marks; only an actually-changed input forces a
        // recomputation.
        let mut any_marked = false;
        for eid in &incoming {
            any_marked |= self
                .edges
                .get_mut(eid)
                .expect("edge arena out of sync")
                .consume_mark();
        }

        let node = self
            .nodes
            .get_mut(&id)
            .expect("node cannot vanish during demand");
        if !any_marked {
            if let Some(current) = &node.value {
                // Dirty, but nothing upstream actually changed along our
                // incoming edges.
                return Ok(current.clone());
            }
        }

        let new_value = match &node.body {
            NodeBody::Source => {
                // A dirty source was stored by `set`; nothing to recompute.
                return node.value.clone().ok_or(GraphError::NotAttached(id));
            }
            NodeBody::Derived { constraint, .. } => {
                let constraint = constraint.as_ref().ok_or(GraphError::NotAttached(id))?;
                node.recompute_count += 1;
                trace!(attr = %id, "recomputing");
                constraint.apply(&inputs)
            }
        };

        let changed = match &node.value {
            Some(prev) => !prev.equals(new_value.as_ref()),
            None => true,
        };
        if !changed {
            // Glitch avoidance: equal result, keep the old value and leave
            // downstream edges unmarked.
            return Ok(node
                .value
                .clone()
                .expect("unchanged result implies a prior value"));
        }

        node.value = Some(new_value.clone());
        if let NodeBody::Derived {
            on_change: Some(callback),
            ..
        } = &mut node.body
        {
            callback(&new_value);
        }
        let outgoing = node.outgoing.clone();
        for eid in &outgoing {
            self.edges
                .get_mut(eid)
                .expect("edge arena out of sync")
                .mark();
        }
        Ok(new_value)
    }

    /// Install the side-effect callback invoked whenever the attribute's
    /// stored value is replaced by a different one. Replaces any previous
    /// callback.
    pub fn set_on_change<F>(&mut self, id: DerivedId, callback: F) -> Result<(), GraphError>
    where
        F: FnMut(&Value) + 'static,
    {
        let aid: AttrId = id.into();
        let node = self.node_mut(aid)?;
        if let NodeBody::Derived { on_change, .. } = &mut node.body {
            *on_change = Some(Box::new(callback));
        }
        Ok(())
    }

    /// Remove the attribute's side-effect callback, if any.
    pub fn clear_on_change(&mut self, id: DerivedId) -> Result<(), GraphError> {
        let aid: AttrId = id.into();
        let node = self.node_mut(aid)?;
        if let NodeBody::Derived { on_change, .. } = &mut node.body {
            *on_change = None;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// How many times the attribute has been demanded.
    pub fn demand_count<I: Into<AttrId>>(&self, id: I) -> Result<u64, GraphError> {
        Ok(self.node(id.into())?.demand_count)
    }

    /// How many times the attribute's constraint has been evaluated.
    pub fn recompute_count<I: Into<AttrId>>(&self, id: I) -> Result<u64, GraphError> {
        Ok(self.node(id.into())?.recompute_count)
    }

    /// Whether the attribute's value is not yet confirmed current.
    pub fn is_dirty<I: Into<AttrId>>(&self, id: I) -> Result<bool, GraphError> {
        Ok(self.node(id.into())?.dirty)
    }

    /// The attribute's stored value, without demanding it.
    pub fn peek<I: Into<AttrId>>(&self, id: I) -> Result<Option<Value>, GraphError> {
        Ok(self.node(id.into())?.value.clone())
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn node(&self, id: AttrId) -> Result<&Node, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::UnknownAttribute(id))
    }

    fn node_mut(&mut self, id: AttrId) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(&id)
            .ok_or(GraphError::UnknownAttribute(id))
    }

    /// Mark `root` and every reachable descendant dirty, enqueueing eager
    /// nodes as they go dirty.
    ///
    /// The walk stops at already-dirty nodes ("dirty implies descendants
    /// dirty"), except for the root itself: an attach target starts life
    /// dirty and still needs its descendants walked and itself enqueued.
    fn mark_dirty_from(&mut self, root: AttrId) {
        let mut force_root = true;
        let mut stack: SmallVec<[AttrId; 8]> = SmallVec::new();
        stack.push(root);
        while let Some(id) = stack.pop() {
            let force = std::mem::take(&mut force_root);
            let (newly_dirty, eager, outgoing) = match self.nodes.get_mut(&id) {
                Some(node) if force || !node.dirty => {
                    let newly = !node.dirty;
                    node.dirty = true;
                    (newly, node.is_eager(), node.outgoing.clone())
                }
                _ => continue,
            };
            if eager && (newly_dirty || force) {
                trace!(attr = %id, "enqueueing eager attribute");
                self.eager_queue.push_back(id);
            }
            for eid in &outgoing {
                stack.push(self.edges[eid].dest);
            }
        }
    }

    /// Demand every queued eager node, discarding the values; the point is
    /// the side effects of their change callbacks.
    fn drain_eager(&mut self) {
        while let Some(id) = self.eager_queue.pop_front() {
            if let Err(err) = self.demand_inner(id) {
                warn!(attr = %id, error = %err, "eager evaluation failed");
            }
        }
    }

    /// Can `from` reach any of `targets` by following outgoing edges?
    fn reaches_any(&self, from: AttrId, targets: &[AttrId]) -> bool {
        let mut seen: HashSet<AttrId> = HashSet::new();
        let mut stack: SmallVec<[AttrId; 8]> = SmallVec::new();
        stack.push(from);
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if id != from && targets.contains(&id) {
                return true;
            }
            if let Some(node) = self.nodes.get(&id) {
                for eid in &node.outgoing {
                    stack.push(self.edges[eid].dest);
                }
            }
        }
        false
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("queued", &self.eager_queue.len())
            .finish()
    }
}
