//! Graph Edges
//!
//! A directed link from a source attribute to the derived attribute that
//! consumes it, carrying one bit of transient state: has the source's value
//! actually changed (not merely gone dirty) since the destination last
//! looked at this edge.
//!
//! Edges are born marked, so a freshly attached constraint always performs
//! at least one real evaluation. The destination consumes the mark when it
//! examines the edge during demand; a recomputation that changes a node's
//! value re-marks that node's outgoing edges.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::graph::node::AttrId;

/// Unique identifier for an edge in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(u64);

impl EdgeId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// An ordered (source, destination) pair plus the changed bit.
#[derive(Debug)]
pub(crate) struct Edge {
    pub(crate) source: AttrId,
    pub(crate) dest: AttrId,
    marked: bool,
}

impl Edge {
    /// New edges start marked so the destination's first evaluation runs.
    pub(crate) fn new(source: AttrId, dest: AttrId) -> Self {
        Self {
            source,
            dest,
            marked: true,
        }
    }

    /// Record that the source's value actually changed.
    pub(crate) fn mark(&mut self) {
        self.marked = true;
    }

    /// Read and clear the changed bit.
    pub(crate) fn consume_mark(&mut self) -> bool {
        std::mem::take(&mut self.marked)
    }

    #[cfg(test)]
    pub(crate) fn is_marked(&self) -> bool {
        self.marked
    }
}
