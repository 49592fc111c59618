//! Usage-Error Taxonomy
//!
//! Every fallible graph operation reports one of these. They are all
//! caller mistakes; the engine has no fallible internal state.

use thiserror::Error;

use crate::graph::node::AttrId;

/// Errors returned by graph operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    /// `attach` on a node that already has a constraint.
    #[error("attribute {0} already has an attached constraint")]
    AlreadyAttached(AttrId),

    /// `detach` on a node with no constraint, or a demand that would need
    /// a constraint that is not there.
    #[error("attribute {0} has no attached constraint")]
    NotAttached(AttrId),

    /// `attach` whose inputs would make the node depend on itself.
    #[error("attaching a constraint to attribute {0} would create a cycle")]
    Cycle(AttrId),

    /// An id minted by a different graph, or never registered in this one.
    #[error("attribute {0} does not belong to this graph")]
    UnknownAttribute(AttrId),
}
