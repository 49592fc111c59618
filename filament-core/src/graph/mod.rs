//! Attribute Dataflow Graph
//!
//! This module implements the incremental dependency graph: attribute
//! nodes, the marked edges between them, the constraints that compute
//! derived attributes, and the [`Graph`] context that owns it all.
//!
//! Mutating a source pushes dirty flags downstream; reading a value pulls
//! recomputation upstream, and only as far as something actually changed.

pub mod constraint;
pub mod context;
pub mod edge;
pub mod node;

pub use constraint::Constraint;
pub use context::Graph;
pub use edge::EdgeId;
pub use node::{AttrId, DerivedId, SourceId};
