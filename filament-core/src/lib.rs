//! Filament Core
//!
//! An incremental attribute dataflow engine: a spreadsheet-style
//! dependency/recalculation graph used to bind computed values to UI
//! element properties (text, style, CSS class membership, form value)
//! without manual re-rendering.
//!
//! # Architecture
//!
//! The crate is organized into a few modules:
//!
//! - `value`: the `Equaler` capability every stored value carries
//! - `graph`: nodes, marked edges, constraints, and the `Graph` context
//! - `adapter`: bindings from graph attributes to UI element properties
//! - `errors`: the usage-error taxonomy
//!
//! # Model
//!
//! Source attributes are set directly; derived attributes are computed by
//! a constraint over an ordered list of inputs. Setting a source marks
//! everything downstream dirty, then drains the graph's eager queue so
//! that eager attributes (the ones driving UI properties) recompute and
//! push their side effects before the call returns. Everything else is
//! recomputed lazily on demand, and propagation stops at the first node
//! whose recomputed value equals the one it already held.
//!
//! # Example
//!
//! ```rust,ignore
//! use filament_core::{Constraint, Graph, value};
//!
//! let mut graph = Graph::new();
//! let name = graph.add_source(value(String::from("ada")));
//!
//! let shouted = graph.add_derived();
//! graph.attach(shouted, Constraint::new([name], |vals| {
//!     let s = vals[0].downcast_ref::<String>().cloned().unwrap_or_default();
//!     value(s.to_uppercase())
//! }))?;
//!
//! assert_eq!(
//!     graph.demand(shouted)?.downcast_ref::<String>().map(String::as_str),
//!     Some("ADA"),
//! );
//! ```
//!
//! The engine is single-threaded and synchronous; all propagation caused
//! by a mutation completes before the mutating call returns.

pub mod adapter;
pub mod errors;
pub mod graph;
pub mod value;

pub use adapter::{BindError, BindTarget, Binding, ElementHandle, UiElement};
pub use errors::GraphError;
pub use graph::{AttrId, Constraint, DerivedId, Graph, SourceId};
pub use value::{value, Equaler, Value};
