//! UI Attribute Adapters
//!
//! The thin boundary layer between the dataflow graph and actual UI
//! elements. A [`Binding`] owns one eager graph attribute and writes its
//! value changes through to one element property via the [`UiElement`]
//! capability; the core graph stays unaware of elements entirely.

pub mod binding;
pub mod element;

pub use binding::{BindError, BindTarget, Binding};
pub use element::{ElementHandle, UiElement};
