//! Dynamically Typed Attribute Values
//!
//! Attributes hold values of arbitrary concrete types behind a single
//! object-safe capability, [`Equaler`]: debug formatting plus equality
//! against another value of any runtime type. Equality is what lets the
//! graph suppress propagation when a recomputation produces the same
//! value it already held.
//!
//! Any `T: PartialEq + Debug + 'static` is an `Equaler` via the blanket
//! impl, so callers wrap plain Rust types with [`value`] and read them
//! back with [`downcast_ref`](Equaler#method.downcast_ref).

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Capability every stored attribute value carries.
pub trait Equaler: fmt::Debug {
    /// The concrete value, for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// True when `other` holds the same concrete type and an equal value.
    /// Values of different concrete types are never equal.
    fn equals(&self, other: &dyn Equaler) -> bool;
}

impl<T: PartialEq + fmt::Debug + 'static> Equaler for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &dyn Equaler) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }
}

impl dyn Equaler {
    /// Borrow the concrete value, if it has type `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for dyn Equaler {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

/// A shared, immutable attribute value.
pub type Value = Rc<dyn Equaler>;

/// Wrap a concrete value for storage in the graph.
pub fn value<T: Equaler + 'static>(v: T) -> Value {
    Rc::new(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_of_the_same_type_compare_equal() {
        let a = value(42i64);
        let b = value(42i64);
        assert!(a.equals(b.as_ref()));
    }

    #[test]
    fn unequal_values_of_the_same_type_compare_unequal() {
        let a = value(String::from("x"));
        let b = value(String::from("y"));
        assert!(!a.equals(b.as_ref()));
    }

    #[test]
    fn values_of_different_types_are_never_equal() {
        let a = value(1i64);
        let b = value(1i32);
        assert!(!a.equals(b.as_ref()));
        assert!(!b.equals(a.as_ref()));
    }

    #[test]
    fn downcast_recovers_the_concrete_type() {
        let v = value(String::from("hello"));
        assert_eq!(v.downcast_ref::<String>().map(String::as_str), Some("hello"));
        assert!(v.downcast_ref::<i64>().is_none());
    }

    #[test]
    fn dyn_equality_goes_through_equals() {
        let a = value(true);
        let b = value(true);
        let c = value(false);
        assert!(*a == *b);
        assert!(*a != *c);
    }
}
