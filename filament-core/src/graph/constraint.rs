//! Constraints
//!
//! A constraint is a pure function over a fixed ordered list of input
//! attributes, producing one output value. The declaration order of the
//! inputs is the order of the value slice handed to the function, and the
//! order in which the inputs are demanded during evaluation.

use std::fmt;

use crate::graph::node::AttrId;
use crate::value::Value;

/// The computation attached to a derived attribute.
pub struct Constraint {
    inputs: Vec<AttrId>,
    func: Box<dyn Fn(&[Value]) -> Value>,
}

impl Constraint {
    /// Build a constraint from its inputs and computation.
    ///
    /// Inputs may be source or derived handles; both convert into
    /// [`AttrId`]. The function must be pure over the given values.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let upper = Constraint::new([name], |vals| {
    ///     let s = vals[0].downcast_ref::<String>().cloned().unwrap_or_default();
    ///     value(s.to_uppercase())
    /// });
    /// ```
    pub fn new<I, T, F>(inputs: I, func: F) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<AttrId>,
        F: Fn(&[Value]) -> Value + 'static,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            func: Box::new(func),
        }
    }

    /// The ordered list of input attributes.
    pub fn inputs(&self) -> &[AttrId] {
        &self.inputs
    }

    /// Apply the constraint function to freshly demanded input values.
    ///
    /// `values` must be in declaration order and the same length as
    /// [`Constraint::inputs`].
    pub(crate) fn apply(&self, values: &[Value]) -> Value {
        debug_assert_eq!(values.len(), self.inputs.len());
        (self.func)(values)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::value;

    #[test]
    fn preserves_input_order() {
        let a = AttrId::next();
        let b = AttrId::next();
        let constraint = Constraint::new([a, b], |vals| vals[0].clone());

        assert_eq!(constraint.inputs(), &[a, b]);
    }

    #[test]
    fn applies_function_to_values() {
        let a = AttrId::next();
        let b = AttrId::next();
        let sum = Constraint::new([a, b], |vals| {
            let x = vals[0].downcast_ref::<i64>().copied().unwrap_or(0);
            let y = vals[1].downcast_ref::<i64>().copied().unwrap_or(0);
            value(x + y)
        });

        let out = sum.apply(&[value(2i64), value(3i64)]);
        assert_eq!(out.downcast_ref::<i64>(), Some(&5));
    }

    #[test]
    fn zero_input_constraint_is_allowed() {
        let constant = Constraint::new(Vec::<AttrId>::new(), |_| value(7i64));
        let out = constant.apply(&[]);
        assert_eq!(out.downcast_ref::<i64>(), Some(&7));
    }
}
