//! Attribute Bindings
//!
//! A [`Binding`] connects one eager graph attribute to one property of a UI
//! element: named style, text content, CSS class membership, or form value.
//! Binding a constraint installs a write-through change callback, so every
//! upstream change that actually alters the computed value lands on the
//! element before the mutating call returns, with no manual demand needed.
//!
//! The binding keeps its own bound/unbound state, independent of the
//! graph's edge-count check, to catch double-bind and double-unbind at this
//! layer with its own error type.

use std::rc::Rc;

use thiserror::Error;
use tracing::warn;

use crate::adapter::element::{ElementHandle, UiElement};
use crate::errors::GraphError;
use crate::graph::{Constraint, DerivedId, Graph};
use crate::value::{value, Value};

/// Errors raised by the binding layer's own bind/unbind discipline.
#[derive(Debug, Error)]
pub enum BindError {
    /// `bind` was called while a constraint is already bound.
    #[error("a constraint is already bound to this binding")]
    AlreadyBound,

    /// `unbind` was called with nothing bound.
    #[error("no constraint is bound to this binding")]
    NotBound,

    /// The underlying graph operation failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Which element property the binding drives.
#[derive(Debug, Clone)]
pub enum BindTarget {
    /// A named style property; expects `String` values.
    Style(String),
    /// The element's text content; expects `String` values.
    Text,
    /// Membership of a named CSS class; expects `bool` values.
    Class(String),
    /// The element's form value; expects `String` values.
    FormValue,
}

impl BindTarget {
    /// Push a computed value out to the element.
    ///
    /// A value of the wrong type for the target is logged and skipped; the
    /// element keeps its previous state.
    fn write(&self, element: &dyn UiElement, value: &Value) {
        match self {
            BindTarget::Style(name) => match as_text(value) {
                Some(text) => element.set_style(name, text),
                None => warn!(target_property = %name, ?value, "non-string value for style binding"),
            },
            BindTarget::Text => match as_text(value) {
                Some(text) => element.set_text(text),
                None => warn!(?value, "non-string value for text binding"),
            },
            BindTarget::Class(name) => match value.downcast_ref::<bool>() {
                Some(true) => element.add_class(name),
                Some(false) => element.remove_class(name),
                None => warn!(class = %name, ?value, "non-bool value for class binding"),
            },
            BindTarget::FormValue => match as_text(value) {
                Some(text) => element.set_form_value(text),
                None => warn!(?value, "non-string value for form value binding"),
            },
        }
    }

    /// Read the element's present state for this target.
    fn read(&self, element: &dyn UiElement) -> Value {
        match self {
            BindTarget::Style(name) => value(element.style(name).unwrap_or_default()),
            BindTarget::Text => value(element.text()),
            BindTarget::Class(name) => value(element.has_class(name)),
            BindTarget::FormValue => value(element.form_value()),
        }
    }
}

/// Accept both owned and static string payloads.
fn as_text(value: &Value) -> Option<&str> {
    value
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| value.downcast_ref::<&str>().copied())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindState {
    Unbound,
    Bound,
}

/// One eager attribute wired to one element property.
pub struct Binding {
    node: DerivedId,
    element: ElementHandle,
    target: BindTarget,
    state: BindState,
}

impl Binding {
    /// Create a binding for a named style property.
    pub fn style(graph: &mut Graph, element: ElementHandle, property: impl Into<String>) -> Self {
        Self::new(graph, element, BindTarget::Style(property.into()))
    }

    /// Create a binding for the element's text content.
    pub fn text(graph: &mut Graph, element: ElementHandle) -> Self {
        Self::new(graph, element, BindTarget::Text)
    }

    /// Create a binding for membership of a named CSS class.
    pub fn class(graph: &mut Graph, element: ElementHandle, class: impl Into<String>) -> Self {
        Self::new(graph, element, BindTarget::Class(class.into()))
    }

    /// Create a binding for the element's form value.
    pub fn form_value(graph: &mut Graph, element: ElementHandle) -> Self {
        Self::new(graph, element, BindTarget::FormValue)
    }

    fn new(graph: &mut Graph, element: ElementHandle, target: BindTarget) -> Self {
        Self {
            node: graph.add_eager(),
            element,
            target,
            state: BindState::Unbound,
        }
    }

    /// The binding's graph attribute, usable as a constraint input.
    pub fn node(&self) -> DerivedId {
        self.node
    }

    /// Attach `constraint` and start writing value changes through to the
    /// element. The initial computed value reaches the element before this
    /// returns.
    pub fn bind(&mut self, graph: &mut Graph, constraint: Constraint) -> Result<(), BindError> {
        if self.state == BindState::Bound {
            return Err(BindError::AlreadyBound);
        }
        let element = Rc::clone(&self.element);
        let target = self.target.clone();
        graph.set_on_change(self.node, move |value| {
            target.write(element.as_ref(), value);
        })?;
        if let Err(err) = graph.attach(self.node, constraint) {
            graph.clear_on_change(self.node).ok();
            return Err(err.into());
        }
        self.state = BindState::Bound;
        Ok(())
    }

    /// Detach the constraint and stop writing to the element. The element
    /// keeps whatever state it last received.
    pub fn unbind(&mut self, graph: &mut Graph) -> Result<(), BindError> {
        if self.state == BindState::Unbound {
            return Err(BindError::NotBound);
        }
        graph.detach(self.node)?;
        graph.clear_on_change(self.node)?;
        self.state = BindState::Unbound;
        Ok(())
    }

    /// Read the element's present state for the bound target.
    pub fn current(&self) -> Value {
        self.target.read(self.element.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::value::value;

    #[derive(Default)]
    struct TestElement {
        styles: RefCell<HashMap<String, String>>,
        text: RefCell<String>,
        classes: RefCell<HashSet<String>>,
        form_value: RefCell<String>,
    }

    impl UiElement for TestElement {
        fn style(&self, name: &str) -> Option<String> {
            self.styles.borrow().get(name).cloned()
        }

        fn set_style(&self, name: &str, value: &str) {
            self.styles
                .borrow_mut()
                .insert(name.to_string(), value.to_string());
        }

        fn text(&self) -> String {
            self.text.borrow().clone()
        }

        fn set_text(&self, text: &str) {
            *self.text.borrow_mut() = text.to_string();
        }

        fn has_class(&self, name: &str) -> bool {
            self.classes.borrow().contains(name)
        }

        fn add_class(&self, name: &str) {
            self.classes.borrow_mut().insert(name.to_string());
        }

        fn remove_class(&self, name: &str) {
            self.classes.borrow_mut().remove(name);
        }

        fn form_value(&self) -> String {
            self.form_value.borrow().clone()
        }

        fn set_form_value(&self, value: &str) {
            *self.form_value.borrow_mut() = value.to_string();
        }

        fn on_event(&self, _name: &str, _handler: Box<dyn FnMut()>) {}

        fn trigger(&self, _name: &str) {}
    }

    fn element() -> (Rc<TestElement>, ElementHandle) {
        let element = Rc::new(TestElement::default());
        let handle: ElementHandle = element.clone();
        (element, handle)
    }

    #[test]
    fn text_binding_writes_through() {
        let mut graph = Graph::new();
        let (el, handle) = element();
        let name = graph.add_source(value(String::from("ada")));

        let mut binding = Binding::text(&mut graph, handle);
        binding
            .bind(
                &mut graph,
                Constraint::new([name], |vals| {
                    let n = vals[0].downcast_ref::<String>().cloned().unwrap_or_default();
                    value(format!("hello, {n}"))
                }),
            )
            .unwrap();

        // Bound eagerly: the initial value is already on the element.
        assert_eq!(el.text(), "hello, ada");

        graph.set(name, value(String::from("grace"))).unwrap();
        assert_eq!(el.text(), "hello, grace");
    }

    #[test]
    fn class_binding_tracks_a_bool() {
        let mut graph = Graph::new();
        let (el, handle) = element();
        let visible = graph.add_source(value(true));

        let mut binding = Binding::class(&mut graph, handle, "hidden");
        binding
            .bind(
                &mut graph,
                Constraint::new([visible], |vals| {
                    value(!vals[0].downcast_ref::<bool>().copied().unwrap_or(false))
                }),
            )
            .unwrap();

        assert!(!el.has_class("hidden"));

        graph.set(visible, value(false)).unwrap();
        assert!(el.has_class("hidden"));

        graph.set(visible, value(true)).unwrap();
        assert!(!el.has_class("hidden"));
    }

    #[test]
    fn style_and_form_value_bindings() {
        let mut graph = Graph::new();
        let (el, handle) = element();
        let color = graph.add_source(value(String::from("red")));

        let mut style = Binding::style(&mut graph, Rc::clone(&handle), "color");
        style
            .bind(&mut graph, Constraint::new([color], |vals| vals[0].clone()))
            .unwrap();
        assert_eq!(el.style("color").as_deref(), Some("red"));

        let mut form = Binding::form_value(&mut graph, handle);
        form.bind(&mut graph, Constraint::new([color], |vals| vals[0].clone()))
            .unwrap();
        assert_eq!(el.form_value(), "red");

        graph.set(color, value(String::from("blue"))).unwrap();
        assert_eq!(el.style("color").as_deref(), Some("blue"));
        assert_eq!(el.form_value(), "blue");
    }

    #[test]
    fn double_bind_is_rejected() {
        let mut graph = Graph::new();
        let (_el, handle) = element();
        let s = graph.add_source(value(String::from("x")));

        let mut binding = Binding::text(&mut graph, handle);
        binding
            .bind(&mut graph, Constraint::new([s], |vals| vals[0].clone()))
            .unwrap();

        let err = binding
            .bind(&mut graph, Constraint::new([s], |vals| vals[0].clone()))
            .unwrap_err();
        assert!(matches!(err, BindError::AlreadyBound));
    }

    #[test]
    fn unbind_without_bind_is_rejected() {
        let mut graph = Graph::new();
        let (_el, handle) = element();
        let mut binding = Binding::text(&mut graph, handle);

        let err = binding.unbind(&mut graph).unwrap_err();
        assert!(matches!(err, BindError::NotBound));
    }

    #[test]
    fn unbind_stops_write_through_and_allows_rebind() {
        let mut graph = Graph::new();
        let (el, handle) = element();
        let s = graph.add_source(value(String::from("one")));

        let mut binding = Binding::text(&mut graph, handle);
        binding
            .bind(&mut graph, Constraint::new([s], |vals| vals[0].clone()))
            .unwrap();
        assert_eq!(el.text(), "one");

        binding.unbind(&mut graph).unwrap();
        graph.set(s, value(String::from("two"))).unwrap();
        assert_eq!(el.text(), "one");

        binding
            .bind(&mut graph, Constraint::new([s], |vals| vals[0].clone()))
            .unwrap();
        assert_eq!(el.text(), "two");
    }

    #[test]
    fn failed_bind_leaves_binding_unbound() {
        let mut graph = Graph::new();
        let (_el, handle) = element();
        let mut binding = Binding::text(&mut graph, handle);

        // A self-referential constraint is rejected by the graph.
        let err = binding
            .bind(
                &mut graph,
                Constraint::new([binding.node()], |vals| vals[0].clone()),
            )
            .unwrap_err();
        assert!(matches!(err, BindError::Graph(GraphError::Cycle(_))));

        // The binding can still be bound properly afterwards.
        let s = graph.add_source(value(String::from("ok")));
        binding
            .bind(&mut graph, Constraint::new([s], |vals| vals[0].clone()))
            .unwrap();
    }

    #[test]
    fn current_reads_element_state() {
        let mut graph = Graph::new();
        let (el, handle) = element();
        el.set_text("preexisting");

        let binding = Binding::text(&mut graph, handle);
        assert_eq!(
            binding.current().downcast_ref::<String>().map(String::as_str),
            Some("preexisting")
        );
    }

    #[test]
    fn wrong_typed_value_is_skipped() {
        let mut graph = Graph::new();
        let (el, handle) = element();
        el.set_text("unchanged");
        let flag = graph.add_source(value(true));

        let mut binding = Binding::text(&mut graph, handle);
        binding
            .bind(&mut graph, Constraint::new([flag], |vals| vals[0].clone()))
            .unwrap();

        // A bool reached a text target: logged and skipped.
        assert_eq!(el.text(), "unchanged");
    }
}
