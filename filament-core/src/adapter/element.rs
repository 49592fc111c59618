//! External Element Capability
//!
//! The boundary the binding layer writes through. A [`UiElement`] is
//! whatever the host supplies: a real DOM element behind an FFI shim, or an
//! in-memory stand-in when driving the engine without a UI. The core graph
//! never calls any of this; only bindings do.
//!
//! All methods take `&self`; implementations are expected to use interior
//! mutability, since one element handle is shared between bindings and the
//! host.

use std::rc::Rc;

/// Read/write access to one UI element's bindable surface.
pub trait UiElement {
    /// Read a named style property, if set.
    fn style(&self, name: &str) -> Option<String>;

    /// Write a named style property.
    fn set_style(&self, name: &str, value: &str);

    /// Read the element's text content.
    fn text(&self) -> String;

    /// Replace the element's text content.
    fn set_text(&self, text: &str);

    /// Test CSS class membership.
    fn has_class(&self, name: &str) -> bool;

    /// Add a CSS class (no-op when already present).
    fn add_class(&self, name: &str);

    /// Remove a CSS class (no-op when absent).
    fn remove_class(&self, name: &str);

    /// Read the element's form value.
    fn form_value(&self) -> String;

    /// Write the element's form value.
    fn set_form_value(&self, value: &str);

    /// Register a handler for a named UI event.
    fn on_event(&self, name: &str, handler: Box<dyn FnMut()>);

    /// Fire a named UI event, invoking registered handlers.
    fn trigger(&self, name: &str);
}

/// Shared handle to an element; bindings and the host hold clones.
pub type ElementHandle = Rc<dyn UiElement>;
