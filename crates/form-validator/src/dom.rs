//! Form container abstraction
//!
//! The validator never touches a real document. It reads fields through the
//! [`FormContainer`] trait, which a browser binding or a test double
//! implements. [`MemoryForm`] is the in-memory implementation shipped with the
//! crate.

use std::collections::BTreeSet;

use parking_lot::RwLock;

/// Kind of a form control, as far as validation cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Text,
    Radio,
    Checkbox,
    Select,
}

impl InputKind {
    /// Map an `<input type>` attribute onto a kind. Unknown types are text.
    pub fn from_type_attr(input_type: &str) -> Self {
        match input_type.to_ascii_lowercase().as_str() {
            "radio" => InputKind::Radio,
            "checkbox" => InputKind::Checkbox,
            "select" | "select-one" | "select-multiple" => InputKind::Select,
            _ => InputKind::Text,
        }
    }

    /// Radio and checkbox controls form groups sharing a name
    pub fn is_choice(self) -> bool {
        matches!(self, InputKind::Radio | InputKind::Checkbox)
    }
}

/// Snapshot of a named form control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldElement {
    pub name: String,
    pub kind: InputKind,
    pub value: String,
    pub checked: bool,
    /// Raw attributes in document order, names lower-cased like HTML does
    pub attributes: Vec<(String, String)>,
}

impl FieldElement {
    pub fn new(name: impl Into<String>, kind: InputKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: String::new(),
            checked: false,
            attributes: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, InputKind::Text).with_value(value)
    }

    pub fn radio(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, InputKind::Radio).with_value(value)
    }

    pub fn checkbox(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, InputKind::Checkbox).with_value(value)
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .push((name.into().to_ascii_lowercase(), value.into()));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The root element holding every control under validation
pub trait FormContainer: Send + Sync {
    /// All named controls (inputs and selects) in document order
    fn elements(&self) -> Vec<FieldElement>;

    /// Whether an element with this id exists under the root
    fn contains_element(&self, id: &str) -> bool;

    /// Every control sharing `name`, in document order
    fn elements_named(&self, name: &str) -> Vec<FieldElement> {
        self.elements()
            .into_iter()
            .filter(|element| element.name == name)
            .collect()
    }

    /// First control named `name`
    fn first_named(&self, name: &str) -> Option<FieldElement> {
        self.elements_named(name).into_iter().next()
    }
}

/// In-memory form, mutable through shared references
#[derive(Debug, Default)]
pub struct MemoryForm {
    elements: RwLock<Vec<FieldElement>>,
    element_ids: RwLock<BTreeSet<String>>,
}

impl MemoryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(self, element: FieldElement) -> Self {
        self.elements.write().push(element);
        self
    }

    /// Register a non-field element, such as a submit button
    pub fn with_button(self, id: impl Into<String>) -> Self {
        self.element_ids.write().insert(id.into());
        self
    }

    /// Set the value of every control named `name`. Returns how many matched.
    pub fn set_value(&self, name: &str, value: impl Into<String>) -> usize {
        let value = value.into();
        let mut elements = self.elements.write();
        let mut matched = 0;
        for element in elements.iter_mut().filter(|e| e.name == name) {
            element.value = value.clone();
            matched += 1;
        }
        matched
    }

    /// Check or uncheck the control of group `name` carrying `value`
    pub fn set_checked(&self, name: &str, value: &str, checked: bool) -> bool {
        let mut elements = self.elements.write();
        let is_radio = elements
            .iter()
            .any(|e| e.name == name && e.kind == InputKind::Radio);
        let mut found = false;
        for element in elements.iter_mut().filter(|e| e.name == name) {
            if element.value == value {
                element.checked = checked;
                found = true;
            } else if is_radio && checked {
                element.checked = false;
            }
        }
        found
    }
}

impl FormContainer for MemoryForm {
    fn elements(&self) -> Vec<FieldElement> {
        self.elements.read().clone()
    }

    fn contains_element(&self, id: &str) -> bool {
        self.element_ids.read().contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kind_from_type() {
        assert_eq!(InputKind::from_type_attr("CHECKBOX"), InputKind::Checkbox);
        assert_eq!(InputKind::from_type_attr("password"), InputKind::Text);
        assert!(InputKind::Radio.is_choice());
        assert!(!InputKind::Select.is_choice());
    }

    #[test]
    fn test_memory_form_group_updates() {
        let form = MemoryForm::new()
            .with_element(FieldElement::radio("plan", "basic"))
            .with_element(FieldElement::radio("plan", "pro"))
            .with_element(FieldElement::text("bsb", ""));

        assert!(form.set_checked("plan", "basic", true));
        assert!(form.set_checked("plan", "pro", true));
        let checked: Vec<_> = form
            .elements_named("plan")
            .into_iter()
            .filter(|e| e.checked)
            .map(|e| e.value)
            .collect();
        assert_eq!(checked, vec!["pro"]);

        assert_eq!(form.set_value("bsb", "123456"), 1);
        assert_eq!(form.first_named("bsb").map(|e| e.value), Some("123456".into()));
        assert_eq!(form.set_value("missing", "x"), 0);
    }

    #[test]
    fn test_attribute_lookup_is_case_insensitive() {
        let element = FieldElement::text("bsb", "").with_attribute("VR-NotEmpty", "true");
        assert_eq!(element.attribute("vr-notempty"), Some("true"));
        assert_eq!(element.attributes[0].0, "vr-notempty");
    }

    #[test]
    fn test_buttons_are_elements() {
        let form = MemoryForm::new().with_button("submit");
        assert!(form.contains_element("submit"));
        assert!(!form.contains_element("cancel"));
    }
}
