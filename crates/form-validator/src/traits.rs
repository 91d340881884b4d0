//! Core validation traits

use crate::dom::FieldElement;
use crate::error::PredicateError;
use crate::validators::ValidatorName;
use async_trait::async_trait;
use serde_json::Value;

/// The value a validator inspects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Value of a single control
    Text(String),
    /// Every control of a radio/checkbox group
    Group(Vec<FieldElement>),
}

impl FieldValue {
    /// Build the value of a field from its controls.
    ///
    /// Choice validators get the whole group. Text validators on a group see
    /// the first checked control's value, or an empty string.
    pub fn from_elements(elements: Vec<FieldElement>, group: bool) -> Self {
        if group {
            return FieldValue::Group(elements);
        }
        let text = match elements.first() {
            Some(first) if first.kind.is_choice() => elements
                .iter()
                .find(|e| e.checked)
                .map(|e| e.value.clone())
                .unwrap_or_default(),
            Some(first) => first.value.clone(),
            None => String::new(),
        };
        FieldValue::Text(text)
    }

    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(text) => text,
            FieldValue::Group(elements) => elements
                .iter()
                .find(|e| e.checked)
                .map(|e| e.value.as_str())
                .unwrap_or(""),
        }
    }

    /// Number of checked controls; a text value counts as one when non-empty
    pub fn checked_count(&self) -> usize {
        match self {
            FieldValue::Text(text) => usize::from(!text.is_empty()),
            FieldValue::Group(elements) => elements.iter().filter(|e| e.checked).count(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Contract shared by every validator
#[async_trait]
pub trait ValidationRule: Send + Sync {
    /// Decide whether `value` passes. `Err` is only produced by custom
    /// predicates that reject.
    async fn evaluate(&self, value: &FieldValue) -> Result<bool, PredicateError>;

    /// Registry name of the rule
    fn rule_name(&self) -> ValidatorName;

    /// Error message for `field` when the rule fails
    fn error_message(&self, field: &str) -> String;

    /// Whether the rule needs the full element group
    fn needs_group(&self) -> bool {
        false
    }

    /// Rule options as JSON
    fn parameters(&self) -> Option<Value> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::InputKind;

    #[test]
    fn test_text_value_from_single_input() {
        let value = FieldValue::from_elements(vec![FieldElement::text("bsb", "123")], false);
        assert_eq!(value, FieldValue::Text("123".into()));
        assert_eq!(value.checked_count(), 1);
    }

    #[test]
    fn test_text_value_from_radio_group_uses_checked() {
        let elements = vec![
            FieldElement::radio("plan", "basic"),
            FieldElement::radio("plan", "pro").with_checked(true),
        ];
        let value = FieldValue::from_elements(elements.clone(), false);
        assert_eq!(value.as_text(), "pro");

        let unchecked = vec![FieldElement::new("plan", InputKind::Radio).with_value("basic")];
        assert_eq!(FieldValue::from_elements(unchecked, false).as_text(), "");
    }

    #[test]
    fn test_group_value_counts_checked() {
        let elements = vec![
            FieldElement::checkbox("tags", "a").with_checked(true),
            FieldElement::checkbox("tags", "b"),
            FieldElement::checkbox("tags", "c").with_checked(true),
        ];
        let value = FieldValue::from_elements(elements, true);
        assert_eq!(value.checked_count(), 2);
        assert_eq!(value.as_text(), "a");
    }

    #[test]
    fn test_missing_field_is_empty_text() {
        assert_eq!(FieldValue::from_elements(vec![], false), FieldValue::Text(String::new()));
    }
}
