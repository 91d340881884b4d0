//! Configuration errors and validation failure reports

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Fatal setup errors, raised while building a [`crate::FormValidator`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Validator: Root element is not an Element.")]
    MissingRoot,

    #[error("Validator: No fields provided in config.")]
    NoFields,

    #[error("Validator: No fields found in root element. Did you add any validator attributes?")]
    NoDeclarativeFields,

    #[error("Validator: Submit button '{0}' is not an Element.")]
    SubmitButtonNotElement(String),

    #[error("Validator: callback {0} is not a function.")]
    MissingCallback(String),

    #[error("Validator: predicate {0} is not registered.")]
    MissingPredicate(String),

    #[error("Validator: invalid pattern '{pattern}' for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Validator: '{validator}' on field '{field}' requires option '{option}'")]
    MissingOption {
        field: String,
        validator: String,
        option: &'static str,
    },

    #[error("Validator: option '{option}' of '{validator}' on field '{field}' has invalid value {value}")]
    InvalidOption {
        field: String,
        validator: String,
        option: String,
        value: serde_json::Value,
    },

    #[error("Validator: validators for field '{field}' must be an object, got {value}")]
    InvalidFieldConfig {
        field: String,
        value: serde_json::Value,
    },
}

/// Rejection raised by an asynchronous custom predicate.
///
/// The controller treats a rejection as a failing validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("custom validator rejected: {0}")]
pub struct PredicateError(pub String);

impl PredicateError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// A single failing validator on a field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// Name of the validator that failed (e.g. `stringLength`)
    pub validator: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    pub fn new(
        field: impl Into<String>,
        validator: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            validator: validator.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Failing validators grouped by field name
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: BTreeMap<String, Vec<ValidationError>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single validation error
    pub fn add(&mut self, error: ValidationError) {
        self.errors
            .entry(error.field.clone())
            .or_default()
            .push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.values().all(Vec::is_empty)
    }

    /// Number of fields with at least one error
    pub fn len(&self) -> usize {
        self.errors.values().filter(|e| !e.is_empty()).count()
    }

    /// Total number of failing validators across all fields
    pub fn total_errors(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn get_field_errors(&self, field: &str) -> Option<&Vec<ValidationError>> {
        self.errors.get(field)
    }

    pub fn has_field_errors(&self, field: &str) -> bool {
        self.errors.get(field).is_some_and(|e| !e.is_empty())
    }

    /// Messages of a field in validator order
    pub fn messages(&self, field: &str) -> Vec<String> {
        self.errors
            .get(field)
            .map(|errors| errors.iter().map(|e| e.message.clone()).collect())
            .unwrap_or_default()
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, errors) in other.errors {
            self.errors.entry(field).or_default().extend(errors);
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": "validation_failed",
                "fields": self.errors
            }
        })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "No validation errors");
        }
        write!(f, "Validation failed for {} field(s):", self.len())?;
        for (field, errors) in &self.errors {
            for error in errors {
                write!(f, "\n  {}: {}", field, error.message)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_collection() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::new("bsb", "notEmpty", "You must enter a BSB"));
        errors.add(ValidationError::new("bsb", "numeric", "BSB must be numeric"));
        errors.add(ValidationError::new("password", "regexp", "Wrong password"));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.total_errors(), 3);
        assert!(errors.has_field_errors("bsb"));
        assert!(!errors.has_field_errors("email"));
        assert_eq!(
            errors.messages("bsb"),
            vec!["You must enter a BSB", "BSB must be numeric"]
        );
    }

    #[test]
    fn test_validation_errors_merge() {
        let mut first = ValidationErrors::new();
        first.add(ValidationError::new("a", "numeric", "one"));

        let mut second = ValidationErrors::new();
        second.add(ValidationError::new("a", "custom", "two"));
        second.add(ValidationError::new("b", "choice", "three"));

        first.merge(second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.get_field_errors("a").map(Vec::len), Some(2));
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::NoFields.to_string(),
            "Validator: No fields provided in config."
        );
        assert_eq!(
            ConfigError::MissingCallback("onBsb".into()).to_string(),
            "Validator: callback onBsb is not a function."
        );
    }

    #[test]
    fn test_errors_to_json() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::new("bsb", "numeric", "BSB must be numeric"));
        let json = errors.to_json();
        assert_eq!(json["error"]["fields"]["bsb"][0]["validator"], "numeric");
    }
}
