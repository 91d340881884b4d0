//! String length validator

use crate::error::PredicateError;
use crate::traits::{FieldValue, ValidationRule};
use crate::validators::ValidatorName;
use async_trait::async_trait;
use serde_json::Value;

/// Validator for inclusive length bounds on a text value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringLengthValidator {
    /// Minimum length (inclusive)
    pub min: Option<usize>,
    /// Maximum length (inclusive)
    pub max: Option<usize>,
    /// Ignore surrounding whitespace
    pub trim: bool,
    /// Custom error message
    pub message: Option<String>,
}

impl StringLengthValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    pub fn range(self, min: usize, max: usize) -> Self {
        self.min(min).max(max)
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn check(&self, value: &str) -> bool {
        let value = if self.trim { value.trim() } else { value };
        // Unicode-aware length
        let length = value.chars().count();
        self.min.map_or(true, |min| length >= min) && self.max.map_or(true, |max| length <= max)
    }
}

#[async_trait]
impl ValidationRule for StringLengthValidator {
    async fn evaluate(&self, value: &FieldValue) -> Result<bool, PredicateError> {
        Ok(self.check(value.as_text()))
    }

    fn rule_name(&self) -> ValidatorName {
        ValidatorName::StringLength
    }

    fn error_message(&self, field: &str) -> String {
        if let Some(ref message) = self.message {
            return message.clone();
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => {
                format!("{} must be exactly {} characters long", field, min)
            }
            (Some(min), Some(max)) => {
                format!("{} must be between {} and {} characters long", field, min, max)
            }
            (Some(min), None) => format!("{} must be at least {} characters long", field, min),
            (None, Some(max)) => format!("{} must be at most {} characters long", field, max),
            (None, None) => format!("{} has an invalid length", field),
        }
    }

    fn parameters(&self) -> Option<Value> {
        Some(serde_json::json!({
            "min": self.min,
            "max": self.max,
            "trim": self.trim,
            "message": self.message,
        }))
    }
}
