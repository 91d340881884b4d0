//! Non-empty value validator

use crate::error::PredicateError;
use crate::traits::{FieldValue, ValidationRule};
use crate::validators::ValidatorName;
use async_trait::async_trait;
use serde_json::Value;

/// Validator that passes when the value has content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotEmptyValidator {
    /// Ignore surrounding whitespace
    pub trim: bool,
    /// Custom error message
    pub message: Option<String>,
}

impl NotEmptyValidator {
    pub fn new() -> Self {
        Self::default()
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
        !value.is_empty()
    }
}

#[async_trait]
impl ValidationRule for NotEmptyValidator {
    async fn evaluate(&self, value: &FieldValue) -> Result<bool, PredicateError> {
        Ok(self.check(value.as_text()))
    }

    fn rule_name(&self) -> ValidatorName {
        ValidatorName::NotEmpty
    }

    fn error_message(&self, field: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("{} must not be empty", field))
    }

    fn parameters(&self) -> Option<Value> {
        Some(serde_json::json!({
            "trim": self.trim,
            "message": self.message,
        }))
    }
}
