//! Digits-only validator

use crate::error::PredicateError;
use crate::traits::{FieldValue, ValidationRule};
use crate::validators::ValidatorName;
use async_trait::async_trait;
use serde_json::Value;

/// Validator that passes when the value is one or more ASCII digits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumericValidator {
    /// Custom error message
    pub message: Option<String>,
}

impl NumericValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn check(&self, value: &str) -> bool {
        !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
    }
}

#[async_trait]
impl ValidationRule for NumericValidator {
    async fn evaluate(&self, value: &FieldValue) -> Result<bool, PredicateError> {
        Ok(self.check(value.as_text()))
    }

    fn rule_name(&self) -> ValidatorName {
        ValidatorName::Numeric
    }

    fn error_message(&self, field: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("{} must be numeric", field))
    }

    fn parameters(&self) -> Option<Value> {
        Some(serde_json::json!({ "message": self.message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_digits_only() {
        let validator = NumericValidator::new();
        assert_eq!(validator.evaluate(&"062000".into()).await, Ok(true));
        assert_eq!(validator.evaluate(&"06-2000".into()).await, Ok(false));
        assert_eq!(validator.evaluate(&"".into()).await, Ok(false));
    }

    #[test]
    fn test_signs_decimals_and_non_ascii_digits_fail() {
        let validator = NumericValidator::new();
        assert!(!validator.check("-1"));
        assert!(!validator.check("1.5"));
        assert!(!validator.check(" 12"));
        assert!(!validator.check("١٢٣"));
    }
}
