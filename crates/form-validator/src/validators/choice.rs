//! Radio/checkbox selection count validator

use crate::error::PredicateError;
use crate::traits::{FieldValue, ValidationRule};
use crate::validators::ValidatorName;
use async_trait::async_trait;
use serde_json::Value;

/// Validator for the number of checked controls in a group.
///
/// A bound of zero is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceValidator {
    /// Minimum checked controls (inclusive)
    pub min: Option<usize>,
    /// Maximum checked controls (inclusive)
    pub max: Option<usize>,
    /// Custom error message
    pub message: Option<String>,
}

impl ChoiceValidator {
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

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn check(&self, checked: usize) -> bool {
        let above_min = match self.min {
            Some(min) if min > 0 => checked >= min,
            _ => true,
        };
        let below_max = match self.max {
            Some(max) if max > 0 => checked <= max,
            _ => true,
        };
        above_min && below_max
    }
}

#[async_trait]
impl ValidationRule for ChoiceValidator {
    async fn evaluate(&self, value: &FieldValue) -> Result<bool, PredicateError> {
        Ok(self.check(value.checked_count()))
    }

    fn rule_name(&self) -> ValidatorName {
        ValidatorName::Choice
    }

    fn error_message(&self, field: &str) -> String {
        if let Some(ref message) = self.message {
            return message.clone();
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("Select between {} and {} options for {}", min, max, field),
            (Some(min), None) => format!("Select at least {} option(s) for {}", min, field),
            (None, Some(max)) => format!("Select at most {} option(s) for {}", max, field),
            (None, None) => format!("{} has an invalid selection", field),
        }
    }

    fn needs_group(&self) -> bool {
        true
    }

    fn parameters(&self) -> Option<Value> {
        Some(serde_json::json!({
            "min": self.min,
            "max": self.max,
            "message": self.message,
        }))
    }
}
