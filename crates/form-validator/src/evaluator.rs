//! Runs a field's validators against the current container values

use futures::future::join_all;
use tracing::warn;

use crate::dom::FormContainer;
use crate::events::FormState;
use crate::traits::{FieldValue, ValidationRule};
use crate::validators::{Validator, ValidatorName};

/// Outcome of one field evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    pub field: String,
    /// `Valid` when every evaluated validator passed
    pub state: FormState,
    /// Messages of the failing validators, in evaluation order
    pub errors: Vec<String>,
    pub results: Vec<(ValidatorName, bool)>,
}

impl FieldReport {
    pub fn passed(&self) -> bool {
        self.state.is_valid()
    }
}

/// Evaluate `validators` for `field` concurrently and wait for all of them.
///
/// A rejected predicate counts as a failure.
pub async fn evaluate_field<'a, I>(container: &dyn FormContainer, field: &str, validators: I) -> FieldReport
where
    I: IntoIterator<Item = &'a Validator>,
{
    let elements = container.elements_named(field);

    let checks = validators.into_iter().map(|validator| {
        let value = FieldValue::from_elements(elements.clone(), validator.needs_group());
        async move {
            let passed = match validator.evaluate(&value).await {
                Ok(passed) => passed,
                Err(err) => {
                    warn!(field, validator = %validator.rule_name(), %err, "predicate rejected");
                    false
                }
            };
            (validator, passed)
        }
    });

    let mut errors = Vec::new();
    let mut results = Vec::new();
    for (validator, passed) in join_all(checks).await {
        if !passed {
            errors.push(validator.error_message(field));
        }
        results.push((validator.rule_name(), passed));
    }

    FieldReport {
        field: field.to_string(),
        state: FormState::from_validity(errors.is_empty()),
        errors,
        results,
    }
}
