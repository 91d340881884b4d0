//! User-supplied predicates, sync or async

use std::future::Future;
use std::sync::Arc;

use crate::error::PredicateError;
use crate::traits::{FieldValue, ValidationRule};
use crate::validators::ValidatorName;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

/// Future returned by a predicate
pub type PredicateFuture = BoxFuture<'static, Result<bool, PredicateError>>;

/// Shared predicate function, the unit stored in a
/// [`CallbackRegistry`](crate::registry::CallbackRegistry)
pub type Predicate = Arc<dyn Fn(String) -> PredicateFuture + Send + Sync>;

/// Wrap a synchronous check into a [`Predicate`]
pub fn sync_predicate<F>(check: F) -> Predicate
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    Arc::new(move |value: String| {
        let passed = check(&value);
        futures::future::ready(Ok::<bool, PredicateError>(passed)).boxed()
    })
}

/// Wrap an asynchronous check into a [`Predicate`]
pub fn async_predicate<F, Fut>(check: F) -> Predicate
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, PredicateError>> + Send + 'static,
{
    Arc::new(move |value: String| check(value).boxed())
}

/// Validator delegating to a user predicate
#[derive(Clone)]
pub struct CustomValidator {
    /// Name used in logs and parameters
    pub name: String,
    predicate: Predicate,
    /// Custom error message
    pub message: Option<String>,
}

impl CustomValidator {
    /// Create a custom validator from a synchronous check
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            name: "custom".to_string(),
            predicate: sync_predicate(check),
            message: None,
        }
    }

    /// Create a custom validator from an asynchronous check
    pub fn new_async<F, Fut>(check: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, PredicateError>> + Send + 'static,
    {
        Self {
            name: "custom".to_string(),
            predicate: async_predicate(check),
            message: None,
        }
    }

    /// Use a predicate resolved from a registry
    pub fn from_predicate(name: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            name: name.into(),
            predicate,
            message: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl std::fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomValidator")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish()
    }
}

#[async_trait]
impl ValidationRule for CustomValidator {
    async fn evaluate(&self, value: &FieldValue) -> Result<bool, PredicateError> {
        (self.predicate)(value.as_text().to_string()).await
    }

    fn rule_name(&self) -> ValidatorName {
        ValidatorName::Custom
    }

    fn error_message(&self, field: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("{} is invalid", field))
    }

    fn parameters(&self) -> Option<Value> {
        Some(serde_json::json!({
            "validatorFunction": self.name,
            "message": self.message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_sync_predicate() {
        let validator = CustomValidator::new(|value| value.len() > 2).message("Too short");
        assert_eq!(validator.evaluate(&"abc".into()).await, Ok(true));
        assert_eq!(validator.evaluate(&"ab".into()).await, Ok(false));
        assert_eq!(validator.error_message("password"), "Too short");
    }

    #[tokio::test]
    async fn test_async_predicate() {
        let validator = CustomValidator::new_async(|value: String| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok::<_, PredicateError>(value != "taken")
        });
        assert_eq!(validator.evaluate(&"free".into()).await, Ok(true));
        assert_eq!(validator.evaluate(&"taken".into()).await, Ok(false));
    }

    #[tokio::test]
    async fn test_rejection_is_surfaced() {
        let validator = CustomValidator::new_async(|_value: String| async move {
            Err::<bool, _>(PredicateError::new("lookup unavailable"))
        });
        let result = validator.evaluate(&"x".into()).await;
        assert_eq!(result, Err(PredicateError::new("lookup unavailable")));
    }

    #[test]
    fn test_debug_hides_closure() {
        let validator = CustomValidator::new(|_| true).named("isStrong");
        let debug = format!("{:?}", validator);
        assert!(debug.contains("isStrong"));
        assert_eq!(validator.parameters().unwrap()["validatorFunction"], "isStrong");
    }
}
