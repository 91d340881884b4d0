//! Built-in validators and the tagged union over them

pub mod choice;
pub mod custom;
pub mod not_empty;
pub mod numeric;
pub mod regexp;
pub mod string_length;

pub use choice::ChoiceValidator;
pub use custom::{async_predicate, sync_predicate, CustomValidator, Predicate, PredicateFuture};
pub use not_empty::NotEmptyValidator;
pub use numeric::NumericValidator;
pub use regexp::RegexpValidator;
pub use string_length::StringLengthValidator;

use std::fmt;
use std::str::FromStr;

use crate::error::PredicateError;
use crate::traits::{FieldValue, ValidationRule};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Names of the registered validators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidatorName {
    NotEmpty,
    Regexp,
    StringLength,
    Numeric,
    Custom,
    Choice,
}

impl ValidatorName {
    pub const ALL: [ValidatorName; 6] = [
        ValidatorName::NotEmpty,
        ValidatorName::Regexp,
        ValidatorName::StringLength,
        ValidatorName::Numeric,
        ValidatorName::Custom,
        ValidatorName::Choice,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ValidatorName::NotEmpty => "notEmpty",
            ValidatorName::Regexp => "regexp",
            ValidatorName::StringLength => "stringLength",
            ValidatorName::Numeric => "numeric",
            ValidatorName::Custom => "custom",
            ValidatorName::Choice => "choice",
        }
    }
}

impl fmt::Display for ValidatorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a name matches no validator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown validator '{0}'")]
pub struct UnknownValidator(pub String);

impl FromStr for ValidatorName {
    type Err = UnknownValidator;

    /// Case-insensitive, ignoring `-` and `_`, so `notEmpty`, `notempty`
    /// and `not-empty` all resolve.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        ValidatorName::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(&folded))
            .ok_or_else(|| UnknownValidator(s.to_string()))
    }
}

/// One configured validator of any kind
#[derive(Debug, Clone)]
pub enum Validator {
    NotEmpty(NotEmptyValidator),
    Regexp(RegexpValidator),
    StringLength(StringLengthValidator),
    Numeric(NumericValidator),
    Custom(CustomValidator),
    Choice(ChoiceValidator),
}

impl Validator {
    fn rule(&self) -> &dyn ValidationRule {
        match self {
            Validator::NotEmpty(v) => v,
            Validator::Regexp(v) => v,
            Validator::StringLength(v) => v,
            Validator::Numeric(v) => v,
            Validator::Custom(v) => v,
            Validator::Choice(v) => v,
        }
    }
}

#[async_trait]
impl ValidationRule for Validator {
    async fn evaluate(&self, value: &FieldValue) -> Result<bool, PredicateError> {
        self.rule().evaluate(value).await
    }

    fn rule_name(&self) -> ValidatorName {
        self.rule().rule_name()
    }

    fn error_message(&self, field: &str) -> String {
        self.rule().error_message(field)
    }

    fn needs_group(&self) -> bool {
        self.rule().needs_group()
    }

    fn parameters(&self) -> Option<Value> {
        self.rule().parameters()
    }
}

macro_rules! impl_from_validator {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Validator {
                fn from(validator: $ty) -> Self {
                    Validator::$variant(validator)
                }
            }
        )*
    };
}

impl_from_validator! {
    NotEmpty => NotEmptyValidator,
    Regexp => RegexpValidator,
    StringLength => StringLengthValidator,
    Numeric => NumericValidator,
    Custom => CustomValidator,
    Choice => ChoiceValidator,
}
