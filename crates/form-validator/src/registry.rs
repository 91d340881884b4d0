//! Named callbacks and predicates, and construction of validators from
//! loosely-typed option maps

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{CompleteCallback, FieldConfig, Triggers, ValidatorConfig};
use crate::declarative::is_truthy;
use crate::dom::FieldElement;
use crate::error::{ConfigError, ConfigResult, PredicateError};
use crate::events::{EventKind, FormState};
use crate::validators::{
    async_predicate, sync_predicate, ChoiceValidator, CustomValidator, NotEmptyValidator,
    NumericValidator, Predicate, RegexpValidator, StringLengthValidator, Validator, ValidatorName,
};

/// Lookup table for functions referenced by name from JSON or attributes
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<String, CompleteCallback>,
    predicates: HashMap<String, Predicate>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a completion callback usable as `complete` / `vr-callback`
    pub fn register_callback<F>(&mut self, name: impl Into<String>, callback: F) -> &mut Self
    where
        F: Fn(&FieldElement, FormState, &[String]) + Send + Sync + 'static,
    {
        self.callbacks.insert(name.into(), Arc::new(callback));
        self
    }

    /// Register a synchronous predicate usable as `validatorFunction`
    pub fn register_predicate<F>(&mut self, name: impl Into<String>, check: F) -> &mut Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), sync_predicate(check));
        self
    }

    /// Register an asynchronous predicate usable as `validatorFunction`
    pub fn register_async_predicate<F, Fut>(&mut self, name: impl Into<String>, check: F) -> &mut Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, PredicateError>> + Send + 'static,
    {
        self.predicates.insert(name.into(), async_predicate(check));
        self
    }

    pub fn callback(&self, name: &str) -> ConfigResult<CompleteCallback> {
        self.callbacks
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::MissingCallback(name.to_string()))
    }

    pub fn predicate(&self, name: &str) -> ConfigResult<Predicate> {
        self.predicates
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::MissingPredicate(name.to_string()))
    }

    pub fn has_callback(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }

    pub fn has_predicate(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut callbacks: Vec<_> = self.callbacks.keys().collect();
        let mut predicates: Vec<_> = self.predicates.keys().collect();
        callbacks.sort();
        predicates.sort();
        f.debug_struct("CallbackRegistry")
            .field("callbacks", &callbacks)
            .field("predicates", &predicates)
            .finish()
    }
}

fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Option lookup ignoring case, `-` and `_`
struct Options<'a> {
    field: &'a str,
    validator: ValidatorName,
    entries: Vec<(String, &'a Value)>,
}

impl<'a> Options<'a> {
    fn new(field: &'a str, validator: ValidatorName, options: &'a Map<String, Value>) -> Self {
        Self {
            field,
            validator,
            entries: options.iter().map(|(k, v)| (fold_key(k), v)).collect(),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        let key = fold_key(key);
        self.entries
            .iter()
            .find(|(k, v)| *k == key && !v.is_null())
            .map(|(_, v)| *v)
    }

    fn invalid(&self, option: &str, value: &Value) -> ConfigError {
        ConfigError::InvalidOption {
            field: self.field.to_string(),
            validator: self.validator.to_string(),
            option: option.to_string(),
            value: value.clone(),
        }
    }

    fn missing(&self, option: &'static str) -> ConfigError {
        ConfigError::MissingOption {
            field: self.field.to_string(),
            validator: self.validator.to_string(),
            option,
        }
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).map(is_truthy)
    }

    fn count(&self, key: &str) -> ConfigResult<Option<usize>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed
            .map(|n| Some(n as usize))
            .ok_or_else(|| self.invalid(key, value))
    }

    fn text(&self, key: &str) -> ConfigResult<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(self.invalid(key, other)),
        }
    }

    fn triggers(&self) -> Triggers {
        let mut triggers = Triggers::default();
        for kind in EventKind::ALL {
            if let Some(enabled) = self.flag(&kind.to_string()) {
                triggers.set(kind, enabled);
            }
        }
        triggers
    }
}

/// Build one validator from its option map.
///
/// Recognized options, matched case-insensitively: `message`, `trim`,
/// `min`, `max`, `regexp` (or `pattern`), `validatorFunction`, and the
/// trigger switches `input`, `blur`, `change`, `submit`.
pub fn build_validator(
    field: &str,
    name: ValidatorName,
    options: &Map<String, Value>,
    registry: &CallbackRegistry,
) -> ConfigResult<ValidatorConfig> {
    let opts = Options::new(field, name, options);
    let message = opts.text("message")?;

    let validator: Validator = match name {
        ValidatorName::NotEmpty => {
            let mut v = NotEmptyValidator::new().trim(opts.flag("trim").unwrap_or(false));
            v.message = message;
            v.into()
        }
        ValidatorName::Regexp => {
            let pattern = match opts.text("regexp")? {
                Some(pattern) => pattern,
                None => opts.text("pattern")?.ok_or_else(|| opts.missing("regexp"))?,
            };
            let mut v = RegexpValidator::new(&pattern).map_err(|source| ConfigError::InvalidPattern {
                field: field.to_string(),
                pattern: pattern.clone(),
                source,
            })?;
            v.message = message;
            v.into()
        }
        ValidatorName::StringLength => {
            let mut v = StringLengthValidator::new().trim(opts.flag("trim").unwrap_or(false));
            v.min = opts.count("min")?;
            v.max = opts.count("max")?;
            v.message = message;
            v.into()
        }
        ValidatorName::Numeric => {
            let mut v = NumericValidator::new();
            v.message = message;
            v.into()
        }
        ValidatorName::Custom => {
            let function = opts
                .text("validatorFunction")?
                .ok_or_else(|| opts.missing("validatorFunction"))?;
            let mut v = CustomValidator::from_predicate(function.clone(), registry.predicate(&function)?);
            v.message = message;
            v.into()
        }
        ValidatorName::Choice => {
            let mut v = ChoiceValidator::new();
            v.min = opts.count("min")?;
            v.max = opts.count("max")?;
            v.message = message;
            v.into()
        }
    };

    debug!(field, validator = %name, "validator configured");
    Ok(ValidatorConfig {
        validator,
        triggers: opts.triggers(),
    })
}

/// Build a validator from a shorthand value: `true` for defaults, a string
/// for a `regexp` pattern, an object for full options. Falsy values yield
/// `None`.
pub fn build_from_value(
    field: &str,
    name: ValidatorName,
    value: &Value,
    registry: &CallbackRegistry,
) -> ConfigResult<Option<ValidatorConfig>> {
    match value {
        Value::Object(options) => build_validator(field, name, options, registry).map(Some),
        Value::String(pattern) if name == ValidatorName::Regexp && !pattern.is_empty() => {
            let mut options = Map::new();
            options.insert("regexp".to_string(), Value::String(pattern.clone()));
            build_validator(field, name, &options, registry).map(Some)
        }
        other if is_truthy(other) => build_validator(field, name, &Map::new(), registry).map(Some),
        _ => Ok(None),
    }
}

/// Normalize one field of a JSON config.
///
/// Unknown validator names are skipped with a warning.
pub fn normalize_field(field: &str, value: &Value, registry: &CallbackRegistry) -> ConfigResult<FieldConfig> {
    let invalid = || ConfigError::InvalidFieldConfig {
        field: field.to_string(),
        value: value.clone(),
    };
    let Value::Object(map) = value else {
        return Err(invalid());
    };

    let mut config = FieldConfig::new();
    match map.get("validators") {
        Some(Value::Object(validators)) => {
            for (key, options) in validators {
                let name = match key.parse::<ValidatorName>() {
                    Ok(name) => name,
                    Err(err) => {
                        warn!(field, %err, "skipping unknown validator");
                        continue;
                    }
                };
                if let Some(validator) = build_from_value(field, name, options, registry)? {
                    config = config.with(validator);
                }
            }
        }
        None | Some(Value::Null) => {}
        Some(_) => return Err(invalid()),
    }

    if let Some(name) = map.get("complete").and_then(Value::as_str) {
        config.complete = Some(registry.callback(name)?);
    }

    Ok(config)
}
