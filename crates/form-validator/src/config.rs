//! Form configuration: options, per-field validator maps and callbacks

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_builder::builder;

use crate::dom::FieldElement;
use crate::error::{ConfigError, ConfigResult};
use crate::events::{EventKind, FormState, SubmitEvent};
use crate::registry::{self, CallbackRegistry};
use crate::traits::ValidationRule;
use crate::validators::{Validator, ValidatorName};

/// Called when a field starts validating
pub type BeginCallback = Arc<dyn Fn(&FieldElement) + Send + Sync>;
/// Called with the field, its resulting state and its error messages
pub type CompleteCallback = Arc<dyn Fn(&FieldElement, FormState, &[String]) + Send + Sync>;
/// Called after a submit with the final validity
pub type SubmitCallback = Arc<dyn Fn(&SubmitEvent, bool) + Send + Sync>;
/// Called on every form state transition
pub type StateChangeCallback = Arc<dyn Fn(FormState) + Send + Sync>;

/// Form-level switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[builder]
#[serde(default, rename_all = "camelCase")]
pub struct FormOptions {
    /// Run blur-bound validators when a field loses focus
    #[builder(default = "true")]
    pub validate_on_blur: bool,

    /// Run input-bound validators on every edit
    #[builder(default = "true")]
    pub validate_on_input: bool,

    /// Run submit-bound validators when the submit button is clicked
    #[builder(default = "true", getter)]
    pub validate_on_submit: bool,

    /// Read validators from element attributes instead of `fields`
    #[builder(default, getter)]
    pub declarative: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_on_blur: true,
            validate_on_input: true,
            validate_on_submit: true,
            declarative: false,
        }
    }
}

impl FormOptions {
    /// Whether events of `kind` are listened to at all. `change` always is.
    pub fn listens_to(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Input => self.validate_on_input,
            EventKind::Blur => self.validate_on_blur,
            EventKind::Change => true,
            EventKind::Submit => self.validate_on_submit,
        }
    }
}

impl FormOptionsBuilder {
    pub fn declarative_mode(self) -> Self {
        self.declarative(true)
    }

    pub fn build_options(self) -> FormOptions {
        // every field has a default
        self.build_with_defaults().unwrap_or_default()
    }
}

/// Which events run a validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Triggers {
    pub input: bool,
    pub blur: bool,
    pub change: bool,
    pub submit: bool,
}

impl Default for Triggers {
    fn default() -> Self {
        Self {
            input: true,
            blur: true,
            change: true,
            submit: true,
        }
    }
}

impl Triggers {
    /// Only run on submit
    pub fn submit_only() -> Self {
        Self {
            input: false,
            blur: false,
            change: false,
            submit: true,
        }
    }

    pub fn applies(self, kind: EventKind) -> bool {
        match kind {
            EventKind::Input => self.input,
            EventKind::Blur => self.blur,
            EventKind::Change => self.change,
            EventKind::Submit => self.submit,
        }
    }

    pub fn set(&mut self, kind: EventKind, enabled: bool) {
        match kind {
            EventKind::Input => self.input = enabled,
            EventKind::Blur => self.blur = enabled,
            EventKind::Change => self.change = enabled,
            EventKind::Submit => self.submit = enabled,
        }
    }
}

/// A validator together with the events that run it
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub validator: Validator,
    pub triggers: Triggers,
}

impl ValidatorConfig {
    pub fn new(validator: impl Into<Validator>) -> Self {
        Self {
            validator: validator.into(),
            triggers: Triggers::default(),
        }
    }

    pub fn triggers(mut self, triggers: Triggers) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn on(mut self, kind: EventKind, enabled: bool) -> Self {
        self.triggers.set(kind, enabled);
        self
    }

    pub fn name(&self) -> ValidatorName {
        self.validator.rule_name()
    }

    pub fn parameters(&self) -> Value {
        let mut params = self.validator.parameters().unwrap_or(Value::Null);
        if let Value::Object(ref mut map) = params {
            for kind in EventKind::ALL {
                map.insert(kind.to_string(), Value::Bool(self.triggers.applies(kind)));
            }
        }
        params
    }
}

/// Validators and callbacks of one field
#[derive(Clone, Default)]
pub struct FieldConfig {
    pub validators: BTreeMap<ValidatorName, ValidatorConfig>,
    pub begin: Option<BeginCallback>,
    pub complete: Option<CompleteCallback>,
}

impl FieldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a validator bound to every event
    pub fn validator(self, validator: impl Into<Validator>) -> Self {
        self.with(ValidatorConfig::new(validator))
    }

    /// Attach a configured validator, replacing one of the same name
    pub fn with(mut self, config: ValidatorConfig) -> Self {
        self.validators.insert(config.name(), config);
        self
    }

    pub fn begin<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FieldElement) + Send + Sync + 'static,
    {
        self.begin = Some(Arc::new(callback));
        self
    }

    pub fn complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FieldElement, FormState, &[String]) + Send + Sync + 'static,
    {
        self.complete = Some(Arc::new(callback));
        self
    }

    pub fn complete_callback(mut self, callback: CompleteCallback) -> Self {
        self.complete = Some(callback);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn get(&self, name: ValidatorName) -> Option<&ValidatorConfig> {
        self.validators.get(&name)
    }

    /// Validator options keyed by validator name, as JSON
    pub fn parameters(&self) -> Value {
        Value::Object(
            self.validators
                .iter()
                .map(|(name, config)| (name.to_string(), config.parameters()))
                .collect(),
        )
    }

    /// Normalize `{ "validators": { "notEmpty": { ... } }, "complete": "name" }`
    pub fn from_json(field: &str, value: &Value, callbacks: &CallbackRegistry) -> ConfigResult<Self> {
        registry::normalize_field(field, value, callbacks)
    }
}

impl std::fmt::Debug for FieldConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldConfig")
            .field("validators", &self.validators)
            .field("has_begin", &self.begin.is_some())
            .field("has_complete", &self.complete.is_some())
            .finish()
    }
}

/// Everything a [`crate::FormValidator`] is built from
#[derive(Clone, Default)]
pub struct FormConfig {
    pub options: FormOptions,
    pub fields: BTreeMap<String, FieldConfig>,
    /// Id of the submit button element
    pub submit_button: Option<String>,
    pub on_submit: Option<SubmitCallback>,
    pub on_state_change: Option<StateChangeCallback>,
    /// Named callbacks and predicates for declarative and JSON configs
    pub registry: CallbackRegistry,
}

impl FormConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn field(mut self, name: impl Into<String>, field: FieldConfig) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn submit_button(mut self, id: impl Into<String>) -> Self {
        self.submit_button = Some(id.into());
        self
    }

    pub fn on_submit<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SubmitEvent, bool) + Send + Sync + 'static,
    {
        self.on_submit = Some(Arc::new(callback));
        self
    }

    pub fn on_state_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(FormState) + Send + Sync + 'static,
    {
        self.on_state_change = Some(Arc::new(callback));
        self
    }

    pub fn registry(mut self, registry: CallbackRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build a config from JSON data.
    ///
    /// `{ "validateOnBlur": false, "submitButton": "send", "fields": { ... } }`.
    /// Callbacks and predicates named in the data resolve against `registry`.
    pub fn from_json(value: &Value, registry: CallbackRegistry) -> ConfigResult<Self> {
        let options: FormOptions =
            serde_json::from_value(value.clone()).map_err(|_| ConfigError::InvalidFieldConfig {
                field: "<options>".to_string(),
                value: value.clone(),
            })?;

        let mut fields = BTreeMap::new();
        if let Some(raw_fields) = value.get("fields") {
            let Value::Object(map) = raw_fields else {
                return Err(ConfigError::InvalidFieldConfig {
                    field: "<fields>".to_string(),
                    value: raw_fields.clone(),
                });
            };
            for (name, raw) in map {
                fields.insert(name.clone(), FieldConfig::from_json(name, raw, &registry)?);
            }
        }

        Ok(Self {
            options,
            fields,
            submit_button: value
                .get("submitButton")
                .and_then(Value::as_str)
                .map(str::to_string),
            on_submit: None,
            on_state_change: None,
            registry,
        })
    }
}

impl std::fmt::Debug for FormConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormConfig")
            .field("options", &self.options)
            .field("fields", &self.fields)
            .field("submit_button", &self.submit_button)
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{NotEmptyValidator, StringLengthValidator};

    #[test]
    fn test_default_options() {
        let options = FormOptions::default();
        assert!(options.validate_on_blur);
        assert!(options.validate_on_input);
        assert!(options.validate_on_submit);
        assert!(!options.declarative);
        assert!(options.listens_to(EventKind::Change));
    }

    #[test]
    fn test_options_builder() {
        let options = FormOptions::builder()
            .validate_on_blur(false)
            .declarative_mode()
            .build_options();
        assert!(!options.validate_on_blur);
        assert!(options.validate_on_input);
        assert!(options.declarative);
        assert!(!options.listens_to(EventKind::Blur));
    }

    #[test]
    fn test_options_from_camel_case_json() {
        let options: FormOptions =
            serde_json::from_value(serde_json::json!({ "validateOnInput": false })).unwrap();
        assert!(!options.validate_on_input);
        assert!(options.validate_on_submit);
    }

    #[test]
    fn test_field_config_replaces_same_validator() {
        let field = FieldConfig::new()
            .validator(StringLengthValidator::new().min(2))
            .validator(StringLengthValidator::new().min(6))
            .with(ValidatorConfig::new(NotEmptyValidator::new()).on(EventKind::Blur, false));

        assert_eq!(field.validators.len(), 2);
        let params = field.parameters();
        assert_eq!(params["stringLength"]["min"], 6);
        assert_eq!(params["notEmpty"]["blur"], false);
        assert_eq!(params["notEmpty"]["input"], true);
    }

    #[test]
    fn test_triggers() {
        let submit_only = Triggers::submit_only();
        assert!(submit_only.applies(EventKind::Submit));
        assert!(!submit_only.applies(EventKind::Input));
        assert!(Triggers::default().applies(EventKind::Change));
    }

    #[test]
    fn test_form_config_from_json() {
        let config = FormConfig::from_json(
            &serde_json::json!({
                "validateOnBlur": false,
                "submitButton": "send",
                "fields": {
                    "bsb": {
                        "validators": {
                            "notEmpty": { "trim": true, "message": "You must enter a BSB" },
                            "numeric": { "message": "BSB must be numeric" }
                        }
                    }
                }
            }),
            CallbackRegistry::new(),
        )
        .unwrap();

        assert!(!config.options.validate_on_blur);
        assert_eq!(config.submit_button.as_deref(), Some("send"));
        assert_eq!(config.fields["bsb"].validators.len(), 2);
    }
}
