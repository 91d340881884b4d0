//! Validators declared through `vr-*` / `data-vr-*` element attributes
//!
//! ```text
//! <input name="bsb" vr-notempty="true" vr-stringlength__min="6" vr-callback="showErrors">
//! ```
//!
//! The part before `__` names a validator, the part after it names one of
//! its options. A falsy value on the bare validator attribute disables it,
//! wherever the attribute appears.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::config::FieldConfig;
use crate::dom::FormContainer;
use crate::error::ConfigResult;
use crate::registry::{build_validator, CallbackRegistry};
use crate::validators::ValidatorName;

const PREFIXES: [&str; 2] = ["data-vr-", "vr-"];
const CALLBACK_KEY: &str = "callback";

/// Strip a `vr-` or `data-vr-` prefix. `None` for other attributes.
pub fn strip_prefix(attribute: &str) -> Option<&str> {
    PREFIXES.iter().find_map(|prefix| attribute.strip_prefix(prefix))
}

/// `data-vr-string-length` -> `stringLength`
pub fn to_camel_case(attribute: &str) -> String {
    let name = strip_prefix(attribute).unwrap_or(attribute);
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert an attribute value into the closest JSON value.
///
/// Blank is `0`, finite numbers become numbers, JSON literals are parsed,
/// anything else stays a string.
pub fn convert_type(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::from(0);
    }
    if let Ok(number) = trimmed.parse::<f64>() {
        if number.is_finite() {
            if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
                return Value::from(number as i64);
            }
            if let Some(number) = Number::from_f64(number) {
                return Value::Number(number);
            }
        }
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// `null`, `false`, `0`, `NaN` and `""` are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Default)]
struct Declared {
    /// Value of the bare `vr-<validator>` attribute
    switch: Option<Value>,
    options: Map<String, Value>,
}

#[derive(Default)]
struct DeclaredField {
    validators: BTreeMap<ValidatorName, Declared>,
    callback: Option<String>,
}

/// Read every `vr-*` attribute under the container into field configs.
///
/// Same-named controls (radio and checkbox groups) share one entry. Fields
/// left without validators are dropped.
pub fn parse_declarative(
    container: &dyn FormContainer,
    registry: &CallbackRegistry,
) -> ConfigResult<BTreeMap<String, FieldConfig>> {
    let mut declared: BTreeMap<String, DeclaredField> = BTreeMap::new();

    for element in container.elements() {
        for (attribute, raw) in &element.attributes {
            let Some(key) = strip_prefix(attribute) else {
                continue;
            };
            let entry = declared.entry(element.name.clone()).or_default();

            if key == CALLBACK_KEY {
                entry.callback = Some(raw.trim().to_string());
                continue;
            }

            let (root, modifier) = match key.rsplit_once("__") {
                Some((root, modifier)) => (root, Some(modifier)),
                None => (key, None),
            };
            let name = match root.parse::<ValidatorName>() {
                Ok(name) => name,
                Err(err) => {
                    warn!(field = %element.name, attribute = %attribute, %err, "ignoring attribute");
                    continue;
                }
            };

            let validator = entry.validators.entry(name).or_default();
            match modifier {
                Some(modifier) => {
                    validator.options.insert(to_camel_case(modifier), convert_type(raw));
                }
                // a bare attribute (`<input vr-notempty>`) enables the validator
                None if raw.trim().is_empty() => validator.switch = Some(Value::Bool(true)),
                None => validator.switch = Some(convert_type(raw)),
            }
        }
    }

    let mut fields = BTreeMap::new();
    for (field, declared_field) in declared {
        let mut config = FieldConfig::new();

        for (name, mut declared) in declared_field.validators {
            match declared.switch.take() {
                Some(switch) if !is_truthy(&switch) => {
                    debug!(field = %field, validator = %name, "validator disabled by attribute");
                    continue;
                }
                Some(Value::String(pattern)) if name == ValidatorName::Regexp => {
                    declared
                        .options
                        .entry("regexp".to_string())
                        .or_insert(Value::String(pattern));
                }
                _ => {}
            }
            config = config.with(build_validator(&field, name, &declared.options, registry)?);
        }

        if let Some(callback) = declared_field.callback {
            config.complete = Some(registry.callback(&callback)?);
        }

        if config.is_empty() {
            debug!(field = %field, "no validators declared, skipping field");
            continue;
        }
        fields.insert(field, config);
    }

    Ok(fields)
}
