//! The form controller: event dispatch and aggregate validity

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::config::{
    FieldConfig, FormConfig, FormOptions, StateChangeCallback, SubmitCallback, ValidatorConfig,
};
use crate::declarative::parse_declarative;
use crate::dom::{FieldElement, FormContainer};
use crate::error::{ConfigError, ConfigResult, ValidationError, ValidationErrors};
use crate::evaluator::{evaluate_field, FieldReport};
use crate::events::{EventKind, FormEvent, FormState, SubmitEvent};
use crate::registry::CallbackRegistry;
use crate::validators::ValidatorName;

type ValidatorKey = (String, ValidatorName);

/// Mutable bookkeeping. Never locked across an await.
#[derive(Debug)]
struct FormStatus {
    state: FormState,
    passing: BTreeSet<ValidatorKey>,
    pending: BTreeMap<ValidatorKey, usize>,
    /// Latest run started per validator; older results are stale
    generations: BTreeMap<ValidatorKey, u64>,
    /// Message of every validator whose latest result failed
    failures: BTreeMap<ValidatorKey, String>,
}

impl FormStatus {
    fn set_state(&mut self, next: FormState) -> Option<FormState> {
        if self.state == next {
            return None;
        }
        self.state = next;
        Some(next)
    }

    /// Settle on Valid/Invalid once nothing is in flight
    fn settle(&mut self, total: usize) -> Option<FormState> {
        if !self.pending.is_empty() {
            return None;
        }
        self.set_state(FormState::from_validity(self.passing.len() == total))
    }
}

struct Inner {
    container: Arc<dyn FormContainer>,
    options: FormOptions,
    submit_button: Option<String>,
    fields: BTreeMap<String, FieldConfig>,
    total_validators: usize,
    on_submit: Option<SubmitCallback>,
    on_state_change: Option<StateChangeCallback>,
    status: Mutex<FormStatus>,
    completed: Notify,
}

/// Validates the fields of one form container.
///
/// Cloning is cheap and clones share state, so a clone can be moved into a
/// spawned task that dispatches events.
#[derive(Clone)]
pub struct FormValidator {
    inner: Arc<Inner>,
}

impl FormValidator {
    pub fn new(root: Arc<dyn FormContainer>, config: FormConfig) -> ConfigResult<Self> {
        let FormConfig {
            options,
            fields,
            submit_button,
            on_submit,
            on_state_change,
            registry,
        } = config;

        let fields = if *options.get_declarative() {
            resolve_declarative(root.as_ref(), fields, &registry)?
        } else {
            resolve_explicit(root.as_ref(), fields)?
        };

        if let Some(ref id) = submit_button {
            if !root.contains_element(id) {
                return Err(ConfigError::SubmitButtonNotElement(id.clone()));
            }
        }

        let total_validators = fields.values().map(|f| f.validators.len()).sum();
        let initial = FormState::from_validity(total_validators == 0);
        debug!(
            fields = fields.len(),
            validators = total_validators,
            state = %initial,
            "form validator ready"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                container: root,
                options,
                submit_button,
                fields,
                total_validators,
                on_submit,
                on_state_change,
                status: Mutex::new(FormStatus {
                    state: initial,
                    passing: BTreeSet::new(),
                    pending: BTreeMap::new(),
                    generations: BTreeMap::new(),
                    failures: BTreeMap::new(),
                }),
                completed: Notify::new(),
            }),
        })
    }

    pub fn builder() -> FormValidatorBuilder {
        FormValidatorBuilder::default()
    }

    /// Handle one event raised by the container
    pub async fn dispatch(&self, event: FormEvent) {
        debug!(?event, "dispatch");
        match event {
            FormEvent::Input { field } => {
                if self.inner.options.listens_to(EventKind::Input) {
                    self.run(&field, Some(EventKind::Input), true).await;
                }
            }
            FormEvent::Blur { field } => {
                if self.inner.options.listens_to(EventKind::Blur) {
                    self.run(&field, Some(EventKind::Blur), true).await;
                }
            }
            FormEvent::Change { field } => {
                self.run(&field, Some(EventKind::Change), true).await;
            }
            FormEvent::Click { element } => {
                if self.inner.submit_button.as_deref() == Some(element.as_str()) {
                    self.submit_from(Some(element)).await;
                }
            }
        }
    }

    /// Run every validator of `field`. Unknown fields are invalid.
    pub async fn validate_field(&self, field: &str) -> bool {
        if !self.inner.fields.contains_key(field) {
            warn!(field, "validate_field on unknown field");
            return false;
        }
        match self.run(field, None, true).await {
            Some(report) => report.passed(),
            // superseded by a newer run
            None => self.field_valid(field),
        }
    }

    /// Run every validator of every field
    pub async fn validate_all(&self) -> bool {
        let runs = self
            .inner
            .fields
            .keys()
            .map(|field| self.run(field, None, true));
        join_all(runs).await;
        self.valid()
    }

    /// Submit the form as if the submit button were clicked
    pub async fn submit(&self) -> bool {
        let source = self.inner.submit_button.clone();
        self.submit_from(source).await
    }

    pub fn fields(&self) -> Vec<String> {
        self.inner.fields.keys().cloned().collect()
    }

    /// Whether the form has settled as valid. `false` while pending.
    pub fn valid(&self) -> bool {
        self.state() == FormState::Valid
    }

    pub fn state(&self) -> FormState {
        self.inner.status.lock().state
    }

    pub fn field_validators(&self, field: &str) -> Option<&BTreeMap<ValidatorName, ValidatorConfig>> {
        self.inner.fields.get(field).map(|config| &config.validators)
    }

    /// Whether every validator of `field` currently passes
    pub fn field_valid(&self, field: &str) -> bool {
        let Some(config) = self.inner.fields.get(field) else {
            return false;
        };
        let status = self.inner.status.lock();
        config
            .validators
            .keys()
            .all(|name| status.passing.contains(&(field.to_string(), *name)))
    }

    /// Messages of every validator whose latest result failed
    pub fn errors(&self) -> ValidationErrors {
        let status = self.inner.status.lock();
        let mut errors = ValidationErrors::new();
        for ((field, name), message) in &status.failures {
            errors.add(ValidationError::new(field, name.as_str(), message));
        }
        errors
    }

    fn has_pending(&self) -> bool {
        !self.inner.status.lock().pending.is_empty()
    }

    fn emit(&self, changed: Option<FormState>) {
        if let Some(state) = changed {
            debug!(%state, "form state changed");
            if let Some(ref callback) = self.inner.on_state_change {
                callback(state);
            }
        }
    }

    fn element(&self, field: &str) -> FieldElement {
        self.inner
            .container
            .first_named(field)
            .unwrap_or_else(|| FieldElement::text(field, ""))
    }

    /// Evaluate the validators of `field` bound to `kind` (all of them when
    /// `kind` is `None`).
    ///
    /// The report holds only results that were still current when they
    /// arrived. `None` for unknown fields, when nothing ran, or when every
    /// result was superseded by a newer run of the same validator.
    async fn run(&self, field: &str, kind: Option<EventKind>, notify: bool) -> Option<FieldReport> {
        let inner = &self.inner;
        let config = inner.fields.get(field)?;
        let selected: Vec<&ValidatorConfig> = config
            .validators
            .values()
            .filter(|v| kind.map_or(true, |kind| v.triggers.applies(kind)))
            .collect();

        let (tickets, changed) = {
            let mut status = inner.status.lock();
            if kind == Some(EventKind::Input) {
                // the value changed, earlier passes no longer hold
                status.passing.retain(|(name, _)| name != field);
            }
            if selected.is_empty() {
                let changed = status.settle(inner.total_validators);
                drop(status);
                self.emit(changed);
                return None;
            }
            let mut tickets = Vec::with_capacity(selected.len());
            for validator in &selected {
                let key = (field.to_string(), validator.name());
                *status.pending.entry(key.clone()).or_insert(0) += 1;
                let generation = status.generations.entry(key).or_insert(0);
                *generation += 1;
                tickets.push(*generation);
            }
            (tickets, status.set_state(FormState::Pending))
        };
        self.emit(changed);

        let element = self.element(field);
        if notify {
            if let Some(ref begin) = config.begin {
                begin(&element);
            }
        }

        let outcome = evaluate_field(
            inner.container.as_ref(),
            field,
            selected.iter().map(|config| &config.validator),
        )
        .await;

        let mut results = Vec::new();
        let mut errors = Vec::new();
        let changed = {
            let mut status = inner.status.lock();
            let mut messages = outcome.errors.into_iter();
            for ((name, passed), ticket) in outcome.results.into_iter().zip(tickets) {
                let key = (field.to_string(), name);
                if let Some(count) = status.pending.get_mut(&key) {
                    *count -= 1;
                    if *count == 0 {
                        status.pending.remove(&key);
                    }
                }
                let message = (!passed).then(|| messages.next().unwrap_or_default());

                if status.generations.get(&key).copied() != Some(ticket) {
                    warn!(field, validator = %name, ticket, "discarding stale validation result");
                    continue;
                }
                match message {
                    None => {
                        status.failures.remove(&key);
                        status.passing.insert(key);
                    }
                    Some(message) => {
                        status.passing.remove(&key);
                        status.failures.insert(key, message.clone());
                        errors.push(message);
                    }
                }
                results.push((name, passed));
            }
            status.settle(inner.total_validators)
        };
        self.emit(changed);
        inner.completed.notify_waiters();

        if results.is_empty() {
            return None;
        }
        let report = FieldReport {
            field: field.to_string(),
            state: FormState::from_validity(errors.is_empty()),
            errors,
            results,
        };

        if notify {
            if let Some(ref complete) = config.complete {
                complete(&element, report.state, &report.errors);
            }
        }

        Some(report)
    }

    async fn submit_from(&self, source: Option<String>) -> bool {
        let inner = &self.inner;
        if !*inner.options.get_validate_on_submit() {
            debug!("submit validation disabled");
            return self.valid();
        }

        loop {
            let completed = inner.completed.notified();
            if !self.has_pending() {
                break;
            }
            debug!("submit waiting for pending validators");
            completed.await;
        }

        let runs = inner
            .fields
            .keys()
            .map(|field| self.run(field, Some(EventKind::Submit), false));
        let reports = join_all(runs).await;

        // fields without submit-bound validators get no callback
        for report in reports.into_iter().flatten() {
            let Some(config) = inner.fields.get(&report.field) else {
                continue;
            };
            if let Some(ref complete) = config.complete {
                complete(&self.element(&report.field), report.state, &report.errors);
            }
        }

        let changed = inner.status.lock().settle(inner.total_validators);
        self.emit(changed);

        let valid = self.valid();
        debug!(valid, "form submitted");
        if let Some(ref on_submit) = inner.on_submit {
            on_submit(&SubmitEvent { source }, valid);
        }
        valid
    }
}

impl std::fmt::Debug for FormValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormValidator")
            .field("options", &self.inner.options)
            .field("fields", &self.inner.fields)
            .field("submit_button", &self.inner.submit_button)
            .field("status", &*self.inner.status.lock())
            .finish()
    }
}

fn resolve_declarative(
    root: &dyn FormContainer,
    explicit: BTreeMap<String, FieldConfig>,
    registry: &CallbackRegistry,
) -> ConfigResult<BTreeMap<String, FieldConfig>> {
    if !explicit.is_empty() {
        warn!(
            fields = explicit.len(),
            "declarative mode ignores explicitly configured fields"
        );
    }
    let fields = parse_declarative(root, registry)?;
    if fields.is_empty() {
        return Err(ConfigError::NoDeclarativeFields);
    }
    Ok(fields)
}

fn resolve_explicit(
    root: &dyn FormContainer,
    explicit: BTreeMap<String, FieldConfig>,
) -> ConfigResult<BTreeMap<String, FieldConfig>> {
    if explicit.is_empty() {
        return Err(ConfigError::NoFields);
    }
    let mut fields = BTreeMap::new();
    for (name, config) in explicit {
        if root.first_named(&name).is_none() {
            warn!(field = %name, "no element with this name, skipping field");
            continue;
        }
        if config.is_empty() {
            debug!(field = %name, "field has no validators, skipping");
            continue;
        }
        fields.insert(name, config);
    }
    if fields.is_empty() {
        return Err(ConfigError::NoFields);
    }
    Ok(fields)
}

/// Fluent construction of a [`FormValidator`]
#[derive(Default)]
pub struct FormValidatorBuilder {
    root: Option<Arc<dyn FormContainer>>,
    config: FormConfig,
}

impl FormValidatorBuilder {
    pub fn root<C: FormContainer + 'static>(mut self, root: C) -> Self {
        self.root = Some(Arc::new(root));
        self
    }

    pub fn shared_root(mut self, root: Arc<dyn FormContainer>) -> Self {
        self.root = Some(root);
        self
    }

    pub fn field(mut self, name: impl Into<String>, field: FieldConfig) -> Self {
        self.config = self.config.field(name, field);
        self
    }

    pub fn submit_button(mut self, id: impl Into<String>) -> Self {
        self.config = self.config.submit_button(id);
        self
    }

    pub fn options(mut self, options: FormOptions) -> Self {
        self.config = self.config.options(options);
        self
    }

    pub fn registry(mut self, registry: CallbackRegistry) -> Self {
        self.config = self.config.registry(registry);
        self
    }

    pub fn on_submit<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SubmitEvent, bool) + Send + Sync + 'static,
    {
        self.config = self.config.on_submit(callback);
        self
    }

    pub fn on_state_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(FormState) + Send + Sync + 'static,
    {
        self.config = self.config.on_state_change(callback);
        self
    }

    /// Replace the whole config, keeping the root
    pub fn config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ConfigResult<FormValidator> {
        let root = self.root.ok_or(ConfigError::MissingRoot)?;
        FormValidator::new(root, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Triggers;
    use crate::dom::MemoryForm;
    use crate::validators::{NotEmptyValidator, NumericValidator, StringLengthValidator};
    use std::sync::Mutex as StdMutex;
    use tokio_test::assert_err;

    fn bsb_form() -> Arc<MemoryForm> {
        Arc::new(
            MemoryForm::new()
                .with_element(FieldElement::text("bsb", ""))
                .with_button("send"),
        )
    }

    fn bsb_field() -> FieldConfig {
        FieldConfig::new()
            .validator(NotEmptyValidator::new().trim(true))
            .validator(NumericValidator::new())
    }

    #[test]
    fn test_construction_errors() {
        let err = assert_err!(FormValidator::builder().field("bsb", bsb_field()).build());
        assert!(matches!(err, ConfigError::MissingRoot));

        let err = assert_err!(FormValidator::builder().root(MemoryForm::new()).build());
        assert!(matches!(err, ConfigError::NoFields));

        let err = assert_err!(FormValidator::builder()
            .shared_root(bsb_form())
            .field("bsb", bsb_field())
            .submit_button("missing")
            .build());
        assert_eq!(
            err.to_string(),
            "Validator: Submit button 'missing' is not an Element."
        );

        let err = assert_err!(FormValidator::builder()
            .shared_root(bsb_form())
            .options(FormOptions::builder().declarative_mode().build_options())
            .build());
        assert!(matches!(err, ConfigError::NoDeclarativeFields));
    }

    #[test]
    fn test_fields_without_elements_are_skipped() {
        let validator = FormValidator::builder()
            .shared_root(bsb_form())
            .field("bsb", bsb_field())
            .field("ghost", bsb_field())
            .field("empty", FieldConfig::new())
            .build()
            .unwrap();
        assert_eq!(validator.fields(), vec!["bsb".to_string()]);
        assert_eq!(validator.state(), FormState::Invalid);
        assert!(!validator.valid());
        assert_eq!(validator.field_validators("bsb").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_input_updates_state() {
        let form = bsb_form();
        let states = Arc::new(StdMutex::new(Vec::new()));
        let seen = states.clone();
        let validator = FormValidator::builder()
            .shared_root(form.clone())
            .field("bsb", bsb_field())
            .on_state_change(move |state| seen.lock().unwrap().push(state))
            .build()
            .unwrap();

        form.set_value("bsb", "123456");
        validator.dispatch(FormEvent::input("bsb")).await;
        assert_eq!(validator.state(), FormState::Valid);
        assert!(validator.field_valid("bsb"));

        form.set_value("bsb", "12a");
        validator.dispatch(FormEvent::input("bsb")).await;
        assert_eq!(validator.state(), FormState::Invalid);
        assert_eq!(validator.errors().messages("bsb"), vec!["bsb must be numeric".to_string()]);

        assert_eq!(
            *states.lock().unwrap(),
            vec![
                FormState::Pending,
                FormState::Valid,
                FormState::Pending,
                FormState::Invalid
            ]
        );
    }

    #[tokio::test]
    async fn test_event_toggles_and_triggers() {
        let form = bsb_form();
        let validator = FormValidator::builder()
            .shared_root(form.clone())
            .field(
                "bsb",
                FieldConfig::new().with(
                    ValidatorConfig::new(StringLengthValidator::new().min(6)).triggers(Triggers {
                        input: false,
                        ..Triggers::default()
                    }),
                ),
            )
            .options(FormOptions::builder().validate_on_blur(false).build_options())
            .build()
            .unwrap();

        form.set_value("bsb", "123456");
        validator.dispatch(FormEvent::input("bsb")).await;
        assert!(!validator.valid());
        validator.dispatch(FormEvent::blur("bsb")).await;
        assert!(!validator.valid());
        validator.dispatch(FormEvent::change("bsb")).await;
        assert!(validator.valid());
    }

    #[tokio::test]
    async fn test_click_on_submit_button() {
        let form = bsb_form();
        let submitted = Arc::new(StdMutex::new(None));
        let record = submitted.clone();
        let validator = FormValidator::builder()
            .shared_root(form.clone())
            .field("bsb", bsb_field())
            .submit_button("send")
            .on_submit(move |event, valid| {
                *record.lock().unwrap() = Some((event.source.clone(), valid));
            })
            .build()
            .unwrap();

        validator.dispatch(FormEvent::click("elsewhere")).await;
        assert!(submitted.lock().unwrap().is_none());

        form.set_value("bsb", "063000");
        validator.dispatch(FormEvent::click("send")).await;
        assert_eq!(*submitted.lock().unwrap(), Some((Some("send".to_string()), true)));
    }

    #[tokio::test]
    async fn test_submit_disabled_skips_validation() {
        let submitted = Arc::new(StdMutex::new(false));
        let record = submitted.clone();
        let validator = FormValidator::builder()
            .shared_root(bsb_form())
            .field("bsb", bsb_field())
            .options(FormOptions::builder().validate_on_submit(false).build_options())
            .on_submit(move |_, _| *record.lock().unwrap() = true)
            .build()
            .unwrap();

        assert!(!validator.submit().await);
        assert!(!*submitted.lock().unwrap());
        assert_eq!(validator.state(), FormState::Invalid);
    }

    #[tokio::test]
    async fn test_callbacks_receive_field_state() {
        let form = bsb_form();
        let log = Arc::new(StdMutex::new(Vec::new()));
        let begin_log = log.clone();
        let complete_log = log.clone();
        let field = bsb_field()
            .begin(move |element| begin_log.lock().unwrap().push(format!("begin {}", element.name)))
            .complete(move |element, state, errors| {
                complete_log
                    .lock()
                    .unwrap()
                    .push(format!("{} {} {}", element.name, state, errors.join("|")))
            });
        let validator = FormValidator::builder()
            .shared_root(form.clone())
            .field("bsb", field)
            .build()
            .unwrap();

        assert!(!validator.validate_field("bsb").await);
        assert!(!validator.validate_field("ghost").await);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "begin bsb".to_string(),
                "bsb invalid bsb must not be empty|bsb must be numeric".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_narrower_run_keeps_other_failures() {
        let form = bsb_form();
        let validator = FormValidator::builder()
            .shared_root(form.clone())
            .field(
                "bsb",
                FieldConfig::new()
                    .validator(NotEmptyValidator::new())
                    .with(ValidatorConfig::new(NumericValidator::new()).on(EventKind::Blur, false)),
            )
            .build()
            .unwrap();

        form.set_value("bsb", "12a");
        validator.dispatch(FormEvent::input("bsb")).await;
        validator.dispatch(FormEvent::blur("bsb")).await;
        assert_eq!(validator.state(), FormState::Invalid);
        assert_eq!(validator.errors().messages("bsb"), vec!["bsb must be numeric".to_string()]);
    }

    #[tokio::test]
    async fn test_submit_completes_only_submit_bound_fields() {
        let form = Arc::new(
            MemoryForm::new()
                .with_element(FieldElement::text("bsb", "063000"))
                .with_element(FieldElement::text("nickname", ""))
                .with_button("send"),
        );
        let completed = Arc::new(StdMutex::new(Vec::new()));
        let bsb_log = completed.clone();
        let nickname_log = completed.clone();
        let validator = FormValidator::builder()
            .shared_root(form.clone())
            .field(
                "bsb",
                bsb_field().complete(move |element, state, _| {
                    bsb_log.lock().unwrap().push((element.name.clone(), state))
                }),
            )
            .field(
                "nickname",
                FieldConfig::new()
                    .with(ValidatorConfig::new(NotEmptyValidator::new()).on(EventKind::Submit, false))
                    .complete(move |element, state, _| {
                        nickname_log.lock().unwrap().push((element.name.clone(), state))
                    }),
            )
            .submit_button("send")
            .build()
            .unwrap();

        assert!(!validator.submit().await);
        assert_eq!(
            *completed.lock().unwrap(),
            vec![("bsb".to_string(), FormState::Valid)]
        );
    }
}
