//! # form-validator
//!
//! Event-driven validation of form fields. A [`FormValidator`] owns a form
//! container, runs the validators configured for each field when the
//! container reports `input`, `blur`, `change` or a submit click, and keeps
//! the form in one of three states: valid, invalid or pending.
//!
//! Validators come from typed builders, from JSON, or from `vr-*`
//! attributes on the elements themselves (declarative mode).
//!
//! ```rust
//! use std::sync::Arc;
//! use form_validator::{FieldConfig, FieldElement, FormEvent, FormValidator, MemoryForm};
//! use form_validator::validators::{NotEmptyValidator, NumericValidator};
//!
//! # tokio_test::block_on(async {
//! let form = Arc::new(MemoryForm::new().with_element(FieldElement::text("bsb", "")));
//! let validator = FormValidator::builder()
//!     .shared_root(form.clone())
//!     .field(
//!         "bsb",
//!         FieldConfig::new()
//!             .validator(NotEmptyValidator::new().trim(true))
//!             .validator(NumericValidator::new()),
//!     )
//!     .build()
//!     .unwrap();
//!
//! form.set_value("bsb", "063000");
//! validator.dispatch(FormEvent::input("bsb")).await;
//! assert!(validator.valid());
//! # });
//! ```

pub mod config;
pub mod controller;
pub mod declarative;
pub mod dom;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod registry;
pub mod traits;
pub mod validators;

pub use config::{
    BeginCallback, CompleteCallback, FieldConfig, FormConfig, FormOptions, StateChangeCallback,
    SubmitCallback, Triggers, ValidatorConfig,
};
pub use controller::{FormValidator, FormValidatorBuilder};
pub use dom::{FieldElement, FormContainer, InputKind, MemoryForm};
pub use error::{ConfigError, ConfigResult, PredicateError, ValidationError, ValidationErrors};
pub use evaluator::{evaluate_field, FieldReport};
pub use events::{EventKind, FormEvent, FormState, SubmitEvent};
pub use registry::CallbackRegistry;
pub use traits::{FieldValue, ValidationRule};
pub use validators::{Validator, ValidatorName};
