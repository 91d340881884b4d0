//! Signup form demo
//!
//! Drives an in-memory signup form through typing, selection and submit,
//! printing what each field's completion callback would render.
//!
//! Run with `RUST_LOG=form_validator=debug` to see dispatch and state logs.

use std::sync::Arc;

use form_validator::validators::{
    ChoiceValidator, CustomValidator, NotEmptyValidator, NumericValidator, RegexpValidator,
    StringLengthValidator,
};
use form_validator::{
    CompleteCallback, EventKind, FieldConfig, FieldElement, FormEvent, FormState, FormValidator,
    MemoryForm, ValidatorConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn render_field() -> CompleteCallback {
    Arc::new(|field: &FieldElement, state: FormState, errors: &[String]| {
        let marker = if state == FormState::Invalid { "has-error" } else { "ok" };
        println!("  [{}] {}", marker, field.name);
        for message in errors {
            println!("      {}", message);
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let form = Arc::new(
        MemoryForm::new()
            .with_element(FieldElement::text("bsb", ""))
            .with_element(FieldElement::text("password", ""))
            .with_element(FieldElement::radio("radio-example", "one"))
            .with_element(FieldElement::radio("radio-example", "two"))
            .with_element(FieldElement::checkbox("checkbox-example", "a"))
            .with_element(FieldElement::checkbox("checkbox-example", "b"))
            .with_element(FieldElement::checkbox("checkbox-example", "c"))
            .with_element(FieldElement::checkbox("checkbox-example", "d"))
            .with_button("submit"),
    );

    let choice_on_change = |validator: ChoiceValidator| {
        ValidatorConfig::new(validator)
            .on(EventKind::Input, false)
            .on(EventKind::Blur, false)
    };

    let validator = FormValidator::builder()
        .shared_root(form.clone())
        .field(
            "bsb",
            FieldConfig::new()
                .validator(NotEmptyValidator::new().trim(true).message("You must enter a BSB"))
                .validator(NumericValidator::new().message("BSB must be numeric"))
                .validator(
                    StringLengthValidator::new()
                        .range(6, 9)
                        .trim(true)
                        .message("BSB should be between 6 and 9 characters"),
                )
                .complete_callback(render_field()),
        )
        .field(
            "password",
            FieldConfig::new()
                .validator(NotEmptyValidator::new().message("You must enter a password"))
                .validator(RegexpValidator::new("/^password$/")?.message("Password should be \"password\""))
                .validator(
                    CustomValidator::new(|value| value.len() > 2)
                        .named("longerThanTwo")
                        .message("Must be more than 2 characters"),
                )
                .complete_callback(render_field()),
        )
        .field(
            "radio-example",
            FieldConfig::new()
                .with(choice_on_change(ChoiceValidator::new().min(1).message("Select one")))
                .complete_callback(render_field()),
        )
        .field(
            "checkbox-example",
            FieldConfig::new()
                .with(choice_on_change(
                    ChoiceValidator::new().range(2, 3).message("Select between 2 & 3"),
                ))
                .complete_callback(render_field()),
        )
        .submit_button("submit")
        .on_submit(|_event, valid| {
            if valid {
                println!("Submitted!");
            } else {
                println!("Submit blocked, fix the errors above");
            }
        })
        .build()?;

    println!("Typing a BSB:");
    for typed in ["06", "063a", "063000"] {
        form.set_value("bsb", typed);
        validator.dispatch(FormEvent::input("bsb")).await;
    }

    println!("\nFirst submit:");
    validator.dispatch(FormEvent::click("submit")).await;

    println!("\nFilling in the rest:");
    form.set_value("password", "password");
    validator.dispatch(FormEvent::blur("password")).await;
    form.set_checked("radio-example", "two", true);
    validator.dispatch(FormEvent::change("radio-example")).await;
    for value in ["a", "c"] {
        form.set_checked("checkbox-example", value, true);
        validator.dispatch(FormEvent::change("checkbox-example")).await;
    }

    println!("\nSecond submit:");
    validator.dispatch(FormEvent::click("submit")).await;
    println!("\nForm state: {}", validator.state());

    Ok(())
}
