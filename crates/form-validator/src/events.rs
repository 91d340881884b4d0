//! Form states and the events the controller consumes

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validity of the whole form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormState {
    Valid,
    Invalid,
    /// At least one validator has not resolved yet
    Pending,
}

impl FormState {
    pub fn from_validity(valid: bool) -> Self {
        if valid {
            FormState::Valid
        } else {
            FormState::Invalid
        }
    }

    pub fn is_valid(self) -> bool {
        self == FormState::Valid
    }
}

impl fmt::Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FormState::Valid => "valid",
            FormState::Invalid => "invalid",
            FormState::Pending => "pending",
        })
    }
}

/// Event types a validator can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Input,
    Blur,
    Change,
    Submit,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Input,
        EventKind::Blur,
        EventKind::Change,
        EventKind::Submit,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::Input => "input",
            EventKind::Blur => "blur",
            EventKind::Change => "change",
            EventKind::Submit => "submit",
        })
    }
}

/// A primitive event raised by the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// Value edited on the named field
    Input { field: String },
    /// Named field lost focus
    Blur { field: String },
    /// Named field committed a change (select, radio, checkbox)
    Change { field: String },
    /// Element with this id was clicked
    Click { element: String },
}

impl FormEvent {
    pub fn input(field: impl Into<String>) -> Self {
        FormEvent::Input { field: field.into() }
    }

    pub fn blur(field: impl Into<String>) -> Self {
        FormEvent::Blur { field: field.into() }
    }

    pub fn change(field: impl Into<String>) -> Self {
        FormEvent::Change { field: field.into() }
    }

    pub fn click(element: impl Into<String>) -> Self {
        FormEvent::Click {
            element: element.into(),
        }
    }
}

/// Passed to the `on_submit` callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitEvent {
    /// Id of the element that triggered the submit, if any
    pub source: Option<String>,
}
