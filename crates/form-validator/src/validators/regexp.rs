//! Regular expression validator

use crate::error::PredicateError;
use crate::traits::{FieldValue, ValidationRule};
use crate::validators::ValidatorName;
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

/// Validator that passes when the pattern matches somewhere in the value
#[derive(Debug, Clone)]
pub struct RegexpValidator {
    pattern: Regex,
    /// Source as written, including `/.../flags` delimiters if any
    source: String,
    /// Custom error message
    pub message: Option<String>,
}

impl RegexpValidator {
    /// Compile a pattern.
    ///
    /// Accepts bare patterns (`^\d+$`) and literal form (`/^password$/i`).
    /// Literal flags `i`, `m`, `s` and `x` map onto the regex builder; `g`,
    /// `u` and `y` have no effect on a match test and are ignored.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let (body, flags) = split_literal(pattern);
        let mut builder = RegexBuilder::new(body);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                _ => {}
            }
        }
        Ok(Self {
            pattern: builder.build()?,
            source: pattern.to_string(),
            message: None,
        })
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn check(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }
}

/// Split `/body/flags` into its parts; anything else is a bare body
fn split_literal(pattern: &str) -> (&str, &str) {
    if let Some(rest) = pattern.strip_prefix('/') {
        if let Some(end) = rest.rfind('/') {
            let flags = &rest[end + 1..];
            if flags.chars().all(|c| "gimsuxy".contains(c)) {
                return (&rest[..end], flags);
            }
        }
    }
    (pattern, "")
}

#[async_trait]
impl ValidationRule for RegexpValidator {
    async fn evaluate(&self, value: &FieldValue) -> Result<bool, PredicateError> {
        Ok(self.check(value.as_text()))
    }

    fn rule_name(&self) -> ValidatorName {
        ValidatorName::Regexp
    }

    fn error_message(&self, field: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("{} does not match the required pattern", field))
    }

    fn parameters(&self) -> Option<Value> {
        Some(serde_json::json!({
            "regexp": self.source,
            "message": self.message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_anchored_pattern_is_case_sensitive() {
        let validator = RegexpValidator::new("/^password$/").unwrap();
        assert_eq!(validator.evaluate(&"password".into()).await, Ok(true));
        assert_eq!(validator.evaluate(&"Password".into()).await, Ok(false));
    }

    #[tokio::test]
    async fn test_literal_flags() {
        let validator = RegexpValidator::new("/^password$/i").unwrap();
        assert_eq!(validator.evaluate(&"PassWord".into()).await, Ok(true));
    }

    #[test]
    fn test_unanchored_pattern_searches() {
        let validator = RegexpValidator::new(r"\d{3}").unwrap();
        assert!(validator.check("abc123def"));
        assert!(!validator.check("abc12"));
    }

    #[test]
    fn test_bare_slashes_are_not_a_literal() {
        assert_eq!(split_literal("/usr/local"), ("/usr/local", ""));
        assert_eq!(split_literal("/a+/gi"), ("a+", "gi"));
        assert_eq!(split_literal("a/b"), ("a/b", ""));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(RegexpValidator::new("(unclosed").is_err());
    }

    #[test]
    fn test_parameters_keep_source() {
        let validator = RegexpValidator::new("/^x$/i").unwrap().message("nope");
        let params = validator.parameters().unwrap();
        assert_eq!(params["regexp"], "/^x$/i");
        assert_eq!(params["message"], "nope");
    }
}
