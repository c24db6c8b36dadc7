//! Parsed error payload of a failed API response.
//!
//! The API answers failed calls with a JSON body shaped like:
//!
//! ```json
//! {
//!   "code": "INVALID_PARAMETER",
//!   "message": "Bad input",
//!   "errors": [{ "field": "file", "message": "required" }]
//! }
//! ```
//!
//! [`Status`] is the canonical, immutable form of that body.

use std::collections::BTreeMap;
use std::fmt;

use derive_more::Display;
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// Structured error payload extracted from an HTTP error body.
///
/// Only a JSON object is accepted. Absent, `null` or unknown fields never
/// fail parsing: missing values fall back to the neutral value returned by
/// [`Status::default`]. An `errors` value of an unknown shape is ignored so
/// that `code` and `message` survive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Status {
    code: String,
    message: String,
    errors: Vec<FieldError>,
}

impl Status {
    /// Create a status from its parts.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        errors: Vec<FieldError>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            errors,
        }
    }

    /// Machine-readable error code (e.g. `INVALID_PARAMETER`).
    ///
    /// Numeric codes are kept in their decimal form.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human-readable error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Field-level errors, in the order the server sent them.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Field errors reported for a single field path.
    pub fn errors_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |error| error.field == field)
    }

    /// Returns `true` if this is the neutral status (no code, message, or errors).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.message.is_empty() && self.errors.is_empty()
    }
}

/// A `(field path, message)` pair describing why a request field was rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Display, Deserialize)]
#[display("{field}: {message}")]
#[serde(default)]
pub struct FieldError {
    #[serde(deserialize_with = "deserialize_text")]
    field: String,
    #[serde(deserialize_with = "deserialize_text")]
    message: String,
}

impl FieldError {
    /// Create a field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Path of the offending field (e.g. `tasks.import.url`).
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Why the field was rejected.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ============================================================================
// Wire helpers
// ============================================================================

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StatusVisitor)
    }
}

struct StatusVisitor;

impl<'de> Visitor<'de> for StatusVisitor {
    type Value = Status;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an error status object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Status, A::Error> {
        let mut status = Status::default();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "code" => {
                    status.code = map
                        .next_value::<Option<RawCode>>()?
                        .map(RawCode::into_text)
                        .unwrap_or_default();
                }
                "message" => {
                    status.message = map.next_value::<Option<String>>()?.unwrap_or_default();
                }
                "errors" => {
                    status.errors = map
                        .next_value::<Option<RawFieldErrors>>()?
                        .map(RawFieldErrors::flatten)
                        .unwrap_or_default();
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(status)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCode {
    Text(String),
    Number(serde_json::Number),
}

impl RawCode {
    fn into_text(self) -> String {
        match self {
            Self::Text(code) => code,
            Self::Number(code) => code.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFieldErrors {
    List(Vec<FieldError>),
    ByField(BTreeMap<String, RawMessages>),
    Unknown(IgnoredAny),
}

impl RawFieldErrors {
    // The object form `{"field": ["msg", ...]}` is flattened in key order.
    fn flatten(self) -> Vec<FieldError> {
        match self {
            Self::List(errors) => errors,
            Self::ByField(by_field) => by_field
                .into_iter()
                .flat_map(|(field, messages)| {
                    let messages = match messages {
                        RawMessages::One(message) => vec![message],
                        RawMessages::Many(messages) => messages,
                    };
                    messages
                        .into_iter()
                        .map(move |message| FieldError::new(field.clone(), message))
                })
                .collect(),
            Self::Unknown(_) => Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMessages {
    One(String),
    Many(Vec<String>),
}

fn deserialize_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Status {
        serde_json::from_str(json).expect("valid status")
    }

    #[test]
    fn default_is_neutral() {
        let status = Status::default();
        assert_eq!(status.code(), "");
        assert_eq!(status.message(), "");
        assert!(status.errors().is_empty());
        assert!(status.is_empty());
    }

    #[test]
    fn parses_full_body() {
        let status = parse(
            r#"{"code":"INVALID_PARAMETER","message":"Bad input","errors":[{"field":"file","message":"required"}]}"#,
        );

        assert_eq!(status.code(), "INVALID_PARAMETER");
        assert_eq!(status.message(), "Bad input");
        assert_eq!(status.errors(), &[FieldError::new("file", "required")]);
        assert!(!status.is_empty());
    }

    #[test]
    fn missing_and_null_fields_default() {
        assert_eq!(parse("{}"), Status::default());
        assert_eq!(
            parse(r#"{"code":null,"message":null,"errors":null}"#),
            Status::default()
        );
        assert_eq!(parse(r#"{"message":"Oops"}"#).code(), "");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let status = parse(r#"{"code":"X","message":"m","trace_id":"abc","data":{"a":1}}"#);
        assert_eq!(status, Status::new("X", "m", vec![]));
    }

    #[test]
    fn numeric_code_kept_as_text() {
        assert_eq!(parse(r#"{"code":42}"#).code(), "42");
        assert_eq!(parse(r#"{"code":-7}"#).code(), "-7");
    }

    #[test]
    fn errors_by_field_are_flattened_in_key_order() {
        let status = parse(
            r#"{"errors":{"tasks.url":["invalid","too long"],"file":"required"}}"#,
        );

        assert_eq!(
            status.errors(),
            &[
                FieldError::new("file", "required"),
                FieldError::new("tasks.url", "invalid"),
                FieldError::new("tasks.url", "too long"),
            ]
        );
    }

    #[test]
    fn errors_for_filters_by_field() {
        let status = Status::new(
            "INVALID_DATA",
            "",
            vec![
                FieldError::new("file", "required"),
                FieldError::new("url", "invalid"),
                FieldError::new("file", "too large"),
            ],
        );

        let messages: Vec<_> = status.errors_for("file").map(FieldError::message).collect();
        assert_eq!(messages, ["required", "too large"]);
    }

    #[test]
    fn field_error_display() {
        assert_eq!(FieldError::new("file", "required").to_string(), "file: required");
    }

    #[test]
    fn wrong_shape_is_rejected() {
        assert!(serde_json::from_str::<Status>(r#"{"code":true}"#).is_err());
        assert!(serde_json::from_str::<Status>(r#"{"message":["a"]}"#).is_err());
        assert!(serde_json::from_str::<Status>(r#""plain text""#).is_err());
    }

    #[test]
    fn arrays_are_not_statuses() {
        assert!(serde_json::from_str::<Status>("[]").is_err());
        assert!(serde_json::from_str::<Status>(r#"["INVALID_PARAMETER","Bad input"]"#).is_err());
        assert!(serde_json::from_str::<Status>("[42]").is_err());
    }

    #[test]
    fn unknown_errors_shape_keeps_code_and_message() {
        let status = parse(
            r#"{"code":"INVALID_DATA","message":"Bad input","errors":["file is required"]}"#,
        );
        assert_eq!(status, Status::new("INVALID_DATA", "Bad input", vec![]));

        let status = parse(r#"{"code":"X","errors":"nope"}"#);
        assert_eq!(status.code(), "X");
        assert!(status.errors().is_empty());
    }
}
