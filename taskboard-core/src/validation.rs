/// Field-level validation
///
/// Every entity validates its input with plain functions built from the rules
/// in this module. Failures are collected into a [`FieldErrors`] map keyed by
/// the form field name, so a caller can re-render the form with the messages
/// next to the offending inputs.
///
/// All rules for a field run; a field can carry several messages at once (an
/// empty first name is both unfilled and too short).
///
/// # Example
///
/// ```
/// use taskboard_core::validation::{check_length, check_not_empty, FieldErrors, FILL_MESSAGE};
///
/// let mut errors = FieldErrors::new();
/// check_not_empty(&mut errors, "firstName", "");
/// check_length(&mut errors, "firstName", "", 3, 20);
///
/// assert_eq!(errors.get("firstName").map(|m| m.len()), Some(2));
/// assert!(errors.has("firstName", FILL_MESSAGE));
/// ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::ValidateEmail;

/// Message for a required field left blank
pub const FILL_MESSAGE: &str = "The field should be filled";

/// Message for a malformed email address
pub const EMAIL_MESSAGE: &str = "Not a valid email format";

/// Message for a reference to a record that does not exist
pub const REFERENCE_MESSAGE: &str = "must reference an existing record";

/// Longest value a `VARCHAR(255)` column accepts
pub const MAX_COLUMN_LENGTH: usize = 255;

/// Message for a string whose length is outside `[min, max]`
pub fn length_message(min: usize, max: usize) -> String {
    format!(
        "Min string length {} characters, max string length {} characters",
        min, max
    )
}

/// Message for a value that collides with an existing record
pub fn unique_message(field: &str) -> String {
    format!("{} must be unique", field)
}

/// Mapping from field name to the validation messages raised for it
///
/// Serializes as `{ "field": ["message", ...] }`. Fields are kept in sorted
/// order; messages keep the order they were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Creates an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map holding a single message
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records a message against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Moves every message of `other` into this map
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one message
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Messages recorded for a field
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Whether `field` carries exactly `message`
    pub fn has(&self, field: &str, message: &str) -> bool {
        self.get(field)
            .map(|messages| messages.iter().any(|m| m == message))
            .unwrap_or(false)
    }

    /// Names of the failing fields, sorted
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when no message was recorded, the map itself otherwise
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Fails when the value is empty or whitespace only
pub fn check_not_empty(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, FILL_MESSAGE);
    }
}

/// Fails when the value's character count is outside `[min, max]`
pub fn check_length(errors: &mut FieldErrors, field: &str, value: &str, min: usize, max: usize) {
    let length = value.chars().count();
    if length < min || length > max {
        errors.add(field, length_message(min, max));
    }
}

/// Fails when the value is not a syntactically valid email address
pub fn check_email(errors: &mut FieldErrors, field: &str, value: &str) {
    if !value.validate_email() {
        errors.add(field, EMAIL_MESSAGE);
    }
}

/// Fails when the value is empty or longer than its column allows
pub fn check_name(errors: &mut FieldErrors, field: &str, value: &str) {
    check_not_empty(errors, field, value);
    check_length(errors, field, value, 1, MAX_COLUMN_LENGTH);
}

/// Fails when a required reference id is not a positive surrogate key
pub fn check_reference(errors: &mut FieldErrors, field: &str, id: i32) {
    if id <= 0 {
        errors.add(field, FILL_MESSAGE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_message() {
        assert_eq!(
            length_message(3, 20),
            "Min string length 3 characters, max string length 20 characters"
        );
    }

    #[test]
    fn test_not_empty_rejects_whitespace() {
        let mut errors = FieldErrors::new();
        check_not_empty(&mut errors, "name", "   \t");
        assert!(errors.has("name", FILL_MESSAGE));

        let mut errors = FieldErrors::new();
        check_not_empty(&mut errors, "name", "New");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_length_counts_characters() {
        let mut errors = FieldErrors::new();
        check_length(&mut errors, "firstName", "Zoë", 3, 20);
        assert!(errors.is_empty());

        check_length(&mut errors, "firstName", "Al", 3, 20);
        check_length(&mut errors, "lastName", &"x".repeat(21), 3, 20);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_email_rule() {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, "email", "jane@example.com");
        assert!(errors.is_empty());

        check_email(&mut errors, "email", "not-an-email");
        assert!(errors.has("email", EMAIL_MESSAGE));
    }

    #[test]
    fn test_name_rule_caps_column_length() {
        let mut errors = FieldErrors::new();
        check_name(&mut errors, "name", &"x".repeat(MAX_COLUMN_LENGTH));
        assert!(errors.is_empty());

        check_name(&mut errors, "name", &"x".repeat(MAX_COLUMN_LENGTH + 1));
        assert!(errors.has("name", &length_message(1, MAX_COLUMN_LENGTH)));
    }

    #[test]
    fn test_reference_rule() {
        let mut errors = FieldErrors::new();
        check_reference(&mut errors, "statusId", 0);
        check_reference(&mut errors, "creatorId", 7);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["statusId"]);
    }

    #[test]
    fn test_merge_and_display() {
        let mut errors = FieldErrors::single("email", unique_message("email"));
        errors.merge(FieldErrors::single("firstName", FILL_MESSAGE));

        assert_eq!(
            errors.to_string(),
            "email: email must be unique; firstName: The field should be filled"
        );
    }

    #[test]
    fn test_serializes_grouped_by_field() {
        let mut errors = FieldErrors::new();
        errors.add("firstName", FILL_MESSAGE);
        errors.add("firstName", length_message(3, 20));

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["firstName"].as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn test_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());
        assert!(FieldErrors::single("name", FILL_MESSAGE).into_result().is_err());
    }
}
