//! Field rules for the two submission forms.
//!
//! Every rule runs; failures are collected rather than short-circuited so a
//! client can highlight all bad fields at once.

use serde::Serialize;

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 254;
pub const MESSAGE_MIN: usize = 10;
pub const MESSAGE_MAX: usize = 5000;
pub const SUBJECT_MAX: usize = 200;
pub const PROJECT_TYPE_MAX: usize = 100;
pub const OPTIONAL_MAX: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self { field: field.to_string(), message: message.into() }
    }
}

/// Accumulates failures across fields.
#[derive(Debug, Default)]
pub(crate) struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    pub(crate) fn length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min {
            let msg = if min == 1 {
                format!("{field} is required")
            } else {
                format!("{field} must be at least {min} characters")
            };
            self.errors.push(FieldError::new(field, msg));
        } else if len > max {
            self.errors
                .push(FieldError::new(field, format!("{field} must be at most {max} characters")));
        }
    }

    pub(crate) fn optional(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            self.length(field, v, 0, max);
        }
    }

    pub(crate) fn email(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            self.errors.push(FieldError::new(field, format!("{field} is required")));
        } else if value.chars().count() > EMAIL_MAX {
            self.errors
                .push(FieldError::new(field, format!("{field} must be at most {EMAIL_MAX} characters")));
        } else if !is_valid_email(value) {
            self.errors.push(FieldError::new(field, "email address is not valid"));
        }
    }

    pub(crate) fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() { Ok(()) } else { Err(self.errors) }
    }
}

/// One `@`, a non-empty local part, a dotted domain with no empty labels,
/// no whitespace.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

/// Trim, mapping blank to `None`.
pub(crate) fn trimmed_opt(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.co.uk"));
        assert!(!is_valid_email("ada.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@localhost"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
        assert!(!is_valid_email("ada@example."));
        assert!(!is_valid_email("ada @example.com"));
    }

    #[test]
    fn checker_collects_every_failure() {
        let mut c = Checker::default();
        c.length("name", "A", NAME_MIN, NAME_MAX);
        c.email("email", "nope");
        c.length("message", &"x".repeat(MESSAGE_MAX + 1), MESSAGE_MIN, MESSAGE_MAX);
        c.optional("subject", Some("fine"), SUBJECT_MAX);
        let errs = c.finish().unwrap_err();
        let fields: Vec<_> = errs.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["name", "email", "message"]);
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        let mut c = Checker::default();
        c.length("name", "éé", NAME_MIN, NAME_MAX);
        assert!(c.finish().is_ok());
    }

    #[test]
    fn trimmed_opt_blanks_to_none() {
        assert_eq!(trimmed_opt(Some("  ")), None);
        assert_eq!(trimmed_opt(Some(" x ")), Some("x".into()));
        assert_eq!(trimmed_opt(None), None);
    }
}
