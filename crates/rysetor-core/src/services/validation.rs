//! Field validation helpers. Failures accumulate so a form reports every
//! problem at once.
//!
//! The per-value checks come from the `validator` crate; this module only
//! turns their verdicts into `FieldError`s with the messages forms expect.

use validator::{ValidateEmail, ValidateLength};

use crate::error::{DomainError, FieldError};

pub(crate) const REQUIRED: &str = "This field is required.";

#[derive(Debug, Default)]
pub(crate) struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if !value.trim().validate_length(Some(1u64), None, None) {
            self.push(field, REQUIRED);
        }
        self
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if !value.validate_length(None, Some(max as u64), None) {
            self.push(
                field,
                format!("Field cannot be longer than {max} characters."),
            );
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(field, REQUIRED);
        } else if !is_valid_email(value) {
            self.push(field, "Invalid email address.");
        }
        self
    }

    /// Whether `field` already has an error recorded.
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn finish(self) -> Result<(), DomainError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.errors))
        }
    }
}

/// HTML5 e-mail grammar via `validator`, tightened to what mail servers
/// actually deliver: a dotted domain and no empty dot-atoms in the local part.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if !email.validate_email() {
        return false;
    }
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    let dot_atoms = local.split('.').all(|atom| !atom.is_empty());
    let dotted_domain = domain.starts_with('[') || domain.contains('.');
    dot_atoms && dotted_domain
}
