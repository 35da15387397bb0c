//! Field validation.
//!
//! Validators collect into a [`FieldErrors`] map so a response can report
//! every failing field at once, mirroring the envelope's `errors` object.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ApiError, FieldErrors};

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_CAPTION_LEN: usize = 1000;
pub const MAX_COMMENT_LEN: usize = 1000;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Accumulates field errors and converts into an [`ApiError::Validation`].
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// `Err` when any field failed.
    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }

    /// Consume into an error unconditionally.  Used when the caller has just
    /// recorded a failure it cannot proceed past.
    pub fn into_error(self) -> ApiError {
        ApiError::Validation(self.errors)
    }

    pub fn check_name(&mut self, name: &str) {
        if name.trim().is_empty() {
            self.add("name", "The name field is required.");
        } else if name.len() > MAX_NAME_LEN {
            self.add("name", "The name may not be greater than 255 characters.");
        }
    }

    pub fn check_username(&mut self, username: &str) {
        if username.is_empty() {
            self.add("username", "The username field is required.");
        } else if username.len() > MAX_NAME_LEN {
            self.add(
                "username",
                "The username may not be greater than 255 characters.",
            );
        } else if !USERNAME_PATTERN.is_match(username) {
            self.add(
                "username",
                "The username may only contain letters, numbers, dashes and underscores.",
            );
        }
    }

    pub fn check_email(&mut self, email: &str) {
        if email.is_empty() {
            self.add("email", "The email field is required.");
        } else if email.len() > MAX_NAME_LEN || !EMAIL_PATTERN.is_match(email) {
            self.add("email", "The email must be a valid email address.");
        }
    }

    pub fn check_password(&mut self, field: &str, password: &str) {
        if password.len() < MIN_PASSWORD_LEN {
            self.add(field, "The password must be at least 8 characters.");
        }
    }

    pub fn check_caption(&mut self, caption: &str) {
        if caption.len() > MAX_CAPTION_LEN {
            self.add(
                "caption",
                "The caption may not be greater than 1000 characters.",
            );
        }
    }

    pub fn check_comment_body(&mut self, body: &str) {
        if body.trim().is_empty() {
            self.add("body", "The body field is required.");
        } else if body.len() > MAX_COMMENT_LEN {
            self.add("body", "The body may not be greater than 1000 characters.");
        }
    }
}
