use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("This field is required.")]
    Missing,

    #[error("Username must be between {min} and {max} characters long.")]
    InvalidLength { min: usize, max: usize },

    #[error("Only letters, numbers, . _ -")]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("This field is required.")]
    Missing,

    #[error("Email must be at most {max} characters long.")]
    TooLong { max: usize },

    #[error("Invalid email address.")]
    InvalidFormat,
}

/// Error for Password validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("This field is required.")]
    Missing,

    #[error("Use at least {min} characters")]
    TooShort { min: usize },

    #[error("Passwords must match")]
    Mismatch,
}

/// Error for bounded free-text fields (names and address parts)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TextFieldError {
    #[error("This field is required.")]
    Missing,

    #[error("Field must be between {min} and {max} characters long.")]
    InvalidLength { min: usize, max: usize },
}

/// Error for Role parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("This field is required.")]
    Missing,

    #[error("Not a valid choice.")]
    Unknown(String),
}

/// Field-level validation errors collected across a whole form.
///
/// Keyed by form field name; every message is user-facing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error message against a field.
    pub fn add(&mut self, field: &'static str, message: impl ToString) {
        self.0.entry(field).or_default().push(message.to_string());
    }

    /// Keep the value of a successful validation, or record its error.
    pub fn check<T, E: ToString>(&mut self, field: &'static str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.add(field, e);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

/// Error for image store operations
#[derive(Debug, Clone, Error)]
pub enum ImageStoreError {
    #[error("An image named {0} already exists")]
    AlreadyExists(String),

    #[error("Image store I/O failure: {0}")]
    Io(String),
}

/// Top-level error for all user-related operations
#[derive(Debug, Clone, Error)]
pub enum UserError {
    // Value validation errors on rows read back from storage
    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid text field: {0}")]
    InvalidTextField(#[from] TextFieldError),

    #[error("Invalid role: {0:?}")]
    InvalidRole(#[from] RoleError),

    // Domain-level errors
    #[error("Username already exists: {0}")]
    UsernameAlreadyExists(String),

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    // Infrastructure errors
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Image store error: {0}")]
    ImageStore(#[from] ImageStoreError),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
