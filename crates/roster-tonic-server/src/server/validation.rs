//! Stateless validation of inbound user requests.
//!
//! Rules are checked in a fixed order and the first violation is returned as
//! an [`Error::Validation`] whose reason is shown to the client verbatim:
//!
//! 1. name present and at most [`MAX_NAME_LEN`] characters
//! 2. email present and well-formed
//! 3. age within [`MIN_AGE`]..=[`MAX_AGE`]
//! 4. (updates only) id positive

use regex::Regex;
use roster_tonic_core::{
    Error, Result,
    proto::{CreateUserRequest, UpdateUserRequest},
    types::{MAX_AGE, MAX_NAME_LEN, MIN_AGE, UserId},
};
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    // One `@`, no whitespace, and a dotted domain.
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

pub fn validate_create(req: &CreateUserRequest) -> Result<()> {
    validate_fields(&req.name, &req.email, req.age)
}

pub fn validate_update(req: &UpdateUserRequest) -> Result<()> {
    validate_fields(&req.name, &req.email, req.age)?;
    validate_id(req.id)
}

/// Rejects non-positive ids before any store access.
pub fn validate_id(id: UserId) -> Result<()> {
    if id <= 0 {
        return Err(Error::validation("Invalid user ID"));
    }
    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn validate_fields(name: &str, email: &str, age: i32) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("Name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::validation(format!(
            "Name must not exceed {MAX_NAME_LEN} characters"
        )));
    }
    if email.trim().is_empty() {
        return Err(Error::validation("Email is required"));
    }
    if !is_valid_email(email) {
        return Err(Error::validation("Invalid email format"));
    }
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(Error::validation(format!(
            "Age must be between {MIN_AGE} and {MAX_AGE}"
        )));
    }
    Ok(())
}
