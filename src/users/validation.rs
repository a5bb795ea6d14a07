use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::dto::{LoginRequest, RegisterRequest};

pub const MAX_USERNAME_LEN: usize = 100;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_PASSWORD_LEN: usize = 100;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^\S+$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Name,
    Password,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Username => "username",
            Field::Name => "name",
            Field::Password => "password",
        })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(Field),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: Field, max: usize },

    #[error("{0} must not contain whitespace")]
    Whitespace(Field),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

fn check_len(field: Field, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

fn check_username(username: &str) -> ValidationResult<()> {
    check_len(Field::Username, username, MAX_USERNAME_LEN)?;
    if !USERNAME_RE.is_match(username) {
        return Err(ValidationError::Whitespace(Field::Username));
    }
    Ok(())
}

/// Checks a registration payload and hands it back untouched.
pub fn register(req: RegisterRequest) -> ValidationResult<RegisterRequest> {
    check_username(&req.username)?;
    check_len(Field::Name, &req.name, MAX_NAME_LEN)?;
    check_len(Field::Password, &req.password, MAX_PASSWORD_LEN)?;
    Ok(req)
}

/// Login only needs the shape checked; the whitespace rule applies at registration.
pub fn login(req: LoginRequest) -> ValidationResult<LoginRequest> {
    check_len(Field::Username, &req.username, MAX_USERNAME_LEN)?;
    check_len(Field::Password, &req.password, MAX_PASSWORD_LEN)?;
    Ok(req)
}
