use std::fmt;

use serde::{Deserialize, Serialize};

use super::repo_types::User;

const REDACTED: &str = "[redacted]";

/// Request body for user registration. Missing fields arrive empty and fail validation.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub name: String,
    pub password: String,
}

// Request payloads get logged; the password never does.
impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("name", &self.name)
            .field("password", &REDACTED)
            .finish()
    }
}

/// Request body for login.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}

/// Public view of a user. `token` is only present right after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl UserResponse {
    pub fn public(user: User) -> Self {
        Self {
            username: user.username,
            name: user.name,
            token: None,
        }
    }

    pub fn with_token(user: User) -> Self {
        Self {
            username: user.username,
            name: user.name,
            token: user.token,
        }
    }
}

/// Envelope for successful responses.
#[derive(Debug, Serialize)]
pub struct WebResponse<T> {
    pub data: T,
}

impl<T> WebResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
