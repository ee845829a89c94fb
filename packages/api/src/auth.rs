//! Account types: `POST /signup/`, `POST /login/`, `POST /logout/`.

use serde::{Deserialize, Serialize};

/// Request body for `POST /signup/` and `POST /login/`.
///
/// ```json
/// { "username": "alice", "password": "hunter2" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Success body of the account endpoints.
///
/// ```json
/// { "message": "Login successful" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}
