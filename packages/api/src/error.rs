//! Error body returned by the server with a non-2xx status.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The JSON body the server sends alongside 4xx and 5xx statuses.
///
/// ```json
/// { "error": "Invalid credentials" }
/// ```
///
/// The client never inspects statuses, so an error-shaped body arrives as an
/// ordinary successful result. Use [`ErrorResponse::from_value`] to tell the
/// two apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable description of the problem.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Returns the error if `value` is an object carrying a string `error`
    /// field, `None` otherwise.
    pub fn from_value(value: &Value) -> Option<Self> {
        value
            .get("error")
            .and_then(Value::as_str)
            .map(Self::new)
    }
}

/// Messages the server is known to send.
pub mod messages {
    pub const POST_NOT_FOUND: &str = "Post not found";
    pub const INVALID_NUMBER: &str = "Invalid number";
    pub const CONTENT_REQUIRED: &str = "Content is required";
    pub const CONTENT_TOO_LONG: &str = "Content too long (max 1000 characters)";
    pub const RELATED_NOT_FOUND: &str = "Related post not found";
    pub const PERMISSION_DENIED: &str = "Permission denied";
    pub const CREDENTIALS_REQUIRED: &str = "Username and password are required";
    pub const USERNAME_TAKEN: &str = "Username already exists";
    pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
    pub const INVALID_JSON: &str = "Invalid JSON";
    pub const INTERNAL_ERROR: &str = "Internal server error";
}
