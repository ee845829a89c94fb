//! Client configuration, optionally populated from environment variables.

/// Origin used when nothing else is configured.
pub const DEFAULT_API_SERVER: &str = "http://localhost:8000";

/// Runtime configuration for an [`SnsClient`](crate::SnsClient).
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `SNS_API_SERVER` | `http://localhost:8000` | Origin every request path is appended to |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and port of the server, e.g. `"https://sns.example.com"`.
    /// A trailing `/` is ignored.
    pub api_server: String,
}

impl ClientConfig {
    pub fn new(api_server: impl Into<String>) -> Self {
        Self {
            api_server: api_server.into(),
        }
    }

    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Self {
        Self {
            api_server: std::env::var("SNS_API_SERVER")
                .unwrap_or_else(|_| DEFAULT_API_SERVER.into()),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_SERVER)
    }
}
