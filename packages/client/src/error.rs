//! Errors surfaced by [`SnsClient`](crate::SnsClient) operations.

/// Everything that can make an operation fail.
///
/// A server answering with an error status and a JSON body is **not** a
/// failure: the body comes back as the operation's value. Use
/// [`sns_api::ErrorResponse::from_value`] to recognise it.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the response body could not be read.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body is empty or not JSON.
    #[error("response with status {status} is not valid JSON: {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// The configured origin cannot be turned into request URLs.
    #[error("invalid API server origin: {0}")]
    InvalidOrigin(String),

    /// An empty post identifier was supplied; no request is sent.
    #[error("post identifier must not be empty")]
    InvalidPostId,
}
