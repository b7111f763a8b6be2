//! Error types for LLM calls.

/// Error from chat completion operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("LLM request failed: {0}")]
    HttpRequest(#[from] ureq::Error),

    /// HTTP response error (provider returned error status).
    #[error("LLM API error: {status} - {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain provider error details).
        body: String,
    },

    /// JSON serialization/deserialization error.
    #[error("LLM response parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The completion came back with no usable text.
    #[error("LLM returned an empty completion")]
    EmptyCompletion,
}
