//! Diagram rendering via Kroki for Ideagram.
//!
//! This crate provides the render half of the generate/repair loop:
//! - [`encode_source`]: reversible URL-safe encoding of diagram source
//! - [`KrokiClient`]: single-request SVG rendering against a Kroki server
//! - [`DiagramRenderer`]: the injectable rendering capability, so the
//!   request pipeline can be driven by a deterministic stub in tests
//!
//! The client performs exactly one HTTP request per render and never
//! retries internally; retry policy belongs to the caller.

mod consts;
mod encode;

use std::time::Duration;

use tracing::debug;
use ureq::Agent;

use crate::consts::DEFAULT_TIMEOUT;
pub use crate::encode::encode_source;

/// Diagram rendering error.
#[derive(Debug, thiserror::Error)]
pub enum KrokiError {
    /// Render service rejected the diagram (or itself failed) with an HTTP
    /// error status. This is the only retry-eligible failure.
    #[error("Kroki API responded with status {status}")]
    Status {
        /// HTTP status code of the failed render call.
        status: u16,
    },

    /// Transport-level failure: connect error, timeout, TLS, DNS.
    #[error("Kroki request failed: {0}")]
    Transport(String),

    /// Response body could not be read as SVG text.
    #[error("invalid Kroki response body: {0}")]
    Body(String),
}

/// Rendering capability consumed by the request pipeline.
///
/// [`KrokiClient`] is the production implementation; tests substitute
/// stubs with scripted outcomes.
pub trait DiagramRenderer: Send + Sync {
    /// Render diagram source to SVG markup.
    fn render_svg(&self, source: &str) -> Result<String, KrokiError>;
}

/// Kroki render client.
///
/// Sends diagram source as a deflate + URL-safe base64 path segment in a
/// single GET request and returns the response body as SVG text.
pub struct KrokiClient {
    agent: Agent,
    base_url: String,
}

impl KrokiClient {
    /// Create a new client for the given Kroki server URL.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = KrokiClient::new("https://kroki.io");
    /// ```
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new client with a custom HTTP timeout.
    #[must_use]
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Render diagram source to SVG via the Kroki `plantuml/svg` endpoint.
    ///
    /// # Errors
    ///
    /// - [`KrokiError::Status`] when the server answers with an error status
    /// - [`KrokiError::Transport`] when the request itself fails
    /// - [`KrokiError::Body`] when the response is not readable text
    pub fn render_svg(&self, source: &str) -> Result<String, KrokiError> {
        let url = format!("{}/plantuml/svg/{}", self.base_url, encode_source(source));

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| KrokiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            // The body often carries a PlantUML syntax diagnostic; keep it
            // out of the error (the status is the contract) but log it so
            // repair failures can be diagnosed.
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            debug!(status, body = %error_body, "Kroki render failed");
            return Err(KrokiError::Status { status });
        }

        body.read_to_string()
            .map_err(|e| KrokiError::Body(e.to_string()))
    }
}

impl DiagramRenderer for KrokiClient {
    fn render_svg(&self, source: &str) -> Result<String, KrokiError> {
        Self::render_svg(self, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = KrokiError::Status { status: 422 };

        assert_eq!(err.to_string(), "Kroki API responded with status 422");
    }

    #[test]
    fn test_status_error_message_server_error() {
        let err = KrokiError::Status { status: 503 };

        assert_eq!(err.to_string(), "Kroki API responded with status 503");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = KrokiClient::new("https://kroki.io/");

        assert_eq!(client.base_url, "https://kroki.io");
    }
}
