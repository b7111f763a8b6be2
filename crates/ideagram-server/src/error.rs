//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::pipeline::PipelineError;

/// Fallback message for failures with no better description.
const GENERIC_ERROR: &str = "Something went wrong";

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    /// Request arrived without a usable idea.
    #[error("Idea is required")]
    MissingIdea,

    /// The generate/repair pipeline failed. `code` carries the last
    /// diagram source attempted, when one was computed.
    #[error("{message}")]
    Pipeline {
        message: String,
        code: Option<String>,
    },

    /// Anything else (e.g. a panicked pipeline task).
    #[error("Something went wrong")]
    Internal,
}

impl From<PipelineError> for ServerError {
    fn from(err: PipelineError) -> Self {
        Self::Pipeline {
            message: err.to_string(),
            code: err.diagram_source().map(str::to_owned),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::MissingIdea => (
                StatusCode::BAD_REQUEST,
                json!({"error": "Idea is required"}),
            ),
            Self::Pipeline { message, code } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                match code {
                    Some(code) => json!({"error": message, "code": code}),
                    None => json!({"error": message}),
                },
            ),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": GENERIC_ERROR}),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_idea_is_bad_request() {
        let response = ServerError::MissingIdea.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_pipeline_error_is_server_error() {
        let response = ServerError::Pipeline {
            message: "Kroki API responded with status 422".to_owned(),
            code: Some("@startuml\n@enduml".to_owned()),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_pipeline_conversion_carries_source() {
        let err = PipelineError::Render {
            message: "Kroki API responded with status 422".to_owned(),
            code: "@startuml\nbad\n@enduml".to_owned(),
        };

        let server_err = ServerError::from(err);

        match server_err {
            ServerError::Pipeline { message, code } => {
                assert_eq!(message, "Kroki API responded with status 422");
                assert_eq!(code.as_deref(), Some("@startuml\nbad\n@enduml"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_internal_error_message_is_generic() {
        assert_eq!(ServerError::Internal.to_string(), "Something went wrong");
    }
}
