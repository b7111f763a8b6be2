//! Diagram generation endpoint.
//!
//! Accepts an idea, runs the generate/repair pipeline on the blocking
//! pool and returns the rendered SVG markup as JSON.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ServerError;
use crate::pipeline;
use crate::state::AppState;

/// Request body for POST /api/generate.
#[derive(Deserialize)]
pub(crate) struct GenerateRequest {
    /// Free-text idea to diagram. A missing field is treated the same as
    /// an empty one so both take the 400 path.
    #[serde(default)]
    idea: String,
}

/// Response for POST /api/generate.
#[derive(Serialize)]
pub(crate) struct GenerateResponse {
    /// Rendered diagram markup.
    svg: String,
}

/// Handle POST /api/generate.
pub(crate) async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ServerError> {
    if request.idea.trim().is_empty() {
        return Err(ServerError::MissingIdea);
    }

    let request_id = Uuid::new_v4();
    info!(%request_id, idea_len = request.idea.len(), "Generating diagram");

    // The outbound clients are sync; keep the whole loop off the async
    // worker threads.
    let task_state = Arc::clone(&state);
    let idea = request.idea;
    let result = tokio::task::spawn_blocking(move || {
        pipeline::generate_diagram(
            task_state.assistant.as_ref(),
            task_state.renderer.as_ref(),
            task_state.max_repair_attempts,
            &idea,
        )
    })
    .await;

    match result {
        Ok(Ok(svg)) => {
            info!(%request_id, svg_len = svg.len(), "Diagram generated");
            Ok(Json(GenerateResponse { svg }))
        }
        Ok(Err(err)) => {
            warn!(%request_id, error = %err, "Diagram generation failed");
            if state.verbose
                && let Some(source) = err.diagram_source()
            {
                warn!(%request_id, diagram_source = %source, "Last diagram source");
            }
            Err(ServerError::from(err))
        }
        Err(join_err) => {
            warn!(%request_id, error = %join_err, "Pipeline task failed");
            Err(ServerError::Internal)
        }
    }
}
