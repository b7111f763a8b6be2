//! Configuration API endpoint.
//!
//! Returns client-side configuration for the frontend.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Response for GET /api/config.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfigResponse {
    /// Application version.
    version: String,
    /// Model used for drafting and repair.
    model: String,
    /// Kroki server the diagrams are rendered by.
    kroki_url: String,
}

/// Handle GET /api/config.
pub(crate) async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        version: state.version.clone(),
        model: state.model.clone(),
        kroki_url: state.kroki_url.clone(),
    })
}
