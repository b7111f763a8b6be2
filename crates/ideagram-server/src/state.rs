//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use ideagram_kroki::DiagramRenderer;
use ideagram_llm::DiagramAssistant;

/// Application state shared across all handlers.
///
/// Holds only immutable configuration and pooled outbound clients; there
/// is no mutable state shared between requests.
pub(crate) struct AppState {
    /// Drafting/repair capability (production: `ChatClient`).
    pub(crate) assistant: Arc<dyn DiagramAssistant>,
    /// Rendering capability (production: `KrokiClient`).
    pub(crate) renderer: Arc<dyn DiagramRenderer>,
    /// Maximum repair round-trips after a failed render.
    pub(crate) max_repair_attempts: u32,
    /// Enable verbose output (log failing diagram source).
    pub(crate) verbose: bool,
    /// Application version reported to the frontend.
    pub(crate) version: String,
    /// Model name reported to the frontend.
    pub(crate) model: String,
    /// Kroki URL reported to the frontend.
    pub(crate) kroki_url: String,
}
