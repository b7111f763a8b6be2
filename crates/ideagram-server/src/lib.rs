//! HTTP server for the Ideagram architecture diagram generator.
//!
//! This crate provides a native Rust HTTP server using axum, serving:
//! - `POST /api/generate`: idea in, rendered SVG diagram out, with a
//!   bounded LLM repair loop around render failures
//! - `GET /api/config`: client-side configuration for the frontend
//! - The embedded single-page frontend (form, spinner, diagram output)
//!
//! # Quick Start
//!
//! ```ignore
//! use ideagram_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_string(),
//!         port: 7878,
//!         llm_api_key: std::env::var("GROQ_API_KEY").unwrap(),
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► Rust axum server (ideagram-server)
//!                        │
//!                        ├─► POST /api/generate
//!                        │       │
//!                        │       └─► pipeline ──► ChatClient (draft/repair)
//!                        │                    └─► KrokiClient (render SVG)
//!                        │
//!                        └─► Static files (embedded frontend)
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod pipeline;
mod state;
mod static_files;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use ideagram_kroki::KrokiClient;
use ideagram_llm::{ChatClient, ChatClientConfig};
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Base URL of the chat completions API.
    pub llm_base_url: String,
    /// API key for the chat completions API.
    pub llm_api_key: String,
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum repair round-trips after a failed render.
    pub max_repair_attempts: u32,
    /// Kroki server URL for diagram rendering.
    pub kroki_url: String,
    /// Enable verbose output.
    pub verbose: bool,
    /// Application version (reported to the frontend).
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            llm_base_url: "https://api.groq.com/openai/v1".to_string(),
            llm_api_key: String::new(),
            model: "deepseek-r1-distill-llama-70b".to_string(),
            temperature: 0.0,
            max_repair_attempts: 3,
            kroki_url: "https://kroki.io".to_string(),
            verbose: false,
            version: String::new(),
        }
    }
}

/// Run the server.
///
/// # Arguments
///
/// * `config` - Server configuration
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Outbound clients are pooled and shared across requests
    let assistant = Arc::new(ChatClient::new(ChatClientConfig {
        base_url: config.llm_base_url.clone(),
        api_key: config.llm_api_key.clone(),
        model: config.model.clone(),
        temperature: config.temperature,
    }));
    let renderer = Arc::new(KrokiClient::new(config.kroki_url.clone()));

    // Create app state
    let state = Arc::new(AppState {
        assistant,
        renderer,
        max_repair_attempts: config.max_repair_attempts,
        verbose: config.verbose,
        version: config.version.clone(),
        model: config.model.clone(),
        kroki_url: config.kroki_url.clone(),
    });

    // Create router
    let app = app::create_router(state);

    // Bind and run server
    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from Ideagram config.
///
/// # Arguments
///
/// * `config` - Ideagram configuration
/// * `version` - Application version
/// * `verbose` - Enable verbose output
#[must_use]
pub fn server_config_from_config(
    config: &ideagram_config::Config,
    version: String,
    verbose: bool,
) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        llm_base_url: config.llm_resolved.base_url.clone(),
        llm_api_key: config.llm_resolved.api_key.clone(),
        model: config.llm_resolved.model.clone(),
        temperature: config.llm_resolved.temperature,
        max_repair_attempts: config.llm_resolved.max_repair_attempts,
        kroki_url: config.diagrams_resolved.kroki_url.clone(),
        verbose,
        version,
    }
}
