//! `ideagram serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use ideagram_config::{CliSettings, Config};
use ideagram_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover ideagram.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Kroki server URL for diagram rendering (overrides config).
    #[arg(long)]
    kroki_url: Option<String>,

    /// Model name for diagram drafting (overrides config).
    #[arg(long)]
    model: Option<String>,

    /// API key for the LLM provider (overrides config).
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Enable verbose output (show request logs and failing diagram source).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        // Build CLI settings from args
        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            kroki_url: self.kroki_url,
            model: self.model,
            api_key: self.api_key,
        };

        // Load config
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        // Fail early instead of 500ing on the first request
        config.require_api_key()?;

        // Print startup info
        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!(
            "Model: {} ({})",
            config.llm_resolved.model, config.llm_resolved.base_url
        ));
        output.info(&format!(
            "Kroki URL: {}",
            config.diagrams_resolved.kroki_url
        ));
        output.info(&format!(
            "Repair attempts: {}",
            config.llm_resolved.max_repair_attempts
        ));

        // Build server config and run
        let server_config = server_config_from_config(&config, version.to_owned(), self.verbose);
        run_server(server_config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
