//! Configuration management for Ideagram.
//!
//! Parses `ideagram.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `llm.base_url`
//! - `llm.api_key`
//! - `diagrams.kroki_url`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

use expand::expand_env;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override Kroki URL for diagram rendering.
    pub kroki_url: Option<String>,
    /// Override LLM model name.
    pub model: Option<String>,
    /// Override LLM API key.
    pub api_key: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "ideagram.toml";

/// Upper bound for repair attempts; more than this just burns tokens.
const MAX_REPAIR_ATTEMPTS_LIMIT: u32 = 10;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// LLM provider configuration (raw, as parsed from TOML).
    llm: LlmConfigRaw,
    /// Diagram rendering configuration (raw, as parsed from TOML).
    diagrams: DiagramsConfigRaw,

    /// Resolved LLM configuration (set after loading).
    #[serde(skip)]
    pub llm_resolved: LlmConfig,
    /// Resolved diagrams configuration (set after loading).
    #[serde(skip)]
    pub diagrams_resolved: DiagramsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            llm: LlmConfigRaw::default(),
            diagrams: DiagramsConfigRaw::default(),
            llm_resolved: LlmConfig::default(),
            diagrams_resolved: DiagramsConfig::default(),
            config_path: None,
        }
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7878,
        }
    }
}

/// Raw LLM configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct LlmConfigRaw {
    base_url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    temperature: Option<f32>,
    max_repair_attempts: Option<u32>,
}

/// Resolved LLM provider configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible chat completions API.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// API key (empty means unset).
    pub api_key: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum number of repair round-trips after a failed render.
    pub max_repair_attempts: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_owned(),
            model: "deepseek-r1-distill-llama-70b".to_owned(),
            api_key: std::env::var("GROQ_API_KEY").unwrap_or_default(),
            temperature: 0.0,
            max_repair_attempts: 3,
        }
    }
}

/// Raw diagrams configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DiagramsConfigRaw {
    kroki_url: Option<String>,
}

/// Resolved diagram rendering configuration.
#[derive(Debug, Clone)]
pub struct DiagramsConfig {
    /// Kroki server URL for diagram rendering.
    pub kroki_url: String,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            kroki_url: "https://kroki.io".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`llm.api_key`").
        field: String,
        /// Error message (e.g., "${`GROQ_API_KEY`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `ideagram.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(kroki_url) = &settings.kroki_url {
            self.diagrams_resolved.kroki_url.clone_from(kroki_url);
        }
        if let Some(model) = &settings.model {
            self.llm_resolved.model.clone_from(model);
        }
        if let Some(api_key) = &settings.api_key {
            self.llm_resolved.api_key.clone_from(api_key);
        }
    }

    /// Get the validated LLM API key.
    ///
    /// Use this instead of reading `llm_resolved.api_key` directly when a
    /// command actually needs to talk to the provider.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if no key is configured.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        if self.llm_resolved.api_key.is_empty() {
            return Err(ConfigError::Validation(
                "llm.api_key is required (set it in ideagram.toml or via GROQ_API_KEY)".into(),
            ));
        }
        Ok(&self.llm_resolved.api_key)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.resolve()?;
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading and resolution
        config.validate()?;

        Ok(config)
    }

    /// Resolve raw TOML values into the `*_resolved` fields, expanding
    /// environment variables and filling in defaults.
    fn resolve(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand_env(&self.server.host, "server.host")?;

        let defaults = LlmConfig::default();
        self.llm_resolved = LlmConfig {
            base_url: match &self.llm.base_url {
                Some(url) => expand_env(url, "llm.base_url")?,
                None => defaults.base_url,
            },
            model: self.llm.model.clone().unwrap_or(defaults.model),
            api_key: match &self.llm.api_key {
                Some(key) => expand_env(key, "llm.api_key")?,
                None => defaults.api_key,
            },
            temperature: self.llm.temperature.unwrap_or(defaults.temperature),
            max_repair_attempts: self
                .llm
                .max_repair_attempts
                .unwrap_or(defaults.max_repair_attempts),
        };

        self.diagrams_resolved = DiagramsConfig {
            kroki_url: match &self.diagrams.kroki_url {
                Some(url) => expand_env(url, "diagrams.kroki_url")?,
                None => DiagramsConfig::default().kroki_url,
            },
        };

        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are properly set and contain valid values.
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_llm()?;
        self.validate_diagrams()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 is technically valid (OS assigns a random port), but it's
        // unlikely to be intentional in a config file
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate LLM configuration.
    fn validate_llm(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.llm_resolved.base_url, "llm.base_url")?;
        require_http_url(&self.llm_resolved.base_url, "llm.base_url")?;
        require_non_empty(&self.llm_resolved.model, "llm.model")?;

        let temperature = self.llm_resolved.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Validation(format!(
                "llm.temperature must be between 0.0 and 2.0 (got {temperature})"
            )));
        }

        let attempts = self.llm_resolved.max_repair_attempts;
        if attempts > MAX_REPAIR_ATTEMPTS_LIMIT {
            return Err(ConfigError::Validation(format!(
                "llm.max_repair_attempts cannot exceed {MAX_REPAIR_ATTEMPTS_LIMIT}"
            )));
        }

        Ok(())
    }

    /// Validate diagrams configuration.
    fn validate_diagrams(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.diagrams_resolved.kroki_url, "diagrams.kroki_url")?;
        require_http_url(&self.diagrams_resolved.kroki_url, "diagrams.kroki_url")?;
        Ok(())
    }
}
