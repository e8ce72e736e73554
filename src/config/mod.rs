//! Configuration module for the inkvox server
//!
//! This module handles server configuration from various sources: YAML files and
//! environment variables. Environment variables always override YAML values.
//! The configuration is split into logical submodules for maintainability and extensibility.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use inkvox::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

/// One accepted API secret.
///
/// The id doubles as the billing principal a request authenticated with
/// this secret is attributed to when no explicit principal header is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthApiSecret {
    pub id: String,
    pub secret: String,
}

/// Server configuration
///
/// Contains all configuration needed to run the inkvox server, including:
/// - Server settings (host, port)
/// - Synthesis provider settings (ElevenLabs key, base URL, model)
/// - Storage paths (documents/ledger/log data and artifacts; in-memory when unset)
/// - Generation pipeline tuning (snapshot polling, request timeout)
/// - Authentication settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Synthesis provider settings
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_base_url: String,
    pub elevenlabs_model_id: String,

    // Storage configuration (filesystem when set, in-memory otherwise)
    pub data_path: Option<PathBuf>,
    pub artifacts_path: Option<PathBuf>,
    pub artifacts_public_url: String,

    // Generation pipeline tuning
    pub snapshot_poll_attempts: u32,
    pub snapshot_poll_delay_ms: u64,
    pub request_timeout_seconds: u64,

    // Authentication configuration
    pub auth_api_secrets: Vec<AuthApiSecret>,
    pub auth_required: bool,
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides
    ///
    /// Priority order (highest to lowest):
    /// 1. Environment variables
    /// 2. YAML file values
    /// 3. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // No .env loading here: the user explicitly specified a YAML config
        // file, so only actual environment variables override it.
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;

        validation::validate_api_secrets(&config.auth_api_secrets)?;
        validation::validate_auth_required(config.auth_required, &config.auth_api_secrets)?;
        validation::validate_artifacts_public_url(&config.artifacts_public_url)?;
        validation::validate_poll_bounds(config.snapshot_poll_attempts)?;

        Ok(config)
    }

    /// The socket address the server binds to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether requests must present a configured API secret.
    pub fn has_api_secret_auth(&self) -> bool {
        !self.auth_api_secrets.is_empty()
    }

    /// Per-request timeout applied to provider calls.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Delay between snapshot list polls.
    pub fn snapshot_poll_delay(&self) -> Duration {
        Duration::from_millis(self.snapshot_poll_delay_ms)
    }
}
