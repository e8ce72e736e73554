use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// This structure represents the full configuration that can be loaded from a YAML file.
/// All fields are optional to allow partial configuration. Environment variables can
/// override any values specified here.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///
/// providers:
///   elevenlabs_api_key: "your-elevenlabs-key"
///   elevenlabs_base_url: "https://api.elevenlabs.io"
///   elevenlabs_model_id: "eleven_multilingual_v2"
///
/// storage:
///   data_path: "/var/lib/inkvox/data"
///   artifacts_path: "/var/lib/inkvox/artifacts"
///   artifacts_public_url: "https://cdn.example.com/artifacts"
///
/// generation:
///   snapshot_poll_attempts: 5
///   snapshot_poll_delay_ms: 2000
///   request_timeout_seconds: 120
///
/// auth:
///   required: true
///   api_secrets:
///     - id: "studio-team"
///       secret: "your-api-secret"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub providers: Option<ProvidersYaml>,
    pub storage: Option<StorageYaml>,
    pub generation: Option<GenerationYaml>,
    pub auth: Option<AuthYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Provider API settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    pub elevenlabs_api_key: Option<String>,
    /// Override the provider base URL, mainly useful for proxies and tests
    pub elevenlabs_base_url: Option<String>,
    pub elevenlabs_model_id: Option<String>,
}

/// Storage configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageYaml {
    pub data_path: Option<String>,
    pub artifacts_path: Option<String>,
    pub artifacts_public_url: Option<String>,
}

/// Generation pipeline tuning from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GenerationYaml {
    pub snapshot_poll_attempts: Option<u32>,
    pub snapshot_poll_delay_ms: Option<u64>,
    pub request_timeout_seconds: Option<u64>,
}

/// Authentication configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AuthYaml {
    pub required: Option<bool>,
    #[serde(default)]
    pub api_secrets: Vec<AuthApiSecretYaml>,
}

/// One accepted API secret from YAML
#[derive(Debug, Clone, Deserialize)]
pub struct AuthApiSecretYaml {
    pub id: String,
    pub secret: String,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Returns
    /// * `Result<YamlConfig, Box<dyn std::error::Error>>` - The loaded configuration or an error
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
