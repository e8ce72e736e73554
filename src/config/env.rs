use super::ServerConfig;
use super::{merge, validation};

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible defaults.
    /// Also loads from .env file if present using dotenvy.
    ///
    /// # Returns
    /// * `Result<Self, Box<dyn std::error::Error>>` - The loaded configuration or an error
    ///
    /// # Errors
    /// Returns an error if:
    /// - Environment variables are malformed (port, secrets JSON)
    /// - Authentication is required but no API secret is configured
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = merge::merge_config(None)?;

        validation::validate_api_secrets(&config.auth_api_secrets)?;
        validation::validate_auth_required(config.auth_required, &config.auth_api_secrets)?;
        validation::validate_artifacts_public_url(&config.artifacts_public_url)?;
        validation::validate_poll_bounds(config.snapshot_poll_attempts)?;

        Ok(config)
    }
}
