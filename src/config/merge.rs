use std::env;
use std::path::PathBuf;

use super::{AuthApiSecret, ServerConfig};
use super::utils::parse_bool;
use super::yaml::YamlConfig;

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. Environment variables
/// 2. YAML configuration values
/// 3. Default values
///
/// This allows YAML to provide base configuration for a deployment while
/// environment variables can override specific values per instance.
///
/// # Arguments
/// * `yaml_config` - Optional YAML configuration to merge under the environment
///
/// # Returns
/// * `Result<ServerConfig, Box<dyn std::error::Error>>` - The merged configuration or an error
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();

    // Helper macro to get value with priority: ENV > YAML > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            env::var($env_var)
                .ok()
                .or_else(|| $yaml_value)
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // Helper macro for optional values: ENV > YAML
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            env::var($env_var).ok().or_else(|| $yaml_value)
        };
    }

    // Server configuration
    let host = get_value!(
        "HOST",
        yaml.server.as_ref().and_then(|s| s.host.clone()),
        "0.0.0.0"
    );

    let port = parse_env_number::<u16>("PORT")?
        .or_else(|| yaml.server.as_ref().and_then(|s| s.port))
        .unwrap_or(3001);

    // Synthesis provider configuration
    let elevenlabs_api_key = get_optional!(
        "ELEVENLABS_API_KEY",
        yaml.providers
            .as_ref()
            .and_then(|p| p.elevenlabs_api_key.clone())
    );

    let elevenlabs_base_url = get_value!(
        "ELEVENLABS_BASE_URL",
        yaml.providers
            .as_ref()
            .and_then(|p| p.elevenlabs_base_url.clone()),
        "https://api.elevenlabs.io"
    );

    let elevenlabs_model_id = get_value!(
        "ELEVENLABS_MODEL_ID",
        yaml.providers
            .as_ref()
            .and_then(|p| p.elevenlabs_model_id.clone()),
        "eleven_multilingual_v2"
    );

    // Storage configuration (filesystem when paths are set, in-memory otherwise)
    let data_path = env::var("DATA_PATH")
        .ok()
        .or_else(|| yaml.storage.as_ref().and_then(|s| s.data_path.clone()))
        .map(PathBuf::from);

    let artifacts_path = env::var("ARTIFACTS_PATH")
        .ok()
        .or_else(|| yaml.storage.as_ref().and_then(|s| s.artifacts_path.clone()))
        .map(PathBuf::from);

    let artifacts_public_url = get_value!(
        "ARTIFACTS_PUBLIC_URL",
        yaml.storage
            .as_ref()
            .and_then(|s| s.artifacts_public_url.clone()),
        "http://localhost:3001/artifacts"
    );

    // Generation pipeline tuning
    let snapshot_poll_attempts = parse_env_number::<u32>("SNAPSHOT_POLL_ATTEMPTS")?
        .or_else(|| {
            yaml.generation
                .as_ref()
                .and_then(|g| g.snapshot_poll_attempts)
        })
        .unwrap_or(5);

    let snapshot_poll_delay_ms = parse_env_number::<u64>("SNAPSHOT_POLL_DELAY_MS")?
        .or_else(|| {
            yaml.generation
                .as_ref()
                .and_then(|g| g.snapshot_poll_delay_ms)
        })
        .unwrap_or(2000);

    let request_timeout_seconds = parse_env_number::<u64>("REQUEST_TIMEOUT_SECONDS")?
        .or_else(|| {
            yaml.generation
                .as_ref()
                .and_then(|g| g.request_timeout_seconds)
        })
        .unwrap_or(120);

    // Authentication configuration
    let auth_required = env::var("AUTH_REQUIRED")
        .ok()
        .and_then(|v| parse_bool(&v))
        .or_else(|| yaml.auth.as_ref().and_then(|a| a.required))
        .unwrap_or(false);

    let auth_api_secrets = merge_api_secrets(yaml.auth.as_ref())?;

    Ok(ServerConfig {
        host,
        port,
        elevenlabs_api_key,
        elevenlabs_base_url,
        elevenlabs_model_id,
        data_path,
        artifacts_path,
        artifacts_public_url,
        snapshot_poll_attempts,
        snapshot_poll_delay_ms,
        request_timeout_seconds,
        auth_api_secrets,
        auth_required,
    })
}

/// Parse a numeric environment variable, failing loudly on a malformed value
///
/// A typo in a numeric override must stop startup rather than silently fall
/// back to the YAML value or default.
fn parse_env_number<T: std::str::FromStr>(
    name: &str,
) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid {name} environment variable: {e}").into()),
        Err(_) => Ok(None),
    }
}

/// Merge API secrets from YAML and environment variables
///
/// The environment variable replaces the whole list rather than extending it,
/// in line with how every other setting merges.
fn merge_api_secrets(
    yaml_auth: Option<&super::yaml::AuthYaml>,
) -> Result<Vec<AuthApiSecret>, Box<dyn std::error::Error>> {
    if let Ok(json) = env::var("AUTH_API_SECRETS_JSON") {
        return parse_api_secrets_json(&json);
    }

    Ok(yaml_auth
        .map(|a| {
            a.api_secrets
                .iter()
                .map(|s| AuthApiSecret {
                    id: s.id.clone(),
                    secret: s.secret.clone(),
                })
                .collect()
        })
        .unwrap_or_default())
}

/// Parse API secrets from a JSON string
fn parse_api_secrets_json(json_str: &str) -> Result<Vec<AuthApiSecret>, Box<dyn std::error::Error>> {
    #[derive(serde::Deserialize)]
    struct SecretJson {
        id: String,
        secret: String,
    }

    let secrets: Vec<SecretJson> = serde_json::from_str(json_str)
        .map_err(|e| format!("Invalid AUTH_API_SECRETS_JSON format: {e}"))?;

    Ok(secrets
        .into_iter()
        .map(|s| AuthApiSecret {
            id: s.id,
            secret: s.secret,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::super::yaml::{AuthApiSecretYaml, AuthYaml, GenerationYaml, ServerYaml, StorageYaml};
    use super::*;
    use serial_test::serial;

    // Helper to clean up environment variables
    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("HOST");
            env::remove_var("PORT");
            env::remove_var("ELEVENLABS_API_KEY");
            env::remove_var("ELEVENLABS_BASE_URL");
            env::remove_var("ELEVENLABS_MODEL_ID");
            env::remove_var("DATA_PATH");
            env::remove_var("ARTIFACTS_PATH");
            env::remove_var("ARTIFACTS_PUBLIC_URL");
            env::remove_var("SNAPSHOT_POLL_ATTEMPTS");
            env::remove_var("SNAPSHOT_POLL_DELAY_MS");
            env::remove_var("REQUEST_TIMEOUT_SECONDS");
            env::remove_var("AUTH_REQUIRED");
            env::remove_var("AUTH_API_SECRETS_JSON");
        }
    }

    #[test]
    #[serial]
    fn test_merge_yaml_only() {
        cleanup_env_vars();

        let yaml = YamlConfig {
            server: Some(ServerYaml {
                host: Some("127.0.0.1".to_string()),
                port: Some(8080),
            }),
            storage: Some(StorageYaml {
                data_path: Some("/tmp/inkvox-data".to_string()),
                artifacts_path: Some("/tmp/inkvox-artifacts".to_string()),
                artifacts_public_url: Some("https://cdn.example.com/audio".to_string()),
            }),
            ..Default::default()
        };

        let config = merge_config(Some(yaml)).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, Some(PathBuf::from("/tmp/inkvox-data")));
        assert_eq!(
            config.artifacts_path,
            Some(PathBuf::from("/tmp/inkvox-artifacts"))
        );
        assert_eq!(config.artifacts_public_url, "https://cdn.example.com/audio");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_env_overrides_yaml() {
        cleanup_env_vars();

        let yaml = YamlConfig {
            server: Some(ServerYaml {
                host: Some("127.0.0.1".to_string()),
                port: Some(8080),
            }),
            ..Default::default()
        };

        unsafe {
            env::set_var("HOST", "0.0.0.0");
            env::set_var("PORT", "9000");
        }

        let config = merge_config(Some(yaml)).unwrap();

        // ENV overrides YAML
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_defaults_when_no_yaml_or_env() {
        cleanup_env_vars();

        let config = merge_config(None).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert!(config.elevenlabs_api_key.is_none());
        assert_eq!(config.elevenlabs_base_url, "https://api.elevenlabs.io");
        assert_eq!(config.elevenlabs_model_id, "eleven_multilingual_v2");
        assert!(config.data_path.is_none());
        assert!(config.artifacts_path.is_none());
        assert_eq!(config.artifacts_public_url, "http://localhost:3001/artifacts");
        assert_eq!(config.snapshot_poll_attempts, 5);
        assert_eq!(config.snapshot_poll_delay_ms, 2000);
        assert_eq!(config.request_timeout_seconds, 120);
        assert!(!config.auth_required);
        assert!(config.auth_api_secrets.is_empty());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_partial_yaml() {
        cleanup_env_vars();

        let yaml = YamlConfig {
            server: Some(ServerYaml {
                port: Some(8080),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = merge_config(Some(yaml)).unwrap();

        assert_eq!(config.host, "0.0.0.0"); // default
        assert_eq!(config.port, 8080); // from yaml

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_invalid_port_env() {
        cleanup_env_vars();

        unsafe {
            env::set_var("PORT", "not-a-port");
        }

        let result = merge_config(None);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid PORT environment variable")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_generation_tuning_env() {
        cleanup_env_vars();

        let yaml = YamlConfig {
            generation: Some(GenerationYaml {
                snapshot_poll_attempts: Some(3),
                snapshot_poll_delay_ms: Some(100),
                request_timeout_seconds: Some(30),
            }),
            ..Default::default()
        };

        unsafe {
            env::set_var("SNAPSHOT_POLL_ATTEMPTS", "10");
            env::set_var("SNAPSHOT_POLL_DELAY_MS", "500");
        }

        let config = merge_config(Some(yaml)).unwrap();

        assert_eq!(config.snapshot_poll_attempts, 10); // ENV overrides YAML
        assert_eq!(config.snapshot_poll_delay_ms, 500); // ENV overrides YAML
        assert_eq!(config.request_timeout_seconds, 30); // from YAML

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_malformed_poll_attempts_env() {
        cleanup_env_vars();

        let yaml = YamlConfig {
            generation: Some(GenerationYaml {
                snapshot_poll_attempts: Some(3),
                snapshot_poll_delay_ms: Some(100),
                request_timeout_seconds: Some(30),
            }),
            ..Default::default()
        };

        unsafe {
            env::set_var("SNAPSHOT_POLL_ATTEMPTS", "five");
        }

        // A malformed override fails loudly instead of falling back to YAML.
        let result = merge_config(Some(yaml));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid SNAPSHOT_POLL_ATTEMPTS environment variable")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_malformed_poll_delay_env() {
        cleanup_env_vars();

        unsafe {
            env::set_var("SNAPSHOT_POLL_DELAY_MS", "2s");
        }

        let result = merge_config(None);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid SNAPSHOT_POLL_DELAY_MS environment variable")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_api_secrets_yaml() {
        cleanup_env_vars();

        let yaml = YamlConfig {
            auth: Some(AuthYaml {
                required: Some(true),
                api_secrets: vec![AuthApiSecretYaml {
                    id: "studio-team".to_string(),
                    secret: "yaml-secret".to_string(),
                }],
            }),
            ..Default::default()
        };

        let config = merge_config(Some(yaml)).unwrap();

        assert!(config.auth_required);
        assert_eq!(config.auth_api_secrets.len(), 1);
        assert_eq!(config.auth_api_secrets[0].id, "studio-team");
        assert_eq!(config.auth_api_secrets[0].secret, "yaml-secret");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_api_secrets_env_overrides_yaml() {
        cleanup_env_vars();

        let yaml = YamlConfig {
            auth: Some(AuthYaml {
                required: Some(true),
                api_secrets: vec![AuthApiSecretYaml {
                    id: "yaml-id".to_string(),
                    secret: "yaml-secret".to_string(),
                }],
            }),
            ..Default::default()
        };

        unsafe {
            env::set_var(
                "AUTH_API_SECRETS_JSON",
                r#"[{"id": "env-id", "secret": "env-secret"}]"#,
            );
        }

        let config = merge_config(Some(yaml)).unwrap();

        // ENV replaces the whole list
        assert_eq!(config.auth_api_secrets.len(), 1);
        assert_eq!(config.auth_api_secrets[0].id, "env-id");
        assert_eq!(config.auth_api_secrets[0].secret, "env-secret");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_api_secrets_invalid_json() {
        cleanup_env_vars();

        unsafe {
            env::set_var("AUTH_API_SECRETS_JSON", "not json at all");
        }

        let result = merge_config(None);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid AUTH_API_SECRETS_JSON format")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_provider_env() {
        cleanup_env_vars();

        unsafe {
            env::set_var("ELEVENLABS_API_KEY", "env-key");
            env::set_var("ELEVENLABS_BASE_URL", "http://localhost:9999");
        }

        let config = merge_config(None).unwrap();

        assert_eq!(config.elevenlabs_api_key, Some("env-key".to_string()));
        assert_eq!(config.elevenlabs_base_url, "http://localhost:9999");
        assert_eq!(config.elevenlabs_model_id, "eleven_multilingual_v2"); // default

        cleanup_env_vars();
    }
}
