use super::AuthApiSecret;

/// Validate that when auth is required, at least one API secret is configured
///
/// Without a secret there would be no way to authenticate any request, so the
/// server would reject everything. Catch that at startup instead.
pub fn validate_auth_required(
    auth_required: bool,
    auth_api_secrets: &[AuthApiSecret],
) -> Result<(), Box<dyn std::error::Error>> {
    if !auth_required {
        return Ok(());
    }

    if auth_api_secrets.is_empty() {
        return Err(
            "When AUTH_REQUIRED=true, at least one API secret must be configured via AUTH_API_SECRETS_JSON or the auth.api_secrets YAML section".into()
        );
    }

    Ok(())
}

/// Validate the configured API secrets
///
/// Each entry must carry a non-empty id and secret, and ids must be unique
/// since the id identifies the billing principal a request is charged to.
pub fn validate_api_secrets(
    auth_api_secrets: &[AuthApiSecret],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut seen_ids = std::collections::HashSet::new();

    for entry in auth_api_secrets {
        if entry.id.is_empty() {
            return Err("API secret entries must have a non-empty id".into());
        }
        if entry.secret.is_empty() {
            return Err(format!("API secret for '{}' must not be empty", entry.id).into());
        }
        if !seen_ids.insert(entry.id.clone()) {
            return Err(format!("Duplicate API secret id: {}", entry.id).into());
        }
    }

    Ok(())
}

/// Validate the snapshot polling bounds
///
/// Zero attempts would start a provider-side conversion and then give up
/// before the first snapshot poll, wasting the conversion on every request.
pub fn validate_poll_bounds(
    snapshot_poll_attempts: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if snapshot_poll_attempts == 0 {
        return Err("SNAPSHOT_POLL_ATTEMPTS must be at least 1".into());
    }

    Ok(())
}

/// Validate the public base URL used to build artifact locators
pub fn validate_artifacts_public_url(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if url.is_empty() {
        return Err("ARTIFACTS_PUBLIC_URL cannot be empty".into());
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(format!(
            "ARTIFACTS_PUBLIC_URL must start with http:// or https:// (got: {url})"
        )
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(id: &str, secret: &str) -> AuthApiSecret {
        AuthApiSecret {
            id: id.to_string(),
            secret: secret.to_string(),
        }
    }

    #[test]
    fn test_validate_auth_required_disabled() {
        let result = validate_auth_required(false, &[]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_auth_required_with_secret() {
        let result = validate_auth_required(true, &[secret("studio-team", "s3cret")]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_auth_required_without_secret() {
        let result = validate_auth_required(true, &[]);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("at least one API secret")
        );
    }

    #[test]
    fn test_validate_api_secrets_valid() {
        let secrets = vec![secret("a", "one"), secret("b", "two")];
        assert!(validate_api_secrets(&secrets).is_ok());
    }

    #[test]
    fn test_validate_api_secrets_empty_id() {
        let secrets = vec![secret("", "one")];
        let result = validate_api_secrets(&secrets);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("non-empty id"));
    }

    #[test]
    fn test_validate_api_secrets_empty_secret() {
        let secrets = vec![secret("studio-team", "")];
        let result = validate_api_secrets(&secrets);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("'studio-team' must not be empty")
        );
    }

    #[test]
    fn test_validate_api_secrets_duplicate_id() {
        let secrets = vec![secret("studio-team", "one"), secret("studio-team", "two")];
        let result = validate_api_secrets(&secrets);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Duplicate API secret id")
        );
    }

    #[test]
    fn test_validate_poll_bounds_valid() {
        assert!(validate_poll_bounds(1).is_ok());
        assert!(validate_poll_bounds(5).is_ok());
    }

    #[test]
    fn test_validate_poll_bounds_zero_attempts() {
        let result = validate_poll_bounds(0);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("at least 1"));
    }

    #[test]
    fn test_validate_artifacts_public_url_valid() {
        assert!(validate_artifacts_public_url("http://localhost:3001/artifacts").is_ok());
        assert!(validate_artifacts_public_url("https://cdn.example.com/audio").is_ok());
    }

    #[test]
    fn test_validate_artifacts_public_url_empty() {
        let result = validate_artifacts_public_url("");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_validate_artifacts_public_url_bad_scheme() {
        let result = validate_artifacts_public_url("ftp://cdn.example.com");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("must start with http")
        );
    }
}
