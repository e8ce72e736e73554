use crate::auth::{Principal, match_api_secret_id};
use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Header the upstream gateway uses to forward the authenticated principal.
pub const PRINCIPAL_HEADER: &str = "x-principal-id";

/// Authentication middleware for the protected API routes
///
/// The middleware:
/// 1. When auth is required, extracts the Authorization header, parses the
///    bearer token and compares it against the configured API secrets in
///    constant time
/// 2. Resolves the billing principal: the `x-principal-id` header forwarded
///    by the upstream gateway, falling back to the matched API secret id
/// 3. Inserts a [`Principal`] into request extensions on success
/// 4. Returns 401 if the secret does not match or no principal can be
///    resolved
///
/// # Arguments
/// * `state` - Application state containing the ServerConfig
/// * `request` - The incoming HTTP request
/// * `next` - The next middleware or handler in the chain
///
/// # Returns
/// * `Result<Response, ApiError>` - The response from the next handler or an auth error
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let request_method = request.method().to_string();
    let request_path = request.uri().path().to_string();

    let mut secret_id: Option<String> = None;

    if state.config.auth_required {
        tracing::debug!(
            method = %request_method,
            path = %request_path,
            "Starting authentication validation"
        );

        // Extract the Authorization header
        let auth_header = request
            .headers()
            .get("authorization")
            .ok_or(ApiError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| ApiError::InvalidAuthHeader)?
            .to_string();

        // Parse the Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::InvalidAuthHeader)?;

        match match_api_secret_id(token, &state.config.auth_api_secrets) {
            Some(matched) => {
                tracing::debug!(
                    method = %request_method,
                    path = %request_path,
                    auth_id = %matched,
                    "API secret authentication successful"
                );
                secret_id = Some(matched.to_string());
            }
            None => {
                tracing::warn!(
                    method = %request_method,
                    path = %request_path,
                    "API secret authentication failed: token mismatch"
                );
                return Err(ApiError::Unauthorized("Invalid API secret".to_string()));
            }
        }
    }

    // The upstream gateway authenticates the end user and forwards their id.
    // A trusted service caller without a forwarded user falls back to its
    // own secret id as the billing principal.
    let forwarded = request
        .headers()
        .get(PRINCIPAL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let principal_id = forwarded.or(secret_id).ok_or_else(|| {
        ApiError::Unauthorized(format!("Missing {PRINCIPAL_HEADER} header"))
    })?;

    request.extensions_mut().insert(Principal::new(principal_id));
    Ok(next.run(request).await)
}
