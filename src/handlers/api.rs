use axum::{
    Extension,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::auth::Principal;
use crate::errors::{ApiError, ApiResult};
use crate::state::AppState;

/// Health check handler
/// Returns a simple JSON response indicating the server is running
pub async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({
        "status": "OK"
    })))
}

/// Returns the caller's credit balance.
///
/// 404 when the principal has no allocation row; callers treat that as a
/// zero balance rather than expecting one to be created here.
pub async fn get_credits(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Value>> {
    let balance = state.ledger.balance(&principal.id).await?;

    Ok(Json(json!({
        "credits_available": balance.credits_available,
        "credits_used": balance.credits_used,
        "total_credits_used": balance.total_credits_used,
    })))
}

/// Query selecting a generation record scope.
#[derive(Debug, Deserialize)]
pub struct GenerationRecordQuery {
    pub chapter_id: String,
    #[serde(default)]
    pub block_id: Option<String>,
}

/// Returns the last-generation record for a chapter or block.
///
/// Callers compare the recorded content snapshot against the current
/// content to decide whether an artifact is stale.
pub async fn get_generation_record(
    State(state): State<Arc<AppState>>,
    Path(studio_id): Path<String>,
    Query(query): Query<GenerationRecordQuery>,
) -> ApiResult<Json<Value>> {
    let record = state
        .generation_log
        .get(&studio_id, &query.chapter_id, query.block_id.as_deref())
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "no generation recorded for chapter {}",
                query.chapter_id
            ))
        })?;

    Ok(Json(serde_json::to_value(record).map_err(|e| {
        ApiError::Internal(format!("failed to serialize generation record: {e}"))
    })?))
}
